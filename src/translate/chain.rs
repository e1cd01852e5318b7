//! Append-only conversation item chain.

use crate::provider::types::{Item, ItemContent, ItemType, WELCOME_MESSAGE};
use uuid::Uuid;

pub fn new_item_id() -> String {
    format!("msg:{}", Uuid::new_v4())
}

/// Items of one conversation, each linked to the one appended before it.
///
/// The chain always starts with the bot welcome reply; without it Monica tends
/// to cut the last tokens of the answer.
#[derive(Debug, Clone)]
pub struct ItemChain {
    conversation_id: String,
    items: Vec<Item>,
}

impl ItemChain {
    pub fn new() -> Self {
        let conversation_id = format!("conv:{}", Uuid::new_v4());
        let welcome = Item {
            conversation_id: conversation_id.clone(),
            parent_item_id: None,
            item_id: new_item_id(),
            item_type: ItemType::Reply,
            data: ItemContent::text(WELCOME_MESSAGE.to_string(), false),
        };

        Self {
            conversation_id,
            items: vec![welcome],
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Id of the most recently appended item.
    pub fn last_item_id(&self) -> &str {
        // The welcome item is pushed in `new` and items are never removed.
        self.items
            .last()
            .map(|item| item.item_id.as_str())
            .unwrap_or_default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a turn whose parent is the current last item; returns the new item's id.
    pub fn push(&mut self, item_type: ItemType, data: ItemContent) -> &str {
        let item = Item {
            conversation_id: self.conversation_id.clone(),
            parent_item_id: Some(self.last_item_id().to_string()),
            item_id: new_item_id(),
            item_type,
            data,
        };
        self.items.push(item);
        self.last_item_id()
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}

impl Default for ItemChain {
    fn default() -> Self {
        Self::new()
    }
}
