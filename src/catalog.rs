//! Public model catalog and model → Monica bot mapping
//!
//! [`MODEL_BOTS`] is the single source of truth: the `/v1/models` listing is
//! generated from its keys so the two can never drift apart.

use crate::models::{OpenAiModel, OpenAiModelList};

/// Public model name → Monica bot uid.
pub const MODEL_BOTS: &[(&str, &str)] = &[
    ("gpt-5", "gpt_5"),
    ("gpt-4o", "gpt_4_o_chat"),
    ("gpt-4o-mini", "gpt_4_o_mini_chat"),
    ("gpt-4.1", "gpt_4_1"),
    ("gpt-4.1-mini", "gpt_4_1_mini"),
    ("gpt-4.1-nano", "gpt_4_1_nano"),
    ("gpt-4-5", "gpt_4_5_chat"),
    ("o1-preview", "o1_preview"),
    ("o3", "o3"),
    ("o3-mini", "openai_o_3_mini"),
    ("o4-mini", "o4_mini"),
    ("claude-haiku-4-5", "claude_4_5_haiku"),
    ("claude-sonnet-4-5", "claude_4_5_sonnet"),
    ("claude-4-sonnet", "claude_4_sonnet"),
    ("claude-4-sonnet-thinking", "claude_4_sonnet_think"),
    ("claude-4-opus", "claude_4_opus"),
    ("claude-4-opus-thinking", "claude_4_opus_think"),
    ("claude-opus-4-1-20250805-thinking", "claude_4_1_opus_think"),
    ("claude-3-7-sonnet-thinking", "claude_3_7_sonnet_think"),
    ("claude-3-7-sonnet", "claude_3_7_sonnet"),
    ("claude-3-5-sonnet", "claude_3.5_sonnet"),
    ("claude-3-5-haiku", "claude_3.5_haiku"),
    ("gemini-3-pro-preview-thinking", "gemini_3_pro_preview_think"),
    ("gemini-2.5-pro", "gemini_2_5_pro"),
    ("gemini-2.5-flash", "gemini_2_5_flash"),
    ("gemini-2.0-flash", "gemini_2_0"),
    ("deepseek-v3.1", "deepseek_v3_1"),
    ("deepseek-reasoner", "deepseek_reasoner"),
    ("deepseek-chat", "deepseek_chat"),
    ("deepclaude", "deepclaude"),
    ("sonar", "sonar"),
    ("sonar-reasoning-pro", "sonar_reasoning_pro"),
    ("grok-3-beta", "grok_3_beta"),
    ("grok-4", "grok_4"),
    ("grok-code-fast-1", "grok_code_fast_1"),
];

/// Externally versioned names accepted by the model-bot path, folded onto catalog keys.
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("grok-4-0709", "grok-4"),
    ("gemini-2.5-pro-thinking", "gemini-2.5-pro"),
    ("claude-opus-4-1-thinking", "claude-opus-4-1-20250805-thinking"),
];

/// Model names the custom-bot endpoint knows under a different identifier.
const CUSTOM_BOT_MODELS: &[(&str, &str)] = &[
    ("grok-4", "grok-4-0709"),
    ("gemini-2.5-pro", "gemini-2.5-pro-thinking"),
];

fn lookup<'a>(table: &'a [(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Public model names, in catalog order.
pub fn supported_models() -> Vec<&'static str> {
    MODEL_BOTS.iter().map(|(model, _)| *model).collect()
}

/// Fold an externally versioned model name onto its catalog key.
pub fn canonical_model(model: &str) -> &str {
    lookup(MODEL_ALIASES, model).unwrap_or(model)
}

/// Resolve the bot uid for a public model name.
///
/// Unmapped names are passed through unchanged.
pub fn model_to_bot(model: &str) -> String {
    match lookup(MODEL_BOTS, canonical_model(model)) {
        Some(bot_uid) => bot_uid.to_string(),
        None => {
            tracing::warn!("No bot mapping for model '{}', using it as bot uid", model);
            model.to_string()
        }
    }
}

/// Model identifier to embed in custom-bot metadata.
pub fn custom_bot_model(model: &str) -> String {
    lookup(CUSTOM_BOT_MODELS, model)
        .unwrap_or(model)
        .to_string()
}

/// Build the `/v1/models` response body from the catalog.
pub fn model_list() -> OpenAiModelList {
    let created = chrono::Utc::now().timestamp();

    OpenAiModelList {
        object: "list".to_string(),
        data: supported_models()
            .into_iter()
            .map(|id| OpenAiModel {
                id: id.to_string(),
                object: "model".to_string(),
                created,
                owned_by: "monica".to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_matches_mapping() {
        let models = supported_models();
        assert!(!models.is_empty());
        assert_eq!(models.len(), MODEL_BOTS.len());

        let unique: HashSet<_> = models.iter().collect();
        assert_eq!(unique.len(), models.len(), "duplicate model name in catalog");
    }

    #[test]
    fn test_every_catalog_model_resolves() {
        for model in supported_models() {
            let bot_uid = model_to_bot(model);
            assert!(!bot_uid.is_empty(), "{} maps to an empty bot uid", model);
            assert_eq!(Some(bot_uid.as_str()), lookup(MODEL_BOTS, model));
        }
    }

    #[test]
    fn test_model_to_bot() {
        let cases = [
            ("gpt-4o", "gpt_4_o_chat"),
            ("claude-sonnet-4-5", "claude_4_5_sonnet"),
            ("claude-3-5-sonnet", "claude_3.5_sonnet"),
            ("gemini-2.5-pro", "gemini_2_5_pro"),
            ("o1-preview", "o1_preview"),
            ("deepseek-v3.1", "deepseek_v3_1"),
            ("grok-4", "grok_4"),
        ];

        for (model, expected) in cases {
            assert_eq!(model_to_bot(model), expected, "model {}", model);
        }
    }

    #[test]
    fn test_unmapped_model_passes_through() {
        assert_eq!(model_to_bot("not-a-real-model"), "not-a-real-model");
    }

    #[test]
    fn test_versioned_aliases_resolve() {
        assert_eq!(model_to_bot("grok-4-0709"), "grok_4");
        assert_eq!(model_to_bot("gemini-2.5-pro-thinking"), "gemini_2_5_pro");
    }

    #[test]
    fn test_every_alias_targets_catalog_entry() {
        for (alias, target) in MODEL_ALIASES {
            assert!(
                lookup(MODEL_BOTS, target).is_some(),
                "alias {} points at unknown model {}",
                alias,
                target
            );
        }
    }

    #[test]
    fn test_custom_bot_model_rewrite() {
        assert_eq!(custom_bot_model("grok-4"), "grok-4-0709");
        assert_eq!(custom_bot_model("gemini-2.5-pro"), "gemini-2.5-pro-thinking");
        assert_eq!(custom_bot_model("gpt-4o"), "gpt-4o");
    }

    #[test]
    fn test_model_list_shape() {
        let list = model_list();
        assert_eq!(list.object, "list");
        assert_eq!(list.data.len(), MODEL_BOTS.len());
        assert!(list.data.iter().all(|m| m.object == "model"));
        assert!(list.data.iter().any(|m| m.id == "gpt-4o"));
    }
}
