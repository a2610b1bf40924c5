//! The fixed catalog of models offered by the generation endpoint.

use serde::Serialize;

#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[cfg_attr(feature = "typegen", specta(rename_all = "camelCase"))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub label: &'static str,
    pub value: &'static str,
}

/// Models selectable in the UI. The first entry is the default.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        label: "Llama 3.1 405B",
        value: "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo",
    },
    ModelInfo {
        label: "Llama 3.1 70B",
        value: "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
    },
    ModelInfo {
        label: "Gemma 2 27B",
        value: "google/gemma-2-27b-it",
    },
];

pub fn default_model() -> &'static str {
    MODELS[0].value
}

#[tauri::command]
pub fn list_models() -> Vec<ModelInfo> {
    MODELS.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_non_empty_and_unique() {
        assert!(!MODELS.is_empty());
        let mut values: Vec<_> = MODELS.iter().map(|m| m.value).collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), MODELS.len());
    }

    #[test]
    fn test_default_model_is_first_entry() {
        assert_eq!(default_model(), MODELS[0].value);
    }

    #[test]
    fn test_model_info_serializes_camel_case() {
        let json = serde_json::to_value(&MODELS[0]).unwrap();
        assert_eq!(json["label"], "Llama 3.1 405B");
        assert_eq!(json["value"], "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo");
    }
}
