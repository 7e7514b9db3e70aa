//! Catalogue of selectable generation models.

use serde::{Deserialize, Serialize};

/// Modality a catalogue model produces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Video generation
    #[display("video")]
    Video,
    /// Image generation
    #[display("image")]
    Image,
    /// Text generation
    #[display("text")]
    Text,
    /// Several modalities
    #[display("hybrid")]
    Hybrid,
}

/// A selectable generation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Catalogue id
    pub id: u32,
    /// Product name
    pub name: &'static str,
    /// Vendor
    pub provider: &'static str,
    /// Output modality
    pub kind: ModelKind,
    /// Whether the user must bring their own key
    pub requires_key: bool,
}

const fn model(
    id: u32,
    name: &'static str,
    provider: &'static str,
    kind: ModelKind,
    requires_key: bool,
) -> ModelInfo {
    ModelInfo {
        id,
        name,
        provider,
        kind,
        requires_key,
    }
}

const CATALOGUE: [ModelInfo; 10] = [
    model(1, "Jimeng", "ByteDance", ModelKind::Hybrid, true),
    model(2, "Kling", "Kuaishou", ModelKind::Video, true),
    model(3, "Volcano", "ByteDance", ModelKind::Video, true),
    model(4, "Hailuo", "MiniMax", ModelKind::Video, true),
    model(5, "Wanxiang", "Alibaba", ModelKind::Image, true),
    model(6, "Hunyuan", "Tencent", ModelKind::Hybrid, true),
    model(7, "Baidu", "Baidu", ModelKind::Image, true),
    model(8, "Google Veo", "Google", ModelKind::Video, false),
    model(9, "Runway Gen-3", "Runway", ModelKind::Video, true),
    model(10, "Luma Dream Machine", "Luma", ModelKind::Video, true),
];

/// All selectable models, ordered by id.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{available_models, find_model};
///
/// assert_eq!(available_models().len(), 10);
/// assert_eq!(find_model(8).map(|m| m.name), Some("Google Veo"));
/// assert!(find_model(42).is_none());
/// ```
pub fn available_models() -> &'static [ModelInfo] {
    &CATALOGUE
}

/// Look up a model by catalogue id.
pub fn find_model(id: u32) -> Option<&'static ModelInfo> {
    CATALOGUE.iter().find(|model| model.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::DEFAULT_MODEL_ID;

    #[test]
    fn default_model_is_keyless() {
        let model = find_model(DEFAULT_MODEL_ID).unwrap();
        assert!(!model.requires_key);
        assert_eq!(model.kind, ModelKind::Video);
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<u32> = available_models().iter().map(|m| m.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), available_models().len());
    }
}
