pub mod processing;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Named renditions served for every uploaded recipe image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImagePreset {
    /// Longest edge 240px, used in listings
    Small,
    /// Longest edge 720px, used on the recipe detail page
    Medium,
}

impl ImagePreset {
    pub fn max_edge(self) -> u32 {
        match self {
            ImagePreset::Small => 240,
            ImagePreset::Medium => 720,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImagePreset::Small => "small",
            ImagePreset::Medium => "medium",
        }
    }
}

/// Public URL of one preset of an image.
pub fn image_url(base_url: &str, image_id: Uuid, preset: ImagePreset) -> String {
    format!("{}/api/images/{}/{}", base_url, image_id, preset.as_str())
}

/// URL for an optional image, as embedded in recipe payloads.
pub fn maybe_image_url(
    base_url: &str,
    image_id: Option<Uuid>,
    preset: ImagePreset,
) -> Option<String> {
    image_id.map(|id| image_url(base_url, id, preset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_url_without_base() {
        let id = Uuid::from_u128(0xabc);
        assert_eq!(
            image_url("", id, ImagePreset::Small),
            format!("/api/images/{}/small", id)
        );
    }

    #[test]
    fn test_absolute_url_with_base() {
        let id = Uuid::from_u128(1);
        assert_eq!(
            image_url("https://cdn.example.com", id, ImagePreset::Medium),
            format!("https://cdn.example.com/api/images/{}/medium", id)
        );
    }

    #[test]
    fn test_missing_image_has_no_url() {
        assert_eq!(maybe_image_url("", None, ImagePreset::Small), None);
    }

    #[test]
    fn test_preset_path_segment_parses() {
        let preset: ImagePreset = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(preset, ImagePreset::Medium);
        assert!(serde_json::from_str::<ImagePreset>("\"large\"").is_err());
    }
}
