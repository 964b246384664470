//! Social-media metadata records and their generation

pub mod generator;
pub mod platform;

pub use generator::{clip_title_for, fallback_analysis, fallback_metadata, MetadataGenerator};
pub use platform::{optimize_for_platform, Platform};

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Title, description and hashtags generated for one clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Catchy title, aimed at 60 characters or less
    pub title: String,
    pub description: String,
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub platforms: PlatformVariants,
}

/// Per-platform overrides.
///
/// The three platforms the prompt asks for are explicit fields; anything else the
/// model returns lands in `additional`. Entries that are not shaped like a
/// variant are skipped instead of failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformVariants {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_variant")]
    pub youtube: Option<PlatformVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_variant")]
    pub tiktok: Option<PlatformVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_variant")]
    pub instagram: Option<PlatformVariant>,
    #[serde(flatten, deserialize_with = "lenient_variant_map")]
    pub additional: BTreeMap<String, PlatformVariant>,
}

fn lenient_variant<'de, D>(deserializer: D) -> Result<Option<PlatformVariant>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_variant_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, PlatformVariant>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;

    Ok(entries
        .into_iter()
        .filter_map(|(name, value)| match serde_json::from_value(value) {
            Ok(variant) => Some((name, variant)),
            Err(e) => {
                debug!("Ignoring platform entry {:?}: {}", name, e);
                None
            }
        })
        .collect())
}

impl PlatformVariants {
    pub fn get(&self, platform: Platform) -> Option<&PlatformVariant> {
        match platform {
            Platform::YouTube => self.youtube.as_ref(),
            Platform::TikTok => self.tiktok.as_ref(),
            Platform::Instagram => self.instagram.as_ref(),
        }
    }
}

/// Platform-specific title and tags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformVariant {
    #[serde(default)]
    pub title: String,
    /// Plain keyword tags (YouTube)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// `#`-prefixed hashtags (TikTok, Instagram)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,
}

/// AI assessment of a clip's content and reach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub content_type: String,
    pub engagement_potential: String,
    pub suggested_improvements: Vec<String>,
    pub target_audience: String,
    pub best_platforms: Vec<String>,
    pub optimal_posting_time: String,
}

/// Where a metadata record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    /// Parsed from the model's answer
    Model,
    /// Synthesized from fixed templates
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMetadata {
    pub record: MetadataRecord,
    pub source: MetadataSource,
}
