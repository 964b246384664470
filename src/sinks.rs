//! Collaborator interfaces the pipeline hands its results to

use crate::clip::ClipDescriptor;
use crate::metadata::MetadataRecord;
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Stores generated metadata for a clip
#[async_trait]
pub trait MetadataSink: Send + Sync {
    async fn store(&self, clip_id: &str, metadata: &MetadataRecord) -> Result<()>;
}

/// Announces a processed clip; `metadata` is `None` when processing failed
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, clip: &ClipDescriptor, metadata: Option<&MetadataRecord>) -> Result<()>;
}

/// Writes results to the log
#[derive(Debug, Clone, Default)]
pub struct LoggingSink;

#[async_trait]
impl MetadataSink for LoggingSink {
    async fn store(&self, clip_id: &str, metadata: &MetadataRecord) -> Result<()> {
        info!("💾 {} -> {}", clip_id, metadata.title);
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for LoggingSink {
    async fn notify(&self, clip: &ClipDescriptor, metadata: Option<&MetadataRecord>) -> Result<()> {
        match metadata {
            Some(metadata) => info!(
                "📝 {}: {} ({} hashtags)",
                clip.original_filename(),
                metadata.title,
                metadata.hashtags.len()
            ),
            None => info!("⚠️ No metadata for {}", clip.original_filename()),
        }
        Ok(())
    }
}

/// Discards everything
#[derive(Debug, Clone, Default)]
pub struct NullSink;

#[async_trait]
impl MetadataSink for NullSink {
    async fn store(&self, _clip_id: &str, _metadata: &MetadataRecord) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for NullSink {
    async fn notify(&self, _clip: &ClipDescriptor, _metadata: Option<&MetadataRecord>) -> Result<()> {
        Ok(())
    }
}
