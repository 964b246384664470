use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};

use crate::clip::{parse_clip_filename, ClipDescriptor, ClipStatus};
use crate::metadata::{GeneratedMetadata, MetadataGenerator, MetadataRecord, MetadataSource};
use crate::scanner::ClipScanner;
use crate::sinks::{MetadataSink, NotificationSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Processed,
    Failed,
}

/// Outcome for a single clip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub clip: ClipDescriptor,
    pub metadata: Option<MetadataRecord>,
    pub source: Option<MetadataSource>,
    pub status: ProcessingStatus,
    pub error: Option<String>,
}

impl ProcessingResult {
    fn processed(clip: ClipDescriptor, generated: GeneratedMetadata) -> Self {
        Self {
            clip,
            metadata: Some(generated.record),
            source: Some(generated.source),
            status: ProcessingStatus::Processed,
            error: None,
        }
    }

    fn failed(mut clip: ClipDescriptor, error: String) -> Self {
        clip.status = Some(ClipStatus::Error);
        Self {
            clip,
            metadata: None,
            source: None,
            status: ProcessingStatus::Failed,
            error: Some(error),
        }
    }

    pub fn is_processed(&self) -> bool {
        self.status == ProcessingStatus::Processed
    }
}

/// Overall batch results; `results` holds only successfully processed clips
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_time: Duration,
    pub results: Vec<ProcessingResult>,
}

/// Runs one clip through metadata generation and hands the result to the sinks
#[derive(Clone)]
pub struct ClipProcessor {
    generator: MetadataGenerator,
    metadata_sink: Arc<dyn MetadataSink>,
    notifier: Arc<dyn NotificationSink>,
}

impl ClipProcessor {
    pub fn new(
        generator: MetadataGenerator,
        metadata_sink: Arc<dyn MetadataSink>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            generator,
            metadata_sink,
            notifier,
        }
    }

    pub fn generator(&self) -> &MetadataGenerator {
        &self.generator
    }

    /// Generate, store and announce metadata for an already described clip
    pub async fn process_clip(&self, mut clip: ClipDescriptor) -> ProcessingResult {
        let generated = self.generator.generate_for_clip(&clip).await;

        if let Err(e) = self.metadata_sink.store(&clip.clip_id(), &generated.record).await {
            warn!("❌ Failed to store metadata for {}: {}", clip.original_filename(), e);
            self.announce(&clip, None).await;
            return ProcessingResult::failed(clip, format!("Failed to store metadata: {}", e));
        }

        clip.status = Some(ClipStatus::Ready);
        self.announce(&clip, Some(&generated.record)).await;

        info!(
            "✅ Generated metadata for {}: {} ({} hashtags)",
            clip.original_filename(),
            generated.record.title,
            generated.record.hashtags.len()
        );

        ProcessingResult::processed(clip, generated)
    }

    /// Process a file that just appeared on disk
    pub async fn process_new_clip(&self, path: &Path) -> ProcessingResult {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!("🚀 Processing new clip: {}", filename);
        let clip = parse_clip_filename(&filename).with_status(ClipStatus::Processing);

        match tokio::fs::metadata(path).await {
            Ok(metadata) => {
                self.process_clip(clip.with_file_info(path, metadata.len()))
                    .await
            }
            Err(e) => {
                warn!("⚠️ Cannot read new clip {}: {}", path.display(), e);
                let mut clip = clip;
                clip.file_path = Some(path.to_path_buf());
                self.announce(&clip, None).await;
                ProcessingResult::failed(clip, format!("Cannot read clip file: {}", e))
            }
        }
    }

    async fn announce(&self, clip: &ClipDescriptor, metadata: Option<&MetadataRecord>) {
        if let Err(e) = self.notifier.notify(clip, metadata).await {
            warn!("Notification failed for {}: {}", clip.original_filename(), e);
        }
    }
}

/// Drives the scanner and the clip processor over existing clips
pub struct BatchProcessor {
    scanner: ClipScanner,
    processor: ClipProcessor,
    root: PathBuf,
    worker_semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl BatchProcessor {
    pub fn new(scanner: ClipScanner, processor: ClipProcessor, root: PathBuf, max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        info!("🔧 Initializing BatchProcessor with {} workers", max_workers);

        Self {
            scanner,
            processor,
            root,
            worker_semaphore: Arc::new(Semaphore::new(max_workers)),
            max_concurrent: max_workers,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn scan_existing_clips(&self) -> Vec<ClipDescriptor> {
        self.scanner.scan_existing_clips(&self.root).await
    }

    /// Process at most `limit` existing clips in scan order.
    /// A failing clip is counted and skipped; it never aborts the batch.
    pub async fn process_batch(&self, limit: usize) -> BatchReport {
        let start_time = Instant::now();

        let mut clips = self.scan_existing_clips().await;
        clips.truncate(limit);
        let attempted = clips.len();

        info!("🔄 Processing {} clips...", attempted);

        let mut results = self.process_clips_parallel(clips).await;
        results.retain(|result| {
            if !result.is_processed() {
                warn!(
                    "❌ Failed to process: {} - {}",
                    result.clip.original_filename(),
                    result.error.as_deref().unwrap_or("Unknown error")
                );
            }
            result.is_processed()
        });

        let succeeded = results.len();
        info!("🎯 Successfully processed {}/{} clips", succeeded, attempted);

        BatchReport {
            attempted,
            succeeded,
            failed: attempted - succeeded,
            total_time: start_time.elapsed(),
            results,
        }
    }

    /// Process clips concurrently, bounded by the worker semaphore.
    /// Results come back in input order.
    async fn process_clips_parallel(&self, clips: Vec<ClipDescriptor>) -> Vec<ProcessingResult> {
        let (tx, mut rx) = mpsc::channel(self.max_concurrent);
        let total_clips = clips.len();

        for (index, clip) in clips.into_iter().enumerate() {
            let processor = self.processor.clone();
            let tx = tx.clone();
            let semaphore = Arc::clone(&self.worker_semaphore);

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };

                info!(
                    "📹 Processing clip {}/{}: {}",
                    index + 1,
                    total_clips,
                    clip.original_filename()
                );

                let result = processor.process_clip(clip).await;

                if let Err(e) = tx.send((index, result)).await {
                    error!("Failed to send result: {}", e);
                }
            });
        }

        // Channel closes once every task has sent its result
        drop(tx);

        let mut indexed = Vec::with_capacity(total_clips);
        while let Some(entry) = rx.recv().await {
            indexed.push(entry);
        }

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }
}
