use crate::config::{MonitorConfig, ProcessingConfig};
use crate::error::WatchError;
use crate::processing::ClipProcessor;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Monitoring(PathBuf),
}

type QueueSender = Arc<std::sync::Mutex<Option<mpsc::Sender<PathBuf>>>>;

struct WatchSession {
    root: PathBuf,
    subscription: RecommendedWatcher,
    /// Cleared on stop so the queue closes even if the notify thread outlives the subscription
    sender: QueueSender,
    workers: Vec<JoinHandle<()>>,
}

impl WatchSession {
    /// Cancel the subscription and close the queue; queued clips are still processed
    fn close(self) -> Vec<JoinHandle<()>> {
        drop(self.subscription);
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.workers
    }
}

/// Watches a folder for new clips and feeds them to a fixed pool of workers.
///
/// The filesystem callback only enqueues paths; metadata generation happens on
/// the workers, so a slow LLM never stalls event delivery. When the queue is
/// full, new events are dropped with a warning.
pub struct FolderWatcher {
    processor: ClipProcessor,
    monitor: MonitorConfig,
    workers: usize,
    queue_capacity: usize,
    session: Option<WatchSession>,
}

impl FolderWatcher {
    pub fn new(processor: ClipProcessor, monitor: MonitorConfig, processing: &ProcessingConfig) -> Self {
        Self {
            processor,
            monitor,
            workers: processing.workers.max(1),
            queue_capacity: processing.queue_capacity.max(1),
            session: None,
        }
    }

    pub fn state(&self) -> WatcherState {
        match &self.session {
            Some(session) => WatcherState::Monitoring(session.root.clone()),
            None => WatcherState::Idle,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.session.is_some()
    }

    /// Start watching `root` recursively. Returns `Ok(false)` when the folder
    /// does not exist. Starting while already monitoring switches to `root`.
    pub fn start_monitoring(&mut self, root: &Path) -> Result<bool, WatchError> {
        if !root.exists() {
            warn!("❌ Cannot monitor - path does not exist: {}", root.display());
            return Ok(false);
        }

        let runtime = Handle::try_current()?;

        if self.session.is_some() {
            self.stop_monitoring();
        }

        let (tx, rx) = mpsc::channel::<PathBuf>(self.queue_capacity);
        let sender: QueueSender = Arc::new(std::sync::Mutex::new(Some(tx)));

        let callback_sender = Arc::clone(&sender);
        let monitor = self.monitor.clone();
        let mut subscription =
            notify::recommended_watcher(move |event: notify::Result<Event>| match event {
                Ok(event) => enqueue_new_clips(event, &monitor, &callback_sender),
                Err(e) => warn!("Filesystem watch error: {}", e),
            })?;
        subscription.watch(root, RecursiveMode::Recursive)?;

        let queue = Arc::new(Mutex::new(rx));
        let workers = (0..self.workers)
            .map(|id| runtime.spawn(run_worker(id, Arc::clone(&queue), self.processor.clone())))
            .collect();

        self.session = Some(WatchSession {
            root: root.to_path_buf(),
            subscription,
            sender,
            workers,
        });

        info!("👀 Started monitoring: {}", root.display());
        info!("🎮 Waiting for new gaming clips...");
        Ok(true)
    }

    /// Stop watching. Clips already dispatched finish in the background.
    /// Does nothing when idle.
    pub fn stop_monitoring(&mut self) {
        match self.session.take() {
            Some(session) => {
                let root = session.root.clone();
                // Dropping the handles detaches the workers
                drop(session.close());
                info!("⏹️ Stopped clip monitoring: {}", root.display());
            }
            None => debug!("Clip monitoring already stopped"),
        }
    }

    /// Stop watching and wait for every queued clip to finish processing
    pub async fn stop_and_drain(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        let root = session.root.clone();
        let workers = session.close();
        info!("⏳ Draining {} clip workers...", workers.len());

        for outcome in futures::future::join_all(workers).await {
            if let Err(e) = outcome {
                error!("Clip worker ended abnormally: {}", e);
            }
        }

        info!("⏹️ Stopped clip monitoring: {}", root.display());
    }
}

impl Drop for FolderWatcher {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

/// Runs on the notify thread: filter and enqueue, never wait
fn enqueue_new_clips(event: Event, monitor: &MonitorConfig, sender: &QueueSender) {
    if !matches!(event.kind, EventKind::Create(_)) {
        return;
    }

    let slot = sender.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(queue) = slot.as_ref() else {
        return;
    };

    for path in event.paths {
        if path.is_dir() || !monitor.is_watch_candidate(&path) {
            continue;
        }

        info!("📹 New clip detected: {}", path.display());

        match queue.try_send(path) {
            Ok(()) => {}
            Err(TrySendError::Full(path)) => {
                warn!("⚠️ Clip queue full, dropping {}", path.display())
            }
            Err(TrySendError::Closed(path)) => {
                debug!("Clip queue closed, ignoring {}", path.display())
            }
        }
    }
}

async fn run_worker(id: usize, queue: Arc<Mutex<mpsc::Receiver<PathBuf>>>, processor: ClipProcessor) {
    debug!("Clip worker {} started", id);

    loop {
        let next = queue.lock().await.recv().await;
        let Some(path) = next else {
            break;
        };

        let result = processor.process_new_clip(&path).await;
        debug!(
            "Clip worker {} finished {} ({:?})",
            id,
            path.display(),
            result.status
        );
    }

    debug!("Clip worker {} stopped", id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipDescriptor;
    use crate::config::Config;
    use crate::error::LLMError;
    use crate::llm::{ModelInfo, LLM};
    use crate::metadata::{MetadataGenerator, MetadataRecord};
    use crate::sinks::{NotificationSink, NullSink};
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    struct OfflineLLM;

    #[async_trait]
    impl LLM for OfflineLLM {
        async fn complete(&self, _prompt: &str, _model: Option<&str>) -> Result<String, LLMError> {
            Ok(String::new())
        }

        async fn models(&self) -> Result<Vec<ModelInfo>, LLMError> {
            Ok(Vec::new())
        }

        fn default_model(&self) -> &str {
            "offline"
        }
    }

    /// Forwards processed filenames to the test
    struct ChannelNotifier(mpsc::UnboundedSender<(String, bool)>);

    #[async_trait]
    impl NotificationSink for ChannelNotifier {
        async fn notify(&self, clip: &ClipDescriptor, metadata: Option<&MetadataRecord>) -> anyhow::Result<()> {
            let _ = self.0.send((clip.original_filename().to_string(), metadata.is_some()));
            Ok(())
        }
    }

    fn watcher_with(notifier: Arc<dyn NotificationSink>) -> FolderWatcher {
        let config = Config::default();
        let processor = ClipProcessor::new(
            MetadataGenerator::new(Arc::new(OfflineLLM)),
            Arc::new(NullSink),
            notifier,
        );
        FolderWatcher::new(processor, config.monitor, &config.processing)
    }

    fn created(path: &str) -> Event {
        Event::new(EventKind::Create(notify::event::CreateKind::File)).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_full_queue_drops_events() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender: QueueSender = Arc::new(std::sync::Mutex::new(Some(tx)));
        let monitor = MonitorConfig::default();

        for path in ["/clips/a.mp4", "/clips/b.mp4", "/clips/c.mkv"] {
            enqueue_new_clips(created(path), &monitor, &sender);
        }
        enqueue_new_clips(
            Event::new(EventKind::Modify(notify::event::ModifyKind::Any)).add_path(PathBuf::from("/clips/d.mp4")),
            &monitor,
            &sender,
        );

        assert_eq!(rx.try_recv().unwrap(), PathBuf::from("/clips/a.mp4"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_cleared_sender_ignores_events() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender: QueueSender = Arc::new(std::sync::Mutex::new(Some(tx)));
        let monitor = MonitorConfig::default();

        sender.lock().unwrap().take();
        enqueue_new_clips(created("/clips/a.mp4"), &monitor, &sender);

        // Closed, not merely empty: every sender is gone
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_closed_queue_ignores_events() {
        let (tx, rx) = mpsc::channel(4);
        let sender: QueueSender = Arc::new(std::sync::Mutex::new(Some(tx)));
        drop(rx);

        enqueue_new_clips(created("/clips/a.mp4"), &MonitorConfig::default(), &sender);
        assert!(sender.lock().unwrap().as_ref().unwrap().is_closed());
    }

    #[tokio::test]
    async fn test_missing_path_stays_idle() {
        let mut watcher = watcher_with(Arc::new(NullSink));

        let started = watcher
            .start_monitoring(Path::new("/definitely/not/a/clip/folder"))
            .unwrap();

        assert!(!started);
        assert_eq!(watcher.state(), WatcherState::Idle);
    }

    #[tokio::test]
    async fn test_start_stop_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let mut watcher = watcher_with(Arc::new(NullSink));

        assert!(watcher.start_monitoring(temp_dir.path()).unwrap());
        assert_eq!(
            watcher.state(),
            WatcherState::Monitoring(temp_dir.path().to_path_buf())
        );

        watcher.stop_monitoring();
        assert_eq!(watcher.state(), WatcherState::Idle);

        watcher.stop_monitoring();
        assert_eq!(watcher.state(), WatcherState::Idle);
    }

    #[tokio::test]
    async fn test_restart_switches_folder() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let mut watcher = watcher_with(Arc::new(NullSink));

        assert!(watcher.start_monitoring(first.path()).unwrap());
        assert!(watcher.start_monitoring(second.path()).unwrap());
        assert_eq!(
            watcher.state(),
            WatcherState::Monitoring(second.path().to_path_buf())
        );

        watcher.stop_and_drain().await;
        assert!(!watcher.is_monitoring());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_new_clip_is_dispatched() {
        let temp_dir = TempDir::new().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = watcher_with(Arc::new(ChannelNotifier(tx)));

        assert!(watcher.start_monitoring(temp_dir.path()).unwrap());

        tokio::fs::write(temp_dir.path().join("notes.txt"), b"ignored").await.unwrap();
        tokio::fs::write(temp_dir.path().join("Valorant_07-12-2025_23-41-33-933.mp4"), b"clip")
            .await
            .unwrap();

        let (filename, has_metadata) = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("clip was not processed in time")
            .unwrap();

        assert_eq!(filename, "Valorant_07-12-2025_23-41-33-933.mp4");
        assert!(has_metadata);

        watcher.stop_and_drain().await;
        assert!(rx.try_recv().is_err());
    }
}
