//! Clip Conductor
//!
//! Watches a gaming-capture folder, recognizes clips by their filename and
//! generates social-media metadata for them with a local Ollama model.

pub mod clip;
pub mod config;
pub mod error;
pub mod llm;
pub mod metadata;
pub mod processing;
pub mod scanner;
pub mod sinks;
pub mod watcher;

// Re-export main types for easy access
pub use crate::clip::{parse_clip_filename, ClipDescriptor, ClipStatus};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{LLMError, MetadataParseError, WatchError};
pub use crate::llm::{OllamaClient, LLM};
pub use crate::metadata::{MetadataGenerator, MetadataRecord, Platform};
pub use crate::processing::{BatchProcessor, BatchReport, ClipProcessor, ProcessingResult};
pub use crate::scanner::ClipScanner;
pub use crate::sinks::{LoggingSink, MetadataSink, NotificationSink};
pub use crate::watcher::{FolderWatcher, WatcherState};
