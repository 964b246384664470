use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the clip pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Watched folder and recognized file types
    pub monitor: MonitorConfig,

    /// LLM endpoint settings
    pub llm: LLMConfig,

    /// Concurrency and batch settings
    pub processing: ProcessingConfig,

    /// Logging and result output
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Folder where the capture tool drops clips
    pub watch_dir: PathBuf,

    /// Extensions picked up by directory scans
    pub scan_extensions: Vec<String>,

    /// Extensions that trigger processing when a new file appears
    pub watch_extensions: Vec<String>,
}

/// Ollama endpoint and sampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Base URL of the Ollama server
    pub base_url: String,

    /// Model used when a request does not name one
    pub default_model: String,

    pub temperature: f32,

    /// Nucleus sampling threshold
    pub top_p: f32,

    /// Maximum output length
    pub max_tokens: u32,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Concurrent metadata generations
    pub workers: usize,

    /// Pending new-clip events buffered by the folder watcher
    pub queue_capacity: usize,

    /// Default number of clips for a batch run
    pub batch_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Log level filter used when RUST_LOG is not set
    pub log_level: String,

    /// Where batch runs write their JSON report
    pub results_file: Option<PathBuf>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            default_model: "deepseek-r1:latest".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 500,
            timeout_seconds: 60,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            watch_dir: PathBuf::from("Outplayed"),
            scan_extensions: vec!["mp4".to_string()],
            watch_extensions: vec![
                "mp4".to_string(),
                "mov".to_string(),
                "avi".to_string(),
                "mkv".to_string(),
            ],
        }
    }
}

impl MonitorConfig {
    pub fn is_scan_candidate(&self, path: &Path) -> bool {
        has_extension(path, &self.scan_extensions)
    }

    pub fn is_watch_candidate(&self, path: &Path) -> bool {
        has_extension(path, &self.watch_extensions)
    }
}

/// Case-insensitive extension check
fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = ["clip-conductor.toml", "config/clip-conductor.toml"];

        for path in &config_paths {
            if Path::new(path).exists() {
                return Self::load_from(Path::new(path));
            }
        }

        Self::from_env()
    }

    /// Load configuration from a specific TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: Config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;

        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("CLIP_CONDUCTOR_WATCH_DIR") {
            config.monitor.watch_dir = PathBuf::from(dir);
        }

        if let Ok(base_url) = std::env::var("CLIP_CONDUCTOR_OLLAMA_BASE_URL") {
            config.llm.base_url = base_url;
        }

        if let Ok(model) = std::env::var("CLIP_CONDUCTOR_OLLAMA_MODEL") {
            config.llm.default_model = model;
        }

        if let Ok(workers) = std::env::var("CLIP_CONDUCTOR_WORKERS") {
            config.processing.workers = workers
                .parse()
                .map_err(|e| anyhow!("Invalid CLIP_CONDUCTOR_WORKERS {:?}: {}", workers, e))?;
        }

        if let Ok(log_level) = std::env::var("CLIP_CONDUCTOR_LOG_LEVEL") {
            config.output.log_level = log_level;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.processing.workers == 0 {
            return Err(anyhow!("workers must be greater than 0"));
        }

        if self.processing.queue_capacity == 0 {
            return Err(anyhow!("queue_capacity must be greater than 0"));
        }

        if self.monitor.scan_extensions.is_empty() {
            return Err(anyhow!("scan_extensions must not be empty"));
        }

        if self.llm.timeout_seconds == 0 {
            return Err(anyhow!("LLM timeout must be greater than 0"));
        }

        url::Url::parse(&self.llm.base_url)
            .map_err(|e| anyhow!("Invalid LLM base URL {:?}: {}", self.llm.base_url, e))?;

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Clip Conductor Configuration:\n\
            - Watch Directory: {}\n\
            - Scan Extensions: {}\n\
            - Watch Extensions: {}\n\
            - LLM: {} ({})\n\
            - Workers: {}\n\
            - Queue Capacity: {}",
            self.monitor.watch_dir.display(),
            self.monitor.scan_extensions.join(", "),
            self.monitor.watch_extensions.join(", "),
            self.llm.base_url,
            self.llm.default_model,
            self.processing.workers,
            self.processing.queue_capacity,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            llm: LLMConfig::default(),
            processing: ProcessingConfig {
                workers: num_cpus::get().min(4), // Bounded by how many generations the LLM host can serve
                queue_capacity: 64,
                batch_limit: 5,
            },
            output: OutputConfig {
                log_level: "info".to_string(),
                results_file: None,
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_watch_dir(mut self, dir: PathBuf) -> Self {
        self.config.monitor.watch_dir = dir;
        self
    }

    pub fn with_llm_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.llm.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.llm.default_model = model.into();
        self
    }

    pub fn with_llm_timeout(mut self, seconds: u64) -> Self {
        self.config.llm.timeout_seconds = seconds;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.processing.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.processing.queue_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
