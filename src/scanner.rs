use crate::clip::{parse_clip_filename, ClipDescriptor, ClipStatus};
use crate::config::MonitorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Per-game totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub count: usize,
    pub size_bytes: u64,
}

/// Summary of the clips present in a folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipStats {
    pub total_clips: usize,
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
    pub games: BTreeMap<String, GameStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    PathNotFound,
}

/// Reachability of the watched folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorHealth {
    pub path: PathBuf,
    pub path_exists: bool,
    pub clips_available: usize,
    pub status: HealthStatus,
}

/// Finds existing clips under a folder
#[derive(Debug, Clone)]
pub struct ClipScanner {
    monitor: MonitorConfig,
}

impl ClipScanner {
    pub fn new(monitor: MonitorConfig) -> Self {
        Self { monitor }
    }

    /// Recursively collect clips under `root`, in traversal order.
    /// A missing folder yields an empty list.
    pub async fn scan_existing_clips(&self, root: &Path) -> Vec<ClipDescriptor> {
        if !root.exists() {
            warn!("❌ Clip folder not found: {}", root.display());
            return Vec::new();
        }

        info!("🔍 Scanning for clips in: {}", root.display());

        let root = root.to_path_buf();
        let monitor = self.monitor.clone();
        let clips = match tokio::task::spawn_blocking(move || walk_clips(&root, &monitor)).await {
            Ok(clips) => clips,
            Err(e) => {
                error!("Clip scan task failed: {}", e);
                Vec::new()
            }
        };

        info!("📊 Found {} video clips", clips.len());
        clips
    }

    /// Clip counts and sizes grouped by game; unparsed names count as `Unknown`
    pub async fn clip_stats(&self, root: &Path) -> ClipStats {
        let clips = self.scan_existing_clips(root).await;

        let mut games: BTreeMap<String, GameStats> = BTreeMap::new();
        let mut total_size_bytes = 0;

        for clip in &clips {
            let size = clip.file_size.unwrap_or(0);
            let game = clip.game_name.clone().unwrap_or_else(|| "Unknown".to_string());
            let stats = games.entry(game).or_default();
            stats.count += 1;
            stats.size_bytes += size;
            total_size_bytes += size;
        }

        ClipStats {
            total_clips: clips.len(),
            total_size_bytes,
            total_size_mb: (total_size_bytes as f64 / 1_048_576.0 * 100.0).round() / 100.0,
            games,
        }
    }

    pub async fn health(&self, root: &Path) -> MonitorHealth {
        let path_exists = root.exists();
        let clips_available = if path_exists {
            self.scan_existing_clips(root).await.len()
        } else {
            0
        };

        MonitorHealth {
            path: root.to_path_buf(),
            path_exists,
            clips_available,
            status: if path_exists {
                HealthStatus::Healthy
            } else {
                HealthStatus::PathNotFound
            },
        }
    }
}

fn walk_clips(root: &Path, monitor: &MonitorConfig) -> Vec<ClipDescriptor> {
    let mut clips = Vec::new();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_dir() || !monitor.is_scan_candidate(path) {
            continue;
        }

        // Follows symlinks, so linked clips report the target's size
        let size = match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            Ok(_) => continue,
            Err(e) => {
                warn!("Cannot stat {}: {}", path.display(), e);
                continue;
            }
        };

        let filename = entry.file_name().to_string_lossy();
        debug!("Found clip: {}", path.display());

        clips.push(
            parse_clip_filename(&filename)
                .with_file_info(path, size)
                .with_status(ClipStatus::Ready),
        );
    }

    clips
}
