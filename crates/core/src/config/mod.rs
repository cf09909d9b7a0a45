use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub tool: ToolConfig,
    pub playback: PlaybackConfig,
}

impl AppConfig {
    /// Parses a JSON document. Missing sections and fields fall back to their
    /// defaults.
    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&source)?;
        tracing::debug!(?path, "loaded configuration");
        Ok(config)
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub block_size: usize,
    /// File stem of the temporary narration export. Repeated recordings
    /// overwrite the same file.
    pub export_name: String,
    pub export_dir: Option<PathBuf>,
    /// Remove a stale export left over from a previous run at startup.
    pub clean_on_start: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            block_size: 1024,
            export_name: "TempTestFile".to_string(),
            export_dir: None,
            clean_on_start: true,
        }
    }
}

impl AudioConfig {
    /// Directory the narration is exported into. Defaults to a temporary
    /// folder next to the user's documents, or the system temp dir when the
    /// platform has no documents directory.
    pub fn export_directory(&self) -> PathBuf {
        if let Some(dir) = &self.export_dir {
            return dir.clone();
        }
        dirs::document_dir()
            .map(|documents| documents.join(".airsketch-tmp"))
            .unwrap_or_else(|| std::env::temp_dir().join("airsketch"))
    }
}

/// Initial tool state and the bounds pinch gestures may move it within.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Brush radius used for points and segments.
    pub size: f32,
    pub distance_from_camera: f32,
    pub marker_scale: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            size: 0.005,
            distance_from_camera: 0.3,
            marker_scale: 0.2,
            min_size: 0.001,
            max_size: 0.05,
            min_distance: 0.1,
            max_distance: 2.0,
        }
    }
}

/// Gating constants used by the listen engine and the pose tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Pointer-to-point distance below which an entry can play.
    pub proximity_threshold: f32,
    /// How far past a point's timestamp the audio may run before it stalls.
    pub lookahead_seconds: f64,
    /// Window before the lookahead boundary in which the cursor advances.
    pub catch_up_seconds: f64,
    /// Fixed slerp factor applied to the tool orientation every frame.
    pub orientation_smoothing: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 0.1,
            lookahead_seconds: 0.1,
            catch_up_seconds: 0.01,
            orientation_smoothing: 0.1,
        }
    }
}
