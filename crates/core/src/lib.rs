//! Core library for AirSketch: draw lines in space while narrating, then
//! replay the narration by tracing the same lines again.
//!
//! Each module owns one subsystem. [`Session`] ties them together and is
//! driven once per rendered frame by the host application.

pub mod audio;
pub mod config;
pub mod draw;
pub mod error;
pub mod geometry;
pub mod listen;
pub mod record;
pub mod scene;
pub mod session;
pub mod timeline;
pub mod tool;
pub mod tracking;

pub use audio::{AudioEngine, AudioRoute, Player, PlayerState};
pub use config::{AppConfig, AudioConfig, PlaybackConfig, ToolConfig};
pub use draw::{DrawEngine, DrawOutcome, StrokeSample};
pub use error::{Result, SketchError};
pub use listen::{ListenEngine, ListenOutcome};
pub use record::{ExportHandle, Recorder, RecordingSettings};
pub use scene::{Color, Geometry, Node, NodeId, Scene, Transform};
pub use session::{FrameReport, Gesture, Session};
pub use timeline::{LineEntry, LineGroup, LineStore};
pub use tool::{SwipeDirection, Tool, ToolMode};
pub use tracking::{Pose, PoseTracker};
