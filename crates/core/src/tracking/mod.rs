use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{geometry::slerp_orientation, scene::NodeId, Result, Scene, SketchError};

/// Position and orientation of the viewing device at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Viewing direction: the negative local Z axis.
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// Pose `distance` units in front of this one, with the same orientation.
    pub fn ahead(&self, distance: f32) -> Self {
        Self {
            position: self.position + self.forward() * distance,
            orientation: self.orientation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Follows the device pose and keeps the tool marker placed in front of it.
/// Position snaps to the target every frame while rotation lags behind it.
#[derive(Debug)]
pub struct PoseTracker {
    camera: Pose,
    smoothed: Quat,
    smoothing: f32,
}

impl PoseTracker {
    pub fn new(smoothing: f32) -> Self {
        Self {
            camera: Pose::IDENTITY,
            smoothed: Quat::IDENTITY,
            smoothing,
        }
    }

    /// Records the latest device pose reported by the tracking session.
    pub fn observe(&mut self, pose: Pose) {
        self.camera = pose;
    }

    /// Unsmoothed placeholder pose at the tool's working distance.
    pub fn target(&self, distance: f32) -> Pose {
        self.camera.ahead(distance)
    }

    pub fn smoothed_orientation(&self) -> Quat {
        self.smoothed
    }

    /// Places `tool` directly on its target at once, with no smoothing.
    pub fn snap(&mut self, scene: &mut Scene, tool: NodeId, distance: f32) -> Result<()> {
        let target = self.target(distance);
        self.smoothed = target.orientation;
        self.apply(scene, tool, target.position)
    }

    /// Per-frame update: the tool jumps to the target position and rotates a
    /// fixed fraction of the way toward the target orientation.
    pub fn update(&mut self, scene: &mut Scene, tool: NodeId, distance: f32) -> Result<()> {
        let target = self.target(distance);
        self.smoothed = slerp_orientation(self.smoothed, target.orientation, self.smoothing);
        self.apply(scene, tool, target.position)
    }

    fn apply(&mut self, scene: &mut Scene, tool: NodeId, position: Vec3) -> Result<()> {
        let node = scene.node_mut(tool).ok_or(SketchError::MissingNode(tool))?;
        node.transform.translation = position;
        node.transform.rotation = self.smoothed;
        Ok(())
    }
}
