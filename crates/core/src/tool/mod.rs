use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    config::ToolConfig,
    scene::{Geometry, Node, NodeId, Transform},
    Result, Scene, SketchError,
};

/// Interaction mode of the hand-held tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolMode {
    /// Long presses draw new lines.
    Pen,
    /// The tool acts as the replay pointer.
    Player,
}

impl ToolMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Pen => Self::Player,
            Self::Player => Self::Pen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwipeDirection {
    Left,
    Right,
}

/// Tool state shared by the draw and listen engines.
#[derive(Debug)]
pub struct Tool {
    mode: ToolMode,
    size: f32,
    distance_from_camera: f32,
    selection: Vec<NodeId>,
    node: NodeId,
    limits: ToolConfig,
}

impl Tool {
    /// Creates the tool and its marker node under the scene root.
    pub fn new(config: &ToolConfig, scene: &mut Scene) -> Result<Self> {
        let marker = Node::new("tool")
            .with_transform(Transform {
                scale: Vec3::splat(config.marker_scale),
                ..Transform::IDENTITY
            })
            .with_geometry(Geometry::Sphere {
                radius: config.size,
            });
        let node = scene.add_child(scene.root(), marker)?;

        Ok(Self {
            mode: ToolMode::Pen,
            size: config.size,
            distance_from_camera: config.distance_from_camera,
            selection: Vec::new(),
            node,
            limits: config.clone(),
        })
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn distance_from_camera(&self) -> f32 {
        self.distance_from_camera
    }

    /// The marker node: the drawing cursor in pen mode, the replay pointer in
    /// player mode.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Both swipe directions flip between the two modes. The marker is hidden
    /// while in player mode.
    pub fn swipe(&mut self, direction: SwipeDirection, scene: &mut Scene) -> Result<ToolMode> {
        self.mode = self.mode.toggled();
        self.marker_mut(scene)?.hidden = self.mode == ToolMode::Player;
        tracing::debug!(?direction, mode = ?self.mode, "tool mode switched");
        Ok(self.mode)
    }

    /// Scales the brush size in pen mode and the working distance in player
    /// mode, clamped to the configured bounds.
    pub fn pinch(&mut self, scale: f32, scene: &mut Scene) -> Result<()> {
        if !scale.is_finite() || scale <= 0.0 {
            return Ok(());
        }
        match self.mode {
            ToolMode::Pen => {
                self.size = (self.size * scale).clamp(self.limits.min_size, self.limits.max_size);
                let size = self.size;
                self.marker_mut(scene)?.geometry = Some(Geometry::Sphere { radius: size });
            }
            ToolMode::Player => {
                self.distance_from_camera = (self.distance_from_camera * scale)
                    .clamp(self.limits.min_distance, self.limits.max_distance);
            }
        }
        Ok(())
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    /// Adds `node` to the selection, or removes it if it is already selected.
    pub fn toggle_selection(&mut self, node: NodeId) {
        if let Some(index) = self.selection.iter().position(|selected| *selected == node) {
            self.selection.remove(index);
        } else {
            self.selection.push(node);
        }
    }

    pub fn take_selection(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.selection)
    }

    fn marker_mut<'a>(&self, scene: &'a mut Scene) -> Result<&'a mut Node> {
        scene
            .node_mut(self.node)
            .ok_or(SketchError::MissingNode(self.node))
    }
}
