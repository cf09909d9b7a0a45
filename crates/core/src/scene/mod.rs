//! Scene graph owning every point, segment, group and tool node.
//!
//! Nodes live in a generational slot arena. A [`NodeId`] stays valid until
//! the node is removed; afterwards every lookup with it fails instead of
//! aliasing whatever reuses the slot.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{geometry::Cylinder, Result, SketchError};

/// Handle to a node owned by a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Local transform of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Diffuse material colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Marks entries that have been played back.
    pub const DARK_GRAY: Self = Self::rgb(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Sphere { radius: f32 },
    Cylinder(Cylinder),
}

/// Node payload. Hierarchy links are managed by the [`Scene`].
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub geometry: Option<Geometry>,
    pub color: Color,
    pub hidden: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            geometry: None,
            color: Color::WHITE,
            hidden: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut scene = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        scene.root = scene.insert(Node::new("root"));
        scene
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// World-space up vector of the root node.
    pub fn world_up(&self) -> Vec3 {
        self.node(self.root)
            .map(|root| (root.transform.rotation * Vec3::Y).normalize())
            .unwrap_or(Vec3::Y)
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Inserts `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId> {
        if !self.contains(parent) {
            return Err(SketchError::MissingNode(parent));
        }
        node.parent = Some(parent);
        node.children.clear();
        let id = self.insert(node);
        self.get_mut(parent)?.children.push(id);
        Ok(id)
    }

    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.node(id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Some(matrix)
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id)
            .map(|matrix| matrix.transform_point3(Vec3::ZERO))
    }

    /// Rewrites the local transform of `id` so its world transform becomes
    /// `world`.
    pub fn set_world_transform(&mut self, id: NodeId, world: Mat4) -> Result<()> {
        let parent_world = match self.get(id)?.parent {
            Some(parent) => self
                .world_matrix(parent)
                .ok_or(SketchError::MissingNode(parent))?,
            None => Mat4::IDENTITY,
        };
        let local = parent_world.inverse() * world;
        self.get_mut(id)?.transform = Transform::from_matrix(local);
        Ok(())
    }

    /// Moves `id` under `parent`, keeping its local transform.
    pub fn reparent(&mut self, id: NodeId, parent: NodeId) -> Result<()> {
        if id == self.root || self.is_ancestor_or_self(id, parent)? {
            return Err(SketchError::InvalidReparent { child: id, parent });
        }
        self.detach(id)?;
        self.get_mut(parent)?.children.push(id);
        self.get_mut(id)?.parent = Some(parent);
        Ok(())
    }

    /// Moves `id` under `parent` so that its world transform is unchanged.
    pub fn reparent_preserving_world(&mut self, id: NodeId, parent: NodeId) -> Result<()> {
        let world = self.world_matrix(id).ok_or(SketchError::MissingNode(id))?;
        self.reparent(id, parent)?;
        self.set_world_transform(id, world)
    }

    /// Removes `id` and its whole subtree from the scene. The root cannot be
    /// removed.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(SketchError::msg("the scene root cannot be removed"));
        }
        self.detach(id)?;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let slot = &mut self.slots[next.index as usize];
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(next.index);
                pending.extend(node.children);
            }
        }
        Ok(())
    }

    fn insert(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    fn detach(&mut self, id: NodeId) -> Result<()> {
        if let Some(parent) = self.get_mut(id)?.parent.take() {
            if let Some(parent) = self.node_mut(parent) {
                parent.children.retain(|child| *child != id);
            }
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> Result<bool> {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return Ok(true);
            }
            current = self.get(node)?.parent;
        }
        Ok(false)
    }

    fn get(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(SketchError::MissingNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.node_mut(id).ok_or(SketchError::MissingNode(id))
    }
}
