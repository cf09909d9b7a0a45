//! Turns the stream of tool poses into point and segment nodes while the user
//! is drawing, and groups them under one node per line once drawing stops.

use glam::Vec3;

use crate::{
    geometry::{average, centroid, look_at_rotation, segment_primitive},
    scene::{Geometry, Node, NodeId, Transform},
    timeline::{LineEntry, LineStore},
    tracking::Pose,
    Result, Scene, SketchError,
};

/// Input for one drawing frame.
#[derive(Debug, Clone, Copy)]
pub struct StrokeSample {
    /// Target pose of the tool this frame.
    pub pose: Pose,
    pub brush_size: f32,
    /// Elapsed narration time in seconds.
    pub recording_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOutcome {
    Idle,
    /// A new line was opened; no point is placed on this frame.
    Started,
    Sampled {
        point: NodeId,
        segment: Option<NodeId>,
    },
    /// The line was closed. `group` is `None` when no points were drawn.
    Finished { group: Option<NodeId> },
}

/// Nodes of the line currently being drawn. They hang off a transient buffer
/// node until the line is finalised.
#[derive(Debug)]
struct ActiveLine {
    buffer: NodeId,
    nodes: Vec<NodeId>,
    last_position: Option<Vec3>,
    first_entry: usize,
}

#[derive(Debug, Default)]
pub struct DrawEngine {
    active: Option<ActiveLine>,
}

impl DrawEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Advances the drawing state machine by one frame. `sample` is `Some`
    /// while the drawing signal is held.
    pub fn update(
        &mut self,
        sample: Option<StrokeSample>,
        scene: &mut Scene,
        store: &mut LineStore,
    ) -> Result<DrawOutcome> {
        match (sample, self.active.is_some()) {
            (Some(_), false) => {
                let buffer = scene.add_child(scene.root(), Node::new("line-buffer"))?;
                self.active = Some(ActiveLine {
                    buffer,
                    nodes: Vec::new(),
                    last_position: None,
                    first_entry: store.len(),
                });
                tracing::debug!("line started");
                Ok(DrawOutcome::Started)
            }
            (Some(sample), true) => self.sample(sample, scene, store),
            (None, true) => self.finish(scene, store),
            (None, false) => Ok(DrawOutcome::Idle),
        }
    }

    fn sample(
        &mut self,
        sample: StrokeSample,
        scene: &mut Scene,
        store: &mut LineStore,
    ) -> Result<DrawOutcome> {
        let world_up = scene.world_up();
        let line = self
            .active
            .as_mut()
            .ok_or_else(|| SketchError::msg("no line is being drawn"))?;
        let position = sample.pose.position;
        // The buffer was deleted mid-line; keep drawing into a fresh one.
        if !scene.contains(line.buffer) {
            line.buffer = scene.add_child(scene.root(), Node::new("line-buffer"))?;
            line.nodes.retain(|id| scene.contains(*id));
        }

        let point = scene.add_child(
            line.buffer,
            Node::new("point")
                .with_transform(Transform::from_translation_rotation(
                    position,
                    sample.pose.orientation,
                ))
                .with_geometry(Geometry::Sphere {
                    radius: sample.brush_size,
                }),
        )?;
        line.nodes.push(point);

        let segment = match line.last_position {
            Some(previous) => {
                let midpoint = average(&[previous, position]);
                let cylinder = segment_primitive(previous, position, sample.brush_size);
                let rotation = look_at_rotation(midpoint, position, world_up, world_up);
                let segment = scene.add_child(
                    line.buffer,
                    Node::new("segment")
                        .with_transform(Transform::from_translation_rotation(midpoint, rotation))
                        .with_geometry(Geometry::Cylinder(cylinder)),
                )?;
                line.nodes.push(segment);
                Some(segment)
            }
            None => None,
        };
        line.last_position = Some(position);

        store.push(LineEntry {
            point,
            segment,
            recording_time: sample.recording_time,
        });
        Ok(DrawOutcome::Sampled { point, segment })
    }

    fn finish(&mut self, scene: &mut Scene, store: &mut LineStore) -> Result<DrawOutcome> {
        let Some(mut line) = self.active.take() else {
            return Ok(DrawOutcome::Idle);
        };
        // Nodes deleted while drawing are left out of the group.
        line.nodes.retain(|id| scene.contains(*id));

        let group = if line.nodes.is_empty() {
            None
        } else {
            let positions = line
                .nodes
                .iter()
                .filter_map(|id| scene.world_position(*id))
                .collect::<Vec<_>>();
            let center = centroid(&positions);
            let group = scene.add_child(
                scene.root(),
                Node::new("line").with_transform(Transform::from_translation(center)),
            )?;
            for node in &line.nodes {
                scene.reparent_preserving_world(*node, group)?;
            }
            store.finish_line(group, line.first_entry);
            tracing::info!(
                points = store.len() - line.first_entry,
                nodes = line.nodes.len(),
                "line finalised"
            );
            Some(group)
        };

        if scene.contains(line.buffer) {
            scene.remove(line.buffer)?;
        }
        Ok(DrawOutcome::Finished { group })
    }
}
