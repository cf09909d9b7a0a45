//! Stateless vector and orientation helpers used by the draw engine and the
//! pose tracker.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box over 3D points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self::new(Vec3::MAX, Vec3::MIN)
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expanded_to_contain(self, point: Vec3) -> Self {
        Self::new(self.min.min(point), self.max.max(point))
    }

    pub fn containing(points: impl IntoIterator<Item = Vec3>) -> Self {
        points
            .into_iter()
            .fold(Self::empty(), |b, p| b.expanded_to_contain(p))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Cylinder primitive joining two points. The cylinder's axis is its local Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub radius: f32,
    pub height: f32,
}

/// Arithmetic mean of `positions`.
///
/// # Panics
///
/// Panics if `positions` is empty.
pub fn average(positions: &[Vec3]) -> Vec3 {
    assert!(!positions.is_empty(), "average of an empty point set");
    positions.iter().copied().sum::<Vec3>() / positions.len() as f32
}

/// Bounding-box centre of `positions`: the per-axis midpoint of the extremes,
/// which is generally not the mean.
///
/// # Panics
///
/// Panics if `positions` is empty.
pub fn centroid(positions: &[Vec3]) -> Vec3 {
    assert!(!positions.is_empty(), "centroid of an empty point set");
    Aabb::containing(positions.iter().copied()).center()
}

/// Cylinder spanning `from` to `to` with the given radius. Placement and
/// orientation are left to the caller.
pub fn segment_primitive(from: Vec3, to: Vec3, radius: f32) -> Cylinder {
    Cylinder {
        radius,
        height: from.distance(to),
    }
}

/// One step of exponential smoothing from `from` toward `to`. `t` is a fixed
/// per-frame factor, not a normalised time.
pub fn slerp_orientation(from: Quat, to: Quat, t: f32) -> Quat {
    from.slerp(to, t).normalize()
}

/// Rotation that turns `local_front` toward `target` when the node sits at
/// `position`, keeping the node's up as close to `up` as possible.
///
/// Segment placement passes the scene's up vector as both `up` and
/// `local_front`. That doubles as the cylinder axis, so segments end up
/// aligned with their direction of travel.
pub fn look_at_rotation(position: Vec3, target: Vec3, up: Vec3, local_front: Vec3) -> Quat {
    let forward = (target - position).normalize_or_zero();
    let front = local_front.normalize_or_zero();
    if forward == Vec3::ZERO || front == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    look_rotation(forward, up) * Quat::from_rotation_arc(front, Vec3::NEG_Z)
}

/// Rotation mapping local -Z onto `forward` and local +Y toward `up`.
fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let right = forward.cross(up);
    if right.length_squared() <= f32::EPSILON {
        // `up` is parallel to the view direction; any roll will do.
        return Quat::from_rotation_arc(Vec3::NEG_Z, forward);
    }
    let right = right.normalize();
    let up = right.cross(forward);
    Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize()
}
