//! Geometric kernel: planes, triangles, segments and swept-sphere queries.
//!
//! Every collision query in the engine reduces to [`Triangle::bounce`] (world
//! geometry) or [`sweep_sphere`] (body against body).

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::types::{CubeId, SideId};

/// Slack applied to barycentric coordinates so that contacts exactly on a
/// shared triangle edge are not lost to rounding.
pub const BARYCENTRIC_TOLERANCE: f32 = 1e-4;

/// How far behind a plane a segment may start and still be tested against it.
pub const BEHIND_TOLERANCE: f32 = 1e-3;

/// An infinite plane given by an anchor point and a unit normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize_or_zero(),
        }
    }

    /// Signed distance from the plane; positive on the side the normal faces.
    #[inline]
    pub fn distance_to(&self, p: Vec3) -> f32 {
        self.normal.dot(p - self.point)
    }

    /// Orthogonal projection of `p` onto the plane.
    #[inline]
    pub fn project(&self, p: Vec3) -> Vec3 {
        p - self.normal * self.distance_to(p)
    }

    /// Mirror `p` through the plane.
    #[inline]
    pub fn reflect(&self, p: Vec3) -> Vec3 {
        p - self.normal * (2.0 * self.distance_to(p))
    }
}

/// A directed line segment with cached direction and length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Vec3,
    pub end: Vec3,
    /// Unit direction, or zero for a degenerate segment.
    pub direction: Vec3,
    pub length: f32,
}

impl LineSegment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        let delta = end - start;
        let length = delta.length();
        Self {
            start,
            end,
            direction: delta.normalize_or_zero(),
            length,
        }
    }

    /// Point at `distance` units from the start.
    #[inline]
    pub fn at(&self, distance: f32) -> Vec3 {
        self.start + self.direction * distance
    }

    pub fn is_degenerate(&self) -> bool {
        self.length <= f32::EPSILON
    }
}

/// Result of a swept-sphere contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounce {
    /// Centre of the swept sphere at the moment of contact.
    pub point: Vec3,
    /// Point on the struck surface.
    pub surface: Vec3,
    /// Surface normal at the contact, facing the incoming sphere.
    pub normal: Vec3,
    /// Distance travelled along the segment before contact.
    pub distance: f32,
    /// Which of a side's two triangles was struck.
    pub triangle: Option<u8>,
    pub side: Option<SideId>,
    pub cube: Option<CubeId>,
}

impl Bounce {
    /// The nearer of two optional contacts.
    pub fn nearest(a: Option<Bounce>, b: Option<Bounce>) -> Option<Bounce> {
        match (a, b) {
            (Some(a), Some(b)) => Some(if b.distance < a.distance { b } else { a }),
            (a, None) => a,
            (None, b) => b,
        }
    }

    /// Plane through the sphere centre at contact, used to reflect the rest of a move.
    pub fn contact_plane(&self) -> Plane {
        Plane {
            point: self.point,
            normal: self.normal,
        }
    }
}

/// A triangle with its supporting plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub plane: Plane,
    pub vertices: [Vec3; 3],
}

impl Triangle {
    /// Counter-clockwise winding (right-hand rule) determines the normal.
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        Self {
            plane: Plane { point: a, normal },
            vertices: [a, b, c],
        }
    }

    /// Same triangle with the opposite winding and normal.
    pub fn flipped(&self) -> Self {
        let [a, b, c] = self.vertices;
        Self::new(a, c, b)
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.plane.normal
    }

    pub fn centroid(&self) -> Vec3 {
        let [a, b, c] = self.vertices;
        (a + b + c) / 3.0
    }

    /// Barycentric weights of `p` (assumed on or near the plane) for the three vertices.
    pub fn barycentric(&self, p: Vec3) -> Vec3 {
        let [a, b, c] = self.vertices;
        let v0 = b - a;
        let v1 = c - a;
        let v2 = p - a;
        let d00 = v0.dot(v0);
        let d01 = v0.dot(v1);
        let d11 = v1.dot(v1);
        let d20 = v2.dot(v0);
        let d21 = v2.dot(v1);
        let denom = d00 * d11 - d01 * d01;
        if denom.abs() <= f32::EPSILON {
            return Vec3::splat(-1.0);
        }
        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        Vec3::new(1.0 - v - w, v, w)
    }

    /// Barycentric containment of a point lying in the triangle's plane.
    pub fn contains(&self, p: Vec3) -> bool {
        let bary = self.barycentric(p);
        bary.min_element() >= -BARYCENTRIC_TOLERANCE
    }

    /// Sweep a sphere of `radius` along `segment` and report where it first
    /// touches the front face of this triangle.
    ///
    /// Back faces are culled: a segment travelling along or with the normal
    /// never hits. A sphere that already touches the plane at the start of
    /// the segment reports a contact at distance zero.
    pub fn bounce(&self, segment: &LineSegment, radius: f32) -> Option<Bounce> {
        let normal = self.plane.normal;
        let cos = normal.dot(segment.direction);
        if cos >= -f32::EPSILON {
            return None;
        }
        let start_distance = self.plane.distance_to(segment.start);
        if start_distance < -BEHIND_TOLERANCE {
            return None;
        }
        let travel = ((start_distance - radius) / -cos).max(0.0);
        if travel > segment.length {
            return None;
        }
        let point = segment.at(travel);
        let surface = self.plane.project(point);
        if !self.contains(surface) {
            return None;
        }
        Some(Bounce {
            point,
            surface,
            normal,
            distance: travel,
            triangle: None,
            side: None,
            cube: None,
        })
    }
}

/// Distance along `segment` at which a sphere of `radius` centred on the
/// segment first touches a sphere of `other_radius` at `center`.
///
/// Overlapping spheres only collide if the segment is heading towards the
/// other centre; spheres already separating are left alone.
pub fn sweep_sphere(segment: &LineSegment, center: Vec3, radius: f32, other_radius: f32) -> Option<f32> {
    let reach = radius + other_radius;
    let m = segment.start - center;
    let b = m.dot(segment.direction);
    let c = m.length_squared() - reach * reach;
    if c <= 0.0 {
        return (b < 0.0).then_some(0.0);
    }
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    (t <= segment.length).then_some(t.max(0.0))
}
