//! # Geo
//!
//! Geometric types used to place meshes on the build plate,
//! mostly wraps ultraviolet types with some additional functionality

use float_cmp::approx_eq;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};
use ultraviolet::{Mat3, Vec3};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Point3d {
    pub pos: Vec3,
}

impl Point3d {
    pub fn new(x: f32, y: f32, z: f32) -> Point3d {
        Point3d {
            pos: Vec3::new(x, y, z),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pos.x.is_finite() && self.pos.y.is_finite() && self.pos.z.is_finite()
    }
}

impl Add<Point3d> for Point3d {
    type Output = Point3d;

    fn add(self, other: Point3d) -> Point3d { (self.pos + other.pos).into() }
}

impl Sub<Point3d> for Point3d {
    type Output = Point3d;

    fn sub(self, other: Point3d) -> Point3d { (self.pos - other.pos).into() }
}

impl Mul<f32> for Point3d {
    type Output = Point3d;

    fn mul(self, num: f32) -> Point3d { (self.pos * num).into() }
}

impl From<Vec3> for Point3d {
    fn from(vec3: Vec3) -> Self { Point3d { pos: vec3 } }
}

impl From<Point3d> for [f32; 3] {
    fn from(point: Point3d) -> Self { [point.pos.x, point.pos.y, point.pos.z] }
}

impl From<[f32; 3]> for Point3d {
    fn from(p: [f32; 3]) -> Self { Point3d::new(p[0], p[1], p[2]) }
}

impl PartialEq for Point3d {
    fn eq(&self, other: &Self) -> bool {
        approx_eq!(f32, self.pos.x, other.pos.x, ulps = 3)
            && approx_eq!(f32, self.pos.y, other.pos.y, ulps = 3)
            && approx_eq!(f32, self.pos.z, other.pos.z, ulps = 3)
    }
}

#[derive(PartialEq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Triangle3d {
    pub p1: Point3d,
    pub p2: Point3d,
    pub p3: Point3d,
}

impl Triangle3d {
    pub fn new(p1: (f32, f32, f32), p2: (f32, f32, f32), p3: (f32, f32, f32)) -> Triangle3d {
        Triangle3d {
            p1: Point3d::new(p1.0, p1.1, p1.2),
            p2: Point3d::new(p2.0, p2.1, p2.2),
            p3: Point3d::new(p3.0, p3.1, p3.2),
        }
    }

    /// Move triangle
    ///
    /// # Examples
    ///
    /// ```
    /// use printer_plate::geo::Triangle3d;
    /// let mut tri = Triangle3d::new((1., 1., 1.), (1., 2., 1.), (2., 1., 1.));
    /// tri.translate(1., 0., 0.);
    /// assert_eq!(tri, Triangle3d::new((2., 1., 1.), (2., 2., 1.), (3., 1., 1.)));
    /// ```
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        let p = Point3d::new(x, y, z);
        self.p1 = self.p1 + p;
        self.p2 = self.p2 + p;
        self.p3 = self.p3 + p;
    }

    /// Scale triangle about the origin
    ///
    /// # Examples
    ///
    /// ```
    /// use printer_plate::geo::Triangle3d;
    /// let mut tri = Triangle3d::new((1., 1., 1.), (1., 2., 1.), (2., 1., 1.));
    /// tri.scale(2.);
    /// assert_eq!(tri, Triangle3d::new((2., 2., 2.), (2., 4., 2.), (4., 2., 2.)));
    /// ```
    pub fn scale(&mut self, factor: f32) {
        self.p1 = self.p1 * factor;
        self.p2 = self.p2 * factor;
        self.p3 = self.p3 * factor;
    }

    /// Copy of this triangle with `transform` applied to every vertex
    pub fn transformed(&self, transform: &Affine) -> Triangle3d {
        Triangle3d {
            p1: transform.apply(self.p1.pos).into(),
            p2: transform.apply(self.p2.pos).into(),
            p3: transform.apply(self.p3.pos).into(),
        }
    }

    pub fn bbox(self) -> BoundingBox {
        BoundingBox {
            min: Point3d::new(self.min_x(), self.min_y(), self.min_z()),
            max: Point3d::new(self.max_x(), self.max_y(), self.max_z()),
        }
    }

    pub fn min_x(self) -> f32 { self.p1.pos.x.min(self.p2.pos.x).min(self.p3.pos.x) }

    pub fn min_y(self) -> f32 { self.p1.pos.y.min(self.p2.pos.y).min(self.p3.pos.y) }

    pub fn min_z(self) -> f32 { self.p1.pos.z.min(self.p2.pos.z).min(self.p3.pos.z) }

    pub fn max_x(self) -> f32 { self.p1.pos.x.max(self.p2.pos.x).max(self.p3.pos.x) }

    pub fn max_y(self) -> f32 { self.p1.pos.y.max(self.p2.pos.y).max(self.p3.pos.y) }

    pub fn max_z(self) -> f32 { self.p1.pos.z.max(self.p2.pos.z).max(self.p3.pos.z) }
}

/// Axis aligned box, `min` holds the smallest value of every axis
#[derive(PartialEq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    pub fn new(min: (f32, f32, f32), max: (f32, f32, f32)) -> BoundingBox {
        BoundingBox {
            min: Point3d::new(min.0, min.1, min.2),
            max: Point3d::new(max.0, max.1, max.2),
        }
    }

    /// Smallest box containing every point
    pub fn from_points(points: &[Vec3]) -> Option<BoundingBox> {
        let first = points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &points[1..] {
            min = Vec3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Vec3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        Some(BoundingBox {
            min: min.into(),
            max: max.into(),
        })
    }

    pub fn size(&self) -> Vec3 { self.max.pos - self.min.pos }

    pub fn center(&self) -> Vec3 { (self.min.pos + self.max.pos) * 0.5 }

    /// Largest extent along any axis
    pub fn max_extent(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }

    pub fn translated(&self, offset: Vec3) -> BoundingBox {
        BoundingBox {
            min: (self.min.pos + offset).into(),
            max: (self.max.pos + offset).into(),
        }
    }

    /// Check if two boxes overlap, touching faces count as overlap
    ///
    /// # Examples
    ///
    /// ```
    /// use printer_plate::geo::BoundingBox;
    /// let a = BoundingBox::new((0., 0., 0.), (1., 1., 1.));
    /// let b = BoundingBox::new((1., 0., 0.), (2., 1., 1.));
    /// let c = BoundingBox::new((1.5, 0., 0.), (2., 1., 1.));
    /// assert!(a.intersects(&b));
    /// assert!(!a.intersects(&c));
    /// ```
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.pos.x <= other.max.pos.x
            && self.max.pos.x >= other.min.pos.x
            && self.min.pos.y <= other.max.pos.y
            && self.max.pos.y >= other.min.pos.y
            && self.min.pos.z <= other.max.pos.z
            && self.max.pos.z >= other.min.pos.z
    }

    /// The eight corners of the box
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min.pos, self.max.pos);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Axis aligned box enclosing this box after `transform`
    pub fn transformed(&self, transform: &Affine) -> BoundingBox {
        let corners: Vec<Vec3> = self.corners().iter().map(|c| transform.apply(*c)).collect();
        // corners is never empty
        BoundingBox::from_points(&corners).unwrap_or(*self)
    }
}

/// Get bounds for list of triangles, `None` when there are no triangles
pub fn get_bounds(tris: &[Triangle3d]) -> Option<BoundingBox> {
    if tris.is_empty() {
        return None;
    }
    Some(tris.par_iter().map(|tri| tri.bbox()).reduce(
        || BoundingBox::new((f32::MAX, f32::MAX, f32::MAX), (f32::MIN, f32::MIN, f32::MIN)),
        |mut acc, bbox| {
            if bbox.min.pos.x < acc.min.pos.x {
                acc.min.pos.x = bbox.min.pos.x;
            }
            if bbox.min.pos.y < acc.min.pos.y {
                acc.min.pos.y = bbox.min.pos.y;
            }
            if bbox.min.pos.z < acc.min.pos.z {
                acc.min.pos.z = bbox.min.pos.z;
            }
            if bbox.max.pos.x > acc.max.pos.x {
                acc.max.pos.x = bbox.max.pos.x;
            }
            if bbox.max.pos.y > acc.max.pos.y {
                acc.max.pos.y = bbox.max.pos.y;
            }
            if bbox.max.pos.z > acc.max.pos.z {
                acc.max.pos.z = bbox.max.pos.z;
            }
            acc
        },
    ))
}

/// Move triangles so the model is centered on x:0 y:0 and z_min is 0
pub fn move_to_plate(tris: &mut [Triangle3d]) {
    if let Some(bounds) = get_bounds(tris) {
        let center = bounds.center();
        tris.par_iter_mut()
            .for_each(|tri| tri.translate(-center.x, -center.y, -bounds.min.pos.z));
    }
}

/// Position, Euler rotation (radians, applied X then Y then Z) and
/// non-uniform scale of a mesh instance
#[derive(PartialEq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            position: Vec3::zero(),
            rotation: Vec3::zero(),
            scale: Vec3::one(),
        }
    }
}

impl Transform {
    pub fn with_position(mut self, position: Vec3) -> Transform {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Transform {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Transform {
        self.scale = scale;
        self
    }

    pub fn to_affine(&self) -> Affine {
        Affine {
            linear: euler_xyz(self.rotation) * Mat3::new(
                Vec3::new(self.scale.x, 0., 0.),
                Vec3::new(0., self.scale.y, 0.),
                Vec3::new(0., 0., self.scale.z),
            ),
            translation: self.position,
        }
    }
}

/// Rotation matrix for intrinsic X, Y, Z Euler angles
fn euler_xyz(angles: Vec3) -> Mat3 {
    let (sx, cx) = angles.x.sin_cos();
    let (sy, cy) = angles.y.sin_cos();
    let (sz, cz) = angles.z.sin_cos();
    // columns of Rx * Ry * Rz
    Mat3::new(
        Vec3::new(cy * cz, cx * sz + sx * sy * cz, sx * sz - cx * sy * cz),
        Vec3::new(-cy * sz, cx * cz - sx * sy * sz, sx * cz + cx * sy * sz),
        Vec3::new(sy, -sx * cy, cx * cy),
    )
}

/// Linear map followed by a translation
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Affine {
    pub linear: Mat3,
    pub translation: Vec3,
}

impl Affine {
    /// # Examples
    ///
    /// ```
    /// use printer_plate::geo::Transform;
    /// use ultraviolet::Vec3;
    /// let t = Transform::default()
    ///     .with_position(Vec3::new(1., 2., 3.))
    ///     .with_scale(Vec3::new(2., 2., 2.));
    /// let p = t.to_affine().apply(Vec3::new(1., 1., 1.));
    /// assert_eq!(p, Vec3::new(3., 4., 5.));
    /// ```
    pub fn apply(&self, point: Vec3) -> Vec3 { self.linear * point + self.translation }
}
