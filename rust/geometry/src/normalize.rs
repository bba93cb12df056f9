// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement normalization for hosts that only accept rigid transforms
//!
//! Host placement APIs take rotation + translation only. Source transforms may
//! carry scale, shear and reflection, so each placement is split into:
//!
//! - a [`RigidTransform`] (orthonormal, right-handed basis + translation), and
//! - [`MirrorFlags`] describing the reflection to apply after placement.
//!
//! Basis vectors are the columns of the upper-left 3x3 block; the translation
//! is the fourth column (same convention as `Matrix4::transform_point`).

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use std::fmt;

/// Tolerance for unit basis lengths and pairwise dot products in [`is_rigid`].
pub const RIGID_TOLERANCE: f64 = 1e-4;

/// Basis vectors shorter than this are treated as collapsed.
const DEGENERATE_LENGTH: f64 = 1e-6;

/// Build a transform from 16 row-major values (translation in elements 3, 7, 11).
#[inline]
pub fn matrix_from_row_major(values: &[f64; 16]) -> Matrix4<f64> {
    Matrix4::from_row_slice(values)
}

/// Principal axis of a placement frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        })
    }
}

/// Reflections still owed to a placed object, one flag per principal axis.
///
/// [`mirror_state`] never sets more than one flag: two reflections compose
/// to a rotation, which the rigid part already carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorFlags {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl MirrorFlags {
    pub const NONE: MirrorFlags = MirrorFlags {
        x: false,
        y: false,
        z: false,
    };

    #[inline]
    pub fn any(&self) -> bool {
        self.x || self.y || self.z
    }

    pub fn count(&self) -> usize {
        self.axes().count()
    }

    /// Set axes in X, Y, Z order.
    pub fn axes(&self) -> impl Iterator<Item = Axis> {
        [(self.x, Axis::X), (self.y, Axis::Y), (self.z, Axis::Z)]
            .into_iter()
            .filter_map(|(set, axis)| set.then_some(axis))
    }
}

/// Oriented plane: origin plus two in-plane directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub origin: Point3<f64>,
    pub x_dir: Vector3<f64>,
    pub y_dir: Vector3<f64>,
}

impl Plane {
    pub fn new(origin: Point3<f64>, x_dir: Vector3<f64>, y_dir: Vector3<f64>) -> Self {
        Self {
            origin,
            x_dir,
            y_dir,
        }
    }

    /// Unit normal (x_dir × y_dir).
    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.x_dir.cross(&self.y_dir).normalize()
    }

    /// Householder reflection across this plane.
    pub fn reflection_matrix(&self) -> Matrix4<f64> {
        let n = self.normal();
        let linear = Matrix3::identity() - 2.0 * n * n.transpose();
        let offset = 2.0 * self.origin.coords.dot(&n) * n;

        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&linear);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&offset);
        m
    }
}

/// Rotation + translation, the only placement a host accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    /// Orthonormal basis, columns are the local X, Y, Z axes.
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Takes the linear block and translation verbatim; callers normalize first.
    pub fn from_matrix(m: &Matrix4<f64>) -> Self {
        Self {
            rotation: m.fixed_view::<3, 3>(0, 0).into_owned(),
            translation: m.fixed_view::<3, 1>(0, 3).into_owned(),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.rotation);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        m
    }

    #[inline]
    pub fn origin(&self) -> Point3<f64> {
        Point3::from(self.translation)
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> Vector3<f64> {
        self.rotation.column(axis.index()).into_owned()
    }

    /// Plane through the origin whose normal is `axis`, spanned by the two other axes.
    pub fn mirror_plane(&self, axis: Axis) -> Plane {
        let origin = self.origin();
        match axis {
            Axis::X => Plane::new(origin, self.axis(Axis::Y), self.axis(Axis::Z)),
            Axis::Y => Plane::new(origin, self.axis(Axis::Z), self.axis(Axis::X)),
            Axis::Z => Plane::new(origin, self.axis(Axis::X), self.axis(Axis::Y)),
        }
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[inline]
fn basis(m: &Matrix4<f64>) -> [Vector3<f64>; 3] {
    [
        m.fixed_view::<3, 1>(0, 0).into_owned(),
        m.fixed_view::<3, 1>(0, 1).into_owned(),
        m.fixed_view::<3, 1>(0, 2).into_owned(),
    ]
}

/// Orthonormal, unit-scale linear part within [`RIGID_TOLERANCE`].
pub fn is_rigid(m: &Matrix4<f64>) -> bool {
    is_rigid_with_tolerance(m, RIGID_TOLERANCE)
}

pub fn is_rigid_with_tolerance(m: &Matrix4<f64>, tolerance: f64) -> bool {
    let [x, y, z] = basis(m);
    let unit = |v: &Vector3<f64>| (v.norm() - 1.0).abs() <= tolerance;

    unit(&x)
        && unit(&y)
        && unit(&z)
        && x.dot(&y).abs() <= tolerance
        && y.dot(&z).abs() <= tolerance
        && z.dot(&x).abs() <= tolerance
}

/// Any direction not parallel to `z`.
#[inline]
fn perpendicular_seed(z: &Vector3<f64>) -> Vector3<f64> {
    if z.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    }
}

/// Rebuild an orthonormal, right-handed basis, Z axis first.
///
/// Z keeps its direction, X becomes Y × Z and Y becomes Z × X. The result is
/// a proper rotation: a reflected input loses its reflection here and must be
/// restored from [`mirror_state`]. Translation is copied unchanged.
pub fn strip_scale_and_skew(m: &Matrix4<f64>) -> Matrix4<f64> {
    let [_, y, z] = basis(m);

    let z_axis = if z.norm() < DEGENERATE_LENGTH {
        Vector3::z()
    } else {
        z.normalize()
    };

    let y_cross_z = y.cross(&z_axis);
    let x_axis = if y_cross_z.norm() < DEGENERATE_LENGTH {
        // Seed is only guaranteed non-parallel; re-orthogonalize through Y below
        let seed = perpendicular_seed(&z_axis);
        let y_axis = z_axis.cross(&seed).normalize();
        y_axis.cross(&z_axis).normalize()
    } else {
        y_cross_z.normalize()
    };

    let y_axis = z_axis.cross(&x_axis).normalize();

    let mut result = Matrix4::identity();
    result.fixed_view_mut::<3, 1>(0, 0).copy_from(&x_axis);
    result.fixed_view_mut::<3, 1>(0, 1).copy_from(&y_axis);
    result.fixed_view_mut::<3, 1>(0, 2).copy_from(&z_axis);
    result
        .fixed_view_mut::<3, 1>(0, 3)
        .copy_from(&m.fixed_view::<3, 1>(0, 3));
    result
}

/// Reflection carried by the linear part, as at most one flag (X by convention).
pub fn mirror_state(m: &Matrix4<f64>) -> MirrorFlags {
    let linear: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();
    if linear.determinant() < 0.0 {
        MirrorFlags {
            x: true,
            ..MirrorFlags::NONE
        }
    } else {
        MirrorFlags::NONE
    }
}

/// A source placement split into what the host can place and what it must mirror.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPlacement {
    pub rigid: RigidTransform,
    pub mirror: MirrorFlags,
    /// Whether scale, shear or reflection had to be removed.
    pub stripped: bool,
}

/// Rigidity test, strip if needed, mirror detection, then unit scaling of the translation.
///
/// Orthonormal inputs with a negative determinant are stripped as well so the
/// host never receives a reflection inside the placement matrix.
pub fn normalize_placement(m: &Matrix4<f64>, translation_scale: f64) -> NormalizedPlacement {
    let mirror = mirror_state(m);
    let stripped = mirror.any() || !is_rigid(m);

    let linear = if stripped { strip_scale_and_skew(m) } else { *m };
    let mut rigid = RigidTransform::from_matrix(&linear);
    rigid.translation *= translation_scale;

    NormalizedPlacement {
        rigid,
        mirror,
        stripped,
    }
}
