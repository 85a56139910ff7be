//! Vector types stored in batch buffers and exchanged with the renderer.
//!
//! Both are `#[repr(C)]` and `Pod` so buffers can be uploaded as raw bytes.

use bytemuck::{Pod, Zeroable};

/// 3D Vector - control-point position, bounds corner
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// All components `+inf`.
    pub const INFINITY: Self = Self::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);

    /// All components `-inf`.
    pub const NEG_INFINITY: Self =
        Self::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Component-wise minimum
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Component-wise maximum
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// One control point: position plus a scalar payload (width, parameter...).
///
/// Layout matches a GPU `vec4<f32>`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ControlPoint {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// Scalar payload
    pub w: f32,
}

impl ControlPoint {
    /// Creates a new control point
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// All zero
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Builds a control point from a position and payload.
    #[inline]
    #[must_use]
    pub const fn from_position(position: Vec3, w: f32) -> Self {
        Self::new(position.x, position.y, position.z, w)
    }

    /// The spatial part.
    #[inline]
    #[must_use]
    pub const fn position(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Linear extrapolation one step past `self`, away from `next`:
    /// `self * 2 - next`, on all four components.
    #[inline]
    #[must_use]
    pub fn extrapolate(self, next: Self) -> Self {
        Self::new(
            self.x * 2.0 - next.x,
            self.y * 2.0 - next.y,
            self.z * 2.0 - next.z,
            self.w * 2.0 - next.w,
        )
    }
}
