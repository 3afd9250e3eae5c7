//! Math utilities and types
//!
//! Positions are kept in double precision since scene coordinates are
//! frequently far from the origin.

use serde::{Deserialize, Serialize};

pub use nalgebra::{Rotation3, Unit, Vector3};

/// 3D point type used for entity positions and polygon vertices
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// Linear interpolation between two values of the same type
pub trait Lerp: Sized {
    /// Interpolate between `self` and `other`; `t` is in `[0, 1]`
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Point3 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Self::from(self.coords.lerp(&other.coords, t))
    }
}

/// Element-wise; lists of different length snap to `other` only at `t == 1`
impl<T: Lerp + Clone> Lerp for Vec<T> {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        if self.len() != other.len() {
            return if t < 1.0 { self.clone() } else { other.clone() };
        }
        self.iter().zip(other).map(|(a, b)| a.lerp(b, t)).collect()
    }
}

/// RGBA color with floating point components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red component
    pub red: f32,
    /// Green component
    pub green: f32,
    /// Blue component
    pub blue: f32,
    /// Alpha component (1.0 is fully opaque)
    pub alpha: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Opaque black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Create a color from its components
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self { red, green, blue, alpha }
    }

    /// Create a color from 8-bit components
    pub fn from_bytes(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self::new(
            f32::from(red) / 255.0,
            f32::from(green) / 255.0,
            f32::from(blue) / 255.0,
            f32::from(alpha) / 255.0,
        )
    }

    /// Convert to 8-bit components, clamping out-of-range values
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_bytes(self) -> [u8; 4] {
        let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [to_byte(self.red), to_byte(self.green), to_byte(self.blue), to_byte(self.alpha)]
    }

    /// Same color with a different alpha
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// True when the color has no transparency
    #[allow(clippy::float_cmp)]
    pub fn is_opaque(&self) -> bool {
        self.alpha == 1.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Lerp for Color {
    #[allow(clippy::cast_possible_truncation)]
    fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t as f32;
        Self::new(
            self.red + (other.red - self.red) * t,
            self.green + (other.green - self.green) * t,
            self.blue + (other.blue - self.blue) * t,
            self.alpha + (other.alpha - self.alpha) * t,
        )
    }
}
