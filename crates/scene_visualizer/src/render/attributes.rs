//! Per-instance attributes of merged primitives

// `derive(Pod)` expands to unsafe impls
#![allow(unsafe_code)]

use crate::foundation::math::Color;
use bytemuck::{Pod, Zeroable};

/// Fixed-size attribute block stored for every instance of a merged
/// primitive. Only these values can change without a rebuild.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct InstanceAttributes {
    /// RGBA color, 8 bits per channel
    pub color: [u8; 4],
    /// 1 when the instance is drawn, 0 when hidden
    pub show: u8,
}

impl InstanceAttributes {
    /// Build an attribute block from a color and a visibility flag
    pub fn new(color: Color, show: bool) -> Self {
        Self {
            color: color.to_bytes(),
            show: u8::from(show),
        }
    }

    /// Visibility flag
    pub fn is_shown(&self) -> bool {
        self.show != 0
    }

    /// Overwrite the color slot
    pub fn set_color(&mut self, color: Color) {
        self.color = color.to_bytes();
    }

    /// Overwrite the show slot
    pub fn set_show(&mut self, show: bool) {
        self.show = u8::from(show);
    }

    /// Color slot converted back to floating point
    pub fn color(&self) -> Color {
        let [r, g, b, a] = self.color;
        Color::from_bytes(r, g, b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_block_is_five_bytes() {
        assert_eq!(std::mem::size_of::<InstanceAttributes>(), 5);
        let block = [InstanceAttributes::new(Color::WHITE, true)];
        let bytes: &[u8] = bytemuck::cast_slice(&block);
        assert_eq!(bytes, &[255, 255, 255, 255, 1]);
    }

    #[test]
    fn test_slot_writes() {
        let mut attributes = InstanceAttributes::new(Color::BLACK, false);
        attributes.set_show(true);
        attributes.set_color(Color::WHITE.with_alpha(0.0));
        assert!(attributes.is_shown());
        assert_eq!(attributes.color, [255, 255, 255, 0]);
    }
}
