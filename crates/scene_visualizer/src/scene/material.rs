//! Material properties and their resolved values

use super::property::PropertyRef;
use crate::foundation::math::Color;
use crate::foundation::time::SimTime;
use std::fmt;

/// A material resolved at a specific time, ready for the backend
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Flat color
    Color {
        /// Fill color
        color: Color,
    },
    /// Image mapped over the surface
    Image {
        /// Image location
        uri: String,
        /// Tint applied to the image
        color: Color,
    },
    /// Alternating stripes
    Stripe {
        /// Color of even stripes
        even_color: Color,
        /// Color of odd stripes
        odd_color: Color,
        /// Number of stripe pairs across the surface
        repeat: f64,
    },
}

impl Default for Material {
    fn default() -> Self {
        Self::Color { color: Color::WHITE }
    }
}

/// Plain color material, the only kind a static batch accepts
#[derive(Clone, Default)]
pub struct ColorMaterialProperty {
    /// Fill color; white when absent
    pub color: Option<PropertyRef<Color>>,
}

impl ColorMaterialProperty {
    /// Create a color material from a color property
    pub fn new(color: PropertyRef<Color>) -> Self {
        Self { color: Some(color) }
    }
}

/// Image material
#[derive(Clone)]
pub struct ImageMaterialProperty {
    /// Image location
    pub image: PropertyRef<String>,
    /// Tint; white when absent
    pub color: Option<PropertyRef<Color>>,
}

/// Stripe material
#[derive(Clone)]
pub struct StripeMaterialProperty {
    /// Color of even stripes; white when absent
    pub even_color: Option<PropertyRef<Color>>,
    /// Color of odd stripes; black when absent
    pub odd_color: Option<PropertyRef<Color>>,
    /// Stripe pair count; 1 when absent
    pub repeat: Option<PropertyRef<f64>>,
}

/// Material description attached to polygon graphics
#[derive(Clone)]
pub enum MaterialProperty {
    /// Flat color
    Color(ColorMaterialProperty),
    /// Image
    Image(ImageMaterialProperty),
    /// Stripes
    Stripe(StripeMaterialProperty),
}

impl MaterialProperty {
    /// Shorthand for a color material
    pub fn color(color: PropertyRef<Color>) -> Self {
        Self::Color(ColorMaterialProperty::new(color))
    }

    /// The color material, if this is one
    pub fn as_color(&self) -> Option<&ColorMaterialProperty> {
        match self {
            Self::Color(material) => Some(material),
            _ => None,
        }
    }

    /// True when every sub-property is constant
    pub fn is_constant(&self) -> bool {
        fn constant<T>(property: Option<&PropertyRef<T>>) -> bool {
            property.map_or(true, |p| p.is_constant())
        }

        match self {
            Self::Color(m) => constant(m.color.as_ref()),
            Self::Image(m) => m.image.is_constant() && constant(m.color.as_ref()),
            Self::Stripe(m) => {
                constant(m.even_color.as_ref())
                    && constant(m.odd_color.as_ref())
                    && constant(m.repeat.as_ref())
            }
        }
    }

    /// Resolve the material at `time` into `result`.
    ///
    /// Returns `false` when a defined sub-property has no value at `time`;
    /// `result` is then left as it was so the previous material stays in use.
    pub fn resolve(&self, time: SimTime, result: &mut Material) -> bool {
        fn value<T>(property: Option<&PropertyRef<T>>, time: SimTime, default: T) -> Option<T> {
            match property {
                Some(property) => property.value_at(time),
                None => Some(default),
            }
        }

        let resolved = match self {
            Self::Color(m) => value(m.color.as_ref(), time, Color::WHITE)
                .map(|color| Material::Color { color }),
            Self::Image(m) => m.image.value_at(time).and_then(|uri| {
                value(m.color.as_ref(), time, Color::WHITE).map(|color| Material::Image { uri, color })
            }),
            Self::Stripe(m) => {
                let even_color = value(m.even_color.as_ref(), time, Color::WHITE);
                let odd_color = value(m.odd_color.as_ref(), time, Color::BLACK);
                let repeat = value(m.repeat.as_ref(), time, 1.0);
                match (even_color, odd_color, repeat) {
                    (Some(even_color), Some(odd_color), Some(repeat)) => Some(Material::Stripe {
                        even_color,
                        odd_color,
                        repeat,
                    }),
                    _ => None,
                }
            }
        };

        match resolved {
            Some(material) => {
                *result = material;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for MaterialProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Color(_) => "Color",
            Self::Image(_) => "Image",
            Self::Stripe(_) => "Stripe",
        };
        f.debug_struct("MaterialProperty")
            .field("kind", &kind)
            .field("is_constant", &self.is_constant())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::property::{constant, SampledProperty};
    use std::rc::Rc;

    #[test]
    fn test_color_material_defaults_to_white() {
        let material = MaterialProperty::Color(ColorMaterialProperty::default());
        let mut result = Material::Color { color: Color::BLACK };
        assert!(material.resolve(SimTime::EPOCH, &mut result));
        assert_eq!(result, Material::default());
        assert!(material.is_constant());
    }

    #[test]
    fn test_undefined_value_keeps_previous() {
        let material = MaterialProperty::color(Rc::new(SampledProperty::<Color>::new()));
        let mut result = Material::Color { color: Color::BLACK };
        assert!(!material.resolve(SimTime::EPOCH, &mut result));
        assert_eq!(result, Material::Color { color: Color::BLACK });
    }

    #[test]
    fn test_stripe_resolution() {
        let material = MaterialProperty::Stripe(StripeMaterialProperty {
            even_color: None,
            odd_color: None,
            repeat: Some(constant(4.0)),
        });
        let mut result = Material::default();
        assert!(material.resolve(SimTime::EPOCH, &mut result));
        assert_eq!(
            result,
            Material::Stripe {
                even_color: Color::WHITE,
                odd_color: Color::BLACK,
                repeat: 4.0
            }
        );
        assert!(material.as_color().is_none());
    }
}
