//! Ellipse graphics: a shape given by a center and dimensions instead of an
//! explicit vertex list

use super::property::PropertyRef;
use crate::foundation::math::{Point3, Rotation3, Vec3};
use crate::foundation::time::SimTime;

/// Ellipse dimensions, centered on the owning entity's position
#[derive(Clone)]
pub struct EllipseGraphics {
    /// Semi-major axis length
    pub semi_major_axis: PropertyRef<f64>,
    /// Semi-minor axis length
    pub semi_minor_axis: PropertyRef<f64>,
    /// Rotation of the major axis about the local up axis, radians
    pub rotation: Option<PropertyRef<f64>>,
}

impl EllipseGraphics {
    /// Create an ellipse from its two axes
    pub fn new(semi_major_axis: PropertyRef<f64>, semi_minor_axis: PropertyRef<f64>) -> Self {
        Self {
            semi_major_axis,
            semi_minor_axis,
            rotation: None,
        }
    }

    /// Set the rotation property
    pub fn with_rotation(mut self, rotation: PropertyRef<f64>) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// True when none of the dimensions vary over time
    pub fn is_constant(&self) -> bool {
        self.semi_major_axis.is_constant()
            && self.semi_minor_axis.is_constant()
            && self.rotation.as_ref().map_or(true, |r| r.is_constant())
    }

    /// Derive the outline around `center` at `time` into `result`.
    ///
    /// The outline lies in the plane perpendicular to the local Z axis, one
    /// vertex every `granularity` radians. Returns `false` and leaves `result`
    /// untouched if a dimension is undefined or not positive.
    pub fn sample_outline(
        &self,
        time: SimTime,
        center: &Point3,
        granularity: f64,
        result: &mut Vec<Point3>,
    ) -> bool {
        let (Some(semi_major), Some(semi_minor)) = (
            self.semi_major_axis.value_at(time),
            self.semi_minor_axis.value_at(time),
        ) else {
            return false;
        };
        if !(semi_major > 0.0 && semi_minor > 0.0 && granularity > 0.0) {
            return false;
        }
        let rotation = match &self.rotation {
            Some(rotation) => match rotation.value_at(time) {
                Some(angle) => angle,
                None => return false,
            },
            None => 0.0,
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let segments = (std::f64::consts::TAU / granularity).ceil().max(3.0) as usize;
        let orientation = Rotation3::from_axis_angle(&Vec3::z_axis(), rotation);

        result.clear();
        result.extend((0..segments).map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let theta = std::f64::consts::TAU * i as f64 / segments as f64;
            let offset = Vec3::new(semi_major * theta.cos(), semi_minor * theta.sin(), 0.0);
            center + orientation * offset
        }));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::property::{constant, SampledProperty};
    use approx::assert_relative_eq;
    use std::rc::Rc;

    #[test]
    fn test_outline_vertex_count_and_extent() {
        let ellipse = EllipseGraphics::new(constant(10.0), constant(5.0));
        let center = Point3::new(100.0, 0.0, 0.0);
        let mut outline = Vec::new();

        assert!(ellipse.sample_outline(SimTime::EPOCH, &center, std::f64::consts::FRAC_PI_2, &mut outline));
        assert_eq!(outline.len(), 4);
        assert_relative_eq!(outline[0].x, 110.0);
        assert_relative_eq!(outline[1].y, 5.0, epsilon = 1e-9);
        assert!(ellipse.is_constant());
    }

    #[test]
    fn test_rotation_turns_major_axis() {
        let ellipse = EllipseGraphics::new(constant(10.0), constant(5.0))
            .with_rotation(constant(std::f64::consts::FRAC_PI_2));
        let mut outline = Vec::new();
        assert!(ellipse.sample_outline(SimTime::EPOCH, &Point3::origin(), 0.1, &mut outline));
        assert_relative_eq!(outline[0].x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(outline[0].y, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_undefined_axis_leaves_buffer() {
        let ellipse = EllipseGraphics::new(Rc::new(SampledProperty::<f64>::new()), constant(5.0));
        let mut outline = vec![Point3::origin()];
        assert!(!ellipse.sample_outline(SimTime::EPOCH, &Point3::origin(), 0.1, &mut outline));
        assert_eq!(outline.len(), 1);
        assert!(!ellipse.is_constant());
    }
}
