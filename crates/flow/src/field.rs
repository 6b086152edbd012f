// Velocity field capability consumed by the advection engine

use crate::error::{FlowError, FlowResult};
use glam::Vec3;

/// A vector field that can be sampled in space and time
///
/// Implementations only need to answer containment, velocity and extents
/// queries. Scalar sampling is optional and advertised through
/// [`VelocityField::has_field_value`].
pub trait VelocityField {
    /// Time-invariant field
    fn is_steady(&self) -> bool;

    /// Field repeats itself in time
    fn is_periodic(&self) -> bool {
        false
    }

    fn has_field_value(&self) -> bool {
        false
    }

    /// Spatial containment test at the given time
    fn inside_volume(&self, time: f32, position: Vec3) -> bool;

    /// Velocity at a point.
    ///
    /// # Arguments
    ///
    /// * `time` - Sample time, ignored by steady fields
    /// * `position` - Sample location in field coordinates
    ///
    /// # Returns
    ///
    /// The velocity vector, or [`FlowError::OutOfField`] when `position` is
    /// outside the volume at `time`.
    fn velocity(&self, time: f32, position: Vec3) -> FlowResult<Vec3>;

    /// Scalar field value at a point
    fn scalar(&self, time: f32, position: Vec3) -> FlowResult<f32> {
        let _ = (time, position);
        Err(FlowError::ScalarUnsupported)
    }

    /// Spatial bounding box as `(min, max)`
    fn extents(&self, time: f32) -> (Vec3, Vec3);
}

/// Containment test shared by box-shaped fields (bounds inclusive)
pub fn inside_box(position: Vec3, min: Vec3, max: Vec3) -> bool {
    position.cmpge(min).all() && position.cmple(max).all()
}

/// Fail with `OutOfField` unless the point is inside the field
pub fn ensure_inside<F: VelocityField + ?Sized>(
    field: &F,
    time: f32,
    position: Vec3,
) -> FlowResult<()> {
    if field.inside_volume(time, position) {
        Ok(())
    } else {
        Err(FlowError::OutOfField { time, position })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Vec3::new(0.5, 0.5, 0.5), true)]
    #[case(Vec3::ZERO, true)]
    #[case(Vec3::ONE, true)]
    #[case(Vec3::new(1.0001, 0.5, 0.5), false)]
    #[case(Vec3::new(0.5, -0.1, 0.5), false)]
    #[case(Vec3::new(f32::NAN, 0.5, 0.5), false)]
    fn test_inside_box(#[case] position: Vec3, #[case] expected: bool) {
        assert_eq!(inside_box(position, Vec3::ZERO, Vec3::ONE), expected);
    }
}
