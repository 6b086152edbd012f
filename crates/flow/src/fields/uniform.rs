use crate::error::FlowResult;
use crate::field::{VelocityField, ensure_inside, inside_box};
use glam::Vec3;

/// Constant velocity inside an axis-aligned box
#[derive(Clone, Debug)]
pub struct UniformField {
    pub velocity: Vec3,
    pub min: Vec3,
    pub max: Vec3,
}

impl UniformField {
    pub fn new(velocity: Vec3, min: Vec3, max: Vec3) -> Self {
        Self { velocity, min, max }
    }

    /// A field that never moves anything
    pub fn still(min: Vec3, max: Vec3) -> Self {
        Self::new(Vec3::ZERO, min, max)
    }
}

impl VelocityField for UniformField {
    fn is_steady(&self) -> bool {
        true
    }

    fn inside_volume(&self, _time: f32, position: Vec3) -> bool {
        inside_box(position, self.min, self.max)
    }

    fn velocity(&self, time: f32, position: Vec3) -> FlowResult<Vec3> {
        ensure_inside(self, time, position)?;
        Ok(self.velocity)
    }

    fn extents(&self, _time: f32) -> (Vec3, Vec3) {
        (self.min, self.max)
    }
}
