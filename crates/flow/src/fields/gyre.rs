// Analytic ocean-like flows

use crate::error::FlowResult;
use crate::field::{VelocityField, ensure_inside, inside_box};
use glam::Vec3;
use std::f32::consts::PI;

/// Time-periodic double gyre on `[0, 2] x [0, 1]`
///
/// Two counter-rotating gyres whose separating line oscillates left and right
/// with period `2π / omega`. The z component of the velocity is always zero;
/// z only has to stay within `[z_min, z_max]`.
#[derive(Clone, Debug)]
pub struct DoubleGyre {
    /// Velocity magnitude
    pub amplitude: f32,
    /// How far the separating line moves
    pub epsilon: f32,
    /// Angular frequency of the oscillation
    pub omega: f32,
    pub z_min: f32,
    pub z_max: f32,
}

impl Default for DoubleGyre {
    fn default() -> Self {
        Self {
            amplitude: 0.1,
            epsilon: 0.25,
            omega: 2.0 * PI / 10.0,
            z_min: 0.0,
            z_max: 1.0,
        }
    }
}

impl DoubleGyre {
    pub fn period(&self) -> f32 {
        2.0 * PI / self.omega
    }

    /// Returns `f(x, t)` and `df/dx`
    fn forcing(&self, time: f32, x: f32) -> (f32, f32) {
        let s = (self.omega * time).sin();
        let a = self.epsilon * s;
        let b = 1.0 - 2.0 * self.epsilon * s;
        (a * x * x + b * x, 2.0 * a * x + b)
    }

    /// Stream function value
    pub fn stream_function(&self, time: f32, position: Vec3) -> f32 {
        let (f, _) = self.forcing(time, position.x);
        self.amplitude * (PI * f).sin() * (PI * position.y).sin()
    }
}

impl VelocityField for DoubleGyre {
    fn is_steady(&self) -> bool {
        self.epsilon == 0.0
    }

    fn is_periodic(&self) -> bool {
        !self.is_steady()
    }

    fn has_field_value(&self) -> bool {
        true
    }

    fn inside_volume(&self, time: f32, position: Vec3) -> bool {
        let (min, max) = self.extents(time);
        inside_box(position, min, max)
    }

    fn velocity(&self, time: f32, position: Vec3) -> FlowResult<Vec3> {
        ensure_inside(self, time, position)?;
        let (f, dfdx) = self.forcing(time, position.x);
        let u = -PI * self.amplitude * (PI * f).sin() * (PI * position.y).cos();
        let v = PI * self.amplitude * (PI * f).cos() * (PI * position.y).sin() * dfdx;
        Ok(Vec3::new(u, v, 0.0))
    }

    /// Signed stream function: positive in the left gyre at `t = 0`,
    /// negative in the right one
    fn scalar(&self, time: f32, position: Vec3) -> FlowResult<f32> {
        ensure_inside(self, time, position)?;
        Ok(self.stream_function(time, position))
    }

    fn extents(&self, _time: f32) -> (Vec3, Vec3) {
        (
            Vec3::new(0.0, 0.0, self.z_min),
            Vec3::new(2.0, 1.0, self.z_max),
        )
    }
}

/// Steady solid-body rotation about an axis parallel to z
#[derive(Clone, Debug)]
pub struct Vortex {
    pub center: Vec3,
    /// Angular speed in radians per unit time, positive is counter-clockwise
    pub angular_speed: f32,
    pub min: Vec3,
    pub max: Vec3,
}

impl Vortex {
    pub fn new(center: Vec3, angular_speed: f32, half_size: f32) -> Self {
        Self {
            center,
            angular_speed,
            min: center - Vec3::splat(half_size),
            max: center + Vec3::splat(half_size),
        }
    }
}

impl VelocityField for Vortex {
    fn is_steady(&self) -> bool {
        true
    }

    fn has_field_value(&self) -> bool {
        true
    }

    fn inside_volume(&self, _time: f32, position: Vec3) -> bool {
        inside_box(position, self.min, self.max)
    }

    fn velocity(&self, time: f32, position: Vec3) -> FlowResult<Vec3> {
        ensure_inside(self, time, position)?;
        let r = position - self.center;
        Ok(Vec3::new(-r.y, r.x, 0.0) * self.angular_speed)
    }

    /// Speed at the point
    fn scalar(&self, time: f32, position: Vec3) -> FlowResult<f32> {
        Ok(self.velocity(time, position)?.length())
    }

    fn extents(&self, _time: f32) -> (Vec3, Vec3) {
        (self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0)]
    #[case(2.5)]
    #[case(7.0)]
    fn test_gyre_no_flow_through_walls(#[case] time: f32) {
        let gyre = DoubleGyre::default();
        // u vanishes on the left and right walls, v on the top and bottom
        let left = gyre.velocity(time, Vec3::new(0.0, 0.3, 0.5)).unwrap();
        let right = gyre.velocity(time, Vec3::new(2.0, 0.7, 0.5)).unwrap();
        let bottom = gyre.velocity(time, Vec3::new(0.6, 0.0, 0.5)).unwrap();
        let top = gyre.velocity(time, Vec3::new(1.4, 1.0, 0.5)).unwrap();

        assert!(left.x.abs() < 1e-5, "left wall u = {}", left.x);
        assert!(right.x.abs() < 1e-5, "right wall u = {}", right.x);
        assert!(bottom.y.abs() < 1e-5, "bottom wall v = {}", bottom.y);
        assert!(top.y.abs() < 1e-5, "top wall v = {}", top.y);
    }

    #[test]
    fn test_gyre_is_time_periodic() {
        let gyre = DoubleGyre::default();
        let position = Vec3::new(0.4, 0.3, 0.5);
        let a = gyre.velocity(1.0, position).unwrap();
        let b = gyre.velocity(1.0 + gyre.period(), position).unwrap();

        assert!((a - b).length() < 1e-4);
        assert!(gyre.is_periodic());
        assert!(!gyre.is_steady());
    }

    #[test]
    fn test_gyre_outside() {
        let gyre = DoubleGyre::default();
        assert!(!gyre.inside_volume(0.0, Vec3::new(2.1, 0.5, 0.5)));
        assert!(gyre.velocity(0.0, Vec3::new(1.0, 1.5, 0.5)).is_err());
        assert!(gyre.scalar(0.0, Vec3::new(1.0, 0.5, 3.0)).is_err());
    }

    #[rstest]
    #[case(Vec3::new(0.5, 0.5, 0.5), 0.1)]
    #[case(Vec3::new(1.5, 0.5, 0.5), -0.1)]
    #[case(Vec3::new(1.0, 0.5, 0.5), 0.0)]
    fn test_gyre_scalar_is_signed_stream_function(#[case] position: Vec3, #[case] expected: f32) {
        let gyre = DoubleGyre::default();
        let value = gyre.scalar(0.0, position).unwrap();
        assert!((value - expected).abs() < 1e-5, "value {}", value);
    }

    #[test]
    fn test_vortex_velocity_is_tangential() {
        let vortex = Vortex::new(Vec3::ZERO, 2.0, 5.0);
        let position = Vec3::new(1.0, 0.0, 0.0);
        let velocity = vortex.velocity(0.0, position).unwrap();

        assert_eq!(velocity, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(velocity.dot(position), 0.0);
        assert_eq!(vortex.scalar(0.0, position).unwrap(), 2.0);
    }
}
