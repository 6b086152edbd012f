// Three-cell atmospheric circulation on a spherical shell

use super::{MERIDIONAL_SIGNS, TURN_POINTS, ZONAL_SIGNS};
use crate::error::FlowResult;
use crate::field::{VelocityField, ensure_inside};
use glam::Vec3;

/// Steady banded circulation between two concentric spheres
///
/// Winds are tangent to the sphere. Both the meridional (north/south) and the
/// zonal (east/west) components switch direction at the turn points, blended
/// with a smoothstep so the field stays continuous.
#[derive(Clone, Debug)]
pub struct CirculationField {
    pub center: Vec3,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub meridional_speed: f32,
    pub zonal_speed: f32,
}

impl CirculationField {
    pub fn new(inner_radius: f32, outer_radius: f32, meridional_speed: f32, zonal_speed: f32) -> Self {
        Self {
            center: Vec3::ZERO,
            inner_radius,
            outer_radius,
            meridional_speed,
            zonal_speed,
        }
    }

    /// Blend the per-turn-point signs for a latitude in degrees
    fn band_sign(signs: &[f32; 4], lat_deg: f32) -> f32 {
        let abs_lat = lat_deg.abs();

        let segment = if abs_lat < 30.0 {
            0
        } else if abs_lat < 60.0 {
            1
        } else {
            2
        };

        let p0 = TURN_POINTS[segment];
        let p1 = TURN_POINTS[segment + 1];
        let t = ((abs_lat - p0) / (p1 - p0)).clamp(0.0, 1.0);

        // s(t) = 3t² - 2t³
        let s = 3.0 * t * t - 2.0 * t * t * t;

        signs[segment] + (signs[segment + 1] - signs[segment]) * s
    }

    fn latitude_deg(up: Vec3) -> f32 {
        up.y.clamp(-1.0, 1.0).asin().to_degrees()
    }

    /// Unit vector along lines of latitude
    fn eastward(up: Vec3) -> Vec3 {
        let east_raw = Vec3::Y.cross(up);
        if east_raw.length_squared() < 1e-12 {
            Vec3::X.cross(up).normalize()
        } else {
            east_raw.normalize()
        }
    }

    fn northward(up: Vec3) -> Vec3 {
        up.cross(Self::eastward(up)).normalize()
    }

    /// Signed meridional speed, positive pointing north
    pub fn latitudinal_speed(&self, up: Vec3) -> f32 {
        let lat_deg = Self::latitude_deg(up);
        let v = self.meridional_speed * Self::band_sign(&MERIDIONAL_SIGNS, lat_deg);
        if lat_deg < 0.0 { -v } else { v }
    }

    /// Tangent velocity for a unit direction from the center
    fn tangent_velocity(&self, up: Vec3) -> Vec3 {
        let meridional = Self::northward(up) * self.latitudinal_speed(up);
        let z_sign = Self::band_sign(&ZONAL_SIGNS, Self::latitude_deg(up));
        let zonal = Self::eastward(up) * (z_sign * self.zonal_speed);
        meridional + zonal
    }
}

impl VelocityField for CirculationField {
    fn is_steady(&self) -> bool {
        true
    }

    fn inside_volume(&self, _time: f32, position: Vec3) -> bool {
        let r = position.distance(self.center);
        r >= self.inner_radius && r <= self.outer_radius
    }

    fn velocity(&self, time: f32, position: Vec3) -> FlowResult<Vec3> {
        ensure_inside(self, time, position)?;
        let up = (position - self.center).normalize_or(Vec3::Y);
        Ok(self.tangent_velocity(up))
    }

    fn extents(&self, _time: f32) -> (Vec3, Vec3) {
        let r = Vec3::splat(self.outer_radius);
        (self.center - r, self.center + r)
    }
}
