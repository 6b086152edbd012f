// Closed-form velocity fields

pub mod circulation;
pub mod gyre;
pub mod uniform;

pub use circulation::CirculationField;
pub use gyre::{DoubleGyre, Vortex};
pub use uniform::UniformField;

/// Turn points for circulation cells (in degrees latitude)
pub const TURN_POINTS: [f32; 4] = [0.0, 30.0, 60.0, 90.0];

/// Meridional signs at each turn point in the northern hemisphere,
/// positive pointing away from the equator
pub const MERIDIONAL_SIGNS: [f32; 4] = [-1.0, 1.0, -1.0, -1.0];

/// Zonal signs at each turn point, positive pointing east
pub const ZONAL_SIGNS: [f32; 4] = [-1.0, 1.0, -1.0, -1.0];
