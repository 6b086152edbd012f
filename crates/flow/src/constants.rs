pub const DEFAULT_BASE_STEP_SIZE: f32 = 0.01;

/// Step size grows when consecutive steps turn by less than this (degrees)
pub const DEFAULT_LOWER_ANGLE: f32 = 3.0;
/// Step size shrinks when consecutive steps turn by more than this (degrees)
pub const DEFAULT_UPPER_ANGLE: f32 = 15.0;

pub const DEFAULT_ENLARGE_FACTOR: f32 = 1.25;
pub const DEFAULT_SHRINK_FACTOR: f32 = 0.5;

/// Below this product of displacement lengths the turn angle is not trusted
pub const MIN_DISPLACEMENT_PRODUCT: f32 = 1e-7;

pub const DEFAULT_CONFIG_PATH: &str = "flow_config.toml";
