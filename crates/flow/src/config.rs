use crate::advection::AdvectionMethod;
use crate::constants::{
    DEFAULT_BASE_STEP_SIZE, DEFAULT_ENLARGE_FACTOR, DEFAULT_LOWER_ANGLE, DEFAULT_SHRINK_FACTOR,
    DEFAULT_UPPER_ANGLE,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowConfig {
    pub advection: AdvectionConfig,
    pub seeding: SeedingConfig,
    pub run: RunConfig,
    #[serde(default)]
    pub periodic: PeriodicConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvectionConfig {
    pub base_step_size: f32,
    /// Degrees
    pub lower_angle: f32,
    /// Degrees
    pub upper_angle: f32,
    pub enlarge_factor: f32,
    pub shrink_factor: f32,
    pub method: AdvectionMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedingConfig {
    pub count: usize,
    /// Fixed seed for reproducible runs, random when absent
    pub rng_seed: Option<u32>,
    pub start_time: f32,
    /// Seeding box, defaults to the field extents
    pub rake_min: Option<[f32; 3]>,
    pub rake_max: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub max_steps: usize,
    /// Log progress every this many steps
    pub progress_interval: usize,
    pub output: String,
}

/// Optional `[min, max]` periodic bounds per axis
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PeriodicConfig {
    pub x: Option<[f32; 2]>,
    pub y: Option<[f32; 2]>,
    pub z: Option<[f32; 2]>,
}

impl Default for AdvectionConfig {
    fn default() -> Self {
        Self {
            base_step_size: DEFAULT_BASE_STEP_SIZE,
            lower_angle: DEFAULT_LOWER_ANGLE,
            upper_angle: DEFAULT_UPPER_ANGLE,
            enlarge_factor: DEFAULT_ENLARGE_FACTOR,
            shrink_factor: DEFAULT_SHRINK_FACTOR,
            method: AdvectionMethod::Rk4,
        }
    }
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            count: 100,
            rng_seed: Some(32),
            start_time: 0.0,
            rake_min: None,
            rake_max: None,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            progress_interval: 10,
            output: "streams.dat".to_string(),
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            advection: AdvectionConfig::default(),
            seeding: SeedingConfig::default(),
            run: RunConfig::default(),
            periodic: PeriodicConfig::default(),
        }
    }
}

impl FlowConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: FlowConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl SeedingConfig {
    /// Rake box if both corners are configured
    pub fn rake(&self) -> Option<(Vec3, Vec3)> {
        match (self.rake_min, self.rake_max) {
            (Some(min), Some(max)) => Some((Vec3::from_array(min), Vec3::from_array(max))),
            _ => None,
        }
    }
}

impl PeriodicConfig {
    pub fn bounds(&self) -> [Option<[f32; 2]>; 3] {
        [self.x, self.y, self.z]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = FlowConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: FlowConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_parse_partial_file() {
        let text = r#"
            [advection]
            base_step_size = 0.05
            lower_angle = 2.0
            upper_angle = 20.0
            enlarge_factor = 1.5
            shrink_factor = 0.25
            method = "euler"

            [seeding]
            count = 8
            start_time = 1.0
            rake_min = [0.0, 0.0, 0.0]
            rake_max = [1.0, 1.0, 0.0]

            [run]
            max_steps = 20
            progress_interval = 5
            output = "out.dat"

            [periodic]
            x = [0.0, 2.0]
        "#;
        let config: FlowConfig = toml::from_str(text).unwrap();

        assert_eq!(config.advection.method, AdvectionMethod::Euler);
        assert_eq!(config.seeding.rng_seed, None);
        assert_eq!(config.seeding.rake(), Some((Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0))));
        assert_eq!(config.periodic.bounds(), [Some([0.0, 2.0]), None, None]);
    }

    #[test]
    fn test_missing_periodic_section_defaults() {
        let text = toml::to_string_pretty(&FlowConfig::default()).unwrap();
        let without: String = text
            .lines()
            .take_while(|line| !line.starts_with("[periodic]"))
            .collect::<Vec<_>>()
            .join("\n");
        let parsed: FlowConfig = toml::from_str(&without).unwrap();
        assert_eq!(parsed.periodic, PeriodicConfig::default());
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join("flow_config_roundtrip_test.toml");
        let mut config = FlowConfig::default();
        config.run.max_steps = 42;
        config.save_to_file(&path).unwrap();

        let loaded = FlowConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.run.max_steps, 42);
        std::fs::remove_file(&path).ok();
    }
}
