use clap::{Parser, ValueEnum};
use flow::AdvectionMethod;
use flow::FlowConfig;
use flow::fields::{CirculationField, DoubleGyre, UniformField, Vortex};
use flow::VelocityField;
use glam::Vec3;
use std::path::PathBuf;

/// Advect random seeds through an analytic velocity field
#[derive(Parser, Debug)]
#[command(name = "flowtrace", version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = FieldKind::DoubleGyre)]
    pub field: FieldKind,

    /// Number of random seeds
    #[arg(long)]
    pub seeds: Option<usize>,

    /// Maximum number of advection steps
    #[arg(long)]
    pub steps: Option<usize>,

    /// Base step size
    #[arg(long)]
    pub length: Option<f32>,

    #[arg(short, long, value_enum)]
    pub method: Option<MethodArg>,

    /// Gnuplot output file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    DoubleGyre,
    Circulation,
    Vortex,
    Uniform,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodArg {
    Euler,
    Rk4,
}

impl From<MethodArg> for AdvectionMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Euler => AdvectionMethod::Euler,
            MethodArg::Rk4 => AdvectionMethod::Rk4,
        }
    }
}

impl FieldKind {
    pub fn build(self) -> Box<dyn VelocityField> {
        match self {
            FieldKind::DoubleGyre => Box::new(DoubleGyre::default()),
            FieldKind::Circulation => Box::new(CirculationField::new(1.0, 1.2, 0.3, 0.5)),
            FieldKind::Vortex => Box::new(Vortex::new(Vec3::ZERO, 1.0, 1.0)),
            FieldKind::Uniform => Box::new(UniformField::new(
                Vec3::new(1.0, 0.5, 0.0),
                Vec3::ZERO,
                Vec3::new(10.0, 10.0, 1.0),
            )),
        }
    }
}

impl Cli {
    /// Command line values take precedence over the file
    pub fn apply_overrides(&self, config: &mut FlowConfig) {
        if let Some(seeds) = self.seeds {
            config.seeding.count = seeds;
        }
        if let Some(steps) = self.steps {
            config.run.max_steps = steps;
        }
        if let Some(length) = self.length {
            config.advection.base_step_size = length;
        }
        if let Some(method) = self.method {
            config.advection.method = method.into();
        }
        if let Some(output) = &self.output {
            config.run.output = output.display().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::parse_from([
            "flowtrace", "--seeds", "5", "--steps", "7", "--length", "0.2", "--method", "euler", "--output", "x.dat",
        ]);
        let mut config = FlowConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.seeding.count, 5);
        assert_eq!(config.run.max_steps, 7);
        assert_eq!(config.advection.base_step_size, 0.2);
        assert_eq!(config.advection.method, AdvectionMethod::Euler);
        assert_eq!(config.run.output, "x.dat");
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let cli = Cli::parse_from(["flowtrace"]);
        let mut config = FlowConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config, FlowConfig::default());
        assert_eq!(cli.field, FieldKind::DoubleGyre);
    }

    #[rstest]
    #[case(FieldKind::DoubleGyre)]
    #[case(FieldKind::Circulation)]
    #[case(FieldKind::Vortex)]
    #[case(FieldKind::Uniform)]
    fn test_built_fields_contain_their_center(#[case] kind: FieldKind) {
        let field = kind.build();
        let (min, max) = field.extents(0.0);
        let probe = match kind {
            // The shell is hollow
            FieldKind::Circulation => Vec3::new(1.1, 0.0, 0.0),
            _ => (min + max) * 0.5,
        };
        assert!(field.inside_volume(0.0, probe));
    }
}
