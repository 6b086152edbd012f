pub mod advection;
pub mod config;
pub mod constants;
pub mod error;
pub mod field;
pub mod fields;
pub mod particle;
pub mod seeding;

pub use advection::{Advection, AdvectionControl, AdvectionMethod, Axis, Progress, StreamStatus};
pub use config::FlowConfig;
pub use error::{FlowError, FlowResult};
pub use field::VelocityField;
pub use particle::Particle;
