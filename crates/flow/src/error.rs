use glam::Vec3;
use thiserror::Error;

pub type FlowResult<T> = Result<T, FlowError>;

/// Failures reported by particles, fields and the advection engine
#[derive(Error, Debug)]
pub enum FlowError {
    /// Sample point lies outside the field's defined volume
    #[error("position {position} at time {time} is outside the field")]
    OutOfField { time: f32, position: Vec3 },

    /// Property or stream index misuse
    #[error("index {index} is out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("no velocity field has been bound")]
    NoFieldYet,

    #[error("no seed particles have been provided")]
    NoSeedParticleYet,

    #[error("file error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("size mismatch: expected {expected}, found {found}")]
    SizeMismatch { expected: usize, found: usize },

    /// Scalar sampling requested on a field without field values
    #[error("field does not provide scalar values")]
    ScalarUnsupported,

    #[error("step size must be positive and finite, got {0}")]
    InvalidStepSize(f32),

    #[error("invalid periodic bounds [{min}, {max})")]
    InvalidPeriodicBounds { min: f32, max: f32 },

    #[error("invalid step size control: {0}")]
    InvalidStepControl(&'static str),

    /// Time is too large for the step to move it forward in f32
    #[error("step of {dt} does not advance time {time}")]
    StepUnderflow { time: f32, dt: f32 },
}

impl FlowError {
    /// Out-of-field is the only failure an individual stream recovers from
    pub fn is_out_of_field(&self) -> bool {
        matches!(self, FlowError::OutOfField { .. })
    }
}
