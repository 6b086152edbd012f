// Particle samples carried along a stream

use crate::error::{FlowError, FlowResult};
use glam::Vec3;

/// A single sample on a particle trajectory
///
/// Besides the location, time and primary scalar value, a particle carries an
/// ordered list of secondary property values. Properties keep their insertion
/// order and duplicates are allowed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Particle {
    pub location: Vec3,
    pub time: f32,
    pub value: f32,
    properties: Vec<f32>,
}

impl Particle {
    pub fn new(location: Vec3, time: f32) -> Self {
        Self {
            location,
            time,
            value: 0.0,
            properties: Vec::new(),
        }
    }

    pub fn with_value(location: Vec3, time: f32, value: f32) -> Self {
        Self {
            value,
            ..Self::new(location, time)
        }
    }

    /// Append a secondary property value
    pub fn attach_property(&mut self, value: f32) {
        self.properties.push(value);
    }

    /// Get the property at `index`, in insertion order
    pub fn retrieve_property(&self, index: usize) -> FlowResult<f32> {
        self.properties
            .get(index)
            .copied()
            .ok_or(FlowError::OutOfRange {
                index,
                len: self.properties.len(),
            })
    }

    /// Remove the property at `index`, shifting later ones down
    pub fn remove_property(&mut self, index: usize) -> FlowResult<f32> {
        let len = self.properties.len();
        if index >= len {
            return Err(FlowError::OutOfRange { index, len });
        }
        Ok(self.properties.remove(index))
    }

    pub fn clear_properties(&mut self) {
        self.properties.clear();
    }

    pub fn num_properties(&self) -> usize {
        self.properties.len()
    }

    pub fn properties(&self) -> &[f32] {
        &self.properties
    }

    /// Mark the particle as a separator sample.
    ///
    /// A special particle has both `time` and `value` set to NaN; clearing the
    /// mark resets both to zero.
    pub fn set_special(&mut self, special: bool) {
        if special {
            self.time = f32::NAN;
            self.value = f32::NAN;
        } else {
            self.time = 0.0;
            self.value = 0.0;
        }
    }

    /// True only when both `time` and `value` are NaN
    pub fn is_special(&self) -> bool {
        self.time.is_nan() && self.value.is_nan()
    }

    pub fn state(&self) -> ParticleState {
        if self.is_special() {
            ParticleState::Special
        } else {
            ParticleState::Ordinary
        }
    }
}

/// Tagged view of the NaN-pair sentinel encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleState {
    Ordinary,
    Special,
}
