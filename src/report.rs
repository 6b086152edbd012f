use flow::{Advection, Particle};
use glam::Vec3;
use std::fmt;

/// First and last location of a stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSummary {
    pub index: usize,
    pub size: usize,
    pub start: Vec3,
    pub end: Vec3,
    pub exhausted: bool,
}

impl StreamSummary {
    fn from_stream(index: usize, stream: &[Particle], exhausted: bool) -> Option<Self> {
        let start = stream.first()?.location;
        let end = stream.last()?.location;
        Some(Self {
            index,
            size: stream.len(),
            start,
            end,
            exhausted,
        })
    }
}

impl fmt::Display for StreamSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] Size : {} {{({}, {}, {}) : ({}, {}, {})}}",
            self.index,
            self.size,
            self.start.x,
            self.start.y,
            self.start.z,
            self.end.x,
            self.end.y,
            self.end.z
        )?;
        if self.exhausted {
            write!(f, " exhausted")?;
        }
        Ok(())
    }
}

pub fn summarize(advection: &Advection) -> Vec<StreamSummary> {
    advection
        .streams()
        .enumerate()
        .filter_map(|(index, stream)| {
            let exhausted = advection.is_exhausted(index).unwrap_or(false);
            StreamSummary::from_stream(index, stream, exhausted)
        })
        .collect()
}
