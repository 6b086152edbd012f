// Seed particle generation

use crate::error::{FlowError, FlowResult};
use crate::particle::Particle;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn generate_seed8() -> u32 {
    let mut rng = rand::rng();
    rng.random_range(0u32..100_000_000u32)
}

pub fn expand_seed64(code: u32) -> u64 {
    splitmix64(code as u64)
}

pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Uniformly distributed seeds inside a box
///
/// # Arguments
///
/// * `count` - Number of seeds to generate
/// * `min`, `max` - Box corners; a flat axis (`min == max`) yields that coordinate
/// * `time` - Time stamp given to every seed
/// * `code` - Eight digit seed code, see [`generate_seed8`]
///
/// # Returns
///
/// `count` particles, identical for identical arguments
pub fn random_seeds(count: usize, min: Vec3, max: Vec3, time: f32, code: u32) -> Vec<Particle> {
    let mut rng = StdRng::seed_from_u64(expand_seed64(code));
    (0..count)
        .map(|_| {
            let location = Vec3::new(
                sample_axis(&mut rng, min.x, max.x),
                sample_axis(&mut rng, min.y, max.y),
                sample_axis(&mut rng, min.z, max.z),
            );
            Particle::new(location, time)
        })
        .collect()
}

fn sample_axis(rng: &mut StdRng, min: f32, max: f32) -> f32 {
    if max > min { rng.random_range(min..=max) } else { min }
}

/// Regular lattice of `counts[0] x counts[1] x counts[2]` seeds spanning the box.
/// An axis with a single seed is placed at the box center.
pub fn rake_seeds(min: Vec3, max: Vec3, counts: [usize; 3], time: f32) -> Vec<Particle> {
    let coord = |axis: usize, i: usize| -> f32 {
        let n = counts[axis];
        if n <= 1 {
            (min[axis] + max[axis]) * 0.5
        } else {
            min[axis] + (max[axis] - min[axis]) * i as f32 / (n - 1) as f32
        }
    };

    let mut seeds = Vec::with_capacity(counts.iter().product());
    for k in 0..counts[2] {
        for j in 0..counts[1] {
            for i in 0..counts[0] {
                let location = Vec3::new(coord(0, i), coord(1, j), coord(2, k));
                seeds.push(Particle::new(location, time));
            }
        }
    }
    seeds
}

/// Pair each position with its start time
pub fn seeds_at(positions: &[Vec3], times: &[f32]) -> FlowResult<Vec<Particle>> {
    if positions.len() != times.len() {
        return Err(FlowError::SizeMismatch {
            expected: positions.len(),
            found: times.len(),
        });
    }
    Ok(positions
        .iter()
        .zip(times)
        .map(|(location, time)| Particle::new(*location, *time))
        .collect())
}
