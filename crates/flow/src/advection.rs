// Particle advection through a velocity field with adaptive step sizing

use crate::config::AdvectionConfig;
use crate::constants::{
    DEFAULT_BASE_STEP_SIZE, DEFAULT_ENLARGE_FACTOR, DEFAULT_LOWER_ANGLE, DEFAULT_SHRINK_FACTOR,
    DEFAULT_UPPER_ANGLE, MIN_DISPLACEMENT_PRODUCT,
};
use crate::error::{FlowError, FlowResult};
use crate::field::VelocityField;
use crate::particle::Particle;
use glam::Vec3;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Numerical integration scheme used for a step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvectionMethod {
    Euler,
    /// Runge-Kutta 4th order
    #[default]
    Rk4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodicBounds {
    pub min: f32,
    pub max: f32,
}

impl PeriodicBounds {
    fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Map `val` into `[min, max)`
    fn wrap(&self, val: f32) -> f32 {
        let wrapped = self.min + (val - self.min).rem_euclid(self.span());
        // Rounding can land a tiny negative offset exactly on max
        if wrapped >= self.max { self.min } else { wrapped }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamStatus {
    Active,
    /// Left the field; the stream no longer advances
    Exhausted,
}

/// Snapshot handed to progress callbacks between steps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub step: usize,
    pub active_streams: usize,
    pub total_particles: usize,
}

/// Returned by progress callbacks to continue or stop a multi-step run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvectionControl {
    Continue,
    Abort,
}

/// Curvature based step size adjustment
///
/// The turn angle between the two most recent displacements decides whether
/// the next step grows, shrinks or stays. Thresholds are kept as cosines so
/// the comparison needs only a dot product.
#[derive(Clone, Debug, PartialEq)]
pub struct StepSizeControl {
    lower_angle: f32,
    upper_angle: f32,
    lower_angle_cos: f32,
    upper_angle_cos: f32,
    enlarge_factor: f32,
    shrink_factor: f32,
}

impl Default for StepSizeControl {
    fn default() -> Self {
        Self {
            lower_angle: DEFAULT_LOWER_ANGLE,
            upper_angle: DEFAULT_UPPER_ANGLE,
            lower_angle_cos: DEFAULT_LOWER_ANGLE.to_radians().cos(),
            upper_angle_cos: DEFAULT_UPPER_ANGLE.to_radians().cos(),
            enlarge_factor: DEFAULT_ENLARGE_FACTOR,
            shrink_factor: DEFAULT_SHRINK_FACTOR,
        }
    }
}

impl StepSizeControl {
    /// Build a control from turn angle thresholds and step factors.
    ///
    /// # Arguments
    ///
    /// * `lower_angle` - Turns below this many degrees grow the step
    /// * `upper_angle` - Turns above this many degrees shrink the step
    /// * `enlarge_factor` - Growth factor, greater than 1
    /// * `shrink_factor` - Shrink factor, strictly between 0 and 1
    ///
    /// # Returns
    ///
    /// [`FlowError::InvalidStepControl`] when a value is not finite, the
    /// angles are outside `[0, 180]` or out of order, or a factor would not
    /// grow or shrink the step. Step sizes stay positive with any accepted
    /// control.
    pub fn new(
        lower_angle: f32,
        upper_angle: f32,
        enlarge_factor: f32,
        shrink_factor: f32,
    ) -> FlowResult<Self> {
        let values = [lower_angle, upper_angle, enlarge_factor, shrink_factor];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(FlowError::InvalidStepControl("values must be finite"));
        }
        if !(0.0..=180.0).contains(&lower_angle) || !(0.0..=180.0).contains(&upper_angle) {
            return Err(FlowError::InvalidStepControl("angles must be within [0, 180] degrees"));
        }
        if lower_angle > upper_angle {
            return Err(FlowError::InvalidStepControl("lower angle exceeds upper angle"));
        }
        if !(enlarge_factor > 1.0) {
            return Err(FlowError::InvalidStepControl("enlarge factor must be greater than 1"));
        }
        if !(shrink_factor > 0.0 && shrink_factor < 1.0) {
            return Err(FlowError::InvalidStepControl("shrink factor must be within (0, 1)"));
        }

        Ok(Self {
            lower_angle,
            upper_angle,
            lower_angle_cos: lower_angle.to_radians().cos(),
            upper_angle_cos: upper_angle.to_radians().cos(),
            enlarge_factor,
            shrink_factor,
        })
    }

    pub fn lower_angle(&self) -> f32 {
        self.lower_angle
    }

    pub fn upper_angle(&self) -> f32 {
        self.upper_angle
    }

    /// Factor for the next step given two consecutive displacements.
    ///
    /// Returns the enlarge factor for nearly straight paths, the shrink factor
    /// for sharp turns and 1.0 otherwise or when a displacement is degenerate.
    pub fn adjust_factor(&self, previous: Vec3, latest: Vec3) -> f32 {
        let denominator = previous.length() * latest.length();
        if !(denominator >= MIN_DISPLACEMENT_PRODUCT) {
            return 1.0;
        }
        let cosine = previous.dot(latest) / denominator;

        if cosine > self.lower_angle_cos {
            self.enlarge_factor
        } else if cosine < self.upper_angle_cos {
            self.shrink_factor
        } else {
            1.0
        }
    }
}

/// Time range a till-time run works on
#[derive(Clone, Copy, Debug)]
struct TimeWindow {
    start: f32,
    target: f32,
}

enum StepOutcome {
    Advanced(Particle),
    /// Outside the time window; the stream stays active
    Idle,
    Exhausted(Option<FlowError>),
}

/// Owns particle streams and advances them through a borrowed velocity field
///
/// The field is not owned; it has to outlive the advection session, which the
/// `'a` lifetime enforces. Each stream starts from one seed particle and only
/// ever grows by appending.
pub struct Advection<'a> {
    field: Option<&'a dyn VelocityField>,
    streams: Vec<Vec<Particle>>,
    status: Vec<StreamStatus>,
    base_step_size: f32,
    step_control: StepSizeControl,
    periodic: [Option<PeriodicBounds>; 3],
    value_name: String,
    property_names: Vec<String>,
}

impl Default for Advection<'_> {
    fn default() -> Self {
        Self {
            field: None,
            streams: Vec::new(),
            status: Vec::new(),
            base_step_size: DEFAULT_BASE_STEP_SIZE,
            step_control: StepSizeControl::default(),
            periodic: [None; 3],
            value_name: String::new(),
            property_names: Vec::new(),
        }
    }
}

impl<'a> Advection<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AdvectionConfig) -> FlowResult<Self> {
        let mut advection = Self {
            step_control: StepSizeControl::new(
                config.lower_angle,
                config.upper_angle,
                config.enlarge_factor,
                config.shrink_factor,
            )?,
            ..Self::default()
        };
        advection.set_base_step_size(config.base_step_size)?;
        Ok(advection)
    }

    /// Nominal step size used before any adaptation. Must be positive.
    pub fn set_base_step_size(&mut self, dt: f32) -> FlowResult<()> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(FlowError::InvalidStepSize(dt));
        }
        self.base_step_size = dt;
        Ok(())
    }

    pub fn base_step_size(&self) -> f32 {
        self.base_step_size
    }

    pub fn set_step_control(&mut self, control: StepSizeControl) {
        self.step_control = control;
    }

    pub fn step_control(&self) -> &StepSizeControl {
        &self.step_control
    }

    /// Bind the field to sample from. Replaces any previously bound field.
    pub fn use_velocity_field(&mut self, field: &'a dyn VelocityField) {
        debug!(
            "Binding velocity field (steady: {}, scalar values: {})",
            field.is_steady(),
            field.has_field_value()
        );
        self.field = Some(field);
    }

    /// Start one stream per seed, discarding any existing streams
    pub fn use_seed_particles(&mut self, seeds: impl IntoIterator<Item = Particle>) {
        self.streams = seeds.into_iter().map(|seed| vec![seed]).collect();
        self.status = vec![StreamStatus::Active; self.streams.len()];
        debug!("Seeded {} streams", self.streams.len());
    }

    pub fn set_periodicity(&mut self, axis: Axis, enabled: bool, min: f32, max: f32) -> FlowResult<()> {
        if !enabled {
            self.periodic[axis as usize] = None;
            return Ok(());
        }
        if !(min < max) || !(max - min).is_finite() {
            return Err(FlowError::InvalidPeriodicBounds { min, max });
        }
        self.periodic[axis as usize] = Some(PeriodicBounds { min, max });
        Ok(())
    }

    pub fn periodicity(&self, axis: Axis) -> Option<PeriodicBounds> {
        self.periodic[axis as usize]
    }

    pub fn check_ready(&self) -> FlowResult<()> {
        if self.field.is_none() {
            return Err(FlowError::NoFieldYet);
        }
        if self.streams.is_empty() {
            return Err(FlowError::NoSeedParticleYet);
        }
        Ok(())
    }

    /// A field is bound and at least one seed exists
    pub fn is_ready(&self) -> bool {
        self.check_ready().is_ok()
    }

    pub fn is_steady(&self) -> bool {
        self.field.is_some_and(|field| field.is_steady())
    }

    /// Advance every active stream by one step.
    ///
    /// Streams whose latest particle is outside the field, or whose step would
    /// sample outside it, become exhausted; the rest keep going. Returns the
    /// number of streams that received a new particle.
    pub fn advect(&mut self, method: AdvectionMethod) -> FlowResult<usize> {
        self.advance_all(method, None)
    }

    /// Call [`Advection::advect`] up to `max_steps` times.
    ///
    /// Stops early once no stream advances. Returns the number of steps taken.
    pub fn advect_steps(&mut self, method: AdvectionMethod, max_steps: usize) -> FlowResult<usize> {
        self.advect_steps_with(method, max_steps, |_| AdvectionControl::Continue)
    }

    /// Like [`Advection::advect_steps`], calling `progress` after each step.
    /// Returning [`AdvectionControl::Abort`] stops the run between steps.
    pub fn advect_steps_with<F>(
        &mut self,
        method: AdvectionMethod,
        max_steps: usize,
        progress: F,
    ) -> FlowResult<usize>
    where
        F: FnMut(&Progress) -> AdvectionControl,
    {
        self.run_rounds(method, None, max_steps, progress)
    }

    /// Advance streams until their latest particle reaches `target_time`.
    ///
    /// # Arguments
    ///
    /// * `method` - Integration scheme for every step
    /// * `start_time` - Streams whose latest particle is earlier than this are
    ///   left alone
    /// * `target_time` - The last step of a stream is shortened to land on it
    /// * `max_steps` - Upper bound on the number of rounds
    /// * `progress` - Called after each round, may abort the run
    ///
    /// # Returns
    ///
    /// The number of rounds taken. Streams already at or past `target_time`
    /// are untouched.
    pub fn advect_till_time<F>(
        &mut self,
        method: AdvectionMethod,
        start_time: f32,
        target_time: f32,
        max_steps: usize,
        progress: F,
    ) -> FlowResult<usize>
    where
        F: FnMut(&Progress) -> AdvectionControl,
    {
        let window = TimeWindow {
            start: start_time,
            target: target_time,
        };
        self.run_rounds(method, Some(window), max_steps, progress)
    }

    fn run_rounds<F>(
        &mut self,
        method: AdvectionMethod,
        window: Option<TimeWindow>,
        max_steps: usize,
        mut progress: F,
    ) -> FlowResult<usize>
    where
        F: FnMut(&Progress) -> AdvectionControl,
    {
        self.check_ready()?;

        let mut steps = 0;
        while steps < max_steps {
            if self.advance_all(method, window)? == 0 {
                break;
            }
            steps += 1;

            let snapshot = self.progress(steps);
            if progress(&snapshot) == AdvectionControl::Abort {
                warn!("Advection aborted after {} steps", steps);
                break;
            }
        }

        info!(
            "Advected {} steps, {} of {} streams still active",
            steps,
            self.num_active_streams(),
            self.streams.len()
        );
        Ok(steps)
    }

    fn progress(&self, step: usize) -> Progress {
        Progress {
            step,
            active_streams: self.num_active_streams(),
            total_particles: self.streams.iter().map(Vec::len).sum(),
        }
    }

    fn advance_all(&mut self, method: AdvectionMethod, window: Option<TimeWindow>) -> FlowResult<usize> {
        self.check_ready()?;
        let Some(field) = self.field else {
            return Err(FlowError::NoFieldYet);
        };

        let mut advanced = 0;
        for index in 0..self.streams.len() {
            if self.status[index] == StreamStatus::Exhausted {
                continue;
            }
            match self.next_particle(field, &self.streams[index], method, window) {
                StepOutcome::Advanced(particle) => {
                    self.streams[index].push(particle);
                    advanced += 1;
                }
                StepOutcome::Idle => {}
                StepOutcome::Exhausted(reason) => {
                    match reason {
                        Some(err) if !err.is_out_of_field() => {
                            warn!("Stream {} stopped: {}", index, err)
                        }
                        _ => debug!("Stream {} left the field", index),
                    }
                    self.status[index] = StreamStatus::Exhausted;
                }
            }
        }
        Ok(advanced)
    }

    fn next_particle(
        &self,
        field: &dyn VelocityField,
        stream: &[Particle],
        method: AdvectionMethod,
        window: Option<TimeWindow>,
    ) -> StepOutcome {
        let Some(p0) = stream.last() else {
            return StepOutcome::Exhausted(None);
        };
        if !field.inside_volume(p0.time, p0.location) {
            return StepOutcome::Exhausted(None);
        }

        let mut dt = self.next_step_size(stream);
        let mut clamped = None;
        if let Some(window) = window {
            let remaining = window.target - p0.time;
            if p0.time < window.start || !(remaining > 0.0) {
                return StepOutcome::Idle;
            }
            if dt >= remaining {
                dt = remaining;
                clamped = Some(window.target);
            }
        }
        if clamped.is_none() && !(p0.time + dt > p0.time) {
            return StepOutcome::Exhausted(Some(FlowError::StepUnderflow { time: p0.time, dt }));
        }

        let result = match method {
            AdvectionMethod::Euler => advect_euler(field, p0, dt),
            AdvectionMethod::Rk4 => advect_rk4(field, p0, dt),
        };
        let mut p1 = match result {
            Ok(p1) => p1,
            Err(err) => return StepOutcome::Exhausted(Some(err)),
        };

        if let Some(target) = clamped {
            p1.time = target;
        }
        p1.location = self.apply_periodic(p1.location);

        if field.has_field_value() && field.inside_volume(p1.time, p1.location) {
            if let Ok(value) = field.scalar(p1.time, p1.location) {
                p1.value = value;
            }
        }

        StepOutcome::Advanced(p1)
    }

    /// Step size for the next step of `stream`.
    ///
    /// With fewer than three particles this is the base step size; otherwise
    /// the previous step size scaled by the curvature of the last two steps.
    pub fn next_step_size(&self, stream: &[Particle]) -> f32 {
        let n = stream.len();
        if n < 3 {
            return self.base_step_size;
        }
        let (past2, past1, p0) = (&stream[n - 3], &stream[n - 2], &stream[n - 1]);
        let last_dt = p0.time - past1.time;
        if !(last_dt > 0.0 && last_dt.is_finite()) {
            // Repeated or unordered times in a caller-built history
            warn!(
                "Previous step of {} at time {} is unusable, falling back to {}",
                last_dt, p0.time, self.base_step_size
            );
            return self.base_step_size;
        }
        let previous = self.displacement(past2.location, past1.location);
        let latest = self.displacement(past1.location, p0.location);
        last_dt * self.step_control.adjust_factor(previous, latest)
    }

    /// `to - from` using the shortest image along periodic axes
    fn displacement(&self, from: Vec3, to: Vec3) -> Vec3 {
        let mut d = to - from;
        for (axis, bounds) in self.periodic.iter().enumerate() {
            if let Some(bounds) = bounds {
                let span = bounds.span();
                d[axis] -= span * (d[axis] / span).round();
            }
        }
        d
    }

    fn apply_periodic(&self, mut location: Vec3) -> Vec3 {
        for (axis, bounds) in self.periodic.iter().enumerate() {
            if let Some(bounds) = bounds {
                location[axis] = bounds.wrap(location[axis]);
            }
        }
        location
    }

    pub fn number_of_streams(&self) -> usize {
        self.streams.len()
    }

    pub fn stream_at(&self, index: usize) -> FlowResult<&[Particle]> {
        self.streams
            .get(index)
            .map(Vec::as_slice)
            .ok_or(FlowError::OutOfRange {
                index,
                len: self.streams.len(),
            })
    }

    pub fn streams(&self) -> impl Iterator<Item = &[Particle]> {
        self.streams.iter().map(Vec::as_slice)
    }

    pub fn stream_status(&self, index: usize) -> FlowResult<StreamStatus> {
        self.status.get(index).copied().ok_or(FlowError::OutOfRange {
            index,
            len: self.status.len(),
        })
    }

    pub fn is_exhausted(&self, index: usize) -> FlowResult<bool> {
        Ok(self.stream_status(index)? == StreamStatus::Exhausted)
    }

    pub fn num_active_streams(&self) -> usize {
        self.status
            .iter()
            .filter(|status| **status == StreamStatus::Active)
            .count()
    }

    /// Length of the longest stream
    pub fn max_num_of_particles(&self) -> usize {
        self.streams.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn value_name(&self) -> &str {
        &self.value_name
    }

    pub fn set_value_name(&mut self, name: impl Into<String>) {
        self.value_name = name.into();
    }

    pub fn property_names(&self) -> &[String] {
        &self.property_names
    }

    /// Sample `scalar_field` at every particle and attach the result as a new
    /// property named `name`. Points outside the field get NaN.
    pub fn calculate_particle_properties(
        &mut self,
        scalar_field: &dyn VelocityField,
        name: &str,
    ) -> FlowResult<()> {
        if !scalar_field.has_field_value() {
            return Err(FlowError::ScalarUnsupported);
        }
        for particle in self.streams.iter_mut().flatten() {
            let value = scalar_field
                .scalar(particle.time, particle.location)
                .unwrap_or(f32::NAN);
            particle.attach_property(value);
        }
        self.property_names.push(name.to_string());
        Ok(())
    }

    /// Attach one value per particle of stream `index` as property `name`.
    ///
    /// Particles of the other streams get NaN in the same slot so that a
    /// property name always maps to one index on every particle.
    pub fn attach_stream_property(&mut self, index: usize, name: &str, values: &[f32]) -> FlowResult<()> {
        let len = self.streams.len();
        let stream = self.streams.get(index).ok_or(FlowError::OutOfRange { index, len })?;
        if stream.len() != values.len() {
            return Err(FlowError::SizeMismatch {
                expected: stream.len(),
                found: values.len(),
            });
        }

        for (i, stream) in self.streams.iter_mut().enumerate() {
            if i == index {
                for (particle, value) in stream.iter_mut().zip(values) {
                    particle.attach_property(*value);
                }
            } else {
                for particle in stream.iter_mut() {
                    particle.attach_property(f32::NAN);
                }
            }
        }
        self.property_names.push(name.to_string());
        Ok(())
    }

    /// Drop the first property called `name` from the name list and from
    /// every particle holding that slot. Unknown names are ignored.
    pub fn remove_particle_property(&mut self, name: &str) {
        let Some(slot) = self.property_names.iter().position(|n| n == name) else {
            return;
        };
        self.property_names.remove(slot);
        for particle in self.streams.iter_mut().flatten() {
            // Particles appended after the property was attached lack the slot
            if slot < particle.num_properties() {
                let _ = particle.remove_property(slot);
            }
        }
        debug!("Removed particle property {}", name);
    }

    pub fn clear_particle_properties(&mut self) {
        for particle in self.streams.iter_mut().flatten() {
            particle.clear_properties();
        }
        self.property_names.clear();
    }

    /// Sample `scalar_field` into the value of every particle.
    ///
    /// With `skip_non_zero`, particles that already hold a non-zero value keep
    /// it. Separator particles and particles outside the field are left
    /// unchanged. Only `value` is
    /// written; location and time never change.
    pub fn calculate_particle_values(
        &mut self,
        scalar_field: &dyn VelocityField,
        skip_non_zero: bool,
    ) -> FlowResult<()> {
        if !scalar_field.has_field_value() {
            return Err(FlowError::ScalarUnsupported);
        }
        let mut missed = 0;
        for particle in self.streams.iter_mut().flatten() {
            if particle.is_special() || (skip_non_zero && particle.value != 0.0) {
                continue;
            }
            match scalar_field.scalar(particle.time, particle.location) {
                Ok(value) => particle.value = value,
                Err(_) => missed += 1,
            }
        }
        if missed > 0 {
            debug!("{} particles were outside the scalar field", missed);
        }
        Ok(())
    }

    /// Zero every value, except on separator particles
    pub fn reset_particle_values(&mut self) {
        for particle in self.streams.iter_mut().flatten().filter(|p| !p.is_special()) {
            particle.value = 0.0;
        }
    }

    /// Write every stream as `x y z` rows, streams separated by a blank line
    pub fn write_streams_gnuplot<W: Write>(&self, writer: &mut W) -> FlowResult<()> {
        for (i, stream) in self.streams.iter().enumerate() {
            if i > 0 {
                writeln!(writer)?;
            }
            for particle in stream {
                let p = particle.location;
                writeln!(writer, "{:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Plot with `splot "file" u 1:2:3 w lines`
    pub fn output_streams_gnuplot(&self, path: impl AsRef<Path>) -> FlowResult<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_streams_gnuplot(&mut writer)?;
        info!(
            "Wrote {} streams to {}",
            self.streams.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

fn advect_euler(field: &dyn VelocityField, p0: &Particle, dt: f32) -> FlowResult<Particle> {
    let v0 = field.velocity(p0.time, p0.location)?;
    Ok(Particle::new(p0.location + dt * v0, p0.time + dt))
}

fn advect_rk4(field: &dyn VelocityField, p0: &Particle, dt: f32) -> FlowResult<Particle> {
    let dt2 = dt * 0.5;
    let k1 = field.velocity(p0.time, p0.location)?;
    let k2 = field.velocity(p0.time + dt2, p0.location + dt2 * k1)?;
    let k3 = field.velocity(p0.time + dt2, p0.location + dt2 * k2)?;
    let k4 = field.velocity(p0.time + dt, p0.location + dt * k3)?;
    let location = p0.location + dt / 6.0 * (k1 + 2.0 * (k2 + k3) + k4);
    Ok(Particle::new(location, p0.time + dt))
}
