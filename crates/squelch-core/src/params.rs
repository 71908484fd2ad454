//! The parameter store: targets, smoothing, and engine dispatch.
//!
//! A [`ParameterSet`] owns one [`SmoothedParam`] per descriptor plus the
//! conversion currently in force for it. The control thread writes targets;
//! the audio thread calls [`ParameterSet::advance_all`] once per slice, which
//! smooths every value, resolves the dependency table, and forwards changed
//! values to the engine in physical units.
//!
//! # Example
//!
//! ```rust
//! use squelch_core::{layout, ParameterSet, SilentEngine};
//!
//! let mut params = ParameterSet::voice();
//! params.set_target(layout::CUTOFF, 0.25);
//!
//! let mut engine = SilentEngine;
//! params.advance_all(4, &mut engine);
//! assert!(params.get(layout::CUTOFF).unwrap() < 1.0);
//! ```

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::engine::SynthEngine;
use crate::layout::{Dependency, VOICE_DEPENDENCIES, VOICE_PARAMS};
use crate::param::SmoothedParam;
use crate::param_info::{Conversion, ParamDescriptor, ParamId};

/// One live parameter.
#[derive(Debug, Clone, Copy)]
struct Parameter {
    desc: &'static ParamDescriptor,
    value: SmoothedParam,
    conversion: Conversion,
    dirty: bool,
}

/// Fixed-size, id-indexed collection of smoothed parameters.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    params: Vec<Parameter>,
    dependencies: &'static [Dependency],
    elapsed: u64,
}

impl ParameterSet {
    /// Build a set from a descriptor table and its dependencies.
    ///
    /// Every parameter starts settled at its default and marked for dispatch,
    /// so the first [`advance_all`](Self::advance_all) brings the engine in line.
    pub fn new(
        descriptors: &'static [ParamDescriptor],
        dependencies: &'static [Dependency],
    ) -> Self {
        let params = descriptors
            .iter()
            .map(|desc| Parameter {
                desc,
                value: SmoothedParam::new(desc.default, desc.alpha),
                conversion: desc.conversion,
                dirty: true,
            })
            .collect();
        let mut set = Self {
            params,
            dependencies,
            elapsed: 0,
        };
        set.resolve_dependencies(true);
        set
    }

    /// The voice layout from [`crate::layout`].
    pub fn voice() -> Self {
        Self::new(&VOICE_PARAMS, &VOICE_DEPENDENCIES)
    }

    /// Number of parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Descriptor for `id`.
    pub fn descriptor(&self, id: ParamId) -> Option<&'static ParamDescriptor> {
        self.params.get(id.index()).map(|p| p.desc)
    }

    /// Iterate descriptors in id order.
    pub fn descriptors(&self) -> impl Iterator<Item = &'static ParamDescriptor> + '_ {
        self.params.iter().map(|p| p.desc)
    }

    /// Smoothed normalized value.
    pub fn get(&self, id: ParamId) -> Option<f64> {
        self.params.get(id.index()).map(|p| p.value.get())
    }

    /// Target normalized value.
    pub fn target(&self, id: ParamId) -> Option<f64> {
        self.params.get(id.index()).map(|p| p.value.target())
    }

    /// Conversion currently in force, after dependencies.
    pub fn conversion(&self, id: ParamId) -> Option<Conversion> {
        self.params.get(id.index()).map(|p| p.conversion)
    }

    /// Smoothed value in physical units.
    pub fn physical(&self, id: ParamId) -> Option<f64> {
        self.params
            .get(id.index())
            .map(|p| p.conversion.to_physical(p.value.get()))
    }

    /// Samples covered by all `advance_all` calls so far.
    pub fn elapsed_samples(&self) -> u64 {
        self.elapsed
    }

    /// Set a target. Clamped to `0.0..=1.0`.
    ///
    /// Returns `false` (and changes nothing) for unknown ids, read-only
    /// parameters, and non-finite values.
    pub fn set_target(&mut self, id: ParamId, normalized: f64) -> bool {
        match self.params.get_mut(id.index()) {
            Some(p) if !p.desc.is_read_only() && normalized.is_finite() => {
                p.value.set_target(normalized.clamp(0.0, 1.0));
                true
            }
            _ => false,
        }
    }

    /// Set target and smoothed value together, bypassing smoothing.
    ///
    /// Unlike [`set_target`](Self::set_target) this accepts read-only
    /// parameters, so meters can be written through it.
    pub fn set_immediate(&mut self, id: ParamId, normalized: f64) -> bool {
        match self.params.get_mut(id.index()) {
            Some(p) if normalized.is_finite() => {
                p.value.set_immediate(normalized.clamp(0.0, 1.0));
                p.dirty = true;
                true
            }
            _ => false,
        }
    }

    /// Set every writable target from a snapshot. Extra values are ignored.
    pub fn apply_values(&mut self, values: &ParamValues) {
        for (index, &value) in values.as_slice().iter().enumerate() {
            self.set_target(ParamId(index as u32), value);
        }
    }

    /// Copy every target into `out`, reusing its storage.
    pub fn capture_targets(&self, out: &mut ParamValues) {
        out.0.clear();
        out.0.extend(self.params.iter().map(|p| p.value.target()));
    }

    /// Snap every parameter back to its descriptor default.
    pub fn reset_to_defaults(&mut self) {
        for p in &mut self.params {
            p.value.set_immediate(p.desc.default);
            p.dirty = true;
        }
        self.resolve_dependencies(true);
    }

    /// Smooth every parameter once and push changed values to the engine.
    ///
    /// `slice_len` is the length of the slice this update covers; smoothing is
    /// applied exactly once regardless of it. Returns how many values were
    /// sent to the engine.
    pub fn advance_all<E: SynthEngine + ?Sized>(
        &mut self,
        slice_len: usize,
        engine: &mut E,
    ) -> usize {
        self.elapsed = self.elapsed.wrapping_add(slice_len as u64);
        for p in &mut self.params {
            let before = p.value.get();
            if p.value.advance() != before {
                p.dirty = true;
            }
        }
        self.resolve_dependencies(false);
        self.flush(engine)
    }

    /// Push every writable value to the engine regardless of change.
    pub fn sync_all<E: SynthEngine + ?Sized>(&mut self, engine: &mut E) -> usize {
        for p in &mut self.params {
            p.dirty = true;
        }
        self.flush(engine)
    }

    fn flush<E: SynthEngine + ?Sized>(&mut self, engine: &mut E) -> usize {
        let mut sent = 0;
        for p in &mut self.params {
            if !p.dirty {
                continue;
            }
            p.dirty = false;
            if p.desc.is_read_only() {
                continue;
            }
            engine.set_parameter(p.desc.id, p.conversion.to_physical(p.value.get()));
            sent += 1;
        }
        sent
    }

    /// Re-evaluate the dependency table. Only dirty sources are considered
    /// unless `all` is set. A target whose conversion changes becomes dirty.
    fn resolve_dependencies(&mut self, all: bool) {
        for dep in self.dependencies {
            let Some(source) = self.params.get(dep.source.index()) else {
                continue;
            };
            if !all && !source.dirty {
                continue;
            }
            let step = source.conversion.step_index(source.value.get());
            let Some(conversion) = dep.conversion_for(step) else {
                continue;
            };
            if let Some(target) = self.params.get_mut(dep.target.index())
                && target.conversion != conversion
            {
                target.conversion = conversion;
                target.dirty = true;
            }
        }
    }
}

/// Normalized targets for every parameter, in id order.
///
/// This is the payload handed from the control thread to the audio thread.
/// `clone_from` reuses the existing allocation, so refreshing a pooled
/// snapshot never allocates once it has the right length.
#[derive(Debug, PartialEq, Default)]
pub struct ParamValues(Vec<f64>);

impl ParamValues {
    /// Wrap a list of normalized values.
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Targets of `set`.
    pub fn from_set(set: &ParameterSet) -> Self {
        let mut values = Self(Vec::with_capacity(set.len()));
        set.capture_targets(&mut values);
        values
    }

    /// Values as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value for `id`.
    pub fn get(&self, id: ParamId) -> Option<f64> {
        self.0.get(id.index()).copied()
    }

    /// Overwrite the value for `id`. Returns `false` when out of range.
    pub fn set(&mut self, id: ParamId, normalized: f64) -> bool {
        match self.0.get_mut(id.index()) {
            Some(slot) => {
                *slot = normalized;
                true
            }
            None => false,
        }
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Clone for ParamValues {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }

    fn clone_from(&mut self, source: &Self) {
        self.0.clone_from(&source.0);
    }
}
