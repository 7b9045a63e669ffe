use crate::port::OutputPort;
use crate::value::Value;

/// A bank of `K` independent registers. `evaluate` publishes the current
/// state; `step` samples the input into state on the clock edge.
///
/// Grounded on `original_source/lib/oddf/src/blocks/delay.cpp`'s
/// `delay_block<T>`. The C++ source compiles one of two policies behind
/// `DFX_SIMULATOR_DELAY_DIRTY_ON_CHANGE`; here it is a runtime flag so both
/// policies are testable against the same binary.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Delay {
    state: Vec<Value>,
    defaults: Vec<Value>,
    dirty_on_change: bool,
}

impl Delay {
    pub fn new(defaults: Vec<Value>, dirty_on_change: bool) -> Self {
        Delay {
            state: defaults.clone(),
            defaults,
            dirty_on_change,
        }
    }

    pub fn evaluate(&self, outputs: &mut [OutputPort]) {
        for (out, s) in outputs.iter_mut().zip(self.state.iter()) {
            out.value = s.clone();
        }
    }

    /// Samples `inputs` into state. Returns whether state changed, which
    /// governs whether downstream components are marked outdated.
    pub fn step(&mut self, inputs: &[Value]) -> bool {
        if self.dirty_on_change {
            let mut changed = false;
            for (s, i) in self.state.iter_mut().zip(inputs.iter()) {
                if s != i {
                    *s = i.clone();
                    changed = true;
                }
            }
            changed
        } else {
            self.state = inputs.to_vec();
            true
        }
    }

    pub fn async_reset(&mut self) {
        self.state = self.defaults.clone();
    }
}

/// A [`Delay`] gated by a trailing boolean `enable` input. `step` is a
/// no-op while enable is false.
///
/// Grounded on `enabled_delay_block<T>` in the same source file. That
/// type's `GetInputPinName` recurses into itself instead of delegating to
/// the base delay naming logic (likely a copy-paste bug); this type does
/// not reproduce it. Naming here is just `inner`'s port list plus the
/// trailing enable port, handled by the caller that builds the port list.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EnabledDelay {
    inner: Delay,
}

impl EnabledDelay {
    pub fn new(defaults: Vec<Value>, dirty_on_change: bool) -> Self {
        EnabledDelay {
            inner: Delay::new(defaults, dirty_on_change),
        }
    }

    pub fn evaluate(&self, outputs: &mut [OutputPort]) {
        self.inner.evaluate(outputs);
    }

    /// `inputs` is the path values followed by the trailing enable value.
    pub fn step(&mut self, inputs: &[Value]) -> bool {
        let (paths, enable) = inputs.split_at(inputs.len() - 1);
        let enabled = enable[0].as_bool().unwrap_or(true);
        if !enabled {
            return false;
        }
        self.inner.step(paths)
    }

    pub fn async_reset(&mut self) {
        self.inner.async_reset();
    }
}
