use crate::value::Value;

/// A one-input sink with no outputs. Exists only so otherwise unobserved
/// combinational sub-graphs are reachable from a steppable's perspective
/// and stay part of the execution plan rather than being trimmed.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct Terminate {
    last: Option<Value>,
}

impl Terminate {
    pub fn new() -> Self {
        Terminate::default()
    }

    pub fn evaluate(&mut self, inputs: &[Value]) {
        self.last = inputs.first().cloned();
    }

    pub fn last_value(&self) -> Option<&Value> {
        self.last.as_ref()
    }
}
