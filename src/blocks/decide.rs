use crate::port::OutputPort;
use crate::value::Value;

/// A ternary select: `condition ? when_true : when_false`. Combinational,
/// one output.
///
/// The original ODDF framework's `Decide`/`Mux2` generator family uses this
/// pervasively for exactly this kind of reset/select mux.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct Decide;

impl Decide {
    pub fn new() -> Self {
        Decide
    }

    /// `inputs` is `[condition, when_true, when_false]`.
    pub fn evaluate(&self, inputs: &[Value], outputs: &mut [OutputPort]) {
        let condition = inputs[0].as_bool().unwrap_or(false);
        let selected = if condition { &inputs[1] } else { &inputs[2] };
        outputs[0].value = selected.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeDescriptor;

    #[test]
    fn selects_when_true_branch() {
        let d = Decide::new();
        let mut outputs = vec![OutputPort::new(TypeDescriptor::I32)];
        d.evaluate(&[Value::Bool(true), Value::I32(1), Value::I32(2)], &mut outputs);
        assert_eq!(outputs[0].value, Value::I32(1));
    }

    #[test]
    fn selects_when_false_branch() {
        let d = Decide::new();
        let mut outputs = vec![OutputPort::new(TypeDescriptor::I32)];
        d.evaluate(&[Value::Bool(false), Value::I32(1), Value::I32(2)], &mut outputs);
        assert_eq!(outputs[0].value, Value::I32(2));
    }
}
