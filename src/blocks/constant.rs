use crate::port::OutputPort;
use crate::value::Value;

/// Fixed values written once at construction. `evaluate` is a no-op in the
/// sense that it never depends on input values (Constant has no inputs),
/// but it still republishes the fixed values every Propagate for
/// uniformity with other blocks.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Constant {
    values: Vec<Value>,
}

impl Constant {
    pub fn new(values: Vec<Value>) -> Self {
        Constant { values }
    }

    pub fn evaluate(&self, outputs: &mut [OutputPort]) {
        for (out, v) in outputs.iter_mut().zip(self.values.iter()) {
            out.value = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeDescriptor;

    #[test]
    fn evaluate_republishes_fixed_values() {
        let c = Constant::new(vec![Value::I32(7)]);
        let mut outputs = vec![OutputPort::new(TypeDescriptor::I32)];
        c.evaluate(&mut outputs);
        assert_eq!(outputs[0].value, Value::I32(7));
    }
}
