use crate::port::OutputPort;
use crate::value::Value;

/// The fixed set of combinational operators `Generic` can perform. A closed
/// enum rather than a boxed closure so block state stays serializable and
/// inspectable, following `factorial-core/src/processor.rs`'s `Processor`
/// dispatch idiom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Op {
    Not,
    And,
    Or,
    Xor,
    Add,
    Sub,
    LessThan,
    Equal,
}

/// A single-output N-input pure-function block used to realize the
/// arithmetic/logic primitives an out-of-scope design front-end would
/// otherwise lower to one-off block classes (`Not`, `And`, `Add`, …).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Generic {
    op: Op,
}

impl Generic {
    pub fn new(op: Op) -> Self {
        Generic { op }
    }

    pub fn evaluate(&self, inputs: &[Value], outputs: &mut [OutputPort]) {
        let result = match self.op {
            Op::Not => Value::Bool(!inputs[0].as_bool().unwrap_or(false)),
            Op::And => Value::Bool(inputs.iter().all(|v| v.as_bool().unwrap_or(false))),
            Op::Or => Value::Bool(inputs.iter().any(|v| v.as_bool().unwrap_or(false))),
            Op::Xor => Value::Bool(inputs.iter().filter(|v| v.as_bool().unwrap_or(false)).count() % 2 == 1),
            Op::Add => binary_numeric(inputs, |a, b| a + b, |a, b| a + b),
            Op::Sub => binary_numeric(inputs, |a, b| a - b, |a, b| a - b),
            Op::LessThan => Value::Bool(compare(inputs) == std::cmp::Ordering::Less),
            Op::Equal => Value::Bool(inputs[0] == inputs[1]),
        };
        outputs[0].value = result;
    }
}

fn binary_numeric(inputs: &[Value], int_op: impl Fn(i64, i64) -> i64, float_op: impl Fn(f64, f64) -> f64) -> Value {
    match (&inputs[0], &inputs[1]) {
        (Value::F64(a), Value::F64(b)) => Value::F64(float_op(*a, *b)),
        (Value::I64(a), Value::I64(b)) => Value::I64(int_op(*a, *b)),
        (a, b) => {
            let a = a.as_address().unwrap_or(0);
            let b = b.as_address().unwrap_or(0);
            Value::I64(int_op(a, b))
        }
    }
}

fn compare(inputs: &[Value]) -> std::cmp::Ordering {
    match (&inputs[0], &inputs[1]) {
        (Value::F64(a), Value::F64(b)) => a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal),
        _ => {
            let a = inputs[0].as_address().unwrap_or(0);
            let b = inputs[1].as_address().unwrap_or(0);
            a.cmp(&b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeDescriptor;

    fn out() -> Vec<OutputPort> {
        vec![OutputPort::new(TypeDescriptor::Bool)]
    }

    #[test]
    fn not_inverts_boolean() {
        let g = Generic::new(Op::Not);
        let mut o = out();
        g.evaluate(&[Value::Bool(false)], &mut o);
        assert_eq!(o[0].value, Value::Bool(true));
    }

    #[test]
    fn and_requires_all_true() {
        let g = Generic::new(Op::And);
        let mut o = out();
        g.evaluate(&[Value::Bool(true), Value::Bool(false)], &mut o);
        assert_eq!(o[0].value, Value::Bool(false));
    }

    #[test]
    fn add_integers() {
        let g = Generic::new(Op::Add);
        let mut o = out();
        g.evaluate(&[Value::I64(2), Value::I64(3)], &mut o);
        assert_eq!(o[0].value, Value::I64(5));
    }

    #[test]
    fn less_than_integers() {
        let g = Generic::new(Op::LessThan);
        let mut o = out();
        g.evaluate(&[Value::I64(2), Value::I64(3)], &mut o);
        assert_eq!(o[0].value, Value::Bool(true));
    }
}
