use crate::value::Value;

/// One recorded change: the sampled input values and nothing else. The
/// block doesn't know its own path; the caller formats that in.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogLine {
    pub values: Vec<Value>,
}

/// A diagnostic sink: N inputs, no outputs, appends a line to a
/// pre-allocated ring buffer whenever any sampled input differs from the
/// previous Propagate. Never raises; a full buffer drops its oldest line.
///
/// Ring-buffer storage grounded on `factorial-core/src/event.rs`'s
/// `EventBuffer`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Logger {
    lines: Vec<Option<LogLine>>,
    head: usize,
    len: usize,
    last: Option<Vec<Value>>,
}

impl Logger {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Logger {
            lines: vec![None; capacity],
            head: 0,
            len: 0,
            last: None,
        }
    }

    pub fn evaluate(&mut self, inputs: &[Value]) {
        if self.last.as_deref() == Some(inputs) {
            return;
        }
        self.last = Some(inputs.to_vec());
        let capacity = self.lines.len();
        self.lines[self.head] = Some(LogLine { values: inputs.to_vec() });
        self.head = (self.head + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        let capacity = self.lines.len();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).map(move |i| self.lines[(start + i) % capacity].as_ref().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_only_on_change() {
        let mut l = Logger::new(4);
        l.evaluate(&[Value::I32(1)]);
        l.evaluate(&[Value::I32(1)]);
        l.evaluate(&[Value::I32(2)]);
        assert_eq!(l.len(), 2);
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut l = Logger::new(2);
        l.evaluate(&[Value::I32(1)]);
        l.evaluate(&[Value::I32(2)]);
        l.evaluate(&[Value::I32(3)]);
        let collected: Vec<_> = l.lines().map(|l| l.values[0].clone()).collect();
        assert_eq!(collected, vec![Value::I32(2), Value::I32(3)]);
    }
}
