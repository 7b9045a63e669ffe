use thiserror::Error;

/// Violations of port-connection invariants (I1/I2/I3 from the data model).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("input port {path}:{port} is already connected")]
    AlreadyConnected { path: String, port: usize },

    #[error("input port {path}:{port} is not connected")]
    NotConnected { path: String, port: usize },

    #[error("cannot connect {output_path}:{output_port} to {input_path}:{input_port}: type mismatch")]
    TypeMismatch {
        output_path: String,
        output_port: usize,
        input_path: String,
        input_port: usize,
    },

    #[error("subscriber list for {path}:{port} is inconsistent with its connected inputs")]
    SubscriberInconsistent { path: String, port: usize },
}

/// Failures raised while planning an execution order from a translated set
/// of blocks (stage B/C of the planner).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("computational cycle detected through block {path}")]
    ComputationalCycle { path: String },

    #[error("required input {port} of block {path} is not connected")]
    UnconnectedRequiredInput { path: String, port: usize },
}

/// Failures raised while running a translated design.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("address {address} out of range for memory {path} of depth {depth}")]
    AddressOutOfRange {
        path: String,
        address: i64,
        depth: usize,
    },

    #[error("internal invariant violated: {message}")]
    Internal { message: String },
}

/// A non-fatal diagnostic produced while translating a design. Collected
/// into a `Vec<Warning>` and returned to the caller rather than printed;
/// the core never writes to stdout/stderr on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub class_tag: String,
    pub path: String,
    pub message: String,
}

/// Top-level error type returned by the public API, unifying the
/// subsystem-specific error enums.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DesignError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("invalid type descriptor: {message}")]
    InvalidType { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_display() {
        let e = ConnectionError::AlreadyConnected {
            path: "counter.delay".into(),
            port: 0,
        };
        assert!(e.to_string().contains("already connected"));
    }

    #[test]
    fn design_error_from_translation() {
        let t = TranslationError::ComputationalCycle {
            path: "a.not".into(),
        };
        let d: DesignError = t.into();
        assert!(d.to_string().contains("computational cycle"));
    }
}
