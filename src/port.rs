use serde::{Deserialize, Serialize};

use crate::id::PortRef;
use crate::value::{TypeDescriptor, Value};

/// An input port: at most one driver, resolved to a concrete [`Value`] by
/// the executor before `evaluate`/`step` runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputPort {
    pub ty: TypeDescriptor,
    pub driver: Option<PortRef>,
}

impl InputPort {
    pub fn new(ty: TypeDescriptor) -> Self {
        InputPort { ty, driver: None }
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }
}

/// An output port: holds the current value published by its owning block
/// and the set of inputs that read it, maintained symmetrically with each
/// [`InputPort::driver`] by [`crate::design::Design::connect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPort {
    pub ty: TypeDescriptor,
    pub value: Value,
    pub subscribers: Vec<PortRef>,
}

impl OutputPort {
    pub fn new(ty: TypeDescriptor) -> Self {
        let value = ty.default_value();
        OutputPort {
            ty,
            value,
            subscribers: Vec::new(),
        }
    }
}
