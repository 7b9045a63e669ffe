use std::collections::HashSet;

use crate::blocks::{constant::Constant, decide::Decide, delay::Delay, delay::EnabledDelay};
use crate::blocks::{generic::Generic, logger::Logger, memory::Memory, terminate::Terminate};
use crate::id::BlockId;
use crate::port::{InputPort, OutputPort};
use crate::value::Value;

/// The built-in block payload. Dispatched by match, in a closed enum
/// rather than trait objects: the block set is small and fixed, and every
/// variant's state needs to be inspectable and serializable for
/// snapshotting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum BlockKind {
    Constant(Constant),
    Delay(Delay),
    EnabledDelay(EnabledDelay),
    Memory(Memory),
    Terminate(Terminate),
    Decide(Decide),
    Logger(Logger),
    Generic(Generic),
}

impl BlockKind {
    pub fn class_tag(&self) -> &'static str {
        match self {
            BlockKind::Constant(_) => "Constant",
            BlockKind::Delay(_) => "Delay",
            BlockKind::EnabledDelay(_) => "EnabledDelay",
            BlockKind::Memory(_) => "Memory",
            BlockKind::Terminate(_) => "Terminate",
            BlockKind::Decide(_) => "Decide",
            BlockKind::Logger(_) => "Logger",
            BlockKind::Generic(_) => "Generic",
        }
    }

    /// Whether this block's outputs depend combinationally on its current
    /// input values (and must therefore be placed in a component by the
    /// planner's DFS). Delay and Memory publish outputs derived solely from
    /// internal state, so they return `false` here for the purposes of
    /// `source_blocks` below even though they do expose `evaluate`.
    pub fn has_combinational_inputs(&self) -> bool {
        matches!(
            self,
            BlockKind::Terminate(_) | BlockKind::Decide(_) | BlockKind::Logger(_) | BlockKind::Generic(_)
        )
    }

    pub fn has_step(&self) -> bool {
        matches!(
            self,
            BlockKind::Delay(_) | BlockKind::EnabledDelay(_) | BlockKind::Memory(_)
        )
    }

    /// Recompute outputs from `inputs` (already resolved to concrete
    /// values, default-valued for unconnected ports) and write them into
    /// `outputs`.
    pub fn evaluate(&mut self, inputs: &[Value], outputs: &mut [OutputPort]) {
        match self {
            BlockKind::Constant(b) => b.evaluate(outputs),
            BlockKind::Delay(b) => b.evaluate(outputs),
            BlockKind::EnabledDelay(b) => b.evaluate(outputs),
            BlockKind::Memory(b) => b.evaluate(outputs),
            BlockKind::Terminate(b) => b.evaluate(inputs),
            BlockKind::Decide(b) => b.evaluate(inputs, outputs),
            BlockKind::Logger(b) => b.evaluate(inputs),
            BlockKind::Generic(b) => b.evaluate(inputs, outputs),
        }
    }

    /// Sample inputs into internal state. Returns `true` if state actually
    /// changed, for the dirty-propagation policy in `dirty.rs`.
    pub fn step(&mut self, inputs: &[Value]) -> Result<bool, crate::error::RuntimeError> {
        match self {
            BlockKind::Delay(b) => Ok(b.step(inputs)),
            BlockKind::EnabledDelay(b) => Ok(b.step(inputs)),
            BlockKind::Memory(b) => b.step(inputs),
            _ => Ok(false),
        }
    }

    pub fn async_reset(&mut self) {
        match self {
            BlockKind::Delay(b) => b.async_reset(),
            BlockKind::EnabledDelay(b) => b.async_reset(),
            BlockKind::Memory(b) => b.async_reset(),
            _ => {}
        }
    }
}

/// A single node in the simulator's block arena.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub class_tag: &'static str,
    pub path: String,
    pub inputs: Vec<InputPort>,
    pub outputs: Vec<OutputPort>,
    pub kind: BlockKind,
}

impl Block {
    pub fn new(path: impl Into<String>, inputs: Vec<InputPort>, outputs: Vec<OutputPort>, kind: BlockKind) -> Self {
        Block {
            class_tag: kind.class_tag(),
            path: path.into(),
            inputs,
            outputs,
            kind,
        }
    }

    pub fn can_evaluate(&self) -> bool {
        true
    }

    pub fn has_step(&self) -> bool {
        self.kind.has_step()
    }

    /// The set of blocks this block's outputs combinationally depend on,
    /// i.e. the edges the planner's DFS walks in stage B. Empty for blocks
    /// whose outputs derive from internal state rather than current inputs.
    pub fn source_blocks(&self) -> HashSet<BlockId> {
        if !self.kind.has_combinational_inputs() {
            return HashSet::new();
        }
        self.inputs
            .iter()
            .filter_map(|p| p.driver.map(|d| d.block))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeDescriptor;

    #[test]
    fn constant_has_no_sources() {
        let b = Block::new(
            "c",
            vec![],
            vec![OutputPort::new(TypeDescriptor::Bool)],
            BlockKind::Constant(Constant::new(vec![Value::Bool(true)])),
        );
        assert!(b.source_blocks().is_empty());
    }
}
