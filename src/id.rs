use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a block in the arena owned by a [`crate::design::Design`] or
    /// [`crate::executor::Executor`].
    pub struct BlockId;
}

/// The index of a port within its owning block's input or output list.
/// Stable for the lifetime of the block.
pub type PortIndex = usize;

/// Fully qualifies an input or output port: the block that owns it and the
/// port's position within that block's input or output list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub block: BlockId,
    pub port: PortIndex,
}

impl PortRef {
    pub fn new(block: BlockId, port: PortIndex) -> Self {
        PortRef { block, port }
    }
}
