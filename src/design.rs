use std::cell::UnsafeCell;
use std::fmt;

use slotmap::SlotMap;

use crate::block::Block;
use crate::error::ConnectionError;
use crate::id::{BlockId, PortRef};

/// Interior-mutable slot for one block. `Design` itself stays `&mut self`
/// for ordinary single-owner construction and inspection; the executor
/// additionally reaches through `get_mut_unchecked` to mutate disjoint
/// blocks from several worker threads at once without a shared lock,
/// mirroring `original_source/lib/oddf/src/simulator.cpp`'s use of raw
/// pointers into a single `Design` across its worker threads.
struct Cell(UnsafeCell<Block>);

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        unsafe { (*self.0.get()).fmt(f) }
    }
}

// SAFETY: `Block` is `Send`, and every concurrent exclusive access to a
// `Cell` goes through `Design::get_mut_unchecked`, whose own safety
// contract requires the caller to prove no other thread touches the same
// `BlockId` at the same time. Under that contract, concurrent access to
// distinct `Cell`s from distinct threads never aliases.
unsafe impl Sync for Cell {}

/// Owns the full set of blocks that make up a design. Blocks are inserted
/// in construction order and that order is preserved by `iter()`, matching
/// `original_source/lib/oddf/src/design.cpp`'s `BlockEnumerator`.
///
/// Unlike the C++ source's `Design`, this type is not a process-wide
/// singleton (`g_pCurrentDesign`): callers build one and pass it by value
/// or reference into [`crate::registry::Registry::translate`]. Front-end
/// convenience (implicit "current design" lookup) is explicitly out of
/// scope for the core.
#[derive(Debug, Default)]
pub struct Design {
    blocks: SlotMap<BlockId, Cell>,
    order: Vec<BlockId>,
}

impl Design {
    pub fn new() -> Self {
        Design::default()
    }

    pub fn insert(&mut self, block: Block) -> BlockId {
        let id = self.blocks.insert(Cell(UnsafeCell::new(block)));
        self.order.push(id);
        id
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        // SAFETY: `&self` guarantees no `&mut Block` is alive through the
        // ordinary `get_mut`/`insert` API at the same time; concurrent
        // executor access is bounded by `get_mut_unchecked`'s own contract.
        self.blocks.get(id).map(|cell| unsafe { &*cell.0.get() })
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id).map(|cell| cell.0.get_mut())
    }

    /// Grants exclusive access to the block at `id` through a shared
    /// `&Design`, bypassing the normal `&mut self` requirement.
    ///
    /// # Safety
    /// The caller must ensure no other live reference (shared or
    /// exclusive) to the same `id` exists for the duration of the
    /// returned borrow. The executor upholds this using the planner's
    /// component/task partition: within one Propagate, distinct tasks
    /// touch disjoint block ids, and every block's combinational drivers
    /// land in its own task by construction (see `planner::Builder::visit`),
    /// so no concurrently running task ever reads or writes a block owned
    /// by another; within one Step, each steppable id is claimed by
    /// exactly one worker via an atomic cursor.
    pub unsafe fn get_mut_unchecked(&self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get(id).map(|cell| unsafe { &mut *cell.0.get() })
    }

    /// Blocks in insertion order, read-only.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.order.iter().map(move |id| (*id, self.get(*id).expect("order only contains live block ids")))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Connects `input` to `output`, updating both sides' bookkeeping.
    /// Fails if `input` already has a driver (invariant I1) or the port
    /// types don't match (invariant I3).
    pub fn connect(&mut self, input: PortRef, output: PortRef) -> Result<(), ConnectionError> {
        let output_ty = self.get(output.block).unwrap().outputs[output.port].ty;
        let input_block = self.get(input.block).unwrap();
        let input_port = &input_block.inputs[input.port];

        if input_port.is_connected() {
            return Err(ConnectionError::AlreadyConnected {
                path: input_block.path.clone(),
                port: input.port,
            });
        }
        if input_port.ty != output_ty {
            return Err(ConnectionError::TypeMismatch {
                output_path: self.get(output.block).unwrap().path.clone(),
                output_port: output.port,
                input_path: input_block.path.clone(),
                input_port: input.port,
            });
        }

        self.get_mut(input.block).unwrap().inputs[input.port].driver = Some(output);
        self.get_mut(output.block).unwrap().outputs[output.port].subscribers.push(input);
        Ok(())
    }

    /// Disconnects `input` from its current driver, updating both sides.
    /// Fails if `input` has no driver (invariant I1).
    pub fn disconnect(&mut self, input: PortRef) -> Result<(), ConnectionError> {
        let input_path = self.get(input.block).unwrap().path.clone();
        let driver = self
            .get_mut(input.block)
            .unwrap()
            .inputs[input.port]
            .driver
            .take()
            .ok_or(ConnectionError::NotConnected { path: input_path, port: input.port })?;

        let driver_path = self.get(driver.block).unwrap().path.clone();
        let subscribers = &mut self.get_mut(driver.block).unwrap().outputs[driver.port].subscribers;
        let pos = subscribers
            .iter()
            .position(|p| *p == input)
            .ok_or(ConnectionError::SubscriberInconsistent { path: driver_path, port: driver.port })?;
        subscribers.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;
    use crate::blocks::constant::Constant;
    use crate::blocks::terminate::Terminate;
    use crate::port::{InputPort, OutputPort};
    use crate::value::{TypeDescriptor, Value};

    fn const_block() -> Block {
        Block::new(
            "c",
            vec![],
            vec![OutputPort::new(TypeDescriptor::Bool)],
            BlockKind::Constant(Constant::new(vec![Value::Bool(true)])),
        )
    }

    fn terminate_block() -> Block {
        Block::new(
            "t",
            vec![InputPort::new(TypeDescriptor::Bool)],
            vec![],
            BlockKind::Terminate(Terminate::new()),
        )
    }

    #[test]
    fn insertion_order_preserved() {
        let mut d = Design::new();
        let a = d.insert(const_block());
        let b = d.insert(terminate_block());
        let ids: Vec<_> = d.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn connect_updates_both_sides() {
        let mut d = Design::new();
        let c = d.insert(const_block());
        let t = d.insert(terminate_block());
        d.connect(PortRef::new(t, 0), PortRef::new(c, 0)).unwrap();
        assert!(d.get(t).unwrap().inputs[0].is_connected());
        assert_eq!(d.get(c).unwrap().outputs[0].subscribers, vec![PortRef::new(t, 0)]);
    }

    #[test]
    fn double_connect_fails() {
        let mut d = Design::new();
        let c = d.insert(const_block());
        let t = d.insert(terminate_block());
        d.connect(PortRef::new(t, 0), PortRef::new(c, 0)).unwrap();
        let err = d.connect(PortRef::new(t, 0), PortRef::new(c, 0)).unwrap_err();
        assert!(matches!(err, ConnectionError::AlreadyConnected { .. }));
    }

    #[test]
    fn disconnect_then_reconnect() {
        let mut d = Design::new();
        let c = d.insert(const_block());
        let t = d.insert(terminate_block());
        d.connect(PortRef::new(t, 0), PortRef::new(c, 0)).unwrap();
        d.disconnect(PortRef::new(t, 0)).unwrap();
        assert!(!d.get(t).unwrap().inputs[0].is_connected());
        assert!(d.get(c).unwrap().outputs[0].subscribers.is_empty());
        d.connect(PortRef::new(t, 0), PortRef::new(c, 0)).unwrap();
        assert!(d.get(t).unwrap().inputs[0].is_connected());
    }

    #[test]
    fn get_mut_unchecked_reaches_the_same_block_as_get_mut() {
        let mut d = Design::new();
        let c = d.insert(const_block());
        unsafe {
            d.get_mut_unchecked(c).unwrap().path = "renamed".into();
        }
        assert_eq!(d.get(c).unwrap().path, "renamed");
    }
}
