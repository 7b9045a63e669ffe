use std::sync::atomic::{AtomicBool, Ordering};

use crate::design::Design;
use crate::id::BlockId;
use crate::planner::Plan;

/// Per-component outdated flag, initialized `true` so the first Propagate
/// after translation evaluates every component at least once.
///
/// A plain `AtomicBool` with `Relaxed` ordering is sufficient: the flag is
/// only ever set by Step (never cleared outside Propagate's own claiming
/// thread) and the condition-variable wait between Step and the following
/// Propagate already establishes the happens-before relationship the
/// executor needs.
#[derive(Debug)]
pub struct DirtyFlags {
    flags: Vec<AtomicBool>,
}

impl DirtyFlags {
    pub fn new(component_count: usize) -> Self {
        DirtyFlags {
            flags: (0..component_count).map(|_| AtomicBool::new(true)).collect(),
        }
    }

    pub fn is_outdated(&self, component: usize) -> bool {
        self.flags[component].load(Ordering::Relaxed)
    }

    pub fn clear(&self, component: usize) {
        self.flags[component].store(false, Ordering::Relaxed);
    }

    pub fn mark(&self, component: usize) {
        self.flags[component].store(true, Ordering::Relaxed);
    }
}

/// Marks every component that subscribes to any output of `block` as
/// outdated. Called after a steppable's `step()` reports that its state
/// actually changed.
pub fn mark_outdated_downstream(design: &Design, plan: &Plan, flags: &DirtyFlags, block: BlockId) {
    let Some(block_data) = design.get(block) else { return };
    for output in &block_data.outputs {
        for subscriber in &output.subscribers {
            if let Some(&component) = plan.component_of.get(&subscriber.block) {
                flags.mark(component);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_flags_start_outdated() {
        let flags = DirtyFlags::new(3);
        assert!(flags.is_outdated(0));
        assert!(flags.is_outdated(2));
    }

    #[test]
    fn clear_then_mark_round_trips() {
        let flags = DirtyFlags::new(1);
        flags.clear(0);
        assert!(!flags.is_outdated(0));
        flags.mark(0);
        assert!(flags.is_outdated(0));
    }
}
