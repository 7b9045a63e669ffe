use std::collections::{HashMap, HashSet};

use crate::design::Design;
use crate::error::TranslationError;
use crate::id::BlockId;

/// A maximal set of blocks connected through combinational dependencies,
/// stored in a valid topological order for `evaluate`.
#[derive(Debug, Default, Clone)]
pub struct Component {
    pub blocks: Vec<BlockId>,
}

/// A list of components assigned to one executor work slot.
#[derive(Debug, Clone)]
pub struct Task {
    pub components: Vec<usize>,
}

/// The complete, static execution plan produced by stage B/C. Built once
/// per translated design and then reused for the simulator's lifetime.
#[derive(Debug, Clone)]
pub struct Plan {
    pub components: Vec<Component>,
    pub tasks: Vec<Task>,
    pub steppables: Vec<BlockId>,
    pub component_of: HashMap<BlockId, usize>,
}

/// Divisor used by stage C to size tasks: `total_blocks / task_divisor`.
/// 200 matches `original_source/lib/oddf/src/simulator.cpp`'s literal
/// `minTaskSize` constant.
const DEFAULT_TASK_DIVISOR: usize = 200;

struct Builder<'a> {
    design: &'a Design,
    component_of: HashMap<BlockId, usize>,
    mark: HashSet<BlockId>,
    components: Vec<Component>,
    free_list: Vec<usize>,
}

impl<'a> Builder<'a> {
    fn alloc_component(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.components[idx] = Component::default();
            idx
        } else {
            self.components.push(Component::default());
            self.components.len() - 1
        }
    }

    /// Implements the merge-smaller-into-larger component-building DFS.
    /// `current` is the component the surrounding traversal is building;
    /// visiting a block already assigned to a *different* component merges
    /// the two and updates `current` to the (possibly new) larger one.
    fn visit(&mut self, block: BlockId, current: &mut usize) -> Result<(), TranslationError> {
        if let Some(&existing) = self.component_of.get(&block) {
            if existing == *current {
                return Ok(());
            }
            let (small, large) = if self.components[existing].blocks.len() < self.components[*current].blocks.len() {
                (existing, *current)
            } else {
                (*current, existing)
            };
            let moved = std::mem::take(&mut self.components[small].blocks);
            for moved_block in &moved {
                self.component_of.insert(*moved_block, large);
            }
            self.components[large].blocks.extend(moved);
            self.free_list.push(small);
            *current = large;
            return Ok(());
        }

        if self.mark.contains(&block) {
            let path = self.design.get(block).map(|b| b.path.clone()).unwrap_or_default();
            return Err(TranslationError::ComputationalCycle { path });
        }

        self.mark.insert(block);
        let block_data = self.design.get(block).expect("planner visits only blocks present in the design");
        for source in block_data.source_blocks() {
            self.visit(source, current)?;
        }
        self.mark.remove(&block);

        self.components[*current].blocks.push(block);
        self.component_of.insert(block, *current);
        Ok(())
    }
}

/// Runs stages A-C: checks required-input connectivity, performs the DFS
/// component build with cycle detection, then partitions components into
/// tasks. Stage A (per-block self-simplification) is not modeled here: the
/// block set this crate ships has nothing to fold ahead of time.
pub fn build_plan(design: &Design) -> Result<Plan, TranslationError> {
    for (_, block) in design.iter() {
        for (index, input) in block.inputs.iter().enumerate() {
            if !input.is_connected() {
                return Err(TranslationError::UnconnectedRequiredInput {
                    path: block.path.clone(),
                    port: index,
                });
            }
        }
    }

    let mut builder = Builder {
        design,
        component_of: HashMap::new(),
        mark: HashSet::new(),
        components: Vec::new(),
        free_list: Vec::new(),
    };

    for (id, block) in design.iter() {
        if block.can_evaluate() && !builder.component_of.contains_key(&id) {
            let mut current = builder.alloc_component();
            builder.visit(id, &mut current)?;
        }
    }

    let mut components: Vec<Component> = builder.components.into_iter().filter(|c| !c.blocks.is_empty()).collect();
    components.sort_by(|a, b| b.blocks.len().cmp(&a.blocks.len()));

    let component_of: HashMap<BlockId, usize> = components
        .iter()
        .enumerate()
        .flat_map(|(idx, c)| c.blocks.iter().map(move |b| (*b, idx)))
        .collect();

    let total: usize = components.iter().map(|c| c.blocks.len()).sum();
    let min_task_size = total / DEFAULT_TASK_DIVISOR;

    let mut tasks = Vec::new();
    let mut current_task = Vec::new();
    let mut current_count = 0usize;
    for (index, component) in components.iter().enumerate() {
        current_task.push(index);
        current_count += component.blocks.len();
        if current_count >= min_task_size {
            tasks.push(Task {
                components: std::mem::take(&mut current_task),
            });
            current_count = 0;
        }
    }
    if !current_task.is_empty() {
        tasks.push(Task { components: current_task });
    }

    let steppables = design.iter().filter(|(_, b)| b.has_step()).map(|(id, _)| id).collect();

    Ok(Plan {
        components,
        tasks,
        steppables,
        component_of,
    })
}
