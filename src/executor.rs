use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crate::design::Design;
use crate::dirty::{mark_outdated_downstream, DirtyFlags};
use crate::error::{RuntimeError, TranslationError};
use crate::id::BlockId;
use crate::planner::{self, Plan};
use crate::value::Value;

/// Tunables for the planner/executor pair, exposed as a construction-time
/// struct rather than loaded from a file: this crate has no configuration
/// surface beyond its own constructor, consistent with the out-of-scope
/// front-end owning all file/CLI concerns.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Divides total block count to get the minimum task size. 200 matches
    /// the literal constant in the ODDF source.
    pub task_divisor: usize,
    /// Worker thread count. `None` uses `hardware_concurrency() - 1` as in
    /// the original, clamped to at least 1.
    pub thread_count: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            task_divisor: 200,
            thread_count: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum WorkerState {
    Idle = 0,
    Propagating = 1,
    Stepping = 2,
    Terminating = 3,
}

impl From<u8> for WorkerState {
    fn from(v: u8) -> Self {
        match v {
            1 => WorkerState::Propagating,
            2 => WorkerState::Stepping,
            3 => WorkerState::Terminating,
            _ => WorkerState::Idle,
        }
    }
}

#[derive(Debug)]
struct Shared {
    design: Design,
    plan: Plan,
    dirty: DirtyFlags,
    task_cursor: AtomicUsize,
    steppable_cursor: AtomicUsize,
    /// One entry per worker thread (the owner thread is not represented
    /// here; it tracks its own participation inline).
    worker_states: Vec<AtomicU8>,
    gate: Mutex<WorkerState>,
    gate_cv: Condvar,
    /// Counts workers still busy in the current phase. Initialized to the
    /// worker count before the gate is opened, decremented by each worker
    /// as it exhausts its share of the work; the owner waits for zero.
    /// Seeding the count before the gate opens (rather than having workers
    /// increment it themselves on wake) avoids the barrier race where the
    /// owner could observe "nobody is busy yet" before any worker has
    /// started.
    remaining: Mutex<usize>,
    idle_cv: Condvar,
    first_error: Mutex<Option<RuntimeError>>,
}

impl Shared {
    fn finish_worker_share(&self, worker_index: usize) {
        self.worker_states[worker_index].store(WorkerState::Idle as u8, Ordering::Release);
        let mut remaining = self.remaining.lock().unwrap();
        *remaining -= 1;
        if *remaining == 0 {
            self.idle_cv.notify_all();
        }
    }

    fn record_error(&self, err: RuntimeError) {
        let mut slot = self.first_error.lock().unwrap();
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}

/// Evaluates one block: gathers current input values from its drivers'
/// published outputs, then calls its `evaluate`, writing the result into
/// its own output ports.
///
/// Takes `&Design` rather than `&mut Design` so several workers can call
/// this concurrently for blocks in different tasks, each reaching its own
/// block through `get_mut_unchecked`. This is race-free because the
/// planner's stage B merges every combinational source into its
/// dependent's own component (see `planner::Builder::visit`), so a
/// block's drivers are always in the same task as the block itself; two
/// tasks running concurrently therefore never read or write the same
/// block id. `propagate_worker_loop` only calls this for one task's
/// components at a time, each id touched by exactly one worker per phase.
fn evaluate_block(design: &Design, block_id: BlockId) {
    let block = design.get(block_id).expect("plan references only existing blocks");
    let input_values: Vec<Value> = block
        .inputs
        .iter()
        .map(|input| match input.driver {
            Some(driver) => design.get(driver.block).unwrap().outputs[driver.port].value.clone(),
            None => input.ty.default_value(),
        })
        .collect();

    // SAFETY: see the function doc comment; `block_id` belongs to exactly
    // one task for the duration of this propagate phase.
    let block = unsafe { design.get_mut_unchecked(block_id) }.unwrap();
    let mut outputs = std::mem::take(&mut block.outputs);
    block.kind.evaluate(&input_values, &mut outputs);
    unsafe { design.get_mut_unchecked(block_id) }.unwrap().outputs = outputs;
}

/// Advances one steppable's internal state. Race-free because
/// `plan.steppables` lists each block id once and `step_worker_loop`
/// claims indices through an atomic cursor, so no two workers ever step
/// the same block concurrently; reads of other blocks' outputs are safe
/// because Step only runs after Propagate's phase barrier has completed,
/// so nothing is concurrently writing outputs at this point.
fn step_block(design: &Design, plan: &Plan, dirty: &DirtyFlags, block_id: BlockId) -> Result<(), RuntimeError> {
    let block = design.get(block_id).expect("plan references only existing blocks");
    let input_values: Vec<Value> = block
        .inputs
        .iter()
        .map(|input| match input.driver {
            Some(driver) => design.get(driver.block).unwrap().outputs[driver.port].value.clone(),
            None => input.ty.default_value(),
        })
        .collect();

    // SAFETY: see the function doc comment.
    let changed = unsafe { design.get_mut_unchecked(block_id) }.unwrap().kind.step(&input_values)?;
    if changed {
        mark_outdated_downstream(design, plan, dirty, block_id);
    }
    Ok(())
}

fn propagate_worker_loop(shared: &Shared) {
    loop {
        let index = shared.task_cursor.fetch_add(1, Ordering::AcqRel);
        if index >= shared.plan.tasks.len() {
            break;
        }
        let task = &shared.plan.tasks[index];
        for &component_index in &task.components {
            if !shared.dirty.is_outdated(component_index) {
                continue;
            }
            shared.dirty.clear(component_index);
            for &block_id in &shared.plan.components[component_index].blocks {
                evaluate_block(&shared.design, block_id);
            }
        }
    }
}

fn step_worker_loop(shared: &Shared) {
    loop {
        let index = shared.steppable_cursor.fetch_add(1, Ordering::AcqRel);
        if index >= shared.plan.steppables.len() {
            break;
        }
        let block_id = shared.plan.steppables[index];
        if let Err(err) = step_block(&shared.design, &shared.plan, &shared.dirty, block_id) {
            shared.record_error(err);
        }
    }
}

/// Drives a translated design forward: Propagate brings combinational
/// state to a fixpoint, Step advances registers by one clock. Grounded on
/// `original_source/lib/oddf/src/simulator.cpp`'s `Simulator` class, in
/// particular `RunWorkerThread`, `PropagateCore`, and `StepCore`.
#[derive(Debug)]
pub struct Executor {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl Executor {
    pub fn new(design: Design, config: ExecutorConfig) -> Result<Self, TranslationError> {
        let plan = planner::build_plan(&design)?;
        let dirty = DirtyFlags::new(plan.components.len());

        let thread_count = config
            .thread_count
            .unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(2).saturating_sub(1))
            .max(1);

        let shared = Arc::new(Shared {
            design,
            plan,
            dirty,
            task_cursor: AtomicUsize::new(0),
            steppable_cursor: AtomicUsize::new(0),
            worker_states: (0..thread_count).map(|_| AtomicU8::new(WorkerState::Idle as u8)).collect(),
            gate: Mutex::new(WorkerState::Idle),
            gate_cv: Condvar::new(),
            remaining: Mutex::new(0),
            idle_cv: Condvar::new(),
            first_error: Mutex::new(None),
        });

        let workers = (0..thread_count)
            .map(|worker_index| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("oddf-sim-worker-{worker_index}"))
                    .spawn(move || Self::worker_main(shared, worker_index))
                    .expect("spawning a simulation worker thread")
            })
            .collect();

        Ok(Executor { shared, workers })
    }

    fn worker_main(shared: Arc<Shared>, worker_index: usize) {
        loop {
            let phase = {
                let mut gate = shared.gate.lock().unwrap();
                while *gate == WorkerState::Idle {
                    gate = shared.gate_cv.wait(gate).unwrap();
                }
                *gate
            };

            shared.worker_states[worker_index].store(phase as u8, Ordering::Release);
            match phase {
                WorkerState::Propagating => propagate_worker_loop(&shared),
                WorkerState::Stepping => step_worker_loop(&shared),
                WorkerState::Terminating => {
                    shared.finish_worker_share(worker_index);
                    return;
                }
                WorkerState::Idle => continue,
            }
            shared.finish_worker_share(worker_index);
        }
    }

    fn run_phase(&self, phase: WorkerState, owner_work: impl Fn(&Shared)) {
        {
            let mut remaining = self.shared.remaining.lock().unwrap();
            *remaining = self.workers.len();
        }
        {
            let mut gate = self.shared.gate.lock().unwrap();
            *gate = phase;
            self.shared.gate_cv.notify_all();
        }

        owner_work(&self.shared);

        let remaining = self.shared.remaining.lock().unwrap();
        let _remaining = self.shared.idle_cv.wait_while(remaining, |r| *r > 0).unwrap();
        *self.shared.gate.lock().unwrap() = WorkerState::Idle;
    }

    /// Brings combinational state to a fixpoint consistent with current
    /// register outputs.
    pub fn propagate(&mut self) {
        self.shared.task_cursor.store(0, Ordering::Release);
        self.run_phase(WorkerState::Propagating, propagate_worker_loop);
    }

    /// Advances every steppable by one clock edge.
    pub fn step(&mut self) -> Result<(), RuntimeError> {
        self.shared.steppable_cursor.store(0, Ordering::Release);
        *self.shared.first_error.lock().unwrap() = None;
        self.run_phase(WorkerState::Stepping, step_worker_loop);
        self.shared.first_error.lock().unwrap().take().map_or(Ok(()), Err)
    }

    /// `propagate(); for _ in 0..n { step(); propagate(); }`.
    pub fn run(&mut self, iterations: u32) -> Result<(), RuntimeError> {
        self.propagate();
        for _ in 0..iterations {
            self.step()?;
            self.propagate();
        }
        Ok(())
    }

    /// Resets every steppable's internal state, then brings the design to
    /// a fresh combinational fixpoint.
    pub fn async_reset(&mut self) {
        // SAFETY: `&mut self` here means no propagate/step phase is in
        // flight (those also require `&mut self`) and all worker threads
        // are parked on the idle gate, so the owner thread is the sole
        // accessor of `self.shared.design` for the duration of this call.
        for &block_id in &self.shared.plan.steppables {
            unsafe { self.shared.design.get_mut_unchecked(block_id) }.unwrap().kind.async_reset();
        }
        for component_index in 0..self.shared.plan.components.len() {
            self.shared.dirty.mark(component_index);
        }
        self.propagate();
    }

    /// Human-readable diagnostic: block/component/task counts plus a
    /// histogram of components bucketed by power-of-two size, mirroring
    /// `Simulator::Report` in the original source.
    pub fn report(&self, writer: &mut impl std::io::Write) -> std::io::Result<()> {
        let plan = &self.shared.plan;
        writeln!(writer, "components: {}", plan.components.len())?;
        writeln!(writer, "steppables: {}", plan.steppables.len())?;
        writeln!(writer, "tasks: {}", plan.tasks.len())?;
        writeln!(writer, "worker threads: {}", self.workers.len())?;
        let busy = self
            .shared
            .worker_states
            .iter()
            .filter(|s| WorkerState::from(s.load(Ordering::Acquire)) != WorkerState::Idle)
            .count();
        writeln!(writer, "workers currently busy: {busy}")?;

        let mut buckets: std::collections::BTreeMap<u32, usize> = std::collections::BTreeMap::new();
        for component in &plan.components {
            let bucket = 32 - (component.blocks.len().max(1) as u32).leading_zeros();
            *buckets.entry(bucket).or_insert(0) += 1;
        }
        writeln!(writer, "component size histogram (log2 bucket -> count):")?;
        for (bucket, count) in buckets {
            writeln!(writer, "  2^{bucket:<3} {count:>10}")?;
        }
        Ok(())
    }

    pub fn design(&self) -> &Design {
        &self.shared.design
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        {
            let mut gate = self.shared.gate.lock().unwrap();
            *gate = WorkerState::Terminating;
            self.shared.gate_cv.notify_all();
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
