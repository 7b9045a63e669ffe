//! Criterion benchmark for the simulator's Propagate throughput.
//!
//! `fanout_chain`: a single Constant driving a chain of N `Not` blocks
//! into a Terminate sink -- measures pure combinational evaluation cost
//! with no steppables in play.

use criterion::{criterion_group, criterion_main, Criterion};
use oddf_sim::block::{Block, BlockKind};
use oddf_sim::blocks::constant::Constant;
use oddf_sim::blocks::generic::{Generic, Op};
use oddf_sim::blocks::terminate::Terminate;
use oddf_sim::design::Design;
use oddf_sim::id::PortRef;
use oddf_sim::port::{InputPort, OutputPort};
use oddf_sim::value::{TypeDescriptor, Value};
use oddf_sim::{Executor, ExecutorConfig};

fn fanout_chain(length: usize) -> Design {
    let mut design = Design::new();
    let mut prev = design.insert(Block::new(
        "seed",
        vec![],
        vec![OutputPort::new(TypeDescriptor::Bool)],
        BlockKind::Constant(Constant::new(vec![Value::Bool(true)])),
    ));
    for i in 0..length {
        let not_block = design.insert(Block::new(
            format!("not_{i}"),
            vec![InputPort::new(TypeDescriptor::Bool)],
            vec![OutputPort::new(TypeDescriptor::Bool)],
            BlockKind::Generic(Generic::new(Op::Not)),
        ));
        design.connect(PortRef::new(not_block, 0), PortRef::new(prev, 0)).unwrap();
        prev = not_block;
    }
    let sink = design.insert(Block::new(
        "sink",
        vec![InputPort::new(TypeDescriptor::Bool)],
        vec![],
        BlockKind::Terminate(Terminate::new()),
    ));
    design.connect(PortRef::new(sink, 0), PortRef::new(prev, 0)).unwrap();
    design
}

fn bench_propagate(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagate");
    for length in [100usize, 1_000, 10_000] {
        group.bench_function(format!("fanout_chain_{length}"), |b| {
            b.iter_batched(
                || Executor::new(fanout_chain(length), ExecutorConfig::default()).unwrap(),
                |mut executor| executor.propagate(),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_propagate);
criterion_main!(benches);
