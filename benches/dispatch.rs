use std::rc::Rc;
use std::time::Duration;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use telefsm::{
    Engine, EngineConfig, EventData, EventId, FsmBehavior, FsmDescriptor, FsmEvent, FsmStates, InstanceId, StateId,
    TermCause,
};

#[derive(Debug, Clone, Copy, FsmEvent)]
pub enum BenchEvent {
    Job,
    Done,
}

#[derive(Debug, Clone, Copy, FsmStates)]
#[fsm(events = BenchEvent)]
pub enum BenchState {
    #[state(out(Processing), events(Job))]
    Idle,
    #[state(out(Idle), events(Done))]
    Processing,
}

struct Toggle;

impl FsmBehavior for Toggle {
    fn action(&self, engine: &mut Engine, fi: InstanceId, state: StateId, _: EventId, _: Option<EventData>) {
        let next = match BenchState::try_from(state) {
            Ok(BenchState::Idle) => BenchState::Processing,
            _ => BenchState::Idle,
        };
        let _ = engine.state_chg(fi, next, Duration::ZERO, 0);
    }
}

fn descriptor() -> Rc<FsmDescriptor> {
    FsmDescriptor::builder("BENCH")
        .states::<BenchState>()
        .events::<BenchEvent>()
        .build(Toggle)
        .unwrap()
}

fn quiet_engine() -> Engine {
    Engine::new(EngineConfig {
        log_addr: false,
        ..EngineConfig::default()
    })
}

fn benchmark_dispatch_cycles(c: &mut Criterion) {
    let fsm = descriptor();

    c.bench_function("dispatch_1000_cycles", |b| {
        let mut engine = quiet_engine();
        let fi = engine.alloc(&fsm, None, None, None);
        b.iter(|| {
            for _ in 0..1000 {
                engine.dispatch(fi, BenchEvent::Job, None).unwrap();
                engine.dispatch(fi, BenchEvent::Done, None).unwrap();
            }
        })
    });
}

fn benchmark_run_loop(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let fsm = descriptor();

    c.bench_function("run_loop_1000_cycles", |b| {
        b.to_async(&rt).iter(|| async {
            let mut engine = quiet_engine();
            let fi = engine.alloc(&fsm, None, None, None);
            let (handle, mailbox) = telefsm::channel(2048);

            for _ in 0..1000 {
                handle.try_send(fi, BenchEvent::Job).unwrap();
                handle.try_send(fi, BenchEvent::Done).unwrap();
            }
            handle.shutdown_graceful();
            engine.run(mailbox).await
        })
    });
}

fn benchmark_tree_teardown(c: &mut Criterion) {
    let fsm = descriptor();

    c.bench_function("terminate_tree_1_10_100", |b| {
        b.iter_batched(
            || {
                let mut engine = quiet_engine();
                let root = engine.alloc(&fsm, None, None, None);
                for _ in 0..10 {
                    let mid = engine.alloc_child(&fsm, root, BenchEvent::Done).unwrap();
                    for _ in 0..10 {
                        engine.alloc_child(&fsm, mid, BenchEvent::Done).unwrap();
                    }
                }
                (engine, root)
            },
            |(mut engine, root)| {
                engine.terminate(root, TermCause::Request, None);
                engine
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    benchmark_dispatch_cycles,
    benchmark_run_loop,
    benchmark_tree_teardown
);
criterion_main!(benches);
