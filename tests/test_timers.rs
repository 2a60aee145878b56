use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use telefsm::{
    Engine, EventData, EventId, EventMask, FsmBehavior, FsmDescriptor, InstanceId, StateId, StateMask, StateSpec,
    TermCause,
};

mod common;

const ST_IDLE: StateId = 0;
const ST_WAIT: StateId = 1;
const ST_RETRY: StateId = 2;

const EV_KICK: EventId = 0;

#[derive(Clone, Copy, PartialEq, Eq)]
enum OnExpiry {
    Record,
    Terminate,
}

struct Guard {
    expiry: OnExpiry,
    fired: Rc<RefCell<Vec<u32>>>,
}

impl FsmBehavior for Guard {
    fn action(&self, _: &mut Engine, _: InstanceId, _: StateId, _: EventId, _: Option<EventData>) {}

    fn has_timer_cb(&self) -> bool {
        true
    }

    fn timer_cb(&self, engine: &mut Engine, fi: InstanceId) {
        let label = engine.timer_label(fi).unwrap_or_default();
        self.fired.borrow_mut().push(label);
        if self.expiry == OnExpiry::Terminate {
            engine.terminate(fi, TermCause::Error, None);
        }
    }
}

/// Accepts timeouts but has no timer callback.
struct Careless;

impl FsmBehavior for Careless {
    fn action(&self, _: &mut Engine, _: InstanceId, _: StateId, _: EventId, _: Option<EventData>) {}
}

fn table(builder: telefsm::DescriptorBuilder) -> telefsm::DescriptorBuilder {
    builder
        .state(StateSpec::new("IDLE").out(StateMask::bit(ST_WAIT)))
        .state(
            StateSpec::new("WAIT")
                .events(EventMask::bit(EV_KICK))
                .out(StateMask::bit(ST_RETRY) | StateMask::bit(ST_IDLE)),
        )
        .state(StateSpec::new("RETRY").out(StateMask::bit(ST_IDLE)))
        .event_names(&["KICK"])
}

fn guarded(expiry: OnExpiry) -> (Engine, Rc<FsmDescriptor>, Rc<RefCell<Vec<u32>>>) {
    common::init_tracing();
    let fired = Rc::new(RefCell::new(Vec::new()));
    let fsm = table(FsmDescriptor::builder("GUARD"))
        .build(Guard {
            expiry,
            fired: Rc::clone(&fired),
        })
        .unwrap();
    let mut engine = Engine::default();
    engine.register(&fsm);
    (engine, fsm, fired)
}

#[tokio::test(start_paused = true)]
async fn second_arm_replaces_the_first() {
    let (mut engine, fsm, fired) = guarded(OnExpiry::Record);
    let fi = engine.alloc(&fsm, None, None, None);

    engine.state_chg(fi, ST_WAIT, Duration::from_secs(5), 1).unwrap();
    engine.state_chg(fi, ST_RETRY, Duration::from_secs(10), 2).unwrap();

    tokio::time::advance(Duration::from_secs(6)).await;
    assert_eq!(engine.fire_expired(), 0);
    assert!(fired.borrow().is_empty());
    assert_eq!(engine.timer_remaining(fi), Some(Duration::from_secs(4)));

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(engine.fire_expired(), 1);
    assert_eq!(*fired.borrow(), vec![2]);

    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(engine.fire_expired(), 0);
    assert_eq!(fired.borrow().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_keeps_the_pending_timer() {
    let (mut engine, fsm, fired) = guarded(OnExpiry::Record);
    let fi = engine.alloc(&fsm, None, None, None);

    engine.state_chg(fi, ST_WAIT, Duration::from_secs(3), 7).unwrap();
    engine.state_chg(fi, ST_IDLE, Duration::ZERO, 0).unwrap();
    assert_eq!(engine.timer_label(fi), Some(7));

    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(engine.fire_expired(), 1);
    assert_eq!(*fired.borrow(), vec![7]);
}

#[tokio::test(start_paused = true)]
async fn termination_cancels_the_timer() {
    let (mut engine, fsm, fired) = guarded(OnExpiry::Record);
    let fi = engine.alloc(&fsm, None, None, None);

    engine.state_chg(fi, ST_WAIT, Duration::from_secs(1), 1).unwrap();
    engine.terminate(fi, TermCause::Request, None);
    assert_eq!(engine.next_deadline(), None);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(engine.fire_expired(), 0);
    assert!(fired.borrow().is_empty());
}

#[tokio::test(start_paused = true)]
async fn expiry_may_terminate_the_instance() {
    let (mut engine, fsm, fired) = guarded(OnExpiry::Terminate);
    let a = engine.alloc(&fsm, None, None, Some("a"));
    let b = engine.alloc(&fsm, None, None, Some("b"));

    engine.state_chg(a, ST_WAIT, Duration::from_secs(1), 1).unwrap();
    engine.state_chg(b, ST_WAIT, Duration::from_secs(2), 2).unwrap();

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(engine.fire_expired(), 2);
    assert_eq!(*fired.borrow(), vec![1, 2]);
    assert!(!engine.is_alive(a));
    assert!(!engine.is_alive(b));
    assert_eq!(engine.live_instances(), 0);
    assert!(engine.instances_of(&fsm).is_empty());
}

#[tokio::test(start_paused = true)]
async fn timeout_without_callback_still_transitions() {
    common::init_tracing();
    let fsm = table(FsmDescriptor::builder("CARELESS")).build(Careless).unwrap();
    let mut engine = Engine::default();
    let fi = engine.alloc(&fsm, None, None, None);

    engine.state_chg(fi, ST_WAIT, Duration::from_secs(5), 3).unwrap();
    assert_eq!(engine.state(fi), Some(ST_WAIT));
    assert_eq!(engine.timer_label(fi), Some(3));
    assert!(engine.timer_remaining(fi).is_some());

    // Expiry runs the default no-op callback.
    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(engine.fire_expired(), 1);
    assert_eq!(engine.state(fi), Some(ST_WAIT));
    assert!(engine.is_alive(fi));
}
