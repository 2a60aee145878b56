use std::time::Duration;

use telefsm::{
    Engine, EngineConfig, EventData, EventId, FsmBehavior, FsmDescriptor, FsmError, FsmEvent, FsmStates,
    InstanceId, StateId,
};

mod common;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FsmEvent)]
pub enum LuEvent {
    #[event(name = "LU_START")]
    Start,
    #[event(name = "LU_ACK")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FsmStates)]
#[fsm(events = LuEvent)]
pub enum LuState {
    #[state(out(Wait), name = "IDLE")]
    Idle,
    #[state(out(Idle, Done), events(Ack), name = "WAIT")]
    Wait,
    #[state(name = "DONE")]
    Done,
}

struct Lu;

impl FsmBehavior for Lu {
    fn action(&self, engine: &mut Engine, fi: InstanceId, state: StateId, event: EventId, _: Option<EventData>) {
        if state == LuState::Wait.into() && event == LuEvent::Ack.into() {
            engine
                .state_chg(fi, LuState::Done, Duration::ZERO, 0)
                .expect("WAIT -> DONE is declared");
        }
    }
}

fn current(engine: &Engine, fi: InstanceId) -> LuState {
    LuState::try_from(engine.state(fi).expect("instance is alive")).expect("state is in the table")
}

#[test]
fn location_update_walkthrough() {
    common::init_tracing();

    let lu = FsmDescriptor::builder("LU")
        .log_subsys("DMM")
        .states::<LuState>()
        .events::<LuEvent>()
        .build(Lu)
        .unwrap();
    let mut engine = Engine::new(EngineConfig {
        log_addr: false,
        ..EngineConfig::default()
    });
    engine.register(&lu);

    let fi = engine.alloc(&lu, None, None, Some("imsi-262420000000001"));
    assert_eq!(engine.inst_name(fi), "LU(imsi-262420000000001)");
    assert_eq!(current(&engine, fi), LuState::Idle);

    let err = engine.dispatch(fi, LuEvent::Start, None).unwrap_err();
    assert_eq!(
        err,
        FsmError::EventNotPermitted {
            fsm: "LU(imsi-262420000000001)".into(),
            state: "IDLE".into(),
            event: "LU_START".into(),
        }
    );
    assert_eq!(current(&engine, fi), LuState::Idle);

    engine.state_chg(fi, LuState::Wait, Duration::ZERO, 0).unwrap();
    assert_eq!(current(&engine, fi), LuState::Wait);

    engine.dispatch(fi, LuEvent::Ack, None).unwrap();
    assert_eq!(current(&engine, fi), LuState::Done);

    let err = engine.state_chg(fi, LuState::Idle, Duration::ZERO, 0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "LU(imsi-262420000000001)(DONE): transition to state IDLE not permitted"
    );
    assert_eq!(current(&engine, fi), LuState::Done);
}

#[test]
fn transitions_succeed_exactly_on_declared_edges() {
    let lu = FsmDescriptor::builder("LU")
        .states::<LuState>()
        .events::<LuEvent>()
        .build(Lu)
        .unwrap();
    let all = [LuState::Idle, LuState::Wait, LuState::Done];

    for from in all {
        for to in all {
            let mut engine = Engine::default();
            let fi = engine.alloc(&lu, None, None, None);
            // Walk to `from` along declared edges.
            match from {
                LuState::Idle => {}
                LuState::Wait => engine.state_chg(fi, LuState::Wait, Duration::ZERO, 0).unwrap(),
                LuState::Done => {
                    engine.state_chg(fi, LuState::Wait, Duration::ZERO, 0).unwrap();
                    engine.state_chg(fi, LuState::Done, Duration::ZERO, 0).unwrap();
                }
            }

            let declared = lu.states()[u32::from(from) as usize]
                .out_state_mask
                .contains(to.into());
            let result = engine.state_chg(fi, to, Duration::ZERO, 0);
            assert_eq!(result.is_ok(), declared, "{from:?} -> {to:?}");
            let expected = if declared { to } else { from };
            assert_eq!(current(&engine, fi), expected);
        }
    }
}

#[test]
fn state_stays_in_range_through_a_session() {
    let lu = FsmDescriptor::builder("LU")
        .states::<LuState>()
        .events::<LuEvent>()
        .build(Lu)
        .unwrap();
    let mut engine = Engine::default();
    let fi = engine.alloc(&lu, None, None, None);

    let steps: [(Option<LuEvent>, Option<LuState>); 6] = [
        (Some(LuEvent::Ack), None),
        (None, Some(LuState::Wait)),
        (Some(LuEvent::Start), None),
        (None, Some(LuState::Idle)),
        (None, Some(LuState::Wait)),
        (Some(LuEvent::Ack), None),
    ];
    for (event, target) in steps {
        if let Some(event) = event {
            let _ = engine.dispatch(fi, event, None);
        }
        if let Some(target) = target {
            let _ = engine.state_chg(fi, target, Duration::ZERO, 0);
        }
        let state = engine.state(fi).unwrap();
        assert!((state as usize) < lu.num_states());
    }
    assert_eq!(current(&engine, fi), LuState::Done);
}
