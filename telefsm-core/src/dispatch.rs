//! Event delivery.

use std::backtrace::Backtrace;
use std::rc::Rc;

use crate::error::FsmError;
use crate::log::inst_log;
use crate::{Engine, EventData, EventId, InstanceId};

impl Engine {
    /// Delivers `event` to an instance.
    ///
    /// All-state events go to the descriptor's all-state action and take
    /// precedence over the current state's input mask. Anything else must be
    /// accepted by the current state, or the call fails with
    /// [`FsmError::EventNotPermitted`] and the instance is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the instance's state lies outside its descriptor's table.
    pub fn dispatch(
        &mut self,
        fi: InstanceId,
        event: impl Into<EventId>,
        data: Option<EventData>,
    ) -> Result<(), FsmError> {
        let event = event.into();
        let Some(inst) = self.store.get(fi) else {
            tracing::error!(%fi, "Trying to dispatch event {event} to non-existing FSM instance");
            tracing::error!("{}", Backtrace::force_capture());
            return Err(FsmError::InvalidInstance(fi));
        };

        let fsm = Rc::clone(&inst.fsm);
        let state = inst.state;
        assert!(
            (state as usize) < fsm.num_states(),
            "{}: state {state} outside of a {}-state table",
            inst.name,
            fsm.num_states()
        );

        inst_log!(
            inst.log_level,
            fsm.log_subsys(),
            inst.name,
            "Received Event {}",
            fsm.event_name(event)
        );

        if fsm.allstate_event_mask().contains(event) {
            fsm.behavior().allstate_action(self, fi, event, data);
            return Ok(());
        }

        if !fsm.states()[state as usize].in_event_mask.contains(event) {
            let err = FsmError::EventNotPermitted {
                fsm: inst.name.clone(),
                state: fsm.state_name(state).into_owned(),
                event: fsm.event_name(event).into_owned(),
            };
            tracing::error!(subsys = fsm.log_subsys(), "{err}");
            return Err(err);
        }

        fsm.behavior().action(self, fi, state, event, data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::descriptor::{FsmBehavior, FsmDescriptor, StateSpec};
    use crate::mask::{EventMask, StateMask};
    use crate::StateId;

    const EV_PING: EventId = 0;
    const EV_ABORT: EventId = 1;
    const EV_OTHER: EventId = 2;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(&'static str, EventId)>>,
    }

    impl FsmBehavior for Rc<Recorder> {
        fn action(&self, _: &mut Engine, _: InstanceId, _: StateId, event: EventId, _: Option<EventData>) {
            self.calls.borrow_mut().push(("action", event));
        }

        fn allstate_action(&self, _: &mut Engine, _: InstanceId, event: EventId, _: Option<EventData>) {
            self.calls.borrow_mut().push(("allstate", event));
        }
    }

    fn setup() -> (Engine, InstanceId, Rc<Recorder>) {
        let recorder = Rc::new(Recorder::default());
        let fsm = FsmDescriptor::builder("PING")
            .state(
                StateSpec::new("UP")
                    .events(EventMask::bit(EV_PING) | EventMask::bit(EV_ABORT))
                    .out(StateMask::EMPTY),
            )
            .allstate_events(EventMask::bit(EV_ABORT))
            .event_names(&["PING", "ABORT", "OTHER"])
            .build(Rc::clone(&recorder))
            .unwrap();
        let mut engine = Engine::default();
        let fi = engine.alloc(&fsm, None, None, None);
        (engine, fi, recorder)
    }

    #[test]
    fn accepted_event_reaches_state_action() {
        let (mut engine, fi, recorder) = setup();
        engine.dispatch(fi, EV_PING, None).unwrap();
        assert_eq!(*recorder.calls.borrow(), vec![("action", EV_PING)]);
    }

    #[test]
    fn allstate_action_wins_over_state_mask() {
        let (mut engine, fi, recorder) = setup();
        engine.dispatch(fi, EV_ABORT, None).unwrap();
        assert_eq!(*recorder.calls.borrow(), vec![("allstate", EV_ABORT)]);
    }

    #[test]
    fn refused_event_calls_nothing() {
        let (mut engine, fi, recorder) = setup();
        let err = engine.dispatch(fi, EV_OTHER, None).unwrap_err();
        assert!(matches!(
            &err,
            FsmError::EventNotPermitted { state, event, .. } if state == "UP" && event == "OTHER"
        ));
        assert!(recorder.calls.borrow().is_empty());
        assert_eq!(engine.state(fi), Some(0));
    }

    #[test]
    fn out_of_range_event_is_refused() {
        let (mut engine, fi, recorder) = setup();
        let err = engine.dispatch(fi, 40u32, None).unwrap_err();
        assert!(matches!(err, FsmError::EventNotPermitted { event, .. } if event == "40"));
        assert!(recorder.calls.borrow().is_empty());
    }

    #[test]
    fn dead_instance_is_reported() {
        let (mut engine, fi, recorder) = setup();
        engine.free(fi);
        assert_eq!(engine.dispatch(fi, EV_PING, None), Err(FsmError::InvalidInstance(fi)));
        assert!(recorder.calls.borrow().is_empty());
    }
}
