//! State changes and timer arming.

use std::rc::Rc;
use std::time::Duration;

use crate::error::FsmError;
use crate::log::inst_log;
use crate::{Engine, InstanceId, StateId};

impl Engine {
    /// Moves an instance into `new_state`.
    ///
    /// The current state must list `new_state` in its output mask, otherwise
    /// [`FsmError::TransitionNotPermitted`] is returned and nothing changes.
    /// `onleave` runs before the state is updated and `onenter` after it.
    ///
    /// A non-zero `timeout` (re)arms the instance's single timer, labelled
    /// `t` for diagnostics; any previously pending timer is replaced. Arming
    /// a timer on a class without a timer callback is logged as an error but
    /// does not fail the transition.
    ///
    /// If a hook terminates the instance, the transition stops there and
    /// [`FsmError::InvalidInstance`] is returned.
    pub fn state_chg(
        &mut self,
        fi: InstanceId,
        new_state: impl Into<StateId>,
        timeout: Duration,
        t: u32,
    ) -> Result<(), FsmError> {
        let new_state = new_state.into();
        let inst = self.store.get(fi).ok_or(FsmError::InvalidInstance(fi))?;
        let fsm = Rc::clone(&inst.fsm);
        let old_state = inst.state;

        let permitted = fsm
            .state(old_state)
            .is_some_and(|st| st.out_state_mask.contains(new_state));
        if !permitted {
            let err = FsmError::TransitionNotPermitted {
                fsm: inst.name.clone(),
                state: fsm.state_name(old_state).into_owned(),
                target: fsm.state_name(new_state).into_owned(),
            };
            tracing::error!(subsys = fsm.log_subsys(), "{err}");
            return Err(err);
        }

        fsm.behavior().onleave(self, fi, old_state, new_state);

        let inst = self.store.get_mut(fi).ok_or(FsmError::InvalidInstance(fi))?;
        inst_log!(
            inst.log_level,
            fsm.log_subsys(),
            inst.name,
            "state_chg to {}",
            fsm.state_name(new_state)
        );
        inst.state = new_state;

        fsm.behavior().onenter(self, fi, new_state, old_state);

        let inst = self.store.get_mut(fi).ok_or(FsmError::InvalidInstance(fi))?;
        if timeout.is_zero() {
            return Ok(());
        }
        if !fsm.behavior().has_timer_cb() {
            tracing::error!(
                subsys = fsm.log_subsys(),
                fsm = %inst.name,
                "cannot start timer T{t} for FSM without timer call-back"
            );
        }
        inst.timer_label = t;
        self.timers.schedule(fi, timeout);
        Ok(())
    }
}
