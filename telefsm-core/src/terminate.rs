//! Cascading termination of instance trees.

use std::fmt;
use std::rc::Rc;

use crate::log::inst_log;
use crate::{Engine, EventData, InstanceId};

/// Why an instance is terminating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermCause {
    /// The parent is terminating and takes its children along.
    Parent,
    /// Explicit request from outside the instance.
    Request,
    /// The procedure finished normally.
    Regular,
    /// The procedure failed.
    Error,
}

impl fmt::Display for TermCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parent => "PARENT",
            Self::Request => "REQUEST",
            Self::Regular => "REGULAR",
            Self::Error => "ERROR",
        })
    }
}

impl Engine {
    /// Terminates an instance together with all of its descendants.
    ///
    /// Children go first, each with [`TermCause::Parent`] and no data. The
    /// instance then leaves its parent's child set, runs the cleanup hook
    /// and is released. Finally, unless `cause` is [`TermCause::Parent`],
    /// the parent receives the instance's `parent_term_event` with `data`.
    ///
    /// Termination cannot fail. Dead handles and instances already being
    /// terminated further up the stack are ignored.
    pub fn terminate(&mut self, fi: InstanceId, cause: TermCause, data: Option<EventData>) {
        let Some(inst) = self.store.get_mut(fi) else {
            tracing::warn!(%fi, %cause, "Ignoring termination of non-existing FSM instance");
            return;
        };
        let fsm = Rc::clone(&inst.fsm);
        if inst.terminating {
            inst_log!(inst.log_level, fsm.log_subsys(), inst.name, "Already terminating (cause = {cause})");
            return;
        }
        inst.terminating = true;
        inst_log!(inst.log_level, fsm.log_subsys(), inst.name, "Terminating (cause = {cause})");

        let parent = inst.parent;
        let parent_term_event = inst.parent_term_event;
        let children = inst.children.clone();

        for child in children {
            if self.is_alive(child) {
                self.terminate(child, TermCause::Parent, None);
            }
        }

        if let Some(p) = parent.and_then(|p| self.store.get_mut(p)) {
            p.children.retain(|c| *c != fi);
        }

        fsm.behavior().cleanup(self, fi, cause);

        if let Some(inst) = self.store.get(fi) {
            inst_log!(inst.log_level, fsm.log_subsys(), inst.name, "Release");
        }
        self.free(fi);

        if let Some(parent) = parent
            && cause != TermCause::Parent
        {
            // Failures are already logged by dispatch.
            let _ = self.dispatch(parent, parent_term_event, data);
        }
    }
}
