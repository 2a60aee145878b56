//! Instance store: a generational arena of live instances plus the
//! per-descriptor instance lists.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::Level;

use crate::descriptor::FsmDescriptor;
use crate::{EventId, StateId};

/// Stable handle to an FSM instance.
///
/// Handles stay valid until the instance is released; afterwards every entry
/// point treats them as absent, even if the slot has been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    index: u32,
    generation: u32,
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

pub(crate) struct Instance {
    pub(crate) fsm: Rc<FsmDescriptor>,
    pub(crate) state: StateId,
    pub(crate) id: Option<String>,
    pub(crate) name: String,
    pub(crate) log_level: Level,
    pub(crate) priv_data: Option<Box<dyn Any>>,
    pub(crate) timer_label: u32,
    pub(crate) parent: Option<InstanceId>,
    pub(crate) parent_term_event: EventId,
    pub(crate) children: Vec<InstanceId>,
    pub(crate) terminating: bool,
}

impl Instance {
    pub(crate) fn new(
        fsm: Rc<FsmDescriptor>,
        priv_data: Option<Box<dyn Any>>,
        log_level: Level,
        id: Option<String>,
        name: String,
    ) -> Self {
        Self {
            fsm,
            state: 0,
            id,
            name,
            log_level,
            priv_data,
            timer_label: 0,
            parent: None,
            parent_term_event: 0,
            children: Vec::new(),
            terminating: false,
        }
    }
}

struct Slot {
    generation: u32,
    instance: Option<Instance>,
}

#[derive(Default)]
pub(crate) struct InstanceStore {
    slots: Vec<Slot>,
    vacant: Vec<u32>,
    by_fsm: HashMap<u64, Vec<InstanceId>>,
}

impl InstanceStore {
    pub(crate) fn insert(&mut self, instance: Instance) -> InstanceId {
        let key = instance.fsm.key();
        let id = match self.vacant.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.instance = Some(instance);
                InstanceId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len()).expect("instance arena exhausted");
                self.slots.push(Slot {
                    generation: 0,
                    instance: Some(instance),
                });
                InstanceId {
                    index,
                    generation: 0,
                }
            }
        };
        self.by_fsm.entry(key).or_default().push(id);
        id
    }

    pub(crate) fn remove(&mut self, id: InstanceId) -> Option<Instance> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let instance = slot.instance.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(id.index);

        let key = instance.fsm.key();
        if let Some(list) = self.by_fsm.get_mut(&key) {
            list.retain(|other| *other != id);
            if list.is_empty() {
                self.by_fsm.remove(&key);
            }
        }
        Some(instance)
    }

    pub(crate) fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.instance.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.instance.as_mut())
    }

    pub(crate) fn of_fsm(&self, fsm: &FsmDescriptor) -> &[InstanceId] {
        self.by_fsm.get(&fsm.key()).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }
}
