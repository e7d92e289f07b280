// state.rs — State shared between the overlay thread and the menu callback.
//
// Ownership of each field:
//   enabled   -> written only by the menu change callback, read by the overlay loop
//   instance  -> written by instance discovery (or config at startup), read by the overlay loop
//   functions -> written once by the hook installer, read by everyone after
//
// All per-frame fields are single machine words, so relaxed atomics are
// enough: a toggle observed one frame late is fine.

use crate::hook::ResolvedFunctions;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Runtime state of one tracked entity.
#[derive(Debug, Default)]
pub struct EntitySlot {
    enabled: AtomicBool,
    instance: AtomicUsize,
}

impl EntitySlot {
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, on: bool) {
        self.enabled.store(on, Ordering::Relaxed);
    }

    /// Address of the live game object, 0 if not discovered yet.
    pub fn instance(&self) -> usize {
        self.instance.load(Ordering::Relaxed)
    }

    pub fn set_instance(&self, addr: usize) {
        self.instance.store(addr, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
pub struct SharedState {
    slots: Vec<EntitySlot>,
    functions: OnceCell<ResolvedFunctions>,
}

impl SharedState {
    /// One disabled slot per tracked entity, seeded with its placeholder instance address.
    pub fn new(instances: impl IntoIterator<Item = usize>) -> Self {
        let slots = instances
            .into_iter()
            .map(|addr| EntitySlot {
                enabled: AtomicBool::new(false),
                instance: AtomicUsize::new(addr),
            })
            .collect();
        Self { slots, functions: OnceCell::new() }
    }

    pub fn slot(&self, index: usize) -> Option<&EntitySlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[EntitySlot] {
        &self.slots
    }

    /// Cheap per-frame check: is any overlay target switched on?
    pub fn any_enabled(&self) -> bool {
        self.slots.iter().any(EntitySlot::is_enabled)
    }

    /// Publish the resolved game functions. Only the first call has an effect.
    pub fn publish_functions(&self, functions: ResolvedFunctions) -> bool {
        self.functions.set(functions).is_ok()
    }

    /// Resolved game functions, `None` while the installer is still waiting.
    pub fn functions(&self) -> Option<&ResolvedFunctions> {
        self.functions.get()
    }
}
