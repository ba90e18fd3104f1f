use core_types::{ActuatorSwitch, SwitchHandle};
use std::sync::{Arc, PoisonError, RwLock};

/// Lookup of the switches currently registered with the host.
pub trait SwitchRegistry: Send + Sync {
    /// Find a registered switch by its source name.
    ///
    /// Returns None if nothing with that source is registered; callers
    /// treat that as "drop the event", never as an error.
    fn find(&self, source: &str) -> Option<SwitchHandle>;
}

/// In-process switch registry.
///
/// Registration and lookup may race (the host can (de)register switches
/// while the I/O thread is emitting); readers never block each other.
#[derive(Debug, Default)]
pub struct SwitchTable {
    switches: RwLock<Vec<SwitchHandle>>,
}

impl SwitchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a switch, replacing any switch with the same source.
    pub fn register(&self, switch: ActuatorSwitch) -> SwitchHandle {
        let handle = Arc::new(switch);
        let mut switches = self.switches.write().unwrap_or_else(PoisonError::into_inner);
        switches.retain(|s| s.source != handle.source);
        switches.push(Arc::clone(&handle));
        handle
    }

    /// Remove the switch with this source, returning it if it was registered.
    pub fn unregister(&self, source: &str) -> Option<SwitchHandle> {
        let mut switches = self.switches.write().unwrap_or_else(PoisonError::into_inner);
        let idx = switches.iter().position(|s| s.source == source)?;
        Some(switches.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.switches.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SwitchRegistry for SwitchTable {
    fn find(&self, source: &str) -> Option<SwitchHandle> {
        self.switches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|s| s.source == source)
            .cloned()
    }
}
