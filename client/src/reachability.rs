//! Connectivity signal consulted when a request fails.
//!
//! The client never polls the network itself; a host-side observer pushes
//! changes into a `ReachabilityFlag` (or implements `Reachability` directly).

use std::sync::atomic::{AtomicU8, Ordering};

/// Last known connectivity of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Reachable,
    Unreachable,
    /// No observation yet. Classified as offline.
    Unknown,
}

pub trait Reachability: Send + Sync + std::fmt::Debug {
    fn connectivity(&self) -> Connectivity;

    /// Only a positive observation counts as reachable.
    fn is_reachable(&self) -> bool {
        self.connectivity() == Connectivity::Reachable
    }
}

/// Settable connectivity state shared between an observer and the client.
#[derive(Debug)]
pub struct ReachabilityFlag {
    state: AtomicU8,
}

impl ReachabilityFlag {
    pub fn new(initial: Connectivity) -> Self {
        Self {
            state: AtomicU8::new(encode(initial)),
        }
    }

    pub fn set(&self, connectivity: Connectivity) {
        let previous = self.state.swap(encode(connectivity), Ordering::AcqRel);
        if previous != encode(connectivity) {
            tracing::info!(?connectivity, "connectivity changed");
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.set(if reachable {
            Connectivity::Reachable
        } else {
            Connectivity::Unreachable
        });
    }
}

impl Default for ReachabilityFlag {
    fn default() -> Self {
        Self::new(Connectivity::Unknown)
    }
}

impl Reachability for ReachabilityFlag {
    fn connectivity(&self) -> Connectivity {
        match self.state.load(Ordering::Acquire) {
            0 => Connectivity::Reachable,
            1 => Connectivity::Unreachable,
            _ => Connectivity::Unknown,
        }
    }
}

fn encode(connectivity: Connectivity) -> u8 {
    match connectivity {
        Connectivity::Reachable => 0,
        Connectivity::Unreachable => 1,
        Connectivity::Unknown => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unknown_and_not_reachable() {
        let flag = ReachabilityFlag::default();
        assert_eq!(flag.connectivity(), Connectivity::Unknown);
        assert!(!flag.is_reachable());
    }

    #[test]
    fn set_round_trips_every_state() {
        let flag = ReachabilityFlag::default();
        for state in [Connectivity::Reachable, Connectivity::Unreachable, Connectivity::Unknown] {
            flag.set(state);
            assert_eq!(flag.connectivity(), state);
        }
    }

    #[test]
    fn set_reachable_maps_bool() {
        let flag = ReachabilityFlag::new(Connectivity::Unknown);
        flag.set_reachable(true);
        assert!(flag.is_reachable());
        flag.set_reachable(false);
        assert_eq!(flag.connectivity(), Connectivity::Unreachable);
    }
}
