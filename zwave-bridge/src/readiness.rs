//! Per-accessory readiness flag

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{BindingError, Result};

/// Two-state flag: unready until the backing node reports ready, then ready
/// for the rest of the accessory's lifetime
#[derive(Debug)]
pub struct Readiness {
    accessory: String,
    ready: AtomicBool,
}

impl Readiness {
    pub fn new(accessory: impl Into<String>) -> Self {
        Self {
            accessory: accessory.into(),
            ready: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Transition to ready, returning whether this call made the transition
    pub fn mark_ready(&self) -> bool {
        !self.ready.swap(true, Ordering::AcqRel)
    }

    /// Fail with [`BindingError::NotReady`] unless ready
    pub fn check(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(BindingError::NotReady {
                accessory: self.accessory.clone(),
            })
        }
    }
}
