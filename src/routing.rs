//! Insert routing across backends.

use std::sync::Mutex;

use crate::backend::BackendKind;
use crate::catalog::LogicalEntity;
use crate::error::{Result, StoreError};

/// Decides which backend receives the next insert.
///
/// Single-homed entities always go to their home backend. Dual-homed
/// entities alternate: the cursor is read and flipped in one critical
/// section, exactly once per insert attempt, before any value prompting
/// and independent of whether the insert later succeeds or is abandoned.
pub struct InsertRouter {
    next: Mutex<BackendKind>,
}

impl InsertRouter {
    pub fn new(initial: BackendKind) -> Self {
        Self {
            next: Mutex::new(initial),
        }
    }

    /// Target backend for one insert attempt into `entity`.
    pub fn choose_backend(&self, entity: &LogicalEntity) -> Result<BackendKind> {
        if entity.dual_homed() {
            return Ok(self.advance());
        }
        entity
            .home()
            .ok_or_else(|| StoreError::entity_not_found(&entity.name))
    }

    fn advance(&self) -> BackendKind {
        let mut next = self.next.lock().unwrap_or_else(|e| e.into_inner());
        let target = *next;
        *next = target.opposite();
        target
    }
}
