//! Guard against submitting the same create twice

use almacen_core::{EntityKind, Error, Result};
use dashmap::DashSet;
use serde_json::Value;
use tracing::debug;

/// Tracks creates that are still in flight
///
/// A create is identified by its collection and its exact payload; a second
/// identical create is rejected until the first one finishes, whether it
/// succeeded or not.
#[derive(Debug, Default)]
pub struct SubmitGuard {
    in_flight: DashSet<String>,
}

/// Proof that a create is in flight; releases the slot when dropped
#[derive(Debug)]
#[must_use = "the submission is released as soon as the ticket is dropped"]
pub struct SubmitTicket<'a> {
    guard: &'a SubmitGuard,
    key: String,
}

impl SubmitGuard {
    /// Create an empty guard
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(kind: EntityKind, payload: &Value) -> String {
        format!("{kind}:{payload}")
    }

    /// Claim the slot for a create of `payload` into `kind`
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSubmission`] while an identical create holds
    /// the slot.
    pub fn try_acquire(&self, kind: EntityKind, payload: &Value) -> Result<SubmitTicket<'_>> {
        let key = Self::key(kind, payload);
        if !self.in_flight.insert(key.clone()) {
            debug!(entity = %kind, "Rejected duplicate submission");
            return Err(Error::DuplicateSubmission {
                resource: kind.to_string(),
            });
        }
        Ok(SubmitTicket { guard: self, key })
    }

    /// Number of creates currently in flight
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl Drop for SubmitTicket<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.remove(&self.key);
    }
}
