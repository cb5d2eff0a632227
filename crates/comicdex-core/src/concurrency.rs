use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A process-wide, non-blocking admission gate for HTTP handlers.
///
/// Not per-identity: a single counting semaphore of capacity
/// `concurrency_limit` shared by every inbound request.
#[derive(Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyGate {
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
        }
    }

    /// Attempts to admit one request. Returns `None` if the gate is full;
    /// the caller should respond 503 without proceeding. The returned
    /// permit releases its slot on drop, i.e. when the response completes.
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().try_acquire_owned().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_capacity() {
        let gate = ConcurrencyGate::new(2);
        let a = gate.try_acquire();
        let b = gate.try_acquire();
        let c = gate.try_acquire();

        assert!(a.is_some());
        assert!(b.is_some());
        assert!(c.is_none());
    }

    #[test]
    fn releasing_a_permit_frees_a_slot() {
        let gate = ConcurrencyGate::new(1);
        let permit = gate.try_acquire();
        assert!(permit.is_some());
        assert!(gate.try_acquire().is_none());

        drop(permit);
        assert!(gate.try_acquire().is_some());
    }
}
