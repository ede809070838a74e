//! Admission Gate
//!
//! One counting semaphore per category bounds how many backend invocations of
//! that category run at once. Categories are independent: a saturated gate
//! never delays another category.

use crate::category::Category;
use crate::error::QueueError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Default slots per category when none is configured explicitly
pub const DEFAULT_CATEGORY_CAPACITY: usize = 10;

struct CategoryGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held execution slot. Dropping it frees the slot, on every exit path.
#[derive(Debug)]
pub struct GatePermit {
    category: Category,
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    pub fn category(&self) -> Category {
        self.category
    }
}

pub struct AdmissionGate {
    gates: HashMap<Category, CategoryGate>,
}

impl AdmissionGate {
    /// Build one gate per entry. Zero capacities are rejected.
    pub fn new(capacities: &HashMap<Category, usize>) -> Result<Self, QueueError> {
        let mut gates = HashMap::with_capacity(capacities.len());
        for (&category, &capacity) in capacities {
            if capacity == 0 {
                return Err(QueueError::ConfigError(format!(
                    "Admission capacity for category '{}' must be at least 1",
                    category
                )));
            }
            gates.insert(
                category,
                CategoryGate {
                    semaphore: Arc::new(Semaphore::new(capacity)),
                    capacity,
                },
            );
        }
        Ok(Self { gates })
    }

    /// Wait for a free slot in `category`'s gate
    pub async fn acquire(&self, category: Category) -> Result<GatePermit, QueueError> {
        let gate = self
            .gates
            .get(&category)
            .ok_or_else(|| QueueError::UnknownCategory(category.to_string()))?;

        if gate.semaphore.available_permits() == 0 {
            debug!(category = %category, capacity = gate.capacity, "Admission gate saturated, waiting");
        }

        let permit = Arc::clone(&gate.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| QueueError::GateClosed(category))?;

        Ok(GatePermit {
            category,
            _permit: permit,
        })
    }

    pub fn contains(&self, category: Category) -> bool {
        self.gates.contains_key(&category)
    }

    pub fn capacity(&self, category: Category) -> Option<usize> {
        self.gates.get(&category).map(|g| g.capacity)
    }

    /// Slots currently held for `category`
    pub fn in_flight(&self, category: Category) -> Option<usize> {
        self.gates
            .get(&category)
            .map(|g| g.capacity - g.semaphore.available_permits())
    }

    /// Close every gate; pending and future acquisitions fail with `GateClosed`
    pub fn close(&self) {
        for gate in self.gates.values() {
            gate.semaphore.close();
        }
    }
}
