//! In-memory implementation of EventRepository.
//!
//! Mirrors the conflict semantics of the PostgreSQL implementation: the
//! first save of an event id wins, later saves observe `AlreadyExists`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::DomainError;
use crate::ports::{EventRecord, EventRepository, ExceptionRecord, SaveResult};

/// In-memory webhook event log.
#[derive(Default)]
pub struct InMemoryEventRepository {
    records: Mutex<HashMap<String, EventRecord>>,
    exceptions: Mutex<Vec<ExceptionRecord>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored event rows.
    pub fn event_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Messages of all recorded exceptions, in insertion order.
    pub fn exception_messages(&self) -> Vec<String> {
        self.exceptions
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn find_by_stripe_id(
        &self,
        stripe_id: &str,
    ) -> Result<Option<EventRecord>, DomainError> {
        Ok(self.records.lock().unwrap().get(stripe_id).cloned())
    }

    async fn save(&self, record: EventRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.stripe_id) {
            Ok(SaveResult::AlreadyExists)
        } else {
            records.insert(record.stripe_id.clone(), record);
            Ok(SaveResult::Inserted)
        }
    }

    async fn mark_valid(&self, stripe_id: &str, valid: bool) -> Result<(), DomainError> {
        if let Some(record) = self.records.lock().unwrap().get_mut(stripe_id) {
            record.valid = Some(valid);
        }
        Ok(())
    }

    async fn mark_processed(&self, stripe_id: &str) -> Result<(), DomainError> {
        if let Some(record) = self.records.lock().unwrap().get_mut(stripe_id) {
            record.processed = true;
        }
        Ok(())
    }

    async fn record_exception(&self, exception: ExceptionRecord) -> Result<(), DomainError> {
        self.exceptions.lock().unwrap().push(exception);
        Ok(())
    }
}
