//! Admission control collaborator
//!
//! The production system keeps "at most one active INDD job per user within
//! a rolling window" in the document database with read-modify-write
//! transactions. That is the database's concurrency model, not ours, so the
//! core only sees an acquire/release interface.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::{AppError, Result};

/// Per-user single-active-job admission boundary
#[async_trait]
pub trait AdmissionController: Send + Sync {
    /// Claim the user's job slot; fails while another job is active
    async fn acquire_slot(&self, user_id: &str) -> Result<()>;

    /// Free the user's job slot after the worker finished (or failed)
    async fn release_slot(&self, user_id: &str) -> Result<()>;
}

/// In-memory admission controller with a rolling expiry window
#[derive(Clone)]
pub struct MemoryAdmission {
    window: Duration,
    active: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl MemoryAdmission {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl AdmissionController for MemoryAdmission {
    async fn acquire_slot(&self, user_id: &str) -> Result<()> {
        let now = Utc::now();
        let window = chrono::Duration::from_std(self.window)
            .map_err(|e| AppError::Processing(format!("Invalid admission window: {e}")))?;

        let mut active = self.active.lock();
        if let Some(acquired_at) = active.get(user_id) {
            if now - *acquired_at < window {
                return Err(AppError::Validation(format!(
                    "User {user_id} already has an active job"
                )));
            }
        }
        active.insert(user_id.to_string(), now);
        Ok(())
    }

    async fn release_slot(&self, user_id: &str) -> Result<()> {
        self.active.lock().remove(user_id);
        Ok(())
    }
}
