//! Job queue collaborator
//!
//! INDD envelopes are handed off to an external worker through whatever
//! queue the deployment provides. The core only needs `enqueue`.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;

use super::envelope::JobEnvelope;

/// Hand-off boundary for INDD job envelopes
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue an envelope for the external worker
    async fn enqueue(&self, envelope: JobEnvelope) -> Result<()>;
}

/// In-memory queue for tests
#[derive(Clone, Default)]
pub struct MemoryQueue {
    queued: Arc<Mutex<Vec<JobEnvelope>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything queued so far, in submission order
    pub fn drain(&self) -> Vec<JobEnvelope> {
        std::mem::take(&mut *self.queued.lock())
    }

    pub fn len(&self) -> usize {
        self.queued.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.lock().is_empty()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, envelope: JobEnvelope) -> Result<()> {
        self.queued.lock().push(envelope);
        Ok(())
    }
}
