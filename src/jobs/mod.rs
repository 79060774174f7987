//! Job orchestration and collaborator boundaries
//!
//! Everything between an authenticated upload and a finished artifact:
//! the INDD job envelope, the admission-control and queue boundaries, and
//! the [`JobService`] a thin HTTP layer would wrap.

mod admission;
mod envelope;
mod queue;
mod service;

pub use admission::{AdmissionController, MemoryAdmission};
pub use envelope::JobEnvelope;
pub use queue::{JobQueue, MemoryQueue};
pub use service::{
    JobService, JobStatus, ProcessedJob, QueuedJob, SubmitOutcome, SubmitRequest,
    LINK_COUNT_HEADER,
};
