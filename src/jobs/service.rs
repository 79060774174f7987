//! Job service
//!
//! The orchestration seam a thin HTTP layer would wrap: validates uploads
//! by extension, keeps the storage key layout, runs PDF jobs synchronously
//! on a blocking thread, hands INDD jobs to the external worker under
//! admission control, and answers completion polls through output-object
//! existence.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::auth::TokenVerifier;
use crate::config::JobsConfig;
use crate::document::DocumentFormat;
use crate::error::{AppError, Result};
use crate::patterns::parse_format_mapping;
use crate::rewrite::{process_pdf, JobKind, RewriteRequest, UtmParams};
use crate::storage::ObjectStore;

use super::admission::AdmissionController;
use super::envelope::JobEnvelope;
use super::queue::JobQueue;

/// Response header carrying the number of links created/updated
pub const LINK_COUNT_HEADER: &str = "x-links-updated";

/// Upload parameters accompanying the document bytes
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub file_name: String,
    pub kind: JobKind,
    pub utm: UtmParams,
    pub format_mapping: Option<String>,
    pub underline: bool,
    pub diagnostics: bool,
    pub custom_output_name: Option<String>,
}

/// A PDF job finished synchronously
#[derive(Debug, Clone)]
pub struct ProcessedJob {
    pub job_id: Uuid,
    pub output_key: String,
    pub preview_key: String,
    pub links_touched: u32,
}

/// An INDD job queued for the external worker
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job_id: Uuid,
    pub output_key: String,
    pub report_key: String,
}

/// Result of a submission, by document format
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Processed(ProcessedJob),
    Queued(QueuedJob),
}

/// Completion state of a queued job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Completed,
}

/// Upload, processing and polling orchestration over the collaborators
pub struct JobService {
    store: Arc<dyn ObjectStore>,
    admission: Arc<dyn AdmissionController>,
    queue: Arc<dyn JobQueue>,
    verifier: Arc<dyn TokenVerifier>,
    jobs: JobsConfig,
}

impl JobService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        admission: Arc<dyn AdmissionController>,
        queue: Arc<dyn JobQueue>,
        verifier: Arc<dyn TokenVerifier>,
        jobs: JobsConfig,
    ) -> Self {
        Self {
            store,
            admission,
            queue,
            verifier,
            jobs,
        }
    }

    /// Accept an upload and either process it (PDF) or queue it (INDD).
    pub async fn submit(
        &self,
        token: &str,
        bytes: Vec<u8>,
        request: SubmitRequest,
    ) -> Result<SubmitOutcome> {
        let user = self.verifier.verify(token).await?;

        let extension = request
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("");
        let format = DocumentFormat::from_extension(extension).ok_or_else(|| {
            AppError::NotFound(format!(
                "Unsupported file extension: {:?}",
                request.file_name
            ))
        })?;

        let job_id = Uuid::new_v4();
        let prefix = format!("{}/{}/{}", self.jobs.key_prefix, user.user_id, job_id);
        let input_key = format!("{prefix}/input.{}", format.extension());

        info!(user = %user.user_id, %job_id, file = %request.file_name, "accepted upload");

        match format {
            DocumentFormat::Pdf => {
                self.store
                    .put(&input_key, bytes.clone(), "application/pdf")
                    .await?;
                self.process_pdf_job(&prefix, job_id, bytes, request).await
            }
            DocumentFormat::Indd => {
                self.store
                    .put(&input_key, bytes, "application/octet-stream")
                    .await?;
                self.queue_indd_job(&user.user_id, &prefix, job_id, input_key, request)
                    .await
            }
        }
    }

    async fn process_pdf_job(
        &self,
        prefix: &str,
        job_id: Uuid,
        bytes: Vec<u8>,
        request: SubmitRequest,
    ) -> Result<SubmitOutcome> {
        let rewrite = RewriteRequest {
            kind: request.kind,
            utm: request.utm,
            format_mapping: request.format_mapping,
            underline: request.underline,
            diagnostics: request.diagnostics,
        };

        // CPU-bound; keep it off the async workers
        let outcome = tokio::task::spawn_blocking(move || process_pdf(&bytes, &rewrite))
            .await
            .map_err(|e| AppError::Processing(format!("Processing task failed: {e}")))??;

        let output_name = artifact_name(request.custom_output_name.as_deref(), "output", "pdf");
        let output_key = format!("{prefix}/{output_name}");
        let preview_key = format!("{prefix}/preview.pdf");

        self.store
            .put(&output_key, outcome.document, "application/pdf")
            .await?;
        self.store
            .put(&preview_key, outcome.preview, "application/pdf")
            .await?;

        Ok(SubmitOutcome::Processed(ProcessedJob {
            job_id,
            output_key,
            preview_key,
            links_touched: outcome.links_touched,
        }))
    }

    async fn queue_indd_job(
        &self,
        user_id: &str,
        prefix: &str,
        job_id: Uuid,
        input_key: String,
        request: SubmitRequest,
    ) -> Result<SubmitOutcome> {
        // Validate the mapping before touching the admission slot so a bad
        // request cannot burn the user's slot
        let (patterns, base_url) = match request.kind {
            JobKind::LinksAndUtm => {
                let payload = request.format_mapping.as_deref().ok_or_else(|| {
                    AppError::Validation("Job type links_and_utm requires a format mapping".into())
                })?;
                let compiled = parse_format_mapping(payload)?;
                let base_url = compiled
                    .first()
                    .map(|p| p.base_url.clone())
                    .unwrap_or_default();
                let sources = compiled
                    .into_iter()
                    .map(|p| p.anchored.as_str().to_string())
                    .collect();
                (sources, base_url)
            }
            JobKind::UtmOnly => (Vec::new(), String::new()),
        };

        self.admission.acquire_slot(user_id).await?;

        let output_name = artifact_name(request.custom_output_name.as_deref(), "output", "indd");
        let envelope = JobEnvelope {
            job_id,
            user_id: user_id.to_string(),
            input_key,
            output_key: format!("{prefix}/{output_name}"),
            report_key: format!("{prefix}/report.json"),
            patterns,
            base_url,
            utm: request.utm,
            custom_output_name: request.custom_output_name,
            submitted_at: chrono::Utc::now(),
        };

        let queued = QueuedJob {
            job_id,
            output_key: envelope.output_key.clone(),
            report_key: envelope.report_key.clone(),
        };

        if let Err(e) = self.queue.enqueue(envelope).await {
            // hand-off failed: give the slot back
            self.admission.release_slot(user_id).await?;
            return Err(e);
        }

        Ok(SubmitOutcome::Queued(queued))
    }

    /// Poll a queued job: the job is complete once its output object exists.
    pub async fn status(&self, token: &str, output_key: &str) -> Result<JobStatus> {
        let user = self.verifier.verify(token).await?;
        self.guard_key(&user.user_id, output_key)?;

        if self.store.exists(output_key).await? {
            Ok(JobStatus::Completed)
        } else {
            Ok(JobStatus::Pending)
        }
    }

    /// Presigned download URL for a finished artifact.
    pub async fn download_url(&self, token: &str, key: &str) -> Result<String> {
        let user = self.verifier.verify(token).await?;
        self.guard_key(&user.user_id, key)?;

        if !self.store.exists(key).await? {
            return Err(AppError::NotFound(format!(
                "Artifact not yet available: {key}"
            )));
        }

        let expiry = Duration::from_secs(self.jobs.presign_expiry_secs);
        Ok(self.store.presign_get(key, expiry).await?)
    }

    /// Worker callback once an INDD job finished (or failed): frees the
    /// user's admission slot.
    pub async fn finish_job(&self, user_id: &str) -> Result<()> {
        self.admission.release_slot(user_id).await
    }

    /// A user may only address keys under their own job prefix
    fn guard_key(&self, user_id: &str, key: &str) -> Result<()> {
        let owned = format!("{}/{}/", self.jobs.key_prefix, user_id);
        if key.starts_with(&owned) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("No such artifact: {key}")))
        }
    }
}

/// Artifact file name: the client-chosen name (with the right extension
/// ensured) or the default
fn artifact_name(custom: Option<&str>, default_stem: &str, extension: &str) -> String {
    match custom {
        Some(name) if !name.trim().is_empty() => {
            let name = name.trim();
            if name.to_lowercase().ends_with(&format!(".{extension}")) {
                name.to_string()
            } else {
                format!("{name}.{extension}")
            }
        }
        _ => format!("{default_stem}.{extension}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenVerifier;
    use crate::jobs::{MemoryAdmission, MemoryQueue};
    use crate::storage::MemoryStore;

    const INDD_MAGIC: [u8; 8] = [0x06, 0x06, 0xED, 0xF5, 0xD8, 0x1D, 0x46, 0xE5];

    struct Fixture {
        service: JobService,
        store: MemoryStore,
        queue: MemoryQueue,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let queue = MemoryQueue::new();
        let admission = MemoryAdmission::new(Duration::from_secs(900));
        let verifier = StaticTokenVerifier::new().with_user("tok-a", "user-a");

        let service = JobService::new(
            Arc::new(store.clone()),
            Arc::new(admission),
            Arc::new(queue.clone()),
            Arc::new(verifier),
            JobsConfig::default(),
        );

        Fixture {
            service,
            store,
            queue,
        }
    }

    fn indd_submit() -> SubmitRequest {
        SubmitRequest {
            file_name: "campaign.indd".into(),
            kind: JobKind::LinksAndUtm,
            utm: UtmParams::new("news", "email", "spring"),
            format_mapping: Some(r#"{"LLL-NNNN": "https://track.example.com/"}"#.into()),
            underline: false,
            diagnostics: false,
            custom_output_name: None,
        }
    }

    #[tokio::test]
    async fn indd_submission_uploads_input_and_queues_an_envelope() {
        let fx = fixture();

        let outcome = fx
            .service
            .submit("tok-a", INDD_MAGIC.to_vec(), indd_submit())
            .await
            .unwrap();

        let queued = match outcome {
            SubmitOutcome::Queued(q) => q,
            other => panic!("expected Queued, got {other:?}"),
        };

        let envelopes = fx.queue.drain();
        assert_eq!(envelopes.len(), 1);
        let envelope = &envelopes[0];
        assert_eq!(envelope.job_id, queued.job_id);
        assert_eq!(envelope.user_id, "user-a");
        assert_eq!(envelope.base_url, "https://track.example.com/");
        assert_eq!(envelope.patterns.len(), 1);
        assert!(envelope.input_key.starts_with("jobs/user-a/"));
        assert!(fx.store.exists(&envelope.input_key).await.unwrap());
    }

    #[tokio::test]
    async fn second_active_indd_job_is_rejected() {
        let fx = fixture();

        fx.service
            .submit("tok-a", INDD_MAGIC.to_vec(), indd_submit())
            .await
            .unwrap();
        let err = fx
            .service
            .submit("tok-a", INDD_MAGIC.to_vec(), indd_submit())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);

        // finishing the job frees the slot
        fx.service.finish_job("user-a").await.unwrap();
        fx.service
            .submit("tok-a", INDD_MAGIC.to_vec(), indd_submit())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn malformed_mapping_does_not_burn_the_admission_slot() {
        let fx = fixture();
        let mut bad = indd_submit();
        bad.format_mapping = Some("{not json".into());

        let err = fx
            .service
            .submit("tok-a", INDD_MAGIC.to_vec(), bad)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);

        // the slot is still free
        fx.service
            .submit("tok-a", INDD_MAGIC.to_vec(), indd_submit())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unsupported_extension_is_not_found() {
        let fx = fixture();
        let mut request = indd_submit();
        request.file_name = "campaign.docx".into();

        let err = fx
            .service
            .submit("tok-a", vec![0], request)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn status_flips_once_the_worker_writes_the_output() {
        let fx = fixture();
        let outcome = fx
            .service
            .submit("tok-a", INDD_MAGIC.to_vec(), indd_submit())
            .await
            .unwrap();
        let queued = match outcome {
            SubmitOutcome::Queued(q) => q,
            other => panic!("expected Queued, got {other:?}"),
        };

        assert_eq!(
            fx.service.status("tok-a", &queued.output_key).await.unwrap(),
            JobStatus::Pending
        );

        // the external worker delivers
        fx.store
            .put(&queued.output_key, vec![1, 2, 3], "application/octet-stream")
            .await
            .unwrap();

        assert_eq!(
            fx.service.status("tok-a", &queued.output_key).await.unwrap(),
            JobStatus::Completed
        );
    }

    #[tokio::test]
    async fn download_url_requires_the_artifact() {
        let fx = fixture();
        let outcome = fx
            .service
            .submit("tok-a", INDD_MAGIC.to_vec(), indd_submit())
            .await
            .unwrap();
        let queued = match outcome {
            SubmitOutcome::Queued(q) => q,
            other => panic!("expected Queued, got {other:?}"),
        };

        let err = fx
            .service
            .download_url("tok-a", &queued.output_key)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);

        fx.store
            .put(&queued.output_key, vec![1], "application/octet-stream")
            .await
            .unwrap();
        let url = fx
            .service
            .download_url("tok-a", &queued.output_key)
            .await
            .unwrap();
        assert!(url.starts_with("memory://jobs/user-a/"));
    }

    #[tokio::test]
    async fn users_cannot_address_each_others_artifacts() {
        let fx = fixture();
        let err = fx
            .service
            .status("tok-a", "jobs/user-b/some-job/output.indd")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn custom_output_names_keep_their_extension() {
        assert_eq!(artifact_name(None, "output", "pdf"), "output.pdf");
        assert_eq!(
            artifact_name(Some("Spring Campaign"), "output", "indd"),
            "Spring Campaign.indd"
        );
        assert_eq!(
            artifact_name(Some("final.PDF"), "output", "pdf"),
            "final.PDF"
        );
        assert_eq!(artifact_name(Some("  "), "output", "pdf"), "output.pdf");
    }
}
