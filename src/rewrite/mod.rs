//! Hyperlink rewriting engine
//!
//! The processing core: compiles the job's format patterns, locates text
//! page by page, resolves matches into link edits and applies them to the
//! deliverable/preview document pair. Processing is synchronous and
//! CPU-bound; a request either completes or fails atomically with no
//! partial output.

mod claims;
mod normalize;
mod resolver;
mod utm;

pub use claims::ClaimedRegions;
pub use normalize::normalize;
pub use resolver::{
    resolve_links_and_utm, resolve_utm_only, visible_text_under, LinkEdit,
};
pub use utm::{append_utm, content_label, last_path_segment, pattern_url, UtmParams};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::mupdf::EditSession;
use crate::patterns::{parse_format_mapping, CompiledPattern};

/// Job type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Append UTM parameters to existing hyperlinks
    UtmOnly,
    /// Insert new hyperlinks over pattern matches, with UTM parameters
    LinksAndUtm,
}

impl FromStr for JobKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "utm_only" => Ok(JobKind::UtmOnly),
            "links_and_utm" => Ok(JobKind::LinksAndUtm),
            other => Err(AppError::Validation(format!("Unknown job type: {other:?}"))),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobKind::UtmOnly => "utm_only",
            JobKind::LinksAndUtm => "links_and_utm",
        })
    }
}

/// Everything one rewrite request needs besides the document bytes
#[derive(Debug, Clone)]
pub struct RewriteRequest {
    pub kind: JobKind,
    pub utm: UtmParams,
    /// JSON object of comma-separated format groups → base URL; required
    /// for [`JobKind::LinksAndUtm`]
    pub format_mapping: Option<String>,
    /// Underline matched regions on the deliverable
    pub underline: bool,
    /// Verbose per-word/per-line logging; never changes control flow
    pub diagnostics: bool,
}

/// Result of one rewrite request
pub struct RewriteOutcome {
    /// The rewritten deliverable
    pub document: Vec<u8>,
    /// The preview copy with outline rectangles over every touched region
    pub preview: Vec<u8>,
    /// Number of links created or updated
    pub links_touched: u32,
}

/// Matching rules compiled once per request
enum CompiledJob {
    UtmOnly,
    LinksAndUtm(Vec<CompiledPattern>),
}

impl CompiledJob {
    fn prepare(request: &RewriteRequest) -> Result<Self> {
        match request.kind {
            JobKind::UtmOnly => Ok(CompiledJob::UtmOnly),
            JobKind::LinksAndUtm => {
                let payload = request.format_mapping.as_deref().ok_or_else(|| {
                    AppError::Validation(
                        "Job type links_and_utm requires a format mapping".into(),
                    )
                })?;
                Ok(CompiledJob::LinksAndUtm(parse_format_mapping(payload)?))
            }
        }
    }
}

/// Processing entry point: rewrite the document's hyperlinks per the
/// request and return the deliverable, the preview and the link count.
///
/// The preview entry point is the same computation; callers pick the
/// [`RewriteOutcome::preview`] stream instead of the deliverable.
pub fn process_pdf(bytes: &[u8], request: &RewriteRequest) -> Result<RewriteOutcome> {
    let job = CompiledJob::prepare(request)?;

    let mut session = EditSession::open(bytes)?;
    let mut claims = ClaimedRegions::new();
    let mut links_touched: u32 = 0;

    for page_index in 0..session.page_count() {
        let text = session.page_text(page_index)?;
        if request.diagnostics {
            debug!(
                page = page_index,
                words = text.words.len(),
                lines = text.lines.len(),
                "located page text"
            );
        }

        let edits = match &job {
            CompiledJob::UtmOnly => {
                let links = session.page_links(page_index)?;
                resolve_utm_only(&text, &links, &request.utm, &mut claims, request.diagnostics)
            }
            CompiledJob::LinksAndUtm(patterns) => resolve_links_and_utm(
                &text,
                patterns,
                &request.utm,
                &mut claims,
                request.diagnostics,
            ),
        };

        links_touched += edits.len() as u32;
        session.apply(&edits, request.underline)?;
    }

    let (document, preview) = session.finish()?;
    info!(kind = %request.kind, links_touched, "rewrite complete");

    Ok(RewriteOutcome {
        document,
        preview,
        links_touched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_kind_parses_the_wire_names() {
        assert_eq!("utm_only".parse::<JobKind>().unwrap(), JobKind::UtmOnly);
        assert_eq!(
            "links_and_utm".parse::<JobKind>().unwrap(),
            JobKind::LinksAndUtm
        );
        let err = "both".parse::<JobKind>().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn links_and_utm_without_mapping_is_a_validation_error() {
        let request = RewriteRequest {
            kind: JobKind::LinksAndUtm,
            utm: UtmParams::new("news", "email", "spring"),
            format_mapping: None,
            underline: false,
            diagnostics: false,
        };
        let err = CompiledJob::prepare(&request).err().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn utm_only_ignores_the_mapping() {
        let request = RewriteRequest {
            kind: JobKind::UtmOnly,
            utm: UtmParams::new("news", "email", "spring"),
            format_mapping: Some("{not even json".into()),
            underline: false,
            diagnostics: false,
        };
        assert!(matches!(
            CompiledJob::prepare(&request),
            Ok(CompiledJob::UtmOnly)
        ));
    }
}
