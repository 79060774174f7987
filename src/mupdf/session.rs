//! Per-request edit session
//!
//! One request owns one in-memory document pair for its full duration: the
//! deliverable and a preview copy opened from the same bytes. Link edits are
//! applied to both in parallel; visual outlines only ever land on the
//! preview, underlines only on the deliverable. There is no shared state
//! between sessions, so concurrent requests cannot race.

use std::io::Write;

use mupdf::pdf::{PdfDocument, PdfWriteOptions};

use crate::document::{DocumentError, DocumentResult, PageLink, PageText};
use crate::rewrite::LinkEdit;

use super::{links, stext};

/// An open document pair for one rewrite request
pub struct EditSession {
    doc: PdfDocument,
    preview: PdfDocument,
    page_count: usize,
    /// MuPDF streams lazily from the backing file; keep it alive for the
    /// session's lifetime
    _backing: tempfile::NamedTempFile,
}

impl EditSession {
    /// Open the deliverable and its preview copy from the same bytes
    pub fn open(bytes: &[u8]) -> DocumentResult<Self> {
        let mut backing = tempfile::Builder::new()
            .prefix("linkstamp-in-")
            .suffix(".pdf")
            .tempfile()?;
        backing.write_all(bytes)?;
        backing.flush()?;

        let path = backing.path().to_string_lossy().into_owned();
        let doc = open_pdf(&path)?;
        let preview = open_pdf(&path)?;
        let page_count = doc.page_count()? as usize;
        Ok(Self {
            doc,
            preview,
            page_count,
            _backing: backing,
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Locate words and line/span groups on a page
    pub fn page_text(&self, index: usize) -> DocumentResult<PageText> {
        if index >= self.page_count {
            return Err(DocumentError::PageNotFound(index));
        }
        let page = self.doc.load_page(index as i32)?;
        stext::extract_page_text(&page, index)
    }

    /// Enumerate the existing external link annotations of a page
    pub fn page_links(&self, index: usize) -> DocumentResult<Vec<PageLink>> {
        if index >= self.page_count {
            return Err(DocumentError::PageNotFound(index));
        }
        links::page_links(&self.doc, index)
    }

    /// Apply resolver edits to the document pair.
    ///
    /// New links land on both documents; `underline` additionally draws the
    /// baseline decoration on the deliverable. Every touched region gets an
    /// outline on the preview so a reviewer can see what changed.
    pub fn apply(&mut self, edits: &[LinkEdit], underline: bool) -> DocumentResult<()> {
        for edit in edits {
            match edit {
                LinkEdit::Create { page, rect, uri } => {
                    links::add_link_annotation(&mut self.doc, *page, rect, uri)?;
                    links::add_link_annotation(&mut self.preview, *page, rect, uri)?;
                    if underline {
                        links::add_underline(&mut self.doc, *page, rect)?;
                    }
                    links::add_outline(&mut self.preview, *page, rect)?;
                }
                LinkEdit::Rewrite {
                    page,
                    annot_index,
                    rect,
                    uri,
                } => {
                    links::rewrite_link_target(&mut self.doc, *page, *annot_index, uri)?;
                    links::rewrite_link_target(&mut self.preview, *page, *annot_index, uri)?;
                    links::add_outline(&mut self.preview, *page, rect)?;
                }
            }
        }
        Ok(())
    }

    /// Serialize the pair back to bytes: (deliverable, preview)
    pub fn finish(mut self) -> DocumentResult<(Vec<u8>, Vec<u8>)> {
        let doc = serialize(&mut self.doc)?;
        let preview = serialize(&mut self.preview)?;
        Ok((doc, preview))
    }
}

fn open_pdf(path: &str) -> DocumentResult<PdfDocument> {
    PdfDocument::open(path).map_err(|e| DocumentError::ParseError(e.to_string()))
}

/// MuPDF serializes through the filesystem; round-trip via a temp file
fn serialize(doc: &mut PdfDocument) -> DocumentResult<Vec<u8>> {
    let tmp = tempfile::Builder::new()
        .prefix("linkstamp-out-")
        .suffix(".pdf")
        .tempfile()?;
    let path = tmp.path().to_string_lossy().into_owned();
    doc.save_with_options(&path, PdfWriteOptions::default())?;
    Ok(std::fs::read(tmp.path())?)
}
