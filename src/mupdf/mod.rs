//! MuPDF engine adapter
//!
//! Everything that touches MuPDF lives here: structured-text extraction into
//! locator views, link-annotation I/O through page `/Annots` arrays, and the
//! per-request [`EditSession`] owning the deliverable/preview document pair.

mod links;
mod session;
mod stext;

pub use session::EditSession;
