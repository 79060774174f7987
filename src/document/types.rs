//! Core document types
//!
//! Geometry and per-page text structures shared by the text locator,
//! the match resolver and the MuPDF session.

use serde::{Deserialize, Serialize};

/// Document format accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Indd,
}

impl DocumentFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "indd" => Some(Self::Indd),
            _ => None,
        }
    }

    /// Detect format from magic bytes
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }

        // InDesign documents start with the database GUID
        // 0606EDF5-D81D-46E5-BD31-EFE7FE74B71D
        const INDD_MAGIC: [u8; 8] = [0x06, 0x06, 0xED, 0xF5, 0xD8, 0x1D, 0x46, 0xE5];
        if bytes.len() >= 8 && bytes[..8] == INDD_MAGIC {
            return Some(Self::Indd);
        }

        None
    }

    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Indd => "indd",
        }
    }
}

/// Axis-aligned rectangle in page coordinates (origin top-left, y grows down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Smallest rectangle covering both `self` and `other`
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// True when the rectangles overlap with positive area
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Area of the overlap with `other`, zero when disjoint
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let w = (self.x1.min(other.x1) - self.x0.max(other.x0)).max(0.0);
        let h = (self.y1.min(other.y1) - self.y0.max(other.y0)).max(0.0);
        w * h
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }
}

/// A whitespace-delimited word with its bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub rect: Rect,
}

/// A contiguous run of non-whitespace characters within a line
///
/// The finest text granularity the extraction layer exposes. Span rects are
/// unioned from character quads, so a span found in the matching copy of the
/// text always annotates the original geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub rect: Rect,
}

/// A line of spans with its bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub spans: Vec<Span>,
    pub rect: Rect,
}

impl TextLine {
    /// Line text as the space-joined concatenation of span texts
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&span.text);
        }
        out
    }
}

/// Text content of one page at both locator granularities
///
/// Words and lines are derived from the same structured-text pass, so a
/// region found through one view can be corroborated with the other.
#[derive(Debug, Clone, Default)]
pub struct PageText {
    /// Zero-based page index
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub words: Vec<Word>,
    pub lines: Vec<TextLine>,
}

/// An existing link annotation on a page
#[derive(Debug, Clone, PartialEq)]
pub struct PageLink {
    /// Position of the annotation within the page's `/Annots` array
    pub annot_index: usize,
    pub rect: Rect,
    pub uri: String,
}
