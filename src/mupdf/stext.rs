//! Structured text extraction
//!
//! Walks MuPDF's structured-text page into the two locator views the match
//! resolver consumes: a flat word list and per-line span groups. Both come
//! from the same pass, so their geometry is mutually consistent.

use mupdf::{Page, Rect as FzRect, TextPageOptions};

use crate::document::{DocumentResult, PageText, Rect, Span, TextLine, Word};

fn fz_rect(rect: &FzRect) -> Rect {
    Rect::new(rect.x0, rect.y0, rect.x1, rect.y1)
}

/// Extract words and line/span groups with bounding boxes from one page.
///
/// Spans are contiguous non-whitespace character runs within a line, with
/// rects unioned from character quads; words are the same runs flattened
/// across the page in reading order.
pub fn extract_page_text(page: &Page, index: usize) -> DocumentResult<PageText> {
    let bounds = page.bounds()?;
    let text_page = page.to_text_page(TextPageOptions::empty())?;

    let mut words = Vec::new();
    let mut lines = Vec::new();

    for block in text_page.blocks() {
        for line in block.lines() {
            let mut spans: Vec<Span> = Vec::new();
            let mut text = String::new();
            let mut rect: Option<Rect> = None;

            for ch in line.chars() {
                let Some(c) = ch.char() else { continue };
                if c.is_whitespace() {
                    if !text.is_empty() {
                        spans.push(Span {
                            text: std::mem::take(&mut text),
                            rect: rect.take().unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0)),
                        });
                    }
                    continue;
                }

                // Character bounding box from quad corners
                let quad = ch.quad();
                let char_rect = Rect::new(
                    quad.ul.x.min(quad.ll.x),
                    quad.ul.y.min(quad.ur.y),
                    quad.ur.x.max(quad.lr.x),
                    quad.ll.y.max(quad.lr.y),
                );
                text.push(c);
                rect = Some(match rect {
                    Some(r) => r.union(&char_rect),
                    None => char_rect,
                });
            }

            if !text.is_empty() {
                spans.push(Span {
                    text,
                    rect: rect.unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0)),
                });
            }

            if spans.is_empty() {
                continue;
            }

            words.extend(spans.iter().map(|s| Word {
                text: s.text.clone(),
                rect: s.rect,
            }));
            lines.push(TextLine {
                rect: fz_rect(&line.bounds()),
                spans,
            });
        }
    }

    Ok(PageText {
        index,
        width: bounds.x1 - bounds.x0,
        height: bounds.y1 - bounds.y0,
        words,
        lines,
    })
}
