//! Link annotation I/O
//!
//! Reads and writes PDF link annotations through the page `/Annots` array.
//! MuPDF's annotation machinery skips `Subtype=Link` entries, so both
//! directions work directly on the annotation dictionaries, the same way
//! `pdf_set_link_uri` does in MuPDF itself.
//!
//! Structured text uses fitz coordinates (origin top-left, y down) while
//! annotation rectangles are stored in PDF user space (origin bottom-left,
//! y up); the `/MediaBox` flip converts between the two.

use mupdf::pdf::{PdfDocument, PdfObject};

use crate::document::{DocumentError, DocumentResult, PageLink, Rect};

/// Underline stroke width for matched regions on the deliverable
const UNDERLINE_WIDTH: f32 = 0.5;

/// Outline stroke width for touched regions on the preview
const OUTLINE_WIDTH: f32 = 1.0;

fn annotation_error(what: &str, err: mupdf::Error) -> DocumentError {
    DocumentError::AnnotationError(format!("{what}: {err}"))
}

/// Page `/MediaBox`, following the `/Parent` chain for inherited entries
fn media_box(doc: &PdfDocument, page_index: usize) -> DocumentResult<(f32, f32, f32, f32)> {
    let mut obj = doc.find_page(page_index as i32)?;
    // Inheritance chains in real documents are shallow; eight hops is
    // already pathological
    for _ in 0..8 {
        if let Some(mb) = obj.get_dict("MediaBox")? {
            let read = |i: i32| -> DocumentResult<f32> {
                Ok(mb
                    .get_array(i)?
                    .ok_or_else(|| {
                        DocumentError::AnnotationError(format!("/MediaBox[{i}] missing"))
                    })?
                    .as_float()?)
            };
            return Ok((read(0)?, read(1)?, read(2)?, read(3)?));
        }
        match obj.get_dict("Parent")? {
            Some(parent) => obj = parent,
            None => break,
        }
    }
    // US Letter default when the document never declares one
    Ok((0.0, 0.0, 612.0, 792.0))
}

/// Fitz rect → PDF user-space rect
fn to_pdf_rect(rect: &Rect, mb: (f32, f32, f32, f32)) -> (f32, f32, f32, f32) {
    let (mx0, _my0, _mx1, my1) = mb;
    (
        rect.x0 + mx0,
        my1 - rect.y1,
        rect.x1 + mx0,
        my1 - rect.y0,
    )
}

/// PDF user-space rect → fitz rect
fn to_fitz_rect(x0: f32, y0: f32, x1: f32, y1: f32, mb: (f32, f32, f32, f32)) -> Rect {
    let (mx0, _my0, _mx1, my1) = mb;
    Rect::new(x0 - mx0, my1 - y1, x1 - mx0, my1 - y0)
}

fn new_real_array(doc: &mut PdfDocument, values: &[f32]) -> DocumentResult<PdfObject> {
    let mut arr = doc.new_array_with_capacity(values.len() as i32)?;
    for v in values {
        arr.array_push(PdfObject::new_real(*v)?)?;
    }
    Ok(arr)
}

/// Border-style dictionary with the given stroke width
fn border_style(doc: &mut PdfDocument, width: f32) -> DocumentResult<PdfObject> {
    let mut bs = doc.new_dict_with_capacity(1)?;
    if width == 0.0 {
        bs.dict_put("W", PdfObject::new_int(0)?)?;
    } else {
        bs.dict_put("W", PdfObject::new_real(width)?)?;
    }
    Ok(bs)
}

/// Enumerate the external link annotations of a page.
///
/// `annot_index` is the entry's position in the page's `/Annots` array, so a
/// later rewrite can address the same dictionary. Rects are returned in fitz
/// coordinates to line up with located text.
pub fn page_links(doc: &PdfDocument, page_index: usize) -> DocumentResult<Vec<PageLink>> {
    let page_obj = doc.find_page(page_index as i32)?;
    let Some(annots) = page_obj.get_dict("Annots")? else {
        return Ok(Vec::new());
    };
    let mb = media_box(doc, page_index)?;

    let mut links = Vec::new();
    for i in 0..annots.len()? {
        let Some(annot) = annots.get_array(i as i32)? else {
            continue;
        };
        if !annot.is_dict()? {
            continue;
        }
        let Some(subtype) = annot.get_dict("Subtype")? else {
            continue;
        };
        if subtype.as_name()? != "Link" {
            continue;
        }
        let Some(action) = annot.get_dict("A")? else {
            continue;
        };
        let Some(kind) = action.get_dict("S")? else {
            continue;
        };
        if kind.as_name()? != "URI" {
            continue;
        }
        let Some(uri_obj) = action.get_dict("URI")? else {
            continue;
        };
        let uri = uri_obj.as_string()?;

        let Some(rect_arr) = annot.get_dict("Rect")? else {
            continue;
        };
        let read = |j: i32| -> DocumentResult<f32> {
            Ok(rect_arr
                .get_array(j)?
                .ok_or_else(|| DocumentError::AnnotationError(format!("/Rect[{j}] missing")))?
                .as_float()?)
        };
        let (x0, y0, x1, y1) = (read(0)?, read(1)?, read(2)?, read(3)?);

        links.push(PageLink {
            annot_index: i as usize,
            rect: to_fitz_rect(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1), mb),
            uri: uri.to_string(),
        });
    }

    Ok(links)
}

/// Replace the `/A` `/URI` target of the annotation at `annot_index`
pub fn rewrite_link_target(
    doc: &mut PdfDocument,
    page_index: usize,
    annot_index: usize,
    uri: &str,
) -> DocumentResult<()> {
    let page_obj = doc.find_page(page_index as i32)?;
    let annots = page_obj
        .get_dict("Annots")?
        .ok_or_else(|| DocumentError::AnnotationError("page has no /Annots array".into()))?;
    let annot = annots.get_array(annot_index as i32)?.ok_or_else(|| {
        DocumentError::AnnotationError(format!("no annotation at index {annot_index}"))
    })?;
    let mut action = annot
        .get_dict("A")?
        .ok_or_else(|| DocumentError::AnnotationError("link annotation has no /A entry".into()))?;
    action
        .dict_put("URI", PdfObject::new_string(uri)?)
        .map_err(|e| annotation_error("failed to set /URI", e))?;
    Ok(())
}

/// Append a fully built annotation dictionary to a page's `/Annots` array,
/// wiring up its `/P` back-reference
fn push_annotation(
    doc: &mut PdfDocument,
    page_index: usize,
    annot: &mut PdfObject,
) -> DocumentResult<()> {
    let mut page_obj = doc.find_page(page_index as i32)?;
    annot.dict_put_ref("P", &page_obj)?;
    let mut annots = match page_obj.get_dict("Annots")? {
        Some(a) => a,
        None => doc.new_array()?,
    };
    let indirect = doc.add_object(annot)?;
    annots.array_push(indirect)?;
    page_obj.dict_put("Annots", annots)?;
    Ok(())
}

/// Install a clickable `/Subtype /Link` annotation over `rect`
pub fn add_link_annotation(
    doc: &mut PdfDocument,
    page_index: usize,
    rect: &Rect,
    uri: &str,
) -> DocumentResult<()> {
    let mb = media_box(doc, page_index)?;
    let (x0, y0, x1, y1) = to_pdf_rect(rect, mb);

    let mut annot = doc.new_dict_with_capacity(5)?;
    annot.dict_put("Subtype", PdfObject::new_name("Link")?)?;
    annot.dict_put("Rect", new_real_array(doc, &[x0, y0, x1, y1])?)?;
    annot.dict_put("BS", border_style(doc, 0.0)?)?;

    let mut action = doc.new_dict_with_capacity(2)?;
    action.dict_put("S", PdfObject::new_name("URI")?)?;
    action.dict_put("URI", PdfObject::new_string(uri)?)?;
    annot.dict_put("A", action)?;

    push_annotation(doc, page_index, &mut annot)
}

/// Draw a black underline just under the glyph baseline of `rect` as a
/// `/Subtype /Line` annotation on the deliverable
pub fn add_underline(doc: &mut PdfDocument, page_index: usize, rect: &Rect) -> DocumentResult<()> {
    let mb = media_box(doc, page_index)?;
    // Slightly above the box bottom so descenders stay readable
    let baseline = rect.y1 - rect.height() * 0.1;
    let line = Rect::new(rect.x0, baseline, rect.x1, baseline + UNDERLINE_WIDTH);
    let (x0, y0, x1, y1) = to_pdf_rect(&line, mb);

    let mut annot = doc.new_dict_with_capacity(5)?;
    annot.dict_put("Subtype", PdfObject::new_name("Line")?)?;
    annot.dict_put("Rect", new_real_array(doc, &[x0, y0 - 1.0, x1, y1 + 1.0])?)?;
    annot.dict_put("L", new_real_array(doc, &[x0, y0, x1, y0])?)?;
    annot.dict_put("C", new_real_array(doc, &[0.0, 0.0, 0.0])?)?;
    annot.dict_put("BS", border_style(doc, UNDERLINE_WIDTH)?)?;

    push_annotation(doc, page_index, &mut annot)
}

/// Draw a visible red outline around `rect` as a `/Subtype /Square`
/// annotation on the preview
pub fn add_outline(doc: &mut PdfDocument, page_index: usize, rect: &Rect) -> DocumentResult<()> {
    let mb = media_box(doc, page_index)?;
    let (x0, y0, x1, y1) = to_pdf_rect(rect, mb);

    let mut annot = doc.new_dict_with_capacity(4)?;
    annot.dict_put("Subtype", PdfObject::new_name("Square")?)?;
    annot.dict_put("Rect", new_real_array(doc, &[x0, y0, x1, y1])?)?;
    annot.dict_put("C", new_real_array(doc, &[1.0, 0.0, 0.0])?)?;
    annot.dict_put("BS", border_style(doc, OUTLINE_WIDTH)?)?;

    push_annotation(doc, page_index, &mut annot)
}
