//! Match resolution
//!
//! Decides which regions of a page receive a new or rewritten hyperlink.
//! Pattern matching runs as an ordered list of matcher strategies over the
//! located text; all strategies share one [`ClaimedRegions`] set, so the
//! first strategy to claim a region wins and no region is linked twice.
//!
//! The resolver is pure: it consumes located text and existing links and
//! emits [`LinkEdit`] values for the document session to apply.

use tracing::debug;

use crate::document::{PageLink, PageText, Rect, Word};
use crate::patterns::CompiledPattern;
use crate::rewrite::claims::ClaimedRegions;
use crate::rewrite::normalize::normalize;
use crate::rewrite::utm::{append_utm, content_label, pattern_url, UtmParams};

/// A single mutation to apply to the document pair
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEdit {
    /// Install a new link annotation over `rect`
    Create { page: usize, rect: Rect, uri: String },
    /// Replace the target of the existing annotation at `annot_index`
    Rewrite {
        page: usize,
        annot_index: usize,
        rect: Rect,
        uri: String,
    },
}

impl LinkEdit {
    pub fn page(&self) -> usize {
        match self {
            LinkEdit::Create { page, .. } | LinkEdit::Rewrite { page, .. } => *page,
        }
    }

    pub fn rect(&self) -> &Rect {
        match self {
            LinkEdit::Create { rect, .. } | LinkEdit::Rewrite { rect, .. } => rect,
        }
    }
}

/// Inputs shared by every matcher strategy
struct MatchContext<'a> {
    patterns: &'a [CompiledPattern],
    utm: &'a UtmParams,
    diagnostics: bool,
}

/// A matcher strategy scans one page and claims regions for new links.
///
/// Strategies run in priority order; a region claimed by an earlier strategy
/// is never re-linked by a later one.
type MatcherStrategy = fn(&PageText, &MatchContext<'_>, &mut ClaimedRegions, &mut Vec<LinkEdit>);

/// Priority-ordered strategies for the `links_and_utm` job type
const STRATEGIES: [MatcherStrategy; 2] = [match_words, match_line_spans];

/// Rewrite existing link annotations in place, appending UTM parameters.
///
/// Only external `http`/`https` targets are touched. The `utm_content` label
/// comes from the visible text under the link when it is a single token,
/// otherwise from the last path segment of the current target.
pub fn resolve_utm_only(
    page: &PageText,
    links: &[PageLink],
    utm: &UtmParams,
    claims: &mut ClaimedRegions,
    diagnostics: bool,
) -> Vec<LinkEdit> {
    let mut edits = Vec::new();

    for link in links {
        let lowered = link.uri.to_ascii_lowercase();
        if !lowered.starts_with("http://") && !lowered.starts_with("https://") {
            if diagnostics {
                debug!(page = page.index, uri = %link.uri, "skipping non-external link");
            }
            continue;
        }

        if !claims.claim(page.index, &link.rect) {
            continue;
        }

        let visible = visible_text_under(&page.words, &link.rect);
        let content = content_label(&visible, &link.uri);
        let uri = append_utm(&link.uri, utm, content.as_deref());

        if diagnostics {
            debug!(
                page = page.index,
                visible = %visible,
                old = %link.uri,
                new = %uri,
                "rewriting link target"
            );
        }

        edits.push(LinkEdit::Rewrite {
            page: page.index,
            annot_index: link.annot_index,
            rect: link.rect,
            uri,
        });
    }

    edits
}

/// Insert new links over text matching the compiled format patterns.
pub fn resolve_links_and_utm(
    page: &PageText,
    patterns: &[CompiledPattern],
    utm: &UtmParams,
    claims: &mut ClaimedRegions,
    diagnostics: bool,
) -> Vec<LinkEdit> {
    let ctx = MatchContext {
        patterns,
        utm,
        diagnostics,
    };
    let mut edits = Vec::new();
    for strategy in STRATEGIES {
        strategy(page, &ctx, claims, &mut edits);
    }
    edits
}

/// Word strategy: link whole words whose normalized text has a pattern's
/// exact shape.
fn match_words(
    page: &PageText,
    ctx: &MatchContext<'_>,
    claims: &mut ClaimedRegions,
    edits: &mut Vec<LinkEdit>,
) {
    for word in &page.words {
        let normalized = normalize(&word.text);
        if ctx.diagnostics {
            debug!(page = page.index, word = %normalized, "scanning word");
        }

        for pattern in ctx.patterns {
            if !pattern.is_full_match(&normalized) {
                continue;
            }
            if claims.claim(page.index, &word.rect) {
                edits.push(LinkEdit::Create {
                    page: page.index,
                    rect: word.rect,
                    uri: pattern_url(&pattern.base_url, &normalized, ctx.utm),
                });
            }
            break;
        }
    }
}

/// Line/span strategy: search patterns inside concatenated line text and
/// attribute each hit back to span geometry.
///
/// A hit whose text equals a single span's text annotates that span. A hit
/// straddling spans falls back to splitting the match into whitespace
/// tokens and claiming the first span equal to each token; with duplicate
/// tokens on one line this can pick an earlier duplicate, which is the
/// long-standing behavior callers rely on.
fn match_line_spans(
    page: &PageText,
    ctx: &MatchContext<'_>,
    claims: &mut ClaimedRegions,
    edits: &mut Vec<LinkEdit>,
) {
    for line in &page.lines {
        let span_texts: Vec<String> = line.spans.iter().map(|s| normalize(&s.text)).collect();
        let line_text = span_texts.join(" ");
        if line_text.is_empty() {
            continue;
        }
        if ctx.diagnostics {
            debug!(page = page.index, line = %line_text, "scanning line");
        }

        for pattern in ctx.patterns {
            for hit in pattern.search.find_iter(&line_text) {
                let matched = hit.as_str();
                if matched.is_empty() {
                    continue;
                }
                let uri = pattern_url(&pattern.base_url, matched, ctx.utm);

                if let Some(i) = span_texts.iter().position(|t| t == matched) {
                    if claims.claim(page.index, &line.spans[i].rect) {
                        edits.push(LinkEdit::Create {
                            page: page.index,
                            rect: line.spans[i].rect,
                            uri: uri.clone(),
                        });
                    }
                    continue;
                }

                // Match straddles spans: claim the first span equal to each token
                for token in matched.split_whitespace() {
                    match span_texts.iter().position(|t| t == token) {
                        Some(i) => {
                            if claims.claim(page.index, &line.spans[i].rect) {
                                edits.push(LinkEdit::Create {
                                    page: page.index,
                                    rect: line.spans[i].rect,
                                    uri: uri.clone(),
                                });
                            }
                        }
                        None => {
                            if ctx.diagnostics {
                                debug!(
                                    page = page.index,
                                    token,
                                    matched,
                                    "no span geometry for matched token"
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Text visibly under a rectangle: the words whose boxes mostly overlap it,
/// joined in reading order.
pub fn visible_text_under(words: &[Word], rect: &Rect) -> String {
    let mut parts = Vec::new();
    for word in words {
        let area = word.rect.area();
        if area <= 0.0 {
            continue;
        }
        if word.rect.intersection_area(rect) >= area * 0.5 {
            parts.push(word.text.as_str());
        }
    }
    parts.join(" ")
}
