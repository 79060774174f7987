//! Format-pattern compilation
//!
//! Users describe the shape of tokens to hyperlink with a small shorthand:
//! `N` is one digit, `L` is one letter (case-insensitive), repetition gives a
//! fixed run length, a trailing `+` turns the run into "at least this many",
//! and any other character is a literal. `NNN-LLL+` therefore matches
//! `123-ABC`, `123-ABCD`, but not `12-ABC`.
//!
//! A job supplies a mapping of comma-separated format groups to base URLs as
//! a JSON object, e.g. `{"LLL-NNNN,LLLNNNN": "https://track.example.com/"}`.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;

use crate::error::AppError;

/// A format pattern compiled to a regex pair, paired with the base URL
/// matched tokens link to.
///
/// The anchored form gives fullmatch semantics for single words; the
/// unanchored form is used to search inside line text.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// The raw format string as supplied by the user
    pub format: String,
    /// Anchored (`^...$`), case-insensitive regex for whole-token matching
    pub anchored: Regex,
    /// Unanchored, case-insensitive regex for substring search
    pub search: Regex,
    /// Base URL the matched token is appended to
    pub base_url: String,
}

impl CompiledPattern {
    /// True when `text` as a whole has the pattern's shape
    pub fn is_full_match(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }
}

/// Compile a single format string into an unanchored regex source.
///
/// Scans left to right. A run of identical `N`/`L` characters becomes a
/// class repetition; a `+` directly after the run makes the repetition
/// open-ended with the run length as minimum. Everything else is escaped and
/// required literally. The empty format compiles to an empty source, which
/// anchors to `^$`.
pub fn format_to_regex_source(format: &str) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::with_capacity(format.len() * 4);

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i].to_ascii_uppercase();
        if c == 'N' || c == 'L' {
            let mut run = 1;
            while i + run < chars.len() && chars[i + run].to_ascii_uppercase() == c {
                run += 1;
            }
            let class = if c == 'N' { "[0-9]" } else { "[A-Za-z]" };
            let open_ended = i + run < chars.len() && chars[i + run] == '+';
            if open_ended {
                out.push_str(&format!("{class}{{{run},}}"));
                i += run + 1;
            } else {
                out.push_str(&format!("{class}{{{run}}}"));
                i += run;
            }
        } else {
            out.push_str(&regex::escape(&chars[i].to_string()));
            i += 1;
        }
    }

    out
}

/// Compile one format string, reporting an unparsable result as a
/// validation error.
pub fn compile_format(format: &str, base_url: &str) -> Result<CompiledPattern, AppError> {
    let source = format_to_regex_source(format);
    let invalid =
        |e: regex::Error| AppError::Validation(format!("Invalid format pattern {format:?}: {e}"));
    let anchored = Regex::new(&format!("(?i)^{source}$")).map_err(&invalid)?;
    let search = Regex::new(&format!("(?i){source}")).map_err(&invalid)?;
    Ok(CompiledPattern {
        format: format.to_string(),
        anchored,
        search,
        base_url: base_url.to_string(),
    })
}

/// Parse and compile the format-group → base-URL mapping payload.
///
/// The payload is a JSON object whose keys are comma-separated format groups
/// and whose values are base URL strings. Malformed payloads and empty
/// mappings are validation errors; the process itself never aborts on them.
pub fn parse_format_mapping(payload: &str) -> Result<Vec<CompiledPattern>, AppError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| AppError::Validation(format!("Malformed format mapping: {e}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| AppError::Validation("Format mapping must be a JSON object".into()))?;

    // BTreeMap keeps compilation order stable across runs
    let mut groups: BTreeMap<String, String> = BTreeMap::new();
    for (formats, url) in object {
        let url = url
            .as_str()
            .ok_or_else(|| {
                AppError::Validation(format!("Mapping value for {formats:?} must be a URL string"))
            })?
            .to_string();
        groups.insert(formats.clone(), url);
    }

    let mut compiled = Vec::new();
    for (formats, url) in &groups {
        for format in formats.split(',') {
            let format = format.trim();
            if format.is_empty() {
                continue;
            }
            compiled.push(compile_format(format, url)?);
        }
    }

    if compiled.is_empty() {
        return Err(AppError::Validation(
            "Format mapping contains no usable patterns".into(),
        ));
    }

    Ok(compiled)
}
