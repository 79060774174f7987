//! UTM link synthesis
//!
//! Builds outbound URLs: an existing target plus the UTM query parameters,
//! or a pattern base URL plus the matched token plus the UTM parameters.
//! Parameter values are percent-encoded; the join character is decided by
//! whether the URL already carries a query string.

use serde::{Deserialize, Serialize};
use urlencoding::encode;

/// The UTM parameter triple supplied with every job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmParams {
    pub source: String,
    pub medium: String,
    pub campaign: String,
}

impl UtmParams {
    pub fn new(
        source: impl Into<String>,
        medium: impl Into<String>,
        campaign: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            medium: medium.into(),
            campaign: campaign.into(),
        }
    }
}

/// Append the UTM parameters (and optional `utm_content`) to `url`
pub fn append_utm(url: &str, utm: &UtmParams, content: Option<&str>) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    let mut out = format!(
        "{url}{sep}utm_source={}&utm_medium={}&utm_campaign={}",
        encode(&utm.source),
        encode(&utm.medium),
        encode(&utm.campaign),
    );
    if let Some(content) = content {
        out.push_str("&utm_content=");
        out.push_str(&encode(content));
    }
    out
}

/// Build the target for a pattern match: base URL + matched token + UTM,
/// with the matched token doubling as `utm_content`
pub fn pattern_url(base_url: &str, token: &str, utm: &UtmParams) -> String {
    append_utm(&format!("{base_url}{token}"), utm, Some(token))
}

/// Last non-empty path segment of a URL, with query/fragment stripped.
///
/// `https://shop.example.com/p/1234?id=9` → `1234`. Returns `None` for URLs
/// with an empty path.
pub fn last_path_segment(url: &str) -> Option<String> {
    let no_fragment = url.split('#').next().unwrap_or(url);
    let no_query = no_fragment.split('?').next().unwrap_or(no_fragment);

    // Drop the scheme and authority so host labels never count as segments
    let path = match no_query.find("://") {
        Some(at) => {
            let rest = &no_query[at + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => return None,
            }
        }
        None => no_query,
    };

    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// The `utm_content` label for an existing link: visible text verbatim when
/// it is a single token, otherwise the last path segment of the target
pub fn content_label(visible_text: &str, target: &str) -> Option<String> {
    let trimmed = visible_text.trim();
    if !trimmed.is_empty() && !trimmed.chars().any(char::is_whitespace) {
        return Some(trimmed.to_string());
    }
    last_path_segment(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utm() -> UtmParams {
        UtmParams::new("news", "email", "spring")
    }

    #[test]
    fn appends_with_question_mark_when_no_query() {
        let url = append_utm("https://x.com/a", &utm(), None);
        assert_eq!(
            url,
            "https://x.com/a?utm_source=news&utm_medium=email&utm_campaign=spring"
        );
    }

    #[test]
    fn appends_with_ampersand_when_query_present() {
        let url = append_utm("https://x.com/a?id=9", &utm(), None);
        assert_eq!(
            url,
            "https://x.com/a?id=9&utm_source=news&utm_medium=email&utm_campaign=spring"
        );
    }

    #[test]
    fn content_parameter_is_optional_and_encoded() {
        let url = append_utm("https://x.com/a", &utm(), Some("spring sale"));
        assert!(url.ends_with("&utm_content=spring%20sale"));
    }

    #[test]
    fn values_are_percent_encoded() {
        let params = UtmParams::new("a&b", "e mail", "q1/q2");
        let url = append_utm("https://x.com/a", &params, None);
        assert_eq!(
            url,
            "https://x.com/a?utm_source=a%26b&utm_medium=e%20mail&utm_campaign=q1%2Fq2"
        );
    }

    #[test]
    fn pattern_url_appends_token_and_content() {
        let url = pattern_url("https://track.example.com/", "INV-2024", &utm());
        assert_eq!(
            url,
            "https://track.example.com/INV-2024?utm_source=news&utm_medium=email&utm_campaign=spring&utm_content=INV-2024"
        );
    }

    #[test]
    fn last_path_segment_handles_queries_and_hosts() {
        assert_eq!(
            last_path_segment("https://shop.example.com/p/1234"),
            Some("1234".into())
        );
        assert_eq!(
            last_path_segment("https://shop.example.com/p/1234?ref=9#frag"),
            Some("1234".into())
        );
        assert_eq!(
            last_path_segment("https://shop.example.com/p/1234/"),
            Some("1234".into())
        );
        assert_eq!(last_path_segment("https://shop.example.com"), None);
        assert_eq!(last_path_segment("https://shop.example.com/"), None);
    }

    #[test]
    fn content_label_prefers_single_token_visible_text() {
        assert_eq!(
            content_label("download", "https://shop.example.com/p/1234"),
            Some("download".into())
        );
        assert_eq!(
            content_label("Learn More", "https://shop.example.com/p/1234"),
            Some("1234".into())
        );
        assert_eq!(
            content_label("Buy Now", "https://shop.example.com/p/1234"),
            Some("1234".into())
        );
        // no visible text and no path: nothing to label with
        assert_eq!(content_label("", "https://shop.example.com"), None);
    }
}
