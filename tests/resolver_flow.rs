//! End-to-end resolver scenarios
//!
//! Drives the pattern compiler, match resolver and UTM synthesizer together
//! over in-memory page fixtures, covering the canonical flows: a one-page
//! document gaining a pattern link, and an existing link rewritten in place.

use linkstamp::document::{PageLink, PageText, Rect, Span, TextLine, Word};
use linkstamp::patterns::parse_format_mapping;
use linkstamp::rewrite::{
    resolve_links_and_utm, resolve_utm_only, ClaimedRegions, LinkEdit, UtmParams,
};

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "linkstamp=debug".into()))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

fn one_word_page(text: &str) -> PageText {
    let rect = Rect::new(72.0, 700.0, 72.0 + text.len() as f32 * 6.0, 712.0);
    PageText {
        index: 0,
        width: 612.0,
        height: 792.0,
        words: vec![Word {
            text: text.into(),
            rect,
        }],
        lines: vec![TextLine {
            spans: vec![Span {
                text: text.into(),
                rect,
            }],
            rect,
        }],
    }
}

#[test]
fn plain_text_invoice_number_gains_exactly_one_link() {
    init_tracing();

    let page = one_word_page("INV-2024");
    let patterns =
        parse_format_mapping(r#"{"LLL-NNNN": "https://track.example.com/"}"#).unwrap();
    let utm = UtmParams::new("news", "email", "spring");
    let mut claims = ClaimedRegions::new();

    let edits = resolve_links_and_utm(&page, &patterns, &utm, &mut claims, true);

    assert_eq!(edits.len(), 1, "expected exactly one new link");
    match &edits[0] {
        LinkEdit::Create { page, rect, uri } => {
            assert_eq!(*page, 0);
            assert_eq!(rect.x0, 72.0);
            assert_eq!(
                uri,
                "https://track.example.com/INV-2024?utm_source=news&utm_medium=email&utm_campaign=spring&utm_content=INV-2024"
            );
        }
        other => panic!("expected Create, got {other:?}"),
    }

    // the reported link count is the number of edits
    assert_eq!(edits.len() as u32, 1);
}

#[test]
fn existing_buy_now_link_is_rewritten_with_path_segment_content() {
    init_tracing();

    let mut page = one_word_page("Buy");
    page.words.push(Word {
        text: "Now".into(),
        rect: Rect::new(100.0, 700.0, 126.0, 712.0),
    });

    let links = vec![PageLink {
        annot_index: 0,
        rect: Rect::new(70.0, 698.0, 130.0, 714.0),
        uri: "https://shop.example.com/p/1234".into(),
    }];
    let utm = UtmParams::new("ig", "social", "launch");
    let mut claims = ClaimedRegions::new();

    let edits = resolve_utm_only(&page, &links, &utm, &mut claims, true);

    assert_eq!(edits.len(), 1);
    match &edits[0] {
        LinkEdit::Rewrite { uri, .. } => {
            assert_eq!(
                uri,
                "https://shop.example.com/p/1234?utm_source=ig&utm_medium=social&utm_campaign=launch&utm_content=1234"
            );
        }
        other => panic!("expected Rewrite, got {other:?}"),
    }
}

#[test]
fn running_both_job_phases_shares_the_claim_set() {
    init_tracing();

    // A region rewritten by utm_only can never be re-linked by a later
    // pattern pass over the same claim set.
    let page = one_word_page("INV-2024");
    let links = vec![PageLink {
        annot_index: 0,
        rect: page.words[0].rect,
        uri: "https://old.example.com/a".into(),
    }];
    let utm = UtmParams::new("news", "email", "spring");
    let patterns =
        parse_format_mapping(r#"{"LLL-NNNN": "https://track.example.com/"}"#).unwrap();
    let mut claims = ClaimedRegions::new();

    let rewrites = resolve_utm_only(&page, &links, &utm, &mut claims, false);
    let creates = resolve_links_and_utm(&page, &patterns, &utm, &mut claims, false);

    assert_eq!(rewrites.len(), 1);
    assert!(creates.is_empty(), "claimed region must not be re-linked");
}
