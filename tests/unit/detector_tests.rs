/*!
 * Tests for quote boundary detection through the public API
 */

use sermonscribe::detection::{DetectorConfig, LocateOptions, QuoteBoundaryDetector, SearchDirection};
use sermonscribe::errors::CandidateError;
use sermonscribe::scripture::BibleReference;
use sermonscribe::span::Span;

use crate::common::{JOHN_3_16, ROMANS_12_1};

fn mention(text: &str, reference: &str) -> (BibleReference, Span) {
    let start = text.find(reference).expect("reference present");
    let span = Span::new(start, start + reference.len());
    (BibleReference::parse(reference).unwrap().with_span(span), span)
}

#[test]
fn test_detect_trailingPeriod_shouldBeIncludedInQuote() {
    let text = "Introduction. John 3:16 For God so loved the world. Conclusion text.";
    let (reference, span) = mention(text, "John 3:16");
    let detector = QuoteBoundaryDetector::default();

    let boundary = detector
        .detect(text, &reference, span, "For God so loved the world", None)
        .unwrap();

    let quote = &text[boundary.start..boundary.end];
    assert!(quote.ends_with("world."), "quote was {:?}", quote);
    assert!(!text[boundary.end..].starts_with('.'));
}

#[test]
fn test_detect_attributionIntro_shouldExcludeSurroundingText() {
    let text = "Last week he came home with a smile on his face. Romans 12:1 says Paul writes I beseech you therefore brethren by the mercies of God that ye present your bodies a living sacrifice holy acceptable unto God which is your reasonable service. What is Paul saying.";
    let (reference, span) = mention(text, "Romans 12:1");

    let boundary = QuoteBoundaryDetector::default()
        .detect(text, &reference, span, ROMANS_12_1, Some("KJV"))
        .unwrap();
    let quote = &text[boundary.start..boundary.end];

    assert!(quote.starts_with("I beseech"), "quote was {:?}", quote);
    assert!(quote.ends_with("reasonable service."), "quote was {:?}", quote);
    assert!(!quote.contains("his face"));
    assert!(!quote.contains("What is Paul"));
    assert_eq!(boundary.translation.as_deref(), Some("KJV"));
}

#[test]
fn test_locate_quoteBeforeReference_shouldUseBackwardSearch() {
    let text = "For God so loved the world that he gave his only begotten Son. That is John 3:16 and it changes everything.";
    let start = text.find("John 3:16").unwrap();

    let verse = "For God so loved the world, that he gave his only begotten Son";
    let located = QuoteBoundaryDetector::default()
        .locate(text, start, "John 3:16".len(), verse, &LocateOptions::default())
        .unwrap();

    assert_eq!(located.direction, SearchDirection::Backward);
    assert!(text[located.start..located.end].starts_with("For God so loved"));
    assert!(located.end <= start);
}

#[test]
fn test_detect_unrelatedText_shouldReportBestConfidence() {
    let text = "John 3:16 we will talk about the weather and the football scores this afternoon.";
    let (reference, span) = mention(text, "John 3:16");

    let result = QuoteBoundaryDetector::default().detect(text, &reference, span, JOHN_3_16, None);

    match result {
        Err(CandidateError::AlignmentNotFound { best_confidence }) => assert!(best_confidence < 0.45),
        other => panic!("expected AlignmentNotFound, got {:?}", other),
    }
}

#[test]
fn test_locate_higherFloor_shouldNeverFindMore() {
    let text = "John 3:16 for God so loved the world that he gave his Son.";
    let detector = QuoteBoundaryDetector::new(DetectorConfig::default());
    let lenient = detector.locate(text, 0, 9, JOHN_3_16, &LocateOptions::default().with_confidence_floor(0.2));
    let strict = detector.locate(text, 0, 9, JOHN_3_16, &LocateOptions::default().with_confidence_floor(0.99));

    assert!(lenient.is_some());
    assert!(strict.is_none());
}

#[test]
fn test_detect_longInteriorAside_shouldReportDisjointCommentary() {
    let aside = "and my grandmother always quoted these words over breakfast every single morning while we ate oatmeal and drank coffee before walking down toward church on cold winter Sundays";
    let text = format!(
        "Romans 12:1 I beseech you therefore brethren by the mercies of God {} that ye present your bodies a living sacrifice holy acceptable unto God which is your reasonable service. Amen.",
        aside
    );
    let (reference, span) = mention(&text, "Romans 12:1");

    let boundary = QuoteBoundaryDetector::default()
        .detect(&text, &reference, span, ROMANS_12_1, None)
        .unwrap();

    let quote = &text[boundary.start..boundary.end];
    assert!(quote.starts_with("that ye present"), "quote was {:?}", quote);
    assert!(quote.ends_with("reasonable service."));

    let commentary: Vec<&str> = boundary.commentary.iter().filter_map(|c| c.slice(&text)).collect();
    assert!(commentary.iter().any(|c| c.contains("oatmeal")), "commentary was {:?}", commentary);
    assert!(commentary.iter().all(|c| !c.contains("beseech")), "commentary was {:?}", commentary);
    for pair in boundary.commentary.windows(2) {
        assert!(pair[0].end <= pair[1].start, "overlapping commentary {:?}", boundary.commentary);
    }
    assert!(boundary.commentary.iter().all(|c| !c.overlaps(&boundary.span())));
}
