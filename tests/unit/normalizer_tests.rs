/*!
 * Tests for reference normalization and scanning
 */

use sermonscribe::scripture::{
    Bias, BibleReference, NormalizerConfig, ReferenceNormalizer, scan_references,
};

const SPOKEN: &[(&str, &str)] = &[
    ("John 316", "John 3:16"),
    ("John 3 dash 16", "John 3:16"),
    ("John 3-16", "John 3:16"),
    ("Romans 12, 1", "Romans 12:1"),
    ("Romans 12:1, 2, 3", "Romans 12:1-3"),
    ("John 3:16, 17, 18", "John 3:16-18"),
    ("Romans 12 one", "Romans 12:1"),
    ("First Corinthians thirteen four", "1 Corinthians 13:4"),
    ("Romans chapter 12 verses 1 through 2", "Romans 12:1-2"),
    ("Jude 5", "Jude 1:5"),
];

#[test]
fn test_normalize_spokenForms_shouldBecomeCanonical() {
    let normalizer = ReferenceNormalizer::with_defaults();
    for (spoken, canonical) in SPOKEN {
        let text = format!("Turn to {} with me.", spoken);
        let result = normalizer.normalize(&text);
        assert_eq!(result.text, format!("Turn to {} with me.", canonical), "for {:?}", spoken);
    }
}

#[test]
fn test_normalize_wholeSermon_shouldBeIdempotent() {
    let normalizer = ReferenceNormalizer::with_defaults();
    let text = "We read Romans 12 one last week and John 316 today. \
        First Corinthians thirteen four is for weddings but Jude 5 is a warning. \
        Read John 3 tonight.";
    let once = normalizer.normalize(text);
    let twice = normalizer.normalize(&once.text);
    assert_eq!(once.text, twice.text);
    assert!(twice.deltas.is_empty());
}

#[test]
fn test_normalize_shouldOnlyTouchReferences() {
    let normalizer = ReferenceNormalizer::with_defaults();
    let text = "Before the reference John 316 and after it.";
    let result = normalizer.normalize(text);

    assert_eq!(result.deltas.len(), 1);
    let delta = result.deltas[0];
    assert_eq!(&text[..delta.original.start], &result.text[..delta.original.start]);
    let tail_start = result.map_offset(delta.original.end, Bias::End);
    assert_eq!(&text[delta.original.end..], &result.text[tail_start..]);
}

#[test]
fn test_normalize_preserveVerbose_shouldLeaveVerboseSpeech() {
    let normalizer = ReferenceNormalizer::new(NormalizerConfig {
        enabled: true,
        preserve_verbose_speech: true,
    });
    let text = "Romans chapter 12 verse 1 and John 316";
    assert_eq!(normalizer.normalize(text).text, "Romans chapter 12 verse 1 and John 3:16");
}

#[test]
fn test_scan_afterNormalize_shouldFindEveryReference() {
    let normalizer = ReferenceNormalizer::with_defaults();
    let text = "John 316 and Romans 12 one and Jude 5";
    let normalized = normalizer.normalize(text);
    let scan = scan_references(&normalized.text);

    let found: Vec<String> = scan.matches.iter().map(|m| m.reference.canonical()).collect();
    assert_eq!(found, vec!["John 3:16", "Romans 12:1", "Jude 1:5"]);
    for found in &scan.matches {
        let mention = found.span.slice(&normalized.text).unwrap();
        assert_eq!(BibleReference::parse(mention).unwrap().canonical(), found.reference.canonical());
    }
}
