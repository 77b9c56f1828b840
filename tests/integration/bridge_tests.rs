/*!
 * Tests for the line-delimited JSON bridge session
 */

use sermonscribe::bridge::{BridgeResponse, BridgeStats, run_bridge};
use sermonscribe::pipeline::{PipelineConfig, PipelinePhase, ReferenceCandidate};
use tokio::io::BufReader;

use crate::common::{SAMPLE_SERMON, sample_pipeline};

fn request_line(id: &str, transcript: &str, candidates: Option<Vec<ReferenceCandidate>>) -> String {
    let mut value = serde_json::json!({ "id": id, "transcript": transcript });
    if let Some(candidates) = candidates {
        value["candidates"] = serde_json::to_value(candidates).unwrap();
    }
    value.to_string()
}

fn parse_output(output: &[u8]) -> Vec<BridgeResponse> {
    String::from_utf8(output.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_bridge_multipleRequests_shouldAnswerInOrder() {
    let pipeline = sample_pipeline(PipelineConfig::default());
    let position = SAMPLE_SERMON.find("Psalm 23:1").unwrap();
    let input = [
        request_line("first", SAMPLE_SERMON, None),
        String::new(),
        request_line("second", SAMPLE_SERMON, Some(vec![ReferenceCandidate::new("Psalm 23:1", position)])),
    ]
    .join("\n");

    let mut output = Vec::new();
    let stats = run_bridge(BufReader::new(input.as_bytes()), &mut output, &pipeline).await.unwrap();

    assert_eq!(stats, BridgeStats { requests: 2, succeeded: 2, failed: 0 });

    let responses = parse_output(&output);
    let finals: Vec<(usize, &BridgeResponse)> = responses
        .iter()
        .enumerate()
        .filter(|(_, r)| matches!(r, BridgeResponse::Result { .. }))
        .collect();
    assert_eq!(finals.len(), 2);

    // Every progress line for a request precedes its result.
    for (index, response) in responses.iter().enumerate() {
        if let BridgeResponse::Progress { id, progress, .. } = response {
            assert!((0.0..=1.0).contains(progress));
            let result_index = if id == "first" { finals[0].0 } else { finals[1].0 };
            assert!(index < result_index);
            if id == "second" {
                assert!(index > finals[0].0);
            }
        }
    }

    match finals[0].1 {
        BridgeResponse::Result { id, references, report, .. } => {
            assert_eq!(id, "first");
            assert_eq!(references.len(), 2);
            assert_eq!(report.passages, 2);
        }
        other => panic!("unexpected response {:?}", other),
    }
    match finals[1].1 {
        BridgeResponse::Result { id, references, .. } => {
            assert_eq!(id, "second");
            assert_eq!(references.len(), 1);
            assert_eq!(references[0].reference.canonical(), "Psalms 23:1");
        }
        other => panic!("unexpected response {:?}", other),
    }
}

#[tokio::test]
async fn test_bridge_progress_shouldReportEveryPhase() {
    let pipeline = sample_pipeline(PipelineConfig::default());
    let input = request_line("only", SAMPLE_SERMON, None);

    let mut output = Vec::new();
    run_bridge(BufReader::new(input.as_bytes()), &mut output, &pipeline).await.unwrap();

    let phases: Vec<PipelinePhase> = parse_output(&output)
        .into_iter()
        .filter_map(|r| match r {
            BridgeResponse::Progress { phase, .. } => Some(phase),
            _ => None,
        })
        .collect();
    for phase in [
        PipelinePhase::Normalize,
        PipelinePhase::Locate,
        PipelinePhase::Isolate,
        PipelinePhase::Segment,
        PipelinePhase::Extract,
    ] {
        assert!(phases.contains(&phase), "missing {:?}", phase);
    }
}

#[tokio::test]
async fn test_bridge_badRequest_shouldNotEndSession() {
    let pipeline = sample_pipeline(PipelineConfig::passages_only());
    let input = [
        r#"{"id": "broken", "transcript": 42}"#.to_string(),
        "not json at all".to_string(),
        request_line("fine", "Psalm 23:1 The LORD is my shepherd, I shall not want.", None),
    ]
    .join("\n");

    let mut output = Vec::new();
    let stats = run_bridge(BufReader::new(input.as_bytes()), &mut output, &pipeline).await.unwrap();

    assert_eq!(stats, BridgeStats { requests: 3, succeeded: 1, failed: 2 });
    let errors: Vec<Option<String>> = parse_output(&output)
        .into_iter()
        .filter_map(|r| match r {
            BridgeResponse::Error { id, .. } => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec![Some("broken".to_string()), None]);
}
