/*!
 * Line-oriented JSON bridge.
 *
 * Lets another process drive the pipeline over stdin/stdout. Each input
 * line is one request:
 *
 * ```json
 * {"id": "s1", "transcript": "...", "candidates": [{"reference": "John 3:16", "position": 42}]}
 * ```
 *
 * Each request answers with zero or more `progress` lines and then exactly
 * one `result` or `error` line, all tagged by `type` and carrying the
 * request id. A malformed line yields an `error` line and the bridge keeps
 * reading.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::document::{ExtractedReference, NodeRecord};
use crate::errors::AppError;
use crate::pipeline::{PipelinePhase, PipelineProgress, ProcessingReport, ProgressCallback, ReferenceCandidate, SermonPipeline};

/// One request line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRequest {
    pub id: String,
    pub transcript: String,
    #[serde(default)]
    pub candidates: Option<Vec<ReferenceCandidate>>,
}

/// One response line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeResponse {
    Progress {
        id: String,
        phase: PipelinePhase,
        progress: f32,
        message: String,
    },
    Result {
        id: String,
        document: NodeRecord,
        references: Vec<ExtractedReference>,
        report: ProcessingReport,
    },
    Error {
        id: Option<String>,
        message: String,
    },
}

/// Counters for one bridge session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub requests: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Serve requests from `reader` until end of input.
///
/// Only I/O failures on the streams themselves end the session early.
pub async fn run_bridge<R, W>(reader: R, writer: &mut W, pipeline: &SermonPipeline) -> Result<BridgeStats, AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = BridgeStats::default();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.requests += 1;

        let request: BridgeRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Malformed bridge request: {}", e);
                stats.failed += 1;
                let response = BridgeResponse::Error {
                    id: salvage_id(line),
                    message: format!("Malformed request: {}", e),
                };
                write_line(writer, &response).await?;
                continue;
            }
        };

        debug!("Bridge request {} ({} bytes)", request.id, request.transcript.len());
        let response = serve(request, writer, pipeline).await?;
        if matches!(response, BridgeResponse::Result { .. }) {
            stats.succeeded += 1;
        } else {
            stats.failed += 1;
        }
        write_line(writer, &response).await?;
    }

    Ok(stats)
}

/// Run one request, streaming its progress lines to `writer`.
async fn serve<W>(request: BridgeRequest, writer: &mut W, pipeline: &SermonPipeline) -> Result<BridgeResponse, AppError>
where
    W: AsyncWrite + Unpin,
{
    let BridgeRequest { id, transcript, candidates } = request;
    let (tx, mut rx) = mpsc::unbounded_channel::<PipelineProgress>();

    // The callback (and its sender) lives inside `work`, so the channel
    // closes as soon as processing ends.
    let callback: ProgressCallback = Box::new(move |progress| {
        let _ = tx.send(progress);
    });
    let work = async move {
        let callback = callback;
        pipeline
            .process_with_progress(&transcript, candidates.as_deref(), Some(&callback))
            .await
    };
    let drain = async {
        while let Some(progress) = rx.recv().await {
            let line = BridgeResponse::Progress {
                id: id.clone(),
                phase: progress.phase,
                progress: progress.overall_progress,
                message: progress.status,
            };
            write_line(writer, &line).await?;
        }
        Ok::<(), AppError>(())
    };

    let (result, drained) = tokio::join!(work, drain);
    drained?;

    Ok(match result {
        Ok(sermon) => {
            let record = sermon.to_record();
            BridgeResponse::Result {
                id,
                document: record.document,
                references: record.references,
                report: record.report,
            }
        }
        Err(e) => {
            warn!("Bridge request {} failed: {}", id, e);
            BridgeResponse::Error {
                id: Some(id),
                message: e.to_string(),
            }
        }
    })
}

/// Best-effort id from a line that failed to parse as a request.
fn salvage_id(line: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    match value.get("id")? {
        serde_json::Value::String(id) => Some(id.clone()),
        other => Some(other.to_string()),
    }
}

async fn write_line<W>(writer: &mut W, response: &BridgeResponse) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}
