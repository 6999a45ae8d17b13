use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;

use super::{AppState, CommandError};
use crate::docupipe::{DocumentService, DocumentUpload};
use crate::llm::TextGenerator;
use crate::pipeline::{Pipeline, PipelineEvent, PipelineReport, Stage};

/// Upload the file at `path` and run it through parsing and standardization,
/// printing progress to `out` as it happens.
pub async fn run_flow<D, G, W>(
    state: &mut AppState<D, G>,
    path: &Path,
    out: &mut W,
) -> Result<PipelineReport, CommandError>
where
    D: DocumentService,
    G: TextGenerator,
    W: Write,
{
    let upload = DocumentUpload::from_path(path).await?;
    run_upload(state, &upload, out).await
}

pub async fn run_upload<D, G, W>(
    state: &mut AppState<D, G>,
    upload: &DocumentUpload,
    out: &mut W,
) -> Result<PipelineReport, CommandError>
where
    D: DocumentService,
    G: TextGenerator,
    W: Write,
{
    let pipeline = Pipeline::new(&state.documents, &state.schema_id, state.poll);
    let mut write_error: Option<io::Error> = None;

    let result = pipeline
        .run(&mut state.session, upload, |event| {
            if let Err(e) = render_event(out, &event) {
                write_error.get_or_insert(e);
            }
        })
        .await;

    if let Some(e) = write_error {
        tracing::warn!(error = %e, "failed to write progress");
    }
    Ok(result?)
}

fn render_event<W: Write>(out: &mut W, event: &PipelineEvent<'_>) -> io::Result<()> {
    match event {
        PipelineEvent::StageEntered(Stage::Aborted) => writeln!(out, "Run aborted."),
        PipelineEvent::StageEntered(_) => Ok(()),
        PipelineEvent::Uploaded { document_id } => {
            writeln!(out, "Uploaded → id {}", document_id)
        }
        PipelineEvent::Polled(progress) => {
            writeln!(
                out,
                "Polling {} ({}/{})…",
                progress.resource, progress.attempt, progress.max_attempts
            )?;
            writeln!(out, "{}", progress.payload)
        }
        PipelineEvent::Parsed { result } => {
            writeln!(out, "\nParsed response")?;
            writeln!(out, "{}", pretty(result))
        }
        PipelineEvent::StandardizationRequested { standardization_id } => {
            writeln!(out, "Standardizing… id {}", standardization_id)
        }
        PipelineEvent::Published { schema_data } => {
            writeln!(out, "\nStandardized schema")?;
            writeln!(out, "{}", pretty(schema_data))
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
