//! Upload → parse → standardize → publish, as one sequential run.
//!
//! ```text
//! Idle -> Uploading -> ParsingPoll -> Standardizing -> StandardizationPoll -> Published
//!                  \____________________ any failure ____________________/-> Aborted
//! ```
//!
//! A run takes `&mut Session`, so a session hosts at most one run at a time.
//! Nothing guards against starting another run in a different session for the
//! same file; each session keeps its own result.

use serde_json::Value;
use tracing::Instrument;

use crate::docupipe::{
    document_path, is_parsed, is_standardized, standardization_path, DocumentService,
    DocumentUpload,
};
use crate::error::UpstreamError;
use crate::poller::{poll_until, PollError, PollPolicy, PollProgress};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Uploading,
    ParsingPoll,
    Standardizing,
    StandardizationPoll,
    Published,
    Aborted,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Uploading => "upload",
            Stage::ParsingPoll => "parse polling",
            Stage::Standardizing => "standardization request",
            Stage::StandardizationPoll => "standardization polling",
            Stage::Published => "published",
            Stage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// What the front end gets told while a run progresses.
#[derive(Debug, Clone, Copy)]
pub enum PipelineEvent<'a> {
    StageEntered(Stage),
    Uploaded { document_id: &'a str },
    Polled(PollProgress<'a>),
    Parsed { result: &'a Value },
    StandardizationRequested { standardization_id: &'a str },
    Published { schema_data: &'a Value },
}

/// Why a run ended in `Aborted`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage} failed: {source}")]
    Upstream {
        stage: Stage,
        #[source]
        source: UpstreamError,
    },
    #[error("{stage} timed out: {resource} not ready after {attempts} attempts")]
    Timeout {
        stage: Stage,
        resource: String,
        attempts: u32,
    },
}

impl PipelineError {
    /// The stage the run was in when it aborted.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Upstream { stage, .. } | PipelineError::Timeout { stage, .. } => *stage,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PipelineError::Timeout { .. })
    }

    fn upstream(stage: Stage) -> impl FnOnce(UpstreamError) -> Self {
        move |source| PipelineError::Upstream { stage, source }
    }

    fn poll(stage: Stage) -> impl FnOnce(PollError) -> Self {
        move |err| match err {
            PollError::Upstream(source) => PipelineError::Upstream { stage, source },
            PollError::Timeout { resource, attempts } => PipelineError::Timeout {
                stage,
                resource,
                attempts,
            },
        }
    }
}

/// Everything a successful run produced, for display.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub document_id: String,
    /// `result` of the completed document payload, `null` if absent.
    pub parsed_result: Value,
    pub standardization_id: String,
    pub schema_data: Value,
}

pub struct Pipeline<'a, D: DocumentService + ?Sized> {
    service: &'a D,
    schema_id: &'a str,
    policy: PollPolicy,
}

impl<'a, D: DocumentService + ?Sized> Pipeline<'a, D> {
    pub fn new(service: &'a D, schema_id: &'a str, policy: PollPolicy) -> Self {
        Self {
            service,
            schema_id,
            policy,
        }
    }

    /// Run the whole flow for `upload`.
    ///
    /// Only a fully successful run touches `session`: it publishes the
    /// standardized data, which also clears the transcript. Any failure
    /// leaves the session exactly as it was.
    pub async fn run<O>(
        &self,
        session: &mut Session,
        upload: &DocumentUpload,
        mut observe: O,
    ) -> Result<PipelineReport, PipelineError>
    where
        O: FnMut(PipelineEvent<'_>),
    {
        let span = tracing::info_span!(
            "pipeline",
            session_id = %session.id(),
            filename = %upload.filename
        );

        let outcome = self.execute(upload, &mut observe).instrument(span).await;

        match outcome {
            Ok(report) => {
                session.publish(report.schema_data.clone());
                observe(PipelineEvent::StageEntered(Stage::Published));
                observe(PipelineEvent::Published {
                    schema_data: &report.schema_data,
                });
                Ok(report)
            }
            Err(err) => {
                tracing::warn!(
                    session_id = %session.id(),
                    stage = %err.stage(),
                    error = %err,
                    "pipeline aborted"
                );
                observe(PipelineEvent::StageEntered(Stage::Aborted));
                Err(err)
            }
        }
    }

    async fn execute<O>(
        &self,
        upload: &DocumentUpload,
        observe: &mut O,
    ) -> Result<PipelineReport, PipelineError>
    where
        O: FnMut(PipelineEvent<'_>),
    {
        observe(PipelineEvent::StageEntered(Stage::Uploading));
        let document_id = self
            .service
            .upload(&upload.contents, &upload.filename)
            .await
            .map_err(PipelineError::upstream(Stage::Uploading))?;
        tracing::info!(%document_id, bytes = upload.contents.len(), "document uploaded");
        observe(PipelineEvent::Uploaded {
            document_id: &document_id,
        });

        observe(PipelineEvent::StageEntered(Stage::ParsingPoll));
        let document_resource = document_path(&document_id);
        let parsed = poll_until(
            &document_resource,
            self.policy,
            || self.service.fetch_resource(&document_resource),
            is_parsed,
            |p| observe(PipelineEvent::Polled(*p)),
        )
        .await
        .map_err(PipelineError::poll(Stage::ParsingPoll))?;
        let parsed_result = parsed.get("result").cloned().unwrap_or(Value::Null);
        tracing::info!(%document_id, "document parsed");
        observe(PipelineEvent::Parsed {
            result: &parsed_result,
        });

        observe(PipelineEvent::StageEntered(Stage::Standardizing));
        let standardization_id = self
            .service
            .request_standardization(&document_id, self.schema_id)
            .await
            .map_err(PipelineError::upstream(Stage::Standardizing))?;
        tracing::info!(%document_id, %standardization_id, schema_id = self.schema_id, "standardization requested");
        observe(PipelineEvent::StandardizationRequested {
            standardization_id: &standardization_id,
        });

        observe(PipelineEvent::StageEntered(Stage::StandardizationPoll));
        let standardization_resource = standardization_path(&standardization_id);
        let standardized = poll_until(
            &standardization_resource,
            self.policy,
            || self.service.fetch_resource(&standardization_resource),
            is_standardized,
            |p| observe(PipelineEvent::Polled(*p)),
        )
        .await
        .map_err(PipelineError::poll(Stage::StandardizationPoll))?;
        tracing::info!(%standardization_id, "standardized data ready");

        let schema_data = standardized.get("data").cloned().unwrap_or(Value::Null);
        Ok(PipelineReport {
            document_id,
            parsed_result,
            standardization_id,
            schema_data,
        })
    }
}
