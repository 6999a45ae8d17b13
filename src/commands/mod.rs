pub mod chat;
pub mod flow;

use crate::config::Config;
use crate::docupipe::{DocuPipeClient, DocumentService};
use crate::llm::{ChatClient, TextGenerator};
use crate::pipeline::PipelineError;
use crate::poller::PollPolicy;
use crate::qa::QaError;
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("run aborted during {stage}: {0}", stage = .0.stage())]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Qa(#[from] QaError),
}

/// One session plus the two services it talks to.
pub struct AppState<D, G> {
    pub documents: D,
    pub generator: G,
    pub schema_id: String,
    pub poll: PollPolicy,
    pub session: Session,
}

impl AppState<DocuPipeClient, ChatClient> {
    pub fn from_config(config: &Config) -> Self {
        let generator = ChatClient::new(&config.llm);
        tracing::info!(
            provider = generator.provider().name(),
            model = generator.model(),
            schema_id = %config.docupipe.schema_id,
            "services configured"
        );
        Self::new(
            DocuPipeClient::new(&config.docupipe),
            generator,
            config.docupipe.schema_id.clone(),
            config.poll,
        )
    }
}

impl<D: DocumentService, G: TextGenerator> AppState<D, G> {
    pub fn new(documents: D, generator: G, schema_id: String, poll: PollPolicy) -> Self {
        let session = Session::new();
        tracing::info!(session_id = %session.id(), "session started");
        Self {
            documents,
            generator,
            schema_id,
            poll,
            session,
        }
    }
}
