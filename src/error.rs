/// Which external service produced an [`UpstreamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    DocuPipe,
    OpenAi,
    Claude,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Service::DocuPipe => "DocuPipe",
            Service::OpenAi => "OpenAI",
            Service::Claude => "Claude",
        };
        f.write_str(name)
    }
}

/// A failed call to one of the two HTTP integrations.
///
/// Transient and permanent failures are not distinguished; callers surface
/// every variant the same way.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} API error: {status} - {message}")]
    Api {
        service: Service,
        status: u16,
        message: String,
    },
    #[error("Parse error: {0}")]
    Parse(String),
}

impl UpstreamError {
    /// Build an `Api` error from a non-success response, consuming its body.
    pub(crate) async fn from_response(service: Service, resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        UpstreamError::Api {
            service,
            status,
            message,
        }
    }
}
