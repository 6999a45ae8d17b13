//! Questions about the published schema data.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::llm::{ChatMessage, TextGenerator};
use crate::session::Session;

/// Cap on the serialized schema embedded in a prompt, in characters.
pub const MAX_SCHEMA_CHARS: usize = 30_000;

const PREAMBLE: &str = "You are an AI analyst.  Use ONLY the JSON provided below.";

#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("no standardized schema has been published yet")]
    NoSchema,
    #[error("question is empty")]
    EmptyQuestion,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Single-line JSON with a space after every `,` and `:`.
struct SpacedSeparators;

impl Formatter for SpacedSeparators {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Object keys keep the order the service sent them in.
pub fn schema_json(schema_data: &Value) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedSeparators);
    if schema_data.serialize(&mut ser).is_err() {
        return schema_data.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| schema_data.to_string())
}

/// [`schema_json`] cut at [`MAX_SCHEMA_CHARS`].
///
/// The cut is by character count and may land inside a string or token;
/// the result is not guaranteed to be valid JSON.
pub fn truncated_schema_json(schema_data: &Value) -> String {
    let json = schema_json(schema_data);
    match json.char_indices().nth(MAX_SCHEMA_CHARS) {
        Some((byte_idx, _)) => json[..byte_idx].to_string(),
        None => json,
    }
}

pub fn build_prompt(question: &str, schema_data: &Value) -> String {
    format!(
        "{}\n\nQuestion: {}\n\nJSON:\n{}",
        PREAMBLE,
        question,
        truncated_schema_json(schema_data)
    )
}

/// Ask one question about the session's schema data.
///
/// The user turn is recorded before the generator is called. A failed call
/// leaves that turn in place and adds no assistant turn.
pub async fn ask<G: TextGenerator + ?Sized>(
    session: &mut Session,
    generator: &G,
    question: &str,
) -> Result<String, QaError> {
    if question.trim().is_empty() {
        return Err(QaError::EmptyQuestion);
    }
    let prompt = match session.schema_data() {
        Some(schema_data) => build_prompt(question, schema_data),
        None => return Err(QaError::NoSchema),
    };

    session.push_turn(ChatMessage::user(question));

    match generator.complete_chat(&prompt).await {
        Ok(answer) => {
            tracing::info!(
                session_id = %session.id(),
                turns = session.transcript().len() + 1,
                "question answered"
            );
            session.push_turn(ChatMessage::assistant(answer.clone()));
            Ok(answer)
        }
        Err(err) => {
            tracing::warn!(session_id = %session.id(), error = %err, "completion failed");
            Err(err.into())
        }
    }
}
