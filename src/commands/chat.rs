use std::io::Write;

use super::{AppState, CommandError};
use crate::docupipe::DocumentService;
use crate::llm::{ChatMessage, TextGenerator};
use crate::qa;

/// Ask about the published schema and print the answer.
pub async fn ask_question<D, G, W>(
    state: &mut AppState<D, G>,
    question: &str,
    out: &mut W,
) -> Result<String, CommandError>
where
    D: DocumentService,
    G: TextGenerator,
    W: Write,
{
    let answer = qa::ask(&mut state.session, &state.generator, question).await?;
    writeln!(out, "assistant> {}", answer)?;
    Ok(answer)
}

pub fn render_transcript<W: Write>(transcript: &[ChatMessage], out: &mut W) -> std::io::Result<()> {
    for message in transcript {
        writeln!(out, "{}> {}", message.role.as_str(), message.content)?;
    }
    Ok(())
}
