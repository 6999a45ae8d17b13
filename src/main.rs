use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docupipe_inspector_lib::commands::chat::{ask_question, render_transcript};
use docupipe_inspector_lib::commands::flow::run_flow;
use docupipe_inspector_lib::commands::{AppState, CommandError};
use docupipe_inspector_lib::{init_tracing, Config, Settings};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(
    name = "docupipe-inspector",
    version,
    about = "Standardize a document with DocuPipe and ask questions about the result"
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a PDF or image, standardize it, then answer questions about it
    Run {
        /// Document to upload
        file: PathBuf,

        /// Question to ask once the schema is ready (repeatable); without any,
        /// questions are read from stdin until EOF or /quit (/history reprints the chat)
        #[arg(short, long = "question")]
        questions: Vec<String>,
    },
    /// Print the resolved configuration with API keys masked
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::from_settings(cli.settings).context("invalid configuration")?;

    match cli.command {
        Command::Config => {
            println!("{:#?}", config);
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { file, questions } => run(&config, file, questions).await,
    }
}

async fn run(config: &Config, file: PathBuf, questions: Vec<String>) -> anyhow::Result<ExitCode> {
    let mut state = AppState::from_config(config);
    let mut stdout = std::io::stdout();

    match run_flow(&mut state, &file, &mut stdout).await {
        Ok(_) => {}
        Err(CommandError::Io(e)) => {
            return Err(anyhow::Error::new(e).context(format!("cannot read {}", file.display())));
        }
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    }

    if !questions.is_empty() {
        for question in &questions {
            println!("you> {}", question);
            if let Err(e) = ask_question(&mut state, question, &mut stdout).await {
                eprintln!("error: {}", e);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let interactive = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            print!("you> ");
            stdout.flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question == "/quit" {
            break;
        }
        if question == "/history" {
            render_transcript(state.session.transcript(), &mut stdout)?;
            continue;
        }
        if question.is_empty() {
            continue;
        }
        if let Err(e) = ask_question(&mut state, question, &mut stdout).await {
            eprintln!("error: {}", e);
        }
    }

    Ok(ExitCode::SUCCESS)
}
