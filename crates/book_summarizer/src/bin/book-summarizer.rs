use std::time::Duration;

use anyhow::Context;
use book_summarizer::{
    gemini::GeminiClient, tracing::init_tracing_subscriber, view, Summarizer, SummaryController,
};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(name = "book-summarizer", about = "5-minute book summaries powered by Gemini")]
struct Cli {
    /// Gemini API key. A missing key is reported when a summary is requested
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model used for summaries
    #[arg(long, env = "GEMINI_MODEL", default_value = GeminiClient::SUMMARIZER_MODEL)]
    model: String,

    /// Override for the Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a single title and exit
    Summarize {
        /// Book title
        title: String,
    },
    /// Prompt for titles until `:q` or end of input
    Interactive,
}

fn build_client(cli: &Cli) -> GeminiClient {
    let client = GeminiClient::new(cli.api_key.clone().unwrap_or_default()).with_model(&cli.model);

    match &cli.base_url {
        Some(url) => client.with_base_url(url),
        None => client,
    }
}

/// Settles the pending request while drawing a spinner on stderr.
async fn settle_with_spinner(controller: &mut SummaryController<GeminiClient>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(120));
    let mut spinner = view::Spinner::default();

    while controller.is_loading() {
        tokio::select! {
            _ = controller.settle() => {}
            _ = ticker.tick() => eprint!("{}", spinner.next_frame()),
        }
    }
    if let Some(clear) = spinner.clear() {
        eprint!("{clear}");
    }
}

async fn run_once(controller: &mut SummaryController<GeminiClient>, title: String) -> anyhow::Result<()> {
    controller.on_change(title);
    controller.on_submit();
    settle_with_spinner(controller).await;

    println!("{}", view::render(controller.state()));

    if controller.error().is_some() {
        anyhow::bail!("summary was not generated");
    }
    Ok(())
}

async fn run_interactive(controller: &mut SummaryController<GeminiClient>) -> anyhow::Result<()> {
    println!("{}\n", view::banner());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"Book title> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read title")? else {
            break;
        };
        if line.trim() == ":q" {
            break;
        }

        controller.on_change(line);
        controller.on_submit();
        settle_with_spinner(controller).await;

        println!("\n{}\n", view::render(controller.state()));
    }

    println!("\n{}", view::footer());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let mut controller = SummaryController::new(build_client(&cli));

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Summarize { title } => {
            tracing::info!(model = %cli.model, "Summarizing single title");
            run_once(&mut controller, title).await?;
        }
        Command::Interactive => {
            tracing::info!(model = %cli.model, "Starting interactive session");
            run_interactive(&mut controller).await?;
        }
    }

    Ok(())
}
