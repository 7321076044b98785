//! Terminal customer-support assistant powered by helpdesk-rs.
//!
//! Reads the Groq API key from `--api-key` or `GROQ_API_KEY` (a `.env` file
//! in the working directory is loaded first).
//!
//! # Examples
//!
//! ```sh
//! # Interactive chat
//! helpdesk
//!
//! # Show tool calls and log lines
//! helpdesk --verbose
//! ```

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use helpdesk_rs::agent::events::{
    CompositeEventHandler, FnEventHandler, HarnessEvent, LoggingHandler,
};
use helpdesk_rs::clock::SystemClock;
use helpdesk_rs::{ChatClient, DEFAULT_MODEL, GROQ_URL};
use helpdesk_support::SupportConfig;
use helpdesk_support::tools::fold_text;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const GREETING: &str = "🤖 Müşteri Destek Botuna Hoş Geldiniz! (Çıkmak için 'exit' yazın)";
const FAREWELL: &str = "👋 Görüşmek üzere!";
/// Compared after [`fold_text`], so `çıkış` and `ÇIKIŞ` both match.
const EXIT_WORDS: &[&str] = &["exit", "quit", "cikis"];

/// Terminal customer-support assistant powered by helpdesk-rs.
#[derive(Parser)]
#[command(name = "helpdesk")]
struct Cli {
    /// Groq API key.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Model to use for completions.
    #[arg(long, env = "HELPDESK_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat completions endpoint.
    #[arg(long, default_value = GROQ_URL)]
    endpoint: String,

    /// Sampling temperature.
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,

    /// Maximum tokens per LLM response.
    #[arg(long, default_value_t = 1024)]
    max_tokens: u32,

    /// Timeout for one model call, in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Maximum model rounds per message.
    #[arg(long, default_value_t = 3)]
    max_rounds: u32,

    /// Session id the conversation is stored under.
    #[arg(long, default_value = "cli")]
    session: String,

    /// Print the tool calls behind each answer and log at INFO.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = match ChatClient::new(cli.api_key) {
        Ok(c) => c.with_endpoint(cli.endpoint),
        Err(e) => {
            eprintln!("Error: failed to create API client: {e}");
            std::process::exit(1);
        }
    };

    let config = SupportConfig {
        model: cli.model,
        temperature: cli.temperature,
        max_tokens: cli.max_tokens,
        timeout_secs: cli.timeout_secs,
        max_rounds: cli.max_rounds,
        ..Default::default()
    };

    let service = match config.build_service(Arc::new(client), Arc::new(SystemClock)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    let handler = CompositeEventHandler::new()
        .with(LoggingHandler)
        .with_if(cli.verbose, FnEventHandler::new(print_step));
    let service = service.with_event_handler(Arc::new(handler));

    println!("{GREETING}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\n🧑‍💻 Siz: ");
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => Ok(None),
        };
        let input = match line {
            Ok(Some(l)) => l,
            Ok(None) => {
                println!("\n{FAREWELL}");
                break;
            }
            Err(e) => {
                eprintln!("Error: failed to read input: {e}");
                std::process::exit(1);
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&fold_text(input).as_str()) {
            println!("{FAREWELL}");
            break;
        }

        // Ctrl-C while the agent is working ends the current request only.
        let stop = Arc::new(AtomicBool::new(false));
        let watcher = {
            let stop = stop.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    stop.store(true, Ordering::Relaxed);
                }
            })
        };
        let reply = service
            .handle_with_stop(&cli.session, input, move || stop.load(Ordering::Relaxed))
            .await;
        watcher.abort();

        println!("\n🤖 Bot: {}", reply.final_text);
    }
}

/// Prints each tool call and its result as the agent works.
fn print_step(event: &HarnessEvent<'_>) {
    match event {
        HarnessEvent::ToolCallsReceived { .. } => {
            println!("\n⚙️ Agent Çalışma Adımları");
        }
        HarnessEvent::ToolExecuting { name, arguments } => {
            let arguments = serde_json::to_string(arguments).unwrap_or_default();
            println!("  🛠️ Araç Çağrıldı: {name}");
            println!("  📥 Parametreler: {arguments}");
        }
        HarnessEvent::ToolResult { result, .. } => {
            println!("  🔍 Araç Sonucu: {}", result.to_observation());
        }
        _ => {}
    }
}
