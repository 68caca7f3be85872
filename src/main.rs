use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use clap::builder::PossibleValuesParser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use uuid::Uuid;

use streamchat::chat::types::{DEFAULT_DEVELOPER_MESSAGE, DEFAULT_MODEL, Role, SUPPORTED_MODELS};
use streamchat::services::metrics::{MetricsRecorder, PerformanceStatus};
use streamchat::{
    ChatConfig, ChatController, ChatError, ChatSettings, ChatSnapshot, ConfigError, ControllerParts, ExchangeOutcome,
    HttpChatClient, SubmitRejection, ViewConfig,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("chat client setup failed: {0}")]
    Chat(#[from] ChatError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "streamchat", about = "Terminal client for a streaming chat endpoint")]
struct Cli {
    /// Overrides `CHAT_ENDPOINT`.
    #[arg(long)]
    endpoint: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, default_value = DEFAULT_MODEL, value_parser = PossibleValuesParser::new(SUPPORTED_MODELS))]
    model: String,

    #[arg(long, default_value = DEFAULT_DEVELOPER_MESSAGE)]
    developer_message: String,

    /// Print a metrics line after every completed exchange.
    #[arg(long)]
    show_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let mut chat_config = ChatConfig::from_env()?;
    if let Some(endpoint) = &cli.endpoint {
        chat_config = chat_config.with_endpoint(endpoint)?;
    }
    let view = ViewConfig::from_env()?;
    let transport = HttpChatClient::new(&chat_config)?;
    info!(endpoint = %transport.endpoint(), model = %cli.model, "streamchat ready");

    let mut parts = ControllerParts::new(Arc::new(transport));
    parts.view = view;
    parts.settings = ChatSettings {
        api_key: cli.api_key.clone().unwrap_or_default(),
        developer_message: cli.developer_message.clone(),
        model: cli.model.clone(),
    };
    let controller = ChatController::new(parts, |_| {
        let _ = io::stdout().flush();
    });

    if !controller.snapshot().settings.has_credential() {
        eprintln!("no API key set; pass --api-key or set OPENAI_API_KEY");
    }

    run_repl(&controller, cli.show_metrics).await
}

// =============================================================================
// REPL
// =============================================================================

async fn run_repl(controller: &ChatController, show_metrics: bool) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut renderer = Renderer::default();
    let mut stdout = io::stdout();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/settings" => print_settings(controller),
            "/metrics" => print_metrics(controller.metrics()),
            "/clear-metrics" => {
                controller.metrics().clear();
                println!("metrics cleared");
            }
            _ => {
                controller.set_input_text(line.as_str());
                let outcome = submit_and_render(controller, &mut renderer, &mut stdout).await?;
                report(&outcome, controller, show_metrics);
            }
        }
        prompt()?;
    }
    Ok(())
}

/// Drive one exchange while echoing every snapshot it publishes to `out`.
async fn submit_and_render(
    controller: &ChatController,
    renderer: &mut Renderer,
    out: &mut impl Write,
) -> io::Result<ExchangeOutcome> {
    let mut rx = controller.subscribe();
    let submit = controller.submit();
    tokio::pin!(submit);

    let outcome = loop {
        tokio::select! {
            outcome = &mut submit => break outcome,
            changed = rx.changed() => {
                if changed.is_err() {
                    break (&mut submit).await;
                }
                renderer.render(&rx.borrow_and_update(), out)?;
            }
        }
    };
    // A refused submit changed nothing worth echoing.
    if matches!(outcome, ExchangeOutcome::Rejected(_)) {
        return Ok(outcome);
    }
    renderer.render(&controller.snapshot(), out)?;
    renderer.finish(out)?;
    out.flush()?;
    Ok(outcome)
}

fn report(outcome: &ExchangeOutcome, controller: &ChatController, show_metrics: bool) {
    match outcome {
        // The failure text is already in the log.
        ExchangeOutcome::Rejected(SubmitRejection::EmptyInput) | ExchangeOutcome::Failed(_) => {}
        ExchangeOutcome::Rejected(reason) => eprintln!("not sent: {reason}"),
        ExchangeOutcome::Completed(_) => {
            if show_metrics {
                print_metrics(controller.metrics());
            }
        }
    }
}

fn prompt() -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()
}

fn print_settings(controller: &ChatController) {
    let visible = controller.toggle_settings_panel();
    if !visible {
        println!("settings hidden");
        return;
    }
    let settings = controller.snapshot().settings;
    let key = if settings.has_credential() {
        format!("...{}", settings.credential_suffix())
    } else {
        "(not set)".to_owned()
    };
    println!("model: {}", settings.model);
    println!("developer message: {}", settings.developer_message);
    println!("api key: {key}");
}

fn print_metrics(metrics: &MetricsRecorder) {
    let avg = metrics.average();
    println!(
        "render {:.1} ms | messages {:.0} | input length {:.0} | scroll {:.2} ms | {} ({} samples)",
        avg.render_time_ms,
        avg.message_count,
        avg.average_message_length,
        avg.scroll_performance_ms,
        PerformanceStatus::from_render_time(avg.render_time_ms),
        metrics.len(),
    );
}

// =============================================================================
// RENDERER
// =============================================================================

/// Prints assistant text incrementally as snapshots grow.
///
/// The id of the last printed message survives `finish`, so re-rendering a
/// message that is already on screen prints nothing.
#[derive(Default)]
struct Renderer {
    current: Option<Uuid>,
    printed: usize,
    line_open: bool,
}

impl Renderer {
    fn render(&mut self, snapshot: &ChatSnapshot, out: &mut impl Write) -> io::Result<()> {
        let Some(last) = snapshot.messages.last() else {
            return Ok(());
        };
        if last.role != Role::Assistant {
            return Ok(());
        }

        if self.current != Some(last.id) {
            if self.line_open {
                writeln!(out)?;
            }
            self.current = Some(last.id);
            self.printed = 0;
            self.line_open = true;
            write!(out, "ai> ")?;
        }
        if let Some(delta) = last.content.get(self.printed..)
            && !delta.is_empty()
        {
            write!(out, "{delta}")?;
            self.printed = last.content.len();
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut impl Write) -> io::Result<()> {
        if std::mem::take(&mut self.line_open) {
            writeln!(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
