// Framework bootstrap for the terminal chat client.

use crate::frameworks::config::ClientSettings;
use crate::interface_adapters::clients::BackendClient;
use crate::interface_adapters::input::{InputCommand, parse_line};
use crate::interface_adapters::utils::TokioSleeper;
use crate::interface_adapters::view::TerminalView;
use crate::use_cases::ChatController;

use std::io::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinSet;

fn init_runtime() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr so they never interleave with the rendered conversation.
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();
    let settings = ClientSettings::from_env();
    run(settings, tokio::io::stdin()).await
}

pub async fn run<R>(settings: ClientSettings, input: R) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let controller = build_controller(&settings)?;

    // A failed bootstrap has already rendered its notice; the client stays unusable.
    let (context, _worker) = controller
        .start()
        .await
        .map_err(|e| std::io::Error::other(format!("failed to start chat session: {e}")))?;
    tracing::debug!(user_id = %context.identity, "accepting input.");

    // Each gesture runs as its own task so input keeps flowing while a send is pending.
    let mut dispatches = JoinSet::new();
    let mut lines = BufReader::new(input).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line, settings.viewport_width) {
            InputCommand::Quit => return Ok(()),
            InputCommand::Event(event) => {
                let router = controller.router.clone();
                dispatches.spawn(async move { router.dispatch(event).await });
            }
        }
        // Reap finished dispatches without waiting on in-flight ones.
        while let Some(done) = dispatches.try_join_next() {
            if let Err(e) = done {
                tracing::error!(error = %e, "dispatch task failed");
            }
        }
    }

    // End of input: let in-flight sends settle before exiting.
    while let Some(done) = dispatches.join_next().await {
        if let Err(e) = done {
            tracing::error!(error = %e, "dispatch task failed");
        }
    }
    Ok(())
}

fn build_controller(settings: &ClientSettings) -> Result<Arc<ChatController>> {
    let backend = BackendClient::new(
        settings.backend_url.clone(),
        settings.request_timeout,
        settings.backend_cookie.as_deref(),
    )
    .map_err(|e| std::io::Error::other(format!("failed to initialize backend client: {e}")))?;
    tracing::debug!(
        backend_url = %backend.base_url,
        request_timeout_ms = settings.request_timeout.as_millis(),
        reservation_attempts = settings.retry_policy.max_attempts,
        "backend client configured"
    );

    Ok(Arc::new(ChatController::new(
        Arc::new(backend),
        Arc::new(TerminalView::stdout()),
        Arc::new(TokioSleeper),
        settings.retry_policy,
    )))
}
