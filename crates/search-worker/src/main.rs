//! Search worker process
//!
//! Reads one JSON request per line on stdin and writes one JSON response per
//! line on stdout. Logs go to stderr so they never mix with replies.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

use search_worker::{spawn_from_config, SearchConfig, WorkerRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let _ = dotenvy::dotenv();

    let config = SearchConfig::from_env();
    let mut handle = spawn_from_config(&config).await?;
    info!(strategy = handle.name(), "Search worker started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed, shutting down");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<WorkerRequest>(&line) {
                    Ok(request) => handle.send(request).await?,
                    Err(e) => warn!(error = %e, "Ignoring malformed request"),
                }
            }
            response = handle.recv() => {
                let Some(response) = response else {
                    error!("Worker task stopped");
                    break;
                };
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
        }
    }

    Ok(())
}
