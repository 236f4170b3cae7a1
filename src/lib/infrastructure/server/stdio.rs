use super::error::ServerError;
use crate::rpc::{McpService, RpcNotification};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub async fn serve(service: Arc<McpService>, shutdown: CancellationToken) -> Result<(), ServerError> {
    info!("Serving MCP over stdio");
    serve_lines(service, BufReader::new(io::stdin()), io::stdout(), shutdown).await
}

/// Newline-delimited JSON-RPC loop over any reader/writer pair.
///
/// Ends on EOF (after in-flight requests finish) or on `shutdown`
/// (in-flight requests are aborted).
pub async fn serve_lines<R, W>(
    service: Arc<McpService>,
    reader: R,
    writer: W,
    shutdown: CancellationToken,
) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbound, inbound) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(write_loop(writer, inbound));

    let mut lines = reader.lines();
    let mut changes = service.router().subscribe();
    let mut watching = true;
    let mut requests = JoinSet::new();

    let outcome = loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Shutdown requested; aborting in-flight stdio requests");
                requests.abort_all();
                break Ok(());
            }
            changed = changes.changed(), if watching => match changed {
                Ok(()) => {
                    changes.borrow_and_update();
                    if service.is_initialized() {
                        send(&outbound, &RpcNotification::tools_list_changed());
                    }
                }
                Err(_) => watching = false,
            },
            Some(joined) = requests.join_next(), if !requests.is_empty() => {
                log_join(joined);
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let service = service.clone();
                    let outbound = outbound.clone();
                    requests.spawn(async move {
                        if let Some(response) = service.handle_message(&line).await {
                            send(&outbound, &response);
                        }
                    });
                }
                Ok(None) => {
                    info!("stdin closed; stopping stdio transport");
                    break Ok(());
                }
                Err(err) => break Err(ServerError::Stdio(err)),
            },
        }
    };

    let mut aborted = shutdown.is_cancelled();
    loop {
        tokio::select! {
            _ = shutdown.cancelled(), if !aborted => {
                requests.abort_all();
                aborted = true;
            }
            joined = requests.join_next() => match joined {
                Some(joined) => log_join(joined),
                None => break,
            },
        }
    }

    drop(outbound);
    match writer_task.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "stdout writer stopped early"),
        Err(err) => error!(error = %err, "stdout writer task failed"),
    }
    outcome
}

fn send<T: Serialize>(outbound: &mpsc::UnboundedSender<String>, message: &T) {
    match serde_json::to_string(message) {
        Ok(line) => {
            if outbound.send(line).is_err() {
                debug!("stdout writer closed; dropping message");
            }
        }
        Err(err) => error!(error = %err, "Failed to serialize outbound message"),
    }
}

async fn write_loop<W>(mut writer: W, mut inbound: mpsc::UnboundedReceiver<String>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = inbound.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(err) = joined {
        if err.is_panic() {
            error!(error = %err, "stdio request handler panicked");
        }
    }
}
