//! Line-oriented JSON frontend.
//!
//! Reads one request per line from stdin and writes one response per line to
//! stdout. Requests are enqueued in the order they are read, so commands for
//! the same repository keep their arrival order; responses are written as
//! commands complete and carry the request `id` for correlation.
//!
//! ```text
//! {"id":1,"repo":"/src/app","command":{"kind":"status"}}
//! {"id":1,"ok":true,"output":{"kind":"status","data":{...}}}
//! ```

use crate::core::{
    command::{CommandOutput, GitCommand},
    error::{ErrorKind, Result, SyncError},
};
use crate::service::Dispatcher;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

#[derive(Debug, Deserialize)]
pub struct ServeRequest {
    #[serde(default)]
    pub id: Value,
    pub repo: PathBuf,
    pub command: GitCommand,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl From<&SyncError> for ErrorBody {
    fn from(err: &SyncError) -> Self {
        ErrorBody {
            kind: err.kind(),
            message: err.to_string(),
            diagnostic: err.diagnostic().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ServeResponse {
    pub id: Value,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<CommandOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ServeResponse {
    pub fn from_result(id: Value, result: Result<CommandOutput>) -> Self {
        match result {
            Ok(output) => ServeResponse {
                id,
                ok: true,
                output: Some(output),
                error: None,
            },
            Err(err) => ServeResponse {
                id,
                ok: false,
                output: None,
                error: Some(ErrorBody::from(&err)),
            },
        }
    }

    fn invalid_request(message: String) -> Self {
        ServeResponse {
            id: Value::Null,
            ok: false,
            output: None,
            error: Some(ErrorBody {
                kind: ErrorKind::Internal,
                message,
                diagnostic: None,
            }),
        }
    }
}

pub async fn execute_serve(dispatcher: &Dispatcher) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<ServeResponse>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_vec(&response)?;
            line.push(b'\n');
            stdout.write_all(&line).await?;
            stdout.flush().await?;
        }
        Ok::<_, SyncError>(())
    });

    let mut replies = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request: ServeRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!("rejecting malformed request: {e}");
                let _ = tx.send(ServeResponse::invalid_request(format!("invalid request: {e}")));
                continue;
            }
        };

        debug!("request {} for {}: {}", request.id, request.repo.display(), request.command);
        let timeout = request.timeout_secs.map(Duration::from_secs);
        let submitted = dispatcher
            .submit(&request.repo, request.command, timeout)
            .await;

        let tx = tx.clone();
        let id = request.id;
        match submitted {
            Ok(reply) => {
                replies.spawn(async move {
                    let result = reply.await.unwrap_or(Err(SyncError::WorkerStopped));
                    let _ = tx.send(ServeResponse::from_result(id, result));
                });
            }
            Err(err) => {
                let _ = tx.send(ServeResponse::from_result(id, Err(err)));
            }
        }
    }

    while replies.join_next().await.is_some() {}
    drop(tx);
    writer.await.map_err(|_| SyncError::WorkerStopped)??;
    Ok(())
}
