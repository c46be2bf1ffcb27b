//! Line-delimited JSON gateway: one request per line in, one response per
//! line out.

use anyhow::Result;
use hubgate_tools::{Dispatcher, ErrorBody, InvocationRequest, InvocationResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum Request {
    ListTools {
        #[serde(default)]
        id: Value,
    },
    CallTool {
        #[serde(default)]
        id: Value,
        params: InvocationRequest,
    },
}

fn malformed(id: Value, message: String) -> Value {
    let body = ErrorBody {
        error_kind: "validation".to_string(),
        message,
        details: None,
    };
    json!({ "id": id, "response": body })
}

/// Answer one request line.
pub async fn handle_line(dispatcher: &Dispatcher, line: &str) -> Value {
    let raw: Value = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => return malformed(Value::Null, format!("Malformed request: {e}")),
    };
    let id = raw.get("id").cloned().unwrap_or(Value::Null);

    match serde_json::from_value::<Request>(raw) {
        Ok(Request::ListTools { id }) => json!({ "id": id, "tools": dispatcher.catalog() }),
        Ok(Request::CallTool { id, params }) => {
            let response: InvocationResponse = dispatcher.handle(params).await;
            json!({ "id": id, "response": response })
        }
        Err(e) => malformed(id, format!("Invalid request: {e}")),
    }
}

pub async fn serve<R, W>(dispatcher: &Dispatcher, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Serving {} tools on stdio", dispatcher.catalog().len());
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Request: {}", line);
        let response = handle_line(dispatcher, &line).await;
        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
    }
    info!("Input closed, shutting down");
    Ok(())
}
