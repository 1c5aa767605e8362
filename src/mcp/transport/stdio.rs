use anyhow::{Context, Result};
use futures::StreamExt;
use rmcp::model::ClientJsonRpcMessage;
use rmcp::ServiceExt as _;
use serde_json::Value;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use crate::mcp::error::{error_response, invalid_request, parse_error};
use crate::mcp::HarborMcp;

/// Longest accepted message line
const MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;
const PIPE_CAPACITY: usize = 64 * 1024;

/// One inbound line, or why it could not be read
#[derive(Debug, PartialEq)]
enum Frame {
    Line(String),
    Unreadable(&'static str),
}

/// [`LinesCodec`] that turns oversized and non-UTF-8 lines into frames.
/// `FramedRead` ends the stream after any decoder error.
struct MessageLines {
    inner: LinesCodec,
}

impl MessageLines {
    fn new() -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(MAX_MESSAGE_BYTES),
        }
    }

    fn recover(result: Result<Option<String>, LinesCodecError>) -> io::Result<Option<Frame>> {
        match result {
            Ok(line) => Ok(line.map(Frame::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Ok(Some(Frame::Unreadable("line exceeds the maximum message size")))
            }
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Ok(Some(Frame::Unreadable("line is not valid UTF-8")))
            }
            Err(LinesCodecError::Io(e)) => Err(e),
        }
    }
}

impl Decoder for MessageLines {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<Frame>> {
        Self::recover(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> io::Result<Option<Frame>> {
        Self::recover(self.inner.decode_eof(buf))
    }
}

/// What to do with an inbound frame
#[derive(Debug, PartialEq)]
enum Screened {
    /// Hand the line to the session
    Forward(String),
    /// Answer directly with this response line
    Reply(String),
    Skip,
}

/// Only well-formed client messages reach the session, which would otherwise
/// close on the first line it cannot decode.
fn screen(frame: Frame) -> Screened {
    let line = match frame {
        Frame::Line(line) => line,
        Frame::Unreadable(reason) => {
            return Screened::Reply(error_response(Value::Null, parse_error(reason)))
        }
    };
    if line.trim().is_empty() {
        return Screened::Skip;
    }

    let value: Value = match serde_json::from_str(&line) {
        Ok(value) => value,
        Err(e) => return Screened::Reply(error_response(Value::Null, parse_error(e))),
    };

    if let Some(id) = value.get("id") {
        if !(id.is_string() || id.is_number()) {
            return Screened::Reply(error_response(
                id.clone(),
                invalid_request("id must be a string or number"),
            ));
        }
    }

    match serde_json::from_value::<ClientJsonRpcMessage>(value.clone()) {
        Ok(_) => Screened::Forward(line),
        Err(e) => match value.as_object().map(|message| message.get("id")) {
            // notifications are never answered
            Some(None) => {
                debug!("Dropping malformed notification: {}", e);
                Screened::Skip
            }
            Some(Some(id)) => Screened::Reply(error_response(id.clone(), invalid_request(e))),
            None => Screened::Reply(error_response(Value::Null, invalid_request(e))),
        },
    }
}

/// Serve MCP on stdin/stdout until stdin closes
pub async fn serve_stdio(handler: HarborMcp) -> Result<()> {
    info!("Serving MCP over stdio");
    serve(handler, tokio::io::stdin(), tokio::io::stdout()).await?;
    info!("stdin closed, shutting down");
    Ok(())
}

/// Run one MCP session over newline-delimited JSON-RPC. Returns once the
/// session has ended and every response has been written.
pub async fn serve<R, W>(handler: HarborMcp, reader: R, writer: W) -> Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (session_end, pump_end) = tokio::io::duplex(PIPE_CAPACITY);
    let (from_session, to_session) = tokio::io::split(pump_end);
    let (out_tx, out_rx) = mpsc::channel::<String>(64);

    let writer_task = tokio::spawn(write_lines(writer, out_rx));
    let outbound = tokio::spawn(forward_responses(from_session, out_tx.clone()));
    let inbound = tokio::spawn(forward_requests(reader, to_session, out_tx));

    let result = run_session(handler, session_end).await;

    // stdin may still be open if the client ended the session
    inbound.abort();
    if let Ok(Err(e)) = inbound.await {
        warn!("Failed to read input: {:#}", e);
    }
    outbound
        .await
        .context("Response forwarder panicked")?
        .context("Failed to read session output")?;
    writer_task
        .await
        .context("Response writer panicked")?
        .context("Failed to write response")?;

    result
}

async fn run_session(handler: HarborMcp, transport: tokio::io::DuplexStream) -> Result<()> {
    let session = handler
        .serve(tokio::io::split(transport))
        .await
        .context("MCP session failed to initialize")?;
    let reason = session.waiting().await.context("MCP session task failed")?;
    debug!(?reason, "MCP session ended");
    Ok(())
}

async fn forward_requests<R, W>(reader: R, mut session: W, out: mpsc::Sender<String>) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut frames = FramedRead::new(reader, MessageLines::new());
    while let Some(frame) = frames.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to read message: {}", e);
                break;
            }
        };
        match screen(frame) {
            Screened::Forward(line) => {
                session.write_all(line.as_bytes()).await?;
                session.write_all(b"\n").await?;
                session.flush().await?;
            }
            Screened::Reply(response) => {
                if out.send(response).await.is_err() {
                    break;
                }
            }
            Screened::Skip => {}
        }
    }
    session.shutdown().await?;
    Ok(())
}

async fn forward_responses<R>(session: R, out: mpsc::Sender<String>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(session, LinesCodec::new());
    while let Some(line) = lines.next().await {
        if out.send(line?).await.is_err() {
            debug!("Output closed before response was written");
            break;
        }
    }
    Ok(())
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::Receiver<String>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harbor::models::HarborProject;
    use crate::harbor::testing::FakeRegistry;
    use crate::service::RegistryService;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    const PING: &str = r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#;

    fn handler() -> HarborMcp {
        HarborMcp::new(RegistryService::new(Arc::new(FakeRegistry {
            projects: vec![HarborProject {
                project_id: 1,
                name: "test-project".to_string(),
                ..Default::default()
            }],
            ..FakeRegistry::new()
        })))
    }

    fn reply(screened: Screened) -> Value {
        match screened {
            Screened::Reply(line) => serde_json::from_str(&line).unwrap(),
            other => panic!("expected a reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reading_continues_after_invalid_utf8() {
        let input = [&b"\xff\xfe garbage\n"[..], PING.as_bytes(), b"\n"].concat();
        let frames: Vec<Frame> = FramedRead::new(&input[..], MessageLines::new())
            .map(|frame| frame.unwrap())
            .collect()
            .await;
        assert_eq!(
            frames,
            vec![
                Frame::Unreadable("line is not valid UTF-8"),
                Frame::Line(PING.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_reading_continues_after_oversized_line() {
        let oversized = "x".repeat(MAX_MESSAGE_BYTES + 10);
        let input = format!("{}\n{}\n", oversized, PING);
        let frames: Vec<Frame> = FramedRead::new(input.as_bytes(), MessageLines::new())
            .map(|frame| frame.unwrap())
            .collect()
            .await;
        assert_eq!(
            frames,
            vec![
                Frame::Unreadable("line exceeds the maximum message size"),
                Frame::Line(PING.to_string()),
            ]
        );
    }

    #[test]
    fn test_unreadable_line_gets_parse_error() {
        let response = reply(screen(Frame::Unreadable("line is not valid UTF-8")));
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], json!(-32700));
    }

    #[test]
    fn test_malformed_json_gets_parse_error() {
        let response = reply(screen(Frame::Line("not json".to_string())));
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], json!(-32700));
    }

    #[test]
    fn test_null_id_request_is_answered() {
        let response = reply(screen(Frame::Line(
            r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#.to_string(),
        )));
        assert!(response.as_object().unwrap().contains_key("id"));
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], json!(-32600));

        let response = reply(screen(Frame::Line(
            r#"{"jsonrpc":"2.0","id":{"n":1},"method":"ping"}"#.to_string(),
        )));
        assert_eq!(response["id"], json!({"n": 1}));
        assert_eq!(response["error"]["code"], json!(-32600));
    }

    #[test]
    fn test_non_object_message_is_invalid_request() {
        let response = reply(screen(Frame::Line("42".to_string())));
        assert_eq!(response["error"]["code"], json!(-32600));
    }

    #[test]
    fn test_valid_and_blank_lines() {
        assert_eq!(
            screen(Frame::Line(PING.to_string())),
            Screened::Forward(PING.to_string())
        );
        assert_eq!(screen(Frame::Line("   ".to_string())), Screened::Skip);
    }

    /// Full session over in-memory pipes: a garbage line is answered, then the
    /// handshake, a ping and tool calls go through the same session
    #[tokio::test]
    async fn test_session_survives_garbage_line() {
        let (mut client_in, server_in) = tokio::io::duplex(PIPE_CAPACITY);
        let (server_out, client_out) = tokio::io::duplex(PIPE_CAPACITY);
        let server = tokio::spawn(serve(handler(), server_in, server_out));

        let messages = [
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"0.0.0"}}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            PING,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"prune_everything","arguments":{}}}"#,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"get_project","arguments":{}}}"#,
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"get_project","arguments":{"projectId":1}}}"#,
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/list"}"#,
        ];
        client_in.write_all(b"\xff\xfe garbage\n").await.unwrap();
        for message in messages {
            client_in.write_all(message.as_bytes()).await.unwrap();
            client_in.write_all(b"\n").await.unwrap();
        }

        let mut lines = FramedRead::new(client_out, LinesCodec::new());
        let mut by_id: HashMap<String, Value> = HashMap::new();
        while by_id.len() < 7 {
            let line = tokio::time::timeout(Duration::from_secs(10), lines.next())
                .await
                .expect("timed out waiting for a response")
                .expect("output closed early")
                .unwrap();
            let response: Value = serde_json::from_str(&line).unwrap();
            by_id.insert(response["id"].to_string(), response);
        }

        assert_eq!(by_id["null"]["error"]["code"], json!(-32700));
        assert_eq!(by_id["1"]["result"]["serverInfo"]["name"], json!("harbor-mcp"));
        assert_eq!(by_id["2"]["result"], json!({}));

        assert_eq!(by_id["3"]["error"]["code"], json!(-32601));
        assert_eq!(
            by_id["3"]["error"]["message"],
            json!("Unknown tool: prune_everything")
        );

        assert_eq!(by_id["4"]["error"]["code"], json!(-32602));
        let message = by_id["4"]["error"]["message"].as_str().unwrap();
        assert!(message.contains("projectId"), "{}", message);

        let text = by_id["5"]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("test-project"), "{}", text);

        let tools = by_id["6"]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 11);
        assert_eq!(tools[0]["name"], json!("list_projects"));

        drop(client_in);
        tokio::time::timeout(Duration::from_secs(10), server)
            .await
            .expect("server did not stop after input closed")
            .unwrap()
            .unwrap();
    }
}
