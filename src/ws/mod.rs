//! WebSocket duplex loop (§4.8): two cooperating tasks, one reading
//! inbound frames to stdout, one writing outbound frames from stdin or
//! a single `--data` payload, joined by a termination signal.

use crate::error::{FetchError, Result};
use crate::format;
use crate::printer::color::ColorMode;
use crate::printer::Printer;
use crate::response::classify::ContentType;
use anyhow::anyhow;
use futures_util::{SinkExt, StreamExt};
use std::io::IsTerminal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

/// Runs the duplex loop to completion: connects, spawns inbound/outbound
/// tasks, and returns once either the server closes the connection or a
/// SIGINT-triggered close frame has been sent and acknowledged.
pub async fn run(url: &str, initial_data: Option<Vec<u8>>, format_on: bool) -> Result<()> {
    let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| anyhow!(FetchError::Transport(format!("websocket connect failed: {e}"))))?;
    let (mut write, mut read) = ws_stream.split();

    let (done_tx, mut done_rx) = oneshot::channel::<()>();

    let inbound = tokio::spawn(async move {
        let mut stdout = Printer::new(std::io::stdout(), ColorMode::Off);
        loop {
            tokio::select! {
                _ = &mut done_rx => break,
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            render_inbound(&mut stdout, text.as_bytes(), format_on);
                        }
                        Some(Ok(Message::Binary(bytes))) => {
                            render_inbound(&mut stdout, &bytes, format_on);
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(_)) => break,
                    }
                }
            }
        }
    });

    if let Some(data) = initial_data {
        write
            .send(Message::Text(String::from_utf8_lossy(&data).into_owned().into()))
            .await
            .map_err(|e| anyhow!(FetchError::Transport(format!("websocket send failed: {e}"))))?;
    } else if !std::io::stdin().is_terminal() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if write.send(Message::Text(line.into())).await.is_err() {
                break;
            }
        }
    }

    let _ = write.send(Message::Close(None)).await;
    let _ = done_tx.send(());
    let _ = inbound.await;
    Ok(())
}

fn render_inbound<W: std::io::Write>(printer: &mut Printer<W>, bytes: &[u8], format_on: bool) {
    if format_on {
        let content_type = classify_text(bytes);
        if format::dispatch_buffered(printer, content_type, bytes).is_ok() {
            return;
        }
    }
    let _ = printer.write_raw(bytes);
    let _ = printer.newline();
    let _ = printer.flush();
}

fn classify_text(bytes: &[u8]) -> ContentType {
    let trimmed = bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .copied()
        .unwrap_or(0);
    if trimmed == b'{' || trimmed == b'[' {
        ContentType::Json
    } else {
        ContentType::Unknown
    }
}

/// A non-GET method used against a `ws://`/`wss://` URL is coerced to
/// GET with a warning (§4.8); this returns `true` when coercion applies.
pub fn should_coerce_to_get(method: &str, url: &url::Url) -> bool {
    matches!(url.scheme(), "ws" | "wss") && !method.eq_ignore_ascii_case("GET")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_get_method_on_ws_url_is_coerced() {
        let url = url::Url::parse("ws://example.com/socket").unwrap();
        assert!(should_coerce_to_get("POST", &url));
        assert!(!should_coerce_to_get("GET", &url));
    }

    #[test]
    fn http_url_never_coerces() {
        let url = url::Url::parse("https://example.com").unwrap();
        assert!(!should_coerce_to_get("POST", &url));
    }

    #[test]
    fn json_text_frame_is_classified_as_json() {
        assert_eq!(classify_text(b"  {\"a\":1}"), ContentType::Json);
        assert_eq!(classify_text(b"plain text"), ContentType::Unknown);
    }
}
