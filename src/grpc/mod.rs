//! gRPC framing and client/response streaming (§3 GrpcFrame, §4.4).

pub mod frame;
pub mod status;

pub use frame::{read_frame, unframe, Frame};
pub use status::grpc_status_name;

use crate::config::BodySource;
use crate::error::{FetchError, Result};
use crate::format;
use crate::printer::Printer;
use crate::response::envelope::HeaderMap;
use std::io::Write;

/// Splits a JSON or NDJSON request body into individually-framed gRPC
/// messages for a client-streaming call. An empty body sends zero
/// messages, matching a unary call with no payload.
pub fn frame_request_body(body: &BodySource, raw: Option<&[u8]>) -> Result<Vec<Vec<u8>>> {
    let Some(bytes) = raw else { return Ok(Vec::new()) };
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let records: Vec<&[u8]> = match body {
        BodySource::Json(_) => vec![bytes],
        _ => format::ndjson::records(bytes),
    };
    Ok(records.into_iter().map(|r| Frame::new(r.to_vec(), false).encode()).collect())
}

/// Streams framed gRPC response messages through the protobuf printer
/// and inspects trailers for a non-zero `Grpc-Status`.
pub fn render_stream<W: Write>(
    printer: &mut Printer<W>,
    frames: &[Vec<u8>],
    trailers: &HeaderMap,
) -> Result<()> {
    let mut saw_frame = false;
    for raw in frames {
        let frame = unframe(raw)?;
        saw_frame = true;
        format::protobuf::format_unschema(printer, &frame.payload, 0)
            .map_err(|_| FetchError::Grpc {
                code: 13,
                status_name: grpc_status_name(13).to_string(),
                message: "failed to decode response frame".to_string(),
            })?;
        printer.newline().ok();
    }

    if let Some(status_str) = trailers.get_first("grpc-status") {
        let code: i32 = status_str.parse().unwrap_or(2);
        if code != 0 {
            let message = trailers
                .get_first("grpc-message")
                .unwrap_or_default()
                .to_string();
            return Err(FetchError::Grpc {
                code,
                status_name: grpc_status_name(code).to_string(),
                message,
            }
            .into());
        }
    } else if !saw_frame {
        return Err(FetchError::Grpc {
            code: 2,
            status_name: grpc_status_name(2).to_string(),
            message: "no frames and no grpc-status trailer".to_string(),
        }
        .into());
    }
    Ok(())
}
