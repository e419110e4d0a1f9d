//! Content-aware pretty-printers and their dispatch (§4.2, §4.3).
//!
//! Each printer is tolerant: on parse failure it returns `Err`, and the
//! dispatcher reverts to raw passthrough rather than emitting partial
//! output (testable property #2 in the spec).

pub mod css;
pub mod csv_fmt;
pub mod html;
pub mod json;
pub mod markdown;
pub mod msgpack;
pub mod ndjson;
pub mod protobuf;
pub mod sse;
pub mod xml;
pub mod yaml;

use crate::cli::FormatMode;
use crate::printer::Printer;
use crate::response::classify::ContentType;
use std::io::Write;

/// Decides whether pretty-printing should be attempted at all, per §4.2:
/// `off` never formats, `on` always does, `auto` only on a TTY with a
/// formattable content type.
pub fn should_format(mode: FormatMode, destination_is_tty: bool, content_type: ContentType) -> bool {
    match mode {
        FormatMode::Off => false,
        FormatMode::On => true,
        FormatMode::Auto => destination_is_tty && content_type != ContentType::Unknown,
    }
}

/// Buffered-formatter dispatch table. Returns `Err` (never partial
/// output) on any parse failure so the caller can fall back to raw.
pub fn dispatch_buffered<W: Write>(
    printer: &mut Printer<W>,
    content_type: ContentType,
    body: &[u8],
) -> Result<(), ()> {
    let mut scratch = Vec::new();
    let result = {
        let mut scratch_printer = Printer::new(&mut scratch, printer.mode());
        match content_type {
            ContentType::Json => json::format(&mut scratch_printer, body, 0),
            ContentType::Xml => xml::format(&mut scratch_printer, body),
            ContentType::Html => html::format(&mut scratch_printer, body, 0),
            ContentType::Css => css::format(&mut scratch_printer, body, 0),
            ContentType::Csv => csv_fmt::format(&mut scratch_printer, body, 80),
            ContentType::Yaml => yaml::format(&mut scratch_printer, body),
            ContentType::Markdown => markdown::format(&mut scratch_printer, body),
            ContentType::MsgPack => msgpack::format(&mut scratch_printer, body),
            ContentType::Protobuf => protobuf::format_unschema(&mut scratch_printer, body, 0),
            ContentType::Sse => {
                let events = sse::parse_events(body);
                if events.is_empty() {
                    Err(())
                } else {
                    events.iter().try_for_each(|e| sse::format_event(&mut scratch_printer, e))
                }
            }
            ContentType::Ndjson => {
                let records = ndjson::records(body);
                if records.is_empty() {
                    Err(())
                } else {
                    records.iter().try_for_each(|r| ndjson::format_line(&mut scratch_printer, r))
                }
            }
            _ => Err(()),
        }
    };
    result?;
    printer.write_raw(&scratch).map_err(|_| ())?;
    Ok(())
}
