//! Server-Sent Events line-reader and formatter (§3 SSEEvent, §4.3).

use crate::printer::Printer;
use std::io::Write;

/// One dispatched SSE event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    pub event_type: String,
    pub last_id: Option<String>,
    pub data: String,
}

/// Parses a buffered `text/event-stream` body into dispatched events.
/// Honours `\n`, `\r`, `\r\n` line endings and a leading UTF-8 BOM.
/// `:`-prefixed lines are comments and ignored. An event with empty data
/// is discarded per §4.3.
pub fn parse_events(body: &[u8]) -> Vec<SseEvent> {
    let text = strip_bom(&String::from_utf8_lossy(body));
    let mut events = Vec::new();
    let mut event_type = String::new();
    let mut last_id: Option<String> = None;
    let mut data_lines: Vec<String> = Vec::new();

    for line in split_lines(text) {
        if line.is_empty() {
            if !data_lines.is_empty() {
                events.push(SseEvent {
                    event_type: if event_type.is_empty() {
                        "message".to_string()
                    } else {
                        event_type.clone()
                    },
                    last_id: last_id.clone(),
                    data: data_lines.join("\n"),
                });
            }
            event_type.clear();
            data_lines.clear();
            continue;
        }
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => event_type = value.to_string(),
            "data" => data_lines.push(value.to_string()),
            "id" => last_id = Some(value.to_string()),
            _ => {}
        }
    }
    events
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split(['\n'])
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect()
}

/// Renders one event as `[event-type]\n<data>\n`, routing the data block
/// through the JSON formatter when it parses as a single JSON value.
pub fn format_event<W: Write>(printer: &mut Printer<W>, event: &SseEvent) -> Result<(), ()> {
    printer
        .write_str(&format!("[{}]\n", event.event_type))
        .map_err(|_| ())?;
    if super::json::format(printer, event.data.as_bytes(), 0).is_err() {
        printer.write_str(&event.data).map_err(|_| ())?;
    }
    printer.newline().map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::color::ColorMode;

    #[test]
    fn multiple_data_lines_join_with_newline() {
        let body = b"data: line one\ndata: line two\n\n";
        let events = parse_events(body);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "line one\nline two");
    }

    #[test]
    fn default_event_type_is_message() {
        let events = parse_events(b"data: hi\n\n");
        assert_eq!(events[0].event_type, "message");
    }

    #[test]
    fn comments_are_ignored() {
        let events = parse_events(b": a comment\ndata: hi\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hi");
    }

    #[test]
    fn event_with_empty_data_is_discarded() {
        let events = parse_events(b"event: ping\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn crlf_line_endings_are_honoured() {
        let events = parse_events(b"data: hi\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hi");
    }

    #[test]
    fn leading_bom_is_stripped() {
        let mut body = vec![0xEF, 0xBB, 0xBF];
        body.extend_from_slice(b"data: hi\n\n");
        let events = parse_events(&body);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn json_data_is_routed_through_json_formatter() {
        let mut buf = Vec::new();
        {
            let mut printer = Printer::new(&mut buf, ColorMode::Off);
            let event = SseEvent {
                event_type: "message".to_string(),
                last_id: None,
                data: "{\"a\":1}".to_string(),
            };
            format_event(&mut printer, &event).unwrap();
        }
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("\"a\": 1"));
    }
}
