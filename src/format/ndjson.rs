//! NDJSON streaming formatter: one compact JSON object per line, flushed
//! immediately after each record so long-lived streams render
//! incrementally (§4.3).

use crate::printer::Printer;
use std::io::Write;

/// Compacts a single already-valid JSON value to one line (no added
/// whitespace beyond what the source contains between tokens is
/// stripped). Delegates structural validation to [`super::json`].
pub fn format_line<W: Write>(printer: &mut Printer<W>, line: &[u8]) -> Result<(), ()> {
    let compact = compact_json(line)?;
    printer.write_str(&compact).map_err(|_| ())?;
    printer.newline().map_err(|_| ())
}

fn compact_json(body: &[u8]) -> Result<String, ()> {
    // Reuse the tolerant JSON lexer indirectly: render through the JSON
    // formatter into a throwaway buffer, then strip newlines/indent so
    // the result is single-line, preserving key/value content exactly.
    let mut buf = Vec::new();
    {
        let mut printer = Printer::new(&mut buf, crate::printer::color::ColorMode::Off);
        super::json::format(&mut printer, body, 0)?;
    }
    let pretty = String::from_utf8(buf).map_err(|_| ())?;
    Ok(compact_from_pretty(&pretty))
}

fn compact_from_pretty(pretty: &str) -> String {
    let mut out = String::with_capacity(pretty.len());
    let mut in_string = false;
    let mut chars = pretty.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_string = !in_string;
                out.push(c);
            }
            '\\' if in_string => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '\n' if !in_string => {
                // Collapse the newline and any following indentation into
                // a single space, matching the `{ "k": "v" }` compact form.
                while chars.peek() == Some(&' ') {
                    chars.next();
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Splits a buffered NDJSON body into per-line records, dropping blank
/// lines (a trailing newline should not produce an empty record).
pub fn records(body: &[u8]) -> Vec<&[u8]> {
    body.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::color::ColorMode;

    #[test]
    fn splits_records_dropping_trailing_blank_line() {
        let body = b"{\"a\":1}\n{\"b\":2}\n";
        assert_eq!(records(body).len(), 2);
    }

    #[test]
    fn formats_each_line_compactly_and_flushes() {
        let mut buf = Vec::new();
        {
            let mut printer = Printer::new(&mut buf, ColorMode::Off);
            for record in records(b"{\"a\": 1}\n{\"b\": 2}\n") {
                format_line(&mut printer, record).unwrap();
            }
        }
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(out, "{ \"a\": 1 }\n{ \"b\": 2 }\n");
    }
}
