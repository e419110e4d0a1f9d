//! HTML pretty-printer: tag-aware indenter built on `quick_xml`'s HTML
//! mode, delegating `<style>` block contents to [`super::css`] (§4.3,
//! §9 nested formatter delegation).

use crate::printer::color::Style;
use crate::printer::Printer;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::io::Write;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Re-indents an HTML document, tolerating unescaped `&` and unquoted
/// attributes the way browsers do. `<style>` element bodies are
/// delegated to the CSS formatter; `<script>` bodies are passed through
/// verbatim.
pub fn format<W: Write>(printer: &mut Printer<W>, body: &[u8], base_indent: usize) -> Result<(), ()> {
    let mut reader = Reader::from_reader(body);
    {
        let config = reader.config_mut();
        config.trim_text(true);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
    }
    let mut depth = base_indent;
    let mut buf = Vec::new();
    let mut raw_text_tag: Option<String> = None;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(start)) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
                write_indent(printer, depth)?;
                write_open_tag(printer, &start)?;
                printer.newline().map_err(|_| ())?;
                if name.eq_ignore_ascii_case("style") || name.eq_ignore_ascii_case("script") {
                    raw_text_tag = Some(name);
                } else if !VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str()) {
                    depth += 1;
                }
            }
            Ok(Event::Empty(start)) => {
                write_indent(printer, depth)?;
                write_open_tag(printer, &start)?;
                printer.newline().map_err(|_| ())?;
            }
            Ok(Event::Text(text)) if raw_text_tag.is_some() => {
                let raw = text.into_inner();
                let tag = raw_text_tag.clone().unwrap();
                if tag.eq_ignore_ascii_case("style") && super::css::format(printer, &raw, depth).is_ok() {
                    // delegated formatter already wrote indented output
                } else {
                    write_indent(printer, depth)?;
                    printer
                        .write_str(&String::from_utf8_lossy(&raw))
                        .map_err(|_| ())?;
                    printer.newline().map_err(|_| ())?;
                }
            }
            Ok(Event::Text(text)) => {
                let content = text.unescape().map_err(|_| ())?.trim().to_string();
                if !content.is_empty() {
                    write_indent(printer, depth)?;
                    printer.write_str(&escape_text(&content)).map_err(|_| ())?;
                    printer.newline().map_err(|_| ())?;
                }
            }
            Ok(Event::End(end)) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).to_string();
                if raw_text_tag.as_deref().is_some_and(|t| t.eq_ignore_ascii_case(&name)) {
                    raw_text_tag = None;
                } else {
                    depth = depth.saturating_sub(1);
                }
                write_indent(printer, depth)?;
                printer.write_str(&format!("</{name}>\n")).map_err(|_| ())?;
            }
            Ok(Event::Comment(comment)) => {
                write_indent(printer, depth)?;
                let text = String::from_utf8_lossy(comment.as_ref()).to_string();
                printer.push_style(Style::Dim).map_err(|_| ())?;
                printer.write_str(&format!("<!--{text}-->")).map_err(|_| ())?;
                printer.pop_style().map_err(|_| ())?;
                printer.newline().map_err(|_| ())?;
            }
            Ok(Event::DocType(doctype)) => {
                write_indent(printer, depth)?;
                printer
                    .write_str(&format!("<!DOCTYPE {}>\n", String::from_utf8_lossy(doctype.as_ref())))
                    .map_err(|_| ())?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return Err(()),
        }
    }
    Ok(())
}

fn write_indent<W: Write>(printer: &mut Printer<W>, level: usize) -> Result<(), ()> {
    printer.write_str(&"  ".repeat(level)).map_err(|_| ())
}

fn write_open_tag<W: Write>(
    printer: &mut Printer<W>,
    start: &quick_xml::events::BytesStart,
) -> Result<(), ()> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    printer.write_str(&format!("<{name}")).map_err(|_| ())?;
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().unwrap_or_default().to_string();
        printer
            .write_str(&format!(" {key}=\"{}\"", escape_attr(&value)))
            .map_err(|_| ())?;
    }
    printer.write_str(">").map_err(|_| ())
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}
