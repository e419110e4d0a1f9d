//! Tag-aware XML indenter with XML 1.0 attribute escaping (§4.3).

use crate::printer::color::Style;
use crate::printer::Printer;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::io::Write;

/// Re-indents an XML document using `quick_xml`'s event reader. Comments
/// are dimmed; attribute values are escaped per XML 1.0 including `\t`,
/// `\n`, `\r` as numeric entities; text nodes are trimmed of surrounding
/// whitespace.
pub fn format<W: Write>(printer: &mut Printer<W>, body: &[u8]) -> Result<(), ()> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);
    let mut depth: usize = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Decl(decl)) => {
                let text = String::from_utf8_lossy(&decl.into_inner()).to_string();
                printer.write_str(&format!("<?{text}?>\n")).map_err(|_| ())?;
            }
            Ok(Event::Start(start)) => {
                write_indent(printer, depth)?;
                write_open_tag(printer, &start, false)?;
                printer.newline().map_err(|_| ())?;
                depth += 1;
            }
            Ok(Event::Empty(start)) => {
                write_indent(printer, depth)?;
                write_open_tag(printer, &start, true)?;
                printer.newline().map_err(|_| ())?;
            }
            Ok(Event::End(end)) => {
                depth = depth.saturating_sub(1);
                write_indent(printer, depth)?;
                let name = String::from_utf8_lossy(end.name().as_ref()).to_string();
                printer.write_str(&format!("</{name}>\n")).map_err(|_| ())?;
            }
            Ok(Event::Text(text)) => {
                let content = text.unescape().map_err(|_| ())?.trim().to_string();
                if !content.is_empty() {
                    write_indent(printer, depth)?;
                    printer.write_str(&escape_text(&content)).map_err(|_| ())?;
                    printer.newline().map_err(|_| ())?;
                }
            }
            Ok(Event::Comment(comment)) => {
                write_indent(printer, depth)?;
                let text = String::from_utf8_lossy(comment.as_ref()).to_string();
                printer.push_style(Style::Dim).map_err(|_| ())?;
                printer.write_str(&format!("<!--{text}-->")).map_err(|_| ())?;
                printer.pop_style().map_err(|_| ())?;
                printer.newline().map_err(|_| ())?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return Err(()),
        }
    }
    if depth != 0 {
        return Err(());
    }
    Ok(())
}

fn write_indent<W: Write>(printer: &mut Printer<W>, level: usize) -> Result<(), ()> {
    printer.write_str(&"  ".repeat(level)).map_err(|_| ())
}

fn write_open_tag<W: Write>(
    printer: &mut Printer<W>,
    start: &quick_xml::events::BytesStart,
    self_closing: bool,
) -> Result<(), ()> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    printer.write_str(&format!("<{name}")).map_err(|_| ())?;
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().map_err(|_| ())?.to_string();
        printer
            .write_str(&format!(" {key}=\"{}\"", escape_attr(&value)))
            .map_err(|_| ())?;
    }
    printer.write_str(if self_closing { "/>" } else { ">" }).map_err(|_| ())
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\t', "&#9;")
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
}
