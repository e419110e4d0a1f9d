//! Markdown pretty-printer: headings styled, code fences delegated to
//! the matching language formatter when the info string names one
//! (§4.3, §9 "nested formatter delegation").

use crate::printer::color::Style;
use crate::printer::Printer;
use std::io::Write;

/// Walks a Markdown document line by line. Headings (`#`...`######`)
/// are styled bold; fenced code blocks (` ``` `) are delegated to
/// [`super::json`], [`super::yaml`], [`super::xml`], [`super::html`],
/// or [`super::css`] when the fence's info string names one of those
/// languages, falling back to verbatim text on delegate failure.
pub fn format<W: Write>(printer: &mut Printer<W>, body: &[u8]) -> Result<(), ()> {
    let text = std::str::from_utf8(body).map_err(|_| ())?;
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        if let Some(lang) = line.trim_start().strip_prefix("```") {
            let lang = lang.trim().to_string();
            let mut code_lines = Vec::new();
            let mut closed = false;
            for inner in lines.by_ref() {
                if inner.trim_start().starts_with("```") {
                    closed = true;
                    break;
                }
                code_lines.push(inner);
            }
            if !closed {
                return Err(());
            }
            let code = code_lines.join("\n");
            printer.push_style(Style::Dim).map_err(|_| ())?;
            printer.write_str(&format!("```{lang}")).map_err(|_| ())?;
            printer.pop_style().map_err(|_| ())?;
            printer.newline().map_err(|_| ())?;
            write_delegated(printer, &lang, code.as_bytes())?;
            printer.push_style(Style::Dim).map_err(|_| ())?;
            printer.write_str("```").map_err(|_| ())?;
            printer.pop_style().map_err(|_| ())?;
            printer.newline().map_err(|_| ())?;
            continue;
        }

        if let Some(level) = heading_level(line) {
            printer.push_style(Style::Bold).map_err(|_| ())?;
            printer.write_str(line.trim_start_matches('#').trim()).map_err(|_| ())?;
            printer.pop_style().map_err(|_| ())?;
            let _ = level;
        } else {
            printer.write_str(line).map_err(|_| ())?;
        }
        printer.newline().map_err(|_| ())?;
    }
    Ok(())
}

fn heading_level(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if hashes >= 1 && hashes <= 6 && trimmed.as_bytes().get(hashes).map_or(true, |&b| b == b' ') {
        Some(hashes)
    } else {
        None
    }
}

fn write_delegated<W: Write>(printer: &mut Printer<W>, lang: &str, code: &[u8]) -> Result<(), ()> {
    let delegated = match lang.to_ascii_lowercase().as_str() {
        "json" => super::json::format(printer, code, 0),
        "yaml" | "yml" => super::yaml::format(printer, code),
        "xml" => super::xml::format(printer, code),
        "html" => super::html::format(printer, code, 0),
        "css" => super::css::format(printer, code, 0),
        _ => Err(()),
    };
    if delegated.is_err() {
        printer.write_str(std::str::from_utf8(code).map_err(|_| ())?).map_err(|_| ())?;
        printer.newline().map_err(|_| ())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::color::ColorMode;

    fn render(body: &[u8]) -> Result<String, ()> {
        let mut buf = Vec::new();
        {
            let mut printer = Printer::new(&mut buf, ColorMode::Off);
            format(&mut printer, body)?;
        }
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn heading_text_is_preserved() {
        let out = render(b"# Title\n").unwrap();
        assert!(out.contains("Title"));
    }

    #[test]
    fn json_fence_is_delegated_to_json_formatter() {
        let out = render(b"```json\n{\"a\":1}\n```\n").unwrap();
        assert!(out.contains("\"a\": 1"));
    }

    #[test]
    fn unrecognised_fence_language_falls_back_to_verbatim() {
        let out = render(b"```text\nhello\n```\n").unwrap();
        assert!(out.contains("hello"));
    }

    #[test]
    fn unterminated_fence_is_rejected() {
        assert!(render(b"```json\n{\"a\":1}\n").is_err());
    }
}
