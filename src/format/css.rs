//! CSS pretty-printer: one selector/declaration per line, braces and
//! colons styled, comments dimmed (§4.3).

use crate::printer::color::Style;
use crate::printer::Printer;
use std::io::Write;

/// Tokenises just enough CSS structure (`{`, `}`, `;`, `/* */` comments)
/// to reformat a stylesheet with one declaration per line. Does not
/// parse selector grammar or validate property names.
pub fn format<W: Write>(printer: &mut Printer<W>, body: &[u8], base_indent: usize) -> Result<(), ()> {
    let text = std::str::from_utf8(body).map_err(|_| ())?;
    let mut depth = base_indent;
    let mut chars = text.chars().peekable();
    let mut token = String::new();

    let flush_selector = |printer: &mut Printer<W>, token: &mut String, depth: usize| -> Result<(), ()> {
        let trimmed = token.trim();
        if !trimmed.is_empty() {
            write_indent(printer, depth)?;
            printer.write_str(trimmed).map_err(|_| ())?;
        }
        token.clear();
        Ok(())
    };

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                flush_selector(printer, &mut token, depth)?;
                let mut comment = String::from("/*");
                loop {
                    match chars.next() {
                        Some('*') if chars.peek() == Some(&'/') => {
                            chars.next();
                            comment.push_str("*/");
                            break;
                        }
                        Some(ch) => comment.push(ch),
                        None => return Err(()),
                    }
                }
                write_indent(printer, depth)?;
                printer.push_style(Style::Dim).map_err(|_| ())?;
                printer.write_str(&comment).map_err(|_| ())?;
                printer.pop_style().map_err(|_| ())?;
                printer.newline().map_err(|_| ())?;
            }
            '{' => {
                let selector = token.trim().to_string();
                token.clear();
                write_indent(printer, depth)?;
                printer.write_str(&selector).map_err(|_| ())?;
                printer.write_str(" {").map_err(|_| ())?;
                printer.newline().map_err(|_| ())?;
                depth += 1;
            }
            '}' => {
                if !token.trim().is_empty() {
                    write_declaration(printer, depth, token.trim())?;
                    printer.newline().map_err(|_| ())?;
                }
                token.clear();
                depth = depth.checked_sub(1).ok_or(())?;
                write_indent(printer, depth)?;
                printer.write_str("}").map_err(|_| ())?;
                printer.newline().map_err(|_| ())?;
            }
            ';' => {
                write_declaration(printer, depth, token.trim())?;
                printer.newline().map_err(|_| ())?;
                token.clear();
            }
            _ => token.push(c),
        }
    }
    if !token.trim().is_empty() || depth != base_indent {
        return Err(());
    }
    Ok(())
}

fn write_declaration<W: Write>(printer: &mut Printer<W>, depth: usize, decl: &str) -> Result<(), ()> {
    if decl.is_empty() {
        return Ok(());
    }
    write_indent(printer, depth)?;
    match decl.split_once(':') {
        Some((prop, value)) => {
            printer.push_style(Style::Cyan).map_err(|_| ())?;
            printer.write_str(prop.trim()).map_err(|_| ())?;
            printer.pop_style().map_err(|_| ())?;
            printer.write_str(": ").map_err(|_| ())?;
            printer.write_str(value.trim()).map_err(|_| ())?;
            printer.write_str(";").map_err(|_| ())
        }
        None => printer.write_str(&format!("{decl};")).map_err(|_| ()),
    }
}

fn write_indent<W: Write>(printer: &mut Printer<W>, level: usize) -> Result<(), ()> {
    printer.write_str(&"  ".repeat(level)).map_err(|_| ())
}
