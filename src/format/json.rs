//! JSON pretty-printer: a tokenising parser that preserves exact number
//! text (no reparse-as-f64) and emits 2-space indented, styled output.

use crate::printer::color::Style;
use crate::printer::Printer;
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    ObjOpen,
    ObjClose,
    ArrOpen,
    ArrClose,
    Colon,
    Comma,
    String(String),
    Number(String),
    True,
    False,
    Null,
}

struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn skip_ws(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b' ' || b == b'\t' || b == b'\n' || b == b'\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, ()> {
        self.skip_ws();
        let Some(&b) = self.bytes.get(self.pos) else {
            return Ok(None);
        };
        match b {
            b'{' => {
                self.pos += 1;
                Ok(Some(Token::ObjOpen))
            }
            b'}' => {
                self.pos += 1;
                Ok(Some(Token::ObjClose))
            }
            b'[' => {
                self.pos += 1;
                Ok(Some(Token::ArrOpen))
            }
            b']' => {
                self.pos += 1;
                Ok(Some(Token::ArrClose))
            }
            b':' => {
                self.pos += 1;
                Ok(Some(Token::Colon))
            }
            b',' => {
                self.pos += 1;
                Ok(Some(Token::Comma))
            }
            b'"' => self.string().map(|s| Some(Token::String(s))),
            b't' => self.literal("true").map(|_| Some(Token::True)),
            b'f' => self.literal("false").map(|_| Some(Token::False)),
            b'n' => self.literal("null").map(|_| Some(Token::Null)),
            b'-' | b'0'..=b'9' => self.number().map(|s| Some(Token::Number(s))),
            _ => Err(()),
        }
    }

    fn literal(&mut self, lit: &str) -> Result<(), ()> {
        if self.bytes[self.pos..].starts_with(lit.as_bytes()) {
            self.pos += lit.len();
            Ok(())
        } else {
            Err(())
        }
    }

    fn string(&mut self) -> Result<String, ()> {
        self.pos += 1; // opening quote
        let mut out = String::new();
        loop {
            let &b = self.bytes.get(self.pos).ok_or(())?;
            self.pos += 1;
            match b {
                b'"' => return Ok(out),
                b'\\' => {
                    let &esc = self.bytes.get(self.pos).ok_or(())?;
                    self.pos += 1;
                    match esc {
                        b'"' => out.push('"'),
                        b'\\' => out.push('\\'),
                        b'/' => out.push('/'),
                        b'n' => out.push('\n'),
                        b't' => out.push('\t'),
                        b'r' => out.push('\r'),
                        b'b' => out.push('\u{8}'),
                        b'f' => out.push('\u{c}'),
                        b'u' => {
                            let hex = self.bytes.get(self.pos..self.pos + 4).ok_or(())?;
                            let code = u32::from_str_radix(std::str::from_utf8(hex).map_err(|_| ())?, 16)
                                .map_err(|_| ())?;
                            out.push(char::from_u32(code).ok_or(())?);
                            self.pos += 4;
                        }
                        _ => return Err(()),
                    }
                }
                _ => {
                    // Re-decode as UTF-8 by stepping back one byte and
                    // consuming a full scalar value.
                    self.pos -= 1;
                    let rest = std::str::from_utf8(&self.bytes[self.pos..]).map_err(|_| ())?;
                    let ch = rest.chars().next().ok_or(())?;
                    out.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
    }

    fn number(&mut self) -> Result<String, ()> {
        let start = self.pos;
        if self.bytes.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        while matches!(self.bytes.get(self.pos), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.bytes.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            while matches!(self.bytes.get(self.pos), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        if matches!(self.bytes.get(self.pos), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.bytes.get(self.pos), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            while matches!(self.bytes.get(self.pos), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        if self.pos == start {
            return Err(());
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .map(|s| s.to_string())
            .map_err(|_| ())
    }
}

/// Parses and pretty-prints `body` as JSON with `base_indent` extra
/// indent levels (used when delegated into from the Markdown code-fence
/// printer). Rejects trailing non-whitespace content after the value.
pub fn format<W: Write>(printer: &mut Printer<W>, body: &[u8], base_indent: usize) -> Result<(), ()> {
    let mut lexer = Lexer::new(body);
    let first = lexer.next_token()?.ok_or(())?;
    print_value(printer, &mut lexer, first, base_indent)?;
    lexer.skip_ws();
    if lexer.pos != lexer.bytes.len() {
        return Err(());
    }
    Ok(())
}

fn print_value<W: Write>(
    printer: &mut Printer<W>,
    lexer: &mut Lexer,
    token: Token,
    indent: usize,
) -> Result<(), ()> {
    match token {
        Token::ObjOpen => print_object(printer, lexer, indent),
        Token::ArrOpen => print_array(printer, lexer, indent),
        Token::String(s) => write_string(printer, &s),
        Token::Number(n) => printer.write_str(&n).map_err(|_| ()),
        Token::True => printer.write_str("true").map_err(|_| ()),
        Token::False => printer.write_str("false").map_err(|_| ()),
        Token::Null => printer.write_str("null").map_err(|_| ()),
        _ => Err(()),
    }
}

fn write_indent<W: Write>(printer: &mut Printer<W>, level: usize) -> Result<(), ()> {
    printer.write_str(&"  ".repeat(level)).map_err(|_| ())
}

fn write_string<W: Write>(printer: &mut Printer<W>, s: &str) -> Result<(), ()> {
    printer.push_style(Style::Green).map_err(|_| ())?;
    printer.write_str("\"").map_err(|_| ())?;
    for c in s.chars() {
        if (c as u32) < 0x20 || c as u32 == 0x7f {
            printer.write_str(&format!("\\u{:04x}", c as u32)).map_err(|_| ())?;
        } else if c == '"' {
            printer.write_str("\\\"").map_err(|_| ())?;
        } else if c == '\\' {
            printer.write_str("\\\\").map_err(|_| ())?;
        } else {
            printer.write_str(&c.to_string()).map_err(|_| ())?;
        }
    }
    printer.write_str("\"").map_err(|_| ())?;
    printer.pop_style().map_err(|_| ())
}

fn print_object<W: Write>(printer: &mut Printer<W>, lexer: &mut Lexer, indent: usize) -> Result<(), ()> {
    let mut next = lexer.next_token()?.ok_or(())?;
    if next == Token::ObjClose {
        return printer.write_str("{}").map_err(|_| ());
    }
    printer.write_str("{\n").map_err(|_| ())?;
    loop {
        write_indent(printer, indent + 1)?;
        let Token::String(key) = next else { return Err(()) };
        printer.push_style(Style::BoldBlue).map_err(|_| ())?;
        printer.write_str(&format!("\"{key}\"")).map_err(|_| ())?;
        printer.pop_style().map_err(|_| ())?;
        printer.write_str(": ").map_err(|_| ())?;

        if lexer.next_token()? != Some(Token::Colon) {
            return Err(());
        }
        let value_tok = lexer.next_token()?.ok_or(())?;
        print_value(printer, lexer, value_tok, indent + 1)?;

        match lexer.next_token()?.ok_or(())? {
            Token::Comma => {
                printer.write_str(",\n").map_err(|_| ())?;
                next = lexer.next_token()?.ok_or(())?;
            }
            Token::ObjClose => break,
            _ => return Err(()),
        }
    }
    printer.write_str("\n").map_err(|_| ())?;
    write_indent(printer, indent)?;
    printer.write_str("}").map_err(|_| ())
}

fn print_array<W: Write>(printer: &mut Printer<W>, lexer: &mut Lexer, indent: usize) -> Result<(), ()> {
    let mut next = lexer.next_token()?.ok_or(())?;
    if next == Token::ArrClose {
        return printer.write_str("[]").map_err(|_| ());
    }
    printer.write_str("[\n").map_err(|_| ())?;
    loop {
        write_indent(printer, indent + 1)?;
        print_value(printer, lexer, next, indent + 1)?;
        match lexer.next_token()?.ok_or(())? {
            Token::Comma => {
                printer.write_str(",\n").map_err(|_| ())?;
                next = lexer.next_token()?.ok_or(())?;
            }
            Token::ArrClose => break,
            _ => return Err(()),
        }
    }
    printer.write_str("\n").map_err(|_| ())?;
    write_indent(printer, indent)?;
    printer.write_str("]").map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::color::ColorMode;

    fn render(body: &[u8]) -> Result<String, ()> {
        let mut buf = Vec::new();
        {
            let mut printer = Printer::new(&mut buf, ColorMode::Off);
            format(&mut printer, body, 0)?;
        }
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn formats_simple_object() {
        let out = render(br#"{"key":"value"}"#).unwrap();
        assert_eq!(out, "{\n  \"key\": \"value\"\n}");
    }

    #[test]
    fn preserves_number_precision() {
        let out = render(br#"{"pi":3.14159265358979}"#).unwrap();
        assert!(out.contains("3.14159265358979"));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(render(br#"{"a":1}garbage"#).is_err());
    }

    #[test]
    fn empty_object_and_array_render_compact() {
        assert_eq!(render(b"{}").unwrap(), "{}");
        assert_eq!(render(b"[]").unwrap(), "[]");
    }

    #[test]
    fn escapes_control_characters() {
        let out = render(b"{\"k\":\"a\\u0001b\"}").unwrap();
        assert!(out.contains("\\u0001"));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(render(b"{not valid}").is_err());
    }
}
