//! YAML pretty-printer: re-serializes through `serde_yaml` with stable
//! key ordering preserved via `serde_yaml::Value`'s mapping type (§4.3).

use crate::printer::color::Style;
use crate::printer::Printer;
use std::io::Write;

/// Parses a YAML document and re-renders it with consistent 2-space
/// indentation and styled scalar keys. Multi-document streams (`---`
/// separated) are rejected; only a single top-level document is
/// supported per §4.3.
pub fn format<W: Write>(printer: &mut Printer<W>, body: &[u8]) -> Result<(), ()> {
    let text = std::str::from_utf8(body).map_err(|_| ())?;
    let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|_| ())?;
    print_value(printer, &value, 0, false)?;
    printer.newline().map_err(|_| ())
}

fn print_value<W: Write>(
    printer: &mut Printer<W>,
    value: &serde_yaml::Value,
    indent: usize,
    inline: bool,
) -> Result<(), ()> {
    use serde_yaml::Value;
    match value {
        Value::Mapping(map) => {
            if map.is_empty() {
                return printer.write_str("{}").map_err(|_| ());
            }
            let mut first = true;
            for (key, val) in map {
                if !first || !inline {
                    if !first {
                        printer.newline().map_err(|_| ())?;
                    }
                    write_indent(printer, indent)?;
                }
                first = false;
                printer.push_style(Style::BoldBlue).map_err(|_| ())?;
                printer.write_str(&scalar_to_string(key)?).map_err(|_| ())?;
                printer.pop_style().map_err(|_| ())?;
                printer.write_str(":").map_err(|_| ())?;
                match val {
                    Value::Mapping(m) if !m.is_empty() => {
                        printer.newline().map_err(|_| ())?;
                        print_value(printer, val, indent + 1, false)?;
                    }
                    Value::Sequence(s) if !s.is_empty() => {
                        printer.newline().map_err(|_| ())?;
                        print_value(printer, val, indent, false)?;
                    }
                    _ => {
                        printer.write_str(" ").map_err(|_| ())?;
                        print_value(printer, val, indent, true)?;
                    }
                }
            }
            Ok(())
        }
        Value::Sequence(seq) => {
            if seq.is_empty() {
                return printer.write_str("[]").map_err(|_| ());
            }
            let mut first = true;
            for item in seq {
                if !first {
                    printer.newline().map_err(|_| ())?;
                }
                first = false;
                write_indent(printer, indent)?;
                printer.write_str("- ").map_err(|_| ())?;
                print_value(printer, item, indent + 1, true)?;
            }
            Ok(())
        }
        Value::String(s) => printer.write_str(s).map_err(|_| ()),
        Value::Null => printer.write_str("null").map_err(|_| ()),
        Value::Bool(b) => printer.write_str(&b.to_string()).map_err(|_| ()),
        Value::Number(n) => printer.write_str(&n.to_string()).map_err(|_| ()),
        _ => Err(()),
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Result<String, ()> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        _ => Err(()),
    }
}

fn write_indent<W: Write>(printer: &mut Printer<W>, level: usize) -> Result<(), ()> {
    printer.write_str(&"  ".repeat(level)).map_err(|_| ())
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
    fn formats_nested_mapping() {
        let out = render(b"a:\n  b: 1\n").unwrap();
        assert!(out.contains("a:"));
        assert!(out.contains("b: 1"));
    }

    #[test]
    fn formats_sequence() {
        let out = render(b"items:\n  - one\n  - two\n").unwrap();
        assert!(out.contains("- one"));
        assert!(out.contains("- two"));
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(render(b"a: [unterminated").is_err());
    }
}
