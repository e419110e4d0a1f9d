//! Schema-less protobuf wire-format dumper: walks tag/wire-type/value
//! triples without a `.proto` descriptor, in the spirit of
//! `protoc --decode_raw` (§4.3, §4.4 dynamic decoding).

use crate::printer::color::Style;
use crate::printer::Printer;
use bytes::Buf;
use prost::encoding::{decode_varint, WireType};
use std::io::Write;

/// Renders the raw field structure of a protobuf message: each field is
/// shown as `<number>: <wire-type> = <value>`, with length-delimited
/// fields recursively re-attempted as nested messages before falling
/// back to a string/byte dump.
pub fn format_unschema<W: Write>(printer: &mut Printer<W>, body: &[u8], indent: usize) -> Result<(), ()> {
    let mut buf = body;
    if buf.is_empty() {
        return Err(());
    }
    print_fields(printer, &mut buf, indent)
}

fn print_fields<W: Write>(printer: &mut Printer<W>, buf: &mut &[u8], indent: usize) -> Result<(), ()> {
    let mut any = false;
    while buf.has_remaining() {
        let tag = decode_varint(buf).map_err(|_| ())?;
        let field_number = tag >> 3;
        let wire_type = wire_type_from(tag & 0x7)?;
        if field_number == 0 {
            return Err(());
        }
        write_indent(printer, indent)?;
        printer.push_style(Style::BoldBlue).map_err(|_| ())?;
        printer.write_str(&field_number.to_string()).map_err(|_| ())?;
        printer.pop_style().map_err(|_| ())?;
        printer.write_str(": ").map_err(|_| ())?;

        match wire_type {
            WireType::Varint => {
                let value = decode_varint(buf).map_err(|_| ())?;
                printer.write_str(&value.to_string()).map_err(|_| ())?;
            }
            WireType::SixtyFourBit => {
                if buf.remaining() < 8 {
                    return Err(());
                }
                let value = buf.get_u64_le();
                printer.write_str(&format!("0x{value:016x}")).map_err(|_| ())?;
            }
            WireType::ThirtyTwoBit => {
                if buf.remaining() < 4 {
                    return Err(());
                }
                let value = buf.get_u32_le();
                printer.write_str(&format!("0x{value:08x}")).map_err(|_| ())?;
            }
            WireType::LengthDelimited => {
                let len = decode_varint(buf).map_err(|_| ())? as usize;
                if buf.remaining() < len {
                    return Err(());
                }
                let bytes = &buf[..len];
                buf.advance(len);
                if let Ok(text) = std::str::from_utf8(bytes) {
                    if text.chars().all(|c| !c.is_control() || c == '\n' || c == '\t') && !text.is_empty() {
                        printer.push_style(Style::Green).map_err(|_| ())?;
                        printer.write_str(&format!("\"{text}\"")).map_err(|_| ())?;
                        printer.pop_style().map_err(|_| ())?;
                        printer.newline().map_err(|_| ())?;
                        any = true;
                        continue;
                    }
                }
                let mut nested = bytes;
                printer.write_str("{").map_err(|_| ())?;
                printer.newline().map_err(|_| ())?;
                if print_fields(printer, &mut nested, indent + 1).is_ok() {
                    write_indent(printer, indent)?;
                    printer.write_str("}").map_err(|_| ())?;
                } else {
                    write_indent(printer, indent + 1)?;
                    printer.write_str(&format!("<{} bytes>", bytes.len())).map_err(|_| ())?;
                    printer.newline().map_err(|_| ())?;
                    write_indent(printer, indent)?;
                    printer.write_str("}").map_err(|_| ())?;
                }
            }
            WireType::StartGroup | WireType::EndGroup => return Err(()),
        }
        printer.newline().map_err(|_| ())?;
        any = true;
    }
    if !any {
        return Err(());
    }
    Ok(())
}

fn wire_type_from(value: u64) -> Result<WireType, ()> {
    match value {
        0 => Ok(WireType::Varint),
        1 => Ok(WireType::SixtyFourBit),
        2 => Ok(WireType::LengthDelimited),
        3 => Ok(WireType::StartGroup),
        4 => Ok(WireType::EndGroup),
        5 => Ok(WireType::ThirtyTwoBit),
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
            format_unschema(&mut printer, body, 0)?;
        }
        Ok(String::from_utf8(buf).unwrap())
    }

    fn encode_varint_field(field: u64, wire: u64, value: u64) -> Vec<u8> {
        let tag = (field << 3) | wire;
        let mut out = Vec::new();
        prost::encoding::encode_varint(tag, &mut out);
        prost::encoding::encode_varint(value, &mut out);
        out
    }

    #[test]
    fn decodes_varint_field() {
        let body = encode_varint_field(1, 0, 150);
        let out = render(&body).unwrap();
        assert_eq!(out, "1: 150\n");
    }

    #[test]
    fn decodes_length_delimited_string_field() {
        let mut out = Vec::new();
        prost::encoding::encode_varint((2 << 3) | 2, &mut out);
        prost::encoding::encode_varint(5, &mut out);
        out.extend_from_slice(b"hello");
        let rendered = render(&out).unwrap();
        assert!(rendered.contains("\"hello\""));
    }

    #[test]
    fn empty_body_is_rejected() {
        assert!(render(b"").is_err());
    }

    #[test]
    fn truncated_varint_is_rejected() {
        assert!(render(&[0x80]).is_err());
    }
}
