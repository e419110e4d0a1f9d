//! MessagePack pretty-printer: decodes via `rmp_serde` into a generic
//! JSON value and renders it through the JSON pretty-printer (§4.3
//! "render as if it were the equivalent JSON document").

use crate::printer::Printer;
use std::io::{Cursor, Write};

/// Decodes a single MessagePack-encoded value and pretty-prints it with
/// JSON-like indentation. Trailing bytes after the first value are
/// rejected (a msgpack body is expected to encode exactly one value,
/// matching how `fetch` treats a JSON body).
pub fn format<W: Write>(printer: &mut Printer<W>, body: &[u8]) -> Result<(), ()> {
    let cursor = Cursor::new(body);
    let mut de = rmp_serde::Deserializer::new(cursor);
    let value: serde_json::Value = serde::Deserialize::deserialize(&mut de).map_err(|_| ())?;
    if (de.get_ref().position() as usize) != body.len() {
        return Err(());
    }
    let json_bytes = serde_json::to_vec(&value).map_err(|_| ())?;
    super::json::format(printer, &json_bytes, 0)
}
