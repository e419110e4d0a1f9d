//! CSV pretty-printer: renders rows as a column-aligned table, header
//! row styled, truncated to the destination width (§4.3).

use crate::printer::color::Style;
use crate::printer::Printer;
use std::io::Write;

/// Parses RFC 4180-ish CSV (quoted fields, `""` escapes, `,` separator)
/// and renders a column-aligned table. Columns are padded to the widest
/// cell; if the rendered row would exceed `max_width`, trailing columns
/// are dropped and an ellipsis column is appended.
pub fn format<W: Write>(printer: &mut Printer<W>, body: &[u8], max_width: usize) -> Result<(), ()> {
    let text = std::str::from_utf8(body).map_err(|_| ())?;
    let rows = parse_rows(text)?;
    if rows.is_empty() {
        return Ok(());
    }
    let cols = rows[0].len();
    if rows.iter().any(|r| r.len() != cols) {
        return Err(());
    }

    let mut widths = vec![0usize; cols];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let (widths, truncated) = fit_to_width(widths, max_width);

    for (row_idx, row) in rows.iter().enumerate() {
        if row_idx == 1 {
            write_separator(printer, &widths, truncated)?;
        }
        let is_header = row_idx == 0;
        if is_header {
            printer.push_style(Style::BoldBlue).map_err(|_| ())?;
        }
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                printer.write_str("  ").map_err(|_| ())?;
            }
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            printer
                .write_str(&format!("{:<width$}", cell, width = width))
                .map_err(|_| ())?;
        }
        if truncated {
            printer.write_str("  …").map_err(|_| ())?;
        }
        if is_header {
            printer.pop_style().map_err(|_| ())?;
        }
        printer.newline().map_err(|_| ())?;
    }
    Ok(())
}

fn fit_to_width(widths: Vec<usize>, max_width: usize) -> (Vec<usize>, bool) {
    let mut kept = Vec::new();
    let mut total = 0usize;
    for (i, w) in widths.iter().enumerate() {
        let added = w + if i > 0 { 2 } else { 0 };
        if total + added > max_width && !kept.is_empty() {
            return (kept, true);
        }
        total += added;
        kept.push(*w);
    }
    (kept, false)
}

fn write_separator<W: Write>(printer: &mut Printer<W>, widths: &[usize], truncated: bool) -> Result<(), ()> {
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            printer.write_str("  ").map_err(|_| ())?;
        }
        printer.write_str(&"-".repeat(*width)).map_err(|_| ())?;
    }
    if truncated {
        printer.write_str("  -").map_err(|_| ())?;
    }
    printer.newline().map_err(|_| ())
}

fn parse_rows(text: &str) -> Result<Vec<Vec<String>>, ()> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    let mut saw_any = false;

    while let Some(c) = chars.next() {
        saw_any = true;
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    row.push(std::mem::take(&mut field));
                }
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                _ => field.push(c),
            }
        }
    }
    if in_quotes {
        return Err(());
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    if !saw_any {
        rows.clear();
    }
    Ok(rows)
}
