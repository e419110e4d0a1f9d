//! ANSI styling and the per-stream buffered writer (§4.11)
//!
//! The Printer is the single place that knows whether colour is enabled
//! and owns a style stack so nested spans (e.g. a bold key inside a dim
//! comment) survive interleaved resets.

pub mod color;

use color::{ColorMode, Style};
use std::io::{self, Write};

/// A buffered writer over a single destination stream that understands
/// ANSI styling. One Printer instance is used per consumer (stdout body,
/// stderr diagnostics); they never share a style stack.
pub struct Printer<W: Write> {
    out: W,
    mode: ColorMode,
    stack: Vec<Style>,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, mode: ColorMode) -> Self {
        Self {
            out,
            mode,
            stack: Vec::new(),
        }
    }

    pub fn colorize(&self) -> bool {
        self.mode.enabled()
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    /// Writes raw bytes with no styling.
    pub fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }

    /// Pushes a style, emitting its ANSI sequence immediately (a no-op
    /// when colour is disabled). The style is applied to subsequent
    /// `write_str` calls until `pop_style`.
    pub fn push_style(&mut self, style: Style) -> io::Result<()> {
        self.stack.push(style);
        if self.colorize() {
            self.out.write_all(style.ansi_on().as_bytes())?;
        }
        Ok(())
    }

    /// Pops the most recently pushed style, resets all attributes, and
    /// re-emits the remaining stack so a sibling span keeps its own
    /// styling after this one closes.
    pub fn pop_style(&mut self) -> io::Result<()> {
        self.stack.pop();
        if self.colorize() {
            self.out.write_all(b"\x1b[0m")?;
            for style in &self.stack {
                self.out.write_all(style.ansi_on().as_bytes())?;
            }
        }
        Ok(())
    }

    /// Writes `text` wrapped in `style`, restoring the prior stack state.
    pub fn styled(&mut self, style: Style, text: &str) -> io::Result<()> {
        self.push_style(style)?;
        self.write_str(text)?;
        self.pop_style()
    }

    pub fn newline(&mut self) -> io::Result<()> {
        self.out.write_all(b"\n")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
