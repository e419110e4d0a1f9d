//! Colour mode resolution and the fixed set of named ANSI styles.

use std::io::IsTerminal;

/// User-requested colour mode, resolved once at startup against
/// `NO_COLOR`/`FORCE_COLOR` and whether the destination is a TTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    On,
    Off,
}

impl ColorMode {
    /// Resolves `Auto` against env vars and TTY-ness of `out`. `NO_COLOR`
    /// (any value) wins over `FORCE_COLOR`.
    pub fn resolve(requested: ColorMode, out_is_terminal: bool) -> ColorMode {
        match requested {
            ColorMode::On | ColorMode::Off => requested,
            ColorMode::Auto => {
                if std::env::var_os("NO_COLOR").is_some() {
                    ColorMode::Off
                } else if std::env::var_os("FORCE_COLOR").is_some() {
                    ColorMode::On
                } else if out_is_terminal {
                    ColorMode::On
                } else {
                    ColorMode::Off
                }
            }
        }
    }

    pub fn enabled(self) -> bool {
        matches!(self, ColorMode::On)
    }
}

/// Detects whether stdout is attached to a terminal.
pub fn stdout_is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Detects whether stderr is attached to a terminal.
pub fn stderr_is_terminal() -> bool {
    std::io::stderr().is_terminal()
}

/// Named styles used by the pretty-printers. Each maps to a fixed ANSI
/// SGR sequence; colours are the eight standard foreground codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    Dim,
    Italic,
    Underline,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BoldBlue,
}

impl Style {
    pub fn ansi_on(self) -> String {
        let code = match self {
            Style::Bold => "1",
            Style::Dim => "2",
            Style::Italic => "3",
            Style::Underline => "4",
            Style::Black => "30",
            Style::Red => "31",
            Style::Green => "32",
            Style::Yellow => "33",
            Style::Blue => "34",
            Style::Magenta => "35",
            Style::Cyan => "36",
            Style::White => "37",
            Style::BoldBlue => "1;34",
        };
        format!("\x1b[{code}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn no_color_wins_over_force_color() {
        std::env::set_var("NO_COLOR", "1");
        std::env::set_var("FORCE_COLOR", "1");
        assert_eq!(ColorMode::resolve(ColorMode::Auto, true), ColorMode::Off);
        std::env::remove_var("NO_COLOR");
        std::env::remove_var("FORCE_COLOR");
    }

    #[test]
    fn explicit_modes_are_not_overridden() {
        assert_eq!(ColorMode::resolve(ColorMode::On, false), ColorMode::On);
        assert_eq!(ColorMode::resolve(ColorMode::Off, true), ColorMode::Off);
    }
}
