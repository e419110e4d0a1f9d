//! Timing waterfall: named interval spans rendered as a proportional
//! bar per phase (§3 TimingSpans, §4.10).

use crate::printer::color::Style;
use crate::printer::Printer;
use std::io::Write;
use std::time::Duration;

const WATERFALL_WIDTH: usize = 40;

/// One attempt's named phase durations. Zero-duration phases (common on
/// loopback) are omitted from rendered output.
#[derive(Debug, Clone, Default)]
pub struct TimingSpans {
    pub dns: Duration,
    pub tcp: Duration,
    pub tls: Duration,
    pub ttfb: Duration,
    pub body: Duration,
}

impl TimingSpans {
    pub fn total(&self) -> Duration {
        self.dns + self.tcp + self.tls + self.ttfb + self.body
    }

    fn phases(&self) -> Vec<(&'static str, Duration)> {
        [
            ("DNS", self.dns),
            ("TCP", self.tcp),
            ("TLS", self.tls),
            ("TTFB", self.ttfb),
            ("Body", self.body),
        ]
        .into_iter()
        .filter(|(_, d)| !d.is_zero())
        .collect()
    }
}

/// Renders one attempt's waterfall: a proportional bar per non-zero
/// phase followed by a total row.
pub fn render_waterfall<W: Write>(
    printer: &mut Printer<W>,
    spans: &TimingSpans,
    attempt: usize,
) -> std::io::Result<()> {
    let total = spans.total();
    printer.push_style(Style::Dim)?;
    printer.write_str(&format!("* attempt {attempt}\n"))?;
    printer.pop_style()?;

    for (name, duration) in spans.phases() {
        let ratio = if total.is_zero() {
            0.0
        } else {
            duration.as_secs_f64() / total.as_secs_f64()
        };
        let filled = (ratio * WATERFALL_WIDTH as f64).round() as usize;
        let bar: String = (0..WATERFALL_WIDTH)
            .map(|i| if i < filled { '=' } else { ' ' })
            .collect();
        printer.write_str(&format!("  {name:<5} [{bar}] {:>7.2}ms\n", duration.as_secs_f64() * 1000.0))?;
    }
    printer.write_str(&format!("  {:<5} {:>7.2}ms\n", "Total", total.as_secs_f64() * 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::color::ColorMode;

    #[test]
    fn zero_duration_phases_are_hidden() {
        let spans = TimingSpans {
            dns: Duration::ZERO,
            tcp: Duration::from_millis(5),
            tls: Duration::ZERO,
            ttfb: Duration::from_millis(10),
            body: Duration::from_millis(2),
        };
        assert_eq!(spans.phases().len(), 3);
    }

    #[test]
    fn waterfall_renders_total_row() {
        let mut buf = Vec::new();
        {
            let mut printer = Printer::new(&mut buf, ColorMode::Off);
            let spans = TimingSpans {
                tcp: Duration::from_millis(5),
                ..Default::default()
            };
            render_waterfall(&mut printer, &spans, 1).unwrap();
        }
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Total"));
        assert!(out.contains("TCP"));
    }
}
