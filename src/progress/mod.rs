//! Progress bar/spinner and the timing waterfall (§4.10).

pub mod timing;

pub use timing::TimingSpans;

use std::io::{IsTerminal, Write};
use std::time::{Duration, Instant};

const BAR_WIDTH: usize = 30;
const RENDER_INTERVAL: Duration = Duration::from_millis(100);
const SPINNER_FRAMES: &[char] = &['|', '/', '-', '\\'];

/// Wraps response body consumption with a progress indicator on stderr.
/// Renders at most every ~100 ms, plus once on completion. Silent unless
/// stderr is a TTY; the caller is responsible for suppressing this when
/// the body itself is being dumped to stderr.
pub struct Progress {
    total: Option<u64>,
    read: u64,
    last_render: Option<Instant>,
    frame: usize,
    active: bool,
}

impl Progress {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total,
            read: 0,
            last_render: None,
            frame: 0,
            active: std::io::stderr().is_terminal(),
        }
    }

    /// Records `n` newly-read bytes and renders if the interval elapsed.
    pub fn advance(&mut self, n: u64) {
        self.read += n;
        if !self.active {
            return;
        }
        let now = Instant::now();
        if self
            .last_render
            .map(|t| now.duration_since(t) >= RENDER_INTERVAL)
            .unwrap_or(true)
        {
            self.render(now);
        }
    }

    /// Renders a final frame and clears the line.
    pub fn finish(&mut self) {
        if !self.active {
            return;
        }
        self.render(Instant::now());
        eprintln!();
    }

    fn render(&mut self, now: Instant) {
        self.last_render = Some(now);
        let mut stderr = std::io::stderr();
        let line = match self.total {
            Some(total) if total > 0 => {
                let filled = ((self.read as f64 / total as f64) * BAR_WIDTH as f64)
                    .min(BAR_WIDTH as f64) as usize;
                let bar: String = (0..BAR_WIDTH)
                    .map(|i| if i < filled { '#' } else { ' ' })
                    .collect();
                let pct = ((self.read as f64 / total as f64) * 100.0).min(100.0);
                format!("\r[{bar}] {pct:>3.0}% {}/{} bytes", self.read, total)
            }
            _ => {
                self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
                format!("\r{} {} bytes", SPINNER_FRAMES[self.frame], self.read)
            }
        };
        let _ = write!(stderr, "{line}");
        let _ = stderr.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_length_progress_bar_fills_proportionally() {
        let mut progress = Progress {
            total: Some(100),
            read: 0,
            last_render: None,
            frame: 0,
            active: false,
        };
        progress.advance(50);
        assert_eq!(progress.read, 50);
    }

    #[test]
    fn unknown_length_uses_spinner_frames() {
        let mut progress = Progress {
            total: None,
            read: 0,
            last_render: None,
            frame: 0,
            active: false,
        };
        progress.advance(10);
        assert_eq!(progress.read, 10);
    }
}
