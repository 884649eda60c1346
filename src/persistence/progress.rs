//! Load Progress Printout

use std::io::Write;
use std::path::Path;

/// Carriage-return progress line written while a model loads.
///
/// The line is rewritten only when the whole-percent value changes, so a
/// large model costs about a hundred writes rather than one per row. Write
/// failures are ignored; progress output never affects the load.
pub struct Progress<W: Write> {
    sink: W,
    total: usize,
    processed: usize,
    last_percent: Option<u32>,
    last_written: usize,
}

impl<W: Write> Progress<W> {
    pub fn new(sink: W, total: usize) -> Self {
        Self {
            sink,
            total,
            processed: 0,
            last_percent: None,
            last_written: 0,
        }
    }

    /// Record one processed line
    pub fn tick(&mut self) {
        self.processed += 1;
        let whole = self.percent() as u32;
        if self.last_percent != Some(whole) {
            self.last_percent = Some(whole);
            self.write_line();
        }
    }

    /// Flush the final count and terminate the progress line
    pub fn finish(&mut self, path: &Path) {
        if self.processed != self.last_written {
            self.write_line();
        }
        let _ = writeln!(self.sink, "\ndone with import of '{}'", path.display());
        let _ = self.sink.flush();
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    fn write_line(&mut self) {
        self.last_written = self.processed;
        let _ = write!(
            self.sink,
            "\r progress: {:.4}% ({} lines)",
            self.percent(),
            self.processed
        );
    }

    fn percent(&self) -> f64 {
        // The line count misses a final row without a trailing newline
        let total = self.total.max(1) as f64;
        (100.0 * self.processed as f64 / total).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_output() {
        let mut buf = Vec::new();
        {
            let mut progress = Progress::new(&mut buf, 4);
            progress.tick();
            progress.tick();
            assert_eq!(progress.processed(), 2);
            progress.finish(Path::new("model.txt"));
        }

        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("\r progress: 25.0000% (1 lines)"));
        assert!(out.contains("\r progress: 50.0000% (2 lines)"));
        assert!(out.ends_with("\ndone with import of 'model.txt'\n"));
    }

    #[test]
    fn test_progress_empty_total() {
        let mut buf = Vec::new();
        let mut progress = Progress::new(&mut buf, 0);
        progress.tick();
        progress.tick();
        progress.finish(Path::new("empty.txt"));
        drop(progress);

        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("100.0000% (2 lines)\ndone with import"));
    }

    #[test]
    fn test_progress_writes_once_per_percent() {
        let mut buf = Vec::new();
        let mut progress = Progress::new(&mut buf, 1000);
        for _ in 0..1000 {
            progress.tick();
        }
        progress.finish(Path::new("big.txt"));
        drop(progress);

        let out = String::from_utf8(buf).unwrap();
        // 0% through 100%, one line each
        assert_eq!(out.matches("\r progress:").count(), 101);
        assert!(out.contains("0.1000% (1 lines)"));
        assert!(!out.contains("(2 lines)"));
        assert!(out.contains("100.0000% (1000 lines)\ndone with import"));
    }
}
