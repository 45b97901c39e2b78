//! 📊 progress.rs — "Are we there yet?" — every mirror, every time, forever.
//!
//! 🚀 Two audiences, two channels:
//! - stdout gets one plain line per key (`skipped`, `transferred`, `failed`), greppable,
//!   pipeable, boring on purpose.
//! - stderr gets an indicatif spinner with running counts, if anyone is watching.
//!
//! At the end, a comfy-table summary lands on stdout, because "it finished" deserves
//! more than a shrug.
//!
//! ⚠️  Warning: Watching this spinner will not make it go faster.
//! Neither will refreshing it. We've tried. Science says no.

use std::io::Write;
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::mirror::{KeyReport, SyncOutcome};

// -- 📏 one mebibyte — not a megabyte, pedants. there's a difference and I will die on this hill.
const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// 📦 Bytes for humans. "1073741824 bytes" is a war crime in a UI.
pub(crate) fn format_bytes(bytes: u64) -> String {
    if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= 1024 {
        format!("{:.2} KiB", bytes as f64 / 1024.0)
    } else {
        // -- 🐛 raw bytes mode. small files need love too.
        format!("{} bytes", bytes)
    }
}

/// 🔢 "1000000" → "1,000,000". You're welcome, eyes.
pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ MM:SS or HH:MM:SS. If it shows HH:MM:SS, you should probably call your mom.
pub(crate) fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 🧾 The stdout line for one key: `<action> <key> (<detail>)`.
pub(crate) fn progress_line(report: &KeyReport) -> String {
    let (the_action, the_detail) = match &report.outcome {
        SyncOutcome::Skipped => ("skipped", "already exists at destination".to_string()),
        SyncOutcome::Transferred { bytes } => ("transferred", format_bytes(*bytes)),
        SyncOutcome::Failed(failure) => ("failed", failure.to_string()),
    };
    format!("{:<11} {} ({})", the_action, report.key, the_detail)
}

/// 🔢 Running totals for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunTally {
    pub processed: u64,
    pub skipped: u64,
    pub transferred: u64,
    pub failed: u64,
    pub bytes_transferred: u64,
}

impl RunTally {
    fn record(&mut self, outcome: &SyncOutcome) {
        self.processed += 1;
        match outcome {
            SyncOutcome::Skipped => self.skipped += 1,
            SyncOutcome::Transferred { bytes } => {
                self.transferred += 1;
                self.bytes_transferred += bytes;
            }
            SyncOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// 📊 Turns key reports into stdout lines, a spinner, and a final table.
///
/// # Ancient Proverb
/// "He who mirrors a bucket without output, mirrors alone and in darkness."
pub(crate) struct ProgressReporter {
    out: Box<dyn Write + Send>,
    spinner: ProgressBar,
    tally: RunTally,
    start_time: Instant,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 the writer is a trait object and the spinner is a diva. tally only.
        f.debug_struct("ProgressReporter")
            .field("tally", &self.tally)
            .finish()
    }
}

impl ProgressReporter {
    /// 🚀 Lines to stdout, spinner to stderr (if asked for).
    pub(crate) fn stdout(show_spinner: bool) -> Self {
        let the_spinner = if show_spinner {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed_precise}]")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner
        } else {
            ProgressBar::hidden()
        };
        Self::new(Box::new(std::io::stdout()), the_spinner)
    }

    /// 🧪 Lines to any writer, no spinner. Tests live here.
    pub(crate) fn to_writer(out: Box<dyn Write + Send>) -> Self {
        Self::new(out, ProgressBar::hidden())
    }

    fn new(out: Box<dyn Write + Send>, spinner: ProgressBar) -> Self {
        Self {
            out,
            spinner,
            tally: RunTally::default(),
            start_time: Instant::now(),
        }
    }

    pub(crate) fn tally(&self) -> RunTally {
        self.tally
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 🔄 One key done: count it, print it, nudge the spinner.
    pub(crate) fn record(&mut self, report: &KeyReport) {
        self.tally.record(&report.outcome);
        let the_line = progress_line(report);
        self.write_line(&the_line);
        self.spinner.set_message(format!(
            "{} transferred · {} skipped · {} failed",
            format_number(self.tally.transferred),
            format_number(self.tally.skipped),
            format_number(self.tally.failed),
        ));
    }

    /// ✅ Stop the spinner and print the summary table.
    pub(crate) fn finish(&mut self, keys_listed: u64, completion: &str) {
        self.spinner.finish_and_clear();
        let the_table = self.summary_table(keys_listed, completion);
        self.write_line(&the_table.to_string());
    }

    fn write_line(&mut self, line: &str) {
        let out = &mut self.out;
        // -- 🎨 suspend so the spinner doesn't get printed into the middle of our line
        let the_result = self.spinner.suspend(|| {
            writeln!(out, "{line}").and_then(|_| out.flush())
        });
        if let Err(err) = the_result {
            warn!("⚠️ could not write progress output: {err}");
        }
    }

    fn summary_table(&self, keys_listed: u64, completion: &str) -> Table {
        let the_elapsed = self.elapsed();
        let the_secs = the_elapsed.as_secs_f64();
        let the_throughput = if the_secs > 0.0 {
            (self.tally.bytes_transferred as f64 / the_secs) / MIB as f64
        } else {
            0.0
        };
        let the_not_attempted = keys_listed.saturating_sub(self.tally.processed);

        let rows = [
            ("run", completion.to_string()),
            ("keys listed", format_number(keys_listed)),
            ("transferred", format_number(self.tally.transferred)),
            ("skipped", format_number(self.tally.skipped)),
            ("failed", format_number(self.tally.failed)),
            ("not attempted", format_number(the_not_attempted)),
            ("bytes copied", format_bytes(self.tally.bytes_transferred)),
            ("elapsed", format_duration(the_elapsed)),
            ("throughput", format!("{:.2} MiB/s", the_throughput)),
        ];

        // 🍽️ two columns, no borders (preset: NOTHING). minimalists. also the borders looked bad.
        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        for (label, value) in rows {
            table.add_row(vec![
                Cell::new(label).set_alignment(CellAlignment::Right),
                Cell::new(value).set_alignment(CellAlignment::Left),
            ]);
        }
        table
    }
}

/// 🧪 A `Write` that tests can read back after handing a clone to the reporter.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct SharedBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        let the_bytes = self.0.lock().expect("💀 buffer mutex poisoned").clone();
        String::from_utf8(the_bytes).expect("💀 progress output should be utf-8")
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .expect("💀 buffer mutex poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
