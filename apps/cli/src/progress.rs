use std::{
    io::{self, Write},
    time::{Duration, Instant},
};

use clipdex_core::{BuildProgress, ItemOutcome, format_duration, format_outcome};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Prints one line per document above a spinner for the one in flight.
///
/// When the spinner is hidden (stderr is not a terminal) the lines go to `out`
/// instead, including one per document as it starts.
pub struct CliProgress<W: Write = io::Stdout> {
    spinner: ProgressBar,
    out: W,
    item_start: Instant,
    index: usize,
}

impl CliProgress {
    pub fn new() -> Self {
        Self::with_output(create_spinner("Listing objects..."), io::stdout())
    }
}

impl<W: Write> CliProgress<W> {
    pub fn with_output(spinner: ProgressBar, out: W) -> Self {
        Self {
            spinner,
            out,
            item_start: Instant::now(),
            index: 0,
        }
    }

    pub fn abandon(&self) {
        self.spinner.abandon();
    }

    fn line(&mut self, line: String) {
        if self.spinner.is_hidden() {
            // A closed stdout must not stop the build.
            let _ = writeln!(self.out, "{}", line);
        } else {
            self.spinner.println(line);
        }
    }
}

impl<W: Write> BuildProgress for CliProgress<W> {
    fn scan_finished(&mut self, listed: usize) {
        self.line(format!("{} Found {} objects", style("✓").green().bold(), listed));
    }

    fn item_started(&mut self, index: usize, object: &str) {
        self.index = index;
        self.item_start = Instant::now();
        let message = format!("[{}] Processing: {}", index, object);
        if self.spinner.is_hidden() {
            self.line(message);
        } else {
            self.spinner.set_message(message);
        }
    }

    fn item_finished(&mut self, outcome: &ItemOutcome) {
        let elapsed = style(format!("[{}]", format_duration(self.item_start.elapsed()))).dim();
        let line = match outcome {
            ItemOutcome::Cataloged { .. } => format!(
                "{} [{}] {} {}",
                style("✓").green().bold(),
                self.index,
                format_outcome(outcome),
                elapsed
            ),
            ItemOutcome::Skipped { .. } => format!(
                "{} [{}] {}",
                style("!!").yellow().bold(),
                self.index,
                format_outcome(outcome)
            ),
        };
        self.line(line);
    }

    fn catalog_written(&mut self, object: &str, entries: usize) {
        self.spinner.finish_and_clear();
        let _ = writeln!(
            self.out,
            "{} Uploaded {} ({} entries)",
            style("✓").green().bold(),
            style(object).cyan(),
            entries
        );
    }
}
