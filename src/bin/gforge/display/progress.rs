use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use graph_forge::{MoleculeReport, PipelineObserver};
use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

pub struct StepSpinner {
    bar: Option<ProgressBar>,
    start: Instant,
    step: u8,
    total_steps: u8,
    step_start: Instant,
    description: String,
}

impl StepSpinner {
    pub fn new(total_steps: u8) -> Self {
        let now = Instant::now();
        Self {
            bar: None,
            start: now,
            step: 0,
            total_steps,
            step_start: now,
            description: String::new(),
        }
    }

    fn label(&self) -> String {
        format!("[{}/{}] {}", self.step, self.total_steps, self.description)
    }

    pub fn step(&mut self, description: &str) {
        self.clear();
        self.step += 1;
        self.step_start = Instant::now();
        self.description = description.to_string();

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .expect("invalid template")
                .tick_chars(TICKS),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        bar.set_message(format!("{}...", self.label()));
        self.bar = Some(bar);
    }

    /// Swaps the step's spinner for a per-molecule bar.
    pub fn molecule_bar(&mut self) -> MoleculeBar {
        self.clear();
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.cyan} {prefix} [{bar:28.cyan/blue}] {pos}/{len} {wide_msg}")
                .expect("invalid template")
                .tick_chars(TICKS)
                .progress_chars("━╸ "),
        );
        bar.set_prefix(self.label());
        bar.enable_steady_tick(Duration::from_millis(80));
        MoleculeBar::with_bar(bar)
    }

    pub fn complete_step(&mut self, description: &str, substeps: &[&str]) {
        self.clear();

        let elapsed = self.step_start.elapsed();
        let mut stderr = io::stderr().lock();

        let _ = writeln!(
            stderr,
            "  \x1b[32m✓\x1b[0m {:<44} {:>5.1}s",
            description,
            elapsed.as_secs_f64()
        );
        for substep in substeps {
            let _ = writeln!(stderr, "      \x1b[2m·\x1b[0m {}", substep);
        }
    }

    pub fn finish(mut self, label: &str) {
        self.clear();
        print_footer(label, self.start.elapsed());
    }

    fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn print_footer(label: &str, elapsed: Duration) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(
        stderr,
        "  \x1b[2m╺━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━╸\x1b[0m"
    );
    let _ = writeln!(stderr);
    let _ = writeln!(
        stderr,
        "  \x1b[32m✓\x1b[0m {:<20} {:>33}",
        label,
        format!("Total: {:.2}s", elapsed.as_secs_f64())
    );
    let _ = writeln!(stderr);
}

/// Observes a pipeline run; draws a bar when interactive.
pub struct MoleculeBar {
    bar: Option<ProgressBar>,
    failed: AtomicUsize,
}

impl MoleculeBar {
    pub fn hidden() -> Self {
        Self {
            bar: None,
            failed: AtomicUsize::new(0),
        }
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar: Some(bar),
            failed: AtomicUsize::new(0),
        }
    }

    /// Clears the bar and returns how many molecules failed assignment.
    pub fn finish(self) -> usize {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        self.failed.into_inner()
    }
}

impl PipelineObserver for MoleculeBar {
    fn run_started(&self, molecules: usize) {
        if let Some(bar) = &self.bar {
            bar.set_length(molecules as u64);
        }
    }

    fn molecule_done(&self, report: &MoleculeReport) {
        if !report.is_assigned() {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(bar) = &self.bar {
            bar.set_message(format!(
                "{} ({}/{} kept)",
                report.molecule_id, report.accepted, report.conformations
            ));
            bar.inc(1);
        }
    }
}

pub enum Progress {
    Interactive(StepSpinner),
    Silent,
}

impl Progress {
    pub fn new(interactive: bool, total_steps: u8) -> Self {
        if interactive {
            Self::Interactive(StepSpinner::new(total_steps))
        } else {
            Self::Silent
        }
    }

    pub fn step(&mut self, description: &str) {
        if let Self::Interactive(s) = self {
            s.step(description);
        }
    }

    pub fn molecule_bar(&mut self) -> MoleculeBar {
        match self {
            Self::Interactive(s) => s.molecule_bar(),
            Self::Silent => MoleculeBar::hidden(),
        }
    }

    pub fn complete_step(&mut self, description: &str, substeps: &[&str]) {
        if let Self::Interactive(s) = self {
            s.complete_step(description, substeps);
        }
    }

    pub fn finish(self, label: &str) {
        if let Self::Interactive(s) = self {
            s.finish(label);
        }
    }
}
