//! Terminal output for the client shell.
//!
//! A spinner runs while the shell is loading; pairs are printed above it as
//! they arrive. With `--json` nothing is printed until the end, when the
//! collected pairs are written as one `{"results":[...]}` document.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use simulon_types::think::{QaPair, ThinkBatch};

pub struct Renderer {
    json: bool,
    spinner: Option<ProgressBar>,
    printed: usize,
}

impl Renderer {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            spinner: None,
            printed: 0,
        }
    }

    /// Show the loading spinner.
    pub fn start(&mut self, message: &str) {
        if self.json {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Print one pair as soon as it arrives.
    pub fn pair(&mut self, pair: &QaPair) {
        if self.json {
            return;
        }
        self.printed += 1;
        let text = format_pair(self.printed, pair);
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| println!("{text}")),
            None => println!("{text}"),
        }
    }

    /// Print every pair not printed yet (batch mode, failure placeholder).
    pub fn catch_up(&mut self, pairs: &[QaPair]) {
        for pair in pairs.iter().skip(self.printed) {
            self.pair(pair);
        }
    }

    /// Number the next pair from 1 again (the list was replaced).
    pub fn restart_numbering(&mut self) {
        self.printed = 0;
    }

    /// Hide the spinner.
    pub fn stop(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    pub fn reply(&self, text: &str) {
        if self.json {
            println!("{}", serde_json::json!({ "result": text }));
        } else {
            println!("{text}");
        }
    }

    pub fn warn(&self, message: &str) {
        if !self.json {
            eprintln!("  {} {}", style("!").yellow().bold(), style(message).yellow());
        }
    }

    /// Final output: the JSON document in `--json` mode, nothing otherwise.
    pub fn finish(&mut self, pairs: &[QaPair]) {
        self.stop();
        if self.json {
            let batch = ThinkBatch {
                results: pairs.to_vec(),
            };
            match serde_json::to_string_pretty(&batch) {
                Ok(text) => println!("{text}"),
                Err(e) => eprintln!("failed to encode results: {e}"),
            }
        }
    }
}

fn format_pair(index: usize, pair: &QaPair) -> String {
    let label = format!("Q{index}");
    let answer = pair
        .a
        .lines()
        .map(|line| format!("      {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "\n  {} {}\n{}",
        style(label).cyan().bold(),
        style(&pair.q).bold(),
        style(answer).dim()
    )
}
