//! # Progress and Export Statistics Module
//!
//! Questo modulo gestisce il feedback visivo della CLI e le statistiche di export.
//!
//! ## Responsabilità:
//! - Spinner `indicatif` mentre una richiesta è in corso
//! - Tracking statistiche per richiesta (esportati, troppo grandi, falliti)
//! - Riepilogo finale con byte totali formattati
//!
//! ## Statistiche tracciate:
//! - **assets_selected**: Totale asset ricevuti dal picker
//! - **assets_exported**: Asset esportati con payload
//! - **assets_too_large**: Asset scartati per dimensione
//! - **assets_failed**: Asset non codificabili / non leggibili
//! - **total_bytes**: Byte totali consegnati all'host
//!
//! ## Esempio:
//! ```rust,ignore
//! let mut stats = ExportStats::new();
//! for result in &results {
//!     stats.record(result);
//! }
//! info!("📊 {}", stats.format_summary());
//! ```

use crate::export::{ExportOutcome, ExportResult};
use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner per operazioni di durata indeterminata
pub struct ProgressManager;

impl ProgressManager {
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();

        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);

        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        spinner
    }
}

/// Statistics for one media request
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportStats {
    pub assets_selected: usize,
    pub assets_exported: usize,
    pub assets_too_large: usize,
    pub assets_failed: usize,
    pub videos_failed: usize,
    pub total_bytes: u64,
}

impl ExportStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &ExportResult) {
        self.assets_selected += 1;
        match &result.outcome {
            ExportOutcome::Ok { byte_size, .. } => {
                self.assets_exported += 1;
                self.total_bytes += byte_size;
            }
            ExportOutcome::TooLarge { .. } => self.assets_too_large += 1,
            ExportOutcome::EncodeFailed { .. } => {
                self.assets_failed += 1;
                if result.source.is_video() {
                    self.videos_failed += 1;
                }
            }
        }
    }

    pub fn all_failed(&self) -> bool {
        self.assets_selected > 0 && self.assets_exported == 0
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Selected: {} | Exported: {} | Too large: {} | Failed: {} | Total: {}",
            self.assets_selected,
            self.assets_exported,
            self.assets_too_large,
            self.assets_failed,
            FileManager::format_size(self.total_bytes)
        )
    }
}
