//! Stdout presentation of view updates.

use std::fmt::Write as _;
use std::io::Write as _;

use walletview_sync::{apply_changes, CounterpartyMatch, TransactionRow, ViewUpdate};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary and transaction table.
    Text,
    /// One JSON object per update.
    Json,
}

/// Consumes view updates on the main task.
///
/// Keeps its own row list up to date by applying each update's changes, the
/// way an interactive view would.
pub struct Sink {
    format: OutputFormat,
    rows: Vec<TransactionRow>,
}

impl Sink {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            rows: Vec::new(),
        }
    }

    pub fn present(&mut self, update: &ViewUpdate) -> anyhow::Result<()> {
        apply_changes(&mut self.rows, &update.changes);
        if self.rows != update.model.transactions {
            tracing::warn!(
                sequence = update.sequence,
                "row changes diverged from view model, resetting rows"
            );
            self.rows = update.model.transactions.clone();
        }

        let rendered = match self.format {
            OutputFormat::Text => render_text(update, &self.rows),
            OutputFormat::Json => serde_json::to_string(&update.model)? + "\n",
        };
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

fn counterparty_cell(counterparty: &CounterpartyMatch) -> String {
    match counterparty {
        CounterpartyMatch::Unique(address) => address.to_string(),
        CounterpartyMatch::Ambiguous { chosen, candidates } => {
            format!("{chosen} (ambiguous, {} candidates)", candidates.len())
        }
        CounterpartyMatch::Unmatched => "-".to_string(),
    }
}

pub fn render_text(update: &ViewUpdate, rows: &[TransactionRow]) -> String {
    let model = &update.model;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== update #{} ({} row changes) ==",
        update.sequence,
        update.changes.len()
    );
    let _ = writeln!(
        out,
        "Available: {} | Locked: {}",
        model.available_balance, model.locked_balance
    );
    let _ = writeln!(out, "Address: {}", model.primary_address);
    let _ = writeln!(out, "{}", model.status_summary);
    for row in rows {
        let _ = writeln!(
            out,
            "  {:<3} {:<11} {:>16}  {}  {}",
            row.direction.as_str(),
            if row.confirmed { "confirmed" } else { "unconfirmed" },
            row.display_amount,
            row.display_time,
            counterparty_cell(&row.counterparty)
        );
    }
    out
}
