//! Console status output.

use crate::block::render_entries;
use crate::entry::OverrideSet;
use console::{Term, style};
use std::time::Duration;

/// Prints session status to stdout.
#[derive(Debug, Clone)]
pub struct Console {
    term: Term,
    clear: bool,
}

impl Console {
    /// Creates a display on stdout. `clear` wipes the screen before each
    /// status print.
    #[must_use]
    pub fn new(clear: bool) -> Self {
        Self {
            term: Term::stdout(),
            clear,
        }
    }

    /// Shows the mappings now in effect.
    pub fn active(&self, entries: &OverrideSet, refresh: Option<Duration>) {
        if self.clear && self.term.is_term() {
            if let Err(e) = self.term.clear_screen() {
                tracing::debug!(error = %e, "Failed to clear screen");
            }
        }
        self.line(&format_active(entries, refresh));
    }

    /// Announces teardown.
    pub fn stopping(&self) {
        self.line(&format!("\n{}", style("Restoring hosts file...").yellow()));
    }

    fn line(&self, text: &str) {
        if let Err(e) = self.term.write_line(text) {
            tracing::debug!(error = %e, "Failed to write status");
        }
    }
}

fn format_active(entries: &OverrideSet, refresh: Option<Duration>) -> String {
    let mut out = format!(
        "\n{} Overriding hosts file entries for the lifetime of the process\n",
        style("hosts-override:").green().bold()
    );
    if let Some(interval) = refresh {
        out.push_str(&format!("\n(Refreshing every {}s)...\n", interval.as_secs()));
    }
    out.push('\n');
    out.push_str(&render_entries(entries));
    out.push_str(&format!(
        "\n{}",
        style("Press CTRL-C to exit gracefully (hosts file will reset)").dim()
    ));
    out
}
