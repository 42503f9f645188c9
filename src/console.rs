// User actions over the record store: refresh, filter, export, delete

use crate::api::ConsultationApi;
use crate::export::{self, DateTimeFormats};
use crate::filter::{FilterCriteria, apply_filters};
use crate::store::RecordStore;
use chrono::{DateTime, TimeZone};
use eyre::Result;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{error, info};

/// Result of a network-backed action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    /// The user declined the confirmation prompt
    Cancelled,
    /// The remote call failed; the store was left untouched
    Failed,
}

/// Yes/no gate in front of destructive actions
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Accepts every prompt (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Prompts on `output` and reads one answer line from `input`
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.output, "{} [y/N] ", prompt).and_then(|_| self.output.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        }
    }
}

/// Controller tying the remote API, the filter engine and the exporter to one store
pub struct Console<A> {
    api: A,
    store: RecordStore,
    criteria: FilterCriteria,
    formats: DateTimeFormats,
}

impl<A: ConsultationApi> Console<A> {
    pub fn new(api: A, formats: DateTimeFormats) -> Self {
        Self {
            api,
            store: RecordStore::new(),
            criteria: FilterCriteria::default(),
            formats,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Mutable access for subscribing to store changes
    pub fn store_mut(&mut self) -> &mut RecordStore {
        &mut self.store
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn criteria_mut(&mut self) -> &mut FilterCriteria {
        &mut self.criteria
    }

    pub fn formats(&self) -> &DateTimeFormats {
        &self.formats
    }

    /// Fetch the full list. On failure the store keeps its previous contents.
    pub fn refresh(&mut self) -> ActionOutcome {
        match self.api.list() {
            Ok(records) => {
                self.store.replace_all(records);
                ActionOutcome::Done
            }
            Err(e) => {
                error!(error = %e, "Error fetching consultations");
                ActionOutcome::Failed
            }
        }
    }

    /// Re-evaluate the current criteria against the full list. Returns the subset size.
    pub fn apply_filters<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> usize {
        let subset = apply_filters(self.store.all(), &self.criteria, now);
        let count = subset.len();
        self.store.set_filtered(subset);
        count
    }

    /// Write the filtered subset to `path`. Returns the number of rows written.
    pub fn export<Tz>(&self, path: &Path, tz: &Tz) -> Result<usize>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        export::export_to_spreadsheet(self.store.filtered(), &self.formats, tz, path)
    }

    /// Fetch, filter and export in one step.
    ///
    /// Returns `None` without touching `path` when the fetch fails, so an
    /// earlier export is never replaced by an empty one.
    pub fn fetch_and_export<Tz>(&mut self, now: &DateTime<Tz>, path: &Path) -> Result<Option<usize>>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        if self.refresh() == ActionOutcome::Failed {
            return Ok(None);
        }
        self.apply_filters(now);
        self.export(path, &now.timezone()).map(Some)
    }

    /// Delete a record after confirmation.
    ///
    /// Nothing is sent when the user declines. The store only changes once the
    /// remote delete has succeeded.
    pub fn delete(&mut self, id: &str, confirm: &mut dyn Confirm) -> ActionOutcome {
        if !confirm.confirm("Are you sure you want to delete this record?") {
            info!(id, "Delete cancelled");
            return ActionOutcome::Cancelled;
        }

        match self.api.delete(id) {
            Ok(()) => {
                self.store.remove(id);
                ActionOutcome::Done
            }
            Err(e) => {
                error!(error = %e, "Error deleting record");
                ActionOutcome::Failed
            }
        }
    }
}
