//! Edit session: owns the live table and reconciles pending cell edits.
//!
//! Front ends queue `ChangeRecord`s as the user types. Nothing touches the
//! table until a transition is requested:
//! - commit  -> `EditState::Changed`: apply every pending record, in order
//! - revert  -> `EditState::Reset`:   drop every pending record
//! - load    -> `EditState::Original`: nothing to reconcile
//!
//! Each transition is followed by exactly one `update()`, which performs the
//! state's effect once and returns the session to `Original` to wait for the
//! next action. The statistics summary is rebuilt after every load and commit.

use serde::Serialize;

use crate::cell::CellValue;
use crate::error::TableError;
use crate::stats::{describe, Summary};
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditState {
    /// Nothing to reconcile; pending edits are left alone
    #[default]
    Original,
    /// Pending edits must be written into the table
    Changed,
    /// Pending edits must be dropped; the table keeps its committed values
    Reset,
}

/// One observed cell edit awaiting reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub column_name: String,
    pub column_index: usize,
    pub row_index: usize,
    pub old_value: CellValue,
    pub new_value: CellValue,
}

impl ChangeRecord {
    pub fn new(
        column_name: impl Into<String>,
        column_index: usize,
        row_index: usize,
        old_value: CellValue,
        new_value: CellValue,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            column_index,
            row_index,
            old_value,
            new_value,
        }
    }
}

/// A record the apply step could not place.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEdit {
    pub change: ChangeRecord,
    pub error: TableError,
}

/// Outcome of one `update()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    /// State whose effect was performed
    pub state: EditState,
    pub applied: usize,
    pub discarded: usize,
    pub rejected: Vec<RejectedEdit>,
}

impl UpdateReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct EditSession {
    table: Table,
    summary: Summary,
    pending: Vec<ChangeRecord>,
    state: EditState,
}

impl EditSession {
    pub fn new(table: Table) -> Self {
        let summary = describe(&table);
        Self {
            table,
            summary,
            pending: Vec::new(),
            state: EditState::Original,
        }
    }

    /// Replace the table with a freshly loaded one.
    ///
    /// Edits queued against the previous table are dropped.
    pub fn load(&mut self, table: Table) -> UpdateReport {
        if !self.pending.is_empty() {
            log::info!("load: dropping {} edit(s) queued against the previous table", self.pending.len());
            self.pending.clear();
        }
        self.table = table;
        self.summary = describe(&self.table);
        self.set_state(EditState::Original);
        self.update()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Statistics for the table as of the last load or commit.
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn pending(&self) -> &[ChangeRecord] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Queue a change record as observed by the front end. Records are not
    /// validated here; bad addresses are rejected when applied.
    pub fn record(&mut self, change: ChangeRecord) {
        log::debug!(
            "queued edit {}[{}]: {} -> {}",
            change.column_name, change.row_index, change.old_value, change.new_value
        );
        self.pending.push(change);
    }

    /// Queue an edit of an existing cell, filling in the column index and the
    /// value the user currently sees (the latest pending value for that cell,
    /// else the committed one).
    pub fn record_edit(&mut self, column: &str, row: usize, new_value: CellValue) -> Result<(), TableError> {
        let column_index = self
            .table
            .column_index(column)
            .ok_or_else(|| TableError::UnknownColumn(column.to_string()))?;
        let committed = self.table.get(column, row).ok_or_else(|| TableError::RowOutOfRange {
            column: column.to_string(),
            row,
            len: self.table.column(column).map_or(0, <[CellValue]>::len),
        })?;

        let old_value = self
            .pending
            .iter()
            .rev()
            .find(|c| c.column_name == column && c.row_index == row)
            .map_or(committed, |c| &c.new_value)
            .clone();

        self.record(ChangeRecord::new(column, column_index, row, old_value, new_value));
        Ok(())
    }

    pub fn set_state(&mut self, state: EditState) {
        log::debug!("edit session: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Perform the current state's effect once, then go quiescent.
    pub fn update(&mut self) -> UpdateReport {
        let report = match self.state {
            EditState::Original => UpdateReport { state: EditState::Original, ..UpdateReport::default() },
            EditState::Changed => self.apply_pending(),
            EditState::Reset => self.discard_pending(),
        };
        self.state = EditState::Original;
        report
    }

    /// Commit action: `Changed` followed by `update()`.
    pub fn commit(&mut self) -> UpdateReport {
        self.set_state(EditState::Changed);
        self.update()
    }

    /// Revert action: `Reset` followed by `update()`.
    pub fn reset(&mut self) -> UpdateReport {
        self.set_state(EditState::Reset);
        self.update()
    }

    fn apply_pending(&mut self) -> UpdateReport {
        let changes = std::mem::take(&mut self.pending);
        let mut report = UpdateReport { state: EditState::Changed, ..UpdateReport::default() };

        for change in changes {
            match self.table.set(&change.column_name, change.row_index, change.new_value.clone()) {
                Ok(previous) => {
                    if previous != change.old_value {
                        log::debug!(
                            "edit {}[{}] expected old value {} but found {}",
                            change.column_name, change.row_index, change.old_value, previous
                        );
                    }
                    report.applied += 1;
                }
                Err(error) => {
                    log::warn!("rejected edit: {error}");
                    report.rejected.push(RejectedEdit { change, error });
                }
            }
        }

        self.summary = describe(&self.table);
        log::info!("commit: {} applied, {} rejected", report.applied, report.rejected.len());
        report
    }

    fn discard_pending(&mut self) -> UpdateReport {
        let discarded = self.pending.len();
        self.pending.clear();
        log::info!("reset: {discarded} pending edit(s) discarded");
        UpdateReport { state: EditState::Reset, discarded, ..UpdateReport::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{StatValue, SummaryStat};

    fn session() -> EditSession {
        EditSession::new(Table::from_raw(
            ["city", "temp"],
            vec![
                vec!["Oslo".into(), "4".into()],
                vec!["Lima".into(), "19".into()],
                vec!["Cairo".into(), "28".into()],
            ],
        ))
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    #[test]
    fn test_commit_applies_pending_in_order() {
        let mut s = session();
        s.record_edit("temp", 0, num(5.0)).unwrap();
        s.record_edit("temp", 0, num(6.0)).unwrap();
        s.record_edit("city", 2, CellValue::from_input("Giza")).unwrap();

        let report = s.commit();
        assert_eq!(report.state, EditState::Changed);
        assert_eq!(report.applied, 3);
        assert!(report.is_clean());
        assert!(!s.has_pending());
        assert_eq!(s.state(), EditState::Original);

        // Later record for the same cell wins
        assert_eq!(s.table().get("temp", 0), Some(&num(6.0)));
        assert_eq!(s.table().get("city", 2), Some(&CellValue::Text("Giza".to_string())));
    }

    #[test]
    fn test_record_edit_tracks_visible_old_value() {
        let mut s = session();
        s.record_edit("temp", 1, num(20.0)).unwrap();
        s.record_edit("temp", 1, num(21.0)).unwrap();
        assert_eq!(s.pending()[0].old_value, num(19.0));
        assert_eq!(s.pending()[1].old_value, num(20.0));
        assert_eq!(s.pending()[1].column_index, 1);
    }

    #[test]
    fn test_record_edit_rejects_missing_cells() {
        let mut s = session();
        assert_eq!(
            s.record_edit("wind", 0, num(1.0)),
            Err(TableError::UnknownColumn("wind".to_string()))
        );
        assert_eq!(
            s.record_edit("temp", 9, num(1.0)),
            Err(TableError::RowOutOfRange { column: "temp".to_string(), row: 9, len: 3 })
        );
        assert!(!s.has_pending());
    }

    #[test]
    fn test_commit_recomputes_summary() {
        let mut s = session();
        assert_eq!(s.summary().get(SummaryStat::Max, "temp"), Some(StatValue::Value(28.0)));
        s.record_edit("temp", 2, num(40.0)).unwrap();
        // Not committed yet
        assert_eq!(s.summary().get(SummaryStat::Max, "temp"), Some(StatValue::Value(28.0)));
        s.commit();
        assert_eq!(s.summary().get(SummaryStat::Max, "temp"), Some(StatValue::Value(40.0)));
    }

    #[test]
    fn test_commit_is_idempotent() {
        let mut s = session();
        let change = ChangeRecord::new("temp", 1, 1, num(19.0), num(22.0));

        s.record(change.clone());
        s.commit();
        let after_first = s.table().clone();

        s.record(change);
        let report = s.commit();
        assert_eq!(report.applied, 1);
        assert_eq!(s.table(), &after_first);
        assert!(!s.has_pending());
    }

    #[test]
    fn test_reset_discards_without_touching_table() {
        let mut s = session();
        let snapshot = s.table().clone();
        s.record_edit("temp", 0, num(-3.0)).unwrap();
        s.record_edit("city", 1, CellValue::from_input("Quito")).unwrap();

        let report = s.reset();
        assert_eq!(report.state, EditState::Reset);
        assert_eq!(report.discarded, 2);
        assert_eq!(report.applied, 0);
        assert_eq!(s.table(), &snapshot);
        assert!(!s.has_pending());
    }

    #[test]
    fn test_original_update_leaves_pending_alone() {
        let mut s = session();
        s.record_edit("temp", 0, num(1.0)).unwrap();
        s.set_state(EditState::Original);
        let report = s.update();
        assert_eq!(report, UpdateReport::default());
        assert_eq!(s.pending().len(), 1);
        assert_eq!(s.table().get("temp", 0), Some(&num(4.0)));
    }

    #[test]
    fn test_out_of_range_records_are_skipped() {
        let mut s = session();
        s.record(ChangeRecord::new("temp", 1, 0, num(4.0), num(5.0)));
        s.record(ChangeRecord::new("temp", 1, 7, num(0.0), num(1.0)));
        s.record(ChangeRecord::new("pressure", 5, 0, num(0.0), num(1.0)));
        s.record(ChangeRecord::new("temp", 1, 2, num(28.0), num(30.0)));

        let report = s.commit();
        assert_eq!(report.applied, 2);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].change.row_index, 7);
        assert_eq!(
            report.rejected[1].error,
            TableError::UnknownColumn("pressure".to_string())
        );
        assert_eq!(s.table().get("temp", 0), Some(&num(5.0)));
        assert_eq!(s.table().get("temp", 2), Some(&num(30.0)));
        assert!(!s.has_pending());
    }

    #[test]
    fn test_load_replaces_table_and_drops_pending() {
        let mut s = session();
        s.record_edit("temp", 0, num(1.0)).unwrap();

        let report = s.load(Table::from_raw(["n"], vec![vec!["1".into()], vec!["2".into()]]));
        assert_eq!(report.state, EditState::Original);
        assert!(!s.has_pending());
        assert_eq!(s.table().column_names().collect::<Vec<_>>(), vec!["n"]);
        assert_eq!(s.summary().columns(), &["n".to_string()]);
        assert_eq!(s.summary().get(SummaryStat::Mean, "n"), Some(StatValue::Value(1.5)));
    }
}
