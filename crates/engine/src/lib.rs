//! `tabula-engine`: columnar table core.
//!
//! Pure engine crate: receives raw rows from a loader, owns the live table,
//! computes column statistics and reconciles pending edits. No IO.

pub mod cell;
pub mod error;
pub mod session;
pub mod stats;
pub mod table;

pub use cell::{CellValue, RawValue};
pub use error::{DataShapeError, StatsError, TableError};
pub use session::{ChangeRecord, EditSession, EditState, RejectedEdit, UpdateReport};
pub use stats::{describe, Quantile, StatCalculation, StatValue, Statistic, Summary, SummaryRow, SummaryStat};
pub use table::{transpose, Column, Table};
