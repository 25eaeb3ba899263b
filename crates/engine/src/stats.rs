//! Descriptive statistics over table columns.
//!
//! A `StatCalculation` holds the currently selected `Statistic` and runs it
//! against one column. Strategies are stateless; the percentile parameter is
//! passed on every call and never stored. Text cells are excluded from every
//! numeric aggregate; only `Count` sees them.
//!
//! `describe` runs the fixed eight-statistic summary over every column.

use std::fmt;

use serde::Serialize;

use crate::cell::CellValue;
use crate::error::StatsError;
use crate::table::{transpose, Column, Table};

// =============================================================================
// Values
// =============================================================================

/// Result of a statistic. `Undefined` marks "no eligible numeric values"
/// (mean of an all-text column, std of a single value, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Value(f64),
    Undefined,
}

impl StatValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            StatValue::Value(v) => Some(*v),
            StatValue::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, StatValue::Undefined)
    }

    /// Render for display. `precision` fixes the number of decimals; without
    /// it integral values print without a fraction and others print in full.
    pub fn format(&self, precision: Option<usize>, undefined_label: &str) -> String {
        match (self, precision) {
            (StatValue::Undefined, _) => undefined_label.to_string(),
            (StatValue::Value(v), Some(p)) => format!("{:.*}", p, v),
            (StatValue::Value(v), None) => CellValue::Number(*v).raw_display(),
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(None, "undefined"))
    }
}

/// A percentile parameter, validated to lie in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantile(f64);

impl Quantile {
    pub const FIRST_QUARTILE: Quantile = Quantile(0.25);
    pub const MEDIAN: Quantile = Quantile(0.5);
    pub const THIRD_QUARTILE: Quantile = Quantile(0.75);

    pub fn new(p: f64) -> Result<Self, StatsError> {
        if (0.0..=1.0).contains(&p) {
            Ok(Quantile(p))
        } else {
            Err(StatsError::InvalidPercentile(p))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

// =============================================================================
// Strategies
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Count,
    Mean,
    Std,
    Min,
    Max,
    Percentile,
}

impl Statistic {
    pub fn name(self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::Mean => "mean",
            Statistic::Std => "std",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Percentile => "percentile",
        }
    }

    /// Reduce a column. `quantile` is only read by `Percentile`; a percentile
    /// without one is undefined.
    fn reduce(self, cells: &[CellValue], quantile: Option<Quantile>) -> StatValue {
        let values: Vec<f64> = cells.iter().filter_map(CellValue::as_number).collect();
        match self {
            Statistic::Count => StatValue::Value(cells.len() as f64),
            Statistic::Mean => mean(&values),
            Statistic::Std => sample_std(&values),
            Statistic::Min => min(&values),
            Statistic::Max => max(&values),
            Statistic::Percentile => match quantile {
                Some(q) => percentile(&values, q),
                None => StatValue::Undefined,
            },
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn mean(values: &[f64]) -> StatValue {
    if values.is_empty() {
        return StatValue::Undefined;
    }
    StatValue::Value(rescaled(values, direct_mean))
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> StatValue {
    if values.len() < 2 {
        return StatValue::Undefined;
    }
    StatValue::Value(rescaled(values, direct_std))
}

fn direct_mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn direct_std(values: &[f64]) -> f64 {
    let mean = direct_mean(values);
    let variance = values.iter()
        .map(|x| (x - mean).powi(2))
        .sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Run `f` directly; if finite inputs overflow, run it again on the values
/// divided by their largest magnitude and scale the result back. `f` must be
/// linear in the scale of its input (mean, std).
fn rescaled(values: &[f64], f: fn(&[f64]) -> f64) -> f64 {
    let result = f(values);
    if result.is_finite() || !values.iter().all(|v| v.is_finite()) {
        return result;
    }
    let scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
    f(&scaled) * scale
}

pub fn min(values: &[f64]) -> StatValue {
    values.iter().copied().reduce(f64::min).map_or(StatValue::Undefined, StatValue::Value)
}

pub fn max(values: &[f64]) -> StatValue {
    values.iter().copied().reduce(f64::max).map_or(StatValue::Undefined, StatValue::Value)
}

/// Linear-interpolation quantile (R-7, NumPy's default).
///
/// rank = p * (n - 1); the result interpolates between the sorted values at
/// floor(rank) and ceil(rank) by the fractional part of rank.
pub fn percentile(values: &[f64], quantile: Quantile) -> StatValue {
    if values.is_empty() {
        return StatValue::Undefined;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = quantile.get() * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let (Some(&lo), Some(&hi)) = (sorted.get(lower), sorted.get(upper)) else {
        return StatValue::Undefined;
    };

    if lower == upper || lo == hi {
        return StatValue::Value(lo);
    }
    // Weighted form: hi - lo can overflow for finite values of opposite sign
    let fraction = rank - lower as f64;
    StatValue::Value(lo * (1.0 - fraction) + hi * fraction)
}

// =============================================================================
// Calculation context
// =============================================================================

/// Runs the selected strategy against table columns. Never mutates the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatCalculation {
    strategy: Statistic,
}

impl StatCalculation {
    pub fn new(strategy: Statistic) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> Statistic {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: Statistic) {
        self.strategy = strategy;
    }

    /// Run the selected strategy on `column`.
    ///
    /// `param` is the percentile in [0, 1]; it is required by `Percentile`
    /// and ignored by every other strategy.
    pub fn execute(&self, table: &Table, column: &str, param: Option<f64>) -> Result<StatValue, StatsError> {
        let cells = table
            .column(column)
            .ok_or_else(|| StatsError::UnknownColumn(column.to_string()))?;

        let quantile = match (self.strategy, param) {
            (Statistic::Percentile, None) => return Err(StatsError::MissingPercentile),
            (Statistic::Percentile, Some(p)) => Some(Quantile::new(p)?),
            (_, _) => None,
        };

        Ok(self.apply(cells, quantile))
    }

    /// Run the selected strategy on a column's cells directly.
    pub fn apply(&self, cells: &[CellValue], quantile: Option<Quantile>) -> StatValue {
        self.strategy.reduce(cells, quantile)
    }
}

impl Default for StatCalculation {
    fn default() -> Self {
        Self::new(Statistic::Count)
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Rows of the summary, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStat {
    Count,
    Mean,
    Std,
    Min,
    Max,
    P25,
    Median,
    P75,
}

impl SummaryStat {
    pub const ALL: [SummaryStat; 8] = [
        SummaryStat::Count,
        SummaryStat::Mean,
        SummaryStat::Std,
        SummaryStat::Min,
        SummaryStat::Max,
        SummaryStat::P25,
        SummaryStat::Median,
        SummaryStat::P75,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SummaryStat::Count => "count",
            SummaryStat::Mean => "mean",
            SummaryStat::Std => "std",
            SummaryStat::Min => "min",
            SummaryStat::Max => "max",
            SummaryStat::P25 => "p25",
            SummaryStat::Median => "median",
            SummaryStat::P75 => "p75",
        }
    }

    pub fn statistic(self) -> Statistic {
        match self {
            SummaryStat::Count => Statistic::Count,
            SummaryStat::Mean => Statistic::Mean,
            SummaryStat::Std => Statistic::Std,
            SummaryStat::Min => Statistic::Min,
            SummaryStat::Max => Statistic::Max,
            SummaryStat::P25 | SummaryStat::Median | SummaryStat::P75 => Statistic::Percentile,
        }
    }

    pub fn quantile(self) -> Option<Quantile> {
        match self {
            SummaryStat::P25 => Some(Quantile::FIRST_QUARTILE),
            SummaryStat::Median => Some(Quantile::MEDIAN),
            SummaryStat::P75 => Some(Quantile::THIRD_QUARTILE),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub stat: SummaryStat,
    /// One value per summarized column, in column order
    pub values: Vec<StatValue>,
}

/// Eight-row statistics table: one row per `SummaryStat`, one value per
/// source column. Always fully populated; missing statistics are `Undefined`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    columns: Vec<String>,
    rows: Vec<SummaryRow>,
}

/// Header of the label column in `Summary::to_table`.
pub const STATISTIC_HEADER: &str = "statistic";

impl Summary {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn get(&self, stat: SummaryStat, column: &str) -> Option<StatValue> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|row| row.stat == stat)
            .and_then(|row| row.values.get(index).copied())
    }

    /// Name of the label column in `to_table`: `STATISTIC_HEADER`, with
    /// underscores appended while a source column already uses the name.
    pub fn label_header(&self) -> String {
        let mut header = STATISTIC_HEADER.to_string();
        while self.columns.iter().any(|c| *c == header) {
            header.push('_');
        }
        header
    }

    /// Render as a plain table (first column holds the statistic labels) for
    /// front ends that bind to `Table`.
    ///
    /// Cells are placed as they are: labels are text, values are numbers and
    /// undefined statistics are `undefined_label` as text, even when the label
    /// looks like a number.
    pub fn to_table(&self, undefined_label: &str) -> Table {
        let labels = Column {
            name: self.label_header(),
            cells: self.rows.iter().map(|row| CellValue::Text(row.stat.label().to_string())).collect(),
        };
        let values = self.columns.iter().enumerate().map(|(index, name)| Column {
            name: name.clone(),
            cells: self
                .rows
                .iter()
                .map(|row| match row.values.get(index) {
                    Some(StatValue::Value(n)) => CellValue::Number(*n),
                    Some(StatValue::Undefined) | None => CellValue::Text(undefined_label.to_string()),
                })
                .collect(),
        });
        Table::from_columns(std::iter::once(labels).chain(values).collect())
    }
}

/// Compute the eight-row summary for every column of `table`.
///
/// Each column yields its statistic vector in `SummaryStat::ALL` order; the
/// per-column vectors are then transposed so rows are statistics and columns
/// are the source columns. The result owns its data and is never updated in
/// place: recompute after the table changes.
pub fn describe(table: &Table) -> Summary {
    let mut context = StatCalculation::default();
    let mut per_column: Vec<Vec<StatValue>> = Vec::with_capacity(table.column_count());

    for (_, cells) in table.columns() {
        let mut vector = Vec::with_capacity(SummaryStat::ALL.len());
        for stat in SummaryStat::ALL {
            context.set_strategy(stat.statistic());
            vector.push(context.apply(cells, stat.quantile()));
        }
        per_column.push(vector);
    }

    let mut by_stat = transpose(per_column).into_iter();
    let rows = SummaryStat::ALL
        .iter()
        .map(|&stat| SummaryRow { stat, values: by_stat.next().unwrap_or_default() })
        .collect();

    Summary {
        columns: table.column_names().map(str::to_string).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::Number(*v)).collect()
    }

    fn close(actual: StatValue, expected: f64) -> bool {
        actual.value().is_some_and(|v| (v - expected).abs() < 1e-7)
    }

    fn sample_table() -> Table {
        Table::from_raw(
            ["x", "label"],
            vec![
                vec!["1".into(), "a".into()],
                vec!["2".into(), "b".into()],
                vec!["3".into(), "c".into()],
                vec!["4".into(), "d".into()],
            ],
        )
    }

    #[test]
    fn test_mean_and_std() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean(&values), StatValue::Value(2.5));
        assert!(close(sample_std(&values), 1.2909944));
    }

    #[test]
    fn test_min_max() {
        let values = [3.0, -1.0, 7.5];
        assert_eq!(min(&values), StatValue::Value(-1.0));
        assert_eq!(max(&values), StatValue::Value(7.5));
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = [40.0, 10.0, 30.0, 20.0];
        assert_eq!(percentile(&values, Quantile::FIRST_QUARTILE), StatValue::Value(17.5));
        assert_eq!(percentile(&values, Quantile::MEDIAN), StatValue::Value(25.0));
        assert_eq!(percentile(&values, Quantile::THIRD_QUARTILE), StatValue::Value(32.5));
        assert_eq!(percentile(&values, Quantile::new(0.0).unwrap()), StatValue::Value(10.0));
        assert_eq!(percentile(&values, Quantile::new(1.0).unwrap()), StatValue::Value(40.0));
    }

    #[test]
    fn test_percentile_single_value() {
        assert_eq!(percentile(&[5.0], Quantile::THIRD_QUARTILE), StatValue::Value(5.0));
    }

    #[test]
    fn test_undefined_without_numbers() {
        let cells = vec![CellValue::Text("a".to_string()), CellValue::Text("b".to_string())];
        let context = StatCalculation::new(Statistic::Count);
        assert_eq!(context.apply(&cells, None), StatValue::Value(2.0));

        for strategy in [Statistic::Mean, Statistic::Std, Statistic::Min, Statistic::Max] {
            assert!(StatCalculation::new(strategy).apply(&cells, None).is_undefined(), "{strategy}");
        }
        assert!(StatCalculation::new(Statistic::Percentile)
            .apply(&cells, Some(Quantile::MEDIAN))
            .is_undefined());
    }

    #[test]
    fn test_std_needs_two_values() {
        assert!(sample_std(&[4.0]).is_undefined());
        assert!(StatCalculation::new(Statistic::Std).apply(&numbers(&[4.0]), None).is_undefined());
    }

    #[test]
    fn test_text_cells_are_excluded_from_numeric_aggregates() {
        let cells = vec![
            CellValue::Number(2.0),
            CellValue::Text("n/a".to_string()),
            CellValue::Number(4.0),
        ];
        assert_eq!(StatCalculation::new(Statistic::Count).apply(&cells, None), StatValue::Value(3.0));
        assert_eq!(StatCalculation::new(Statistic::Mean).apply(&cells, None), StatValue::Value(3.0));
    }

    #[test]
    fn test_execute_switches_strategy_without_stale_parameter() {
        let table = sample_table();
        let mut context = StatCalculation::new(Statistic::Percentile);
        assert_eq!(context.execute(&table, "x", Some(0.5)), Ok(StatValue::Value(2.5)));

        context.set_strategy(Statistic::Max);
        assert_eq!(context.execute(&table, "x", None), Ok(StatValue::Value(4.0)));

        context.set_strategy(Statistic::Percentile);
        assert_eq!(context.execute(&table, "x", None), Err(StatsError::MissingPercentile));
    }

    #[test]
    fn test_execute_errors() {
        let table = sample_table();
        let context = StatCalculation::new(Statistic::Percentile);
        assert_eq!(context.execute(&table, "x", Some(1.5)), Err(StatsError::InvalidPercentile(1.5)));
        assert_eq!(
            context.execute(&table, "missing", Some(0.5)),
            Err(StatsError::UnknownColumn("missing".to_string()))
        );
        assert!(Quantile::new(f64::NAN).is_err());
    }

    #[test]
    fn test_execute_does_not_touch_table() {
        let table = sample_table();
        let before = table.clone();
        StatCalculation::new(Statistic::Percentile).execute(&table, "x", Some(0.25)).unwrap();
        assert_eq!(table, before);
    }

    #[test]
    fn test_describe_shape_and_values() {
        let summary = describe(&sample_table());
        assert_eq!(summary.columns(), &["x".to_string(), "label".to_string()]);
        assert_eq!(summary.rows().len(), 8);
        for (row, stat) in summary.rows().iter().zip(SummaryStat::ALL) {
            assert_eq!(row.stat, stat);
            assert_eq!(row.values.len(), 2);
        }

        assert_eq!(summary.get(SummaryStat::Count, "x"), Some(StatValue::Value(4.0)));
        assert_eq!(summary.get(SummaryStat::Mean, "x"), Some(StatValue::Value(2.5)));
        assert_eq!(summary.get(SummaryStat::P25, "x"), Some(StatValue::Value(1.75)));
        assert_eq!(summary.get(SummaryStat::Median, "x"), Some(StatValue::Value(2.5)));
        assert_eq!(summary.get(SummaryStat::P75, "x"), Some(StatValue::Value(3.25)));

        assert_eq!(summary.get(SummaryStat::Count, "label"), Some(StatValue::Value(4.0)));
        assert_eq!(summary.get(SummaryStat::Mean, "label"), Some(StatValue::Undefined));
        assert_eq!(summary.get(SummaryStat::Mean, "nope"), None);
    }

    #[test]
    fn test_describe_empty_table_keeps_all_rows() {
        let summary = describe(&Table::default());
        assert_eq!(summary.rows().len(), 8);
        assert!(summary.rows().iter().all(|row| row.values.is_empty()));
    }

    #[test]
    fn test_summary_to_table() {
        let table = describe(&sample_table()).to_table("undefined");
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec![STATISTIC_HEADER, "x", "label"]
        );
        assert_eq!(table.row_count(), 8);
        assert_eq!(table.get(STATISTIC_HEADER, 1), Some(&CellValue::Text("mean".to_string())));
        assert_eq!(table.get("x", 1), Some(&CellValue::Number(2.5)));
        assert_eq!(table.get("label", 1), Some(&CellValue::Text("undefined".to_string())));
    }

    #[test]
    fn test_summary_to_table_label_column_never_collides() {
        let table = Table::from_raw(["statistic", "x"], vec![vec!["1".into(), "2".into()]]);
        let summary = describe(&table);
        assert_eq!(summary.label_header(), "statistic_");

        let rendered = summary.to_table("undefined");
        assert!(rendered.shape_issues().is_empty());
        assert_eq!(
            rendered.column_names().collect::<Vec<_>>(),
            vec!["statistic_", "statistic", "x"]
        );
        assert_eq!(rendered.get("statistic_", 1), Some(&CellValue::Text("mean".to_string())));
        assert_eq!(rendered.get("statistic", 1), Some(&CellValue::Number(1.0)));
    }

    #[test]
    fn test_summary_to_table_keeps_numeric_looking_label_as_text() {
        let table = Table::from_raw(["name"], vec![vec!["ann".into()], vec!["bo".into()]]);
        let rendered = describe(&table).to_table("0");
        assert_eq!(rendered.get("name", 0), Some(&CellValue::Number(2.0)));
        assert_eq!(rendered.get("name", 1), Some(&CellValue::Text("0".to_string())));
        assert_eq!(rendered.get("name", 7), Some(&CellValue::Text("0".to_string())));
    }

    #[test]
    fn test_far_apart_values_do_not_overflow() {
        let wide = [-1e308, 1e308];
        assert_eq!(percentile(&wide, Quantile::MEDIAN), StatValue::Value(0.0));
        let p25 = percentile(&wide, Quantile::FIRST_QUARTILE).value().unwrap();
        assert!((p25 / -5e307 - 1.0).abs() < 1e-12, "{p25}");
        assert_eq!(mean(&[1e308, 1e308]), StatValue::Value(1e308));

        let std = sample_std(&[1e200, -1e200]).value().unwrap();
        assert!((std / 1e200 - std::f64::consts::SQRT_2).abs() < 1e-12, "{std}");
        assert!(sample_std(&[1e308, -1e308]).value().unwrap().is_finite());
    }

    #[test]
    fn test_stat_value_format() {
        assert_eq!(StatValue::Value(4.0).format(None, "-"), "4");
        assert_eq!(StatValue::Value(1.2909944487).format(Some(3), "-"), "1.291");
        assert_eq!(StatValue::Undefined.format(Some(3), "-"), "-");
        assert_eq!(StatValue::Undefined.to_string(), "undefined");
    }

    #[test]
    fn test_stat_value_serializes_undefined_as_null() {
        let json = serde_json::to_string(&vec![StatValue::Value(1.5), StatValue::Undefined]).unwrap();
        assert_eq!(json, "[1.5,null]");
    }
}
