//! Presentation tables and the fixed shapes they are built from.
use crate::aggregate::{change, AggregateRow, Group, Metric, Series};
use crate::window::Period;
use crate::round1;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Unit {
    Currency,
    Count,
    Percent,
    Ratio,
}

impl Metric {
    pub fn unit(&self) -> Unit {
        match self {
            Metric::Sales | Metric::Payouts | Metric::Aov => Unit::Currency,
            Metric::Orders | Metric::NewCustomers => Unit::Count,
            Metric::Profitability => Unit::Percent,
        }
    }
}

/// What a column shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Figure {
    /// The value within a period.
    Value(Period),
    /// The value in `to` minus the value in `from`.
    Delta { from: Period, to: Period },
    /// The delta as percentage of the value in `from`.
    Change { from: Period, to: Period },
    /// A plain quantity without a time comparison.
    Amount,
}

impl Figure {
    /// Compute this figure from `series`, with percentages scaled to 100.
    pub fn of(&self, series: &Series) -> Option<f64> {
        match *self {
            Figure::Value(period) => series.get(period),
            Figure::Delta { from, to } => Some(series.get(to)? - series.get(from)?),
            Figure::Change { from, to } => change(series.get(from)?, series.get(to)?).map(|c| c * 100.0),
            Figure::Amount => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Column {
    pub name: String,
    pub figure: Figure,
    /// The unit of all cells in this column, or `None` if it depends on the row.
    pub unit: Option<Unit>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Row {
    pub label: String,
    /// The unit of all cells in this row unless the column has its own.
    pub unit: Option<Unit>,
    /// One cell per column, `None` where the value is undefined.
    pub cells: Vec<Option<f64>>,
}

/// A named table as handed to renderers and exporters.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SummaryTable {
    pub name: String,
    /// The header of the label column.
    pub label: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl SummaryTable {
    pub fn row(&self, label: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.label == label)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// The cell at `row` and `column`, or `None` if it doesn't exist or is undefined.
    pub fn cell(&self, row: &str, column: &str) -> Option<f64> {
        let index = self.column_index(column)?;
        self.row(row)?.cells.get(index).copied().flatten()
    }

    /// The effective unit of the cell at `row` and `column`.
    pub fn unit(&self, row: usize, column: usize) -> Option<Unit> {
        self.columns
            .get(column)
            .and_then(|column| column.unit)
            .or_else(|| self.rows.get(row).and_then(|row| row.unit))
    }
}

pub struct ColumnSpec {
    pub name: &'static str,
    pub figure: Figure,
}

/// The fixed layout of a family of tables.
pub struct Shape {
    pub number: u8,
    pub title: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl Shape {
    fn columns(&self) -> Vec<Column> {
        self.columns
            .iter()
            .map(|spec| Column {
                name: spec.name.into(),
                figure: spec.figure,
                unit: matches!(spec.figure, Figure::Change { .. }).then_some(Unit::Percent),
            })
            .collect()
    }

    /// Build a table with one row per item of `rows`.
    pub fn table(
        &self,
        name: String,
        label: &str,
        rows: impl IntoIterator<Item = (String, Unit, Series)>,
    ) -> SummaryTable {
        SummaryTable {
            name,
            label: label.into(),
            columns: self.columns(),
            rows: rows
                .into_iter()
                .map(|(label, unit, series)| Row {
                    label,
                    unit: Some(unit),
                    cells: self
                        .columns
                        .iter()
                        .map(|spec| spec.figure.of(&series).map(round1))
                        .collect(),
                })
                .collect(),
        }
    }
}

pub const PRE_VS_POST: Shape = Shape {
    number: 1,
    title: "Current Year Pre vs Post Analysis",
    columns: &[
        ColumnSpec {
            name: "Pre",
            figure: Figure::Value(Period::Pre),
        },
        ColumnSpec {
            name: "Post",
            figure: Figure::Value(Period::Post),
        },
        ColumnSpec {
            name: "PrevsPost",
            figure: Figure::Delta {
                from: Period::Pre,
                to: Period::Post,
            },
        },
        ColumnSpec {
            name: "LastYear Pre vs Post",
            figure: Figure::Delta {
                from: Period::PreLastYear,
                to: Period::PostLastYear,
            },
        },
        ColumnSpec {
            name: "Growth%",
            figure: Figure::Change {
                from: Period::Pre,
                to: Period::Post,
            },
        },
    ],
};

pub const YEAR_OVER_YEAR: Shape = Shape {
    number: 2,
    title: "Year-over-Year Analysis",
    columns: &[
        ColumnSpec {
            name: "last year-post",
            figure: Figure::Value(Period::PostLastYear),
        },
        ColumnSpec {
            name: "post",
            figure: Figure::Value(Period::Post),
        },
        ColumnSpec {
            name: "YoY",
            figure: Figure::Delta {
                from: Period::PostLastYear,
                to: Period::Post,
            },
        },
        ColumnSpec {
            name: "YoY%",
            figure: Figure::Change {
                from: Period::PostLastYear,
                to: Period::Post,
            },
        },
    ],
};

/// The rows of every summary table, in order.
pub const SUMMARY_METRICS: &[Metric] = &[
    Metric::Sales,
    Metric::Payouts,
    Metric::Orders,
    Metric::NewCustomers,
    Metric::Profitability,
    Metric::Aov,
];

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Options {
    /// The canonical ids of the stores to include, or `None` for all of them.
    pub stores: Option<BTreeSet<String>>,
    /// Stores to leave out of store-level year-over-year tables, typically as they didn't exist last year.
    pub yoy_excluded_stores: BTreeSet<String>,
    /// The metric shown in store-level tables.
    pub store_metric: Metric,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            stores: None,
            yoy_excluded_stores: Default::default(),
            store_metric: Metric::Sales,
        }
    }
}

/// The name of a table of `shape` covering `scope` ("Combined" or a platform).
pub fn table_name(scope: &str, shape: &Shape, store_level: bool) -> String {
    format!(
        "{scope} Table {}: {}{}",
        shape.number,
        shape.title,
        if store_level { " (Store-Level)" } else { "" }
    )
}

/// A table with one row per summary metric of `row`.
pub fn summary_table(name: String, shape: &Shape, row: &AggregateRow) -> SummaryTable {
    shape.table(
        name,
        "Metric",
        SUMMARY_METRICS.iter().map(|metric| {
            (
                metric.name().to_owned(),
                metric.unit(),
                row.metrics.series(*metric),
            )
        }),
    )
}

/// A table with one row per store showing `metric`, leaving out stores without value in any period the table shows.
pub fn store_table(name: String, shape: &Shape, rows: &[AggregateRow], metric: Metric) -> SummaryTable {
    let mut table = shape.table(
        name,
        "Store ID",
        rows.iter().filter_map(|row| match &row.group {
            Group::Store { store, .. } | Group::CombinedStore(store) => {
                Some((store.clone(), metric.unit(), row.metrics.series(metric)))
            }
            Group::Platform(_) | Group::Combined => None,
        }),
    );
    let value_columns: Vec<_> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, column)| matches!(column.figure, Figure::Value(_)))
        .map(|(index, _)| index)
        .collect();
    table.rows.retain(|row| {
        value_columns
            .iter()
            .any(|index| row.cells[*index].map_or(false, |value| value != 0.0))
    });
    table
}

pub(crate) mod function {
    use crate::aggregate::{Aggregates, Group};
    use crate::table::{store_table, summary_table, table_name, Options, SummaryTable, PRE_VS_POST, YEAR_OVER_YEAR};
    use crate::Platform;

    /// Build all summary and store-level tables: combined first, then one pair per platform.
    pub fn build(aggregates: &Aggregates, options: &Options) -> Vec<SummaryTable> {
        let stores = options.stores.as_ref();
        let scopes = [None, Some(Platform::DoorDash), Some(Platform::UberEats)];
        let scope_name = |platform: Option<Platform>| platform.map_or("Combined", |p| p.name());

        let mut tables = Vec::with_capacity(scopes.len() * 4);
        for platform in scopes {
            let total = aggregates.total(platform, stores);
            for shape in [&PRE_VS_POST, &YEAR_OVER_YEAR] {
                tables.push(summary_table(
                    table_name(scope_name(platform), shape, false),
                    shape,
                    &total,
                ));
            }
        }
        for platform in scopes {
            let rows = aggregates.store_rows(platform, stores);
            tables.push(store_table(
                table_name(scope_name(platform), &PRE_VS_POST, true),
                &PRE_VS_POST,
                &rows,
                options.store_metric,
            ));
            let yoy_rows: Vec<_> = rows
                .into_iter()
                .filter(|row| match &row.group {
                    Group::Store { store, .. } | Group::CombinedStore(store) => {
                        !options.yoy_excluded_stores.contains(store)
                    }
                    _ => true,
                })
                .collect();
            tables.push(store_table(
                table_name(scope_name(platform), &YEAR_OVER_YEAR, true),
                &YEAR_OVER_YEAR,
                &yoy_rows,
                options.store_metric,
            ));
        }
        tables
    }
}
pub use function::build;
