use crate::{Dated, Platform};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("Cannot use '{0}' as delimiter")]
    InvalidDelimiter(char),
    #[error("{platform} export has no header line at line {line}")]
    MissingHeader { platform: Platform, line: usize },
    #[error("{platform} export lacks a {kind} column, tried {tried}")]
    MissingColumn {
        platform: Platform,
        kind: &'static str,
        tried: String,
    },
}

/// One row of platform activity.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecord {
    /// The canonical store key, see [`normalize_store_id()`](crate::normalize_store_id()).
    pub store: String,
    pub platform: Platform,
    pub date: time::Date,
    /// The local time the order was placed, if the export has it.
    pub time: Option<time::Time>,
    pub order_id: Option<String>,
    pub sales: f64,
    pub payout: f64,
}

impl Dated for StoreRecord {
    fn date(&self) -> time::Date {
        self.date
    }
}

/// The schema of a platform export.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Options {
    pub platform: Platform,
    pub delimiter: char,
    /// The 0-based line holding the column names. Lines before it are ignored.
    pub header_line: usize,
    pub store_columns: Vec<String>,
    pub date_columns: Vec<String>,
    /// The index of the date column to use if none of `date_columns` is present.
    pub date_column_index: Option<usize>,
    pub time_columns: Vec<String>,
    pub sales_columns: Vec<String>,
    pub payout_columns: Vec<String>,
    pub order_columns: Vec<String>,
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

impl Options {
    pub fn doordash() -> Self {
        Options {
            platform: Platform::DoorDash,
            delimiter: ',',
            header_line: 0,
            store_columns: names(&["Merchant store ID", "Store ID"]),
            date_columns: names(&["Timestamp local date", "Date", "Timestamp"]),
            date_column_index: None,
            time_columns: names(&[
                "Timestamp local time",
                "Order received local time",
            ]),
            sales_columns: names(&["Subtotal"]),
            payout_columns: names(&["Net total", "Net total (for historical reference only)"]),
            order_columns: names(&["DoorDash order ID"]),
        }
    }

    pub fn ubereats() -> Self {
        Options {
            platform: Platform::UberEats,
            delimiter: ',',
            header_line: 1,
            store_columns: names(&["Store ID", "Shop ID"]),
            date_columns: names(&["Order Date", "Date"]),
            date_column_index: Some(8),
            time_columns: names(&["Order Accept Time", "Time"]),
            sales_columns: names(&["Sales (excl. tax)"]),
            payout_columns: names(&["Total payout"]),
            order_columns: names(&["Order ID"]),
        }
    }
}

/// The result of [`load()`][function::load()].
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub records: Vec<StoreRecord>,
    /// Data rows that were dropped as they were too short or had no parseable date.
    pub skipped_rows: usize,
}

pub(crate) mod function {
    use crate::load::{Error, Options, Outcome, StoreRecord};
    use crate::{dates, normalize_store_id, parse_amount};
    use log::{debug, info, warn};

    /// Parse the platform export in `csv` according to `options`.
    ///
    /// Fails only if a required column can't be found. Rows that can't be used are skipped and counted.
    pub fn load(csv: impl std::io::Read, options: &Options) -> Result<Outcome, Error> {
        let delimiter = options
            .delimiter
            .try_into()
            .map_err(|_| Error::InvalidDelimiter(options.delimiter))?;
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(csv);

        let mut rows = csv.records();
        let headers = rows
            .by_ref()
            .nth(options.header_line)
            .transpose()?
            .ok_or(Error::MissingHeader {
                platform: options.platform,
                line: options.header_line + 1,
            })?;
        let headers: Vec<String> = headers.iter().map(|h| h.trim().to_owned()).collect();
        let columns = Columns::resolve(&headers, options)?;

        let mut records = Vec::new();
        let mut skipped_rows = 0;
        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(err) if !err.is_io_error() => {
                    debug!("{}: skipping unreadable row: {err}", options.platform);
                    skipped_rows += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            if row.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            if row.iter().map(str::trim).eq(headers.iter().map(String::as_str)) {
                debug!("{}: skipping repeated header in line {line}", options.platform);
                continue;
            }
            let field = |index: usize| row.get(index).map(str::trim);

            let (Some(store), Some(date), Some(sales)) =
                (field(columns.store), field(columns.date), field(columns.sales))
            else {
                debug!("{}: skipping short row in line {line}", options.platform);
                skipped_rows += 1;
                continue;
            };
            let Some(date) = dates::parse_date(date) else {
                debug!(
                    "{}: skipping row in line {line} with unparseable date '{date}'",
                    options.platform
                );
                skipped_rows += 1;
                continue;
            };

            records.push(StoreRecord {
                store: normalize_store_id(store),
                platform: options.platform,
                date,
                time: columns
                    .time
                    .and_then(field)
                    .and_then(dates::parse_time),
                order_id: field(columns.order)
                    .filter(|id| !id.is_empty())
                    .map(ToOwned::to_owned),
                sales: parse_amount(sales).unwrap_or_default(),
                payout: columns
                    .payout
                    .and_then(field)
                    .and_then(parse_amount)
                    .unwrap_or_default(),
            });
        }

        if skipped_rows > 0 {
            warn!(
                "{}: skipped {skipped_rows} row(s) that were too short or had no valid date",
                options.platform
            );
        }
        info!(
            "{}: loaded {} record(s)",
            options.platform,
            records.len()
        );
        Ok(Outcome {
            records,
            skipped_rows,
        })
    }

    struct Columns {
        store: usize,
        date: usize,
        time: Option<usize>,
        sales: usize,
        payout: Option<usize>,
        order: usize,
    }

    impl Columns {
        fn resolve(headers: &[String], options: &Options) -> Result<Self, Error> {
            let required = |kind: &'static str, candidates: &[String]| {
                header_idx(candidates, headers).ok_or_else(|| Error::MissingColumn {
                    platform: options.platform,
                    kind,
                    tried: candidates.join(", "),
                })
            };
            let date = header_idx(&options.date_columns, headers)
                .or_else(|| {
                    options
                        .date_column_index
                        .filter(|index| *index < headers.len())
                })
                .ok_or_else(|| Error::MissingColumn {
                    platform: options.platform,
                    kind: "date",
                    tried: options.date_columns.join(", "),
                })?;
            let payout = header_idx(&options.payout_columns, headers);
            if payout.is_none() {
                warn!(
                    "{}: no payout column found, tried {}, payouts count as zero",
                    options.platform,
                    options.payout_columns.join(", ")
                );
            }
            Ok(Columns {
                store: required("store", &options.store_columns)?,
                date,
                time: header_idx(&options.time_columns, headers),
                sales: required("sales", &options.sales_columns)?,
                payout,
                order: required("order id", &options.order_columns)?,
            })
        }
    }

    /// Return the position of the first of `candidates` in `headers`, matching exactly before ignoring case.
    pub(crate) fn header_idx(candidates: &[String], headers: &[String]) -> Option<usize> {
        candidates
            .iter()
            .find_map(|name| headers.iter().position(|header| header == name))
            .or_else(|| {
                candidates.iter().find_map(|name| {
                    headers
                        .iter()
                        .position(|header| header.eq_ignore_ascii_case(name))
                })
            })
    }
}
