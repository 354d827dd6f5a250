use crate::aggregate::Metric;
use crate::marketing::Bundle;
use crate::table::SummaryTable;
use crate::window::{Period, Periods};
use crate::{load, marketing, window, Platform};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid {which}")]
    Validation {
        which: &'static str,
        source: window::Error,
    },
    #[error("Could not read the {platform} export")]
    Load {
        platform: Platform,
        source: load::Error,
    },
    #[error(transparent)]
    Marketing(#[from] marketing::Error),
    #[error("Neither a DoorDash nor an UberEats export was provided")]
    NoInput,
}

impl Error {
    /// Return `true` if the configuration was unusable, before any input was read.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. } | Error::NoInput)
    }

    /// Return `true` if an input couldn't be read or didn't have the expected shape.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Load { .. } | Error::Marketing(_))
    }
}

/// Everything that drives an analysis run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// The window before the change, like `11/01/2024-11/30/2024`.
    pub pre: String,
    /// The window after the change.
    pub post: String,
    /// `MM/DD/YYYY` days to leave out of all windows.
    pub excluded_dates: Vec<String>,
    /// The stores to report on, all of them if empty.
    pub stores: Vec<String>,
    pub yoy_excluded_stores: Vec<String>,
    pub store_metric: Metric,
    /// Produce the DoorDash time-of-day tables as well.
    pub slots: bool,
    pub doordash: load::Options,
    pub ubereats: load::Options,
    pub marketing: marketing::Options,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pre: String::new(),
            post: String::new(),
            excluded_dates: Vec::new(),
            stores: Vec::new(),
            yoy_excluded_stores: Vec::new(),
            store_metric: Metric::Sales,
            slots: false,
            doordash: load::Options::doordash(),
            ubereats: load::Options::ubereats(),
            marketing: Default::default(),
        }
    }
}

impl Config {
    pub fn from_ron(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Parse all date settings.
    pub fn periods(&self) -> Result<Periods, Error> {
        let window = |which, input: &str| {
            window::DateWindow::parse(input).map_err(|source| Error::Validation { which, source })
        };
        let pre = window("pre window", &self.pre)?;
        let post = window("post window", &self.post)?;
        let excluded = window::ExcludedDates::parse(self.excluded_dates.iter().map(String::as_str)).map_err(
            |source| Error::Validation {
                which: "excluded dates",
                source,
            },
        )?;
        Ok(Periods::new(pre, post, excluded))
    }
}

/// The data to analyze.
#[derive(Debug)]
pub struct Inputs<R> {
    pub doordash: Option<R>,
    pub ubereats: Option<R>,
    pub marketing: Option<Bundle>,
}

impl<R> Default for Inputs<R> {
    fn default() -> Self {
        Inputs {
            doordash: None,
            ubereats: None,
            marketing: None,
        }
    }
}

/// Conditions worth telling a user about that don't prevent a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    MissingInput(Platform),
    /// No record of `platform` fell into `period`, so all its values are zero.
    EmptyPeriod { platform: Platform, period: Period },
    SkippedRows { platform: Platform, count: usize },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MissingInput(platform) => write!(f, "No {platform} export was provided"),
            Warning::EmptyPeriod { platform, period } => {
                write!(f, "No {platform} data in the {} window", period.name())
            }
            Warning::SkippedRows { platform, count } => {
                write!(f, "Skipped {count} unusable row(s) of the {platform} export")
            }
        }
    }
}

/// The result of [`analyze()`][function::analyze()].
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub periods: Periods,
    pub tables: Vec<SummaryTable>,
    pub warnings: Vec<Warning>,
}

impl Report {
    pub fn table(&self, name: &str) -> Option<&SummaryTable> {
        self.tables.iter().find(|table| table.name == name)
    }
}

pub(crate) mod function {
    use crate::analyze::{Config, Error, Inputs, Report, Warning};
    use crate::load::StoreRecord;
    use crate::window::Period;
    use crate::{aggregate, load, marketing, normalize_store_id, slot, table, Platform};
    use log::{info, warn};
    use std::collections::BTreeSet;

    /// Turn `inputs` into the tables configured in `config`.
    ///
    /// `config` is validated before any input is read.
    pub fn analyze<R: std::io::Read>(inputs: Inputs<R>, config: &Config) -> Result<Report, Error> {
        let periods = config.periods()?;
        if inputs.doordash.is_none() && inputs.ubereats.is_none() {
            return Err(Error::NoInput);
        }

        let mut warnings = Vec::new();
        let mut records = Vec::<StoreRecord>::new();
        let mut loaded = Vec::new();
        for (platform, input, options) in [
            (Platform::DoorDash, inputs.doordash, &config.doordash),
            (Platform::UberEats, inputs.ubereats, &config.ubereats),
        ] {
            let Some(input) = input else {
                warn!("no {platform} export provided");
                warnings.push(Warning::MissingInput(platform));
                continue;
            };
            let outcome = load::function::load(input, options)
                .map_err(|source| Error::Load { platform, source })?;
            if outcome.skipped_rows > 0 {
                warnings.push(Warning::SkippedRows {
                    platform,
                    count: outcome.skipped_rows,
                });
            }
            records.extend(outcome.records);
            loaded.push(platform);
        }

        let campaigns = inputs
            .marketing
            .as_ref()
            .map(|bundle| marketing::function::parse_bundle(bundle, &config.marketing))
            .transpose()?;
        let new_customers = campaigns
            .as_ref()
            .map(marketing::function::new_customers)
            .unwrap_or_default();

        let aggregates = aggregate::function::aggregate(&records, &new_customers, &periods);
        for platform in loaded {
            for period in Period::ALL {
                if aggregates.record_counts.get(&(platform, period)).copied().unwrap_or(0) == 0 {
                    warn!(
                        "no {platform} data in the {} window {}",
                        period.name(),
                        periods.window(period)
                    );
                    warnings.push(Warning::EmptyPeriod { platform, period });
                }
            }
        }

        let normalized = |stores: &[String]| -> BTreeSet<String> {
            stores.iter().map(|store| normalize_store_id(store)).collect()
        };
        let stores = (!config.stores.is_empty()).then(|| normalized(&config.stores));
        let mut tables = table::build(
            &aggregates,
            &table::Options {
                stores: stores.clone(),
                yoy_excluded_stores: normalized(&config.yoy_excluded_stores),
                store_metric: config.store_metric,
            },
        );
        if let Some(campaigns) = &campaigns {
            let mut spend =
                marketing::function::aggregate(campaigns, Some((&periods.post, &periods.excluded)));
            if let Some(stores) = &stores {
                spend.retain(|record| stores.contains(&record.store));
            }
            tables.extend(marketing::function::tables(&spend));
        }
        if config.slots {
            tables.extend(slot::slot_tables(&records, &periods, stores.as_ref()));
        }

        info!(
            "analyzed {} record(s) of {} store(s) into {} table(s), pre {}, post {}",
            records.len(),
            aggregates.stores().len(),
            tables.len(),
            periods.pre,
            periods.post
        );
        Ok(Report {
            periods,
            tables,
            warnings,
        })
    }
}
