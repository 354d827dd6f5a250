use crate::window::Period;
use crate::Platform;
use std::collections::{BTreeMap, BTreeSet};

/// `(to - from) / from`, or `None` if there is nothing to compare against.
pub fn change(from: f64, to: f64) -> Option<f64> {
    (from != 0.0).then(|| (to - from) / from)
}

/// The values of a summed metric in each period of an analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Comparison {
    pub pre_last_year: f64,
    pub post_last_year: f64,
    pub pre: f64,
    pub post: f64,
}

impl Comparison {
    pub fn get(&self, period: Period) -> f64 {
        match period {
            Period::PreLastYear => self.pre_last_year,
            Period::PostLastYear => self.post_last_year,
            Period::Pre => self.pre,
            Period::Post => self.post,
        }
    }

    pub fn get_mut(&mut self, period: Period) -> &mut f64 {
        match period {
            Period::PreLastYear => &mut self.pre_last_year,
            Period::PostLastYear => &mut self.post_last_year,
            Period::Pre => &mut self.pre,
            Period::Post => &mut self.post,
        }
    }

    /// Post minus pre.
    pub fn delta_pp(&self) -> f64 {
        self.post - self.pre
    }

    /// The growth from pre to post as fraction of pre.
    pub fn pct_pp(&self) -> Option<f64> {
        change(self.pre, self.post)
    }

    /// Post minus pre, one year earlier.
    pub fn delta_ly(&self) -> f64 {
        self.post_last_year - self.pre_last_year
    }

    /// Post minus post of last year.
    pub fn delta_yoy(&self) -> f64 {
        self.post - self.post_last_year
    }

    pub fn pct_yoy(&self) -> Option<f64> {
        change(self.post_last_year, self.post)
    }
}

impl std::ops::AddAssign for Comparison {
    fn add_assign(&mut self, rhs: Self) {
        for period in Period::ALL {
            *self.get_mut(period) += rhs.get(period);
        }
    }
}

impl std::ops::Add for Comparison {
    type Output = Comparison;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl std::iter::Sum for Comparison {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Comparison::default(), |acc, c| acc + c)
    }
}

/// Per-period values that may be undefined, like ratios with a zero denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Series {
    pub pre_last_year: Option<f64>,
    pub post_last_year: Option<f64>,
    pub pre: Option<f64>,
    pub post: Option<f64>,
}

impl Series {
    pub fn get(&self, period: Period) -> Option<f64> {
        match period {
            Period::PreLastYear => self.pre_last_year,
            Period::PostLastYear => self.post_last_year,
            Period::Pre => self.pre,
            Period::Post => self.post,
        }
    }

    /// `numerator / denominator * scale` in every period.
    pub fn ratio(numerator: &Comparison, denominator: &Comparison, scale: f64) -> Self {
        let value = |period| {
            let denominator = denominator.get(period);
            (denominator != 0.0).then(|| numerator.get(period) / denominator * scale)
        };
        Series {
            pre_last_year: value(Period::PreLastYear),
            post_last_year: value(Period::PostLastYear),
            pre: value(Period::Pre),
            post: value(Period::Post),
        }
    }
}

impl From<Comparison> for Series {
    fn from(c: Comparison) -> Self {
        Series {
            pre_last_year: Some(c.pre_last_year),
            post_last_year: Some(c.post_last_year),
            pre: Some(c.pre),
            post: Some(c.post),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Metric {
    Sales,
    Payouts,
    Orders,
    NewCustomers,
    /// Payouts as percentage of sales.
    Profitability,
    /// Average order value, sales per order.
    Aov,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Sales => "Sales",
            Metric::Payouts => "Payouts",
            Metric::Orders => "Orders",
            Metric::NewCustomers => "New Customers",
            Metric::Profitability => "Profitability",
            Metric::Aov => "AOV",
        }
    }
}

/// The summed metrics of a group of stores.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    pub sales: Comparison,
    pub payouts: Comparison,
    /// The amount of distinct order ids.
    pub orders: Comparison,
    pub new_customers: Comparison,
}

impl Metrics {
    pub fn profitability(&self) -> Series {
        Series::ratio(&self.payouts, &self.sales, 100.0)
    }

    pub fn aov(&self) -> Series {
        Series::ratio(&self.sales, &self.orders, 1.0)
    }

    pub fn series(&self, metric: Metric) -> Series {
        match metric {
            Metric::Sales => self.sales.into(),
            Metric::Payouts => self.payouts.into(),
            Metric::Orders => self.orders.into(),
            Metric::NewCustomers => self.new_customers.into(),
            Metric::Profitability => self.profitability(),
            Metric::Aov => self.aov(),
        }
    }
}

impl std::ops::AddAssign for Metrics {
    fn add_assign(&mut self, rhs: Self) {
        self.sales += rhs.sales;
        self.payouts += rhs.payouts;
        self.orders += rhs.orders;
        self.new_customers += rhs.new_customers;
    }
}

/// What an [`AggregateRow`] was summed over.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Group {
    Store { store: String, platform: Platform },
    /// A store on all platforms.
    CombinedStore(String),
    Platform(Platform),
    /// All stores on all platforms.
    Combined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub group: Group,
    pub metrics: Metrics,
}

/// The result of [`aggregate()`][function::aggregate()].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    /// One row per store and platform, ordered by store. Every store has a row for every platform.
    pub rows: Vec<AggregateRow>,
    /// The amount of platform records that fell into each period.
    pub record_counts: BTreeMap<(Platform, Period), usize>,
    /// New customers of DoorDash promotions across all stores.
    ///
    /// Marketing files use their own store ids, so these are neither part of the store rows nor affected by a
    /// store selection.
    pub new_customers: Comparison,
}

impl Aggregates {
    pub fn stores(&self) -> BTreeSet<&str> {
        self.rows
            .iter()
            .filter_map(|row| match &row.group {
                Group::Store { store, .. } => Some(store.as_str()),
                _ => None,
            })
            .collect()
    }

    fn selected<'a>(
        &'a self,
        platform: Option<Platform>,
        stores: Option<&'a BTreeSet<String>>,
    ) -> impl Iterator<Item = (&'a str, &'a Metrics)> + 'a {
        self.rows.iter().filter_map(move |row| match &row.group {
            Group::Store {
                store,
                platform: row_platform,
            } if platform.map_or(true, |p| p == *row_platform)
                && stores.map_or(true, |stores| stores.contains(store)) =>
            {
                Some((store.as_str(), &row.metrics))
            }
            _ => None,
        })
    }

    /// Return one row per selected store, for `platform` or summed over all platforms.
    pub fn store_rows(
        &self,
        platform: Option<Platform>,
        stores: Option<&BTreeSet<String>>,
    ) -> Vec<AggregateRow> {
        let mut by_store = BTreeMap::<&str, Metrics>::new();
        for (store, metrics) in self.selected(platform, stores) {
            *by_store.entry(store).or_default() += *metrics;
        }
        by_store
            .into_iter()
            .map(|(store, metrics)| AggregateRow {
                group: match platform {
                    Some(platform) => Group::Store {
                        store: store.into(),
                        platform,
                    },
                    None => Group::CombinedStore(store.into()),
                },
                metrics,
            })
            .collect()
    }

    /// Sum all selected stores, on `platform` or on all platforms.
    ///
    /// New customers always count in full on DoorDash.
    pub fn total(&self, platform: Option<Platform>, stores: Option<&BTreeSet<String>>) -> AggregateRow {
        let mut metrics = Metrics::default();
        for (_, store_metrics) in self.selected(platform, stores) {
            metrics += *store_metrics;
        }
        if platform.map_or(true, |p| p == Platform::DoorDash) {
            metrics.new_customers += self.new_customers;
        }
        AggregateRow {
            group: platform.map_or(Group::Combined, Group::Platform),
            metrics,
        }
    }
}

pub(crate) mod function {
    use crate::aggregate::{AggregateRow, Aggregates, Comparison, Group, Metrics};
    use crate::load::StoreRecord;
    use crate::marketing::NewCustomers;
    use crate::window::{Period, Periods};
    use crate::Platform;
    use std::collections::{BTreeMap, BTreeSet};

    #[derive(Default)]
    struct Accumulator {
        metrics: Metrics,
        order_ids: [BTreeSet<String>; 4],
    }

    /// Sum `records` per store and platform, and DoorDash `new_customers` overall, in each of the `periods`.
    pub fn aggregate(
        records: &[StoreRecord],
        new_customers: &[NewCustomers],
        periods: &Periods,
    ) -> Aggregates {
        let mut groups = BTreeMap::<(String, Platform), Accumulator>::new();
        let mut record_counts = BTreeMap::new();
        let mut total_new_customers = Comparison::default();
        for period in Period::ALL {
            for platform in Platform::ALL {
                record_counts.insert((platform, period), 0);
            }
            for record in periods.select(records, period) {
                *record_counts.entry((record.platform, period)).or_insert(0) += 1;
                let group = groups
                    .entry((record.store.clone(), record.platform))
                    .or_default();
                *group.metrics.sales.get_mut(period) += record.sales;
                *group.metrics.payouts.get_mut(period) += record.payout;
                if let Some(order_id) = record.order_id {
                    group.order_ids[period as usize].insert(order_id);
                }
            }
            *total_new_customers.get_mut(period) += periods
                .select(new_customers, period)
                .iter()
                .map(|customers| customers.count)
                .sum::<f64>();
        }

        let stores: BTreeSet<String> = groups.keys().map(|(store, _)| store.clone()).collect();
        let mut rows = Vec::with_capacity(stores.len() * Platform::ALL.len());
        for store in stores {
            for platform in Platform::ALL {
                let Accumulator {
                    mut metrics,
                    order_ids,
                } = groups.remove(&(store.clone(), platform)).unwrap_or_default();
                for period in Period::ALL {
                    *metrics.orders.get_mut(period) = order_ids[period as usize].len() as f64;
                }
                rows.push(AggregateRow {
                    group: Group::Store {
                        store: store.clone(),
                        platform,
                    },
                    metrics,
                });
            }
        }
        Aggregates {
            rows,
            record_counts,
            new_customers: total_new_customers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(pre_last_year: f64, post_last_year: f64, pre: f64, post: f64) -> Comparison {
        Comparison {
            pre_last_year,
            post_last_year,
            pre,
            post,
        }
    }

    #[test]
    fn deltas() {
        let c = comparison(4.0, 8.0, 10.0, 15.0);
        assert_eq!(c.delta_pp(), 5.0);
        assert_eq!(c.post - c.pre, c.delta_pp());
        assert_eq!(c.pct_pp(), Some(0.5));
        assert_eq!(c.delta_ly(), 4.0);
        assert_eq!(c.delta_yoy(), 7.0);
        assert_eq!(c.pct_yoy(), Some(0.875));
    }

    #[test]
    fn percentages_of_nothing_are_undefined() {
        let c = comparison(0.0, 0.0, 0.0, 15.0);
        assert_eq!(c.delta_pp(), 15.0);
        assert_eq!(c.pct_pp(), None);
        assert_eq!(c.pct_yoy(), None);
    }

    #[test]
    fn negative_bases_keep_their_sign() {
        let c = comparison(0.0, 0.0, -10.0, 5.0);
        assert_eq!(c.pct_pp(), Some(-1.5));
    }

    #[test]
    fn ratios_are_undefined_without_denominator() {
        let metrics = Metrics {
            sales: comparison(0.0, 100.0, 50.0, 0.0),
            payouts: comparison(0.0, 80.0, 25.0, 0.0),
            orders: comparison(0.0, 4.0, 0.0, 0.0),
            new_customers: Comparison::default(),
        };
        let profitability = metrics.profitability();
        assert_eq!(profitability.post_last_year, Some(80.0));
        assert_eq!(profitability.pre, Some(50.0));
        assert_eq!(profitability.post, None);
        let aov = metrics.aov();
        assert_eq!(aov.post_last_year, Some(25.0));
        assert_eq!(aov.pre, None);
    }

    #[test]
    fn store_grid_is_complete_and_orders_are_distinct() {
        use crate::load::StoreRecord;
        use crate::marketing::NewCustomers;
        use crate::window::{DateWindow, ExcludedDates, Periods};
        use time::macros::date;

        let record = |store: &str, platform, date, order_id: Option<&str>, sales| StoreRecord {
            store: store.into(),
            platform,
            date,
            time: None,
            order_id: order_id.map(Into::into),
            sales,
            payout: 1.0,
        };
        let records = [
            record("1", Platform::DoorDash, date!(2024 - 12 - 05), Some("a"), 10.0),
            record("1", Platform::DoorDash, date!(2024 - 12 - 05), Some("a"), 5.0),
            record("1", Platform::DoorDash, date!(2024 - 12 - 06), None, 5.0),
            record("2", Platform::UberEats, date!(2023 - 12 - 06), Some("b"), 7.0),
        ];
        let new_customers = [NewCustomers {
            store: "900".into(),
            date: date!(2024 - 11 - 02),
            count: 4.0,
        }];
        let periods = Periods::new(
            DateWindow::parse("11/01/2024-11/30/2024").unwrap(),
            DateWindow::parse("12/01/2024-12/31/2024").unwrap(),
            ExcludedDates::default(),
        );
        let aggregates = function::aggregate(&records, &new_customers, &periods);
        let groups: Vec<_> = aggregates.rows.iter().map(|row| row.group.clone()).collect();
        assert_eq!(
            groups,
            [
                Group::Store {
                    store: "1".into(),
                    platform: Platform::DoorDash
                },
                Group::Store {
                    store: "1".into(),
                    platform: Platform::UberEats
                },
                Group::Store {
                    store: "2".into(),
                    platform: Platform::DoorDash
                },
                Group::Store {
                    store: "2".into(),
                    platform: Platform::UberEats
                },
            ]
        );
        let dd = &aggregates.rows[0].metrics;
        assert_eq!(dd.sales.post, 20.0);
        assert_eq!(dd.payouts.post, 3.0);
        assert_eq!(dd.orders.post, 1.0, "one distinct order id, rows without id add none");
        assert_eq!(dd.new_customers.pre, 0.0, "new customers are kept apart from stores");
        assert_eq!(aggregates.new_customers.pre, 4.0);
        assert_eq!(aggregates.rows[3].metrics.sales.post_last_year, 7.0);
        assert_eq!(aggregates.rows[2].metrics, Metrics::default());
        assert_eq!(aggregates.record_counts[&(Platform::DoorDash, Period::Post)], 3);
        assert_eq!(aggregates.record_counts[&(Platform::UberEats, Period::Pre)], 0);

        let combined = aggregates.store_rows(None, None);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0].group, Group::CombinedStore("1".into()));
        assert_eq!(aggregates.total(Some(Platform::UberEats), None).metrics.sales.post_last_year, 7.0);
    }

    #[test]
    fn comparisons_sum() {
        let total: Comparison = [comparison(1.0, 2.0, 3.0, 4.0), comparison(1.0, 1.0, 1.0, 1.0)]
            .into_iter()
            .sum();
        assert_eq!(total, comparison(2.0, 3.0, 4.0, 5.0));
    }
}
