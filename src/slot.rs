//! DoorDash sales and payouts by time of day.
use crate::aggregate::{Comparison, Metric};
use crate::load::StoreRecord;
use crate::table::{Shape, SummaryTable, PRE_VS_POST, YEAR_OVER_YEAR};
use crate::window::{Period, Periods};
use crate::Platform;
use std::collections::BTreeSet;
use time::Time;

/// A named part of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// 00:00 to 04:59
    EarlyMorning,
    /// 05:00 to 10:59
    Breakfast,
    /// 11:00 to 13:59
    Lunch,
    /// 14:00 to 16:59
    Afternoon,
    /// 17:00 to 19:59
    Dinner,
    /// 20:00 to 23:59
    LateNight,
}

impl Slot {
    pub const ALL: [Slot; 6] = [
        Slot::EarlyMorning,
        Slot::Breakfast,
        Slot::Lunch,
        Slot::Afternoon,
        Slot::Dinner,
        Slot::LateNight,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Slot::EarlyMorning => "Early morning",
            Slot::Breakfast => "Breakfast",
            Slot::Lunch => "Lunch",
            Slot::Afternoon => "Afternoon",
            Slot::Dinner => "Dinner",
            Slot::LateNight => "Late night",
        }
    }

    pub fn of(time: Time) -> Slot {
        match time.hour() {
            0..=4 => Slot::EarlyMorning,
            5..=10 => Slot::Breakfast,
            11..=13 => Slot::Lunch,
            14..=16 => Slot::Afternoon,
            17..=19 => Slot::Dinner,
            _ => Slot::LateNight,
        }
    }
}

/// Sum the DoorDash `metric` of `records` per slot in each period. Records without time of day are ignored.
fn sums(records: &[StoreRecord], periods: &Periods, stores: Option<&BTreeSet<String>>, metric: Metric) -> [Comparison; 6] {
    let mut sums = [Comparison::default(); 6];
    let records: Vec<_> = records
        .iter()
        .filter(|record| {
            record.platform == Platform::DoorDash
                && record.time.is_some()
                && stores.map_or(true, |stores| stores.contains(&record.store))
        })
        .cloned()
        .collect();
    for period in Period::ALL {
        for record in periods.select(&records, period) {
            let Some(time) = record.time else { continue };
            let value = match metric {
                Metric::Payouts => record.payout,
                _ => record.sales,
            };
            *sums[Slot::of(time) as usize].get_mut(period) += value;
        }
    }
    sums
}

fn slot_table(shape: &Shape, metric: Metric, sums: &[Comparison; 6]) -> SummaryTable {
    shape.table(
        format!(
            "DoorDash Slot Analysis: {} {}",
            metric.name(),
            if shape.number == PRE_VS_POST.number {
                "Pre vs Post"
            } else {
                "Year-over-Year"
            }
        ),
        "Slot",
        Slot::ALL
            .iter()
            .zip(sums)
            .map(|(slot, sum)| (slot.name().to_owned(), metric.unit(), (*sum).into())),
    )
}

/// Build the DoorDash slot tables: sales pre vs post and year over year, then the same for payouts.
pub fn slot_tables(
    records: &[StoreRecord],
    periods: &Periods,
    stores: Option<&BTreeSet<String>>,
) -> Vec<SummaryTable> {
    let mut tables = Vec::with_capacity(4);
    for metric in [Metric::Sales, Metric::Payouts] {
        let sums = sums(records, periods, stores, metric);
        for shape in [&PRE_VS_POST, &YEAR_OVER_YEAR] {
            tables.push(slot_table(shape, metric, &sums));
        }
    }
    tables
}
