#![deny(rust_2018_idioms)]

pub mod dates;

pub mod window;
pub use window::{filter, DateWindow, Dated, ExcludedDates, Periods};

pub mod load;
pub use load::function::load;

pub mod matcher;

pub mod marketing;
pub use marketing::function::{create_corporate_vs_todc_table, parse_bundle};

pub mod aggregate;
pub use aggregate::function::aggregate;

pub mod slot;

pub mod table;

pub mod analyze;
pub use analyze::function::analyze;

pub mod export;

/// The store key assigned to values that carry no usable identifier.
pub const UNKNOWN_STORE: &str = "unknown";

/// A delivery platform whose exports we understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Platform {
    DoorDash,
    UberEats,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::DoorDash, Platform::UberEats];

    pub fn name(&self) -> &'static str {
        match self {
            Platform::DoorDash => "DoorDash",
            Platform::UberEats => "UberEats",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Turn a store identifier as it appears in DoorDash, UberEats or marketing exports into the canonical key
/// used to match the same store across all of them.
///
/// `"0042"`, `"42"` and `"42.0"` all become `"42"`. Blank or null-like values become [`UNKNOWN_STORE`].
pub fn normalize_store_id(raw: &str) -> String {
    let value = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if value.is_empty()
        || ["nan", "null", "none", "n/a"]
            .iter()
            .any(|null| value.eq_ignore_ascii_case(null))
    {
        return UNKNOWN_STORE.into();
    }

    let (integral, fraction) = value.split_once('.').unwrap_or((value, ""));
    if !integral.is_empty()
        && integral.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b == b'0')
    {
        let digits = integral.trim_start_matches('0');
        return if digits.is_empty() { "0" } else { digits }.into();
    }

    match value.parse::<f64>() {
        Ok(number) if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 => {
            format!("{}", number as i64)
        }
        _ => value.into(),
    }
}

/// Parse amounts as found in platform exports, like `$1,234.50`, ` 12 ` or `(3.00)`, into a number.
///
/// Returns `None` if the value isn't numeric, which callers count as zero.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let mut value = raw.trim();
    let negative = value.starts_with('(') && value.ends_with(')');
    if negative {
        value = &value[1..value.len() - 1];
    }
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let number = cleaned.parse::<f64>().ok().filter(|n| n.is_finite())?;
    Some(if negative { -number } else { number })
}

/// Round to one decimal place, the precision of all presented figures.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
