use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("invalid price range {0:?}, expected \"$min - max\"")]
pub struct PriceRangeError(pub String);

/// Inclusive listing price bounds, written as `"$100000 - 200000"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn contains(&self, amount: f64) -> bool {
        amount.is_finite() && amount >= self.min && amount <= self.max
    }
}

fn parse_bound(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl FromStr for PriceRange {
    type Err = PriceRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PriceRangeError(s.to_string());
        let (low, high) = s.split_once('-').ok_or_else(err)?;
        let min = parse_bound(low).ok_or_else(err)?;
        let max = parse_bound(high).ok_or_else(err)?;
        if min > max {
            return Err(err());
        }
        Ok(Self { min, max })
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${} - {}", self.min, self.max)
    }
}
