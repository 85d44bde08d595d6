use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::month::{is_supported_year, Month};
use crate::record::DatedRecord;
use crate::ParseError;

pub const ALL_TIME: &str = "all-time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Year(i32),
    AllTime,
}

impl Scope {
    pub fn year(self) -> Option<i32> {
        match self {
            Scope::Year(year) => Some(year),
            Scope::AllTime => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Year(year) => write!(f, "{}", year),
            Scope::AllTime => f.write_str(ALL_TIME),
        }
    }
}

impl FromStr for Scope {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(ALL_TIME) {
            return Ok(Scope::AllTime);
        }
        match trimmed.parse::<i32>() {
            Ok(year) if is_supported_year(year) => Ok(Scope::Year(year)),
            _ => Err(ParseError::Scope(s.to_string())),
        }
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// Calendar order: year, then month index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKey {
    Month(Month),
    YearMonth(i32, Month),
}

impl BucketKey {
    pub fn month(self) -> Month {
        match self {
            BucketKey::Month(month) | BucketKey::YearMonth(_, month) => month,
        }
    }

    fn sort_tuple(self) -> (i32, usize) {
        match self {
            BucketKey::Month(month) => (i32::MIN, month.index()),
            BucketKey::YearMonth(year, month) => (year, month.index()),
        }
    }
}

impl Ord for BucketKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_tuple().cmp(&other.sort_tuple())
    }
}

impl PartialOrd for BucketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Month(month) => write!(f, "{}", month),
            BucketKey::YearMonth(year, month) => write!(f, "{}-{}", year, month),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn bucket_key<R: DatedRecord + ?Sized>(scope: Scope, record: &R) -> BucketKey {
    let date = record.date();
    match scope {
        Scope::AllTime => BucketKey::YearMonth(date.year, date.month),
        Scope::Year(_) => BucketKey::Month(date.month),
    }
}
