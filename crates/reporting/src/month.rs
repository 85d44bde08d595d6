use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseError;

pub const MIN_YEAR: i32 = 2018;
pub const MAX_YEAR: i32 = 2099;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

pub const DEFINED_MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

impl Month {
    pub fn number(self) -> u32 {
        self.index() as u32 + 1
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_number(number: u32) -> Option<Self> {
        if (1..=12).contains(&number) {
            Some(DEFINED_MONTHS[number as usize - 1])
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn of(date: &impl chrono::Datelike) -> Self {
        DEFINED_MONTHS[date.month0() as usize]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(number) = trimmed.parse::<u32>() {
            return Month::from_number(number).ok_or_else(|| ParseError::Month(s.to_string()));
        }
        DEFINED_MONTHS
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseError::Month(s.to_string()))
    }
}

pub fn is_supported_year(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_defined_months_are_in_calendar_order() {
        let numbers: Vec<u32> = DEFINED_MONTHS.iter().map(|m| m.number()).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_parse_month_by_name_and_number() {
        assert_eq!("April".parse::<Month>().unwrap(), Month::April);
        assert_eq!("april".parse::<Month>().unwrap(), Month::April);
        assert_eq!("12".parse::<Month>().unwrap(), Month::December);
        assert!("13".parse::<Month>().is_err());
        assert!("Smarch".parse::<Month>().is_err());
    }

    #[test]
    fn test_month_of_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Month::of(&date), Month::February);
    }

    #[test]
    fn test_supported_years() {
        assert!(is_supported_year(2018));
        assert!(is_supported_year(2099));
        assert!(!is_supported_year(2017));
        assert!(!is_supported_year(2100));
    }
}
