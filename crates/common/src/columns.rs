//! Decoding of stored columns into domain types.

use database::RepositoryError;
use reporting::Month;
use std::str::FromStr;

pub fn month_column(value: i64) -> Result<Month, RepositoryError> {
    u32::try_from(value)
        .ok()
        .and_then(Month::from_number)
        .ok_or_else(|| RepositoryError::InvalidData(format!("month {}", value)))
}

pub fn enum_column<T: FromStr>(value: &str, column: &str) -> Result<T, RepositoryError> {
    value
        .parse()
        .map_err(|_| RepositoryError::InvalidData(format!("{} '{}'", column, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_column() {
        assert_eq!(month_column(4).unwrap(), Month::April);
        assert!(matches!(month_column(0), Err(RepositoryError::InvalidData(_))));
        assert!(matches!(month_column(-3), Err(RepositoryError::InvalidData(_))));
    }

    #[test]
    fn test_enum_column() {
        assert_eq!(enum_column::<Month>("May", "month").unwrap(), Month::May);
        assert!(enum_column::<Month>("Maybe", "month").is_err());
    }
}
