use serde::{Deserialize, Serialize};

use crate::month::Month;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDate {
    pub year: i32,
    pub month: Month,
    pub day: Option<u32>,
}

impl RecordDate {
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month, day: None }
    }

    pub fn with_day(year: i32, month: Month, day: u32) -> Self {
        Self { year, month, day: Some(day) }
    }
}

// `sub_type` is the income type, expense tag or hour tag.
pub trait DatedRecord {
    fn amount(&self) -> f64;
    fn date(&self) -> RecordDate;

    fn sub_type(&self) -> Option<&str> {
        None
    }
}

impl<T: DatedRecord + ?Sized> DatedRecord for &T {
    fn amount(&self) -> f64 {
        (**self).amount()
    }

    fn date(&self) -> RecordDate {
        (**self).date()
    }

    fn sub_type(&self) -> Option<&str> {
        (**self).sub_type()
    }
}
