use common::table::empty_string_as_none;
use reporting::{is_supported_year, DatedRecord, Month, RecordDate, Series};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourLog {
    pub id: i64,
    pub amount: f64, // Hours
    pub year: i32,
    pub month: Month,
    pub day: Option<u32>,
    pub description: Option<String>,
    pub tag: String,
    pub created_at: String,
}

impl DatedRecord for HourLog {
    fn amount(&self) -> f64 {
        self.amount
    }

    fn date(&self) -> RecordDate {
        match self.day {
            Some(day) => RecordDate::with_day(self.year, self.month, day),
            None => RecordDate::new(self.year, self.month),
        }
    }

    fn sub_type(&self) -> Option<&str> {
        Some(&self.tag)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RawHourLogRequest {
    #[validate(range(min = 1.0, message = "At least one hour must be logged"))]
    pub amount: f64,
    #[validate(range(min = 2018, max = 2099, message = "Year must be between 2018 and 2099"))]
    pub year: i32,
    pub month: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(min = 1, max = 31, message = "Day must be between 1 and 31"))]
    pub day: Option<u32>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 64, message = "Tag is required"))]
    pub tag: String,
}

// Once created via new(), it is guaranteed to be valid.
#[derive(Debug, Serialize)]
pub struct CreateHourLogRequest {
    amount: f64,
    year: i32,
    month: Month,
    day: Option<u32>,
    description: Option<String>,
    tag: String,
}

impl CreateHourLogRequest {
    pub fn new(
        amount: f64,
        year: i32,
        month: Month,
        day: Option<u32>,
        description: Option<String>,
        tag: String,
    ) -> Result<Self, String> {
        if !(amount >= 1.0) {
            return Err("At least one hour must be logged".to_string());
        }
        if !is_supported_year(year) {
            return Err("Year must be between 2018 and 2099".to_string());
        }
        if day.is_some_and(|d| !(1..=31).contains(&d)) {
            return Err("Day must be between 1 and 31".to_string());
        }
        let tag = tag.trim().to_string();
        if tag.is_empty() {
            return Err("Tag is required".to_string());
        }

        Ok(Self {
            amount,
            year,
            month,
            day,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            tag,
        })
    }

    pub fn from_raw(raw: RawHourLogRequest) -> Result<Self, String> {
        raw.validate().map_err(|e| e.to_string())?;
        let month = raw.month.parse::<Month>().map_err(|e| e.to_string())?;
        Self::new(raw.amount, raw.year, month, raw.day, raw.description, raw.tag)
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn day(&self) -> Option<u32> {
        self.day
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteSelectedRequest {
    pub ids: Vec<i64>,
}

/// Hours per tag, one series per tag aligned with `labels`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HoursChart {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}
