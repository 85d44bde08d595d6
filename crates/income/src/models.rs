use reporting::{amount_to_cents, cents_to_amount, is_supported_year, DatedRecord, Month, RecordDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeType {
    Salary,
    Other,
}

impl IncomeType {
    pub const ALL: [IncomeType; 2] = [IncomeType::Salary, IncomeType::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            IncomeType::Salary => "Salary",
            IncomeType::Other => "Other",
        }
    }
}

impl fmt::Display for IncomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncomeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IncomeType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown income type: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Income {
    pub id: i64,
    pub income_type: IncomeType,
    pub amount: i64, // Cents
    pub year: i32,
    pub month: Month,
    pub description: Option<String>,
    pub created_at: String,
}

impl DatedRecord for Income {
    fn amount(&self) -> f64 {
        cents_to_amount(self.amount)
    }

    fn date(&self) -> RecordDate {
        RecordDate::new(self.year, self.month)
    }

    fn sub_type(&self) -> Option<&str> {
        Some(self.income_type.as_str())
    }
}

/// Income form as submitted by the browser or a JSON client.
#[derive(Debug, Deserialize, Validate)]
pub struct RawIncomeRequest {
    pub income_type: String,
    #[validate(range(min = 1.0, message = "Amount must be at least 1"))]
    pub amount: f64,
    #[validate(range(min = 2018, max = 2099, message = "Year must be between 2018 and 2099"))]
    pub year: i32,
    pub month: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
}

// Once created via new(), it is guaranteed to be valid.
#[derive(Debug, Serialize)]
pub struct CreateIncomeRequest {
    income_type: IncomeType,
    amount: i64,
    year: i32,
    month: Month,
    description: Option<String>,
}

impl CreateIncomeRequest {
    pub fn new(
        income_type: IncomeType,
        amount: f64,
        year: i32,
        month: Month,
        description: Option<String>,
    ) -> Result<Self, String> {
        if !(amount >= 1.0) {
            return Err("Amount must be at least 1".to_string());
        }
        if !is_supported_year(year) {
            return Err("Year must be between 2018 and 2099".to_string());
        }

        Ok(Self {
            income_type,
            amount: amount_to_cents(amount),
            year,
            month,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
    }

    pub fn from_raw(raw: RawIncomeRequest) -> Result<Self, String> {
        raw.validate().map_err(|e| e.to_string())?;
        let income_type = raw.income_type.parse::<IncomeType>()?;
        let month = raw.month.parse::<Month>().map_err(|e| e.to_string())?;
        Self::new(income_type, raw.amount, raw.year, month, raw.description)
    }

    pub fn income_type(&self) -> IncomeType {
        self.income_type
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkTypeRequest {
    pub ids: Vec<i64>,
    pub income_type: IncomeType,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i64>,
}
