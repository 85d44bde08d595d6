use common::table::empty_string_as_none;
use reporting::{amount_to_cents, cents_to_amount, is_supported_year, DatedRecord, Month, RecordDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseTag {
    Food,
    Transport,
    Housing,
    Utilities,
    Health,
    Leisure,
    Other,
}

impl ExpenseTag {
    pub const ALL: [ExpenseTag; 7] = [
        ExpenseTag::Food,
        ExpenseTag::Transport,
        ExpenseTag::Housing,
        ExpenseTag::Utilities,
        ExpenseTag::Health,
        ExpenseTag::Leisure,
        ExpenseTag::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseTag::Food => "Food",
            ExpenseTag::Transport => "Transport",
            ExpenseTag::Housing => "Housing",
            ExpenseTag::Utilities => "Utilities",
            ExpenseTag::Health => "Health",
            ExpenseTag::Leisure => "Leisure",
            ExpenseTag::Other => "Other",
        }
    }
}

impl fmt::Display for ExpenseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpenseTag::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown tag: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub amount: i64, // Cents
    pub year: i32,
    pub month: Month,
    pub day: Option<u32>,
    pub description: Option<String>,
    pub tag: Option<ExpenseTag>,
    pub processed_expense_id: Option<i64>,
    pub created_at: String,
}

impl DatedRecord for Expense {
    fn amount(&self) -> f64 {
        cents_to_amount(self.amount)
    }

    fn date(&self) -> RecordDate {
        match self.day {
            Some(day) => RecordDate::with_day(self.year, self.month, day),
            None => RecordDate::new(self.year, self.month),
        }
    }

    fn sub_type(&self) -> Option<&str> {
        self.tag.map(ExpenseTag::as_str)
    }
}

/// A lump expense spread over daily child expenses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedExpense {
    pub id: i64,
    pub total_amount: i64, // Cents
    pub amount_per_day: i64, // Cents
    pub year: i32,
    pub month: Month,
    pub description: Option<String>,
    pub created_at: String,
    pub children: Vec<Expense>,
}

impl DatedRecord for ProcessedExpense {
    fn amount(&self) -> f64 {
        cents_to_amount(self.total_amount)
    }

    fn date(&self) -> RecordDate {
        RecordDate::new(self.year, self.month)
    }
}

/// One row of the expense listing: a plain expense or a processed aggregate.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpenseEntry {
    Plain(Expense),
    Processed(ProcessedExpense),
}

impl ExpenseEntry {
    pub fn id(&self) -> i64 {
        match self {
            ExpenseEntry::Plain(e) => e.id,
            ExpenseEntry::Processed(p) => p.id,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, ExpenseEntry::Processed(_))
    }
}

impl DatedRecord for ExpenseEntry {
    fn amount(&self) -> f64 {
        match self {
            ExpenseEntry::Plain(e) => e.amount(),
            ExpenseEntry::Processed(p) => p.amount(),
        }
    }

    fn date(&self) -> RecordDate {
        match self {
            ExpenseEntry::Plain(e) => e.date(),
            ExpenseEntry::Processed(p) => p.date(),
        }
    }

    fn sub_type(&self) -> Option<&str> {
        match self {
            ExpenseEntry::Plain(e) => e.sub_type(),
            ExpenseEntry::Processed(p) => p.sub_type(),
        }
    }
}

/// Expense form. Filling in `daily_amount` spreads the amount over days.
#[derive(Debug, Deserialize, Validate)]
pub struct RawExpenseRequest {
    #[validate(range(min = 0.01, message = "Amount must be at least 0.01"))]
    pub amount: f64,
    #[validate(range(min = 2018, max = 2099, message = "Year must be between 2018 and 2099"))]
    pub year: i32,
    pub month: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(min = 1, max = 31, message = "Day must be between 1 and 31"))]
    pub day: Option<u32>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(min = 0.01, message = "Daily amount must be at least 0.01"))]
    pub daily_amount: Option<f64>,
}

// Once created via new(), it is guaranteed to be valid.
#[derive(Debug, Clone, Serialize)]
pub struct CreateExpenseRequest {
    amount: i64,
    year: i32,
    month: Month,
    day: Option<u32>,
    description: Option<String>,
    tag: Option<ExpenseTag>,
    daily_amount: Option<i64>,
}

impl CreateExpenseRequest {
    pub fn new(
        amount: f64,
        year: i32,
        month: Month,
        day: Option<u32>,
        description: Option<String>,
        tag: Option<ExpenseTag>,
        daily_amount: Option<f64>,
    ) -> Result<Self, String> {
        if !(amount >= 0.01) {
            return Err("Amount must be at least 0.01".to_string());
        }
        if !is_supported_year(year) {
            return Err("Year must be between 2018 and 2099".to_string());
        }
        if let Some(day) = day {
            if !(1..=31).contains(&day) {
                return Err("Day must be between 1 and 31".to_string());
            }
        }
        if let Some(daily) = daily_amount {
            if !(daily >= 0.01) {
                return Err("Daily amount must be at least 0.01".to_string());
            }
        }

        Ok(Self {
            amount: amount_to_cents(amount),
            year,
            month,
            day,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            tag,
            daily_amount: daily_amount.map(amount_to_cents),
        })
    }

    pub fn from_raw(raw: RawExpenseRequest) -> Result<Self, String> {
        raw.validate().map_err(|e| e.to_string())?;
        let month = raw.month.parse::<Month>().map_err(|e| e.to_string())?;
        let tag = raw.tag.as_deref().map(str::parse::<ExpenseTag>).transpose()?;
        Self::new(raw.amount, raw.year, month, raw.day, raw.description, tag, raw.daily_amount)
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

    pub fn day(&self) -> Option<u32> {
        self.day
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tag(&self) -> Option<ExpenseTag> {
        self.tag
    }

    /// Set when the expense is to be processed over days.
    pub fn daily_amount(&self) -> Option<i64> {
        self.daily_amount
    }
}

/// A daily child ready to be written under its processed parent.
#[derive(Debug, Clone)]
pub struct NewChildExpense {
    pub amount: i64,
    pub year: i32,
    pub month: Month,
    pub description: String,
    pub tag: Option<ExpenseTag>,
}

#[derive(Debug, Deserialize)]
pub struct BulkTagRequest {
    pub ids: Vec<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub tag: Option<ExpenseTag>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub processed_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(amount: f64, daily_amount: Option<f64>) -> RawExpenseRequest {
        RawExpenseRequest {
            amount,
            year: 2024,
            month: "March".into(),
            day: Some(14),
            description: None,
            tag: Some("food".into()),
            daily_amount,
        }
    }

    #[test]
    fn test_create_expense_request() {
        let req = CreateExpenseRequest::from_raw(raw(12.34, None)).unwrap();
        assert_eq!(req.amount(), 1234);
        assert_eq!(req.tag(), Some(ExpenseTag::Food));
        assert_eq!(req.day(), Some(14));
        assert_eq!(req.daily_amount(), None);
    }

    #[test]
    fn test_create_expense_request_with_daily_amount() {
        let req = CreateExpenseRequest::from_raw(raw(300.0, Some(10.0))).unwrap();
        assert_eq!(req.daily_amount(), Some(1000));
    }

    #[test]
    fn test_create_expense_request_rejects_invalid_values() {
        assert!(CreateExpenseRequest::from_raw(raw(0.0, None)).is_err());
        assert!(CreateExpenseRequest::from_raw(raw(10.0, Some(0.0))).is_err());

        let mut bad_day = raw(10.0, None);
        bad_day.day = Some(32);
        assert!(CreateExpenseRequest::from_raw(bad_day).is_err());

        let mut bad_tag = raw(10.0, None);
        bad_tag.tag = Some("Gadgets".into());
        assert!(CreateExpenseRequest::from_raw(bad_tag).is_err());
    }

    #[test]
    fn test_form_blank_fields_are_absent() {
        let raw: RawExpenseRequest = serde_json::from_str(
            r#"{"amount": 5, "year": 2024, "month": "1", "day": "", "tag": "", "daily_amount": ""}"#,
        )
        .unwrap();
        assert_eq!(raw.day, None);
        assert_eq!(raw.tag, None);
        assert_eq!(raw.daily_amount, None);
    }

    #[test]
    fn test_processed_entry_aggregates_total() {
        let entry = ExpenseEntry::Processed(ProcessedExpense {
            id: 3,
            total_amount: 2500,
            amount_per_day: 1000,
            year: 2024,
            month: Month::March,
            description: None,
            created_at: String::new(),
            children: Vec::new(),
        });
        assert_eq!(entry.amount(), 25.0);
        assert_eq!(entry.sub_type(), None);
        assert!(entry.is_processed());
    }
}
