use reporting::amount_to_cents;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionType {
    Monthly,
    Yearly,
}

impl SubscriptionType {
    pub const ALL: [SubscriptionType; 2] = [SubscriptionType::Monthly, SubscriptionType::Yearly];

    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionType::Monthly => "Monthly",
            SubscriptionType::Yearly => "Yearly",
        }
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown subscription type: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: i64,
    pub name: String,
    pub price: i64, // Cents
    pub subscription_type: SubscriptionType,
    pub description: Option<String>,
    pub created_at: String,
}

impl Subscription {
    /// What the subscription costs over a full year, in cents.
    pub fn yearly_cost(&self) -> i64 {
        match self.subscription_type {
            SubscriptionType::Monthly => self.price * 12,
            SubscriptionType::Yearly => self.price,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RawSubscriptionRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(range(min = 1.0, message = "Price must be at least 1"))]
    pub price: f64,
    pub subscription_type: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
}

// Once created via new(), it is guaranteed to be valid.
#[derive(Debug, Serialize)]
pub struct CreateSubscriptionRequest {
    name: String,
    price: i64,
    subscription_type: SubscriptionType,
    description: Option<String>,
}

impl CreateSubscriptionRequest {
    pub fn new(
        name: String,
        price: f64,
        subscription_type: SubscriptionType,
        description: Option<String>,
    ) -> Result<Self, String> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err("Name cannot be empty".to_string());
        }
        if !(price >= 1.0) {
            return Err("Price must be at least 1".to_string());
        }

        Ok(Self {
            name,
            price: amount_to_cents(price),
            subscription_type,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
    }

    pub fn from_raw(raw: RawSubscriptionRequest) -> Result<Self, String> {
        raw.validate().map_err(|e| e.to_string())?;
        let subscription_type = raw.subscription_type.parse::<SubscriptionType>()?;
        Self::new(raw.name, raw.price, subscription_type, raw.description)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn subscription_type(&self) -> SubscriptionType {
        self.subscription_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_subscription_request() {
        let raw = RawSubscriptionRequest {
            name: "  Music  ".into(),
            price: 10.99,
            subscription_type: "monthly".into(),
            description: None,
        };
        let req = CreateSubscriptionRequest::from_raw(raw).unwrap();
        assert_eq!(req.name(), "Music");
        assert_eq!(req.price(), 1099);
        assert_eq!(req.subscription_type(), SubscriptionType::Monthly);
    }

    #[test]
    fn test_create_subscription_request_rejects_blank_name() {
        let result = CreateSubscriptionRequest::new("   ".into(), 5.0, SubscriptionType::Yearly, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_subscription_request_rejects_unknown_type() {
        let raw = RawSubscriptionRequest {
            name: "News".into(),
            price: 5.0,
            subscription_type: "Weekly".into(),
            description: None,
        };
        assert!(CreateSubscriptionRequest::from_raw(raw).is_err());
    }

    #[test]
    fn test_yearly_cost() {
        let mut sub = Subscription {
            id: 1,
            name: "Music".into(),
            price: 1000,
            subscription_type: SubscriptionType::Monthly,
            description: None,
            created_at: String::new(),
        };
        assert_eq!(sub.yearly_cost(), 12000);
        sub.subscription_type = SubscriptionType::Yearly;
        assert_eq!(sub.yearly_cost(), 1000);
    }
}
