use serde::{de, Deserialize, Deserializer};
use sqlx::QueryBuilder;
use std::fmt::Display;
use std::str::FromStr;

pub const MAX_ITEMS_PER_TABLE: i64 = 35;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub desc: Option<bool>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub month: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub kind: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose<T> {
    Text(String),
    Value(T),
}

// Forms submit `year=` for "any".
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    match Option::<Loose<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Value(value)) => Ok(Some(value)),
        Some(Loose::Text(text)) => match text.trim() {
            "" => Ok(None),
            value => value.parse().map(Some).map_err(de::Error::custom),
        },
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableFilters {
    pub year: Option<i32>,
    // 1-12
    pub month: Option<u32>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn from_flag(desc: Option<bool>) -> Self {
        if desc.unwrap_or(false) { SortDirection::Desc } else { SortDirection::Asc }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn newest_first() -> Self {
        Self { column: "created_at", direction: SortDirection::Desc }
    }

    pub fn to_sql(&self) -> String {
        let dir = self.direction.as_sql();
        match self.column {
            "month" => format!("month {dir}, year {dir}, id {dir}"),
            "year" => format!("year {dir}, month {dir}, id {dir}"),
            column => format!("{column} {dir}, id {dir}"),
        }
    }
}

impl TableQuery {
    pub fn order_by(&self, sortable: &[&'static str]) -> OrderBy {
        let Some(requested) = self.sort.as_deref() else {
            return OrderBy::newest_first();
        };
        match sortable.iter().find(|c| **c == requested) {
            Some(column) => OrderBy { column: *column, direction: SortDirection::from_flag(self.desc) },
            None => OrderBy::newest_first(),
        }
    }

    pub fn filters(&self) -> TableFilters {
        TableFilters {
            year: self.year,
            month: self.month,
            kind: self.kind.clone(),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.max(0)
    }

    pub fn offset(&self) -> i64 {
        self.page().saturating_mul(MAX_ITEMS_PER_TABLE)
    }
}

impl TableFilters {
    // The statement must already have a WHERE clause.
    pub fn push_conditions<'args>(
        &self,
        builder: &mut QueryBuilder<'args, database::Driver>,
        kind_column: Option<&str>,
    ) {
        if let Some(year) = self.year {
            builder.push(" AND year = ").push_bind(year);
        }
        if let Some(month) = self.month {
            builder.push(" AND month = ").push_bind(month as i64);
        }
        if let (Some(kind), Some(column)) = (self.kind.as_ref(), kind_column) {
            builder.push(format!(" AND {column} = ")).push_bind(kind.clone());
        }
    }
}

pub fn max_pages(total: i64) -> i64 {
    total / MAX_ITEMS_PER_TABLE
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub max_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, total: i64) -> Self {
        Self { items, page, max_pages: max_pages(total), total }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            max_pages: self.max_pages,
            total: self.total,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page < self.max_pages
    }
}
