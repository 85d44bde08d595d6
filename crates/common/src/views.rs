//! Small helpers shared by the page templates.

use chrono::Datelike;
use reporting::{cents_to_amount, format_amount, NumberFormat, DEFINED_MONTHS, MIN_YEAR};

use crate::table::{Page, TableQuery};

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub fn month_options(selected: Option<u32>) -> Vec<SelectOption> {
    DEFINED_MONTHS
        .iter()
        .map(|m| SelectOption {
            value: m.number().to_string(),
            label: m.name().to_string(),
            selected: selected == Some(m.number()),
        })
        .collect()
}

/// Newest year first, from next year down to the first supported year.
pub fn year_options(selected: Option<i32>) -> Vec<SelectOption> {
    let newest = chrono::Local::now().year() + 1;
    (MIN_YEAR..=newest)
        .rev()
        .map(|year| SelectOption {
            value: year.to_string(),
            label: year.to_string(),
            selected: selected == Some(year),
        })
        .collect()
}

pub fn option_list(values: &[&str], selected: Option<&str>) -> Vec<SelectOption> {
    values
        .iter()
        .map(|v| SelectOption {
            value: v.to_string(),
            label: v.to_string(),
            selected: selected == Some(*v),
        })
        .collect()
}

pub fn money(cents: i64) -> String {
    format_amount(cents_to_amount(cents), &NumberFormat::nl_be())
}

/// Value for an `<input type="number" step="0.01">`.
pub fn money_input(cents: i64) -> String {
    format!("{:.2}", cents_to_amount(cents))
}

/// Filter, sort and paging form rendered above every table
/// by `table_controls.html`.
pub struct TableControls {
    pub year_options: Vec<SelectOption>,
    pub month_options: Vec<SelectOption>,
    pub kind_label: String,
    pub kind_options: Vec<SelectOption>,
    pub sort_options: Vec<SelectOption>,
    pub desc: bool,
    pub page: i64,
    pub max_pages: i64,
    pub total: i64,
    // One-based, for display.
    pub page_number: i64,
    pub page_count: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: i64,
    pub next_page: i64,
}

impl TableControls {
    pub fn new<T>(
        query: &TableQuery,
        page: &Page<T>,
        kind_label: &str,
        kinds: &[String],
        sortable: &[&'static str],
    ) -> Self {
        let kind_refs: Vec<&str> = kinds.iter().map(String::as_str).collect();
        let order = query.order_by(sortable);
        let sort_options = sortable
            .iter()
            .map(|column| SelectOption {
                value: column.to_string(),
                label: column.replace('_', " "),
                selected: query.sort.is_some() && order.column == *column,
            })
            .collect();

        Self {
            year_options: year_options(query.year),
            month_options: month_options(query.month),
            kind_label: kind_label.to_string(),
            kind_options: option_list(&kind_refs, query.kind.as_deref()),
            sort_options,
            desc: query.desc.unwrap_or(false),
            page: page.page,
            max_pages: page.max_pages,
            total: page.total,
            page_number: page.page.saturating_add(1),
            page_count: page.max_pages.saturating_add(1),
            has_previous: page.has_previous(),
            has_next: page.has_next(),
            previous_page: page.page.saturating_sub(1).max(0),
            next_page: page.page.saturating_add(1),
        }
    }

    /// Hides the year and month filters for tables without dates.
    pub fn undated(mut self) -> Self {
        self.year_options.clear();
        self.month_options.clear();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_options_mark_selection() {
        let options = month_options(Some(2));
        assert_eq!(options.len(), 12);
        assert_eq!(options[1].label, "February");
        assert!(options[1].selected);
        assert!(!options[0].selected);
    }

    #[test]
    fn test_year_options_newest_first() {
        let options = year_options(None);
        assert_eq!(options.last().unwrap().value, MIN_YEAR.to_string());
        assert!(options[0].value > options[1].value);
    }

    #[test]
    fn test_table_controls() {
        let query = TableQuery {
            page: 1,
            sort: Some("amount".into()),
            desc: Some(true),
            kind: Some("Food".into()),
            ..Default::default()
        };
        let page = Page::new(vec![1, 2, 3], 1, 80);
        let kinds = vec!["Food".to_string(), "Health".to_string()];
        let controls = TableControls::new(&query, &page, "Tag", &kinds, &["amount", "created_at"]);

        assert!(controls.desc);
        assert_eq!(controls.max_pages, 2);
        assert!(controls.has_previous);
        assert!(controls.has_next);
        assert_eq!(controls.previous_page, 0);
        assert!(controls.kind_options[0].selected);
        assert!(controls.sort_options[0].selected);
        assert_eq!(controls.sort_options[1].label, "created at");
        assert_eq!(controls.page_number, 2);
        assert_eq!(controls.page_count, 3);
    }

    #[test]
    fn test_table_controls_on_last_possible_page() {
        let query = TableQuery { page: i64::MAX, ..Default::default() };
        let page: Page<i32> = Page::new(Vec::new(), query.page(), 0);
        let controls = TableControls::new(&query, &page, "Tag", &[], &["amount"]);

        assert_eq!(controls.page_number, i64::MAX);
        assert_eq!(controls.next_page, i64::MAX);
        assert!(!controls.has_next);
    }

    #[test]
    fn test_money() {
        assert_eq!(money(123456), "€1.234,56");
        assert_eq!(money_input(4550), "45.50");
    }
}
