use crate::models::{CreateHourLogRequest, HourLog, HoursChart, RawHourLogRequest};
use crate::repository::{HourRepository, SORTABLE_COLUMNS};
use chrono::NaiveDate;
use common::table::{Page, TableQuery, MAX_ITEMS_PER_TABLE};
use database::{Database, RepositoryError};
use reporting::{calendar_months, months, series_per_sub_type, Scope};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum HourError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Hour log not found")]
    NotFound,
}

impl From<RepositoryError> for HourError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => HourError::NotFound,
            RepositoryError::CheckViolation(msg) => HourError::InvalidInput(msg),
            _ => HourError::Infrastructure(err.to_string()),
        }
    }
}

/// Hours per tag. A year is charted over its calendar months up to `today`,
/// all-time over the months that have logs.
pub fn hours_chart(scope: Scope, logs: &[HourLog], today: NaiveDate) -> HoursChart {
    let buckets = match scope {
        Scope::Year(year) => calendar_months(year, today),
        Scope::AllTime => months(scope, logs),
    };

    HoursChart {
        labels: buckets.iter().map(ToString::to_string).collect(),
        series: series_per_sub_type(scope, logs, &buckets),
    }
}

pub struct HourService;

impl HourService {
    #[instrument(skip(db))]
    pub async fn log_hours(db: &Database, raw: RawHourLogRequest) -> Result<i64, HourError> {
        let req = CreateHourLogRequest::from_raw(raw).map_err(HourError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let id = HourRepository::new(uow.connection()).create(&req).await?;

        uow.commit().await?;
        Ok(id)
    }

    #[instrument(skip(db))]
    pub async fn update_hours(db: &Database, id: i64, raw: RawHourLogRequest) -> Result<HourLog, HourError> {
        let req = CreateHourLogRequest::from_raw(raw).map_err(HourError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = HourRepository::new(uow.connection());

        repo.update(id, &req).await?;
        let logged = repo.find_by_id(id).await?.ok_or(HourError::NotFound)?;

        uow.commit().await?;
        Ok(logged)
    }

    #[instrument(skip(db))]
    pub async fn get_hours(db: &Database, id: i64) -> Result<HourLog, HourError> {
        let mut uow = db.begin().await?;
        let mut repo = HourRepository::new(uow.connection());

        repo.find_by_id(id).await?.ok_or(HourError::NotFound)
    }

    #[instrument(skip(db))]
    pub async fn list_page(db: &Database, query: &TableQuery) -> Result<Page<HourLog>, HourError> {
        let filters = query.filters();
        let order = query.order_by(SORTABLE_COLUMNS);

        let mut uow = db.begin().await?;
        let mut repo = HourRepository::new(uow.connection());

        let total = repo.count(&filters).await?;
        let items = repo
            .list_page(&filters, &order, MAX_ITEMS_PER_TABLE, query.offset())
            .await?;

        Ok(Page::new(items, query.page(), total))
    }

    #[instrument(skip(db))]
    pub async fn list_in_scope(db: &Database, scope: Scope) -> Result<Vec<HourLog>, HourError> {
        let mut uow = db.begin().await?;
        Ok(HourRepository::new(uow.connection()).list_in_scope(scope).await?)
    }

    #[instrument(skip(db))]
    pub async fn list_tags(db: &Database) -> Result<Vec<String>, HourError> {
        let mut uow = db.begin().await?;
        Ok(HourRepository::new(uow.connection()).distinct_tags().await?)
    }

    #[instrument(skip(db))]
    pub async fn chart(db: &Database, scope: Scope, today: NaiveDate) -> Result<HoursChart, HourError> {
        let logs = Self::list_in_scope(db, scope).await?;
        Ok(hours_chart(scope, &logs, today))
    }

    #[instrument(skip(db))]
    pub async fn delete_hours(db: &Database, id: i64) -> Result<(), HourError> {
        let mut uow = db.begin().await?;
        HourRepository::new(uow.connection()).delete(id).await?;

        uow.commit().await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn delete_selected(db: &Database, ids: &[i64]) -> Result<usize, HourError> {
        let mut uow = db.begin().await?;
        let mut repo = HourRepository::new(uow.connection());

        for id in ids {
            repo.delete(*id).await?;
        }

        uow.commit().await?;
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::get_test_db;

    fn raw(amount: f64, year: i32, month: &str, tag: &str) -> RawHourLogRequest {
        RawHourLogRequest {
            amount,
            year,
            month: month.into(),
            day: None,
            description: None,
            tag: tag.into(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn test_log_and_get_hours() {
        let db = get_test_db().await;
        let id = HourService::log_hours(&db, raw(6.0, 2024, "January", "Client A")).await.unwrap();

        let logged = HourService::get_hours(&db, id).await.unwrap();
        assert_eq!(logged.amount, 6.0);
    }

    #[tokio::test]
    async fn test_log_hours_validation_failure() {
        let db = get_test_db().await;
        let err = HourService::log_hours(&db, raw(0.25, 2024, "January", "Client A")).await;
        assert!(matches!(err, Err(HourError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_chart_for_current_year_stops_at_this_month() {
        let db = get_test_db().await;
        HourService::log_hours(&db, raw(8.0, 2024, "January", "Client A")).await.unwrap();
        HourService::log_hours(&db, raw(4.0, 2024, "March", "Client A")).await.unwrap();
        HourService::log_hours(&db, raw(2.0, 2024, "March", "Client B")).await.unwrap();
        HourService::log_hours(&db, raw(9.0, 2023, "March", "Client B")).await.unwrap();

        let chart = HourService::chart(&db, Scope::Year(2024), today()).await.unwrap();
        assert_eq!(chart.labels, vec!["January", "February", "March"]);
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].label, "Client A");
        assert_eq!(chart.series[0].data, vec![8.0, 0.0, 4.0]);
        assert_eq!(chart.series[1].data, vec![0.0, 0.0, 2.0]);
    }

    #[tokio::test]
    async fn test_chart_all_time_uses_months_with_logs() {
        let db = get_test_db().await;
        HourService::log_hours(&db, raw(9.0, 2023, "March", "Client B")).await.unwrap();
        HourService::log_hours(&db, raw(1.0, 2024, "January", "Client B")).await.unwrap();

        let chart = HourService::chart(&db, Scope::AllTime, today()).await.unwrap();
        assert_eq!(chart.labels, vec!["2023-March", "2024-January"]);
        assert_eq!(chart.series[0].data, vec![9.0, 1.0]);
    }

    #[tokio::test]
    async fn test_delete_selected() {
        let db = get_test_db().await;
        let a = HourService::log_hours(&db, raw(1.0, 2024, "May", "A")).await.unwrap();
        let b = HourService::log_hours(&db, raw(1.0, 2024, "May", "B")).await.unwrap();

        assert_eq!(HourService::delete_selected(&db, &[a, b]).await.unwrap(), 2);
        assert!(HourService::list_tags(&db).await.unwrap().is_empty());
    }
}
