use crate::models::{CreateHourLogRequest, HourLog};
use common::columns::month_column;
use common::table::{OrderBy, TableFilters};
use database::{self, RepositoryError};
use reporting::Scope;
use sqlx::{FromRow, QueryBuilder};

const HOUR_COLUMNS: &str = "id, amount, year, month, day, description, tag, created_at";

pub(crate) const SORTABLE_COLUMNS: &[&str] = &["amount", "tag", "year", "month", "day", "created_at"];

#[derive(FromRow)]
struct HourLogRecord {
    id: i64,
    amount: f64,
    year: i64,
    month: i64,
    day: Option<i64>,
    description: Option<String>,
    tag: String,
    created_at: String,
}

impl TryFrom<HourLogRecord> for HourLog {
    type Error = RepositoryError;

    fn try_from(record: HourLogRecord) -> Result<Self, Self::Error> {
        Ok(HourLog {
            id: record.id,
            amount: record.amount,
            year: record.year as i32,
            month: month_column(record.month)?,
            day: record.day.map(|d| d as u32),
            description: record.description,
            tag: record.tag,
            created_at: record.created_at,
        })
    }
}

fn into_logs(records: Vec<HourLogRecord>) -> Result<Vec<HourLog>, RepositoryError> {
    records.into_iter().map(HourLog::try_from).collect()
}

pub(crate) struct HourRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> HourRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &CreateHourLogRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO hours (amount, year, month, day, description, tag) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(req.amount())
        .bind(req.year())
        .bind(req.month().number() as i64)
        .bind(req.day().map(i64::from))
        .bind(req.description())
        .bind(req.tag())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn update(&mut self, id: i64, req: &CreateHourLogRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE hours SET amount = $1, year = $2, month = $3, day = $4, description = $5, tag = $6 WHERE id = $7",
        )
        .bind(req.amount())
        .bind(req.year())
        .bind(req.month().number() as i64)
        .bind(req.day().map(i64::from))
        .bind(req.description())
        .bind(req.tag())
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<HourLog>, RepositoryError> {
        let record = sqlx::query_as::<_, HourLogRecord>(&format!(
            "SELECT {HOUR_COLUMNS} FROM hours WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        record.map(HourLog::try_from).transpose()
    }

    pub async fn list_in_scope(&mut self, scope: Scope) -> Result<Vec<HourLog>, RepositoryError> {
        let mut builder =
            QueryBuilder::<database::Driver>::new(format!("SELECT {HOUR_COLUMNS} FROM hours WHERE 1 = 1"));
        if let Some(year) = scope.year() {
            builder.push(" AND year = ").push_bind(year);
        }
        builder.push(" ORDER BY year, month, day, id");

        let records = builder
            .build_query_as::<HourLogRecord>()
            .fetch_all(&mut *self.conn)
            .await?;

        into_logs(records)
    }

    pub async fn list_page(
        &mut self,
        filters: &TableFilters,
        order: &OrderBy,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<HourLog>, RepositoryError> {
        let mut builder =
            QueryBuilder::<database::Driver>::new(format!("SELECT {HOUR_COLUMNS} FROM hours WHERE 1 = 1"));
        filters.push_conditions(&mut builder, Some("tag"));
        builder
            .push(" ORDER BY ")
            .push(order.to_sql())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let records = builder
            .build_query_as::<HourLogRecord>()
            .fetch_all(&mut *self.conn)
            .await?;

        into_logs(records)
    }

    pub async fn count(&mut self, filters: &TableFilters) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::<database::Driver>::new("SELECT COUNT(*) FROM hours WHERE 1 = 1");
        filters.push_conditions(&mut builder, Some("tag"));

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }

    pub async fn distinct_tags(&mut self) -> Result<Vec<String>, RepositoryError> {
        let tags: Vec<String> = sqlx::query_scalar("SELECT DISTINCT tag FROM hours ORDER BY tag")
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(tags)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM hours WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
