use crate::models::{CreateIncomeRequest, Income, IncomeType};
use common::columns::{enum_column, month_column};
use common::table::{TableFilters, OrderBy};
use database::{self, RepositoryError};
use reporting::Scope;
use sqlx::{FromRow, QueryBuilder};

const INCOME_COLUMNS: &str = "id, income_type, amount, year, month, description, created_at";

pub(crate) const SORTABLE_COLUMNS: &[&str] =
    &["amount", "income_type", "year", "month", "created_at"];

#[derive(FromRow)]
struct IncomeRecord {
    id: i64,
    income_type: String,
    amount: i64,
    year: i64,
    month: i64,
    description: Option<String>,
    created_at: String,
}

impl TryFrom<IncomeRecord> for Income {
    type Error = RepositoryError;

    fn try_from(record: IncomeRecord) -> Result<Self, Self::Error> {
        Ok(Income {
            id: record.id,
            income_type: enum_column(&record.income_type, "income_type")?,
            amount: record.amount,
            year: record.year as i32,
            month: month_column(record.month)?,
            description: record.description,
            created_at: record.created_at,
        })
    }
}

fn into_income(records: Vec<IncomeRecord>) -> Result<Vec<Income>, RepositoryError> {
    records.into_iter().map(Income::try_from).collect()
}

pub(crate) struct IncomeRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> IncomeRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &CreateIncomeRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO income (income_type, amount, year, month, description) VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(req.income_type().as_str())
        .bind(req.amount())
        .bind(req.year())
        .bind(req.month().number() as i64)
        .bind(req.description())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn update(&mut self, id: i64, req: &CreateIncomeRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE income SET income_type = $1, amount = $2, year = $3, month = $4, description = $5 WHERE id = $6",
        )
        .bind(req.income_type().as_str())
        .bind(req.amount())
        .bind(req.year())
        .bind(req.month().number() as i64)
        .bind(req.description())
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn set_type(&mut self, id: i64, income_type: IncomeType) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE income SET income_type = $1 WHERE id = $2")
            .bind(income_type.as_str())
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<Income>, RepositoryError> {
        let record = sqlx::query_as::<_, IncomeRecord>(&format!(
            "SELECT {INCOME_COLUMNS} FROM income WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        record.map(Income::try_from).transpose()
    }

    pub async fn list_in_scope(&mut self, scope: Scope) -> Result<Vec<Income>, RepositoryError> {
        let mut builder = QueryBuilder::<database::Driver>::new(format!("SELECT {INCOME_COLUMNS} FROM income WHERE 1 = 1"));
        if let Some(year) = scope.year() {
            builder.push(" AND year = ").push_bind(year);
        }
        builder.push(" ORDER BY year, month, id");

        let records = builder
            .build_query_as::<IncomeRecord>()
            .fetch_all(&mut *self.conn)
            .await?;

        into_income(records)
    }

    pub async fn list_page(
        &mut self,
        filters: &TableFilters,
        order: &OrderBy,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Income>, RepositoryError> {
        let mut builder = QueryBuilder::<database::Driver>::new(format!("SELECT {INCOME_COLUMNS} FROM income WHERE 1 = 1"));
        filters.push_conditions(&mut builder, Some("income_type"));
        builder
            .push(" ORDER BY ")
            .push(order.to_sql())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let records = builder
            .build_query_as::<IncomeRecord>()
            .fetch_all(&mut *self.conn)
            .await?;

        into_income(records)
    }

    pub async fn count(&mut self, filters: &TableFilters) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::<database::Driver>::new("SELECT COUNT(*) FROM income WHERE 1 = 1");
        filters.push_conditions(&mut builder, Some("income_type"));

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM income WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
