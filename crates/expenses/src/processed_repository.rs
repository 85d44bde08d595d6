use crate::models::ProcessedExpense;
use common::columns::month_column;
use database::{self, RepositoryError};
use reporting::Month;
use sqlx::FromRow;

#[derive(FromRow)]
struct ProcessedExpenseRecord {
    id: i64,
    total_amount: i64,
    amount_per_day: i64,
    year: i64,
    month: i64,
    description: Option<String>,
    created_at: String,
}

impl TryFrom<ProcessedExpenseRecord> for ProcessedExpense {
    type Error = RepositoryError;

    fn try_from(record: ProcessedExpenseRecord) -> Result<Self, Self::Error> {
        Ok(ProcessedExpense {
            id: record.id,
            total_amount: record.total_amount,
            amount_per_day: record.amount_per_day,
            year: record.year as i32,
            month: month_column(record.month)?,
            description: record.description,
            created_at: record.created_at,
            children: Vec::new(),
        })
    }
}

pub(crate) struct ProcessedExpenseRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> ProcessedExpenseRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &mut self,
        total_amount: i64,
        amount_per_day: i64,
        year: i32,
        month: Month,
        description: Option<&str>,
    ) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO processed_expenses (total_amount, amount_per_day, year, month, description) VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(total_amount)
        .bind(amount_per_day)
        .bind(year)
        .bind(month.number() as i64)
        .bind(description)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    /// The aggregate without its children.
    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<ProcessedExpense>, RepositoryError> {
        let record = sqlx::query_as::<_, ProcessedExpenseRecord>(
            "SELECT id, total_amount, amount_per_day, year, month, description, created_at FROM processed_expenses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        record.map(ProcessedExpense::try_from).transpose()
    }

    /// Children go with it through ON DELETE CASCADE.
    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM processed_expenses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
