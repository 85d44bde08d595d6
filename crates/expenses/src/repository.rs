use crate::models::{CreateExpenseRequest, Expense, ExpenseEntry, ExpenseTag, NewChildExpense, ProcessedExpense};
use common::columns::{enum_column, month_column};
use common::table::{OrderBy, TableFilters};
use database::{self, RepositoryError};
use reporting::Scope;
use sqlx::{FromRow, QueryBuilder};
use std::collections::HashMap;

const EXPENSE_COLUMNS: &str =
    "id, amount, year, month, day, description, tag, processed_expense_id, created_at";

/// Processed aggregates next to the plain expenses that have no parent.
const ENTRIES: &str = "SELECT * FROM (
    SELECT 'plain' AS kind, id, amount, NULL AS amount_per_day, year, month, day, description, tag, created_at
    FROM expenses WHERE processed_expense_id IS NULL
    UNION ALL
    SELECT 'processed' AS kind, id, total_amount AS amount, amount_per_day, year, month, NULL AS day, description, NULL AS tag, created_at
    FROM processed_expenses
) WHERE 1 = 1";

pub(crate) const SORTABLE_COLUMNS: &[&str] = &["amount", "tag", "year", "month", "day", "created_at"];

#[derive(FromRow)]
struct ExpenseRecord {
    id: i64,
    amount: i64,
    year: i64,
    month: i64,
    day: Option<i64>,
    description: Option<String>,
    tag: Option<String>,
    processed_expense_id: Option<i64>,
    created_at: String,
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = RepositoryError;

    fn try_from(record: ExpenseRecord) -> Result<Self, Self::Error> {
        Ok(Expense {
            id: record.id,
            amount: record.amount,
            year: record.year as i32,
            month: month_column(record.month)?,
            day: record.day.map(|d| d as u32),
            description: record.description,
            tag: record.tag.as_deref().map(|t| enum_column(t, "tag")).transpose()?,
            processed_expense_id: record.processed_expense_id,
            created_at: record.created_at,
        })
    }
}

#[derive(FromRow)]
struct EntryRecord {
    kind: String,
    id: i64,
    amount: i64,
    amount_per_day: Option<i64>,
    year: i64,
    month: i64,
    day: Option<i64>,
    description: Option<String>,
    tag: Option<String>,
    created_at: String,
}

impl TryFrom<EntryRecord> for ExpenseEntry {
    type Error = RepositoryError;

    fn try_from(record: EntryRecord) -> Result<Self, Self::Error> {
        match record.kind.as_str() {
            "processed" => Ok(ExpenseEntry::Processed(ProcessedExpense {
                id: record.id,
                total_amount: record.amount,
                amount_per_day: record.amount_per_day.unwrap_or_default(),
                year: record.year as i32,
                month: month_column(record.month)?,
                description: record.description,
                created_at: record.created_at,
                children: Vec::new(),
            })),
            _ => Ok(ExpenseEntry::Plain(Expense {
                id: record.id,
                amount: record.amount,
                year: record.year as i32,
                month: month_column(record.month)?,
                day: record.day.map(|d| d as u32),
                description: record.description,
                tag: record.tag.as_deref().map(|t| enum_column(t, "tag")).transpose()?,
                processed_expense_id: None,
                created_at: record.created_at,
            })),
        }
    }
}

pub(crate) struct ExpenseRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> ExpenseRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &CreateExpenseRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO expenses (amount, year, month, day, description, tag) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(req.amount())
        .bind(req.year())
        .bind(req.month().number() as i64)
        .bind(req.day().map(i64::from))
        .bind(req.description())
        .bind(req.tag().map(ExpenseTag::as_str))
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    /// Writes every child of a processed expense with a single INSERT.
    pub async fn create_children(
        &mut self,
        parent_id: i64,
        children: &[NewChildExpense],
    ) -> Result<u64, RepositoryError> {
        if children.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<database::Driver>::new(
            "INSERT INTO expenses (amount, year, month, description, tag, processed_expense_id) ",
        );
        builder.push_values(children, |mut row, child| {
            row.push_bind(child.amount)
                .push_bind(child.year)
                .push_bind(child.month.number() as i64)
                .push_bind(child.description.clone())
                .push_bind(child.tag.map(ExpenseTag::as_str))
                .push_bind(parent_id);
        });

        let result = builder.build().execute(&mut *self.conn).await?;
        Ok(result.rows_affected())
    }

    /// Updates a plain expense. Children of a processed expense are not editable.
    pub async fn update(&mut self, id: i64, req: &CreateExpenseRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE expenses SET amount = $1, year = $2, month = $3, day = $4, description = $5, tag = $6 WHERE id = $7 AND processed_expense_id IS NULL",
        )
        .bind(req.amount())
        .bind(req.year())
        .bind(req.month().number() as i64)
        .bind(req.day().map(i64::from))
        .bind(req.description())
        .bind(req.tag().map(ExpenseTag::as_str))
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn set_tag(&mut self, id: i64, tag: Option<ExpenseTag>) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE expenses SET tag = $1 WHERE id = $2 AND processed_expense_id IS NULL",
        )
        .bind(tag.map(ExpenseTag::as_str))
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<Expense>, RepositoryError> {
        let record = sqlx::query_as::<_, ExpenseRecord>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        record.map(Expense::try_from).transpose()
    }

    /// Children of the given processed expenses, grouped by parent id.
    pub async fn children_of(
        &mut self,
        parent_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Expense>>, RepositoryError> {
        let mut grouped: HashMap<i64, Vec<Expense>> = HashMap::new();
        if parent_ids.is_empty() {
            return Ok(grouped);
        }

        let mut builder = QueryBuilder::<database::Driver>::new(format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE processed_expense_id IN ("
        ));
        let mut separated = builder.separated(", ");
        for id in parent_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY id");

        let records = builder
            .build_query_as::<ExpenseRecord>()
            .fetch_all(&mut *self.conn)
            .await?;

        for record in records {
            let expense = Expense::try_from(record)?;
            if let Some(parent_id) = expense.processed_expense_id {
                grouped.entry(parent_id).or_default().push(expense);
            }
        }
        Ok(grouped)
    }

    pub async fn list_entries_page(
        &mut self,
        filters: &TableFilters,
        order: &OrderBy,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExpenseEntry>, RepositoryError> {
        let mut builder = QueryBuilder::<database::Driver>::new(ENTRIES);
        filters.push_conditions(&mut builder, Some("tag"));
        builder
            .push(" ORDER BY ")
            .push(order.to_sql())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let records = builder
            .build_query_as::<EntryRecord>()
            .fetch_all(&mut *self.conn)
            .await?;

        self.with_children(records).await
    }

    pub async fn count_entries(&mut self, filters: &TableFilters) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::<database::Driver>::new(format!("SELECT COUNT(*) FROM ({ENTRIES}"));
        filters.push_conditions(&mut builder, Some("tag"));
        builder.push(")");

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }

    pub async fn list_entries_in_scope(&mut self, scope: Scope) -> Result<Vec<ExpenseEntry>, RepositoryError> {
        let mut builder = QueryBuilder::<database::Driver>::new(ENTRIES);
        if let Some(year) = scope.year() {
            builder.push(" AND year = ").push_bind(year);
        }
        builder.push(" ORDER BY year, month, id");

        let records = builder
            .build_query_as::<EntryRecord>()
            .fetch_all(&mut *self.conn)
            .await?;

        self.with_children(records).await
    }

    async fn with_children(&mut self, records: Vec<EntryRecord>) -> Result<Vec<ExpenseEntry>, RepositoryError> {
        let mut entries = records
            .into_iter()
            .map(ExpenseEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let parent_ids: Vec<i64> = entries
            .iter()
            .filter(|e| e.is_processed())
            .map(ExpenseEntry::id)
            .collect();
        let mut children = self.children_of(&parent_ids).await?;

        for entry in &mut entries {
            if let ExpenseEntry::Processed(processed) = entry {
                processed.children = children.remove(&processed.id).unwrap_or_default();
            }
        }
        Ok(entries)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND processed_expense_id IS NULL")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processed_repository::ProcessedExpenseRepository;
    use common::table::SortDirection;
    use database::get_test_db;
    use reporting::Month;

    fn plain(amount: f64, month: Month, tag: Option<ExpenseTag>) -> CreateExpenseRequest {
        CreateExpenseRequest::new(amount, 2024, month, Some(3), None, tag, None).unwrap()
    }

    fn child(amount: i64) -> NewChildExpense {
        NewChildExpense {
            amount,
            year: 2024,
            month: Month::March,
            description: "Processed over 2 days. (Parent: 1)".into(),
            tag: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_expense() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = ExpenseRepository::new(uow.connection());

        let id = repo.create(&plain(9.99, Month::April, Some(ExpenseTag::Food))).await.unwrap();
        let expense = repo.find_by_id(id).await.unwrap().unwrap();

        assert_eq!(expense.amount, 999);
        assert_eq!(expense.day, Some(3));
        assert_eq!(expense.tag, Some(ExpenseTag::Food));
        assert_eq!(expense.processed_expense_id, None);
    }

    #[tokio::test]
    async fn test_children_are_inserted_in_one_batch() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();

        let parent_id = ProcessedExpenseRepository::new(uow.connection())
            .create(2500, 1000, 2024, Month::March, None)
            .await
            .unwrap();

        let mut repo = ExpenseRepository::new(uow.connection());
        let inserted = repo
            .create_children(parent_id, &[child(1000), child(1000), child(500)])
            .await
            .unwrap();
        assert_eq!(inserted, 3);

        let children = repo.children_of(&[parent_id]).await.unwrap();
        let amounts: Vec<i64> = children[&parent_id].iter().map(|c| c.amount).collect();
        assert_eq!(amounts, vec![1000, 1000, 500]);
    }

    #[tokio::test]
    async fn test_children_are_not_editable_as_plain_expenses() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();

        let parent_id = ProcessedExpenseRepository::new(uow.connection())
            .create(1000, 1000, 2024, Month::March, None)
            .await
            .unwrap();
        let mut repo = ExpenseRepository::new(uow.connection());
        repo.create_children(parent_id, &[child(1000)]).await.unwrap();
        let child_id = repo.children_of(&[parent_id]).await.unwrap()[&parent_id][0].id;

        let err = repo.set_tag(child_id, Some(ExpenseTag::Food)).await;
        assert!(matches!(err, Err(RepositoryError::NotFound)));
        let err = repo.delete(child_id).await;
        assert!(matches!(err, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_entries_list_aggregates_not_children() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();

        let parent_id = ProcessedExpenseRepository::new(uow.connection())
            .create(2500, 1000, 2024, Month::March, Some("Holiday"))
            .await
            .unwrap();
        let mut repo = ExpenseRepository::new(uow.connection());
        repo.create_children(parent_id, &[child(1000), child(1000), child(500)])
            .await
            .unwrap();
        repo.create(&plain(40.0, Month::March, Some(ExpenseTag::Food))).await.unwrap();
        repo.create(&plain(5.0, Month::January, None)).await.unwrap();

        let filters = TableFilters::default();
        let order = OrderBy { column: "amount", direction: SortDirection::Desc };
        let entries = repo.list_entries_page(&filters, &order, 35, 0).await.unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(repo.count_entries(&filters).await.unwrap(), 3);
        assert!(matches!(&entries[0], ExpenseEntry::Plain(e) if e.amount == 4000));
        match &entries[1] {
            ExpenseEntry::Processed(p) => {
                assert_eq!(p.total_amount, 2500);
                assert_eq!(p.children.len(), 3);
            }
            other => panic!("expected processed entry, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_entries_filter_by_tag_and_month() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = ExpenseRepository::new(uow.connection());

        repo.create(&plain(40.0, Month::March, Some(ExpenseTag::Food))).await.unwrap();
        repo.create(&plain(15.0, Month::March, Some(ExpenseTag::Health))).await.unwrap();
        repo.create(&plain(5.0, Month::January, Some(ExpenseTag::Food))).await.unwrap();

        let filters = TableFilters { year: Some(2024), month: Some(3), kind: Some("Food".into()) };
        assert_eq!(repo.count_entries(&filters).await.unwrap(), 1);
        let entries = repo
            .list_entries_page(&filters, &OrderBy::newest_first(), 35, 0)
            .await
            .unwrap();
        assert_eq!(entries[0].id(), 1);
    }

    #[tokio::test]
    async fn test_entries_in_scope() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();

        ProcessedExpenseRepository::new(uow.connection())
            .create(2500, 1000, 2023, Month::December, None)
            .await
            .unwrap();
        let mut repo = ExpenseRepository::new(uow.connection());
        repo.create(&plain(40.0, Month::March, None)).await.unwrap();

        assert_eq!(repo.list_entries_in_scope(Scope::Year(2024)).await.unwrap().len(), 1);
        let all = repo.list_entries_in_scope(Scope::AllTime).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].is_processed());
    }
}
