use crate::models::{
    CreateExpenseRequest, Expense, ExpenseEntry, ExpenseTag, NewChildExpense, ProcessedExpense, RawExpenseRequest,
};
use crate::processed_repository::ProcessedExpenseRepository;
use crate::repository::{ExpenseRepository, SORTABLE_COLUMNS};
use common::table::{Page, TableQuery, MAX_ITEMS_PER_TABLE};
use database::{Database, RepositoryError};
use reporting::{amount_to_cents, cents_to_amount, split_expense_over_days, Scope};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Expense not found")]
    NotFound,
}

impl From<RepositoryError> for ExpenseError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ExpenseError::NotFound,
            RepositoryError::CheckViolation(msg) => ExpenseError::InvalidInput(msg),
            _ => ExpenseError::Infrastructure(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum EntryId {
    Plain(i64),
    Processed(i64),
}

/// Writes a plain expense, or a processed expense and all of its children
/// when the request carries a daily amount.
async fn insert_entry(
    conn: &mut database::Connection,
    req: &CreateExpenseRequest,
) -> Result<EntryId, ExpenseError> {
    let Some(daily_amount) = req.daily_amount() else {
        let id = ExpenseRepository::new(conn).create(req).await?;
        return Ok(EntryId::Plain(id));
    };

    let split = split_expense_over_days(
        cents_to_amount(req.amount()),
        cents_to_amount(daily_amount),
        req.month(),
        req.year(),
    )
    .map_err(|e| ExpenseError::InvalidInput(e.to_string()))?;

    let parent_id = ProcessedExpenseRepository::new(&mut *conn)
        .create(req.amount(), daily_amount, req.year(), req.month(), req.description())
        .await?;

    let description = split.child_description(parent_id);
    let children: Vec<NewChildExpense> = split
        .children
        .iter()
        .map(|child| NewChildExpense {
            amount: amount_to_cents(child.amount),
            year: child.date.year,
            month: child.date.month,
            description: description.clone(),
            tag: req.tag(),
        })
        // A remainder smaller than half a cent has nothing left to store.
        .filter(|child| child.amount > 0)
        .collect();

    let inserted = ExpenseRepository::new(conn).create_children(parent_id, &children).await?;
    tracing::info!(parent_id, inserted, days = split.full_days, "Expense processed over days");

    Ok(EntryId::Processed(parent_id))
}

async fn load_processed(
    conn: &mut database::Connection,
    id: i64,
) -> Result<ProcessedExpense, ExpenseError> {
    let mut processed = ProcessedExpenseRepository::new(&mut *conn)
        .find_by_id(id)
        .await?
        .ok_or(ExpenseError::NotFound)?;

    let mut children = ExpenseRepository::new(conn).children_of(&[id]).await?;
    processed.children = children.remove(&id).unwrap_or_default();
    Ok(processed)
}

async fn load_entry(conn: &mut database::Connection, id: EntryId) -> Result<ExpenseEntry, ExpenseError> {
    match id {
        EntryId::Plain(id) => {
            let expense = ExpenseRepository::new(conn)
                .find_by_id(id)
                .await?
                .ok_or(ExpenseError::NotFound)?;
            Ok(ExpenseEntry::Plain(expense))
        }
        EntryId::Processed(id) => Ok(ExpenseEntry::Processed(load_processed(conn, id).await?)),
    }
}

pub struct ExpenseService;

impl ExpenseService {
    #[instrument(skip(db))]
    pub async fn create_expense(db: &Database, raw: RawExpenseRequest) -> Result<ExpenseEntry, ExpenseError> {
        let req = CreateExpenseRequest::from_raw(raw).map_err(ExpenseError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let id = insert_entry(uow.connection(), &req).await?;
        let entry = load_entry(uow.connection(), id).await?;

        uow.commit().await?;
        Ok(entry)
    }

    /// Updates a plain expense in place. With a daily amount it is replaced by
    /// a processed expense.
    #[instrument(skip(db))]
    pub async fn update_expense(
        db: &Database,
        id: i64,
        raw: RawExpenseRequest,
    ) -> Result<ExpenseEntry, ExpenseError> {
        let req = CreateExpenseRequest::from_raw(raw).map_err(ExpenseError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = ExpenseRepository::new(uow.connection());

        let existing = repo.find_by_id(id).await?.ok_or(ExpenseError::NotFound)?;
        if let Some(parent_id) = existing.processed_expense_id {
            return Err(ExpenseError::InvalidInput(format!(
                "Expense belongs to processed expense {}, edit that one instead",
                parent_id
            )));
        }

        let entry_id = if req.daily_amount().is_some() {
            repo.delete(id).await?;
            insert_entry(uow.connection(), &req).await?
        } else {
            repo.update(id, &req).await?;
            EntryId::Plain(id)
        };
        let entry = load_entry(uow.connection(), entry_id).await?;

        uow.commit().await?;
        Ok(entry)
    }

    /// Deletes the processed expense with its children and writes the new
    /// version from scratch.
    #[instrument(skip(db))]
    pub async fn update_processed(
        db: &Database,
        id: i64,
        raw: RawExpenseRequest,
    ) -> Result<ExpenseEntry, ExpenseError> {
        let req = CreateExpenseRequest::from_raw(raw).map_err(ExpenseError::InvalidInput)?;

        let mut uow = db.begin().await?;
        ProcessedExpenseRepository::new(uow.connection()).delete(id).await?;
        let entry_id = insert_entry(uow.connection(), &req).await?;
        let entry = load_entry(uow.connection(), entry_id).await?;

        uow.commit().await?;
        tracing::info!(old_id = id, new_id = entry.id(), "Processed expense regenerated");
        Ok(entry)
    }

    #[instrument(skip(db))]
    pub async fn get_expense(db: &Database, id: i64) -> Result<Expense, ExpenseError> {
        let mut uow = db.begin().await?;
        let mut repo = ExpenseRepository::new(uow.connection());

        repo.find_by_id(id).await?.ok_or(ExpenseError::NotFound)
    }

    #[instrument(skip(db))]
    pub async fn get_processed(db: &Database, id: i64) -> Result<ProcessedExpense, ExpenseError> {
        let mut uow = db.begin().await?;
        load_processed(uow.connection(), id).await
    }

    #[instrument(skip(db))]
    pub async fn list_page(db: &Database, query: &TableQuery) -> Result<Page<ExpenseEntry>, ExpenseError> {
        let filters = query.filters();
        if let Some(kind) = filters.kind.as_deref() {
            kind.parse::<ExpenseTag>().map_err(ExpenseError::InvalidInput)?;
        }
        let order = query.order_by(SORTABLE_COLUMNS);

        let mut uow = db.begin().await?;
        let mut repo = ExpenseRepository::new(uow.connection());

        let total = repo.count_entries(&filters).await?;
        let items = repo
            .list_entries_page(&filters, &order, MAX_ITEMS_PER_TABLE, query.offset())
            .await?;

        Ok(Page::new(items, query.page(), total))
    }

    /// Plain expenses without a parent and processed aggregates in `scope`.
    #[instrument(skip(db))]
    pub async fn list_in_scope(db: &Database, scope: Scope) -> Result<Vec<ExpenseEntry>, ExpenseError> {
        let mut uow = db.begin().await?;
        let mut repo = ExpenseRepository::new(uow.connection());

        Ok(repo.list_entries_in_scope(scope).await?)
    }

    #[instrument(skip(db))]
    pub async fn set_tag_bulk(
        db: &Database,
        ids: &[i64],
        tag: Option<ExpenseTag>,
    ) -> Result<usize, ExpenseError> {
        let mut uow = db.begin().await?;
        let mut repo = ExpenseRepository::new(uow.connection());

        for id in ids {
            repo.set_tag(*id, tag).await?;
        }

        uow.commit().await?;
        Ok(ids.len())
    }

    #[instrument(skip(db))]
    pub async fn delete_expense(db: &Database, id: i64) -> Result<(), ExpenseError> {
        let mut uow = db.begin().await?;
        ExpenseRepository::new(uow.connection()).delete(id).await?;

        uow.commit().await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn delete_processed(db: &Database, id: i64) -> Result<(), ExpenseError> {
        let mut uow = db.begin().await?;
        ProcessedExpenseRepository::new(uow.connection()).delete(id).await?;

        uow.commit().await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn delete_bulk(
        db: &Database,
        ids: &[i64],
        processed_ids: &[i64],
    ) -> Result<usize, ExpenseError> {
        let mut uow = db.begin().await?;

        let mut repo = ExpenseRepository::new(uow.connection());
        for id in ids {
            repo.delete(*id).await?;
        }
        let mut processed_repo = ProcessedExpenseRepository::new(uow.connection());
        for id in processed_ids {
            processed_repo.delete(*id).await?;
        }

        uow.commit().await?;
        Ok(ids.len() + processed_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::get_test_db;

    fn raw(amount: f64, daily_amount: Option<f64>) -> RawExpenseRequest {
        RawExpenseRequest {
            amount,
            year: 2024,
            month: "March".into(),
            day: None,
            description: Some("Groceries".into()),
            tag: Some("Food".into()),
            daily_amount,
        }
    }

    async fn count_rows(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&db.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_plain_expense() {
        let db = get_test_db().await;
        let entry = ExpenseService::create_expense(&db, raw(12.5, None)).await.unwrap();

        match entry {
            ExpenseEntry::Plain(expense) => {
                assert_eq!(expense.amount, 1250);
                assert_eq!(expense.tag, Some(ExpenseTag::Food));
            }
            other => panic!("expected plain expense, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_processed_expense_splits_over_days() {
        let db = get_test_db().await;
        let entry = ExpenseService::create_expense(&db, raw(25.0, Some(10.0))).await.unwrap();

        let ExpenseEntry::Processed(processed) = entry else {
            panic!("expected processed expense");
        };
        assert_eq!(processed.total_amount, 2500);
        assert_eq!(processed.amount_per_day, 1000);

        let amounts: Vec<i64> = processed.children.iter().map(|c| c.amount).collect();
        assert_eq!(amounts, vec![1000, 1000, 500]);
        for child in &processed.children {
            assert_eq!(child.processed_expense_id, Some(processed.id));
            assert_eq!(
                child.description.as_deref(),
                Some(format!("Processed over 2 days. (Parent: {})", processed.id).as_str())
            );
        }
    }

    #[tokio::test]
    async fn test_create_processed_expense_exact_days() {
        let db = get_test_db().await;
        let entry = ExpenseService::create_expense(&db, raw(30.0, Some(10.0))).await.unwrap();

        let ExpenseEntry::Processed(processed) = entry else {
            panic!("expected processed expense");
        };
        assert_eq!(processed.children.len(), 3);
        assert!(processed.children.iter().all(|c| c.amount == 1000));
    }

    #[tokio::test]
    async fn test_absurd_split_writes_nothing() {
        let db = get_test_db().await;
        let err = ExpenseService::create_expense(&db, raw(100000.0, Some(0.01))).await;

        assert!(matches!(err, Err(ExpenseError::InvalidInput(_))));
        assert_eq!(count_rows(&db, "processed_expenses").await, 0);
        assert_eq!(count_rows(&db, "expenses").await, 0);
    }

    #[tokio::test]
    async fn test_update_processed_regenerates_children() {
        let db = get_test_db().await;
        let first = ExpenseService::create_expense(&db, raw(25.0, Some(10.0))).await.unwrap();

        let updated = ExpenseService::update_processed(&db, first.id(), raw(40.0, Some(20.0)))
            .await
            .unwrap();

        let ExpenseEntry::Processed(processed) = updated else {
            panic!("expected processed expense");
        };
        assert_eq!(processed.children.len(), 2);
        assert_eq!(count_rows(&db, "processed_expenses").await, 1);
        assert_eq!(count_rows(&db, "expenses").await, 2);
        assert!(matches!(
            ExpenseService::get_processed(&db, first.id()).await,
            Err(ExpenseError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_processed_without_daily_amount_becomes_plain() {
        let db = get_test_db().await;
        let first = ExpenseService::create_expense(&db, raw(25.0, Some(10.0))).await.unwrap();

        let updated = ExpenseService::update_processed(&db, first.id(), raw(25.0, None)).await.unwrap();

        assert!(!updated.is_processed());
        assert_eq!(count_rows(&db, "processed_expenses").await, 0);
        assert_eq!(count_rows(&db, "expenses").await, 1);
    }

    #[tokio::test]
    async fn test_plain_expense_edited_with_daily_amount_becomes_processed() {
        let db = get_test_db().await;
        let plain = ExpenseService::create_expense(&db, raw(30.0, None)).await.unwrap();

        let updated = ExpenseService::update_expense(&db, plain.id(), raw(30.0, Some(10.0)))
            .await
            .unwrap();

        assert!(updated.is_processed());
        assert!(matches!(
            ExpenseService::get_expense(&db, plain.id()).await,
            Err(ExpenseError::NotFound)
        ));
        assert_eq!(count_rows(&db, "expenses").await, 3);
    }

    #[tokio::test]
    async fn test_update_plain_expense_in_place() {
        let db = get_test_db().await;
        let plain = ExpenseService::create_expense(&db, raw(30.0, None)).await.unwrap();

        let updated = ExpenseService::update_expense(&db, plain.id(), raw(31.0, None)).await.unwrap();
        assert_eq!(updated.id(), plain.id());
        assert_eq!(ExpenseService::get_expense(&db, plain.id()).await.unwrap().amount, 3100);
    }

    #[tokio::test]
    async fn test_child_cannot_be_edited_directly() {
        let db = get_test_db().await;
        let ExpenseEntry::Processed(processed) =
            ExpenseService::create_expense(&db, raw(20.0, Some(10.0))).await.unwrap()
        else {
            panic!("expected processed expense");
        };

        let child_id = processed.children[0].id;
        let err = ExpenseService::update_expense(&db, child_id, raw(5.0, None)).await;
        assert!(matches!(err, Err(ExpenseError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_delete_processed_cascades() {
        let db = get_test_db().await;
        let processed = ExpenseService::create_expense(&db, raw(25.0, Some(10.0))).await.unwrap();

        ExpenseService::delete_processed(&db, processed.id()).await.unwrap();
        assert_eq!(count_rows(&db, "expenses").await, 0);
    }

    #[tokio::test]
    async fn test_set_tag_bulk_and_list() {
        let db = get_test_db().await;
        let a = ExpenseService::create_expense(&db, raw(1.0, None)).await.unwrap();
        let b = ExpenseService::create_expense(&db, raw(2.0, None)).await.unwrap();
        ExpenseService::create_expense(&db, raw(25.0, Some(10.0))).await.unwrap();

        ExpenseService::set_tag_bulk(&db, &[a.id(), b.id()], Some(ExpenseTag::Health))
            .await
            .unwrap();

        let query = TableQuery { kind: Some("Health".into()), ..Default::default() };
        let page = ExpenseService::list_page(&db, &query).await.unwrap();
        assert_eq!(page.total, 2);

        let everything = ExpenseService::list_page(&db, &TableQuery::default()).await.unwrap();
        assert_eq!(everything.total, 3);
    }

    #[tokio::test]
    async fn test_set_tag_bulk_with_child_id_changes_nothing() {
        let db = get_test_db().await;
        let plain = ExpenseService::create_expense(&db, raw(1.0, None)).await.unwrap();
        let ExpenseEntry::Processed(processed) =
            ExpenseService::create_expense(&db, raw(20.0, Some(10.0))).await.unwrap()
        else {
            panic!("expected processed expense");
        };
        let child_id = processed.children[0].id;

        let err = ExpenseService::set_tag_bulk(&db, &[plain.id(), child_id], Some(ExpenseTag::Health)).await;
        assert!(matches!(err, Err(ExpenseError::NotFound)));

        let err = ExpenseService::set_tag_bulk(&db, &[plain.id(), 999_999], Some(ExpenseTag::Health)).await;
        assert!(matches!(err, Err(ExpenseError::NotFound)));

        let unchanged = ExpenseService::get_expense(&db, plain.id()).await.unwrap();
        assert_eq!(unchanged.tag, Some(ExpenseTag::Food));
        let child = ExpenseService::get_expense(&db, child_id).await.unwrap();
        assert_eq!(child.tag, Some(ExpenseTag::Food));
    }

    #[tokio::test]
    async fn test_delete_bulk_with_child_or_unknown_id_deletes_nothing() {
        let db = get_test_db().await;
        let plain = ExpenseService::create_expense(&db, raw(1.0, None)).await.unwrap();
        let ExpenseEntry::Processed(processed) =
            ExpenseService::create_expense(&db, raw(20.0, Some(10.0))).await.unwrap()
        else {
            panic!("expected processed expense");
        };
        let child_id = processed.children[0].id;

        let err = ExpenseService::delete_bulk(&db, &[plain.id(), child_id], &[]).await;
        assert!(matches!(err, Err(ExpenseError::NotFound)));

        let err = ExpenseService::delete_bulk(&db, &[plain.id()], &[processed.id, 999_999]).await;
        assert!(matches!(err, Err(ExpenseError::NotFound)));

        // One plain row plus two children.
        assert_eq!(count_rows(&db, "expenses").await, 3);
        assert_eq!(count_rows(&db, "processed_expenses").await, 1);
    }

    #[tokio::test]
    async fn test_delete_bulk_mixed() {
        let db = get_test_db().await;
        let plain = ExpenseService::create_expense(&db, raw(1.0, None)).await.unwrap();
        let processed = ExpenseService::create_expense(&db, raw(25.0, Some(10.0))).await.unwrap();

        let deleted = ExpenseService::delete_bulk(&db, &[plain.id()], &[processed.id()]).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(count_rows(&db, "expenses").await, 0);
        assert_eq!(count_rows(&db, "processed_expenses").await, 0);
    }
}
