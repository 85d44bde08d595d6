use crate::models::{CreateIncomeRequest, Income, IncomeType, RawIncomeRequest};
use crate::repository::{IncomeRepository, SORTABLE_COLUMNS};
use common::table::{Page, TableQuery, MAX_ITEMS_PER_TABLE};
use database::{Database, RepositoryError};
use reporting::Scope;
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum IncomeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Income not found")]
    NotFound,
}

impl From<RepositoryError> for IncomeError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => IncomeError::NotFound,
            RepositoryError::CheckViolation(msg) => IncomeError::InvalidInput(msg),
            _ => IncomeError::Infrastructure(err.to_string()),
        }
    }
}

pub struct IncomeService;

impl IncomeService {
    #[instrument(skip(db))]
    pub async fn create_income(db: &Database, raw: RawIncomeRequest) -> Result<i64, IncomeError> {
        let req = CreateIncomeRequest::from_raw(raw).map_err(IncomeError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        let id = repo.create(&req).await?;

        uow.commit().await?;
        tracing::info!(id, "Income created");
        Ok(id)
    }

    #[instrument(skip(db))]
    pub async fn update_income(
        db: &Database,
        id: i64,
        raw: RawIncomeRequest,
    ) -> Result<Income, IncomeError> {
        let req = CreateIncomeRequest::from_raw(raw).map_err(IncomeError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        repo.update(id, &req).await?;
        let income = repo.find_by_id(id).await?.ok_or(IncomeError::NotFound)?;

        uow.commit().await?;
        Ok(income)
    }

    #[instrument(skip(db))]
    pub async fn get_income(db: &Database, id: i64) -> Result<Income, IncomeError> {
        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        repo.find_by_id(id).await?.ok_or(IncomeError::NotFound)
    }

    #[instrument(skip(db))]
    pub async fn list_page(db: &Database, query: &TableQuery) -> Result<Page<Income>, IncomeError> {
        let filters = query.filters();
        if let Some(kind) = filters.kind.as_deref() {
            kind.parse::<IncomeType>().map_err(IncomeError::InvalidInput)?;
        }
        let order = query.order_by(SORTABLE_COLUMNS);

        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        let total = repo.count(&filters).await?;
        let items = repo
            .list_page(&filters, &order, MAX_ITEMS_PER_TABLE, query.offset())
            .await?;

        Ok(Page::new(items, query.page(), total))
    }

    #[instrument(skip(db))]
    pub async fn list_in_scope(db: &Database, scope: Scope) -> Result<Vec<Income>, IncomeError> {
        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        Ok(repo.list_in_scope(scope).await?)
    }

    /// Changes the type of every listed row. Nothing changes if one of them is missing.
    #[instrument(skip(db))]
    pub async fn set_type_bulk(
        db: &Database,
        ids: &[i64],
        income_type: IncomeType,
    ) -> Result<usize, IncomeError> {
        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        for id in ids {
            repo.set_type(*id, income_type).await?;
        }

        uow.commit().await?;
        Ok(ids.len())
    }

    #[instrument(skip(db))]
    pub async fn delete_income(db: &Database, id: i64) -> Result<(), IncomeError> {
        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        repo.delete(id).await?;

        uow.commit().await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn delete_bulk(db: &Database, ids: &[i64]) -> Result<usize, IncomeError> {
        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        for id in ids {
            repo.delete(*id).await?;
        }

        uow.commit().await?;
        tracing::info!(count = ids.len(), "Income deleted");
        Ok(ids.len())
    }
}
