use crate::models::{CreateSubscriptionRequest, RawSubscriptionRequest, Subscription, SubscriptionType};
use crate::repository::{SubscriptionRepository, SORTABLE_COLUMNS};
use common::table::{Page, TableQuery, MAX_ITEMS_PER_TABLE};
use database::{Database, RepositoryError};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Subscription not found")]
    NotFound,
}

impl From<RepositoryError> for SubscriptionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => SubscriptionError::NotFound,
            RepositoryError::CheckViolation(msg) => SubscriptionError::InvalidInput(msg),
            _ => SubscriptionError::Infrastructure(err.to_string()),
        }
    }
}

pub struct SubscriptionService;

impl SubscriptionService {
    #[instrument(skip(db))]
    pub async fn create_subscription(
        db: &Database,
        raw: RawSubscriptionRequest,
    ) -> Result<i64, SubscriptionError> {
        let req = CreateSubscriptionRequest::from_raw(raw).map_err(SubscriptionError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let id = SubscriptionRepository::new(uow.connection()).create(&req).await?;

        uow.commit().await?;
        Ok(id)
    }

    #[instrument(skip(db))]
    pub async fn update_subscription(
        db: &Database,
        id: i64,
        raw: RawSubscriptionRequest,
    ) -> Result<Subscription, SubscriptionError> {
        let req = CreateSubscriptionRequest::from_raw(raw).map_err(SubscriptionError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = SubscriptionRepository::new(uow.connection());

        repo.update(id, &req).await?;
        let subscription = repo.find_by_id(id).await?.ok_or(SubscriptionError::NotFound)?;

        uow.commit().await?;
        Ok(subscription)
    }

    #[instrument(skip(db))]
    pub async fn get_subscription(db: &Database, id: i64) -> Result<Subscription, SubscriptionError> {
        let mut uow = db.begin().await?;
        let mut repo = SubscriptionRepository::new(uow.connection());

        repo.find_by_id(id).await?.ok_or(SubscriptionError::NotFound)
    }

    #[instrument(skip(db))]
    pub async fn list_page(
        db: &Database,
        query: &TableQuery,
    ) -> Result<Page<Subscription>, SubscriptionError> {
        let filters = query.filters();
        if let Some(kind) = filters.kind.as_deref() {
            kind.parse::<SubscriptionType>().map_err(SubscriptionError::InvalidInput)?;
        }
        let order = query.order_by(SORTABLE_COLUMNS);

        let mut uow = db.begin().await?;
        let mut repo = SubscriptionRepository::new(uow.connection());

        let total = repo.count(&filters).await?;
        let items = repo
            .list_page(&filters, &order, MAX_ITEMS_PER_TABLE, query.offset())
            .await?;

        Ok(Page::new(items, query.page(), total))
    }

    /// Sum of the yearly cost of every subscription, in cents.
    #[instrument(skip(db))]
    pub async fn yearly_total(db: &Database) -> Result<i64, SubscriptionError> {
        let mut uow = db.begin().await?;
        let all = SubscriptionRepository::new(uow.connection()).list_all().await?;

        Ok(all.iter().map(Subscription::yearly_cost).sum())
    }

    #[instrument(skip(db))]
    pub async fn delete_subscription(db: &Database, id: i64) -> Result<(), SubscriptionError> {
        let mut uow = db.begin().await?;
        SubscriptionRepository::new(uow.connection()).delete(id).await?;

        uow.commit().await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn delete_bulk(db: &Database, ids: &[i64]) -> Result<usize, SubscriptionError> {
        let mut uow = db.begin().await?;
        let mut repo = SubscriptionRepository::new(uow.connection());

        for id in ids {
            repo.delete(*id).await?;
        }

        uow.commit().await?;
        Ok(ids.len())
    }
}
