use crate::models::{CreateSubscriptionRequest, Subscription};
use common::columns::enum_column;
use common::table::{OrderBy, TableFilters};
use database::{self, RepositoryError};
use sqlx::{FromRow, QueryBuilder};

const SUBSCRIPTION_COLUMNS: &str = "id, name, price, subscription_type, description, created_at";

pub(crate) const SORTABLE_COLUMNS: &[&str] = &["name", "price", "subscription_type", "created_at"];

#[derive(FromRow)]
struct SubscriptionRecord {
    id: i64,
    name: String,
    price: i64,
    subscription_type: String,
    description: Option<String>,
    created_at: String,
}

impl TryFrom<SubscriptionRecord> for Subscription {
    type Error = RepositoryError;

    fn try_from(record: SubscriptionRecord) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: record.id,
            name: record.name,
            price: record.price,
            subscription_type: enum_column(&record.subscription_type, "subscription_type")?,
            description: record.description,
            created_at: record.created_at,
        })
    }
}

pub(crate) struct SubscriptionRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> SubscriptionRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &CreateSubscriptionRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO subscriptions (name, price, subscription_type, description) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(req.name())
        .bind(req.price())
        .bind(req.subscription_type().as_str())
        .bind(req.description())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn update(&mut self, id: i64, req: &CreateSubscriptionRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET name = $1, price = $2, subscription_type = $3, description = $4 WHERE id = $5",
        )
        .bind(req.name())
        .bind(req.price())
        .bind(req.subscription_type().as_str())
        .bind(req.description())
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<Subscription>, RepositoryError> {
        let record = sqlx::query_as::<_, SubscriptionRecord>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        record.map(Subscription::try_from).transpose()
    }

    pub async fn list_all(&mut self) -> Result<Vec<Subscription>, RepositoryError> {
        let records = sqlx::query_as::<_, SubscriptionRecord>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions ORDER BY name"
        ))
        .fetch_all(&mut *self.conn)
        .await?;

        records.into_iter().map(Subscription::try_from).collect()
    }

    /// Subscriptions are not dated, so only the type filter applies.
    pub async fn list_page(
        &mut self,
        filters: &TableFilters,
        order: &OrderBy,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Subscription>, RepositoryError> {
        let mut builder = QueryBuilder::<database::Driver>::new(format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE 1 = 1"
        ));
        push_type_filter(&mut builder, filters);
        builder
            .push(" ORDER BY ")
            .push(order.to_sql())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let records = builder
            .build_query_as::<SubscriptionRecord>()
            .fetch_all(&mut *self.conn)
            .await?;

        records.into_iter().map(Subscription::try_from).collect()
    }

    pub async fn count(&mut self, filters: &TableFilters) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::<database::Driver>::new("SELECT COUNT(*) FROM subscriptions WHERE 1 = 1");
        push_type_filter(&mut builder, filters);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn push_type_filter(builder: &mut QueryBuilder<'_, database::Driver>, filters: &TableFilters) {
    let type_only = TableFilters { kind: filters.kind.clone(), ..Default::default() };
    type_only.push_conditions(builder, Some("subscription_type"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubscriptionType;
    use common::table::SortDirection;
    use database::get_test_db;

    fn sub(name: &str, price: f64, subscription_type: SubscriptionType) -> CreateSubscriptionRequest {
        CreateSubscriptionRequest::new(name.into(), price, subscription_type, None).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_update_subscription() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = SubscriptionRepository::new(uow.connection());

        let id = repo.create(&sub("Music", 9.99, SubscriptionType::Monthly)).await.unwrap();
        repo.update(id, &sub("Music Family", 14.99, SubscriptionType::Monthly)).await.unwrap();

        let found = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.name, "Music Family");
        assert_eq!(found.price, 1499);
    }

    #[tokio::test]
    async fn test_list_page_filters_by_type() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = SubscriptionRepository::new(uow.connection());

        repo.create(&sub("Music", 9.99, SubscriptionType::Monthly)).await.unwrap();
        repo.create(&sub("Domain", 15.0, SubscriptionType::Yearly)).await.unwrap();
        repo.create(&sub("Cloud", 2.0, SubscriptionType::Monthly)).await.unwrap();

        let filters = TableFilters { year: Some(2024), kind: Some("Monthly".into()), ..Default::default() };
        let order = OrderBy { column: "name", direction: SortDirection::Asc };
        let page = repo.list_page(&filters, &order, 35, 0).await.unwrap();

        let names: Vec<&str> = page.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Cloud", "Music"]);
        assert_eq!(repo.count(&filters).await.unwrap(), 2);
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_subscription() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = SubscriptionRepository::new(uow.connection());

        let id = repo.create(&sub("Music", 9.99, SubscriptionType::Monthly)).await.unwrap();
        repo.delete(id).await.unwrap();
        assert!(repo.find_by_id(id).await.unwrap().is_none());
    }
}
