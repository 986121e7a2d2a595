//! Product Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Product, ProductCreate};
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active products
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE is_active = true ORDER BY created_at")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let product: Option<Product> = self.base.db().select((PRODUCT_TABLE, id)).await?;
        Ok(product)
    }

    /// Create a new product listing owned by the given farmer
    pub async fn create(&self, farmer_id: &str, data: ProductCreate) -> RepoResult<Product> {
        let product = Product {
            id: None,
            name: data.name,
            description: data.description,
            price: data.price,
            unit: data.unit,
            farmer_id: farmer_id.to_string(),
            is_active: true,
            created_at: now_millis(),
        };

        let created: Option<Product> = self
            .base
            .db()
            .create(PRODUCT_TABLE)
            .content(product)
            .await?;

        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::engine::local::RocksDb;

    async fn test_repo() -> (ProductRepository, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let db: Surreal<Db> = Surreal::new::<RocksDb>(tmp.path()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        (ProductRepository::new(db), tmp)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (repo, _tmp) = test_repo().await;

        let created = repo
            .create(
                "farmer-1",
                ProductCreate {
                    name: "Tomatoes".to_string(),
                    description: None,
                    price: 2.5,
                    unit: Some("kg".to_string()),
                    stock: 100,
                },
            )
            .await
            .unwrap();

        let key = created.key().unwrap();
        let found = repo.find_by_id(&key).await.unwrap().unwrap();
        assert_eq!(found.name, "Tomatoes");
        assert_eq!(found.farmer_id, "farmer-1");

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
