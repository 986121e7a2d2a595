//! Catalog service
//!
//! Read-through cache over the product repository. The order state machine
//! consumes the catalog through the narrow [`Catalog`] trait: it needs the
//! product's price/name/owner and the owner's farmer standing at order time,
//! nothing else. Quantities live in the inventory ledger, not here.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::models::{Product, ProductCreate};
use crate::db::repository::{ProductRepository, RepoResult};

/// Product metadata snapshot used during order creation
#[derive(Debug, Clone)]
pub struct ProductMeta {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub farmer_id: String,
}

/// Narrow catalog interface consumed by the order state machine
pub trait Catalog: Send + Sync {
    /// Metadata for an active product, if it exists
    fn product_meta(&self, product_id: &str) -> Option<ProductMeta>;
    /// Whether the user is a known farmer (has registered a listing)
    fn is_farmer(&self, user_id: &str) -> bool;
}

/// Catalog service backed by SurrealDB with an in-memory metadata cache
pub struct CatalogService {
    repo: ProductRepository,
    products: RwLock<HashMap<String, ProductMeta>>,
    farmers: RwLock<HashSet<String>>,
}

impl CatalogService {
    pub fn new(db: Surreal<Db>) -> Arc<Self> {
        Arc::new(Self {
            repo: ProductRepository::new(db),
            products: RwLock::new(HashMap::new()),
            farmers: RwLock::new(HashSet::new()),
        })
    }

    /// Load all active products into the cache (startup warmup)
    pub async fn warmup(&self) -> RepoResult<usize> {
        let products = self.repo.find_all().await?;

        let mut product_cache = self.products.write();
        let mut farmer_cache = self.farmers.write();
        let mut loaded = 0;
        for product in products {
            if let Some(key) = product.key() {
                farmer_cache.insert(product.farmer_id.clone());
                product_cache.insert(
                    key.clone(),
                    ProductMeta {
                        id: key,
                        name: product.name,
                        price: product.price,
                        farmer_id: product.farmer_id,
                    },
                );
                loaded += 1;
            }
        }
        tracing::info!(products = loaded, "Catalog cache warmed up");
        Ok(loaded)
    }

    /// Register a new product listing for a farmer
    ///
    /// The caller's Farmer role has already been checked at the API layer;
    /// registration is what makes `is_farmer` true for order-time checks.
    pub async fn register_product(
        &self,
        farmer_id: &str,
        data: ProductCreate,
    ) -> RepoResult<Product> {
        let product = self.repo.create(farmer_id, data).await?;
        if let Some(key) = product.key() {
            self.farmers.write().insert(farmer_id.to_string());
            self.products.write().insert(
                key.clone(),
                ProductMeta {
                    id: key,
                    name: product.name.clone(),
                    price: product.price,
                    farmer_id: product.farmer_id.clone(),
                },
            );
        }
        Ok(product)
    }

    /// Fetch a product by id (read-through, no cache)
    pub async fn get_product(&self, id: &str) -> RepoResult<Option<Product>> {
        self.repo.find_by_id(id).await
    }

    /// List all active products
    pub async fn list_products(&self) -> RepoResult<Vec<Product>> {
        self.repo.find_all().await
    }
}

impl Catalog for CatalogService {
    fn product_meta(&self, product_id: &str) -> Option<ProductMeta> {
        let cache = self.products.read();
        cache.get(product_id).cloned()
    }

    fn is_farmer(&self, user_id: &str) -> bool {
        self.farmers.read().contains(user_id)
    }
}
