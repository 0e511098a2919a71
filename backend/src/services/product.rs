//! Product catalog service
//!
//! Products carry a surrogate UUID key; the display name is unique but
//! mutable, so renaming a product is a one-row update and inventory and
//! movement rows follow automatically through the foreign key.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::validate_name;

/// Product service for catalog management
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// A catalog product
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub cost_price: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub code: Option<String>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub cost_price: Option<Decimal>,
}

/// Input for updating a product; a changed name is a rename
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub cost_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Input for bulk product registration
#[derive(Debug, Deserialize)]
pub struct BulkCreateInput {
    pub products: Vec<CreateProductInput>,
}

/// Result of bulk product registration
#[derive(Debug, Serialize)]
pub struct BulkCreateResult {
    pub created_count: usize,
}

/// Filters for the product listing
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub include_inactive: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

const PRODUCT_COLUMNS: &str = r#"
    SELECT p.id, p.name, p.code, p.category_id, c.name AS category_name,
           p.description, p.image_url, p.cost_price, p.is_active,
           p.created_at, p.updated_at
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List products, active only by default.
    pub async fn list(&self, filter: ProductFilter) -> AppResult<PaginatedResponse<Product>> {
        let pagination = Pagination {
            page: filter.page.unwrap_or(1),
            per_page: filter.per_page.unwrap_or(Pagination::default().per_page),
        };
        let search = filter.search.map(|s| format!("%{}%", s));
        let include_inactive = filter.include_inactive.unwrap_or(false);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products p
            WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.code ILIKE $1)
              AND ($2 OR p.is_active)
            "#,
        )
        .bind(&search)
        .bind(include_inactive)
        .fetch_one(&self.db)
        .await?;

        let sql = format!(
            r#"{}
            WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.code ILIKE $1)
              AND ($2 OR p.is_active)
            ORDER BY p.name
            LIMIT $3 OFFSET $4
            "#,
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&search)
            .bind(include_inactive)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            data: products,
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }

    /// Get a single product.
    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        let sql = format!("{} WHERE p.id = $1", PRODUCT_COLUMNS);
        sqlx::query_as::<_, Product>(&sql)
            .bind(product_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Register a product.
    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        if let Err(msg) = validate_name(&input.name) {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: msg.to_string(),
            });
        }
        self.ensure_name_free(&input.name, None).await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO products (name, code, category_id, description, image_url, cost_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.code)
        .bind(input.category_id)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(input.cost_price)
        .fetch_one(&self.db)
        .await?;

        self.get(id).await
    }

    /// Update a product. Changing the name renames it everywhere at once
    /// since inventory and movements reference the product by id.
    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        let existing = self.get(product_id).await?;

        let name = match input.name {
            Some(name) => {
                if let Err(msg) = validate_name(&name) {
                    return Err(AppError::Validation {
                        field: "name".to_string(),
                        message: msg.to_string(),
                    });
                }
                if name.trim() != existing.name {
                    self.ensure_name_free(&name, Some(product_id)).await?;
                }
                name.trim().to_string()
            }
            None => existing.name,
        };

        sqlx::query(
            r#"
            UPDATE products
            SET name = $1,
                code = $2,
                category_id = $3,
                description = $4,
                image_url = $5,
                cost_price = $6,
                is_active = $7,
                updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind(&name)
        .bind(input.code.or(existing.code))
        .bind(input.category_id.or(existing.category_id))
        .bind(input.description.or(existing.description))
        .bind(input.image_url.or(existing.image_url))
        .bind(input.cost_price.or(existing.cost_price))
        .bind(input.is_active.unwrap_or(existing.is_active))
        .bind(product_id)
        .execute(&self.db)
        .await?;

        self.get(product_id).await
    }

    /// Deactivate a product. History and stock rows are kept; the product
    /// simply stops appearing in active listings.
    pub async fn deactivate(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(product_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }

    /// Register several products at once. Names are validated up front;
    /// any problem rejects the whole batch.
    pub async fn bulk_create(&self, input: BulkCreateInput) -> AppResult<BulkCreateResult> {
        if input.products.is_empty() {
            return Err(AppError::ValidationError(
                "No products to register".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for (index, product) in input.products.iter().enumerate() {
            if let Err(msg) = validate_name(&product.name) {
                return Err(AppError::ValidationError(format!(
                    "row {}: {}",
                    index + 1,
                    msg
                )));
            }
            if !seen.insert(product.name.trim().to_string()) {
                return Err(AppError::ValidationError(format!(
                    "row {}: duplicate name '{}' in batch",
                    index + 1,
                    product.name.trim()
                )));
            }
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE name = $1)",
            )
            .bind(product.name.trim())
            .fetch_one(&self.db)
            .await?;
            if exists {
                return Err(AppError::ValidationError(format!(
                    "row {}: product '{}' already exists",
                    index + 1,
                    product.name.trim()
                )));
            }
        }

        let mut tx = self.db.begin().await?;
        for product in &input.products {
            sqlx::query(
                r#"
                INSERT INTO products (name, code, category_id, description, image_url, cost_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(product.name.trim())
            .bind(&product.code)
            .bind(product.category_id)
            .bind(&product.description)
            .bind(&product.image_url)
            .bind(product.cost_price)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(BulkCreateResult {
            created_count: input.products.len(),
        })
    }

    async fn ensure_name_free(&self, name: &str, exclude: Option<Uuid>) -> AppResult<()> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE name = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(name.trim())
        .bind(exclude)
        .fetch_one(&self.db)
        .await?;

        if taken {
            return Err(AppError::DuplicateEntry("name".to_string()));
        }
        Ok(())
    }
}
