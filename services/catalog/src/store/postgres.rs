//! Postgres-backed implementation of the catalog store.
//!
//! # Data model
//! One table per listing kind (`properties`, `cars`). Every table carries:
//! - `id TEXT PRIMARY KEY` (UUID string assigned by the listing service)
//! - `seq BIGSERIAL` insertion order, used only to break sort ties
//! - `title TEXT UNIQUE`, which makes title uniqueness hold under concurrent creates
//! - enum fields stored as their display strings, list fields as `TEXT[]`
//!
//! # Filters
//! [`ListingFilter`] predicates are rendered with `sqlx::QueryBuilder`. Column names come from
//! [`Field::column`], a fixed internal allowlist; every user-supplied value is a bind parameter.
//! Substring predicates use `ILIKE` with `%`, `_` and `\` escaped so search text is literal.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")`.
//! - Database URLs may contain credentials; avoid logging them.
use super::{
    CatalogStore, FilterValue, ListingFilter, ListingStore, PageWindow, Predicate, SortOrder,
    StoreError, StoreResult,
};
use crate::config::PostgresConfig;
use crate::model::{Car, Listing, Property};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::str::FromStr;
use std::time::Duration;

/// Durable catalog store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use catalog::config::PostgresConfig;
/// use catalog::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect, size the pool, and apply migrations before returning.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;
        // Handlers assume the schema exists; fail startup rather than serve a partial API.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    #[cfg(any(test, feature = "pg-tests"))]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

/// Table mapping for a listing kind.
pub trait PgListing: Listing {
    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;

    const TABLE: &'static str;
    /// Every column except `id` and `seq`, in bind order.
    const DATA_COLUMNS: &'static str;

    fn from_row(row: Self::Row) -> StoreResult<Self>;
    /// Push one bind per entry of `DATA_COLUMNS`.
    fn bind_data(&self, values: &mut Separated<'_, '_, Postgres, &'static str>);
}

#[derive(Debug, Clone, FromRow)]
pub struct DbProperty {
    id: String,
    title: String,
    description: String,
    price: f64,
    currency: String,
    location: String,
    bedrooms: i64,
    bathrooms: i64,
    square_footage: i64,
    property_type: String,
    status: String,
    featured: bool,
    images: Vec<String>,
    interior_features: Vec<String>,
    exterior_features: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PgListing for Property {
    type Row = DbProperty;

    const TABLE: &'static str = "properties";
    const DATA_COLUMNS: &'static str = "title, description, price, currency, location, bedrooms, \
        bathrooms, square_footage, property_type, status, featured, images, interior_features, \
        exterior_features, created_at, updated_at";

    fn from_row(row: DbProperty) -> StoreResult<Self> {
        Ok(Property {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            currency: parse_column(&row.currency)?,
            location: row.location,
            bedrooms: count_column(row.bedrooms, "bedrooms")?,
            bathrooms: count_column(row.bathrooms, "bathrooms")?,
            square_footage: count_column(row.square_footage, "square_footage")?,
            property_type: parse_column(&row.property_type)?,
            status: parse_column(&row.status)?,
            featured: row.featured,
            images: row.images,
            interior_features: row.interior_features,
            exterior_features: row.exterior_features,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn bind_data(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.title.clone())
            .push_bind(self.description.clone())
            .push_bind(self.price)
            .push_bind(self.currency.as_str())
            .push_bind(self.location.clone())
            .push_bind(i64::from(self.bedrooms))
            .push_bind(i64::from(self.bathrooms))
            .push_bind(i64::from(self.square_footage))
            .push_bind(self.property_type.as_str())
            .push_bind(self.status.as_str())
            .push_bind(self.featured)
            .push_bind(self.images.clone())
            .push_bind(self.interior_features.clone())
            .push_bind(self.exterior_features.clone())
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbCar {
    id: String,
    title: String,
    description: String,
    price: f64,
    currency: String,
    location: String,
    make: String,
    model: String,
    year: i32,
    mileage: i64,
    fuel_type: String,
    transmission: String,
    color: String,
    condition: String,
    status: String,
    featured: bool,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PgListing for Car {
    type Row = DbCar;

    const TABLE: &'static str = "cars";
    const DATA_COLUMNS: &'static str = "title, description, price, currency, location, make, \
        model, year, mileage, fuel_type, transmission, color, condition, status, featured, images, \
        created_at, updated_at";

    fn from_row(row: DbCar) -> StoreResult<Self> {
        Ok(Car {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            currency: parse_column(&row.currency)?,
            location: row.location,
            make: row.make,
            model: row.model,
            year: row.year,
            mileage: count_column(row.mileage, "mileage")?,
            fuel_type: parse_column(&row.fuel_type)?,
            transmission: parse_column(&row.transmission)?,
            color: row.color,
            condition: parse_column(&row.condition)?,
            status: parse_column(&row.status)?,
            featured: row.featured,
            images: row.images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn bind_data(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.title.clone())
            .push_bind(self.description.clone())
            .push_bind(self.price)
            .push_bind(self.currency.as_str())
            .push_bind(self.location.clone())
            .push_bind(self.make.clone())
            .push_bind(self.model.clone())
            .push_bind(self.year)
            .push_bind(i64::from(self.mileage))
            .push_bind(self.fuel_type.as_str())
            .push_bind(self.transmission.as_str())
            .push_bind(self.color.clone())
            .push_bind(self.condition.as_str())
            .push_bind(self.status.as_str())
            .push_bind(self.featured)
            .push_bind(self.images.clone())
            .push_bind(self.created_at)
            .push_bind(self.updated_at);
    }
}

#[async_trait]
impl<L: PgListing> ListingStore<L> for PostgresStore {
    async fn list(
        &self,
        filter: &ListingFilter,
        sort: SortOrder,
        window: PageWindow,
    ) -> StoreResult<Vec<L>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT id, {} FROM {}",
            L::DATA_COLUMNS,
            L::TABLE
        ));
        push_where(&mut query, filter);
        query.push(match sort {
            SortOrder::Newest => " ORDER BY created_at DESC, seq DESC",
            SortOrder::FeaturedThenNewest => " ORDER BY featured DESC, created_at DESC, seq DESC",
        });
        query
            .push(" LIMIT ")
            .push_bind(to_i64(window.limit))
            .push(" OFFSET ")
            .push_bind(to_i64(window.offset));
        let rows = query
            .build_query_as::<L::Row>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(L::from_row).collect()
    }

    async fn count(&self, filter: &ListingFilter) -> StoreResult<u64> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", L::TABLE));
        push_where(&mut query, filter);
        let count: i64 = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn sum_price(&self, filter: &ListingFilter) -> StoreResult<f64> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT COALESCE(SUM(price), 0)::DOUBLE PRECISION FROM {}",
            L::TABLE
        ));
        push_where(&mut query, filter);
        let total: f64 = query
            .build_query_scalar::<f64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn get(&self, id: &str) -> StoreResult<L> {
        let sql = format!(
            "SELECT id, {} FROM {} WHERE id = $1",
            L::DATA_COLUMNS,
            L::TABLE
        );
        let row = sqlx::query_as::<_, L::Row>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => L::from_row(row),
            None => Err(StoreError::NotFound(L::KIND.as_str().into())),
        }
    }

    async fn title_taken(&self, title: &str, except_id: Option<&str>) -> StoreResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE title = $1 AND ($2::TEXT IS NULL OR id <> $2))",
            L::TABLE
        );
        let taken: bool = sqlx::query_scalar(&sql)
            .bind(title)
            .bind(except_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn insert(&self, listing: L) -> StoreResult<L> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} (id, {}) VALUES (",
            L::TABLE,
            L::DATA_COLUMNS
        ));
        {
            let mut values = query.separated(", ");
            values.push_bind(listing.id().to_string());
            listing.bind_data(&mut values);
        }
        query.push(")");
        if let Err(err) = query.build().execute(&self.pool).await {
            if is_unique_violation(&err) {
                return Err(StoreError::Conflict(format!(
                    "{} title already exists",
                    L::KIND
                )));
            }
            return Err(err.into());
        }
        Ok(listing)
    }

    async fn replace(&self, listing: L) -> StoreResult<L> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "UPDATE {} SET ({}) = (",
            L::TABLE,
            L::DATA_COLUMNS
        ));
        {
            let mut values = query.separated(", ");
            listing.bind_data(&mut values);
        }
        query
            .push(") WHERE id = ")
            .push_bind(listing.id().to_string());
        match query.build().execute(&self.pool).await {
            Ok(result) if result.rows_affected() == 0 => {
                Err(StoreError::NotFound(L::KIND.as_str().into()))
            }
            Ok(_) => Ok(listing),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict(format!(
                "{} title already exists",
                L::KIND
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", L::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(L::KIND.as_str().into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn push_where(query: &mut QueryBuilder<'_, Postgres>, filter: &ListingFilter) {
    for (index, predicate) in filter.predicates.iter().enumerate() {
        query.push(if index == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::Equals(field, value) => {
                query.push(field.column()).push(" = ");
                match value {
                    FilterValue::Text(text) => query.push_bind(text.clone()),
                    FilterValue::Int(number) => query.push_bind(*number),
                    FilterValue::Bool(flag) => query.push_bind(*flag),
                };
            }
            Predicate::Contains(field, needle) => {
                query
                    .push(field.column())
                    .push(" ILIKE ")
                    .push_bind(like_pattern(needle));
            }
            Predicate::AnyContains(fields, needle) => {
                let pattern = like_pattern(needle);
                query.push("(");
                for (position, field) in fields.iter().enumerate() {
                    if position > 0 {
                        query.push(" OR ");
                    }
                    query
                        .push(field.column())
                        .push(" ILIKE ")
                        .push_bind(pattern.clone());
                }
                if fields.is_empty() {
                    query.push("FALSE");
                }
                query.push(")");
            }
            Predicate::PriceRange { min, max } => {
                query.push("TRUE");
                if let Some(min) = min {
                    query.push(" AND price >= ").push_bind(*min);
                }
                if let Some(max) = max {
                    query.push(" AND price <= ").push_bind(*max);
                }
            }
        }
    }
}

/// Wrap `needle` in `%` after escaping LIKE metacharacters.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}

fn parse_column<T>(value: &str) -> StoreResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|err: T::Err| StoreError::Unexpected(anyhow!("corrupt enum column: {err}")))
}

fn count_column(value: i64, column: &str) -> StoreResult<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::Unexpected(anyhow!("{column} out of range: {value}")))
}
