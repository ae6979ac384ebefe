//! Listing persistence.
//!
//! # Purpose
//! Defines the storage contract for catalog documents and the store-agnostic
//! filter vocabulary the query builder produces. Backends translate a
//! [`ListingFilter`] into their own matching logic: the in-memory store
//! evaluates predicates directly, Postgres renders them into SQL against a
//! fixed column allowlist.
//!
//! # Key invariants
//! - Titles are unique per listing kind; inserts and replacements that would
//!   duplicate a title fail with [`StoreError::Conflict`].
//! - Unknown ids (including malformed ones) are [`StoreError::NotFound`].
//! - Sort order is total: ties fall back to insertion order, newest first.
use crate::model::{Car, Field, Listing, Property};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Literal value compared by an equality predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

/// One conjunct of a listing filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact, case-sensitive equality.
    Equals(Field, FilterValue),
    /// Case-insensitive literal substring match on a text field.
    Contains(Field, String),
    /// Case-insensitive literal substring match on any of the fields.
    AnyContains(Vec<Field>, String),
    /// Inclusive price range; either bound may be open.
    PriceRange { min: Option<f64>, max: Option<f64> },
}

/// Conjunction of predicates. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub predicates: Vec<Predicate>,
}

impl ListingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// `createdAt` descending.
    Newest,
    /// `featured` descending, then `createdAt` descending.
    FeaturedThenNewest,
}

/// Skip/limit window of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    pub fn first(limit: u64) -> Self {
        Self { offset: 0, limit }
    }
}

/// Storage operations for one listing kind.
#[async_trait]
pub trait ListingStore<L: Listing>: Send + Sync {
    async fn list(
        &self,
        filter: &ListingFilter,
        sort: SortOrder,
        window: PageWindow,
    ) -> StoreResult<Vec<L>>;
    async fn count(&self, filter: &ListingFilter) -> StoreResult<u64>;
    /// Sum of `price` over matching documents, 0 when none match.
    async fn sum_price(&self, filter: &ListingFilter) -> StoreResult<f64>;
    async fn get(&self, id: &str) -> StoreResult<L>;
    /// Whether another document (other than `except_id`) already uses `title`.
    async fn title_taken(&self, title: &str, except_id: Option<&str>) -> StoreResult<bool>;
    async fn insert(&self, listing: L) -> StoreResult<L>;
    /// Replace an existing document wholesale, keyed by its id.
    async fn replace(&self, listing: L) -> StoreResult<L>;
    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Both catalogs plus backend health.
#[async_trait]
pub trait CatalogStore: ListingStore<Property> + ListingStore<Car> + Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
