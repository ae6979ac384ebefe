//! In-memory implementation of the catalog store.
//!
//! # Purpose
//! Keeps both catalogs in `HashMap`s guarded by `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: title uniqueness is checked and the write applied under the
//!   same write lock, so two concurrent creates with one title cannot both succeed.
//! - Reads scan the whole collection; fine for dev-sized catalogs.
use super::{
    CatalogStore, FilterValue, ListingFilter, ListingStore, PageWindow, Predicate, SortOrder,
    StoreError, StoreResult,
};
use crate::model::{Car, Field, FieldValue, Listing, Property};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A stored document plus the process-local insertion sequence used to break sort ties.
#[derive(Debug, Clone)]
struct Entry<L> {
    seq: u64,
    listing: L,
}

#[derive(Debug)]
struct Inner<L> {
    next_seq: u64,
    docs: HashMap<String, Entry<L>>,
}

/// One listing collection.
#[derive(Debug)]
pub struct Collection<L> {
    inner: Arc<RwLock<Inner<L>>>,
}

impl<L> Default for Collection<L> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                next_seq: 0,
                docs: HashMap::new(),
            })),
        }
    }
}

/// Listing kinds the in-memory store has a collection for.
pub trait MemoryBacked: Listing {
    fn collection(store: &InMemoryStore) -> &Collection<Self>;
}

impl MemoryBacked for Property {
    fn collection(store: &InMemoryStore) -> &Collection<Self> {
        &store.properties
    }
}

impl MemoryBacked for Car {
    fn collection(store: &InMemoryStore) -> &Collection<Self> {
        &store.cars
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    properties: Collection<Property>,
    cars: Collection<Car>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<L: MemoryBacked> ListingStore<L> for InMemoryStore {
    async fn list(
        &self,
        filter: &ListingFilter,
        sort: SortOrder,
        window: PageWindow,
    ) -> StoreResult<Vec<L>> {
        let inner = L::collection(self).inner.read().await;
        let mut matched: Vec<&Entry<L>> = inner
            .docs
            .values()
            .filter(|entry| matches(filter, &entry.listing))
            .collect();
        matched.sort_by(|a, b| compare(sort, a, b));
        Ok(matched
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .map(|entry| entry.listing.clone())
            .collect())
    }

    async fn count(&self, filter: &ListingFilter) -> StoreResult<u64> {
        let inner = L::collection(self).inner.read().await;
        Ok(inner
            .docs
            .values()
            .filter(|entry| matches(filter, &entry.listing))
            .count() as u64)
    }

    async fn sum_price(&self, filter: &ListingFilter) -> StoreResult<f64> {
        let inner = L::collection(self).inner.read().await;
        Ok(inner
            .docs
            .values()
            .filter(|entry| matches(filter, &entry.listing))
            .map(|entry| entry.listing.price())
            .sum())
    }

    async fn get(&self, id: &str) -> StoreResult<L> {
        let inner = L::collection(self).inner.read().await;
        inner
            .docs
            .get(id)
            .map(|entry| entry.listing.clone())
            .ok_or_else(|| StoreError::NotFound(L::KIND.as_str().into()))
    }

    async fn title_taken(&self, title: &str, except_id: Option<&str>) -> StoreResult<bool> {
        let inner = L::collection(self).inner.read().await;
        Ok(title_in_use(&inner, title, except_id))
    }

    async fn insert(&self, listing: L) -> StoreResult<L> {
        let mut inner = L::collection(self).inner.write().await;
        if inner.docs.contains_key(listing.id()) {
            return Err(StoreError::Conflict(format!("{} id exists", L::KIND)));
        }
        if title_in_use(&inner, listing.title(), None) {
            return Err(StoreError::Conflict(format!(
                "{} title already exists",
                L::KIND
            )));
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.docs.insert(
            listing.id().to_string(),
            Entry {
                seq,
                listing: listing.clone(),
            },
        );
        Ok(listing)
    }

    async fn replace(&self, listing: L) -> StoreResult<L> {
        let mut inner = L::collection(self).inner.write().await;
        if !inner.docs.contains_key(listing.id()) {
            return Err(StoreError::NotFound(L::KIND.as_str().into()));
        }
        if title_in_use(&inner, listing.title(), Some(listing.id())) {
            return Err(StoreError::Conflict(format!(
                "{} title already exists",
                L::KIND
            )));
        }
        if let Some(entry) = inner.docs.get_mut(listing.id()) {
            entry.listing = listing.clone();
        }
        Ok(listing)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut inner = L::collection(self).inner.write().await;
        match inner.docs.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(L::KIND.as_str().into())),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

fn title_in_use<L: Listing>(inner: &Inner<L>, title: &str, except_id: Option<&str>) -> bool {
    inner
        .docs
        .values()
        .any(|entry| entry.listing.title() == title && Some(entry.listing.id()) != except_id)
}

fn compare<L: Listing>(sort: SortOrder, a: &Entry<L>, b: &Entry<L>) -> Ordering {
    let newest = b
        .listing
        .created_at()
        .cmp(&a.listing.created_at())
        .then_with(|| b.seq.cmp(&a.seq));
    match sort {
        SortOrder::Newest => newest,
        SortOrder::FeaturedThenNewest => b
            .listing
            .featured()
            .cmp(&a.listing.featured())
            .then(newest),
    }
}

fn matches<L: Listing>(filter: &ListingFilter, listing: &L) -> bool {
    filter
        .predicates
        .iter()
        .all(|predicate| predicate_matches(predicate, listing))
}

fn predicate_matches<L: Listing>(predicate: &Predicate, listing: &L) -> bool {
    match predicate {
        Predicate::Equals(field, expected) => {
            match (listing.field(*field), expected) {
                (Some(FieldValue::Text(actual)), FilterValue::Text(expected)) => {
                    actual == expected.as_str()
                }
                (Some(FieldValue::Int(actual)), FilterValue::Int(expected)) => actual == *expected,
                (Some(FieldValue::Bool(actual)), FilterValue::Bool(expected)) => {
                    actual == *expected
                }
                _ => false,
            }
        }
        Predicate::Contains(field, needle) => text_contains(listing, *field, &needle.to_lowercase()),
        Predicate::AnyContains(fields, needle) => {
            let needle = needle.to_lowercase();
            fields
                .iter()
                .any(|field| text_contains(listing, *field, &needle))
        }
        Predicate::PriceRange { min, max } => {
            let price = listing.price();
            min.is_none_or(|min| price >= min) && max.is_none_or(|max| price <= max)
        }
    }
}

fn text_contains<L: Listing>(listing: &L, field: Field, lowered_needle: &str) -> bool {
    match listing.field(field) {
        Some(FieldValue::Text(value)) => value.to_lowercase().contains(lowered_needle),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyStatus, sample_car_draft, sample_property_draft};
    use chrono::{Duration, Utc};

    fn property(id: &str, title: &str, created_offset_secs: i64) -> Property {
        let now = Utc::now() + Duration::seconds(created_offset_secs);
        Property::from_draft(id.to_string(), sample_property_draft(title), now)
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_titles() {
        let store = InMemoryStore::new();
        store.insert(property("a", "Seaside Villa", 0)).await.expect("insert");
        let err = store
            .insert(property("b", "Seaside Villa", 0))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(
            ListingStore::<Property>::count(&store, &ListingFilter::new())
                .await
                .expect("count"),
            1
        );
    }

    #[tokio::test]
    async fn titles_are_unique_per_kind_only() {
        let store = InMemoryStore::new();
        store.insert(property("a", "Black Beauty", 0)).await.expect("property");
        let car = Car::from_draft(
            "c".to_string(),
            sample_car_draft("Black Beauty", 1.0),
            Utc::now(),
        );
        store.insert(car).await.expect("car with same title");
    }

    #[tokio::test]
    async fn replace_and_delete_unknown_ids_are_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .replace(property("missing", "Nowhere", 0))
            .await
            .expect_err("replace");
        assert!(matches!(err, StoreError::NotFound(_)));
        let err = ListingStore::<Property>::delete(&store, "missing")
            .await
            .expect_err("delete");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn replace_keeps_own_title_but_rejects_others() {
        let store = InMemoryStore::new();
        store.insert(property("a", "First", 0)).await.expect("a");
        store.insert(property("b", "Second", 0)).await.expect("b");

        let mut a = ListingStore::<Property>::get(&store, "a").await.expect("get");
        a.price = 5.0;
        store.replace(a.clone()).await.expect("same title is fine");

        a.title = "Second".to_string();
        let err = store.replace(a).await.expect_err("collision");
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn featured_then_newest_ordering() {
        let store = InMemoryStore::new();
        let mut old_featured = property("old", "Old Featured", -100);
        old_featured.featured = true;
        store.insert(old_featured).await.expect("old");
        store.insert(property("new", "Brand New", 0)).await.expect("new");
        store.insert(property("mid", "Middle", -50)).await.expect("mid");

        let public: Vec<Property> = store
            .list(
                &ListingFilter::new(),
                SortOrder::FeaturedThenNewest,
                PageWindow::first(10),
            )
            .await
            .expect("list");
        let ids: Vec<&str> = public.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["old", "new", "mid"]);

        let admin: Vec<Property> = store
            .list(&ListingFilter::new(), SortOrder::Newest, PageWindow::first(10))
            .await
            .expect("list");
        let ids: Vec<&str> = admin.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn equal_timestamps_fall_back_to_insertion_order() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        for id in ["first", "second", "third"] {
            let listing = Property::from_draft(id.to_string(), sample_property_draft(id), now);
            store.insert(listing).await.expect("insert");
        }
        let listed: Vec<Property> = store
            .list(&ListingFilter::new(), SortOrder::Newest, PageWindow::first(10))
            .await
            .expect("list");
        let ids: Vec<&str> = listed.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn predicates_filter_documents() {
        let store = InMemoryStore::new();
        let mut rent = property("rent", "Garden Flat", 0);
        rent.status = PropertyStatus::ForRent;
        rent.location = "Ikoyi".to_string();
        rent.price = 5_000_000.0;
        store.insert(rent).await.expect("rent");
        store.insert(property("sale", "Hilltop VILLA", 0)).await.expect("sale");

        let status = ListingFilter::new().and(Predicate::Equals(
            Field::Status,
            FilterValue::Text("For Rent".into()),
        ));
        assert_eq!(ListingStore::<Property>::count(&store, &status).await.expect("count"), 1);

        let search = ListingFilter::new().and(Predicate::AnyContains(
            Property::SEARCH_FIELDS.to_vec(),
            "villa".into(),
        ));
        let found: Vec<Property> = store
            .list(&search, SortOrder::Newest, PageWindow::first(10))
            .await
            .expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "sale");

        let range = ListingFilter::new().and(Predicate::PriceRange {
            min: Some(1_000_000.0),
            max: Some(5_000_000.0),
        });
        let in_range: Vec<Property> = store
            .list(&range, SortOrder::Newest, PageWindow::first(10))
            .await
            .expect("range");
        assert_eq!(in_range.len(), 1);
        assert_eq!(in_range[0].id, "rent");

        let wildcard = ListingFilter::new().and(Predicate::Contains(Field::Location, ".*".into()));
        assert_eq!(ListingStore::<Property>::count(&store, &wildcard).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn sum_price_over_filter() {
        let store = InMemoryStore::new();
        let mut a = property("a", "A", 0);
        a.price = 10.0;
        let mut b = property("b", "B", 0);
        b.price = 32.5;
        store.insert(a).await.expect("a");
        store.insert(b).await.expect("b");
        let total = ListingStore::<Property>::sum_price(&store, &ListingFilter::new())
            .await
            .expect("sum");
        assert_eq!(total, 42.5);
    }

    #[tokio::test]
    async fn window_skips_and_limits() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store
                .insert(property(&format!("p{i}"), &format!("Title {i}"), i))
                .await
                .expect("insert");
        }
        let page: Vec<Property> = store
            .list(
                &ListingFilter::new(),
                SortOrder::Newest,
                PageWindow { offset: 3, limit: 10 },
            )
            .await
            .expect("page");
        assert_eq!(page.len(), 2);
        let beyond: Vec<Property> = store
            .list(
                &ListingFilter::new(),
                SortOrder::Newest,
                PageWindow { offset: 10, limit: 10 },
            )
            .await
            .expect("beyond");
        assert!(beyond.is_empty());
    }
}
