//! Listing service: CRUD over properties and cars.
//!
//! # Purpose
//! Business rules shared by both catalogs, generic over [`Listing`]. Handlers
//! call these functions; stores only persist.
//!
//! # Key invariants
//! - Mutations check `listing.write` before any store access.
//! - Validation runs on the fully merged document, so a patch can never leave
//!   a document the create path would have rejected.
//! - Titles are unique per catalog; collisions are reported as conflicts.
//! - `updatedAt` strictly increases on every successful update.
//! - Image cleanup on delete is best-effort and never blocks the delete.
pub mod display;
pub mod query;

use crate::auth::Actor;
use crate::media::{MediaStore, delete_images};
use crate::model::{Listing, ValidationError};
use crate::observability::LISTING_CHANGES;
use crate::store::{ListingStore, StoreError};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use luxe_authz::{Action, AuthzError, authorize};
use query::{ListQuery, PageMeta};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Forbidden(#[from] AuthzError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ListingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(message) => ListingError::NotFound(message),
            StoreError::Conflict(message) => ListingError::Conflict(message),
            other => ListingError::Store(other),
        }
    }
}

pub type ListingResult<T> = Result<T, ListingError>;

/// One page of listings plus pagination metadata.
#[derive(Debug, Clone)]
pub struct Page<L> {
    pub items: Vec<L>,
    pub pagination: PageMeta,
}

/// Storage timestamps keep microsecond precision (Postgres `TIMESTAMPTZ`).
fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(TimeDelta::microseconds(1)).unwrap_or(now)
}

fn not_found<L: Listing>(id: &str) -> ListingError {
    ListingError::NotFound(format!("{} {id} not found", L::KIND))
}

fn duplicate_title<L: Listing>(title: &str) -> ListingError {
    ListingError::Conflict(format!("a {} titled {title:?} already exists", L::KIND))
}

fn record_change<L: Listing>(op: &'static str) {
    metrics::counter!(LISTING_CHANGES, "kind" => L::KIND.as_str(), "op" => op).increment(1);
}

/// Fetch one listing, mapping a store miss to a kind-specific message.
async fn fetch<L, S>(store: &S, id: &str) -> ListingResult<L>
where
    L: Listing,
    S: ListingStore<L> + ?Sized,
{
    match store.get(id).await {
        Ok(listing) => Ok(listing),
        Err(StoreError::NotFound(_)) => Err(not_found::<L>(id)),
        Err(err) => Err(err.into()),
    }
}

pub async fn list<L, S>(store: &S, query: &ListQuery) -> ListingResult<Page<L>>
where
    L: Listing,
    S: ListingStore<L> + ?Sized,
{
    let total = store.count(&query.filter).await?;
    let items = store
        .list(&query.filter, query.sort, query.window())
        .await?;
    Ok(Page {
        items,
        pagination: PageMeta::new(total, query.page, query.limit),
    })
}

pub async fn get<L, S>(store: &S, id: &str) -> ListingResult<L>
where
    L: Listing,
    S: ListingStore<L> + ?Sized,
{
    fetch(store, id).await
}

pub async fn create<L, S>(store: &S, draft: L::Draft, actor: &Actor) -> ListingResult<L>
where
    L: Listing,
    S: ListingStore<L> + ?Sized,
{
    authorize(actor.role, Action::ListingWrite)?;
    let listing = L::from_draft(Uuid::new_v4().to_string(), draft, now_micros());
    listing.validate()?;
    if store.title_taken(listing.title(), None).await? {
        return Err(duplicate_title::<L>(listing.title()));
    }
    let created = store.insert(listing).await?;
    record_change::<L>("create");
    tracing::info!(
        kind = %L::KIND,
        id = created.id(),
        subject = %actor.subject,
        "listing created"
    );
    Ok(created)
}

pub async fn update<L, S>(store: &S, id: &str, patch: L::Patch, actor: &Actor) -> ListingResult<L>
where
    L: Listing,
    S: ListingStore<L> + ?Sized,
{
    authorize(actor.role, Action::ListingWrite)?;
    let mut listing: L = fetch(store, id).await?;
    let previous = listing.updated_at();
    listing.apply_patch(patch);
    listing.validate()?;
    if store.title_taken(listing.title(), Some(id)).await? {
        return Err(duplicate_title::<L>(listing.title()));
    }
    listing.set_updated_at(next_updated_at(previous, now_micros()));
    let updated = match store.replace(listing).await {
        Err(StoreError::NotFound(_)) => return Err(not_found::<L>(id)),
        other => other?,
    };
    record_change::<L>("update");
    tracing::info!(kind = %L::KIND, id, subject = %actor.subject, "listing updated");
    Ok(updated)
}

/// Clocks can repeat or step back; an update always moves `updatedAt` forward.
fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous + TimeDelta::microseconds(1))
}

pub async fn delete<L, S>(
    store: &S,
    media: &dyn MediaStore,
    id: &str,
    actor: &Actor,
) -> ListingResult<()>
where
    L: Listing,
    S: ListingStore<L> + ?Sized,
{
    authorize(actor.role, Action::ListingWrite)?;
    let listing: L = fetch(store, id).await?;
    let failures = delete_images(media, listing.images()).await;
    if failures > 0 {
        tracing::warn!(kind = %L::KIND, id, failures, "some listing images were not removed");
    }
    match ListingStore::<L>::delete(store, id).await {
        Err(StoreError::NotFound(_)) => return Err(not_found::<L>(id)),
        other => other?,
    }
    record_change::<L>("delete");
    tracing::info!(kind = %L::KIND, id, subject = %actor.subject, "listing deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::query::{Surface, build_query};
    use super::*;
    use crate::auth::AuthChannel;
    use crate::media::UploadFile;
    use crate::media::fixtures::JPEG;
    use crate::media::memory::InMemoryMediaStore;
    use crate::model::{
        Car, Property, PropertyPatch, PropertyStatus, sample_car_draft, sample_property_draft,
    };
    use crate::store::memory::InMemoryStore;
    use luxe_authz::Role;
    use std::collections::HashMap;

    fn actor(role: Role) -> Actor {
        Actor {
            role,
            subject: "staff-1".to_string(),
            channel: AuthChannel::Bearer,
        }
    }

    fn media() -> InMemoryMediaStore {
        InMemoryMediaStore::new("http://media.test", "tonyluxe")
    }

    #[tokio::test]
    async fn create_assigns_id_and_defaults() {
        let store = InMemoryStore::new();
        let created = create::<Property, _>(&store, sample_property_draft("Seaside Villa"), &actor(Role::Manager))
            .await
            .expect("create");
        assert!(Uuid::parse_str(&created.id).is_ok());
        assert!(!created.featured);
        assert_eq!(created.created_at, created.updated_at);
        let fetched = get::<Property, _>(&store, &created.id).await.expect("get");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn duplicate_title_is_a_conflict() {
        let store = InMemoryStore::new();
        let manager = actor(Role::Manager);
        create::<Property, _>(&store, sample_property_draft("Seaside Villa"), &manager)
            .await
            .expect("first");
        let err = create::<Property, _>(&store, sample_property_draft("Seaside Villa"), &manager)
            .await
            .expect_err("second");
        assert!(matches!(err, ListingError::Conflict(_)));
        let page =
            list::<Property, _>(&store, &build_query::<Property>(&HashMap::new(), Surface::Admin).expect("query"))
                .await
                .expect("list");
        assert_eq!(page.pagination.total, 1);
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_before_insert() {
        let store = InMemoryStore::new();
        let mut draft = sample_property_draft("Short stay");
        draft.property_type = crate::model::PropertyType::ShortLet;
        let err = create::<Property, _>(&store, draft, &actor(Role::Admin))
            .await
            .expect_err("status does not fit short let");
        assert!(matches!(err, ListingError::Validation(_)));
        assert_eq!(
            ListingStore::<Property>::count(&store, &Default::default())
                .await
                .expect("count"),
            0
        );
    }

    #[tokio::test]
    async fn update_merges_and_moves_updated_at_forward() {
        let store = InMemoryStore::new();
        let manager = actor(Role::Manager);
        let created = create::<Property, _>(&store, sample_property_draft("Seaside Villa"), &manager)
            .await
            .expect("create");
        let patch = PropertyPatch {
            price: Some(300_000_000.0),
            status: Some(PropertyStatus::Sold),
            ..Default::default()
        };
        let updated = update::<Property, _>(&store, &created.id, patch, &manager)
            .await
            .expect("update");
        assert_eq!(updated.price, 300_000_000.0);
        assert_eq!(updated.status, PropertyStatus::Sold);
        assert_eq!(updated.title, created.title);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        let fetched = get::<Property, _>(&store, &created.id).await.expect("get");
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn update_title_collision_is_a_conflict() {
        let store = InMemoryStore::new();
        let admin = actor(Role::Admin);
        create::<Car, _>(&store, sample_car_draft("Land Cruiser", 1.0), &admin)
            .await
            .expect("first");
        let second = create::<Car, _>(&store, sample_car_draft("Prado", 2.0), &admin)
            .await
            .expect("second");
        let patch = crate::model::CarPatch {
            title: Some("Land Cruiser".to_string()),
            ..Default::default()
        };
        let err = update::<Car, _>(&store, &second.id, patch, &admin)
            .await
            .expect_err("collision");
        assert!(matches!(err, ListingError::Conflict(_)));

        let keep_own_title = crate::model::CarPatch {
            title: Some("Prado".to_string()),
            ..Default::default()
        };
        update::<Car, _>(&store, &second.id, keep_own_title, &admin)
            .await
            .expect("own title is not a collision");
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = update::<Property, _>(&store, "missing", PropertyPatch::default(), &actor(Role::Admin))
            .await
            .expect_err("missing");
        assert!(matches!(err, ListingError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_document_and_images() {
        let store = InMemoryStore::new();
        let media = media();
        let admin = actor(Role::Admin);
        let mut images = Vec::new();
        for name in ["front.jpg", "pool.jpg"] {
            let file = UploadFile {
                file_name: Some(name.to_string()),
                content_type: Some("image/jpeg".to_string()),
                bytes: JPEG.to_vec(),
            };
            images.push(media.upload(&file, "image/jpeg").await.expect("upload").url);
        }
        let mut draft = sample_property_draft("Seaside Villa");
        draft.images = images;
        let created = create::<Property, _>(&store, draft, &admin)
            .await
            .expect("create");
        assert_eq!(media.asset_count().await, 2);

        delete::<Property, _>(&store, &media, &created.id, &admin)
            .await
            .expect("delete");
        assert_eq!(media.asset_count().await, 0);
        assert!(matches!(
            get::<Property, _>(&store, &created.id).await,
            Err(ListingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_succeeds_when_image_cleanup_fails() {
        let store = InMemoryStore::new();
        let media = media();
        let admin = actor(Role::Admin);
        // The sample image URLs were never uploaded, so every removal fails.
        let created = create::<Property, _>(&store, sample_property_draft("Seaside Villa"), &admin)
            .await
            .expect("create");

        delete::<Property, _>(&store, &media, &created.id, &admin)
            .await
            .expect("delete despite image cleanup failure");
        assert!(matches!(
            get::<Property, _>(&store, &created.id).await,
            Err(ListingError::NotFound(_))
        ));
        assert!(matches!(
            delete::<Property, _>(&store, &media, &created.id, &admin).await,
            Err(ListingError::NotFound(_))
        ));
    }

    #[test]
    fn updated_at_never_repeats() {
        let previous = now_micros();
        assert_eq!(
            next_updated_at(previous, previous),
            previous + TimeDelta::microseconds(1)
        );
        let later = previous + TimeDelta::seconds(5);
        assert_eq!(next_updated_at(previous, later), later);
    }
}
