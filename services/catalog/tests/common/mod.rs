#![allow(dead_code)]

use axum::body::Body;
use catalog::app::{AppState, HttpSettings, build_router};
use catalog::auth::{
    Authenticator, SessionKeys, SessionSubject, StaffDirectory, mint_session_token,
};
use catalog::config::SessionConfig;
use catalog::media::MediaStore;
use catalog::media::memory::InMemoryMediaStore;
use catalog::store::CatalogStore;
use catalog::store::memory::InMemoryStore;
use luxe_authz::Role;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub const SECRET: &str = "integration-test-session-secret";
pub const COOKIE: &str = "luxe.session-token";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const MANAGER_PASSWORD: &str = "manager-password";

/// `(admin, manager)` bcrypt hashes at the minimum cost, computed once.
fn password_hashes() -> &'static (String, String) {
    static HASHES: OnceLock<(String, String)> = OnceLock::new();
    HASHES.get_or_init(|| {
        (
            bcrypt::hash(ADMIN_PASSWORD, 4).expect("hash"),
            bcrypt::hash(MANAGER_PASSWORD, 4).expect("hash"),
        )
    })
}

pub type App = axum::routing::RouterIntoService<Body, ()>;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn session_config() -> SessionConfig {
    SessionConfig {
        secret: SECRET.to_string(),
        issuer: "luxe-identity".to_string(),
        audience: "luxe-catalog".to_string(),
        cookie_name: COOKIE.to_string(),
        leeway_secs: 0,
        ttl_secs: 3600,
        admin_username: "admin".to_string(),
        admin_password_hash: Some(password_hashes().0.clone()),
        manager_username: "manager".to_string(),
        manager_password_hash: Some(password_hashes().1.clone()),
    }
}

pub fn token(role: Role) -> String {
    mint_session_token(
        &SessionKeys::from_config(&session_config()),
        SessionSubject {
            sub: format!("{}-1", role.as_str()),
            email: Some(format!("{}@luxe.test", role.as_str())),
            name: None,
            role,
        },
        Duration::from_secs(600),
    )
    .expect("mint")
}

pub fn bearer(role: Role) -> String {
    format!("Bearer {}", token(role))
}

pub struct TestApp {
    pub app: App,
    pub local_media: Arc<InMemoryMediaStore>,
}

pub fn state(
    store: Arc<dyn CatalogStore>,
    media: Arc<dyn MediaStore>,
    local_media: Option<Arc<InMemoryMediaStore>>,
    dev_bypass: bool,
) -> AppState {
    AppState {
        store,
        media,
        local_media,
        auth: Arc::new(
            Authenticator::new(
                SessionKeys::from_config(&session_config()),
                COOKIE,
                dev_bypass,
            )
            .with_staff(StaffDirectory::from_config(&session_config())),
        ),
        max_upload_bytes: 1024,
        http: HttpSettings::default(),
    }
}

/// In-memory store and media backend, no dev bypass.
pub fn test_app() -> TestApp {
    let local_media = Arc::new(InMemoryMediaStore::new(
        "http://localhost:3000/media",
        "tonyluxe",
    ));
    let state = state(
        Arc::new(InMemoryStore::new()),
        local_media.clone(),
        Some(local_media.clone()),
        false,
    );
    TestApp {
        app: build_router(state).into_service(),
        local_media,
    }
}

pub fn property_body(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "Ocean-view home with private beach access",
        "price": 250000000,
        "location": "Lekki, Lagos",
        "bedrooms": 4,
        "bathrooms": 5,
        "squareFootage": 3200,
        "propertyType": "Villa",
        "status": "For Sale",
        "images": ["https://res.cloudinary.com/demo/image/upload/v1/tonyluxe/seaside.jpg"]
    })
}

pub fn car_body(title: &str, price: u64) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "Single owner, full service history",
        "price": price,
        "location": "Abuja",
        "make": "Toyota",
        "model": "Land Cruiser",
        "year": 2021,
        "mileage": 42000,
        "fuelType": "Petrol",
        "transmission": "Automatic",
        "color": "Black",
        "status": "For Sale",
        "images": ["https://res.cloudinary.com/demo/image/upload/v1/tonyluxe/cruiser.jpg"]
    })
}
