//! Starlog Server
//!
//! CRUD HTTP API for a reference catalog of people and planets, with a
//! per-user favorites list. Backed by SQLite (embedded), so a single
//! binary and a data directory are the whole deployment.

mod error;
mod extractors;
mod handlers;
mod services;
mod storage;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use services::AuthService;
use storage::Database;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub auth_service: Arc<AuthService>,
}

#[tokio::main]
async fn main() {
    // Log crashes with their location before the process dies
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Starlog Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let config = load_config()
        .await
        .context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, db={}",
        config.bind_address, config.database_path
    );

    let db = Arc::new(
        Database::new(&config.database_path)
            .await
            .context("Failed to initialize database")?,
    );
    let auth_service = Arc::new(AuthService::new(db.clone(), config.jwt_secret.clone()));

    let state = AppState { db, auth_service };
    let app = router(state);

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/people",
            get(handlers::people::list).post(handlers::people::create),
        )
        .route(
            "/people/:id",
            get(handlers::people::get)
                .put(handlers::people::update)
                .delete(handlers::people::delete),
        )
        .route(
            "/planets",
            get(handlers::planets::list).post(handlers::planets::create),
        )
        .route(
            "/planets/:id",
            get(handlers::planets::get)
                .put(handlers::planets::update)
                .delete(handlers::planets::delete),
        )
        .route("/users", get(handlers::users::list))
        .route("/users/favorites", get(handlers::favorites::list))
        .route(
            "/favorite/:kind/:id",
            post(handlers::favorites::add).delete(handlers::favorites::remove),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Clone)]
struct Config {
    bind_address: String,
    database_path: String,
    jwt_secret: String,
}

async fn load_config() -> Result<Config> {
    let data_dir = std::env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"));

    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    // A single connection string is the whole configuration surface; when
    // unset, an embedded file-backed store under the data directory is used.
    let database_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| {
        let path = data_dir.join("starlog.db");
        path.to_string_lossy().to_string()
    });

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        warn!("JWT_SECRET not set, using default (insecure for production)");
        "change-me-in-production".to_string()
    });

    Ok(Config {
        bind_address,
        database_path,
        jwt_secret,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_app() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Arc::new(Database::new(path.to_str().unwrap()).await.unwrap());
        let auth_service = Arc::new(AuthService::new(db.clone(), "test-secret".to_string()));
        (router(AppState { db, auth_service }), dir)
    }

    async fn request(
        app: &Router,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(app: &Router, email: &str) -> String {
        let (status, body) = request(
            app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "email": email, "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn person_lifecycle() {
        let (app, _dir) = test_app().await;

        let (status, body) = request(
            &app,
            Method::POST,
            "/people",
            None,
            Some(json!({ "name": "Luke", "species": "Human", "homeworld": "Tatooine" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "message": "Person created", "id": 1 }));

        let (status, body) = request(&app, Method::GET, "/people/1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "id": 1, "name": "Luke", "species": "Human", "homeworld": "Tatooine" })
        );

        let (status, body) = request(&app, Method::GET, "/people", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = request(&app, Method::DELETE, "/people/1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Person deleted" }));

        let (status, body) = request(&app, Method::GET, "/people/1", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Person not found" }));

        // Repeat delete is a 404, not a silent success
        let (status, _) = request(&app, Method::DELETE, "/people/1", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn person_create_requires_all_fields() {
        let (app, _dir) = test_app().await;

        for payload in [
            None,
            Some(json!({})),
            Some(json!({ "name": "Luke" })),
            Some(json!({ "name": "Luke", "species": "Human" })),
            Some(json!({ "name": null, "species": "Human", "homeworld": "Tatooine" })),
        ] {
            let (status, body) = request(&app, Method::POST, "/people", None, payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "error": "Missing data" }));
        }

        assert!(request(&app, Method::GET, "/people", None, None)
            .await
            .1
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn person_update_is_partial() {
        let (app, _dir) = test_app().await;

        request(
            &app,
            Method::POST,
            "/people",
            None,
            Some(json!({ "name": "Anakin", "species": "Human", "homeworld": "Tatooine" })),
        )
        .await;

        let (status, body) = request(
            &app,
            Method::PUT,
            "/people/1",
            None,
            Some(json!({ "name": "Vader" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Person updated" }));

        let (_, body) = request(&app, Method::GET, "/people/1", None, None).await;
        assert_eq!(
            body,
            json!({ "id": 1, "name": "Vader", "species": "Human", "homeworld": "Tatooine" })
        );

        // Explicit null keeps the stored value, same as an omitted key
        let (status, _) = request(
            &app,
            Method::PUT,
            "/people/1",
            None,
            Some(json!({ "name": null, "species": "Cyborg" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = request(&app, Method::GET, "/people/1", None, None).await;
        assert_eq!(body["name"], "Vader");
        assert_eq!(body["species"], "Cyborg");

        // A non-empty object with no known fields is an accepted no-op
        let (status, _) = request(
            &app,
            Method::PUT,
            "/people/1",
            None,
            Some(json!({ "midichlorians": 27000 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // An empty object or missing body is not
        let (status, _) =
            request(&app, Method::PUT, "/people/1", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = request(&app, Method::PUT, "/people/1", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Absent target wins over a bad payload
        let (status, body) =
            request(&app, Method::PUT, "/people/99", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Person not found" }));
    }

    #[tokio::test]
    async fn planet_lifecycle() {
        let (app, _dir) = test_app().await;

        let (status, body) = request(
            &app,
            Method::POST,
            "/planets",
            None,
            Some(json!({ "name": "Dagobah", "climate": "murky", "terrain": "swamp" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "message": "Planet created", "id": 1 }));

        let (status, body) = request(
            &app,
            Method::PUT,
            "/planets/1",
            None,
            Some(json!({ "terrain": "swamp, jungle" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Planet updated" }));

        let (_, body) = request(&app, Method::GET, "/planets/1", None, None).await;
        assert_eq!(
            body,
            json!({ "id": 1, "name": "Dagobah", "climate": "murky", "terrain": "swamp, jungle" })
        );

        let (status, _) = request(
            &app,
            Method::POST,
            "/planets",
            None,
            Some(json!({ "name": "Endor" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = request(&app, Method::DELETE, "/planets/1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Planet deleted" }));
        let (status, _) = request(&app, Method::GET, "/planets/1", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn user_listing_never_exposes_credentials() {
        let (app, _dir) = test_app().await;

        register(&app, "luke@rebellion.org").await;
        register(&app, "leia@rebellion.org").await;

        let (status, body) = request(&app, Method::GET, "/users", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 2);
        for user in users {
            let fields = user.as_object().unwrap();
            assert_eq!(fields.len(), 2);
            assert!(fields.contains_key("id"));
            assert!(fields.contains_key("email"));
        }
        assert!(!body.to_string().contains("password"));
    }

    #[tokio::test]
    async fn favorite_lifecycle() {
        let (app, _dir) = test_app().await;
        let token = register(&app, "luke@rebellion.org").await;

        request(
            &app,
            Method::POST,
            "/people",
            None,
            Some(json!({ "name": "Luke", "species": "Human", "homeworld": "Tatooine" })),
        )
        .await;

        let (status, body) = request(
            &app,
            Method::POST,
            "/favorite/people/1",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "message": "Person Luke added to favorites" }));

        let (status, body) = request(
            &app,
            Method::POST,
            "/favorite/people/1",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Person already in favorites" }));

        let (status, body) =
            request(&app, Method::GET, "/users/favorites", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{ "type": "people", "id": 1, "name": "Luke" }]));

        let (status, body) = request(
            &app,
            Method::DELETE,
            "/favorite/people/1",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Favorite person removed" }));

        let (status, body) = request(
            &app,
            Method::DELETE,
            "/favorite/people/1",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Favorite person not found" }));

        // Delete then re-add starts the cycle over
        let (status, _) = request(
            &app,
            Method::POST,
            "/favorite/people/1",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn favorites_drop_dangling_targets() {
        let (app, _dir) = test_app().await;
        let token = register(&app, "han@falcon.io").await;

        request(
            &app,
            Method::POST,
            "/planets",
            None,
            Some(json!({ "name": "Alderaan", "climate": "temperate", "terrain": "grasslands" })),
        )
        .await;
        request(
            &app,
            Method::POST,
            "/people",
            None,
            Some(json!({ "name": "Leia", "species": "Human", "homeworld": "Alderaan" })),
        )
        .await;

        request(&app, Method::POST, "/favorite/planet/1", Some(&token), None).await;
        request(&app, Method::POST, "/favorite/people/1", Some(&token), None).await;

        // Deleting the planet does not cascade into favorites...
        let (status, _) = request(&app, Method::DELETE, "/planets/1", None, None).await;
        assert_eq!(status, StatusCode::OK);

        // ...the listing just drops the dangling entry
        let (status, body) =
            request(&app, Method::GET, "/users/favorites", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{ "type": "people", "id": 1, "name": "Leia" }]));
    }

    #[tokio::test]
    async fn favorites_require_a_verified_identity() {
        let (app, _dir) = test_app().await;

        let (status, _) = request(&app, Method::POST, "/favorite/planet/1", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = request(
            &app,
            Method::GET,
            "/users/favorites",
            Some("not-a-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");
    }

    #[tokio::test]
    async fn favoriting_a_missing_or_unknown_target_is_not_found() {
        let (app, _dir) = test_app().await;
        let token = register(&app, "obiwan@jedi.org").await;

        let (status, body) = request(
            &app,
            Method::POST,
            "/favorite/planet/99",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Planet not found" }));

        let (status, _) = request(
            &app,
            Method::POST,
            "/favorite/starship/1",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_issues_usable_tokens() {
        let (app, _dir) = test_app().await;
        register(&app, "lando@cloud.city").await;

        let (status, body) = request(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "lando@cloud.city", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["access_token"].as_str().unwrap().to_string();

        let (status, _) =
            request(&app, Method::GET, "/users/favorites", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = request(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "lando@cloud.city", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _dir) = test_app().await;

        let (status, body) = request(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
