// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use tokio_util::sync::CancellationToken;
use wazo_google::config::{Config, GoogleEndpoints, OAuthFlow};
use wazo_google::db::{CredentialStore, InMemoryCredentialStore};
use wazo_google::models::ExternalAuthRecord;
use wazo_google::routes::create_router;
use wazo_google::services::{
    GoogleOAuthClient, GoogleSource, PendingAuthorizations, TokenLifecycle,
};
use wazo_google::time_utils::now_epoch;
use wazo_google::AppState;
use wiremock::MockServer;

pub const USER_UUID: &str = "a-user-uuid";
pub const AUTH_TOKEN: &str = "a-token";
pub const GOOGLE_TOKEN: &str = "google-token";

/// Test configuration pointing the Google OAuth endpoints at `google`.
#[allow(dead_code)]
pub fn test_config(google: &MockServer, flow: OAuthFlow) -> Config {
    Config {
        oauth_flow: flow,
        google_endpoints: GoogleEndpoints {
            accounts_url: google.uri(),
            oauth2_url: google.uri(),
        },
        confirmation_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

/// Lifecycle over a fresh in-memory store. The store is returned for inspection.
#[allow(dead_code)]
pub fn test_lifecycle(config: &Config) -> (TokenLifecycle, Arc<InMemoryCredentialStore>) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let dyn_store: Arc<dyn CredentialStore> = store.clone();
    let pending = Arc::new(PendingAuthorizations::new(
        CancellationToken::new(),
        config.confirmation_timeout,
    ));

    let lifecycle = TokenLifecycle::new(
        GoogleOAuthClient::new(config.google_endpoints.clone()),
        dyn_store,
        pending,
        &config.oauth_state_key,
    );

    (lifecycle, store)
}

/// Create a test app. Returns the router and the credential store.
#[allow(dead_code)]
pub fn create_test_app(
    config: Config,
    sources: HashMap<String, GoogleSource>,
) -> (axum::Router, Arc<InMemoryCredentialStore>) {
    let (lifecycle, store) = test_lifecycle(&config);

    let state = Arc::new(AppState {
        config,
        lifecycle,
        sources,
    });

    (create_router(state), store)
}

/// Record holding a usable (or expired) grant.
#[allow(dead_code)]
pub fn granted_record(access_token: &str, expires_in: i64) -> ExternalAuthRecord {
    ExternalAuthRecord {
        access_token: Some(access_token.to_string()),
        refresh_token: Some("a-refresh-token".to_string()),
        token_expiration: Some(now_epoch() + expires_in),
        scope: vec!["https://www.googleapis.com/auth/contacts.readonly".to_string()],
        ..ExternalAuthRecord::default()
    }
}

/// Directory source reading its tokens from `auth` and contacts from `contacts`.
#[allow(dead_code)]
pub fn test_source(auth: &MockServer, contacts: &MockServer, extra: serde_json::Value) -> GoogleSource {
    let mut config = serde_json::json!({
        "name": "google",
        "auth": {
            "host": "127.0.0.1",
            "port": auth.address().port(),
            "https": false
        },
        "contacts_url": format!("{}/m8/feeds/contacts/default/full", contacts.uri()),
        "format_columns": {
            "phone": "{numbers[mobile]}",
            "email": "{emails[0]}"
        }
    });

    if let (Some(config), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            config.insert(key.clone(), value.clone());
        }
    }

    GoogleSource::from_value(config).expect("valid source configuration")
}

/// GData feed with three contacts.
#[allow(dead_code)]
pub fn contacts_feed() -> serde_json::Value {
    serde_json::json!({
        "feed": {
            "entry": [
                {
                    "id": {"$t": "http://www.google.com/m8/feeds/contacts/user%40example.com/base/22b9b8d40fdbf0e1"},
                    "title": {"$t": "Mario Bros"},
                    "gd$phoneNumber": [
                        {"rel": "http://schemas.google.com/g/2005#mobile", "$t": "(555) 555-5555"}
                    ],
                    "gd$email": [
                        {"rel": "http://schemas.google.com/g/2005#other", "address": "mario@bros.example.com"}
                    ]
                },
                {
                    "id": {"$t": "http://www.google.com/m8/feeds/contacts/user%40example.com/base/4cd6fa0d8b3bbf4c"},
                    "title": {"$t": "Luigi Bros"},
                    "gd$phoneNumber": [
                        {"rel": "http://schemas.google.com/g/2005#mobile", "$t": "+1 555-555-4567"},
                        {"label": "Mushroom land land-line", "$t": "(555) 555-2222"}
                    ],
                    "gd$email": [
                        {"rel": "http://schemas.google.com/g/2005#other", "address": "Luigi@bros.example.com"}
                    ]
                },
                {
                    "id": {"$t": "http://www.google.com/m8/feeds/contacts/user%40example.com/base/7e1f0c2d9a8b6c5d"},
                    "title": {"$t": "Princess Peach"},
                    "gd$email": [
                        {"label": "Castle", "address": "peach@castle.example.com"}
                    ]
                }
            ]
        }
    })
}

/// Request with the directory request-context headers.
#[allow(dead_code)]
pub fn context_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Auth-Token", AUTH_TOKEN)
        .header("Wazo-User-Uuid", USER_UUID)
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
