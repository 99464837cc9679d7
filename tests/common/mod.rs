#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use garrison_api::{
    config::AppConfig,
    db,
    entities::{assignment, inventory_snapshot, purchase, transfer},
    ledger::SnapshotFigures,
    AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const ALPHA: &str = "base-alpha";
pub const BRAVO: &str = "base-bravo";

/// Identity a request is sent as; turned into the gateway headers.
#[derive(Debug, Clone, Copy)]
pub struct Caller<'a> {
    pub user_id: &'a str,
    pub role: &'a str,
    pub base_id: &'a str,
}

impl<'a> Caller<'a> {
    pub const fn new(user_id: &'a str, role: &'a str, base_id: &'a str) -> Self {
        Self {
            user_id,
            role,
            base_id,
        }
    }

    pub const fn admin(base_id: &'a str) -> Self {
        Self::new("u-admin", "admin", base_id)
    }

    pub const fn commander(base_id: &'a str) -> Self {
        Self::new("u-commander", "commander", base_id)
    }

    pub const fn logistics(base_id: &'a str) -> Self {
        Self::new("u-logistics", "logistics", base_id)
    }
}

/// Helper harness for spinning up the full router backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.cors_allow_any_origin = true;
        // every pooled in-memory connection would be its own database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = garrison_api::build_router(state.clone()).expect("router builds");

        Self { router, state }
    }

    pub fn db(&self) -> &db::DbPool {
        self.state.db.as_ref()
    }

    /// Send a request as `caller`, or without identity headers when `None`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        caller: Option<Caller<'_>>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(caller) = caller {
            builder = builder
                .header("x-garrison-user-id", caller.user_id)
                .header("x-garrison-role", caller.role)
                .header("x-garrison-base-id", caller.base_id);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str, caller: Caller<'_>) -> Response {
        self.request(Method::GET, uri, None, Some(caller)).await
    }

    pub async fn post(&self, uri: &str, body: Value, caller: Caller<'_>) -> Response {
        self.request(Method::POST, uri, Some(body), Some(caller)).await
    }

    /// Inserts a snapshot row directly, bypassing the write services.
    pub async fn seed_snapshot(
        &self,
        base_id: &str,
        asset_type: &str,
        figures: SnapshotFigures,
    ) -> inventory_snapshot::Model {
        let now = Utc::now();
        inventory_snapshot::ActiveModel {
            id: Set(Uuid::new_v4()),
            base_id: Set(base_id.to_string()),
            asset_type: Set(asset_type.to_string()),
            opening_balance: Set(figures.opening_balance),
            purchases: Set(figures.purchases),
            transfer_in: Set(figures.transfer_in),
            transfer_out: Set(figures.transfer_out),
            assigned: Set(figures.assigned),
            expended: Set(figures.expended),
            closing_balance: Set(figures.closing_balance),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db())
        .await
        .expect("seed snapshot")
    }

    pub async fn seed_purchase(
        &self,
        base_id: &str,
        asset_type: &str,
        quantity: Option<i64>,
        date: DateTime<Utc>,
    ) {
        purchase::ActiveModel {
            id: Set(Uuid::new_v4()),
            base_id: Set(base_id.to_string()),
            asset_type: Set(asset_type.to_string()),
            quantity: Set(quantity),
            recorded_by: Set("seed".to_string()),
            date: Set(date),
        }
        .insert(self.db())
        .await
        .expect("seed purchase");
    }

    pub async fn seed_transfer(
        &self,
        from_base_id: &str,
        to_base_id: &str,
        asset_type: &str,
        quantity: i64,
        date: DateTime<Utc>,
    ) {
        transfer::ActiveModel {
            id: Set(Uuid::new_v4()),
            from_base_id: Set(from_base_id.to_string()),
            to_base_id: Set(to_base_id.to_string()),
            asset_type: Set(asset_type.to_string()),
            quantity: Set(Some(quantity)),
            recorded_by: Set("seed".to_string()),
            date: Set(date),
        }
        .insert(self.db())
        .await
        .expect("seed transfer");
    }

    pub async fn seed_assignment(
        &self,
        base_id: &str,
        asset_type: &str,
        quantity: i64,
        kind: &str,
        date: DateTime<Utc>,
    ) {
        assignment::ActiveModel {
            id: Set(Uuid::new_v4()),
            base_id: Set(base_id.to_string()),
            asset_type: Set(asset_type.to_string()),
            quantity: Set(Some(quantity)),
            assigned_to: Set("1st Squad".to_string()),
            kind: Set(kind.to_string()),
            recorded_by: Set("seed".to_string()),
            date: Set(date),
        }
        .insert(self.db())
        .await
        .expect("seed assignment");
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn closing_only(closing: i64) -> SnapshotFigures {
    SnapshotFigures {
        opening_balance: closing,
        closing_balance: closing,
        ..Default::default()
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Finds the dashboard row for `asset_type`.
pub fn line<'v>(body: &'v Value, asset_type: &str) -> &'v Value {
    body["dashboard"]
        .as_array()
        .expect("dashboard array")
        .iter()
        .find(|l| l["assetType"] == asset_type)
        .unwrap_or_else(|| panic!("no dashboard line for {asset_type}"))
}
