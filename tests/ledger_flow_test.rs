mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use garrison_api::auth::{Role, Session};
use garrison_api::db::DatabaseAccess;
use garrison_api::errors::ServiceError;
use garrison_api::ledger::{LedgerTransaction, SnapshotFigures, TransactionCategory};
use garrison_api::repositories::{LedgerRepository, LedgerScope, TransactionStore};
use garrison_api::services::inventory::InventoryService;
use garrison_api::services::purchases::{PurchaseService, RecordPurchaseRequest};
use rstest::rstest;
use serde_json::json;

use common::{at, line, response_json, Caller, TestApp, ALPHA, BRAVO};

async fn purchase(app: &TestApp, caller: Caller<'_>, asset_type: &str, quantity: i64) -> StatusCode {
    app.post(
        "/api/v1/purchases",
        json!({ "assetType": asset_type, "quantity": quantity }),
        caller,
    )
    .await
    .status()
}

#[tokio::test]
async fn purchase_transfer_and_expend_flow_through_to_dashboard() {
    let app = TestApp::new().await;
    let logistics = Caller::logistics(ALPHA);

    let response = app
        .post(
            "/api/v1/purchases",
            json!({ "assetType": "Rifle", "quantity": 20 }),
            logistics,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Purchase recorded successfully");
    assert_eq!(body["purchase"]["assetType"], "Rifle");
    assert_eq!(body["purchase"]["baseId"], ALPHA);
    assert_eq!(body["purchase"]["quantity"], 20);

    let response = app
        .post(
            "/api/v1/transfers",
            json!({ "toBaseId": BRAVO, "assetType": "Rifle", "quantity": 5 }),
            logistics,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Transfer successful");
    assert_eq!(body["transfer"]["fromBaseId"], ALPHA);
    assert_eq!(body["transfer"]["toBaseId"], BRAVO);

    let response = app
        .post(
            "/api/v1/assignments",
            json!({
                "assetType": "Rifle",
                "quantity": 3,
                "assignedTo": "2nd Platoon",
                "type": "expended"
            }),
            logistics,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Assignment recorded successfully");
    assert_eq!(body["assignment"]["type"], "expended");

    // current snapshot
    let body = response_json(app.get("/api/v1/dashboard", Caller::commander(ALPHA)).await).await;
    let rifle = line(&body, "Rifle");
    assert_eq!(rifle["openingBalance"], 0);
    assert_eq!(rifle["purchases"], 20);
    assert_eq!(rifle["transferOut"], 5);
    assert_eq!(rifle["expended"], 3);
    assert_eq!(rifle["closingBalance"], 12);
    assert_eq!(rifle["netMovement"], 15);

    let body = response_json(app.get("/api/v1/dashboard", Caller::commander(BRAVO)).await).await;
    let rifle = line(&body, "Rifle");
    assert_eq!(rifle["transferIn"], 5);
    assert_eq!(rifle["closingBalance"], 5);

    // reconstructed for today: everything happened inside the range
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let uri = format!("/api/v1/dashboard?startDate={today}&endDate={today}");
    let body = response_json(app.get(&uri, Caller::admin(ALPHA)).await).await;
    let rifle = line(&body, "Rifle");
    assert_eq!(rifle["openingBalance"], 0);
    assert_eq!(rifle["closingBalance"], 12);
    assert_eq!(rifle["netMovement"], 12);
    assert_eq!(rifle["expended"], 3);

    // the log and snapshots agree
    let body = response_json(
        app.get("/api/v1/inventory/reconcile", Caller::admin(ALPHA))
            .await,
    )
    .await;
    assert_eq!(body["baseId"], ALPHA);
    assert!(body["snapshots"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["inSync"] == true));
}

#[tokio::test]
async fn transfer_beyond_stock_is_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let logistics = Caller::logistics(ALPHA);
    assert_eq!(purchase(&app, logistics, "Rifle", 4).await, StatusCode::CREATED);

    let response = app
        .post(
            "/api/v1/transfers",
            json!({ "toBaseId": BRAVO, "assetType": "Rifle", "quantity": 5 }),
            logistics,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Not enough stock at source base"));

    let transfers = response_json(app.get("/api/v1/transfers", logistics).await).await;
    assert_eq!(transfers.as_array().unwrap().len(), 0);

    let body = response_json(app.get("/api/v1/dashboard", logistics).await).await;
    assert_eq!(line(&body, "Rifle")["closingBalance"], 4);
    assert_eq!(line(&body, "Rifle")["transferOut"], 0);

    let body = response_json(app.get("/api/v1/dashboard", Caller::admin(BRAVO)).await).await;
    assert!(body["dashboard"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn assigning_unknown_stock_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .post(
            "/api/v1/assignments",
            json!({ "assetType": "Drone", "quantity": 1, "assignedTo": "Recon" }),
            Caller::logistics(ALPHA),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn transfer_to_own_base_is_a_bad_request() {
    let app = TestApp::new().await;
    let response = app
        .post(
            "/api/v1/transfers",
            json!({ "toBaseId": ALPHA, "assetType": "Rifle", "quantity": 1 }),
            Caller::logistics(ALPHA),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[case::missing_quantity(json!({ "toBaseId": "base-bravo", "assetType": "Rifle" }), "Missing fields")]
#[case::zero_quantity(json!({ "toBaseId": "base-bravo", "assetType": "Rifle", "quantity": 0 }), "Invalid quantity")]
#[case::negative_quantity(json!({ "toBaseId": "base-bravo", "assetType": "Rifle", "quantity": -2 }), "Invalid quantity")]
#[case::oversized_quantity(json!({ "toBaseId": "base-bravo", "assetType": "Rifle", "quantity": 9_000_000_000_000_000_000i64 }), "Invalid quantity")]
#[case::missing_destination(json!({ "assetType": "Rifle", "quantity": 2 }), "Missing fields")]
#[case::blank_asset(json!({ "toBaseId": "base-bravo", "assetType": "  ", "quantity": 2 }), "Missing fields")]
#[tokio::test]
async fn malformed_transfers_are_bad_requests(
    #[case] payload: serde_json::Value,
    #[case] reason: &str,
) {
    let app = TestApp::new().await;
    let response = app
        .post("/api/v1/transfers", payload, Caller::logistics(ALPHA))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["message"], format!("Bad request: {}", reason));
}

#[tokio::test]
async fn oversized_purchase_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .post(
            "/api/v1/purchases",
            json!({ "assetType": "Rifle", "quantity": i64::MAX }),
            Caller::logistics(ALPHA),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let dashboard = response_json(app.get("/api/v1/dashboard", Caller::logistics(ALPHA)).await).await;
    assert_eq!(dashboard["dashboard"].as_array().unwrap().len(), 0);
}

#[rstest]
#[case::commander_cannot_purchase(Method::POST, "/api/v1/purchases", "commander", StatusCode::FORBIDDEN)]
#[case::commander_cannot_transfer(Method::POST, "/api/v1/transfers", "commander", StatusCode::FORBIDDEN)]
#[case::commander_reads_purchases(Method::GET, "/api/v1/purchases", "commander", StatusCode::OK)]
#[case::logistics_reads_assignments(Method::GET, "/api/v1/assignments", "logistics", StatusCode::OK)]
#[case::logistics_cannot_read_logs(Method::GET, "/api/v1/logs", "logistics", StatusCode::FORBIDDEN)]
#[case::commander_cannot_reconcile(Method::GET, "/api/v1/inventory/reconcile", "commander", StatusCode::FORBIDDEN)]
#[case::admin_reads_logs(Method::GET, "/api/v1/logs", "admin", StatusCode::OK)]
#[tokio::test]
async fn routes_are_guarded_by_role(
    #[case] method: Method,
    #[case] uri: &str,
    #[case] role: &str,
    #[case] expected: StatusCode,
) {
    let app = TestApp::new().await;
    let body = (method == Method::POST).then(|| json!({ "assetType": "Rifle", "quantity": 1 }));
    let response = app
        .request(method, uri, body, Some(Caller::new("u-7", role, ALPHA)))
        .await;
    assert_eq!(response.status(), expected);
}

#[tokio::test]
async fn lists_are_scoped_to_the_callers_base() {
    let app = TestApp::new().await;
    assert_eq!(purchase(&app, Caller::logistics(ALPHA), "Rifle", 10).await, StatusCode::CREATED);
    assert_eq!(purchase(&app, Caller::logistics(BRAVO), "Ammo", 100).await, StatusCode::CREATED);

    let alpha = response_json(app.get("/api/v1/purchases", Caller::commander(ALPHA)).await).await;
    let alpha = alpha.as_array().unwrap();
    assert_eq!(alpha.len(), 1);
    assert_eq!(alpha[0]["assetType"], "Rifle");

    let all = response_json(app.get("/api/v1/purchases", Caller::admin(ALPHA)).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn writes_leave_an_audit_trail() {
    let app = TestApp::new().await;
    let logistics = Caller::logistics(ALPHA);
    assert_eq!(purchase(&app, logistics, "Rifle", 10).await, StatusCode::CREATED);
    let response = app
        .post(
            "/api/v1/assignments",
            json!({ "assetType": "Rifle", "quantity": 2, "assignedTo": "Alpha Company" }),
            logistics,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let logs = response_json(app.get("/api/v1/logs", Caller::admin(ALPHA)).await).await;
    let actions: Vec<&str> = logs
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions.len(), 2);
    assert!(actions.contains(&"PURCHASE_CREATED"));
    assert!(actions.contains(&"ASSET_ASSIGNED"));
    assert!(logs[0]["userId"] == "u-logistics");

    let limited = response_json(app.get("/api/v1/logs?limit=1", Caller::admin(ALPHA)).await).await;
    assert_eq!(limited.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rebuild_repairs_a_drifted_snapshot() {
    let app = TestApp::new().await;
    // stored counters claim 10 purchased; the log only has 7
    app.seed_snapshot(
        ALPHA,
        "Rifle",
        SnapshotFigures {
            purchases: 10,
            closing_balance: 10,
            ..Default::default()
        },
    )
    .await;
    app.seed_purchase(ALPHA, "Rifle", Some(7), at(2024, 3, 5, 9)).await;

    let report = response_json(
        app.get("/api/v1/inventory/reconcile", Caller::admin(ALPHA))
            .await,
    )
    .await;
    let drift = &report["snapshots"][0];
    assert_eq!(drift["inSync"], false);
    assert_eq!(drift["stored"]["closingBalance"], 10);
    assert_eq!(drift["projected"]["closingBalance"], 7);

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory/rebuild",
            None,
            Some(Caller::admin(ALPHA)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rebuilt = response_json(response).await;
    assert_eq!(rebuilt["rebuilt"], json!(["Rifle"]));

    let body = response_json(app.get("/api/v1/dashboard", Caller::admin(ALPHA)).await).await;
    assert_eq!(line(&body, "Rifle")["closingBalance"], 7);
    assert_eq!(line(&body, "Rifle")["purchases"], 7);

    let logs = response_json(app.get("/api/v1/logs", Caller::admin(ALPHA)).await).await;
    assert_eq!(logs[0]["action"], "SNAPSHOT_REBUILT");
}

/// Ledger reads that let one purchase commit right after the purchases
/// log has been read, i.e. while a rebuild is between its read and write.
struct PurchaseLandsMidRead {
    inner: LedgerRepository,
    purchases: PurchaseService,
    session: Session,
    fired: AtomicBool,
}

#[async_trait]
impl TransactionStore for PurchaseLandsMidRead {
    async fn find_transactions(
        &self,
        category: TransactionCategory,
        scope: &LedgerScope,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<LedgerTransaction>, ServiceError> {
        let rows = self.inner.find_transactions(category, scope, since).await?;
        if category == TransactionCategory::Purchases && !self.fired.swap(true, Ordering::SeqCst) {
            self.purchases
                .record(
                    &self.session,
                    RecordPurchaseRequest {
                        asset_type: Some("Rifle".to_string()),
                        quantity: Some(5),
                    },
                )
                .await?;
        }
        Ok(rows)
    }
}

#[tokio::test]
async fn rebuild_keeps_a_purchase_committed_while_it_runs() {
    let app = TestApp::new().await;
    app.seed_snapshot(
        ALPHA,
        "Rifle",
        SnapshotFigures {
            purchases: 10,
            closing_balance: 10,
            ..Default::default()
        },
    )
    .await;
    app.seed_purchase(ALPHA, "Rifle", Some(7), at(2024, 3, 5, 9)).await;

    let db = DatabaseAccess::new(app.state.db.clone());
    let repository = Arc::new(LedgerRepository::new(app.state.db.clone()));
    let racing = Arc::new(PurchaseLandsMidRead {
        inner: LedgerRepository::new(app.state.db.clone()),
        purchases: PurchaseService::new(db.clone()),
        session: Session::new("u-logistics", Role::Logistics, ALPHA),
        fired: AtomicBool::new(false),
    });
    let inventory = InventoryService::new(db.clone(), repository.clone(), racing);

    let admin = Session::new("u-admin", Role::Admin, ALPHA);
    let report = inventory.rebuild(&admin, ALPHA).await.unwrap();
    assert_eq!(report.rebuilt, vec!["Rifle".to_string()]);

    let check = InventoryService::new(db, repository.clone(), repository);
    let reconciled = check.reconcile(ALPHA).await.unwrap();
    let drift = &reconciled.snapshots[0];
    assert!(drift.in_sync, "snapshot {:?} vs log {:?}", drift.stored, drift.projected);
    assert_eq!(drift.stored.purchases, 12);
    assert_eq!(drift.stored.closing_balance, 12);
}

#[tokio::test]
async fn first_purchases_of_a_new_asset_share_one_snapshot() {
    let app = TestApp::new().await;
    let (first, second) = tokio::join!(
        purchase(&app, Caller::logistics(ALPHA), "Drone", 3),
        purchase(&app, Caller::logistics(ALPHA), "Drone", 4),
    );
    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CREATED);

    let body = response_json(app.get("/api/v1/dashboard", Caller::logistics(ALPHA)).await).await;
    assert_eq!(body["dashboard"].as_array().unwrap().len(), 1);
    assert_eq!(line(&body, "Drone")["closingBalance"], 7);
}

#[tokio::test]
async fn health_and_request_ids() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = app.request(Method::GET, "/health/ready", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "up");
}
