use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Garrison API",
        version = "0.1.0",
        description = r#"
# Garrison Asset Ledger API

Tracks purchases, inter-base transfers and assignments of assets, and reports
per-base balances either from the live snapshot or reconstructed for a date range.

## Authentication

Requests arrive through a gateway that has already authenticated the caller and
sets three headers:

```
x-garrison-user-id: <user id>
x-garrison-role: admin | commander | logistics
x-garrison-base-id: <home base>
```

## Error Handling

```json
{
  "error": "Unprocessable Entity",
  "message": "Not enough stock at source base",
  "request_id": "0b6f7a1e-...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "dashboard", description = "Balance reporting"),
        (name = "purchases", description = "Stock entering a base"),
        (name = "transfers", description = "Stock moving between bases"),
        (name = "assignments", description = "Stock issued or expended"),
        (name = "audit", description = "Audit trail"),
        (name = "inventory", description = "Snapshot maintenance")
    ),
    paths(
        crate::handlers::dashboard::get_dashboard,
        crate::handlers::purchases::list_purchases,
        crate::handlers::purchases::create_purchase,
        crate::handlers::transfers::list_transfers,
        crate::handlers::transfers::create_transfer,
        crate::handlers::assignments::list_assignments,
        crate::handlers::assignments::create_assignment,
        crate::handlers::logs::list_logs,
        crate::handlers::inventory::reconcile,
        crate::handlers::inventory::rebuild,
    ),
    components(
        schemas(
            crate::ledger::BalanceLine,
            crate::ledger::SnapshotFigures,
            crate::ledger::AssignmentKind,
            crate::handlers::dashboard::DashboardResponse,
            crate::services::purchases::RecordPurchaseRequest,
            crate::services::transfers::RecordTransferRequest,
            crate::services::assignments::RecordAssignmentRequest,
            crate::handlers::purchases::PurchaseRecorded,
            crate::handlers::transfers::TransferRecorded,
            crate::handlers::assignments::AssignmentRecorded,
            crate::services::inventory::ReconcileReport,
            crate::services::inventory::SnapshotDrift,
            crate::services::inventory::RebuildReport,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
