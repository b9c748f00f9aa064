use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use api_types::{
    MoneyCents,
    budget::Budget,
    transaction::{NewTransaction, TransactionKind},
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{TimeZone, Utc};
use engine::{AuthEvent, AuthService, FinanceStore, RemoteError, RemoteService};
use remote::SupabaseClient;
use serde_json::{Value, json};
use uuid::Uuid;

const API_KEY: &str = "anon-key";
const TOKEN: &str = "token-abc";
const USER_ID: &str = "1d0f4a54-2b1e-4a0f-8a6b-5a9d3c2e1f00";
const NEW_ROW_ID: &str = "9b2e7c10-4d3a-4b8e-a1f2-7c6d5e4f3a21";

#[derive(Debug, Clone)]
struct Seen {
    route: String,
    query: HashMap<String, String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
    rows: Arc<Mutex<Vec<Value>>>,
}

impl Backend {
    fn record(&self, route: &str, query: HashMap<String, String>, body: Option<Value>) {
        self.seen.lock().unwrap().push(Seen {
            route: route.to_string(),
            query,
            body,
        });
    }

    fn last(&self, route: &str) -> Seen {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|seen| seen.route == route)
            .cloned()
            .unwrap()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    let api_key = headers.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let expected = format!("Bearer {TOKEN}");
    api_key == Some(API_KEY) && bearer == Some(expected.as_str())
}

fn jwt_error() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response()
}

async fn token(
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if query.get("grant_type").map(String::as_str) != Some("password") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if body["password"] != "secret" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })),
        )
            .into_response();
    }
    Json(json!({
        "access_token": TOKEN,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-xyz",
        "user": { "id": USER_ID, "email": body["email"] }
    }))
    .into_response()
}

async fn user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return jwt_error();
    }
    Json(json!({ "id": USER_ID, "email": "alice@example.com", "role": "authenticated" }))
        .into_response()
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn list_transactions(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return jwt_error();
    }
    backend.record("GET transactions", query, None);
    Json(Value::Array(backend.rows.lock().unwrap().clone())).into_response()
}

async fn insert_transaction(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return jwt_error();
    }
    let wants_row = headers.get("prefer").and_then(|v| v.to_str().ok())
        == Some("return=representation");
    let single = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok())
        == Some("application/vnd.pgrst.object+json");
    if !wants_row || !single {
        return StatusCode::NOT_ACCEPTABLE.into_response();
    }
    backend.record("POST transactions", HashMap::new(), Some(body.clone()));
    body["id"] = json!(NEW_ROW_ID);
    body["created_at"] = json!("2024-03-05T08:00:00+00:00");
    backend.rows.lock().unwrap().push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn delete_transaction(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return jwt_error();
    }
    if let Some(id) = query.get("id").and_then(|v| v.strip_prefix("eq.")) {
        backend.rows.lock().unwrap().retain(|row| row["id"] != id);
    }
    backend.record("DELETE transactions", query, None);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_budgets(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return jwt_error();
    }
    backend.record("GET budgets", query, None);
    Json(json!([{
        "id": "5c3a7f7e-2b8d-4f0e-9a41-3e2d1c0b9a87",
        "category": "Food",
        "limit": 5000,
        "spent": 1250.5,
        "month": "2024-03-01",
        "user_id": USER_ID
    }]))
    .into_response()
}

async fn update_budget(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return jwt_error();
    }
    if query.get("category").map(String::as_str) == Some("eq.Locked") {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "code": "42501",
                "details": null,
                "hint": null,
                "message": "permission denied for table budgets"
            })),
        )
            .into_response();
    }
    backend.record("PATCH budgets", query, Some(body));
    StatusCode::NO_CONTENT.into_response()
}

async fn spawn_backend() -> (SupabaseClient, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(user))
        .route("/auth/v1/logout", post(logout))
        .route(
            "/rest/v1/transactions",
            get(list_transactions)
                .post(insert_transaction)
                .delete(delete_transaction),
        )
        .route("/rest/v1/budgets", get(list_budgets).patch(update_budget))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = SupabaseClient::new(&format!("http://{addr}"), API_KEY).unwrap();
    (client, backend)
}

async fn signed_in_backend() -> (SupabaseClient, Backend) {
    let (client, backend) = spawn_backend().await;
    client
        .sign_in_with_password("alice@example.com", "secret")
        .await
        .unwrap();
    (client, backend)
}

fn user_id() -> Uuid {
    Uuid::parse_str(USER_ID).unwrap()
}

fn seed_rows(backend: &Backend) {
    *backend.rows.lock().unwrap() = vec![
        json!({
            "id": "0a6f1c52-7d1e-4f7a-8c3b-2e1d0c9b8a71",
            "description": "Salary",
            "amount": 1000,
            "category": "Work",
            "type": "income",
            "date": "2024-03-02",
            "user_id": USER_ID
        }),
        json!({
            "id": "7e4d2b19-3c5a-4e6f-9b8a-1d2c3b4a5f60",
            "description": "Rent",
            "amount": -300,
            "category": "Housing",
            "type": "expense",
            "date": "2024-03-01T09:30:00+00:00",
            "user_id": USER_ID
        }),
    ];
}

#[tokio::test]
async fn signed_out_client_has_no_user() {
    let (client, backend) = spawn_backend().await;

    assert_eq!(client.current_user().await.unwrap(), None);
    assert_eq!(client.get_session().await.unwrap(), None);
    assert!(backend.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sign_in_stores_session_and_notifies() {
    let (client, _backend) = spawn_backend().await;
    let mut changes = client.on_auth_state_change();

    let session = client
        .sign_in_with_password("alice@example.com", "secret")
        .await
        .unwrap();

    assert_eq!(session.access_token, TOKEN);
    assert_eq!(session.user.id, user_id());
    assert!(session.expires_at.is_some());
    assert_eq!(client.get_session().await.unwrap(), Some(session.clone()));

    let change = changes.recv().await.unwrap();
    assert_eq!(change.event, AuthEvent::SignedIn);
    assert_eq!(change.session, Some(session));

    let user = client.current_user().await.unwrap().unwrap();
    assert_eq!(user.id, user_id());
    assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    changes.unsubscribe();
}

#[tokio::test]
async fn wrong_password_is_a_service_error() {
    let (client, _backend) = spawn_backend().await;

    let err = client
        .sign_in_with_password("alice@example.com", "nope")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RemoteError::Service {
            status: Some(400),
            code: None,
            message: "Invalid login credentials".to_string(),
        }
    );
    assert_eq!(client.get_session().await.unwrap(), None);
}

#[tokio::test]
async fn sign_out_clears_session() {
    let (client, _backend) = signed_in_backend().await;
    let mut changes = client.on_auth_state_change();

    client.sign_out().await;

    assert_eq!(client.get_session().await.unwrap(), None);
    assert_eq!(client.current_user().await.unwrap(), None);
    assert_eq!(changes.recv().await.unwrap().event, AuthEvent::SignedOut);
}

#[tokio::test]
async fn table_call_without_session_is_unauthorized() {
    let (client, _backend) = spawn_backend().await;

    let err = client.list_transactions(user_id()).await.unwrap_err();
    assert_eq!(err, RemoteError::Unauthorized);
}

#[tokio::test]
async fn list_filters_by_owner_newest_first() {
    let (client, backend) = signed_in_backend().await;
    seed_rows(&backend);

    let rows = client.list_transactions(user_id()).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].description, "Salary");
    assert_eq!(rows[1].kind, TransactionKind::Expense);
    assert_eq!(rows[1].amount, MoneyCents::from_units(-300));

    let seen = backend.last("GET transactions");
    assert_eq!(seen.query["select"], "*");
    assert_eq!(seen.query["user_id"], format!("eq.{USER_ID}"));
    assert_eq!(seen.query["order"], "date.desc");
}

#[tokio::test]
async fn insert_returns_stored_row() {
    let (client, backend) = signed_in_backend().await;
    let input = NewTransaction {
        description: "Coffee".to_string(),
        amount: "3.5".parse().unwrap(),
        category: "Food".to_string(),
        kind: TransactionKind::Expense,
        date: Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap(),
        user_id: Some(user_id()),
    };

    let row = client.insert_transaction(&input).await.unwrap();

    assert_eq!(row.id, Uuid::parse_str(NEW_ROW_ID).unwrap());
    assert_eq!(row.amount, MoneyCents::new(350));
    assert_eq!(row.date, input.date);
    let body = backend.last("POST transactions").body.unwrap();
    assert_eq!(body["type"], "expense");
    assert_eq!(body["amount"], 3.5);
    assert_eq!(body["user_id"], USER_ID);
}

#[tokio::test]
async fn delete_filters_by_id() {
    let (client, backend) = signed_in_backend().await;
    seed_rows(&backend);
    let id = Uuid::parse_str("7e4d2b19-3c5a-4e6f-9b8a-1d2c3b4a5f60").unwrap();

    client.delete_transaction(id).await.unwrap();

    assert_eq!(backend.last("DELETE transactions").query["id"], format!("eq.{id}"));
    assert_eq!(backend.rows.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn budgets_round_trip() {
    let (client, backend) = signed_in_backend().await;

    let budgets = client.list_budgets(user_id()).await.unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].spent, MoneyCents::new(125_050));
    assert_eq!(backend.last("GET budgets").query["order"], "month.desc");

    let mut budget: Budget = budgets[0].clone();
    budget.user_id = None;
    budget.limit = MoneyCents::from_units(6000);
    client.update_budget(user_id(), &budget).await.unwrap();

    let seen = backend.last("PATCH budgets");
    assert_eq!(seen.query["category"], "eq.Food");
    assert_eq!(seen.query["user_id"], format!("eq.{USER_ID}"));
    let body = seen.body.unwrap();
    assert_eq!(body["limit"], 6000);
    assert_eq!(body["user_id"], USER_ID);
}

#[tokio::test]
async fn permission_error_keeps_code() {
    let (client, _backend) = signed_in_backend().await;
    let mut budget = client.list_budgets(user_id()).await.unwrap().remove(0);
    budget.category = "Locked".to_string();

    let err = client.update_budget(user_id(), &budget).await.unwrap_err();

    assert_eq!(
        err,
        RemoteError::Service {
            status: Some(403),
            code: Some("42501".to_string()),
            message: "permission denied for table budgets".to_string(),
        }
    );
}

#[tokio::test]
async fn store_over_http() {
    let (client, backend) = signed_in_backend().await;
    seed_rows(&backend);
    let store = FinanceStore::new(client.clone());

    store.fetch_transactions().await;
    let totals = store.snapshot().totals();
    assert_eq!(totals.total_income, MoneyCents::from_units(1000));
    assert_eq!(totals.total_expenses, MoneyCents::from_units(300));
    assert_eq!(totals.net_balance, MoneyCents::from_units(700));

    let added = store
        .add_transaction(NewTransaction {
            description: "Bonus".to_string(),
            amount: MoneyCents::from_units(200),
            category: "Work".to_string(),
            kind: TransactionKind::Income,
            date: Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap(),
            user_id: None,
        })
        .await;
    assert!(added);
    let state = store.snapshot();
    assert_eq!(state.transactions.last().unwrap().description, "Bonus");
    assert_eq!(state.totals().net_balance, MoneyCents::from_units(900));

    client.sign_out().await;
    store.fetch_transactions().await;
    let state = store.snapshot();
    assert_eq!(
        state.error_message().as_deref(),
        Some("Please sign in to view transactions")
    );
    assert_eq!(state.transactions.len(), 3);
}
