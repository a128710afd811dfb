//! Mock content-delivery API used by the core's integration tests.
//!
//! Serves a fixed stack (see [`fixtures`]) under `/v3`. Every request must
//! carry the fixture `api_key` and `access_token` headers and an
//! `environment` parameter; errors use the delivery API's JSON error body.

pub mod fixtures;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tracing::{debug, warn};

use crate::fixtures::Store;

pub type Db = Arc<Store>;

type Params = Vec<(String, String)>;

const DEFAULT_LIMIT: usize = 100;
const SYNC_PAGE: usize = 2;

pub fn app() -> Router {
    let db: Db = Arc::new(fixtures::store());
    let api = Router::new()
        .route("/content_types", get(list_content_types))
        .route("/content_types/{uid}", get(get_content_type))
        .route("/content_types/{uid}/entries", get(list_entries))
        .route("/content_types/{uid}/entries/{entry_uid}", get(get_entry))
        .route("/assets", get(list_assets))
        .route("/assets/{uid}", get(get_asset))
        .route("/global_fields", get(list_global_fields))
        .route("/global_fields/{uid}", get(get_global_field))
        .route("/taxonomies/entries", get(taxonomy_entries))
        .route("/stacks/sync", get(sync))
        .layer(middleware::from_fn(authorize));
    Router::new().nest("/v3", api).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Delivery API error body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    #[serde(rename = "error_message")]
    message: String,
    #[serde(rename = "error_code")]
    code: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Value>,
}

impl ApiError {
    fn new(status: StatusCode, code: u32, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            errors: None,
        }
    }

    fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    fn not_found(what: &str, uid: &str, code: u32) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            code,
            format!("The {what} '{uid}' was not found. Please try again."),
        )
        .with_errors(json!({"uid": ["is not valid."]}))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

async fn authorize(request: Request, next: Next) -> Result<Response, ApiError> {
    check_credentials(&request)?;
    debug!(path = %request.uri().path(), "serving request");
    Ok(next.run(request).await)
}

/// Reject a request without the fixture credentials or environment. Runs
/// before the inner service so no borrow of the request spans an await.
fn check_credentials(request: &Request) -> Result<(), ApiError> {
    let header = |name: &str| request.headers().get(name).and_then(|v| v.to_str().ok());
    let path = request.uri().path();
    if header("api_key") != Some(fixtures::API_KEY) {
        warn!(%path, "rejected request with bad api_key");
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            109,
            "The api_key that you've provided is invalid.",
        )
        .with_errors(json!({"api_key": ["is not valid."]})));
    }
    if header("access_token") != Some(fixtures::DELIVERY_TOKEN) {
        warn!(%path, "rejected request with bad access_token");
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            412,
            "We can't find that Stack. Please try again.",
        )
        .with_errors(json!({"access_token": ["is not valid."]})));
    }
    let params = Query::<Params>::try_from_uri(request.uri())
        .map(|Query(params)| params)
        .unwrap_or_default();
    if param(&params, "environment") != Some(fixtures::ENVIRONMENT) {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            141,
            "The environment that you've provided is invalid.",
        )
        .with_errors(json!({"environment": ["is not valid."]})));
    }
    Ok(())
}

fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .iter()
        .rev()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn flag(params: &Params, name: &str) -> bool {
    param(params, name) == Some("true")
}

fn number(params: &Params, name: &str) -> Result<Option<usize>, ApiError> {
    param(params, name)
        .map(|raw| {
            raw.parse().map_err(|_| {
                ApiError::new(StatusCode::BAD_REQUEST, 141, format!("'{name}' must be a number."))
            })
        })
        .transpose()
}

fn filter_of(params: &Params) -> Result<Map<String, Value>, ApiError> {
    match param(params, "query") {
        None => Ok(Map::new()),
        Some(raw) => match serde_json::from_str(raw) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                141,
                "The query parameter must be a JSON object.",
            )),
        },
    }
}

/// Value at `field`; `taxonomies.<uid>` resolves to the entry's term uids in
/// that taxonomy.
fn resolve(item: &Value, field: &str) -> Option<Value> {
    if let Some(taxonomy) = field.strip_prefix("taxonomies.") {
        let terms: Vec<Value> = item
            .get("taxonomies")?
            .as_array()?
            .iter()
            .filter(|t| t["taxonomy_uid"] == taxonomy)
            .map(|t| t["term_uid"].clone())
            .collect();
        return (!terms.is_empty()).then_some(Value::Array(terms));
    }
    item.get(field).cloned()
}

fn equals(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) if !expected.is_array() => items.contains(expected),
        _ => actual == expected,
    }
}

fn compare(actual: Option<&Value>, operand: &Value, accept: fn(f64, f64) -> bool) -> bool {
    match (actual.and_then(Value::as_f64), operand.as_f64()) {
        (Some(a), Some(b)) => accept(a, b),
        _ => false,
    }
}

fn conditions(operand: &Value) -> Vec<Map<String, Value>> {
    let list = match operand {
        // The taxonomy endpoint receives `$and` as text.
        Value::String(text) => serde_json::from_str(text).unwrap_or(Value::Null),
        other => other.clone(),
    };
    list.as_array()
        .map(|items| items.iter().filter_map(|i| i.as_object().cloned()).collect())
        .unwrap_or_default()
}

fn matches(item: &Value, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(field, predicate)| match field.as_str() {
        "$or" => conditions(predicate).iter().any(|c| matches(item, c)),
        "$and" => conditions(predicate).iter().all(|c| matches(item, c)),
        _ => {
            let actual = resolve(item, field);
            match predicate {
                Value::Object(ops) => ops.iter().all(|(op, operand)| operator(actual.as_ref(), op, operand)),
                literal => actual.is_some_and(|a| equals(&a, literal)),
            }
        }
    })
}

fn operator(actual: Option<&Value>, op: &str, operand: &Value) -> bool {
    let in_set = || {
        let set = operand.as_array().cloned().unwrap_or_default();
        actual.is_some_and(|a| set.iter().any(|candidate| equals(a, candidate)))
    };
    match op {
        "$in" => in_set(),
        "$nin" => !in_set(),
        "$ne" => actual.map_or(true, |a| !equals(a, operand)),
        "$exists" => operand.as_bool() == Some(actual.is_some()),
        "$lt" => compare(actual, operand, |a, b| a < b),
        "$lte" => compare(actual, operand, |a, b| a <= b),
        "$gt" => compare(actual, operand, |a, b| a > b),
        "$gte" => compare(actual, operand, |a, b| a >= b),
        "$regex" => match (actual.and_then(Value::as_str), operand.as_str()) {
            (Some(a), Some(pattern)) => a.contains(pattern.trim_start_matches('^').trim_end_matches('$')),
            _ => false,
        },
        // The fixture taxonomies are flat: a term is its own only
        // ancestor and descendant.
        "$eq_below" | "$eq_above" => {
            let term = operand
                .as_str()
                .map(|t| t.split(", level:").next().unwrap_or(t).to_string())
                .map(Value::String);
            matches!((actual, term), (Some(a), Some(t)) if equals(a, &t))
        }
        "$below" | "$above" => false,
        _ => true,
    }
}

/// Filter, page and wrap a collection the way the list endpoints do.
fn listing(key: &str, items: Vec<&Value>, params: &Params) -> Result<Json<Value>, ApiError> {
    let filter = filter_of(params)?;
    let matched: Vec<&Value> = items.into_iter().filter(|i| matches(i, &filter)).collect();
    if flag(params, "count") {
        return Ok(Json(wrap(key, json!(matched.len()))));
    }
    let skip = number(params, "skip")?.unwrap_or(0);
    let limit = number(params, "limit")?.unwrap_or(DEFAULT_LIMIT);
    let page: Vec<Value> = matched.iter().skip(skip).take(limit).map(|v| (*v).clone()).collect();
    let mut body = wrap(key, Value::Array(page));
    if flag(params, "include_count") {
        body["count"] = json!(matched.len());
    }
    Ok(Json(body))
}

fn wrap(key: &str, value: Value) -> Value {
    let mut body = Map::new();
    body.insert(key.to_string(), value);
    Value::Object(body)
}

async fn list_content_types(
    State(db): State<Db>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, ApiError> {
    listing("content_types", db.content_types.iter().collect(), &params)
}

async fn get_content_type(State(db): State<Db>, Path(uid): Path<String>) -> Result<Json<Value>, ApiError> {
    db.content_types
        .iter()
        .find(|ct| ct["uid"] == uid.as_str())
        .map(|ct| Json(json!({"content_type": ct})))
        .ok_or_else(|| ApiError::not_found("Content Type", &uid, 118))
}

async fn list_entries(
    State(db): State<Db>,
    Path(uid): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, ApiError> {
    if !db.content_types.iter().any(|ct| ct["uid"] == uid.as_str()) {
        return Err(ApiError::not_found("Content Type", &uid, 118));
    }
    let mut body = listing("entries", db.entries_of(&uid).collect(), &params)?;
    if flag(&params, "include_content_type") {
        if let Some(ct) = db.content_types.iter().find(|ct| ct["uid"] == uid.as_str()) {
            body.0["content_type"] = ct.clone();
        }
    }
    Ok(body)
}

async fn get_entry(
    State(db): State<Db>,
    Path((uid, entry_uid)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    db.entries_of(&uid)
        .find(|e| e["uid"] == entry_uid.as_str())
        .map(|e| Json(json!({"entry": e})))
        .ok_or_else(|| ApiError::not_found("entry", &entry_uid, 141))
}

async fn list_assets(State(db): State<Db>, Query(params): Query<Params>) -> Result<Json<Value>, ApiError> {
    let mut body = listing("assets", db.assets.iter().collect(), &params)?;
    if flag(&params, "relative_urls") {
        if let Some(assets) = body.0["assets"].as_array_mut() {
            for asset in assets {
                let relative = asset["url"].as_str().map(relative_url);
                if let Some(relative) = relative {
                    asset["url"] = Value::String(relative);
                }
            }
        }
    }
    Ok(body)
}

fn relative_url(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.find('/').map_or_else(|| "/".to_string(), |i| rest[i..].to_string())
}

async fn get_asset(State(db): State<Db>, Path(uid): Path<String>) -> Result<Json<Value>, ApiError> {
    db.assets
        .iter()
        .find(|a| a["uid"] == uid.as_str())
        .map(|a| Json(json!({"asset": a})))
        .ok_or_else(|| ApiError::not_found("asset", &uid, 145))
}

async fn list_global_fields(
    State(db): State<Db>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, ApiError> {
    listing("global_fields", db.global_fields.iter().collect(), &params)
}

async fn get_global_field(State(db): State<Db>, Path(uid): Path<String>) -> Result<Json<Value>, ApiError> {
    db.global_fields
        .iter()
        .find(|g| g["uid"] == uid.as_str())
        .map(|g| Json(json!({"global_field": g})))
        .ok_or_else(|| ApiError::not_found("Global Field", &uid, 118))
}

async fn taxonomy_entries(
    State(db): State<Db>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, ApiError> {
    if param(&params, "query").is_none() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            141,
            "The query parameter is required.",
        ));
    }
    listing("entries", db.entries.iter().map(|(_, e)| e).collect(), &params)
}

/// Initial sync pages through the matching items `SYNC_PAGE` at a time;
/// the last page carries a sync token, and a sync token yields no new
/// changes.
async fn sync(State(db): State<Db>, Query(params): Query<Params>) -> Result<Json<Value>, ApiError> {
    let selected: Vec<&Value> = db
        .sync_items
        .iter()
        .filter(|item| {
            param(&params, "type").map_or(true, |kind| item["type"] == kind)
                && param(&params, "content_type_uid").map_or(true, |ct| item["content_type_uid"] == ct)
        })
        .collect();
    let skip = if let Some(token) = param(&params, "pagination_token") {
        token
            .strip_prefix("page_")
            .and_then(|n| n.parse::<usize>().ok())
            .map(|n| n.saturating_sub(1) * SYNC_PAGE)
            .ok_or_else(|| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, 141, "Invalid pagination token."))?
    } else if param(&params, "sync_token").is_some() {
        return Ok(Json(json!({"items": [], "sync_token": "sync_token_2", "total_count": 0})));
    } else if flag(&params, "init") {
        0
    } else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            141,
            "Either init, sync_token or pagination_token is required.",
        ));
    };
    let page: Vec<Value> = selected.iter().skip(skip).take(SYNC_PAGE).map(|v| (*v).clone()).collect();
    let mut body = json!({
        "items": page,
        "skip": skip,
        "limit": SYNC_PAGE,
        "total_count": selected.len(),
    });
    if skip + SYNC_PAGE < selected.len() {
        body["pagination_token"] = json!(format!("page_{}", skip / SYNC_PAGE + 2));
    } else {
        body["sync_token"] = json!("sync_token_1");
    }
    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(raw: Value) -> Map<String, Value> {
        raw.as_object().cloned().unwrap()
    }

    #[test]
    fn literal_matches_scalar_and_array_members() {
        let item = json!({"title": "A", "tags": ["x", "y"]});
        assert!(matches(&item, &filter(json!({"title": "A"}))));
        assert!(matches(&item, &filter(json!({"tags": "y"}))));
        assert!(!matches(&item, &filter(json!({"title": "B"}))));
    }

    #[test]
    fn operators_on_numbers_and_sets() {
        let item = json!({"price": 10, "tags": ["rust"]});
        assert!(matches(&item, &filter(json!({"price": {"$gte": 10}}))));
        assert!(!matches(&item, &filter(json!({"price": {"$lt": 10}}))));
        assert!(matches(&item, &filter(json!({"tags": {"$in": ["go", "rust"]}}))));
        assert!(matches(&item, &filter(json!({"missing": {"$exists": false}}))));
    }

    #[test]
    fn taxonomy_fields_resolve_to_terms() {
        let item = json!({"taxonomies": [{"taxonomy_uid": "color", "term_uid": "red"}]});
        assert!(matches(&item, &filter(json!({"taxonomies.color": {"$in": ["red"]}}))));
        assert!(matches(&item, &filter(json!({"taxonomies.color": {"$eq_below": "red, level: 2"}}))));
        assert!(!matches(&item, &filter(json!({"taxonomies.size": {"$exists": true}}))));
    }

    #[test]
    fn and_accepts_text_form() {
        let item = json!({"taxonomies": [
            {"taxonomy_uid": "color", "term_uid": "green"},
            {"taxonomy_uid": "computers", "term_uid": "laptop"}
        ]});
        let text = r#"[{"taxonomies.color":"green"}, {"taxonomies.computers":"laptop"}]"#;
        assert!(matches(&item, &filter(json!({"$and": text}))));
        assert!(!matches(&item, &filter(json!({"$or": [{"taxonomies.color": "blue"}]}))));
    }

    #[test]
    fn relative_url_strips_host() {
        assert_eq!(relative_url("https://images.example.com/v3/assets/a.png"), "/v3/assets/a.png");
        assert_eq!(relative_url("https://host"), "/");
    }
}
