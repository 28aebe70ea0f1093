//! In-memory stand-in for the hosted mailing-list API.
//!
//! Serves `/lists` and `/lists/{address}/members` with the same envelopes,
//! encodings and basic-auth scheme as the real service, so the client crate
//! can be exercised end to end.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const DEFAULT_LIMIT: usize = 25;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct List {
    pub address: String,
    pub name: String,
    pub description: String,
    pub access_level: String,
    pub created_at: String,
    pub members_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub address: String,
    pub name: String,
    pub subscribed: bool,
    pub vars: Map<String, Value>,
}

/// A list and its members, keyed by list address in `Db`.
pub struct Entry {
    list: List,
    members: BTreeMap<String, Member>,
}

impl Entry {
    fn refresh_count(&mut self) {
        self.list.members_count = self.members.len();
    }
}

pub type Db = Arc<RwLock<BTreeMap<String, Entry>>>;

#[derive(Deserialize)]
pub struct ListForm {
    pub address: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub access_level: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub address: Option<String>,
}

#[derive(Deserialize)]
pub struct MembersQuery {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub subscribed: Option<String>,
}

/// Error reply in the service's `{"message": ...}` shape.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

pub fn app(api_key: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(BTreeMap::new()));
    let expected = Arc::new(format!(
        "Basic {}",
        STANDARD.encode(format!("api:{api_key}"))
    ));
    Router::new()
        .route("/lists", get(list_lists).post(create_list))
        .route(
            "/lists/{address}",
            get(get_list).put(update_list).delete(delete_list),
        )
        .route(
            "/lists/{address}/members",
            get(list_members).post(create_member),
        )
        .route(
            "/lists/{address}/members/{member}",
            get(get_member).put(update_member),
        )
        .route_layer(middleware::from_fn_with_state(expected, require_basic_auth))
        .with_state(db)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

async fn require_basic_auth(
    State(expected): State<Arc<String>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected.as_str());
    if !authorized {
        tracing::warn!(uri = %request.uri(), "rejected request without valid credentials");
        return ApiError::new(StatusCode::UNAUTHORIZED, "Forbidden").into_response();
    }
    next.run(request).await
}

fn page<T>(items: impl Iterator<Item = T>, limit: Option<usize>, skip: Option<usize>) -> Vec<T> {
    items
        .skip(skip.unwrap_or(0))
        .take(limit.unwrap_or(DEFAULT_LIMIT))
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_access_level(value: &str) -> Result<String, ApiError> {
    match value {
        "readonly" | "members" | "everyone" => Ok(value.to_string()),
        other => Err(ApiError::bad_request(format!("Invalid access level '{other}'"))),
    }
}

fn parse_yes_no(value: &str) -> Result<bool, ApiError> {
    match value {
        "yes" | "true" => Ok(true),
        "no" | "false" => Ok(false),
        other => Err(ApiError::bad_request(format!("Invalid boolean '{other}'"))),
    }
}

fn list_not_found() -> ApiError {
    ApiError::not_found("Mailing list not found")
}

async fn list_lists(
    State(db): State<Db>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let db = db.read().await;
    let matching: Vec<List> = db
        .values()
        .map(|entry| entry.list.clone())
        .filter(|list| match query.address.as_deref() {
            Some(address) if !address.is_empty() => list.address == address,
            _ => true,
        })
        .collect();
    let total_count = matching.len();
    let items = page(matching.into_iter(), query.limit, query.skip);
    Json(json!({ "total_count": total_count, "items": items }))
}

async fn create_list(
    State(db): State<Db>,
    Form(input): Form<ListForm>,
) -> Result<Json<List>, ApiError> {
    let address =
        non_empty(input.address).ok_or_else(|| ApiError::bad_request("'address' parameter is missing"))?;
    let access_level = match non_empty(input.access_level) {
        Some(level) => parse_access_level(&level)?,
        None => "everyone".to_string(),
    };

    let mut db = db.write().await;
    if db.contains_key(&address) {
        return Err(ApiError::bad_request(format!("Duplicate object: {address}")));
    }
    let list = List {
        address: address.clone(),
        name: input.name.unwrap_or_default(),
        description: input.description.unwrap_or_default(),
        access_level,
        created_at: chrono::Utc::now().to_rfc2822(),
        members_count: 0,
    };
    db.insert(
        address,
        Entry {
            list: list.clone(),
            members: BTreeMap::new(),
        },
    );
    tracing::info!(address = %list.address, "created mailing list");
    Ok(Json(list))
}

async fn get_list(
    State(db): State<Db>,
    Path(address): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let db = db.read().await;
    let list = db
        .get(&address)
        .map(|entry| entry.list.clone())
        .ok_or_else(list_not_found)?;
    Ok(Json(json!({ "list": list })))
}

async fn update_list(
    State(db): State<Db>,
    Path(address): Path<String>,
    Form(input): Form<ListForm>,
) -> Result<Json<List>, ApiError> {
    let mut db = db.write().await;
    if !db.contains_key(&address) {
        return Err(list_not_found());
    }
    let new_address = non_empty(input.address).unwrap_or_else(|| address.clone());
    if new_address != address && db.contains_key(&new_address) {
        return Err(ApiError::bad_request(format!("Duplicate object: {new_address}")));
    }
    let access_level = non_empty(input.access_level)
        .map(|level| parse_access_level(&level))
        .transpose()?;

    let mut entry = db.remove(&address).ok_or_else(list_not_found)?;
    let list = &mut entry.list;
    list.address = new_address.clone();
    if let Some(name) = non_empty(input.name) {
        list.name = name;
    }
    if let Some(description) = non_empty(input.description) {
        list.description = description;
    }
    if let Some(level) = access_level {
        list.access_level = level;
    }
    let updated = list.clone();
    db.insert(new_address, entry);
    Ok(Json(updated))
}

async fn delete_list(
    State(db): State<Db>,
    Path(address): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut db = db.write().await;
    db.remove(&address).ok_or_else(list_not_found)?;
    tracing::info!(%address, "deleted mailing list");
    Ok(Json(json!({ "address": address, "message": "Mailing list has been deleted" })))
}

/// Text fields of a multipart body; later duplicates win.
async fn read_fields(mut multipart: Multipart) -> Result<BTreeMap<String, String>, ApiError> {
    let mut fields = BTreeMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        fields.insert(name, value);
    }
    Ok(fields)
}

fn parse_vars(text: &str) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(vars)) => Ok(vars),
        Ok(Value::Null) => Ok(Map::new()),
        _ => Err(ApiError::bad_request("Failed to decode 'vars' as a JSON object")),
    }
}

async fn list_members(
    State(db): State<Db>,
    Path(address): Path<String>,
    Query(query): Query<MembersQuery>,
) -> Result<Json<Value>, ApiError> {
    let filter = query.subscribed.as_deref().map(parse_yes_no).transpose()?;
    let db = db.read().await;
    let entry = db.get(&address).ok_or_else(list_not_found)?;
    let matching: Vec<Member> = entry
        .members
        .values()
        .filter(|member| filter.map_or(true, |subscribed| member.subscribed == subscribed))
        .cloned()
        .collect();
    let total_count = matching.len();
    let items = page(matching.into_iter(), query.limit, query.skip);
    Ok(Json(json!({ "total_count": total_count, "items": items })))
}

async fn get_member(
    State(db): State<Db>,
    Path((address, member)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let db = db.read().await;
    let entry = db.get(&address).ok_or_else(list_not_found)?;
    let member = entry
        .members
        .get(&member)
        .ok_or_else(|| ApiError::not_found("Member not found"))?;
    Ok(Json(json!({ "member": member })))
}

async fn create_member(
    State(db): State<Db>,
    Path(address): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut fields = read_fields(multipart).await?;
    let upsert = fields.remove("upsert").map(|v| parse_yes_no(&v)).transpose()?.unwrap_or(false);
    let member_address = non_empty(fields.remove("address"))
        .ok_or_else(|| ApiError::bad_request("'address' parameter is missing"))?;
    let name = fields.remove("name");
    let vars = fields.remove("vars").map(|v| parse_vars(&v)).transpose()?;
    let subscribed = fields.remove("subscribed").map(|v| parse_yes_no(&v)).transpose()?;

    let mut db = db.write().await;
    let entry = db.get_mut(&address).ok_or_else(list_not_found)?;
    let member = match entry.members.get_mut(&member_address) {
        Some(_) if !upsert => {
            return Err(ApiError::bad_request(format!(
                "Address already exists '{member_address}'"
            )))
        }
        Some(existing) => {
            if let Some(name) = name {
                existing.name = name;
            }
            if let Some(vars) = vars {
                existing.vars = vars;
            }
            if let Some(subscribed) = subscribed {
                existing.subscribed = subscribed;
            }
            existing.clone()
        }
        None => {
            let member = Member {
                address: member_address.clone(),
                name: name.unwrap_or_default(),
                subscribed: subscribed.unwrap_or(true),
                vars: vars.unwrap_or_default(),
            };
            entry.members.insert(member_address, member.clone());
            member
        }
    };
    entry.refresh_count();
    Ok(Json(json!({
        "member": member,
        "message": "Mailing list member has been created"
    })))
}

async fn update_member(
    State(db): State<Db>,
    Path((address, member_address)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut fields = read_fields(multipart).await?;
    let new_address = non_empty(fields.remove("address"));
    let name = non_empty(fields.remove("name"));
    let vars = fields.remove("vars").map(|v| parse_vars(&v)).transpose()?;
    let subscribed = fields.remove("subscribed").map(|v| parse_yes_no(&v)).transpose()?;

    let mut db = db.write().await;
    let entry = db.get_mut(&address).ok_or_else(list_not_found)?;
    if let Some(new_address) = &new_address {
        if *new_address != member_address && entry.members.contains_key(new_address) {
            return Err(ApiError::bad_request(format!(
                "Address already exists '{new_address}'"
            )));
        }
    }
    let mut member = entry
        .members
        .remove(&member_address)
        .ok_or_else(|| ApiError::not_found("Member not found"))?;
    if let Some(new_address) = new_address {
        member.address = new_address;
    }
    if let Some(name) = name {
        member.name = name;
    }
    if let Some(vars) = vars {
        member.vars = vars;
    }
    if let Some(subscribed) = subscribed {
        member.subscribed = subscribed;
    }
    entry.members.insert(member.address.clone(), member.clone());
    entry.refresh_count();
    Ok(Json(json!({
        "member": member,
        "message": "Mailing list member has been updated"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_serializes_to_json() {
        let member = Member {
            address: "a@b.com".to_string(),
            name: "A".to_string(),
            subscribed: true,
            vars: Map::new(),
        };
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["address"], "a@b.com");
        assert_eq!(json["subscribed"], true);
        assert_eq!(json["vars"], json!({}));
    }

    #[test]
    fn yes_no_parsing() {
        assert!(parse_yes_no("yes").unwrap());
        assert!(!parse_yes_no("no").unwrap());
        assert!(parse_yes_no("maybe").is_err());
    }

    #[test]
    fn vars_must_be_an_object() {
        assert_eq!(parse_vars(r#"{"k":"v"}"#).unwrap()["k"], "v");
        assert!(parse_vars("null").unwrap().is_empty());
        assert!(parse_vars("[1,2]").is_err());
        assert!(parse_vars("{").is_err());
    }

    #[test]
    fn access_level_is_validated() {
        assert_eq!(parse_access_level("members").unwrap(), "members");
        assert!(parse_access_level("admins").is_err());
    }

    #[test]
    fn paging_applies_skip_then_limit() {
        let items = page(0..100, None, Some(90));
        assert_eq!(items, (90..100).collect::<Vec<_>>());
        assert_eq!(page(0..100, None, None).len(), DEFAULT_LIMIT);
        assert_eq!(page(0..100, Some(3), Some(1)), vec![1, 2, 3]);
    }
}
