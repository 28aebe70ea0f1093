//! Stateless HTTP request builder and response parser for the lists API.
//!
//! # Design
//! `ListsApi` holds only the immutable `ClientConfig`. Each operation is split
//! into a `build_*` method that produces an `HttpRequest` and a `parse_*`
//! method that consumes an `HttpResponse`. The caller (or `ListsClient`)
//! executes the round-trip in between, keeping this layer deterministic and
//! free of I/O.

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::types::{ListPage, ListPrototype, MailingList, Subscriber, SubscriberPrototype, Vars};

/// `limit` value that is left out of listing requests.
pub const DEFAULT_LIMIT: u32 = 25;
/// `skip` value that is left out of listing requests.
pub const DEFAULT_SKIP: u32 = 0;

const LISTS_ENDPOINT: &str = "lists";

#[derive(serde::Deserialize)]
struct ListEnvelope {
    list: MailingList,
}

#[derive(serde::Deserialize)]
struct MemberEnvelope {
    member: Subscriber,
}

/// Synchronous, stateless request builder for the mailing-list API.
#[derive(Debug, Clone)]
pub struct ListsApi {
    config: ClientConfig,
}

impl ListsApi {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build_list_mailing_lists(&self, limit: u32, skip: u32, address: &str) -> HttpRequest {
        let mut query = paging(limit, skip);
        if !address.is_empty() {
            query.push(("address".to_string(), address.to_string()));
        }
        self.request(HttpMethod::Get, self.lists_url(), query, None)
    }

    pub fn build_create_mailing_list(&self, prototype: &ListPrototype) -> HttpRequest {
        let body = RequestBody::Form(list_fields(prototype));
        self.request(HttpMethod::Post, self.lists_url(), Vec::new(), Some(body))
    }

    pub fn build_delete_mailing_list(&self, address: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, self.list_url(address), Vec::new(), None)
    }

    pub fn build_get_mailing_list(&self, address: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.list_url(address), Vec::new(), None)
    }

    pub fn build_update_mailing_list(&self, address: &str, prototype: &ListPrototype) -> HttpRequest {
        let body = RequestBody::Form(list_fields(prototype));
        self.request(HttpMethod::Put, self.list_url(address), Vec::new(), Some(body))
    }

    pub fn parse_list_mailing_lists(
        &self,
        response: HttpResponse,
    ) -> Result<ListPage<MailingList>, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_create_mailing_list(&self, response: HttpResponse) -> Result<MailingList, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_delete_mailing_list(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_get_mailing_list(&self, response: HttpResponse) -> Result<MailingList, ApiError> {
        check_status(&response)?;
        decode::<ListEnvelope>(&response).map(|envelope| envelope.list)
    }

    pub fn parse_update_mailing_list(&self, response: HttpResponse) -> Result<MailingList, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn build_list_subscribers(
        &self,
        limit: u32,
        skip: u32,
        subscribed: Option<bool>,
        list_address: &str,
    ) -> HttpRequest {
        let mut query = paging(limit, skip);
        if let Some(subscribed) = subscribed {
            query.push(("subscribed".to_string(), yes_no(subscribed).to_string()));
        }
        self.request(HttpMethod::Get, self.members_url(list_address), query, None)
    }

    pub fn build_get_subscriber(&self, subscriber_address: &str, list_address: &str) -> HttpRequest {
        let path = self.member_url(list_address, subscriber_address);
        self.request(HttpMethod::Get, path, Vec::new(), None)
    }

    /// `merge` is sent as `upsert`: when set, an existing member with the same
    /// address is updated instead of rejected.
    pub fn build_create_subscriber(
        &self,
        merge: bool,
        list_address: &str,
        prototype: &SubscriberPrototype,
    ) -> Result<HttpRequest, ApiError> {
        let mut fields = vec![field("upsert", yes_no(merge))];
        fields.extend(subscriber_fields(prototype)?);
        let body = RequestBody::Multipart(fields);
        Ok(self.request(HttpMethod::Post, self.members_url(list_address), Vec::new(), Some(body)))
    }

    pub fn build_update_subscriber(
        &self,
        subscriber_address: &str,
        list_address: &str,
        prototype: &SubscriberPrototype,
    ) -> Result<HttpRequest, ApiError> {
        let body = RequestBody::Multipart(subscriber_fields(prototype)?);
        let path = self.member_url(list_address, subscriber_address);
        Ok(self.request(HttpMethod::Put, path, Vec::new(), Some(body)))
    }

    pub fn parse_list_subscribers(
        &self,
        response: HttpResponse,
    ) -> Result<ListPage<Subscriber>, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_get_subscriber(&self, response: HttpResponse) -> Result<Subscriber, ApiError> {
        check_status(&response)?;
        decode::<MemberEnvelope>(&response).map(|envelope| envelope.member)
    }

    pub fn parse_create_subscriber(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_update_subscriber(&self, response: HttpResponse) -> Result<Subscriber, ApiError> {
        check_status(&response)?;
        decode::<MemberEnvelope>(&response).map(|envelope| envelope.member)
    }

    fn lists_url(&self) -> String {
        format!("{}/{LISTS_ENDPOINT}", self.config.base_url())
    }

    fn list_url(&self, address: &str) -> String {
        format!("{}/{}", self.lists_url(), path_segment(address))
    }

    fn members_url(&self, list_address: &str) -> String {
        format!("{}/members", self.list_url(list_address))
    }

    fn member_url(&self, list_address: &str, subscriber_address: &str) -> String {
        format!(
            "{}/{}",
            self.members_url(list_address),
            path_segment(subscriber_address)
        )
    }

    fn request(
        &self,
        method: HttpMethod,
        path: String,
        query: Vec<(String, String)>,
        body: Option<RequestBody>,
    ) -> HttpRequest {
        HttpRequest {
            method,
            path,
            query,
            headers: vec![("Authorization".to_string(), self.config.authorization())],
            body,
        }
    }
}

/// Wire encoding of a tri-state flag once it is known.
pub fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Percent-encode an address for use as one path segment. `@` is a valid
/// path character and stays literal.
fn path_segment(address: &str) -> String {
    urlencoding::encode(address).replace("%40", "@")
}

fn field(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

fn paging(limit: u32, skip: u32) -> Vec<(String, String)> {
    let mut query = Vec::new();
    if limit != DEFAULT_LIMIT {
        query.push(field("limit", &limit.to_string()));
    }
    if skip != DEFAULT_SKIP {
        query.push(field("skip", &skip.to_string()));
    }
    query
}

fn push_non_empty(fields: &mut Vec<(String, String)>, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        fields.push(field(name, value));
    }
}

fn list_fields(prototype: &ListPrototype) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    push_non_empty(&mut fields, "address", prototype.address.as_deref());
    push_non_empty(&mut fields, "name", prototype.name.as_deref());
    push_non_empty(&mut fields, "description", prototype.description.as_deref());
    push_non_empty(
        &mut fields,
        "access_level",
        prototype.access_level.as_ref().map(|level| level.as_str()),
    );
    fields
}

fn subscriber_fields(prototype: &SubscriberPrototype) -> Result<Vec<(String, String)>, ApiError> {
    let mut fields = Vec::new();
    push_non_empty(&mut fields, "address", prototype.address.as_deref());
    push_non_empty(&mut fields, "name", prototype.name.as_deref());
    if let Some(vars) = &prototype.vars {
        fields.push(field("vars", &encode_vars(vars)?));
    }
    if let Some(subscribed) = prototype.subscribed {
        fields.push(field("subscribed", yes_no(subscribed)));
    }
    Ok(fields)
}

fn encode_vars(vars: &Vars) -> Result<String, ApiError> {
    serde_json::to_string(vars).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-2xx status codes to `ApiError::HttpError`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
