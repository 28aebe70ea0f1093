//! High-level client: one method per API operation.
//!
//! # Design
//! `ListsClient` pairs a `ListsApi` with a `Transport`. Every method is a
//! single `build_*` → `execute` → `parse_*` round trip; nothing is retried or
//! cached, and the client holds no mutable state.

use tracing::debug;

use crate::api::ListsApi;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{ListPage, ListPrototype, MailingList, Subscriber, SubscriberPrototype};

#[derive(Debug, Clone)]
pub struct ListsClient<T> {
    api: ListsApi,
    transport: T,
}

#[cfg(feature = "blocking")]
impl ListsClient<crate::transport::ReqwestTransport> {
    /// Client backed by the default blocking reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::with_transport(
            config,
            crate::transport::ReqwestTransport::new()?,
        ))
    }
}

impl<T: Transport> ListsClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            api: ListsApi::new(config),
            transport,
        }
    }

    pub fn api(&self) -> &ListsApi {
        &self.api
    }

    /// Lists administered by the account. `limit`/`skip` equal to
    /// `DEFAULT_LIMIT`/`DEFAULT_SKIP` and an empty `address` filter are left
    /// out of the request.
    pub fn list_mailing_lists(
        &self,
        limit: u32,
        skip: u32,
        address: &str,
    ) -> Result<ListPage<MailingList>, ApiError> {
        let request = self.api.build_list_mailing_lists(limit, skip, address);
        let response = self.send(request)?;
        self.api.parse_list_mailing_lists(response)
    }

    /// Only `address` and `name` are needed; the server defaults the access
    /// level to `everyone`.
    pub fn create_mailing_list(&self, prototype: &ListPrototype) -> Result<MailingList, ApiError> {
        let request = self.api.build_create_mailing_list(prototype);
        let response = self.send(request)?;
        self.api.parse_create_mailing_list(response)
    }

    /// Removes every member, then the list itself.
    pub fn delete_mailing_list(&self, address: &str) -> Result<(), ApiError> {
        let request = self.api.build_delete_mailing_list(address);
        let response = self.send(request)?;
        self.api.parse_delete_mailing_list(response)
    }

    pub fn get_mailing_list_by_address(&self, address: &str) -> Result<MailingList, ApiError> {
        let request = self.api.build_get_mailing_list(address);
        let response = self.send(request)?;
        self.api.parse_get_mailing_list(response)
    }

    /// Partial update. Changing `address` stops delivery to the old address.
    pub fn update_mailing_list(
        &self,
        address: &str,
        prototype: &ListPrototype,
    ) -> Result<MailingList, ApiError> {
        let request = self.api.build_update_mailing_list(address, prototype);
        let response = self.send(request)?;
        self.api.parse_update_mailing_list(response)
    }

    /// Members of `list_address`, optionally filtered by subscription status
    /// (`ALL`, `SUBSCRIBED`, `UNSUBSCRIBED`).
    pub fn list_subscribers(
        &self,
        limit: u32,
        skip: u32,
        subscribed: Option<bool>,
        list_address: &str,
    ) -> Result<ListPage<Subscriber>, ApiError> {
        let request = self
            .api
            .build_list_subscribers(limit, skip, subscribed, list_address);
        let response = self.send(request)?;
        self.api.parse_list_subscribers(response)
    }

    pub fn get_subscriber_by_address(
        &self,
        subscriber_address: &str,
        list_address: &str,
    ) -> Result<Subscriber, ApiError> {
        let request = self.api.build_get_subscriber(subscriber_address, list_address);
        let response = self.send(request)?;
        self.api.parse_get_subscriber(response)
    }

    /// With `merge`, an existing member with the same address is updated;
    /// without it the server rejects the duplicate.
    pub fn create_subscriber(
        &self,
        merge: bool,
        list_address: &str,
        prototype: &SubscriberPrototype,
    ) -> Result<(), ApiError> {
        let request = self
            .api
            .build_create_subscriber(merge, list_address, prototype)?;
        let response = self.send(request)?;
        self.api.parse_create_subscriber(response)
    }

    pub fn update_subscriber(
        &self,
        subscriber_address: &str,
        list_address: &str,
        prototype: &SubscriberPrototype,
    ) -> Result<Subscriber, ApiError> {
        let request =
            self.api
                .build_update_subscriber(subscriber_address, list_address, prototype)?;
        let response = self.send(request)?;
        self.api.parse_update_subscriber(response)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method.as_str();
        let path = request.path.clone();
        debug!(method, path = %path, "sending request");
        let response = self.transport.execute(request)?;
        debug!(method, path = %path, status = response.status, "received response");
        Ok(response)
    }
}
