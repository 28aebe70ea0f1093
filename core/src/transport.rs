//! The I/O seam: something that turns an `HttpRequest` into an `HttpResponse`.
//!
//! Non-2xx statuses are not errors at this layer; they come back as data so
//! `ListsApi` can interpret them.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "blocking")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "blocking")]
mod reqwest_transport {
    use std::time::Duration;

    use reqwest::blocking::{multipart, Client};
    use reqwest::Method;

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};

    /// Blocking transport backed by `reqwest::blocking`.
    ///
    /// Must not be created or dropped from inside an async runtime.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Result<Self, ApiError> {
            let client = Client::builder()
                .timeout(Duration::from_secs(30))
                .pool_max_idle_per_host(10)
                .build()
                .map_err(|e| ApiError::ConfigError(e.to_string()))?;
            Ok(Self { client })
        }

        pub fn from_client(client: Client) -> Self {
            Self { client }
        }
    }

    impl Transport for ReqwestTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let url = request.url()?;
            let method = match request.method {
                HttpMethod::Get => Method::GET,
                HttpMethod::Post => Method::POST,
                HttpMethod::Put => Method::PUT,
                HttpMethod::Delete => Method::DELETE,
            };

            let mut builder = self.client.request(method, url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder = match request.body {
                Some(RequestBody::Form(fields)) => builder.form(&fields),
                Some(RequestBody::Multipart(fields)) => {
                    let form = fields
                        .into_iter()
                        .fold(multipart::Form::new(), |form, (name, value)| {
                            form.text(name, value)
                        });
                    builder.multipart(form)
                }
                None => builder,
            };

            let response = builder
                .send()
                .map_err(|e| ApiError::TransportError(e.to_string()))?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .text()
                .map_err(|e| ApiError::TransportError(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
