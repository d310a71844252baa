//! HTTP plumbing shared by the service wrappers.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;

use super::envelope::{self, ListPage};
use super::{
    Appointments, Auth, BackendError, Consultations, Dashboard, Decorators, Pets, Services,
    TriageQueue, Users,
};

/// Clinic API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new clinic API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .user_agent(concat!("vetdesk-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Base URL every path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Scope for unauthenticated calls (login, registration, password reset).
    #[must_use]
    pub const fn public(&self) -> Api<'_> {
        Api {
            client: self,
            token: None,
        }
    }

    /// Scope for calls made on behalf of a signed-in user.
    #[must_use]
    pub const fn with_token<'a>(&'a self, token: &'a str) -> Api<'a> {
        Api {
            client: self,
            token: Some(token),
        }
    }

    /// Build the full URL for `path` with optional query pairs.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Url` if the path cannot be joined.
    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, BackendError> {
        let mut url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }
}

impl fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// A [`BackendClient`] scoped to one caller's credentials.
///
/// Entry point to the per-resource service wrappers.
#[derive(Clone, Copy)]
pub struct Api<'a> {
    client: &'a BackendClient,
    token: Option<&'a str>,
}

impl<'a> Api<'a> {
    /// Authentication endpoints.
    #[must_use]
    pub const fn auth(self) -> Auth<'a> {
        Auth::new(self)
    }

    /// User accounts.
    #[must_use]
    pub const fn users(self) -> Users<'a> {
        Users::new(self)
    }

    /// Pets.
    #[must_use]
    pub const fn pets(self) -> Pets<'a> {
        Pets::new(self)
    }

    /// Service catalogue.
    #[must_use]
    pub const fn services(self) -> Services<'a> {
        Services::new(self)
    }

    /// Appointments.
    #[must_use]
    pub const fn appointments(self) -> Appointments<'a> {
        Appointments::new(self)
    }

    /// Decorators attached to appointments.
    #[must_use]
    pub const fn decorators(self) -> Decorators<'a> {
        Decorators::new(self)
    }

    /// Consultations.
    #[must_use]
    pub const fn consultations(self) -> Consultations<'a> {
        Consultations::new(self)
    }

    /// Triage queue.
    #[must_use]
    pub const fn triage(self) -> TriageQueue<'a> {
        TriageQueue::new(self)
    }

    /// Dashboard aggregates.
    #[must_use]
    pub const fn dashboard(self) -> Dashboard<'a> {
        Dashboard::new(self)
    }

    /// Execute a GET request and unwrap the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(
        self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let url = self.client.url(path, query)?;
        self.send(self.request(Method::GET, url), envelope::decode)
            .await
    }

    /// Execute a GET request for a list.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ListPage<T>, BackendError> {
        let url = self.client.url(path, query)?;
        self.send(self.request(Method::GET, url), envelope::decode_list)
            .await
    }

    /// Execute a request with a JSON body and unwrap the envelope.
    pub(crate) async fn send_json<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let url = self.client.url(path, &[])?;
        self.send(self.request(method, url).json(body), envelope::decode)
            .await
    }

    /// Execute a request with a JSON body whose response payload is ignored.
    ///
    /// Returns the API's status message, if any.
    pub(crate) async fn send_ack<B: Serialize + Sync + ?Sized>(
        self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Option<String>, BackendError> {
        let url = self.client.url(path, &[])?;
        self.send(self.request(method, url).json(body), envelope::decode_ack)
            .await
    }

    /// Execute a DELETE request.
    pub(crate) async fn delete(self, path: &str) -> Result<(), BackendError> {
        let url = self.client.url(path, &[])?;
        self.send(self.request(Method::DELETE, url), envelope::decode_ack)
            .await
            .map(|_| ())
    }

    fn request(self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.inner.client.request(method, url);
        match self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send the request, map error statuses, and decode the body.
    async fn send<R>(
        self,
        builder: RequestBuilder,
        decode: impl FnOnce(&[u8]) -> Result<R, BackendError>,
    ) -> Result<R, BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Clinic API response");

        if status.is_success() {
            return decode(&body);
        }

        Err(parse_error(status, &body))
    }
}

impl fmt::Debug for Api<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("client", self.client)
            .field("token", &self.token.map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Map an error status and body to a [`BackendError`].
fn parse_error(status: StatusCode, body: &[u8]) -> BackendError {
    let message = envelope::error_message(body);

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            BackendError::Validation(message)
        }
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized,
        StatusCode::FORBIDDEN => BackendError::Forbidden(message),
        StatusCode::NOT_FOUND => BackendError::NotFound,
        _ => BackendError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client() -> BackendClient {
        let config = ApiConfig::new("https://api.clinic.vet/v1", Duration::from_secs(5)).unwrap();
        BackendClient::new(&config).unwrap()
    }

    #[test]
    fn test_url_joins_onto_base_path() {
        let client = client();
        assert_eq!(
            client.url("/pets/3", &[]).unwrap().as_str(),
            "https://api.clinic.vet/v1/pets/3"
        );
        assert_eq!(
            client
                .url("appointments", &[("status", "no_show".to_string()), ("q", "Rex & Co".to_string())])
                .unwrap()
                .as_str(),
            "https://api.clinic.vet/v1/appointments?status=no_show&q=Rex+%26+Co"
        );
    }

    #[test]
    fn test_parse_error_by_status() {
        assert!(matches!(
            parse_error(StatusCode::BAD_REQUEST, br#"{"message":"Name is required"}"#),
            BackendError::Validation(Some(ref m)) if m == "Name is required"
        ));
        assert!(matches!(
            parse_error(StatusCode::UNAUTHORIZED, b""),
            BackendError::Unauthorized
        ));
        assert!(matches!(
            parse_error(StatusCode::FORBIDDEN, br#"{"error":"admins only"}"#),
            BackendError::Forbidden(Some(_))
        ));
        assert!(matches!(
            parse_error(StatusCode::NOT_FOUND, b"Not Found"),
            BackendError::NotFound
        ));
        assert!(matches!(
            parse_error(StatusCode::BAD_GATEWAY, b"<html></html>"),
            BackendError::Api {
                status: 502,
                message: None
            }
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = client();
        let api = client.with_token("very-secret-token");
        let output = format!("{api:?}");
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("very-secret-token"));
    }
}
