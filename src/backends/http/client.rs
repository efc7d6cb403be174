//! Hosted backend HTTP client.

use super::errors::{HttpBackendError, HttpServiceError, Result};
use super::types::{GeneratePhoneRequest, GeneratePhoneResponse, MessageRow};
use crate::backends::traits::Backend;
use crate::types::{LeaseId, Message, PhoneLease};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::Span;
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Path of the lease-minting function, relative to the project URL.
pub const GENERATE_PHONE_PATH: &str = "functions/v1/generate-phone";

/// Path of the messages table, relative to the project URL.
pub const MESSAGES_PATH: &str = "rest/v1/sms_messages";

/// Client for the hosted lease backend.
///
/// Talks to two endpoints of the deployed project: the `generate-phone`
/// function, which mints and persists a lease, and the `sms_messages` table,
/// which is read through the REST interface.
///
/// # Example
///
/// ```rust,ignore
/// use disposable_sms::http::HttpBackend;
/// use disposable_sms::Backend;
///
/// let backend = HttpBackend::new("https://project.supabase.co", "anon-key")?;
///
/// let lease = backend.generate_phone("US").await?;
/// let messages = backend.get_messages(&lease.id).await?;
/// ```
#[derive(Clone)]
pub struct HttpBackend {
    http_client: ClientWithMiddleware,
    auth_headers: HeaderMap,
    base_url: Url,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Builder for configuring a [`HttpBackend`].
pub struct HttpBackendBuilder {
    base_url: Url,
    api_key: SecretString,
    http_client: Option<ClientWithMiddleware>,
}

impl HttpBackendBuilder {
    /// Create a new builder for the given project URL and API key.
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: SecretString::from(api_key.into()),
            http_client: None,
        }
    }

    /// Set a custom HTTP client with middleware.
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the [`HttpBackend`].
    ///
    /// Fails with [`HttpBackendError::InvalidApiKey`] if the key cannot be
    /// sent as a header.
    pub fn build(self) -> Result<HttpBackend> {
        let auth_headers = auth_headers(&self.api_key)?;

        let mut base_url = self.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let client = reqwest::Client::builder()
                    .build()
                    .map_err(HttpBackendError::BuildHttpClient)?;
                ClientBuilder::new(client).build()
            }
        };

        Ok(HttpBackend {
            http_client,
            auth_headers,
            base_url,
        })
    }
}

/// `apikey` and bearer headers, marked sensitive.
fn auth_headers(api_key: &SecretString) -> Result<HeaderMap> {
    let key = api_key.expose_secret();

    let mut apikey = HeaderValue::from_str(key).map_err(HttpBackendError::InvalidApiKey)?;
    apikey.set_sensitive(true);
    let mut bearer =
        HeaderValue::from_str(&format!("Bearer {key}")).map_err(HttpBackendError::InvalidApiKey)?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert("apikey", apikey);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

impl HttpBackend {
    /// Create a new client for the project at `base_url`.
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        let url = Url::parse(base_url.as_ref()).map_err(HttpBackendError::InvalidEndpoint)?;
        Self::builder(url, api_key).build()
    }

    /// Create a builder for configuring the client.
    pub fn builder(base_url: Url, api_key: impl Into<String>) -> HttpBackendBuilder {
        HttpBackendBuilder::new(base_url, api_key)
    }

    /// Project URL all endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(HttpBackendError::InvalidEndpoint)
    }

    fn messages_url(&self, lease_id: &LeaseId) -> Result<Url> {
        let mut url = self.endpoint(MESSAGES_PATH)?;
        let filter = format!("eq.{lease_id}");
        let params = [
            ("select", "*"),
            ("phone_number_id", filter.as_str()),
            ("order", "received_at.desc"),
        ];
        url.set_query(Some(
            &serde_urlencoded::to_string(&params[..]).map_err(HttpBackendError::BuildRequestUrl)?,
        ));
        Ok(url)
    }

    /// Send a request and decode a JSON success body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.headers(self.auth_headers.clone()).send().await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(HttpBackendError::ParseResponse)?;

        if !status.is_success() {
            return Err(HttpBackendError::Service(HttpServiceError::from_response(
                status.as_u16(),
                &text,
            )));
        }

        serde_json::from_str(&text).map_err(HttpBackendError::DeserializeJson)
    }
}

impl Backend for HttpBackend {
    type Error = HttpBackendError;

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "HttpBackend::generate_phone",
            skip_all,
            fields(country = %country, lease_id = tracing::field::Empty)
        )
    )]
    async fn generate_phone(&self, country: &str) -> Result<PhoneLease> {
        let url = self.endpoint(GENERATE_PHONE_PATH)?;
        let request = self
            .http_client
            .post(url)
            .json(&GeneratePhoneRequest { country });

        let response: GeneratePhoneResponse = self.send_json(request).await?;
        let lease = PhoneLease::from(response);

        #[cfg(feature = "tracing")]
        {
            let span = Span::current();
            span.record("lease_id", lease.id.as_str());
            span.set_status(Status::Ok);
        }

        Ok(lease)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "HttpBackend::get_messages",
            skip_all,
            fields(lease_id = %lease_id, count = tracing::field::Empty)
        )
    )]
    async fn get_messages(&self, lease_id: &LeaseId) -> Result<Vec<Message>> {
        let url = self.messages_url(lease_id)?;
        let rows: Vec<MessageRow> = self.send_json(self.http_client.get(url)).await?;

        #[cfg(feature = "tracing")]
        {
            let span = Span::current();
            span.record("count", rows.len());
            span.set_status(Status::Ok);
        }

        Ok(rows.into_iter().map(Message::from).collect())
    }
}
