//! rental-client: HTTP adapter for the rental API plus the client-side
//! booking and order workflows built on top of it.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use rental_types::domain::booking::{Booking, BookingId, NewBooking};
use rental_types::domain::errors::BookingError;
use rental_types::domain::feedback::{Feedback, FeedbackDraft};
use rental_types::domain::order::{NewOrder, Order, OrderId};
use rental_types::ports::booking_api::{
    ApiErrorBody, BookingApi, CancelRequest, ModifyRequest, OrderApi, VersionedRequest,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

pub mod cancel;
pub mod poll;
pub mod retry;
pub mod session;

#[cfg(test)]
pub(crate) mod fake;

pub use cancel::CancellationToken;
pub use poll::{poll_with_backoff, PollConfig, PollOutcome};
pub use retry::{RetryPolicy, RetryingApi};
pub use session::{BookingSession, OrderSession};

#[derive(Clone)]
pub struct RentalClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct RentalClient {
    base: Url,
    client: reqwest::Client,
}

/// Client settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url =
            std::env::var("RENTAL_API_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".into());
        let token = std::env::var("RENTAL_API_TOKEN").ok().filter(|t| !t.is_empty());
        let timeout = match std::env::var("RENTAL_API_TIMEOUT_MS") {
            Ok(raw) => Some(Duration::from_millis(
                raw.parse().context("RENTAL_API_TIMEOUT_MS must be milliseconds")?,
            )),
            Err(_) => None,
        };
        Ok(Self {
            base_url,
            token,
            timeout,
        })
    }

    pub fn build_client(&self) -> anyhow::Result<RentalClient> {
        let mut builder = RentalClient::builder(&self.base_url)?;
        if let Some(token) = &self.token {
            builder = builder.with_bearer_token(token)?;
        }
        if let Some(timeout) = self.timeout {
            builder = builder.with_timeout(timeout);
        }
        builder.build()
    }
}

impl RentalClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<RentalClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(RentalClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> Result<Url, BookingError> {
        self.base
            .join(path)
            .map_err(|e| BookingError::Validation(format!("bad request path {path}: {e}")))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BookingError> {
        let res = request.send().await.map_err(transport_error)?;
        let status = res.status();
        if status.is_success() {
            return res
                .json()
                .await
                .map_err(|e| BookingError::Internal(format!("undecodable response: {e}")));
        }
        let err = match res.json::<ApiErrorBody>().await {
            Ok(body) if !is_transient_status(status) => BookingError::from_kind(&body.kind, body.error),
            _ => error_for_status(status),
        };
        tracing::debug!(%status, kind = err.kind(), "request rejected");
        Err(err)
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Fallback classification when the response carries no error body.
fn error_for_status(status: StatusCode) -> BookingError {
    let message = format!("server answered {status}");
    match status {
        s if is_transient_status(s) => BookingError::Transient(message),
        // an untyped 422 is a body the server could not parse
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            BookingError::Validation(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BookingError::UnauthorizedActor(message),
        StatusCode::NOT_FOUND => BookingError::NotFound(message),
        StatusCode::CONFLICT => BookingError::Conflict(message),
        _ => BookingError::Internal(message),
    }
}

fn transport_error(e: reqwest::Error) -> BookingError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        BookingError::Transient(e.to_string())
    } else {
        BookingError::Internal(e.to_string())
    }
}

#[async_trait]
impl BookingApi for RentalClient {
    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        self.send(self.client.get(self.url("bookings")?)).await
    }

    async fn get_booking(&self, id: &BookingId) -> Result<Booking, BookingError> {
        self.send(self.client.get(self.url(&format!("bookings/{id}"))?))
            .await
    }

    async fn create_booking(&self, request: &NewBooking) -> Result<Booking, BookingError> {
        self.send(self.client.post(self.url("bookings")?).json(request))
            .await
    }

    async fn confirm_booking(
        &self,
        id: &BookingId,
        expected_version: u64,
    ) -> Result<Booking, BookingError> {
        self.send(
            self.client
                .post(self.url(&format!("booking/confirm/{id}"))?)
                .json(&VersionedRequest { expected_version }),
        )
        .await
    }

    async fn complete_booking(
        &self,
        id: &BookingId,
        expected_version: u64,
    ) -> Result<Booking, BookingError> {
        self.send(
            self.client
                .post(self.url(&format!("booking/complete/{id}"))?)
                .json(&VersionedRequest { expected_version }),
        )
        .await
    }

    async fn cancel_booking(
        &self,
        id: &BookingId,
        request: &CancelRequest,
    ) -> Result<Booking, BookingError> {
        self.send(
            self.client
                .patch(self.url(&format!("booking/cancel/{id}"))?)
                .json(request),
        )
        .await
    }

    async fn modify_booking(
        &self,
        id: &BookingId,
        request: &ModifyRequest,
    ) -> Result<Booking, BookingError> {
        self.send(
            self.client
                .post(self.url(&format!("booking/modify/{id}"))?)
                .json(request),
        )
        .await
    }

    async fn submit_feedback(
        &self,
        id: &BookingId,
        draft: &FeedbackDraft,
    ) -> Result<Feedback, BookingError> {
        self.send(
            self.client
                .post(self.url(&format!("booking/feedback/{id}"))?)
                .json(draft),
        )
        .await
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, BookingError> {
        self.send(self.client.get(self.url("feedback")?)).await
    }
}

#[async_trait]
impl OrderApi for RentalClient {
    async fn list_orders(&self) -> Result<Vec<Order>, BookingError> {
        self.send(self.client.get(self.url("orders")?)).await
    }

    async fn create_order(&self, request: &NewOrder) -> Result<Order, BookingError> {
        self.send(self.client.post(self.url("orders")?).json(request))
            .await
    }

    async fn cancel_order(
        &self,
        id: &OrderId,
        request: &CancelRequest,
    ) -> Result<Order, BookingError> {
        self.send(
            self.client
                .patch(self.url(&format!("order/cancel/{id}"))?)
                .json(request),
        )
        .await
    }
}

impl RentalClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_bearer_token(self, token: impl AsRef<str>) -> anyhow::Result<Self> {
        self.with_header(AUTHORIZATION.as_str(), format!("Bearer {}", token.as_ref()))
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<RentalClient> {
        if let Some(client) = self.client {
            return Ok(RentalClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(RentalClient {
            base: self.base,
            client,
        })
    }
}
