use axum::http::HeaderValue;
use axum::{
    routing::{get, patch, post},
    serve, Router,
};
use rental_types::ports::repository::RentalRepository;
use rental_types::ports::session::SessionDirectory;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::handlers;
use crate::application::booking_service::BookingService;
use crate::application::order_service::OrderService;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
    pub cors_allow_origin: Option<String>,
}

pub struct AppState<R: RentalRepository> {
    pub bookings: BookingService<R>,
    pub orders: OrderService<R>,
    pub sessions: Arc<dyn SessionDirectory>,
}

impl<R: RentalRepository> AppState<R> {
    pub fn new(repo: R, sessions: Arc<dyn SessionDirectory>) -> Self {
        let repo = Arc::new(repo);
        Self {
            bookings: BookingService::new(repo.clone()),
            orders: OrderService::new(repo),
            sessions,
        }
    }
}

#[derive(Clone)]
pub struct HttpServer<R: RentalRepository> {
    pub state: Arc<AppState<R>>,
    pub config: HttpServerConfig,
}

impl<R: RentalRepository> HttpServer<R> {
    pub async fn new(state: AppState<R>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(state),
            config,
        })
    }

    pub fn router(&self) -> anyhow::Result<Router> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let app = Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/bookings",
                get(handlers::list_bookings::<R>).post(handlers::create_booking::<R>),
            )
            .route("/bookings/{id}", get(handlers::get_booking::<R>))
            .route("/booking/confirm/{id}", post(handlers::confirm_booking::<R>))
            .route("/booking/complete/{id}", post(handlers::complete_booking::<R>))
            .route("/booking/cancel/{id}", patch(handlers::cancel_booking::<R>))
            .route("/booking/modify/{id}", post(handlers::modify_booking::<R>))
            .route("/booking/feedback/{id}", post(handlers::submit_feedback::<R>))
            .route("/feedback", get(handlers::list_feedback::<R>))
            .route(
                "/orders",
                get(handlers::list_orders::<R>).post(handlers::create_order::<R>),
            )
            .route("/order/cancel/{id}", patch(handlers::cancel_order::<R>))
            .layer(trace_layer)
            .with_state(self.state.clone());

        let app = match &self.config.cors_allow_origin {
            Some(origin) => app.layer(
                CorsLayer::new()
                    .allow_origin(origin.parse::<HeaderValue>()?)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
            None => app,
        };
        Ok(app)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router()?;
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}
