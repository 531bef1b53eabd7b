//! Request correlation.
//!
//! [`CorrelationLayer`] assigns every request a [`CorrelationId`]: the
//! client's `X-Correlation-ID` when it parses as a UUID, a fresh one
//! otherwise. Handlers read it from request extensions, the request runs
//! inside an `http_request` span carrying it, and the response echoes it.

use crate::extractors::CorrelationId;
use axum::{extract::Request, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;

/// Request and response header carrying the correlation id.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// The correlation layer installed by the router.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationLayer {
    CorrelationLayer
}

/// Wraps a service in [`Correlated`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationLayer;

impl<S> Layer<S> for CorrelationLayer {
    type Service = Correlated<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Correlated { inner }
    }
}

/// Service that tags requests and responses with a correlation id.
#[derive(Clone, Debug)]
pub struct Correlated<S> {
    inner: S,
}

type CorrelatedFuture<E> = Pin<Box<dyn Future<Output = Result<Response, E>> + Send>>;

impl<S> Service<Request> for Correlated<S>
where
    S: Service<Request, Response = Response>,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = CorrelatedFuture<S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        let id = CorrelationId::from_headers(request.headers());
        let span = tracing::info_span!(
            "http_request",
            correlation_id = %id,
            method = %request.method(),
            uri = %request.uri(),
        );
        request.extensions_mut().insert(id);

        let handled = self.inner.call(request).instrument(span);
        Box::pin(async move {
            let mut response = handled.await?;
            if let Some(value) = id.header_value() {
                response.headers_mut().insert(CORRELATION_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        Router::new()
            .route("/echo", get(|id: CorrelationId| async move { id.to_string() }))
            .layer(correlation_id_layer())
    }

    async fn send(header: Option<&str>) -> (String, String) {
        let mut request = Request::builder().uri("/echo");
        if let Some(value) = header {
            request = request.header(CORRELATION_ID_HEADER, value);
        }
        let response = app()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let echoed = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("response carries the correlation id")
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (echoed, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_client_id_reaches_handler_and_response() {
        let sent = Uuid::new_v4().to_string();
        let (echoed, seen_by_handler) = send(Some(&sent)).await;
        assert_eq!(echoed, sent);
        assert_eq!(seen_by_handler, sent);
    }

    #[tokio::test]
    async fn test_missing_or_garbled_id_is_replaced() {
        for header in [None, Some("not-a-uuid"), Some("")] {
            let (echoed, seen_by_handler) = send(header).await;
            assert!(Uuid::parse_str(&echoed).is_ok(), "{header:?}");
            assert_eq!(echoed, seen_by_handler);
        }
    }
}
