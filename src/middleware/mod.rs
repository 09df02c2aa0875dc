//! Middleware pipeline wrapped around every routed request.
//!
//! - [`Middleware`] is implemented by every layer.
//! - [`Next`] is the cursor into the rest of the chain.
//! - [`MiddlewareHandler`] is the type-erased, cheaply cloneable form the
//!   router stores.
//! - [`LoggerMiddleware`] emits one structured event per request.
//!
//! The router appends the matched route's handler as the innermost layer, so
//! a chain that runs to completion always ends in a handler.

use std::{future::Future, pin::Pin, sync::Arc};

use tokio::time::Instant;
use tracing::info;

use crate::{Response, StatusCode, context::Context};

/// Boxed future returned by every layer of the pipeline.
pub type BoxResponse = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A type-erased, reference-counted middleware function.
pub type MiddlewareHandler = Arc<dyn Fn(Context, Next) -> BoxResponse + Send + Sync + 'static>;

/// Wraps a [`Middleware`] implementation into a [`MiddlewareHandler`].
///
/// ```rust
/// use std::sync::Arc;
/// use postboard::middleware::{LoggerMiddleware, from_middleware};
///
/// let handler = from_middleware(Arc::new(LoggerMiddleware));
/// ```
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// Cursor into the remaining middleware chain for one request.
///
/// Consumed by [`Next::run`], so each layer can forward at most once.
pub struct Next {
    chain: Vec<MiddlewareHandler>,
    index: usize,
}

impl Next {
    pub fn new(chain: Vec<MiddlewareHandler>) -> Self {
        Self { chain, index: 0 }
    }

    /// Invokes the next layer, or answers `500` if the chain is exhausted
    /// without any layer producing a response.
    pub async fn run(mut self, ctx: Context) -> Response {
        match self.chain.get(self.index).cloned() {
            Some(handler) => {
                self.index += 1;
                handler(ctx, self).await
            }
            None => Response::new(StatusCode::InternalServerError)
                .body("No response generated by middleware pipeline"),
        }
    }
}

/// A layer in the request pipeline.
///
/// A layer may pass through (`next.run(ctx).await`), short-circuit by
/// returning its own [`Response`], or decorate the downstream response.
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: Context, next: Next) -> BoxResponse;
}

/// Logs method, path, status and latency of every request at INFO.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> BoxResponse {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.request().method().to_string();
            let path = ctx.request().path().to_owned();

            let response = next.run(ctx).await;

            info!(
                %method,
                %path,
                status = response.status().as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "request completed"
            );
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Request;

    fn ctx() -> Context {
        let (req, _) = Request::parse(b"GET /x HTTP/1.1\r\n\r\n").unwrap();
        Context::new(req)
    }

    fn endpoint(status: StatusCode) -> MiddlewareHandler {
        Arc::new(move |_ctx: Context, _next: Next| -> BoxResponse {
            Box::pin(async move { Response::new(status) })
        })
    }

    struct Tag(&'static str);

    impl Middleware for Tag {
        fn handle(&self, ctx: Context, next: Next) -> BoxResponse {
            let tag = self.0;
            Box::pin(async move {
                let mut response = next.run(ctx).await;
                response.add_header("X-Layer", tag);
                response
            })
        }
    }

    #[tokio::test]
    async fn empty_chain_is_500() {
        let response = Next::new(vec![]).run(ctx()).await;
        assert_eq!(response.status(), StatusCode::InternalServerError);
    }

    #[tokio::test]
    async fn layers_run_outside_in() {
        let chain = vec![
            from_middleware(Arc::new(Tag("outer"))),
            from_middleware(Arc::new(Tag("inner"))),
            endpoint(StatusCode::Ok),
        ];
        let response = Next::new(chain).run(ctx()).await;
        assert_eq!(response.status(), StatusCode::Ok);
        // The inner layer decorates first.
        let layers: Vec<_> = response
            .headers()
            .iter()
            .filter(|(k, _)| *k == "X-Layer")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(layers, vec!["inner", "outer"]);
    }

    #[tokio::test]
    async fn logger_passes_response_through() {
        let chain = vec![
            from_middleware(Arc::new(LoggerMiddleware)),
            endpoint(StatusCode::NotFound),
        ];
        let response = Next::new(chain).run(ctx()).await;
        assert_eq!(response.status(), StatusCode::NotFound);
    }
}
