//! Request routing: map HTTP methods and URL patterns to handlers.
//!
//! Two pattern styles are supported:
//!
//! | Pattern       | Example match  | Captured params |
//! |---------------|----------------|-----------------|
//! | `/`           | `/`            | *(none)*        |
//! | `/tasks/:id`  | `/tasks/42`    | `id → "42"`     |
//!
//! Trailing slashes are normalized on both patterns and incoming paths.
//! Routes are tried in registration order and the first match wins. Every
//! request, matched or not, passes through the registered middleware.

use std::future::Future;
use std::sync::Arc;

use crate::context::{Context, PathParams};
use crate::http::IntoResponse;
use crate::middleware::{BoxResponse, Middleware, MiddlewareHandler, Next, from_middleware};
use crate::{Method, Request, Response, StatusCode};

/// Type-erased async handler.
pub type Handler = Arc<dyn Fn(Context) -> BoxResponse + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Implemented for every `Fn(Context) -> impl Future<Output = impl IntoResponse>`
/// that is `Send + Sync + 'static`.
pub trait IntoHandler: Send + Sync + 'static {
    fn call(&self, ctx: Context) -> BoxResponse;
}

impl<T, F, R> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, ctx: Context) -> BoxResponse {
        let fut = (self)(ctx);
        Box::pin(async move { fut.await.into_response() })
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Static(String),
    Parameter(String),
}

#[derive(Debug, Clone)]
enum Pattern {
    Exact(String),
    Parameterized { segments: Vec<Segment> },
}

fn trim_trailing_slash(path: &str) -> &str {
    if path != "/" {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

impl Pattern {
    /// A pattern containing `:` compiles to captures, anything else is an
    /// exact match.
    fn parse(pattern: &str) -> Self {
        let pattern = trim_trailing_slash(pattern);

        if !pattern.contains(':') {
            return Pattern::Exact(pattern.to_owned());
        }

        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Parameter(name.to_owned()),
                None => Segment::Static(s.to_owned()),
            })
            .collect();
        Pattern::Parameterized { segments }
    }

    fn matches(&self, path: &str) -> Option<PathParams> {
        let path = trim_trailing_slash(path);

        match self {
            Pattern::Exact(p) => (p == path).then(PathParams::new),
            Pattern::Parameterized { segments } => {
                let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
                if parts.len() != segments.len() {
                    return None;
                }

                let mut params = PathParams::new();
                for (segment, part) in segments.iter().zip(parts) {
                    match segment {
                        Segment::Static(s) if s != part => return None,
                        Segment::Static(_) => {}
                        Segment::Parameter(name) => params.insert(name.clone(), part.to_owned()),
                    }
                }
                Some(params)
            }
        }
    }
}

struct Route {
    method: Method,
    pattern: Pattern,
    handler: Handler,
}

impl Route {
    fn matches(&self, method: &Method, path: &str) -> Option<PathParams> {
        if &self.method == method {
            self.pattern.matches(path)
        } else {
            None
        }
    }
}

/// Dispatches requests to registered handlers through the middleware chain.
///
/// ```rust
/// use postboard::{Response, Router, context::Context};
///
/// let mut router = Router::new();
/// router.get("/ping", |_ctx: Context| async { Response::html("pong") });
/// assert_eq!(router.len(), 1);
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    middleware: Vec<MiddlewareHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Get, path, handler);
    }

    pub fn post(&mut self, path: &str, handler: impl IntoHandler) {
        self.add_route(Method::Post, path, handler);
    }

    /// Appends a middleware layer. Layers added first run outermost.
    pub fn layer<M>(&mut self, middleware: M)
    where
        M: Middleware + 'static,
    {
        self.middleware.push(from_middleware(Arc::new(middleware)));
    }

    fn add_route(&mut self, method: Method, path: &str, handler: impl IntoHandler) {
        let handler: Handler = Arc::new(move |ctx| handler.call(ctx));
        self.routes.push(Route {
            method,
            pattern: Pattern::parse(path),
            handler,
        });
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Runs `request` through the middleware chain into the first matching
    /// route, or into a `404 Not Found` endpoint when nothing matches.
    pub async fn route(&self, request: Request) -> Response {
        let matched = self
            .routes
            .iter()
            .find_map(|route| {
                route
                    .matches(request.method(), request.path())
                    .map(|params| (Arc::clone(&route.handler), params))
            });

        let (endpoint, ctx) = match matched {
            Some((handler, params)) => {
                let endpoint: MiddlewareHandler =
                    Arc::new(move |ctx: Context, _next: Next| handler(ctx));
                (endpoint, Context::with_params(request, params))
            }
            None => {
                let endpoint: MiddlewareHandler =
                    Arc::new(|_ctx: Context, _next: Next| -> BoxResponse {
                        Box::pin(async { Response::new(StatusCode::NotFound) })
                    });
                (endpoint, Context::new(request))
            }
        };

        let mut chain = self.middleware.clone();
        chain.push(endpoint);
        Next::new(chain).run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(method: &str, path: &str) -> Request {
        let raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        req
    }

    #[test]
    fn pattern_parse_root() {
        assert!(matches!(Pattern::parse("/"), Pattern::Exact(s) if s == "/"));
    }

    #[test]
    fn pattern_parse_trailing_slash_stripped() {
        assert!(matches!(Pattern::parse("/posts/"), Pattern::Exact(s) if s == "/posts"));
    }

    #[test]
    fn pattern_parse_parameterized() {
        match Pattern::parse("/tasks/:id") {
            Pattern::Parameterized { segments } => {
                assert_eq!(segments.len(), 2);
                assert!(matches!(&segments[0], Segment::Static(s) if s == "tasks"));
                assert!(matches!(&segments[1], Segment::Parameter(s) if s == "id"));
            }
            other => panic!("expected Parameterized, got {other:?}"),
        }
    }

    #[test]
    fn exact_match() {
        let pat = Pattern::parse("/");
        assert!(pat.matches("/").is_some());
        assert!(pat.matches("/other").is_none());

        let pat = Pattern::parse("/posts");
        assert!(pat.matches("/posts/").is_some());
    }

    #[test]
    fn param_extracts_value() {
        let pat = Pattern::parse("/tasks/:id");
        let params = pat.matches("/tasks/abc-123").unwrap();
        assert_eq!(params.get("id"), Some("abc-123"));
    }

    #[test]
    fn param_wrong_shape() {
        let pat = Pattern::parse("/tasks/:id");
        assert!(pat.matches("/tasks").is_none());
        assert!(pat.matches("/tasks/1/extra").is_none());
        assert!(pat.matches("/posts/1").is_none());
    }

    #[test]
    fn router_starts_empty() {
        assert!(Router::new().is_empty());
    }

    #[tokio::test]
    async fn unmatched_is_404() {
        let mut router = Router::new();
        router.get("/", |_ctx: Context| async { Response::html("home") });
        let res = router.route(make_request("GET", "/nowhere")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn method_must_match() {
        let mut router = Router::new();
        router.get("/", |_ctx: Context| async { Response::html("home") });
        let res = router.route(make_request("POST", "/")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn first_matching_route_wins() {
        let mut router = Router::new();
        router.get("/p", |_ctx: Context| async { Response::new(StatusCode::Ok) });
        router.get("/p", |_ctx: Context| async { Response::new(StatusCode::NoContent) });
        let res = router.route(make_request("GET", "/p")).await;
        assert_eq!(res.status(), StatusCode::Ok);
    }

    #[tokio::test]
    async fn handler_sees_params() {
        let mut router = Router::new();
        router.get("/tasks/:id", |ctx: Context| async move {
            let id = ctx.params().get("id").unwrap_or_default().to_owned();
            Response::new(StatusCode::Ok).body(id)
        });
        let res = router.route(make_request("GET", "/tasks/42")).await;
        assert_eq!(res.body_ref(), b"42");
    }

    #[tokio::test]
    async fn handler_error_is_500() {
        let mut router = Router::new();
        router.post("/boom", |_ctx: Context| async {
            Err::<Response, _>(std::io::Error::other("boom"))
        });
        let res = router.route(make_request("POST", "/boom")).await;
        assert_eq!(res.status(), StatusCode::InternalServerError);
    }

    struct Stamp;

    impl Middleware for Stamp {
        fn handle(&self, ctx: Context, next: Next) -> BoxResponse {
            Box::pin(async move {
                let mut res = next.run(ctx).await;
                res.add_header("X-Stamp", "1");
                res
            })
        }
    }

    #[tokio::test]
    async fn middleware_wraps_matched_and_unmatched() {
        let mut router = Router::new();
        router.layer(Stamp);
        router.get("/", |_ctx: Context| async { Response::html("home") });

        let hit = router.route(make_request("GET", "/")).await;
        assert_eq!(hit.headers().get("x-stamp"), Some("1"));

        let miss = router.route(make_request("GET", "/missing")).await;
        assert_eq!(miss.status(), StatusCode::NotFound);
        assert_eq!(miss.headers().get("x-stamp"), Some("1"));
    }
}
