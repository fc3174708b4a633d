use log::debug;

use crate::handlers::{
    pattern::{RouteParams, RoutePattern},
    utils::{
        build_method_not_allowed_response, build_not_found_response, build_status_code_response,
    },
    HttpResponse, Request, RouteHandler,
};

pub struct Route {
    method: http::Method,
    pattern: RoutePattern,
    handler: Box<dyn RouteHandler>,
}

impl Route {
    pub fn new(
        method: http::Method,
        pattern: &str,
        handler: Box<dyn RouteHandler>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            method,
            pattern: RoutePattern::parse(pattern)?,
            handler,
        })
    }
}

pub enum Dispatch<'a> {
    Found {
        handler: &'a dyn RouteHandler,
        params: RouteParams,
    },
    NotFound,
    MethodNotAllowed(Vec<http::Method>),
}

/// Fixed routing table built once at startup.
///
/// For a given method, routes without placeholders are tried before pattern
/// routes; within each group the first registered match wins.
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new(routes: Vec<Route>) -> anyhow::Result<Self> {
        for (index, route) in routes.iter().enumerate() {
            if routes[..index].iter().any(|earlier| {
                earlier.method == route.method
                    && earlier.pattern.source() == route.pattern.source()
            }) {
                anyhow::bail!(
                    "Router::new error: collision in router route '{} {}'",
                    route.method,
                    route.pattern
                );
            }
        }
        Ok(Self { routes })
    }

    fn find(&self, method: &http::Method, path: &str) -> Option<Dispatch<'_>> {
        let for_method = || self.routes.iter().filter(move |route| route.method == *method);

        for_method()
            .filter(|route| route.pattern.is_static())
            .chain(for_method().filter(|route| !route.pattern.is_static()))
            .find_map(|route| {
                route.pattern.captures(path).map(|params| Dispatch::Found {
                    handler: route.handler.as_ref(),
                    params,
                })
            })
    }

    pub fn resolve(&self, method: &http::Method, path: &str) -> Dispatch<'_> {
        if let Some(found) = self.find(method, path) {
            return found;
        }

        if *method == http::Method::HEAD {
            if let Some(found) = self.find(&http::Method::GET, path) {
                return found;
            }
        }

        let mut allowed_methods: Vec<http::Method> = Vec::new();
        for route in &self.routes {
            if !allowed_methods.contains(&route.method) && route.pattern.captures(path).is_some() {
                allowed_methods.push(route.method.clone());
            }
        }

        if allowed_methods.is_empty() {
            Dispatch::NotFound
        } else {
            Dispatch::MethodNotAllowed(allowed_methods)
        }
    }

    pub async fn dispatch(&self, request: &Request) -> HttpResponse {
        let method = match http::Method::from_bytes(request.method().as_bytes()) {
            Ok(method) => method,
            Err(_) => return build_status_code_response(http::StatusCode::BAD_REQUEST),
        };

        let path = request.path();

        let response = match self.resolve(&method, &path) {
            Dispatch::Found { handler, params } => handler.handle(request, params).await,
            Dispatch::NotFound => build_not_found_response(),
            Dispatch::MethodNotAllowed(allowed_methods) => {
                build_method_not_allowed_response(&allowed_methods)
            }
        };

        debug!(
            "request_id {} {} {} -> {}",
            request.request_id(),
            method,
            path,
            response.status()
        );

        response
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use async_trait::async_trait;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::handlers::utils::build_text_response;

    #[derive(Default)]
    struct Recorder {
        calls: AtomicUsize,
        last_params: Mutex<Vec<(String, String)>>,
    }

    struct RecordingHandler {
        name: &'static str,
        recorder: Arc<Recorder>,
    }

    #[async_trait]
    impl RouteHandler for RecordingHandler {
        async fn handle(&self, _request: &Request, params: RouteParams) -> HttpResponse {
            self.recorder.calls.fetch_add(1, Ordering::SeqCst);
            *self.recorder.last_params.lock().unwrap() = params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            build_text_response(http::StatusCode::OK, self.name.to_string())
        }
    }

    fn route(
        method: http::Method,
        pattern: &str,
        name: &'static str,
        recorder: &Arc<Recorder>,
    ) -> Route {
        Route::new(
            method,
            pattern,
            Box::new(RecordingHandler {
                name,
                recorder: Arc::clone(recorder),
            }),
        )
        .unwrap()
    }

    fn test_router(recorder: &Arc<Recorder>) -> Router {
        Router::new(vec![
            route(http::Method::GET, "/", "home", recorder),
            route(http::Method::GET, r"/articles/{id:\d+}[/{title}]", "article", recorder),
            route(http::Method::GET, "/articles/latest", "latest", recorder),
            route(http::Method::POST, "/login", "login-post", recorder),
            route(http::Method::PUT, "/login", "login-put", recorder),
        ])
        .unwrap()
    }

    async fn dispatch(router: &Router, method: &str, uri: &str) -> HttpResponse {
        router.dispatch(&Request::new(method, uri)).await
    }

    #[tokio::test]
    async fn root_dispatches_to_home_once_without_params() {
        let recorder = Arc::new(Recorder::default());
        let router = test_router(&recorder);

        let response = dispatch(&router, "GET", "/").await;

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.body().as_deref(), Some("home"));
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
        assert!(recorder.last_params.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found_for_every_method() {
        let recorder = Arc::new(Recorder::default());
        let router = test_router(&recorder);

        for method in ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "HEAD"] {
            let response = dispatch(&router, method, "/nope").await;

            assert_eq!(response.status(), http::StatusCode::NOT_FOUND, "{}", method);
            assert_eq!(response.body().as_deref(), Some("404 Not Found"));
        }
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_method_lists_allowed_in_registration_order() {
        let recorder = Arc::new(Recorder::default());
        let router = test_router(&recorder);

        let response = dispatch(&router, "DELETE", "/login").await;
        assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.body().as_deref(),
            Some("405 Method Not Allowed. Allowed methods: POST, PUT")
        );

        let response = dispatch(&router, "POST", "/").await;
        assert_eq!(
            response.body().as_deref(),
            Some("405 Method Not Allowed. Allowed methods: GET")
        );
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn captures_params_in_declaration_order() {
        let recorder = Arc::new(Recorder::default());
        let router = test_router(&recorder);

        let response = dispatch(&router, "GET", "/articles/12/hello%20world?ref=home").await;

        assert_eq!(response.body().as_deref(), Some("article"));
        assert_eq!(
            *recorder.last_params.lock().unwrap(),
            vec![
                ("id".to_string(), "12".to_string()),
                ("title".to_string(), "hello world".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn static_routes_win_over_patterns() {
        let recorder = Arc::new(Recorder::default());
        let router = test_router(&recorder);

        let response = dispatch(&router, "GET", "/articles/latest").await;
        assert_eq!(response.body().as_deref(), Some("latest"));

        let response = dispatch(&router, "GET", "/articles/abc").await;
        assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn query_string_is_ignored_for_matching() {
        let recorder = Arc::new(Recorder::default());
        let router = test_router(&recorder);

        let response = dispatch(&router, "GET", "/?utm_source=feed").await;

        assert_eq!(response.body().as_deref(), Some("home"));
    }

    #[tokio::test]
    async fn head_falls_back_to_get() {
        let recorder = Arc::new(Recorder::default());
        let router = test_router(&recorder);

        let response = dispatch(&router, "HEAD", "/").await;

        assert_eq!(response.body().as_deref(), Some("home"));
    }

    #[tokio::test]
    async fn malformed_method_is_bad_request() {
        let recorder = Arc::new(Recorder::default());
        let router = test_router(&recorder);

        let response = dispatch(&router, "G E T", "/").await;

        assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn duplicate_routes_are_rejected() {
        let recorder = Arc::new(Recorder::default());

        let result = Router::new(vec![
            route(http::Method::GET, "/", "a", &recorder),
            route(http::Method::GET, "/", "b", &recorder),
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn invalid_pattern_fails_route_creation() {
        let recorder = Arc::new(Recorder::default());

        let result = Route::new(
            http::Method::GET,
            "/users/{id",
            Box::new(RecordingHandler {
                name: "users",
                recorder,
            }),
        );

        assert!(result.is_err());
    }
}
