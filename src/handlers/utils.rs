use log::warn;

use crate::{
    controller::{ActionResult, Outcome},
    response::HttpResponse,
};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

pub fn build_status_code_response(status_code: http::StatusCode) -> HttpResponse {
    let mut response = HttpResponse::new(None);
    *response.status_mut() = status_code;
    response
}

pub fn build_text_response(status_code: http::StatusCode, text: String) -> HttpResponse {
    let mut response = HttpResponse::new(Some(text));
    *response.status_mut() = status_code;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static(TEXT_PLAIN),
    );
    response
}

pub fn build_html_response(html: String) -> HttpResponse {
    let mut response = HttpResponse::new(Some(html));
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static(TEXT_HTML),
    );
    response
}

pub fn build_not_found_response() -> HttpResponse {
    build_text_response(http::StatusCode::NOT_FOUND, "404 Not Found".to_string())
}

pub fn build_internal_error_response() -> HttpResponse {
    build_text_response(
        http::StatusCode::INTERNAL_SERVER_ERROR,
        "500 Internal Server Error".to_string(),
    )
}

pub fn build_method_not_allowed_response(allowed_methods: &[http::Method]) -> HttpResponse {
    let allowed = allowed_methods
        .iter()
        .map(http::Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut response = build_text_response(
        http::StatusCode::METHOD_NOT_ALLOWED,
        format!("405 Method Not Allowed. Allowed methods: {}", allowed),
    );

    match http::HeaderValue::from_str(&allowed) {
        Ok(value) => {
            response.headers_mut().insert(http::header::ALLOW, value);
        }
        Err(err) => warn!("invalid allow header '{}': {}", allowed, err),
    }

    response
}

pub fn build_redirect_response(location: &str) -> HttpResponse {
    match http::HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = build_status_code_response(http::StatusCode::FOUND);
            response.headers_mut().insert(http::header::LOCATION, value);
            response
        }
        Err(err) => {
            warn!("invalid redirect location '{}': {}", location, err);
            build_internal_error_response()
        }
    }
}

/// Turns the result of a controller action into the response to send.
pub fn build_action_response(action_result: ActionResult) -> HttpResponse {
    match action_result {
        Ok(Outcome::Page(html)) => build_html_response(html),
        Ok(Outcome::Redirect(location)) => build_redirect_response(&location),
        Err(err) => {
            warn!("controller action failed: {}", err);
            build_internal_error_response()
        }
    }
}
