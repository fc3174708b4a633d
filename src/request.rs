use std::{borrow::Cow, collections::BTreeMap, io::Read};

use getset::Getters;

use log::warn;

use tokio::io::AsyncWrite;

use crate::connection::{ConnectionID, RequestID};

pub type FormFields = BTreeMap<String, String>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Read-only snapshot of one incoming request.
#[derive(Debug, Clone, Default, Getters)]
#[getset(get = "pub")]
pub struct Request {
    request_id: RequestID,
    method: String,
    uri: String,
    host: String,
    redirect_url: Option<String>,
    query: FormFields,
    form: FormFields,
}

impl Request {
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let query = parse_form_urlencoded(query_string(&uri));

        Self {
            method: method.into(),
            uri,
            query,
            ..Default::default()
        }
    }

    pub fn from_fastcgi<W: AsyncWrite + Unpin>(
        connection_id: ConnectionID,
        request: &tokio_fastcgi::Request<W>,
    ) -> Self {
        let uri = request.get_str_param("request_uri").unwrap_or("/");

        let query = match request.get_str_param("query_string") {
            Some(raw_query) => parse_form_urlencoded(raw_query),
            None => parse_form_urlencoded(query_string(uri)),
        };

        let is_form_post = request
            .get_str_param("content_type")
            .map(|content_type| content_type.starts_with(FORM_CONTENT_TYPE))
            .unwrap_or(false);

        let form = if is_form_post {
            let mut body = Vec::new();
            let mut stdin = request.get_stdin();
            match stdin.read_to_end(&mut body) {
                Ok(_) => parse_form_urlencoded(&String::from_utf8_lossy(&body)),
                Err(err) => {
                    warn!("error reading request body: {}", err);
                    FormFields::new()
                }
            }
        } else {
            FormFields::new()
        };

        Self {
            request_id: RequestID::new(connection_id, request.get_request_id()),
            method: request
                .get_str_param("request_method")
                .unwrap_or("GET")
                .to_ascii_uppercase(),
            uri: uri.to_string(),
            host: request.get_str_param("http_host").unwrap_or_default().to_string(),
            redirect_url: request.get_str_param("redirect_url").map(String::from),
            query,
            form,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.redirect_url = Some(redirect_url.into());
        self
    }

    pub fn with_form_body(mut self, body: &str) -> Self {
        self.form = parse_form_urlencoded(body);
        self
    }

    /// The percent-decoded path with the query string removed.
    pub fn path(&self) -> Cow<'_, str> {
        decode_path(strip_query_string(&self.uri))
    }
}

/// Everything before the first `?`.
pub fn strip_query_string(uri: &str) -> &str {
    match uri.split_once('?') {
        Some((path, _)) => path,
        None => uri,
    }
}

fn query_string(uri: &str) -> &str {
    match uri.split_once('?') {
        Some((_, query)) => query,
        None => "",
    }
}

/// Percent-decodes a path; `+` is left alone. Paths that do not decode to
/// UTF-8 are returned as-is.
pub fn decode_path(path: &str) -> Cow<'_, str> {
    urlencoding::decode(path).unwrap_or(Cow::Borrowed(path))
}

fn decode_form_component(component: &str) -> String {
    let component = component.replace('+', " ");
    match urlencoding::decode(&component) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => component,
    }
}

pub fn parse_form_urlencoded(input: &str) -> FormFields {
    let mut fields = FormFields::new();

    for pair in input.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, value),
            None => (pair, ""),
        };
        fields.insert(decode_form_component(key), decode_form_component(value));
    }

    fields
}
