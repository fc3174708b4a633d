use std::{fmt::Write, sync::Arc};

use log::{debug, warn};

use tokio::io::AsyncWrite;

use tokio_fastcgi::{Request, RequestResult};

use crate::{connection::RequestID, response::HttpResponse};

#[derive(thiserror::Error, Debug)]
enum SendResponseError {
    #[error("build header string error: {0}")]
    BuildHeaderStringError(#[from] std::fmt::Error),

    #[error("tokio_fastcgi write error: {0}")]
    TokioFastCGIWriteError(#[from] tokio_fastcgi::Error),
}

/// Writes an [`HttpResponse`] back to the web server as CGI output.
pub struct Responder<W>
where
    W: AsyncWrite + Unpin,
{
    request_id: RequestID,
    request: Arc<Request<W>>,
    response: HttpResponse,
}

impl<W> Responder<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(request_id: RequestID, request: Arc<Request<W>>, response: HttpResponse) -> Self {
        Self {
            request_id,
            request,
            response,
        }
    }

    async fn internal_send_response(self) -> Result<(), SendResponseError> {
        let mut stdout = self.request.get_stdout();

        let header_string = build_header_string(&self.response)?;

        stdout.write(&header_string.into_bytes()).await?;

        if let Some(body_string) = self.response.into_body() {
            stdout.write(&body_string.into_bytes()).await?;
        }

        Ok(())
    }

    pub async fn respond(self) -> RequestResult {
        debug!(
            "respond request_id = {} status = {}",
            self.request_id,
            self.response.status()
        );

        let request_id = self.request_id;

        match self.internal_send_response().await {
            Ok(_) => RequestResult::Complete(0),
            Err(err) => {
                warn!("request_id {} send response failed: {}", request_id, err);
                RequestResult::Complete(1)
            }
        }
    }
}

fn build_header_string(response: &HttpResponse) -> Result<String, std::fmt::Error> {
    let mut header_string = String::new();

    write!(
        header_string,
        "Status: {} {}\n",
        response.status().as_u16(),
        response.status().canonical_reason().unwrap_or("[Unknown]")
    )?;

    for (key, value) in response.headers() {
        write!(
            header_string,
            "{}: {}\n",
            key.as_str(),
            value.to_str().unwrap_or("[Unknown]")
        )?;
    }

    header_string.push('\n');

    Ok(header_string)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn header_string_has_status_line_headers_and_blank_line() {
        let mut response = HttpResponse::new(Some("moved".to_string()));
        *response.status_mut() = http::StatusCode::FOUND;
        response.headers_mut().insert(
            http::header::LOCATION,
            http::HeaderValue::from_static("/login"),
        );

        let header_string = build_header_string(&response).unwrap();

        assert_eq!(header_string, "Status: 302 Found\nlocation: /login\n\n");
    }
}
