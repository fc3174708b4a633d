use std::sync::Arc;

use log::{debug, warn};

use tokio::io::{AsyncRead, AsyncWrite};

use tokio_fastcgi::{Request, Requests};

use crate::{
    connection::ConnectionID, handlers::route::Router, request::Request as SiteRequest,
    response::responder::Responder,
};

/// Reads FastCGI requests from one web server connection and dispatches
/// each on its own task.
pub struct ConnectionProcessor {
    connection_id: ConnectionID,
    router: Arc<Router>,
    fastcgi_connection_configuration: crate::config::FastCGIConnectionConfiguration,
}

impl ConnectionProcessor {
    pub fn new(
        connection_id: ConnectionID,
        router: Arc<Router>,
        fastcgi_connection_configuration: &crate::config::FastCGIConnectionConfiguration,
    ) -> Arc<Self> {
        Arc::new(Self {
            connection_id,
            router,
            fastcgi_connection_configuration: fastcgi_connection_configuration.clone(),
        })
    }

    async fn process_one_request<W>(self: Arc<Self>, request: Request<W>)
    where
        W: AsyncWrite + Unpin + Send + Sync + 'static,
    {
        let connection_id = self.connection_id;

        if let Err(err) = request
            .process(|request| async move {
                let site_request = SiteRequest::from_fastcgi(connection_id, request.as_ref());

                let http_response = self.router.dispatch(&site_request).await;

                Responder::new(*site_request.request_id(), request, http_response)
                    .respond()
                    .await
            })
            .await
        {
            // This is the error handler that is called if the process call returns an error.
            warn!(
                "connection_id {} request.process failed: err = {}",
                connection_id, err
            );
        }
    }

    pub fn start<R, W>(self: Arc<Self>, split_socket: (R, W))
    where
        R: AsyncRead + Unpin + Send + Sync + 'static,
        W: AsyncWrite + Unpin + Send + Sync + 'static,
    {
        // Spawn a task that collects the requests the web server sends over
        // this connection.
        tokio::spawn(async move {
            let mut requests = Requests::from_split_socket(
                split_socket,
                *self
                    .fastcgi_connection_configuration
                    .max_concurrent_connections(),
                *self
                    .fastcgi_connection_configuration
                    .max_requests_per_connection(),
            );

            // Spawn a new task to process each request.
            while let Ok(Some(request)) = requests.next().await {
                tokio::spawn(Arc::clone(&self).process_one_request(request));
            }

            debug!("connection_id {} closed", self.connection_id);
        });
    }
}
