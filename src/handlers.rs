mod home;
pub mod pattern;
pub mod route;
mod utils;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{request::Request, response::HttpResponse, site::Site};

use self::{
    pattern::RouteParams,
    route::{Route, Router},
};

/// Handles requests for one registered (method, pattern) pair.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, request: &Request, params: RouteParams) -> HttpResponse;
}

pub fn create_router(site: Arc<Site>) -> anyhow::Result<Arc<Router>> {
    let mut routes: Vec<Route> = Vec::new();

    routes.append(&mut home::create_routes(&site)?);

    Ok(Arc::new(Router::new(routes)?))
}
