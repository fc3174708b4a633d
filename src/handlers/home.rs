use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    controller::{ActionResult, Controller},
    handlers::{
        pattern::RouteParams,
        route::Route,
        utils::build_action_response,
        HttpResponse, Request, RouteHandler,
    },
    site::Site,
    view::ViewVariables,
};

struct HomeController<'a> {
    base: Controller<'a>,
}

impl<'a> HomeController<'a> {
    fn new(base: Controller<'a>) -> Self {
        Self { base }
    }

    fn home(mut self) -> ActionResult {
        self.base.set_page_title("Home");

        let mut variables = ViewVariables::new();
        variables.insert(
            "is_index".to_string(),
            self.base.is_index_page().to_string(),
        );

        self.base.view("home", variables)
    }
}

struct HomeHandler {
    site: Arc<Site>,
}

#[async_trait]
impl RouteHandler for HomeHandler {
    async fn handle(&self, request: &Request, _params: RouteParams) -> HttpResponse {
        let controller = HomeController::new(Controller::new(&self.site, request));

        build_action_response(controller.home())
    }
}

pub fn create_routes(site: &Arc<Site>) -> anyhow::Result<Vec<Route>> {
    Ok(vec![Route::new(
        http::Method::GET,
        "/",
        Box::new(HomeHandler {
            site: Arc::clone(site),
        }),
    )?])
}
