pub mod assets;
pub mod escape;
pub mod password;
pub mod time_since;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::{
    request::{FormFields, Request},
    site::Site,
    view::{self, ViewError, ViewRenderer, ViewVariables},
};

use self::{
    assets::AssetUrls,
    password::PasswordError,
    time_since::TimeSinceError,
    validation::{ErrorCode, ValidationErrors},
};

/// What a controller action asks the dispatch layer to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Page(String),
    Redirect(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ControllerError {
    #[error("view error: {0}")]
    View(#[from] ViewError),

    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    #[error("time since error: {0}")]
    TimeSince(#[from] TimeSinceError),

    #[error("account lookup error: {0}")]
    AccountLookup(#[source] anyhow::Error),
}

pub type ActionResult = Result<Outcome, ControllerError>;

/// Per-request helper surface shared by every page controller. A new one is
/// built for each dispatched request and dropped with it.
pub struct Controller<'a> {
    site: &'a Site,
    request: &'a Request,
    assets: AssetUrls,
    page_title: Option<String>,
    error_list: String,
}

impl<'a> Controller<'a> {
    pub fn new(site: &'a Site, request: &'a Request) -> Self {
        Self {
            site,
            request,
            assets: AssetUrls::new(site.protocol(), request.host()),
            page_title: None,
            error_list: String::new(),
        }
    }

    pub fn site(&self) -> &Site {
        self.site
    }

    pub fn request(&self) -> &Request {
        self.request
    }

    pub fn brand(&self) -> &str {
        self.site.site_name()
    }

    pub fn page_title(&self) -> Option<&str> {
        self.page_title.as_deref()
    }

    pub fn set_page_title(&mut self, page_title: impl Into<String>) {
        self.page_title = Some(page_title.into());
    }

    // Request input

    pub fn filtered_post(&self) -> FormFields {
        sanitize_fields(self.request.form())
    }

    pub fn filtered_get(&self) -> FormFields {
        sanitize_fields(self.request.query())
    }

    pub fn current_path(&self) -> String {
        self.request.path().trim_matches('/').to_string()
    }

    pub fn current_method(&self) -> &str {
        self.request.method()
    }

    pub fn is_valid_object_id(&self, id: &str) -> bool {
        validation::is_valid_object_id(id)
    }

    pub fn escape(&self, html: &str) -> String {
        escape::escape(html).into_owned()
    }

    // Assets

    pub fn script_url(&self, filename: &str) -> String {
        self.assets.script_url(filename)
    }

    pub fn stylesheet_url(&self, filename: &str) -> String {
        self.assets.stylesheet_url(filename)
    }

    pub fn image_url(&self, filename: &str) -> String {
        self.assets.image_url(filename)
    }

    pub fn icon_url(&self, filename: &str) -> String {
        self.assets.icon_url(filename)
    }

    // Views

    fn renderer(&self) -> ViewRenderer<'_> {
        ViewRenderer::new(self.site.views_directory(), &self.assets)
    }

    /// Variables every template can use. Caller-supplied variables with the
    /// same name take precedence.
    fn common_variables(&self) -> ViewVariables {
        let mut variables = ViewVariables::new();
        let site_name = self.brand().to_string();

        let title = match &self.page_title {
            Some(page_title) => format!("{} \u{2013} {}", page_title, site_name),
            None => site_name.clone(),
        };

        variables.insert("title".to_string(), title);
        variables.insert(
            "page_title".to_string(),
            self.page_title.clone().unwrap_or_default(),
        );
        variables.insert("site_name".to_string(), site_name);
        variables.insert("current_path".to_string(), self.current_path());
        variables
    }

    pub fn render_view(&self, path: &Path, variables: ViewVariables) -> Result<String, ViewError> {
        let mut all_variables = self.common_variables();
        all_variables.extend(variables);

        self.renderer().render_file(path, &all_variables)
    }

    pub fn view(&self, name: &str, variables: ViewVariables) -> ActionResult {
        let path = view::view_path(self.site.views_directory(), name);

        Ok(Outcome::Page(self.render_view(&path, variables)?))
    }

    pub fn component(&self, name: &str) -> PathBuf {
        view::component_path(self.site.views_directory(), name)
    }

    pub fn email_body_component(&self, name: &str) -> PathBuf {
        view::email_component_path(self.site.views_directory(), name)
    }

    pub fn partial(&self, name: &str) -> Result<String, ViewError> {
        let path = view::partial_path(self.site.views_directory(), name);

        self.render_view(&path, ViewVariables::new())
    }

    // Page identity

    fn current_page(&self) -> String {
        match self.request.redirect_url() {
            Some(redirect_url) => redirect_url.trim_start_matches('/').to_string(),
            None => self.current_path(),
        }
    }

    pub fn is_index_page(&self) -> bool {
        self.current_page().is_empty()
    }

    pub fn is_current_page(&self, name: &str) -> bool {
        self.current_page() == name.to_lowercase()
    }

    /// Location is always site-relative: leading `/` and `\` are dropped so
    /// the result can never be read as `//host`.
    pub fn redirect(&self, target: &str) -> Outcome {
        Outcome::Redirect(format!(
            "/{}",
            target.trim_start_matches(['/', '\\']).to_lowercase()
        ))
    }

    // Passwords
    //
    // Argon2 is CPU bound, so these run on the blocking pool.

    pub async fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_string();
        let cost = *self.site.password_hash_cost();

        tokio::task::spawn_blocking(move || password::hash_password(&password, cost)).await?
    }

    pub async fn verify_password(
        &self,
        submitted_password: &str,
        stored_hash: &str,
    ) -> Result<ValidationErrors, PasswordError> {
        let submitted_password = submitted_password.to_string();
        let stored_hash = stored_hash.to_string();

        Ok(tokio::task::spawn_blocking(move || {
            password::verify_password(&submitted_password, &stored_hash)
        })
        .await?)
    }

    pub async fn verify_new_password(
        &self,
        new_password: &str,
        current_hash: &str,
    ) -> Result<ValidationErrors, PasswordError> {
        let new_password = new_password.to_string();
        let current_hash = current_hash.to_string();

        Ok(tokio::task::spawn_blocking(move || {
            password::verify_new_password(&new_password, &current_hash)
        })
        .await?)
    }

    // Field validation

    pub fn is_approved_username(&self, username: &str) -> bool {
        validation::is_approved_username(username, self.site.disallowed_usernames())
    }

    pub async fn validate_username(&self, username: &str) -> Result<ValidationErrors, ControllerError> {
        validation::validate_username(username, self.site.accounts().as_ref())
            .await
            .map_err(ControllerError::AccountLookup)
    }

    pub fn validate_password(&self, password: &str) -> ValidationErrors {
        validation::validate_password(password)
    }

    pub fn validate_email(&self, email: &str) -> Result<String, ErrorCode> {
        validation::validate_email(email)
    }

    /// Appends one line per error to this controller's error text and
    /// returns everything collected so far.
    pub fn format_errors(&mut self, errors: &ValidationErrors) -> &str {
        for error in errors {
            self.error_list.push_str(error.as_str());
            self.error_list.push('\n');
        }
        &self.error_list
    }

    pub fn time_since(&self, date: &str) -> Result<String, TimeSinceError> {
        time_since::time_since(date)
    }
}

fn sanitize_fields(fields: &FormFields) -> FormFields {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), escape::sanitize_field(value)))
        .collect()
}
