use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::controller::{assets::AssetUrls, escape::escape};

pub type ViewVariables = BTreeMap<String, String>;

const MAX_PARTIAL_DEPTH: usize = 8;

#[derive(thiserror::Error, Debug)]
pub enum ViewError {
    #[error("view not found '{}'", path.display())]
    NotFound { path: PathBuf },

    #[error("error reading view '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unterminated placeholder in '{}' at byte {offset}", path.display())]
    Syntax { path: PathBuf, offset: usize },

    #[error("partials nested too deep in '{}'", path.display())]
    TooDeep { path: PathBuf },
}

pub fn view_path(views_directory: &Path, name: &str) -> PathBuf {
    views_directory.join(format!("{}.view.html", name.to_lowercase()))
}

pub fn partial_path(views_directory: &Path, name: &str) -> PathBuf {
    views_directory
        .join("partials")
        .join(format!("{}.html", name.to_lowercase()))
}

pub fn component_path(views_directory: &Path, name: &str) -> PathBuf {
    views_directory
        .join("components")
        .join(format!("{}.component.html", name.to_lowercase()))
}

pub fn email_component_path(views_directory: &Path, name: &str) -> PathBuf {
    views_directory
        .join("components")
        .join("email")
        .join(format!("{}.component.html", name.to_lowercase()))
}

/// Renders template files.
///
/// Placeholder syntax:
///
/// * `{{ name }}` inserts a variable, HTML-escaped.
/// * `{{{ name }}}` inserts a variable verbatim, for already rendered HTML.
/// * `{{> name }}` renders `partials/<name>.html` with the same variables.
/// * `{{ css:name }}`, `{{ js:name }}`, `{{ image:name }}` and
///   `{{ icon:name }}` insert asset URLs.
pub struct ViewRenderer<'a> {
    views_directory: &'a Path,
    assets: &'a AssetUrls,
}

impl<'a> ViewRenderer<'a> {
    pub fn new(views_directory: &'a Path, assets: &'a AssetUrls) -> Self {
        Self {
            views_directory,
            assets,
        }
    }

    pub fn render_file(&self, path: &Path, variables: &ViewVariables) -> Result<String, ViewError> {
        self.render_file_at_depth(path, variables, 0)
    }

    fn render_file_at_depth(
        &self,
        path: &Path,
        variables: &ViewVariables,
        depth: usize,
    ) -> Result<String, ViewError> {
        if depth > MAX_PARTIAL_DEPTH {
            return Err(ViewError::TooDeep {
                path: path.to_path_buf(),
            });
        }

        debug!("rendering {}", path.display());

        let source = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ViewError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ViewError::Read {
                path: path.to_path_buf(),
                source: err,
            },
        })?;

        self.render_source(path, &source, variables, depth)
    }

    fn render_source(
        &self,
        path: &Path,
        source: &str,
        variables: &ViewVariables,
        depth: usize,
    ) -> Result<String, ViewError> {
        let mut output = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            output.push_str(&rest[..start]);

            let (raw, open_len, close) = if rest[start..].starts_with("{{{") {
                (true, 3, "}}}")
            } else {
                (false, 2, "}}")
            };

            let body_start = start + open_len;
            let body_len = rest[body_start..]
                .find(close)
                .ok_or_else(|| ViewError::Syntax {
                    path: path.to_path_buf(),
                    offset: source.len() - rest.len() + start,
                })?;

            let body = rest[body_start..body_start + body_len].trim();
            self.render_placeholder(path, body, raw, variables, depth, &mut output)?;

            rest = &rest[body_start + body_len + close.len()..];
        }

        output.push_str(rest);
        Ok(output)
    }

    fn render_placeholder(
        &self,
        path: &Path,
        body: &str,
        raw: bool,
        variables: &ViewVariables,
        depth: usize,
        output: &mut String,
    ) -> Result<(), ViewError> {
        if let Some(partial) = body.strip_prefix('>') {
            let partial = partial_path(self.views_directory, partial.trim());
            output.push_str(&self.render_file_at_depth(&partial, variables, depth + 1)?);
            return Ok(());
        }

        if let Some((kind, name)) = body.split_once(':') {
            let url = match kind.trim() {
                "css" => Some(self.assets.stylesheet_url(name.trim())),
                "js" => Some(self.assets.script_url(name.trim())),
                "image" => Some(self.assets.image_url(name.trim())),
                "icon" => Some(self.assets.icon_url(name.trim())),
                _ => None,
            };
            match url {
                Some(url) => output.push_str(&escape(&url)),
                None => warn!("unknown asset kind '{}' in {}", kind, path.display()),
            }
            return Ok(());
        }

        match variables.get(body) {
            Some(value) if raw => output.push_str(value),
            Some(value) => output.push_str(&escape(value)),
            None => warn!("undefined view variable '{}' in {}", body, path.display()),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn assets() -> AssetUrls {
        AssetUrls::new("https://", "example.com")
    }

    fn variables(pairs: &[(&str, &str)]) -> ViewVariables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn write(dir: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn naming_conventions() {
        let dir = Path::new("/srv/views");

        assert_eq!(view_path(dir, "Home"), Path::new("/srv/views/home.view.html"));
        assert_eq!(
            partial_path(dir, "Header"),
            Path::new("/srv/views/partials/header.html")
        );
        assert_eq!(
            component_path(dir, "Card"),
            Path::new("/srv/views/components/card.component.html")
        );
        assert_eq!(
            email_component_path(dir, "Welcome"),
            Path::new("/srv/views/components/email/welcome.component.html")
        );
    }

    #[test]
    fn escapes_variables_unless_triple_braced() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets();
        let renderer = ViewRenderer::new(dir.path(), &assets);
        let path = write(dir.path(), "page.view.html", "<p>{{ body }}</p>{{{body}}}");

        let html = renderer
            .render_file(&path, &variables(&[("body", "<b>hi</b>")]))
            .unwrap();

        assert_eq!(html, "<p>&lt;b&gt;hi&lt;/b&gt;</p><b>hi</b>");
    }

    #[test]
    fn includes_partials_and_asset_urls() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets();
        let renderer = ViewRenderer::new(dir.path(), &assets);
        write(
            dir.path(),
            "partials/header.html",
            "<link href=\"{{ css:Styles }}\"><title>{{ title }}</title>",
        );
        let path = write(dir.path(), "home.view.html", "{{> header }}<main></main>");

        let html = renderer
            .render_file(&path, &variables(&[("title", "Home")]))
            .unwrap();

        assert_eq!(
            html,
            "<link href=\"https://example.com/css/styles.css\"><title>Home</title><main></main>"
        );
    }

    #[test]
    fn undefined_variables_render_empty() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets();
        let renderer = ViewRenderer::new(dir.path(), &assets);
        let path = write(dir.path(), "page.view.html", "[{{ missing }}]");

        let html = renderer.render_file(&path, &ViewVariables::new()).unwrap();

        assert_eq!(html, "[]");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets();
        let renderer = ViewRenderer::new(dir.path(), &assets);

        let err = renderer
            .render_file(&dir.path().join("nope.view.html"), &ViewVariables::new())
            .unwrap_err();

        assert!(matches!(err, ViewError::NotFound { .. }));
    }

    #[test]
    fn unterminated_placeholder_is_a_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets();
        let renderer = ViewRenderer::new(dir.path(), &assets);
        let path = write(dir.path(), "page.view.html", "ok {{ title");

        let err = renderer.render_file(&path, &ViewVariables::new()).unwrap_err();

        assert!(matches!(err, ViewError::Syntax { offset: 3, .. }));
    }

    #[test]
    fn recursive_partials_stop() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets();
        let renderer = ViewRenderer::new(dir.path(), &assets);
        let path = write(dir.path(), "partials/loop.html", "{{> loop }}");

        let err = renderer.render_file(&path, &ViewVariables::new()).unwrap_err();

        assert!(matches!(err, ViewError::TooDeep { .. }));
    }
}
