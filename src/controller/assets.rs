/// Builds absolute URLs for static files served by the front web server.
/// Nothing checks that the file exists.
#[derive(Debug, Clone)]
pub struct AssetUrls {
    base_url: String,
}

impl AssetUrls {
    pub fn new(protocol: &str, host: &str) -> Self {
        Self {
            base_url: format!("{}{}", protocol, host),
        }
    }

    pub fn script_url(&self, filename: &str) -> String {
        format!("{}/js/{}.js", self.base_url, filename.to_lowercase())
    }

    pub fn stylesheet_url(&self, filename: &str) -> String {
        format!("{}/css/{}.css", self.base_url, filename.to_lowercase())
    }

    pub fn image_url(&self, filename: &str) -> String {
        format!("{}/assets/images/{}", self.base_url, filename.to_lowercase())
    }

    pub fn icon_url(&self, filename: &str) -> String {
        format!("{}/assets/icons/{}", self.base_url, filename.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_lowercased_under_fixed_directories() {
        let assets = AssetUrls::new("https://", "scriptingthoughts.com");

        assert_eq!(
            assets.script_url("Main"),
            "https://scriptingthoughts.com/js/main.js"
        );
        assert_eq!(
            assets.stylesheet_url("Styles"),
            "https://scriptingthoughts.com/css/styles.css"
        );
        assert_eq!(
            assets.image_url("Favicon.ICO"),
            "https://scriptingthoughts.com/assets/images/favicon.ico"
        );
        assert_eq!(
            assets.icon_url("Menu.svg"),
            "https://scriptingthoughts.com/assets/icons/menu.svg"
        );
    }
}
