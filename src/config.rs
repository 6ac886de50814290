use std::path::PathBuf;

/// Runtime configuration shared by the capture pipeline and the HTTP layer.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL used when composing absolute OG/Twitter image and short-link
    /// URLs for crawlers. Overridden by `PUBLIC_DOMAIN`.
    pub public_domain: String,
    /// JSON file holding the capture record array.
    pub data_file: PathBuf,
    /// Directory the captured PNGs are written to and served from.
    pub images_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_domain: "http://localhost:3000".into(),
            data_file: "data/threads.json".into(),
            images_dir: "public/images".into(),
        }
    }
}

impl AppConfig {
    pub fn image_path(&self, id: &str) -> PathBuf {
        self.images_dir.join(format!("{id}.png"))
    }

    /// Root-relative path recorded on the capture record and used in markup.
    pub fn image_url_path(id: &str) -> String {
        format!("/images/{id}.png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_paths_are_id_addressed() {
        let config = AppConfig::default();
        assert_eq!(
            config.image_path("abc123-_"),
            PathBuf::from("public/images/abc123-_.png")
        );
        assert_eq!(AppConfig::image_url_path("abc123-_"), "/images/abc123-_.png");
    }
}
