// Configuration module entry point
// Loads application configuration and holds shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, FilesConfig, HttpConfig, LoggingConfig, PerformanceConfig, RouteHandler,
    RoutesConfig, ServerConfig,
};

impl Config {
    /// Load configuration from "config.toml" in the working directory
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SERVER"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("http.server_name", "linkserve/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("files.follow_symlinks", true)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_toml(contents: &str) -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(contents.as_bytes())
            .unwrap();
        let stem = dir.path().join("server");
        Config::load_from(stem.to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = load_toml("");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.performance.read_timeout, 30);
        assert!(cfg.files.follow_symlinks);
        assert!(cfg.routes.custom_routes.is_empty());
        assert_eq!(cfg.routes.index_files, vec!["index.html", "index.htm"]);
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_routes_from_file() {
        let cfg = load_toml(
            r#"
[server]
port = 9000

[files]
follow_symlinks = false

[routes.custom_routes."/media"]
type = "dir"
path = "/srv/media"

[routes.custom_routes."/latest"]
type = "file"
path = "/srv/media/latest.mkv"
"#,
        );
        assert_eq!(cfg.server.port, 9000);
        assert!(!cfg.files.follow_symlinks);
        assert_eq!(
            cfg.routes.custom_routes.get("/media"),
            Some(&RouteHandler::Dir {
                path: "/srv/media".to_string()
            })
        );
        assert_eq!(
            cfg.routes.custom_routes.get("/latest"),
            Some(&RouteHandler::File {
                path: "/srv/media/latest.mkv".to_string()
            })
        );
    }
}
