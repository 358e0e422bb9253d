use std::fmt;
use std::path::PathBuf;

/// Where and as whom to connect. Fixed for the lifetime of the process.
#[derive(Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ConnectionParams {
    /// `<protocol>://<host>:<port>/<database>`, never including credentials.
    pub fn display_url(&self, protocol: &str) -> String {
        format!("{}://{}:{}/{}", protocol, self.host, self.port, self.database)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Loads `./.env` and then `<config dir>/sybase-query/env`, if present.
/// Variables already set in the environment win. Returns the files loaded.
pub fn load_env_files() -> Vec<PathBuf> {
    let mut loaded = Vec::new();
    if let Ok(path) = dotenvy::dotenv() {
        loaded.push(path);
    }

    if let Some(path) = user_env_path() {
        if path.is_file() && dotenvy::from_path(&path).is_ok() {
            loaded.push(path);
        }
    }
    loaded
}

fn user_env_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sybase-query").join("env"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ConnectionParams {
        ConnectionParams {
            host: "db01".into(),
            port: 5000,
            database: "sales".into(),
            username: "sa".into(),
            password: "s3cret".into(),
        }
    }

    #[test]
    fn test_display_url() {
        assert_eq!(params().display_url("sybase"), "sybase://db01:5000/sales");
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", params());
        assert!(rendered.contains("db01"));
        assert!(!rendered.contains("s3cret"));
    }
}
