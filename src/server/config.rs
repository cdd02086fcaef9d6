use super::RequestsLoggingLevel;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// Secret used to sign and verify session tokens.
    pub jwt_secret: String,
    /// Production deployments run behind HTTPS on a different origin than
    /// the frontend, which changes the session cookie attributes.
    pub production: bool,
    pub frontend_dir_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            jwt_secret: String::new(),
            production: false,
            frontend_dir_path: None,
        }
    }
}
