use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_user_service_url")]
    pub user_service_url: String,
}

fn default_port() -> u16 { 3002 }
fn default_jwt_secret() -> String { "development-secret-change-in-production".into() }
fn default_user_service_url() -> String { "http://localhost:3001".into() }

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("AMOURA_MATCHING").separator("__"))
            .build()?;
        Ok(config.try_deserialize().unwrap_or_else(|_| Self {
            port: default_port(),
            jwt_secret: default_jwt_secret(),
            user_service_url: default_user_service_url(),
        }))
    }
}
