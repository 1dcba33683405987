use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub image_storage: ImageStorageSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// JWT authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64, // seconds (1800 = 30 minutes)
}

/// Cloudinary-compatible image storage settings
#[derive(serde::Deserialize, Clone)]
pub struct ImageStorageSettings {
    #[serde(default = "default_image_storage_url")]
    pub base_url: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_upload_timeout")]
    pub timeout_milliseconds: u64,
}

impl ImageStorageSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_expiry() -> i64 {
    30 * 60
}

fn default_image_storage_url() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}

fn default_upload_timeout() -> u64 {
    30_000
}

/// Load settings from `configuration.{yaml,toml,json}` in the working
/// directory, overridden by `APP__SECTION__KEY` environment variables.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}
