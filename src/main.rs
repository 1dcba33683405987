use lifegivers::auth::TokenIssuer;
use lifegivers::configuration::get_configuration;
use lifegivers::image_client::ImageStorageClient;
use lifegivers::startup::run;
use lifegivers::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // Signing secret and algorithm are checked before anything binds
    let token_issuer = TokenIssuer::from_settings(&configuration.jwt).map_err(|e| {
        tracing::error!("Invalid token configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Token configuration error")
    })?;

    let connection_string = configuration.database.connection_string();
    tracing::info!(
        host = %configuration.database.host,
        database = %configuration.database.database_name,
        "Attempting to connect to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
        })?;

    tracing::info!("Database migrations applied");

    let image_client = ImageStorageClient::new(&configuration.image_storage);

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, pool, token_issuer, image_client)?;
    tracing::info!("Server started successfully");

    server.await
}
