use clap::Parser;
use database::Database;

pub mod auth;
pub mod columns;
pub mod table;
pub mod views;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:ledgerly.db")]
    pub database_url: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    #[arg(long, env = "APP_PASSWORD")]
    pub app_password: Option<String>,
}

impl AppState {
    /// State for router tests: fresh database, authentication disabled.
    pub async fn for_tests() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            db: database::get_test_db().await,
            config: Config {
                database_url: "test".into(),
                port: 0,
                app_password: None,
            },
        })
    }
}
