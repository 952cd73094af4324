use std::sync::Arc;

use engine::{Engine, HttpIdentity, IdentityProvider, LocalStore, MemoryIdentity};
use server::{LogMailer, Mailer, OtpService, ServerState, SmtpMailer};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "obolo={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let store = LocalStore::open(&settings.server.store_path)?;
    let engine = Engine::builder().store(Arc::new(store)).build()?;

    let identity: Arc<dyn IdentityProvider> = match &settings.identity {
        Some(identity) => {
            tracing::info!("Found identity settings, using the HTTP provider...");
            Arc::new(HttpIdentity::new(
                identity.base_url.clone(),
                identity.api_key.clone(),
            ))
        }
        None => {
            let accounts = settings
                .server
                .accounts_path
                .clone()
                .unwrap_or_else(|| "./obolo-accounts.json".to_string());
            tracing::info!("No identity settings, using the file-backed fake at {accounts}");
            Arc::new(MemoryIdentity::open(accounts)?)
        }
    };

    let mailer: Arc<dyn Mailer> = match &settings.smtp {
        Some(smtp) => {
            tracing::info!("Found SMTP settings...");
            Arc::new(SmtpMailer::new(
                &smtp.host,
                smtp.username.clone(),
                smtp.password.clone(),
                &smtp.from,
            )?)
        }
        None => {
            tracing::info!("No SMTP settings, verification mails are logged only");
            Arc::new(LogMailer)
        }
    };

    let state = ServerState {
        engine: Arc::new(engine),
        identity,
        otp: Arc::new(OtpService::new()),
        mailer,
    };

    let bind = settings.server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(state, listener).await?;

    Ok(())
}
