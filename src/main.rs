use std::process;
use std::sync::Arc;

use ai_assistant::auth::{AuthService, GoogleOAuth};
use ai_assistant::cache::{CacheService, KeyValueCache};
use ai_assistant::config::AppConfig;
use ai_assistant::db::{Database, DatabaseConfig};
use ai_assistant::handlers::HealthCheck;
use ai_assistant::llm::{create_provider, LlmProvider, ProviderKind};
use ai_assistant::logging::init_tracing;
use ai_assistant::mail::{GmailClient, ResendClient};
use ai_assistant::repository::{PgConversationStore, PgEmailStore, PgUserStore};
use ai_assistant::routes::{configure_routes, AppState};
use ai_assistant::usecase::{AccountService, AiService, EmailService};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    init_tracing(&config.log_level);

    let database = match connect_database(&config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize database");
            process::exit(1);
        }
    };

    let cache = match CacheService::connect(&config.redis_url).await {
        Ok(cache) => Some(cache),
        Err(e) => {
            tracing::warn!(error = %e, "redis unavailable, continuing without cache");
            None
        }
    };
    let shared_cache = cache
        .clone()
        .map(|c| Arc::new(c) as Arc<dyn KeyValueCache>);

    let gemini = match create_provider(
        ProviderKind::Gemini,
        &config.llm.gemini_api_key,
        &config.llm.gemini_model,
    ) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!(error = %e, "failed to create gemini client");
            process::exit(1);
        }
    };
    let claude = claude_provider(&config);

    let auth = Arc::new(AuthService::new(&config.jwt.secret, config.jwt.ttl_hours));
    let pool = database.pool().clone();

    let mut ai = AiService::new(gemini, claude.clone())
        .with_conversations(Arc::new(PgConversationStore::new(pool.clone())))
        .with_emails(Arc::new(PgEmailStore::new(pool.clone())));

    let mut emails = EmailService::new(Arc::new(PgEmailStore::new(pool.clone())));
    match ResendClient::new(&config.resend.api_key) {
        Ok(client) => emails = emails.with_resend(client),
        Err(e) => tracing::warn!(error = %e, "resend client unavailable"),
    }
    match GmailClient::new() {
        Ok(client) => emails = emails.with_gmail(client),
        Err(e) => tracing::warn!(error = %e, "gmail client unavailable"),
    }

    let oauth = match GoogleOAuth::new(
        &config.google.client_id,
        &config.google.client_secret,
        config.google.redirect_uri(&config.server.base_url),
        config.google.scopes.clone(),
    ) {
        Ok(oauth) => oauth,
        Err(e) => {
            tracing::error!(error = %e, "failed to create google oauth client");
            process::exit(1);
        }
    };
    let mut accounts = AccountService::new(oauth, Arc::new(PgUserStore::new(pool)), auth.clone());

    if let Some(cache) = shared_cache {
        ai = ai.with_cache(cache.clone());
        emails = emails.with_token_cache(cache.clone());
        accounts = accounts.with_token_cache(cache);
    }

    let state = AppState {
        auth,
        ai: Arc::new(ai),
        emails: Arc::new(emails),
        accounts: Arc::new(accounts),
        health: Arc::new(HealthCheck::new(Some(database), cache, claude.is_some())),
        sender: config.resend.from_email.clone(),
    };

    let routes = configure_routes(state);

    match warp::serve(routes).try_bind_with_graceful_shutdown(config.bind_addr(), shutdown_signal()) {
        Ok((addr, server)) => {
            tracing::info!(%addr, "starting server");
            server.await;
            tracing::info!("server stopped");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to bind server");
            process::exit(1);
        }
    }
}

async fn connect_database(config: &AppConfig) -> ai_assistant::db::Result<Database> {
    let db_config = DatabaseConfig::from_url(&config.database.url)?
        .with_max_pool_size(config.database.max_pool_size);
    let database = Database::connect(&db_config).await?;
    database.migrate().await?;
    Ok(database)
}

/// Claude is optional; a bad key or client error only disables it
fn claude_provider(config: &AppConfig) -> Option<Arc<dyn LlmProvider>> {
    let api_key = config.llm.claude_api_key.as_deref()?;

    match create_provider(ProviderKind::Claude, api_key, &config.llm.claude_model) {
        Ok(provider) => Some(provider),
        Err(e) => {
            tracing::warn!(error = %e, "claude disabled");
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
