use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use std::sync::Arc;

mod config;
mod controllers;
mod feed;
mod gateway;
mod handshake;
mod middleware;
mod models;
mod qr;
mod store;
mod tokens;

use config::Config;
use feed::FeedStore;
use gateway::ConnectionRegistry;
use handshake::{LoginCoordinator, SweepPolicy};
use store::SessionStore;
use tokens::TokenService;

pub struct AppState {
    pub config: Config,
    pub tokens: Arc<TokenService>,
    pub coordinator: Arc<LoginCoordinator>,
    pub feed: Arc<FeedStore>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing session store and notification channel");
    let store = Arc::new(SessionStore::new());
    let connections = Arc::new(ConnectionRegistry::new());
    let tokens = Arc::new(TokenService::new(&config.secret_key));
    let feed = Arc::new(FeedStore::new());

    let policy = SweepPolicy {
        pending_ttl: chrono::Duration::seconds(config.pending_session_ttl_secs as i64),
        authenticated_ttl: chrono::Duration::seconds(config.auth_session_ttl_secs as i64),
        interval: std::time::Duration::from_secs(config.sweep_interval_secs),
    };
    let coordinator = Arc::new(LoginCoordinator::new(
        store,
        connections,
        tokens.clone(),
        policy,
    ));

    // Start the background session sweeper
    log::info!(
        "Starting session sweeper (pending TTL {}s, authenticated TTL {}s, every {}s)",
        config.pending_session_ttl_secs,
        config.auth_session_ttl_secs,
        config.sweep_interval_secs,
    );
    let sweeper = Arc::clone(&coordinator);
    let (sweep_shutdown_tx, sweep_shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        sweeper.run_sweeper(sweep_shutdown_rx).await;
    });

    // Static assets are optional; serve them only when the directory exists
    let static_dir = if std::path::Path::new("./static").exists() {
        "./static"
    } else {
        ""
    };

    log::info!("Starting qrlink server on port {}", port);
    log::info!("Notification channel available at /ws/{{session_id}}");
    if !static_dir.is_empty() {
        log::info!("Serving static assets from: {}", static_dir);
    }

    let coord = coordinator.clone();
    let toks = tokens.clone();
    let feed_store = feed.clone();
    let static_dir = static_dir.to_string();

    let result = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let mut app = App::new()
            .app_data(web::Data::new(AppState {
                config: config.clone(),
                tokens: Arc::clone(&toks),
                coordinator: Arc::clone(&coord),
                feed: Arc::clone(&feed_store),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::posts::config)
            .configure(controllers::auth::config)
            .route(
                "/ws/{session_id}",
                web::get().to(gateway::actix_ws::ws_handler),
            );

        if !static_dir.is_empty() {
            app = app.service(Files::new("/static", static_dir.clone()));
        }

        app
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await;

    let _ = sweep_shutdown_tx.send(());
    result
}
