use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use contact_backend::{
    background_task::start_rate_limit_sweep,
    constants::START_TIME,
    graceful_shutdown::shutdown_signal,
    middlewares::cors::build_cors,
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};
use once_cell::sync::Lazy;
use tokio::sync::watch;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    Lazy::force(&START_TIME);

    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.is_production());
    tracing::info!("Loaded configuration: {:?}", config);

    let app_state = match AppState::new(&config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            tracing::error!("Failed to build application state: {}", e);
            std::process::exit(1);
        }
    };

    let sweep_interval = match config.rate_limit_sweep_interval() {
        Ok(every) => every,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let server_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        "🚀 Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = tokio::spawn(start_rate_limit_sweep(
        app_state.contact_handler.limiter.clone(),
        sweep_interval,
        shutdown_rx,
    ));

    let max_body_bytes = config.max_body_bytes;
    let server_config = config.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::new(max_body_bytes))
            .wrap(build_cors(&server_config))
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    let result = tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    };

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweep.await {
        tracing::warn!("Rate limit sweep ended abnormally: {}", e);
    }

    result
}
