use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;

use brain_tumor_api::{config::Config, logging, routes, AppState, PredictorState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    logging::init(&config.log_level, config.log_format);

    let predictor = PredictorState::load(&config.model_path);
    let state = web::Data::new(AppState::new(predictor, config.max_upload_bytes));

    tracing::info!(
        host = %config.host,
        port = config.port,
        model_loaded = state.predictor.is_ready(),
        "starting server"
    );

    let mut server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes)
    });

    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server
        .bind((config.host.as_str(), config.port))
        .with_context(|| format!("could not bind {}:{}", config.host, config.port))?
        .run()
        .await?;

    Ok(())
}
