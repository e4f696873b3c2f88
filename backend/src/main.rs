mod history;
mod identify;
mod processing;
mod routes;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use history::HistoryStore;
use identify::client::OpenRouterClient;
use routes::configure_routes;
use std::env;

// Base64-encoded uploads can get large; match the documented 10 MB limit.
const JSON_PAYLOAD_LIMIT: usize = 10 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let api_key = match env::var("OPENROUTER_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            log::error!(
                "OPENROUTER_API_KEY is not configured. Set it in the environment or a .env file."
            );
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "missing OPENROUTER_API_KEY",
            ));
        }
    };

    let model = env::var("OPENROUTER_MODEL")
        .unwrap_or_else(|_| identify::client::DEFAULT_MODEL.to_string());
    log::info!("Using identification model: {}", model);

    let client = OpenRouterClient::new(api_key, model).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("HTTP client initialization failed: {}", e),
        )
    })?;
    let history = HistoryStore::new();

    let port = env::var("PORT").unwrap_or_else(|_| "8081".to_string());
    let bind_address = format!("0.0.0.0:{}", port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::JsonConfig::default().limit(JSON_PAYLOAD_LIMIT))
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(history.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
