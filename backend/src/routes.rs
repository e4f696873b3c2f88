use actix_web::{HttpResponse, web};
use log::{error, info};
use serde::{Deserialize, Serialize};
use shared::{HistoryEntry, HistoryFilter, IdentifyRequest};
use std::str::FromStr;

use crate::history::HistoryStore;
use crate::identify::client::OpenRouterClient;
use crate::processing::{check_inbound_image, downscale_image};

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(rename = "type")]
    entry_type: Option<String>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/identify").route(web::post().to(handle_identify)))
        .service(
            web::resource("/api/history")
                .route(web::get().to(get_history))
                .route(web::delete().to(clear_history)),
        )
        .service(
            web::resource("/api/history/{id}")
                .route(web::get().to(get_history_item))
                .route(web::delete().to(delete_history_item)),
        );
}

async fn handle_identify(
    client: web::Data<OpenRouterClient>,
    history: web::Data<HistoryStore>,
    body: web::Json<IdentifyRequest>,
) -> HttpResponse {
    let Some(image) = body.image.as_deref() else {
        return HttpResponse::BadRequest().json(MessageResponse::new("No image provided"));
    };

    let image = match check_inbound_image(image) {
        Ok(image) => image,
        Err(e) => return HttpResponse::BadRequest().json(MessageResponse::new(e.to_string())),
    };

    info!("Identify request received ({} bytes)", image.len());
    let processed = downscale_image(image);

    match client.identify(&processed).await {
        Ok(results) => {
            // History keeps the original upload for display quality.
            // Storage is fire-and-forget and cannot fail the request.
            history.add(HistoryEntry::new(image.to_string(), results.clone()));
            HttpResponse::Ok().json(results)
        }
        Err(e) => {
            error!("Identification failed: {}", e);
            HttpResponse::InternalServerError().json(MessageResponse::new(format!(
                "Failed to identify with AI service: {}",
                e
            )))
        }
    }
}

async fn get_history(
    history: web::Data<HistoryStore>,
    query: web::Query<HistoryQuery>,
) -> HttpResponse {
    let filter = query
        .entry_type
        .as_deref()
        .and_then(|t| HistoryFilter::from_str(t).ok())
        .unwrap_or_default();
    HttpResponse::Ok().json(history.list(filter))
}

async fn clear_history(history: web::Data<HistoryStore>) -> HttpResponse {
    history.clear();
    info!("History cleared");
    HttpResponse::Ok().json(MessageResponse::new("History cleared successfully"))
}

async fn get_history_item(
    history: web::Data<HistoryStore>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    match history.get_by_id(&id) {
        Some(entry) => HttpResponse::Ok().json(entry),
        None => HttpResponse::NotFound().json(MessageResponse::new("History item not found")),
    }
}

async fn delete_history_item(
    history: web::Data<HistoryStore>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    if history.delete_by_id(&id) {
        HttpResponse::Ok().json(MessageResponse::new("History item deleted"))
    } else {
        HttpResponse::NotFound().json(MessageResponse::new("History item not found"))
    }
}
