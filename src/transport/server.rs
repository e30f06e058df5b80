//! HTTP entrypoint (spec.md §5). One route: an upgrade to a WebSocket
//! that carries the entire wire protocol (spec.md §6.1). Grounded on
//! `hosting::server::Server::run`, generalized from three action-specific
//! routes down to a single `/ws` upgrade since there is no more
//! per-action HTTP surface to route.

use crate::config::Config;
use crate::room_actor::{RoomDeps, RoomInbound};
use crate::store::rooms::RoomStore;
use crate::transport::session;
use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use std::sync::Arc;

struct AppState {
    rooms: Arc<RoomStore<RoomInbound>>,
    deps: RoomDeps,
}

pub struct Server;

impl Server {
    pub async fn run(config: Config, deps: RoomDeps) -> std::io::Result<()> {
        let state = web::Data::new(AppState {
            rooms: Arc::new(RoomStore::default()),
            deps,
        });
        log::info!("starting server on {}", config.bind_addr);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
                .app_data(state.clone())
                .route("/ws", web::get().to(ws))
        })
        .workers(config.workers)
        .bind(&config.bind_addr)?
        .run()
        .await
    }
}

async fn ws(req: HttpRequest, body: web::Payload, state: web::Data<AppState>) -> impl Responder {
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            session::spawn(session, stream, state.rooms.clone(), state.deps.clone());
            response
        }
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}
