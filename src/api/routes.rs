use actix_web::web;

use super::handlers;

/// Configures the API routes
///
/// The paths are part of the inter-node wire contract: peers pull
/// `GET /chain` from each other during consensus resolution.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/mine", web::get().to(handlers::mine))
        .route("/transactions/new", web::post().to(handlers::new_transaction))
        .route("/chain", web::get().to(handlers::get_chain))
        .route("/nodes/register", web::post().to(handlers::register_nodes))
        .route("/nodes/resolve", web::get().to(handlers::resolve_conflicts));
}
