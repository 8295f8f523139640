pub mod auth;
pub mod intent;
pub mod recipients;
pub mod transactions;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::issue_nonce)
        .service(auth::verify)
        .service(recipients::list)
        .service(recipients::add)
        .service(recipients::update)
        .service(recipients::remove)
        .service(intent::parse_intent)
        .service(transactions::setup_recurring)
        .service(transactions::list)
        .service(transactions::store)
        .service(crate::metrics::metrics_endpoint);
}
