use actix_web::web;
mod handlers;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(handlers::swap)
            .service(handlers::health),
    )
    .default_service(web::route().to(handlers::not_found));
}
