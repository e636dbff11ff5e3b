use actix_web::{App, HttpResponse, HttpServer, middleware, web};

use condominio::config::AppConfig;
use condominio::gateway::ApiEnvelope;
use condominio::pdf::ConvocatoriaRenderer;
use condominio::{db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    std::fs::create_dir_all(&config.pdf_output_dir).expect("Failed to create PDF output directory");

    let pool = db::init_pool(&config).await.expect("Failed to create DB pool");
    db::run_migrations(&pool).await.expect("Failed to run migrations");

    let renderer = web::Data::new(ConvocatoriaRenderer::from_config(&config).await);
    log::info!("Convocatória backend: {}", renderer.primary_backend());

    let bind_addr = config.bind_addr.clone();
    let config = web::Data::new(config);

    log::info!("Starting server at http://{bind_addr}");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(config.clone())
            .app_data(renderer.clone())
            .app_data(handlers::api::json_config())
            .service(web::scope("/api").configure(handlers::api::configure))
            // Default 404 handler (must be registered last)
            .default_service(web::to(|| async {
                HttpResponse::NotFound().json(ApiEnvelope::<()>::failure("Recurso não encontrado"))
            }))
    })
    .bind(bind_addr)?
    .run()
    .await
}
