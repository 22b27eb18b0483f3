mod api;
mod config;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{dev::Service, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::AuthMiddleware;
use crate::utils::AppError;

fn startup_error(message: String) -> std::io::Error {
    log::error!("❌ {}", message);
    std::io::Error::new(std::io::ErrorKind::Other, message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::Config::from_env().map_err(startup_error)?;

    log::info!("🚀 Starting Recruit Service...");
    log::info!("📊 Database: {}", database::database_name_from_uri(&config.database_url));

    let db = database::MongoDB::new(&config.database_url)
        .await
        .map_err(|e| startup_error(format!("Failed to connect to MongoDB: {}", e)))?;

    log::info!("✅ MongoDB connected successfully");

    seeds::admin_seed::seed_admin(&db, &config.admin_seed).await;

    api::metrics::mark_started();

    let host = config.host.clone();
    let port = config.port;
    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config);

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);
        for origin in &config_data.cors_origins {
            cors = cors.allowed_origin(origin);
        }

        let json_config = web::JsonConfig::default()
            .limit(1 << 20)
            .error_handler(|err, _req| AppError::InvalidRequest(err.to_string()).into());
        let query_config = web::QueryConfig::default()
            .error_handler(|err, _req| AppError::InvalidRequest(err.to_string()).into());

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(json_config)
            .app_data(query_config)
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .wrap_fn(|req, srv| {
                api::metrics::increment_request_count();
                srv.call(req)
            })
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .route("/health", web::get().to(api::health::health_check))
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // Auth: only login is public
            .service(
                web::scope("/api/v1/auth")
                    .route("/login", web::post().to(api::auth::login))
                    .service(
                        web::resource("/register")
                            .wrap(AuthMiddleware)
                            .route(web::post().to(api::auth::register))
                    )
                    .service(
                        web::resource("/me")
                            .wrap(AuthMiddleware)
                            .route(web::get().to(api::auth::get_me))
                    )
                    .service(
                        web::resource("/change-password")
                            .wrap(AuthMiddleware)
                            .route(web::post().to(api::auth::change_password))
                    )
                    .service(
                        web::resource("/verify")
                            .wrap(AuthMiddleware)
                            .route(web::get().to(api::auth::verify_token))
                    )
            )
            .service(
                web::scope("/api/v1/users")
                    .wrap(AuthMiddleware)
                    .service(api::users::list_recruiters)
                    .service(api::users::list_users)
                    .service(api::users::create_user)
                    .service(api::users::get_user)
                    .service(api::users::update_user)
                    .service(api::users::set_active)
                    .service(api::users::delete_user)
            )
            .service(
                web::scope("/api/v1/candidates")
                    .wrap(AuthMiddleware)
                    .service(api::candidates::list_candidates)
                    .service(api::candidates::create_candidate)
                    .service(api::candidates::get_candidate)
                    .service(api::candidates::update_candidate)
                    .service(api::candidates::update_status)
                    .service(api::candidates::delete_candidate)
            )
            .service(
                web::scope("/api/v1/jobs")
                    .wrap(AuthMiddleware)
                    .service(api::jobs::list_jobs)
                    .service(api::jobs::create_job)
                    .service(api::jobs::get_job)
                    .service(api::jobs::update_job)
                    .service(api::jobs::delete_job)
            )
            .service(
                web::scope("/api/v1/clients")
                    .wrap(AuthMiddleware)
                    .service(api::clients::list_clients)
                    .service(api::clients::create_client)
                    .service(api::clients::get_client)
                    .service(api::clients::update_client)
                    .service(api::clients::delete_client)
            )
            .service(
                web::scope("/api/v1/interviews")
                    .wrap(AuthMiddleware)
                    .service(api::interviews::list_interviews)
                    .service(api::interviews::create_interview)
                    .service(api::interviews::get_interview)
                    .service(api::interviews::update_interview)
                    .service(api::interviews::delete_interview)
            )
            .service(
                web::scope("/api/v1/messages")
                    .wrap(AuthMiddleware)
                    .service(api::messages::inbox)
                    .service(api::messages::sent)
                    .service(api::messages::unread_count)
                    .service(api::messages::send_message)
                    .service(api::messages::mark_read)
                    .service(api::messages::delete_message)
            )
            .service(
                web::scope("/api/v1/dashboard")
                    .wrap(AuthMiddleware)
                    .service(api::dashboard::get_stats)
            )
    })
    .bind((host, port))?
    .run()
    .await
}
