use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use homerate::cache::SchemaCache;
use homerate::db::{bootstrap, get_db_pool, init_db};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    init_our_mods();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set.");
    init_db(database_url)
        .await
        .expect("Failed to connect to the database");
    bootstrap(get_db_pool())
        .await
        .expect("Failed to prepare the database schema");

    let schema_cache = SchemaCache::from_config();
    let bind_address = homerate::app_config::server().bind_address;
    log::info!("Listening on {}", bind_address);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(Data::new(get_db_pool().clone()))
            .app_data(Data::new(schema_cache.clone()))
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(Logger::new("%a %r %s %{User-Agent}i"))
            .configure(homerate::web::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env is fine; the environment may already be set.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Initialize all local mods.
pub fn init_our_mods() {
    homerate::app_config::init();
}
