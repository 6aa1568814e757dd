use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

use leave_tracker::api::Engine;
use leave_tracker::config::Config;
use leave_tracker::db::{AppStore, MemoryLeaveStore, MySqlLeaveStore, init_db};
use leave_tracker::docs::ApiDoc;
use leave_tracker::engine::{AdmissionController, TracingSubscriber};
use leave_tracker::model::member::{Location, NewMember};
use leave_tracker::model::role::MemberRole;
use leave_tracker::routes;

use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Leave tracker is running"
}

async fn open_store(config: &Config) -> anyhow::Result<AppStore> {
    match &config.database_url {
        Some(url) => {
            let pool = init_db(url).await.context("Failed to connect to MySQL")?;
            let store = MySqlLeaveStore::new(pool);
            store
                .ensure_schema()
                .await
                .context("Failed to create leave tracker tables")?;
            info!("Using MySQL store");
            Ok(AppStore::MySql(store))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            Ok(AppStore::Memory(MemoryLeaveStore::new()))
        }
    }
}

/// Makes sure somebody can log in and review on a fresh store.
async fn bootstrap_scrum_master(engine: &Engine, email: &str) -> anyhow::Result<()> {
    if engine.member_by_email(email).await?.is_some() {
        return Ok(());
    }

    let name = email.split('@').next().unwrap_or(email).to_string();
    let member = engine
        .register_member(NewMember {
            name,
            email: email.to_string(),
            stream: "Scrum".to_string(),
            location: Location::Uae,
            role: MemberRole::ScrumMaster,
            annual_entitlement: None,
            sick_entitlement: None,
        })
        .await?;
    info!(member_id = member.id, "Bootstrap scrum master registered");
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store = open_store(&config).await?;
    let engine: Engine = AdmissionController::new(Arc::new(store), config.admission_settings())
        .with_subscriber(Arc::new(TracingSubscriber));

    if let Some(email) = &config.bootstrap_scrum_master {
        bootstrap_scrum_master(&engine, email).await?;
    }

    let engine = Data::new(engine);
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(engine.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
