mod config;
mod handlers;
mod models;
mod services;
mod web; // Browser UI + JSON API

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;

use config::AppConfig;
use handlers::{Dispatcher, ImageAnalyzer, NutritionLookup};
use services::{CalorieNinjasClient, GeminiService, NutritionSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables (local development only)
    dotenv().ok();

    env_logger::init();

    log::info!("🚀 Starting Nutrition Analyzer...");

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("❌ {}", e);
        e
    })?;

    let gemini = Arc::new(GeminiService::new(&config.gemini)?);
    log::info!("✅ Gemini service initialized with model: {}", gemini.model());

    let lookup_source: Option<Arc<dyn NutritionSource>> = match &config.lookup.api_key {
        Some(key) => {
            let client = CalorieNinjasClient::new(key.clone(), &config.lookup)?;
            log::info!("✅ CalorieNinjas lookup enabled (timeout {:?})", config.lookup.timeout);
            Some(Arc::new(client) as Arc<dyn NutritionSource>)
        }
        None => {
            log::warn!("⚠️ CALORIE_NINJAS_KEY not set, text lookup will report as unavailable");
            None
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(
        ImageAnalyzer::new(gemini),
        NutritionLookup::new(lookup_source, config.lookup.cache_size),
    ));
    log::info!("✅ Dispatcher initialized");

    #[cfg(feature = "web-server")]
    {
        use web::server::create_router;

        let app = create_router(dispatcher, config.max_upload_bytes);
        let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

        log::info!("🌐 Web server listening on http://{}", config.bind_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(tokio::signal::ctrl_c()))
            .await?;
    }

    #[cfg(not(feature = "web-server"))]
    {
        let _ = dispatcher;
        log::warn!("⚠️ Built without the web-server feature, nothing to serve");
    }

    Ok(())
}

/// Resolves once the signal fires. A listener that failed to install never
/// resolves, so the server keeps running instead of stopping right away.
#[cfg(feature = "web-server")]
async fn shutdown_signal<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => log::info!("🛑 Shutting down..."),
        Err(e) => {
            log::error!("❌ Failed to listen for Ctrl+C, shutdown on signal disabled: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
