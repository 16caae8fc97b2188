use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use liftcell_core::{Cell, CellConfig};
use liftcell_server::http::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let endpoint = flag_value(&args, "--endpoint")
        .or_else(|| std::env::var("LIFTCELL_ENDPOINT").ok())
        .unwrap_or_else(|| "0.0.0.0:4840".to_string());
    let endpoint = normalize_endpoint(&endpoint).to_string();

    let cfg = match flag_value(&args, "--config") {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            CellConfig::from_yaml_str(&raw)?
        }
        None => CellConfig::default(),
    };

    let tick_period = cfg.tick_period();
    let cell = Arc::new(Mutex::new(Cell::new(cfg, Instant::now())?));

    let ticker = {
        let cell = cell.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_period);
            loop {
                interval.tick().await;
                let mut cell = cell.lock().await;
                if let Err(err) = cell.tick(Instant::now()) {
                    tracing::error!(%err, "cell tick failed");
                }
            }
        })
    };

    let listener = tokio::net::TcpListener::bind(&endpoint)
        .await
        .with_context(|| format!("binding fieldbus endpoint {endpoint}"))?;
    tracing::info!("liftcell fieldbus endpoint listening on {endpoint}");

    axum::serve(listener, router(AppState { cell }))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    ticker.abort();
    Ok(())
}

/// Parse `--flag <value>` from the raw argument list.
fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == name).map(|w| w[1].clone())
}

/// Accept a bare `host:port` as well as URL forms of the endpoint.
fn normalize_endpoint(raw: &str) -> &str {
    raw.strip_prefix("opc.tcp://")
        .or_else(|| raw.strip_prefix("tcp://"))
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw)
}
