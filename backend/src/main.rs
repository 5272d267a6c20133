use crate::channel::Channels;
use crate::client::Clients;
use crate::config::RelayConfig;
use hashbrown::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};
use warp::{
    http::{header, Method},
    Filter,
};

mod channel;
mod client;
mod config;
mod handler;
mod ws;

#[tokio::main]
async fn main() {
    let config = match RelayConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            eprintln!("invalid relay configuration: {}", err);
            std::process::exit(1);
        }
    };

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(non_blocking)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {}", err);
    }

    let clients: Clients = Arc::new(RwLock::new(HashMap::new()));
    let channels: Channels = Arc::new(RwLock::new(HashMap::new()));
    info!(addr = %config.addr, "created clients and channels maps");

    let health_route = warp::path!("health").and_then(handler::health_handler);

    let register = warp::path("register");
    let register_routes = register
        .and(warp::post())
        .and(warp::body::json())
        .and(with_clients(clients.clone()))
        .and(with_config(config.clone()))
        .and_then(handler::register_handler)
        .or(register
            .and(warp::delete())
            .and(warp::path::param())
            .and(with_clients(clients.clone()))
            .and_then(handler::unregister_handler));

    let ws_route = warp::path("ws")
        .and(warp::ws())
        .and(warp::path::param())
        .and(with_clients(clients.clone()))
        .and(with_channels(channels.clone()))
        .and_then(handler::ws_handler);

    let routes = health_route
        .or(register_routes)
        .or(ws_route)
        .with(
            warp::cors()
                .allow_credentials(true)
                .allow_methods(&[
                    Method::OPTIONS,
                    Method::GET,
                    Method::POST,
                    Method::DELETE,
                ])
                .allow_headers(vec![
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                ])
                .max_age(300)
                .allow_any_origin(),
        );

    match warp::serve(routes).try_bind_ephemeral(config.addr) {
        Ok((addr, server)) => {
            info!(%addr, "relay listening");
            server.await;
        }
        Err(err) => error!(addr = %config.addr, "failed to bind: {}", err),
    }
}

fn with_clients(clients: Clients) -> impl Filter<Extract = (Clients,), Error = Infallible> + Clone {
    warp::any().map(move || clients.clone())
}

fn with_channels(
    channels: Channels,
) -> impl Filter<Extract = (Channels,), Error = Infallible> + Clone {
    warp::any().map(move || channels.clone())
}

fn with_config(
    config: Arc<RelayConfig>,
) -> impl Filter<Extract = (Arc<RelayConfig>,), Error = Infallible> + Clone {
    warp::any().map(move || config.clone())
}
