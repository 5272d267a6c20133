use crate::{
    channel::Channels,
    client::{Client, Clients},
    config::RelayConfig,
    ws,
};
use gomoku_common::{InviteCode, SessionId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use warp::{http::StatusCode, reply::json, Rejection, Reply};

type Result<T> = std::result::Result<T, Rejection>;

#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    session_id: SessionId,
    room: String,
}

#[derive(Serialize, Debug)]
pub struct RegisterResponse {
    url: String,
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
}

pub async fn register_handler(
    body: RegisterRequest,
    clients: Clients,
    config: Arc<RelayConfig>,
) -> Result<Box<dyn Reply>> {
    if body.session_id.is_blank() {
        return Ok(bad_request("session_id must not be empty".to_string()));
    }
    let room = match InviteCode::parse(&body.room) {
        Ok(room) => room,
        Err(err) => {
            warn!(session = %body.session_id, "rejected registration: {}", err);
            return Ok(bad_request(err.to_string()));
        }
    };
    let uuid = Uuid::new_v4().as_simple().to_string();

    info!(session = %body.session_id, %room, connection = %uuid, "registered");
    register_client(uuid.clone(), body.session_id, room, clients).await;
    Ok(Box::new(json(&RegisterResponse {
        url: config.ws_url(&uuid),
    })))
}

fn bad_request(error: String) -> Box<dyn Reply> {
    Box::new(warp::reply::with_status(
        json(&ErrorResponse { error }),
        StatusCode::BAD_REQUEST,
    ))
}

async fn register_client(id: String, session_id: SessionId, room: InviteCode, clients: Clients) {
    clients.write().await.insert(
        id,
        Client {
            session_id,
            room,
            sender: None,
        },
    );
}

pub async fn unregister_handler(id: String, clients: Clients) -> Result<impl Reply> {
    clients.write().await.remove(&id);
    Ok(StatusCode::OK)
}

pub async fn ws_handler(
    ws: warp::ws::Ws,
    id: String,
    clients: Clients,
    channels: Channels,
) -> Result<impl Reply> {
    let client = clients.read().await.get(&id).cloned();
    match client {
        Some(c) => Ok(ws.on_upgrade(move |socket| {
            ws::client_connection(socket, id, clients, c, channels)
        })),
        None => Err(warp::reject::not_found()),
    }
}

pub async fn health_handler() -> Result<impl Reply> {
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;
    use tokio::sync::RwLock;

    fn config() -> Arc<RelayConfig> {
        Arc::new(RelayConfig::from_lookup(|_| None).unwrap())
    }

    fn request(session_id: &str, room: &str) -> RegisterRequest {
        RegisterRequest {
            session_id: SessionId::new(session_id),
            room: room.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_stores_normalised_room() {
        let clients: Clients = Arc::new(RwLock::new(HashMap::new()));
        let reply = register_handler(request("abc", " k7pq2x "), clients.clone(), config())
            .await
            .unwrap();
        assert_eq!(reply.into_response().status(), StatusCode::OK);

        let clients = clients.read().await;
        let client = clients.values().next().unwrap();
        assert_eq!(client.session_id, SessionId::new("abc"));
        assert_eq!(client.room.as_str(), "K7PQ2X");
        assert!(client.sender.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_room() {
        let clients: Clients = Arc::new(RwLock::new(HashMap::new()));
        let reply = register_handler(request("abc", "no way"), clients.clone(), config())
            .await
            .unwrap();
        assert_eq!(reply.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(clients.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_unregister_removes_client() {
        let clients: Clients = Arc::new(RwLock::new(HashMap::new()));
        register_handler(request("abc", "ROOM22"), clients.clone(), config())
            .await
            .unwrap();
        let id = clients.read().await.keys().next().unwrap().clone();
        unregister_handler(id, clients.clone()).await.unwrap();
        assert!(clients.read().await.is_empty());
    }
}
