use crate::channel::{self, Channels};
use crate::client::{Client, Clients, Sender};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};
use warp::ws::{Message, WebSocket};

pub async fn client_connection(
    ws: WebSocket,
    id: String,
    clients: Clients,
    mut client: Client,
    channels: Channels,
) {
    let (client_ws_sender, mut client_ws_rcv) = ws.split();
    let (client_sender, client_rcv) = mpsc::unbounded_channel();

    let client_rcv = UnboundedReceiverStream::new(client_rcv);
    tokio::task::spawn(client_rcv.forward(client_ws_sender).map(|result| {
        if let Err(e) = result {
            error!("error sending websocket msg: {}", e);
        }
    }));

    let sender = Sender(client_sender);
    client.sender = Some(sender.clone());
    let room = client.room.clone();
    let session_id = client.session_id.clone();
    clients.write().await.insert(id.clone(), client);

    channel::join(&channels, &room, id.clone(), session_id.clone(), sender).await;
    info!(connection = %id, session = %session_id, %room, "connected");

    while let Some(result) = client_ws_rcv.next().await {
        let msg = match result {
            Ok(msg) => msg,
            Err(e) => {
                error!("error receiving ws message for id {}: {}", id, e);
                break;
            }
        };
        client_msg(&id, msg, &clients, &channels).await;
    }

    channel::leave(&channels, &room, &id).await;
    clients.write().await.remove(&id);
    info!(connection = %id, session = %session_id, %room, "disconnected");
}

#[tracing::instrument(skip(msg, clients, channels))]
async fn client_msg(id: &str, msg: Message, clients: &Clients, channels: &Channels) {
    let message = match msg.to_str() {
        Ok(v) => v.trim(),
        Err(_) => return,
    };

    if message == "ping" {
        return;
    }

    let room = match clients.read().await.get(id) {
        Some(client) => client.room.clone(),
        None => {
            error!("Message from client {} did not match any connected clients", id);
            return;
        }
    };

    let channels = channels.read().await;
    let Some(channel) = channels.get(&room) else {
        error!("Client {} is not subscribed to room {}", id, room);
        return;
    };
    match channel.relay(id, message) {
        Ok(reached) => debug!(%room, reached, "relayed"),
        Err(err) => warn!(%room, "dropped message: {}", err),
    }
}
