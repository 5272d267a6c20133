use crate::client::{SendMsg, Sender};
use gomoku_common::{Event, InviteCode, MessageError, SessionId};
use hashbrown::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

// Created on first subscribe and dropped with its last subscriber
pub type Channels = Arc<RwLock<HashMap<InviteCode, Channel<Sender>>>>;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error("Clients may not send {0} events")]
    Reserved(&'static str),
}

#[derive(Debug)]
struct Member<S> {
    connection_id: String,
    session_id: SessionId,
    sender: S,
}

#[derive(Debug)]
pub struct Channel<S: SendMsg> {
    members: Vec<Member<S>>,
}

impl<S: SendMsg> Default for Channel<S> {
    fn default() -> Self {
        Channel {
            members: Vec::new(),
        }
    }
}

impl<S: SendMsg> Channel<S> {
    pub fn subscribe(&mut self, connection_id: String, session_id: SessionId, sender: S) {
        self.members.retain(|m| m.connection_id != connection_id);
        self.members.push(Member {
            connection_id,
            session_id,
            sender,
        });
    }

    pub fn unsubscribe(&mut self, connection_id: &str) {
        self.members.retain(|m| m.connection_id != connection_id);
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn presence(&self) -> Event {
        let mut members: Vec<SessionId> = Vec::new();
        for member in &self.members {
            if !members.contains(&member.session_id) {
                members.push(member.session_id.clone());
            }
        }
        Event::Presence { members }
    }

    pub fn broadcast(&self, msg: &str) -> usize {
        self.send_where(msg, |_| true)
    }

    pub fn relay(&self, from: &str, msg: &str) -> Result<usize, RelayError> {
        let event = Event::decode(msg)?;
        if let Event::Presence { .. } = event {
            return Err(RelayError::Reserved(event.kind()));
        }
        debug!(from, kind = event.kind(), "relaying event");
        Ok(self.send_where(msg, |member| member.connection_id != from))
    }

    fn send_where(&self, msg: &str, include: impl Fn(&Member<S>) -> bool) -> usize {
        self.members
            .iter()
            .filter(|member| include(member))
            .filter(|member| match member.sender.send(msg) {
                Ok(()) => true,
                Err(err) => {
                    warn!(connection = %member.connection_id, "{}", err);
                    false
                }
            })
            .count()
    }
}

pub async fn join(
    channels: &Channels,
    room: &InviteCode,
    connection_id: String,
    session_id: SessionId,
    sender: Sender,
) {
    let mut channels = channels.write().await;
    let channel = channels.entry(room.clone()).or_default();
    channel.subscribe(connection_id, session_id, sender);
    announce(channel);
}

pub async fn leave(channels: &Channels, room: &InviteCode, connection_id: &str) {
    let mut channels = channels.write().await;
    let Some(channel) = channels.get_mut(room) else {
        return;
    };
    channel.unsubscribe(connection_id);
    if channel.is_empty() {
        debug!(%room, "closing empty room");
        channels.remove(room);
    } else {
        announce(channel);
    }
}

fn announce<S: SendMsg>(channel: &Channel<S>) {
    match channel.presence().encode() {
        Ok(msg) => {
            channel.broadcast(&msg);
        }
        Err(err) => warn!("failed to encode presence: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SendError;
    use gomoku_common::{Snapshot, Stone};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::sync::mpsc;
    use warp::ws::Message;

    #[derive(Clone, Default)]
    struct MockSender {
        sent: Rc<RefCell<Vec<String>>>,
    }

    impl SendMsg for MockSender {
        fn send(&self, msg: &str) -> Result<(), SendError> {
            self.sent.borrow_mut().push(msg.to_string());
            Ok(())
        }
    }

    impl MockSender {
        fn sent(&self) -> Vec<String> {
            self.sent.borrow().clone()
        }
    }

    struct ClosedSender;

    impl SendMsg for ClosedSender {
        fn send(&self, _msg: &str) -> Result<(), SendError> {
            Err(SendError)
        }
    }

    fn code() -> InviteCode {
        InviteCode::parse("GAME42").unwrap()
    }

    fn snapshot_msg() -> String {
        let snapshot = Snapshot::create(SessionId::new("host"), "Host".to_string(), Stone::Black, code());
        Event::snapshot(&snapshot).encode().unwrap()
    }

    fn room() -> (Channel<MockSender>, MockSender, MockSender, MockSender) {
        let host = MockSender::default();
        let guest = MockSender::default();
        let watcher = MockSender::default();
        let mut channel = Channel::default();
        channel.subscribe("c1".to_string(), SessionId::new("host"), host.clone());
        channel.subscribe("c2".to_string(), SessionId::new("guest"), guest.clone());
        channel.subscribe("c3".to_string(), SessionId::new("watcher"), watcher.clone());
        (channel, host, guest, watcher)
    }

    #[test]
    fn test_relay_skips_sender() {
        let (channel, host, guest, watcher) = room();
        let msg = snapshot_msg();
        assert_eq!(channel.relay("c1", &msg).unwrap(), 2);
        assert!(host.sent().is_empty());
        assert_eq!(guest.sent(), vec![msg.clone()]);
        assert_eq!(watcher.sent(), vec![msg]);
    }

    #[test]
    fn test_invalid_frames_are_dropped() {
        let (channel, host, guest, _) = room();
        assert!(matches!(
            channel.relay("c2", "{\"event\":\"chat\"}"),
            Err(RelayError::Message(_))
        ));
        assert!(host.sent().is_empty());
        assert!(guest.sent().is_empty());
    }

    #[test]
    fn test_client_presence_is_refused() {
        let (channel, host, _, _) = room();
        let msg = Event::Presence {
            members: vec![SessionId::new("ghost")],
        }
        .encode()
        .unwrap();
        assert!(matches!(
            channel.relay("c2", &msg),
            Err(RelayError::Reserved("presence"))
        ));
        assert!(host.sent().is_empty());
    }

    #[test]
    fn test_presence_lists_distinct_sessions() {
        let (mut channel, ..) = room();
        channel.subscribe("c4".to_string(), SessionId::new("host"), MockSender::default());
        let Event::Presence { members } = channel.presence() else {
            panic!("expected presence");
        };
        assert_eq!(
            members,
            vec![SessionId::new("host"), SessionId::new("guest"), SessionId::new("watcher")]
        );
    }

    #[test]
    fn test_unsubscribe_empties_channel() {
        let (mut channel, ..) = room();
        for id in ["c1", "c2", "c3"] {
            assert!(!channel.is_empty());
            channel.unsubscribe(id);
        }
        assert!(channel.is_empty());
    }

    #[test]
    fn test_failed_send_does_not_stop_broadcast() {
        let mut channel = Channel::default();
        channel.subscribe("c1".to_string(), SessionId::new("a"), ClosedSender);
        channel.subscribe("c2".to_string(), SessionId::new("b"), ClosedSender);
        assert_eq!(channel.broadcast("{}"), 0);
    }

    fn text(message: Message) -> String {
        message.to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_join_and_leave_announce_presence() {
        let channels: Channels = Arc::new(RwLock::new(HashMap::new()));
        let (host_tx, mut host_rx) = mpsc::unbounded_channel();
        let (guest_tx, mut guest_rx) = mpsc::unbounded_channel();

        join(&channels, &code(), "c1".to_string(), SessionId::new("host"), Sender(host_tx)).await;
        join(&channels, &code(), "c2".to_string(), SessionId::new("guest"), Sender(guest_tx)).await;

        let expected = Event::Presence {
            members: vec![SessionId::new("host"), SessionId::new("guest")],
        };
        let _first = host_rx.recv().await.unwrap().unwrap();
        let second = host_rx.recv().await.unwrap().unwrap();
        assert_eq!(Event::decode(&text(second)).unwrap(), expected);
        let guest_view = guest_rx.recv().await.unwrap().unwrap();
        assert_eq!(Event::decode(&text(guest_view)).unwrap(), expected);

        leave(&channels, &code(), "c2").await;
        let after = host_rx.recv().await.unwrap().unwrap();
        assert_eq!(
            Event::decode(&text(after)).unwrap(),
            Event::Presence {
                members: vec![SessionId::new("host")],
            }
        );

        leave(&channels, &code(), "c1").await;
        assert!(channels.read().await.is_empty());
    }
}
