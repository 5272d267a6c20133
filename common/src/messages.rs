use crate::room::{SessionId, Snapshot, SnapshotError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(#[from] SnapshotError),
    #[error("{0} event is missing a {1}")]
    MissingField(&'static str, &'static str),
}

// {"event": "snapshot", "payload": {...}}
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum Event {
    JoinRequest {
        #[serde(rename = "playerId")]
        player_id: SessionId,
        name: String,
    },
    Snapshot(Box<Snapshot>),
    StateRequest {
        #[serde(rename = "playerId")]
        player_id: SessionId,
    },
    // Sent by the channel, never by participants. Display only.
    Presence { members: Vec<SessionId> },
}

impl Event {
    pub fn snapshot(snapshot: &Snapshot) -> Self {
        Event::Snapshot(Box::new(snapshot.clone()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::JoinRequest { .. } => "join-request",
            Event::Snapshot(_) => "snapshot",
            Event::StateRequest { .. } => "state-request",
            Event::Presence { .. } => "presence",
        }
    }

    pub fn decode(text: &str) -> Result<Event, MessageError> {
        let event: Event = serde_json::from_str(text)?;
        event.validate()?;
        Ok(event)
    }

    pub fn encode(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    fn validate(&self) -> Result<(), MessageError> {
        match self {
            Event::JoinRequest { player_id, name } => {
                if player_id.is_blank() {
                    return Err(MessageError::MissingField(self.kind(), "player id"));
                }
                if name.trim().is_empty() {
                    return Err(MessageError::MissingField(self.kind(), "name"));
                }
            }
            Event::StateRequest { player_id } => {
                if player_id.is_blank() {
                    return Err(MessageError::MissingField(self.kind(), "player id"));
                }
            }
            Event::Snapshot(snapshot) => snapshot.validate()?,
            Event::Presence { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gomoku::Stone;
    use crate::room::InviteCode;

    fn snapshot() -> Snapshot {
        Snapshot::create(
            SessionId::new("host"),
            "Host".to_string(),
            Stone::Black,
            InviteCode::parse("QWE234").unwrap(),
        )
    }

    #[test]
    fn test_join_request_wire_shape() {
        let event = Event::JoinRequest {
            player_id: SessionId::new("abc"),
            name: "Lucky Koi".to_string(),
        };
        let json = event.encode().unwrap();
        assert_eq!(
            json,
            "{\"event\":\"join-request\",\"payload\":{\"playerId\":\"abc\",\"name\":\"Lucky Koi\"}}"
        );
        assert_eq!(Event::decode(&json).unwrap(), event);
    }

    #[test]
    fn test_snapshot_event_decodes() {
        let event = Event::snapshot(&snapshot());
        let decoded = Event::decode(&event.encode().unwrap()).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(decoded.kind(), "snapshot");
    }

    #[test]
    fn test_unknown_event_is_malformed() {
        let result = Event::decode("{\"event\":\"chat\",\"payload\":{}}");
        assert!(matches!(result, Err(MessageError::Malformed(_))));
        assert!(matches!(Event::decode("ping"), Err(MessageError::Malformed(_))));
    }

    #[test]
    fn test_off_board_move_is_malformed() {
        let mut value = serde_json::to_value(Event::snapshot(&snapshot())).unwrap();
        value["payload"]["match"]["history"] =
            serde_json::json!([{"position": {"row": 99, "col": 0}, "color": "black"}]);
        let result = Event::decode(&value.to_string());
        assert!(matches!(result, Err(MessageError::Malformed(_))));
    }

    #[test]
    fn test_inconsistent_snapshot_is_rejected() {
        let mut snapshot = snapshot();
        snapshot.players.host.display_name = " ".to_string();
        let json = Event::snapshot(&snapshot).encode().unwrap();
        assert!(matches!(
            Event::decode(&json),
            Err(MessageError::InvalidSnapshot(SnapshotError::BlankName(_)))
        ));
    }

    #[test]
    fn test_blank_state_request_is_rejected() {
        let json = "{\"event\":\"state-request\",\"payload\":{\"playerId\":\"\"}}";
        assert!(matches!(
            Event::decode(json),
            Err(MessageError::MissingField("state-request", "player id"))
        ));
    }
}
