use crate::gomoku::{MatchState, MatchStatus, Position, SkillKind, Stone};
use crate::room::identity::{InviteCode, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Idle,
    Lobby,
    Playing,
    Finished,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomStatus::Idle => write!(f, "idle"),
            RoomStatus::Lobby => write!(f, "in the lobby"),
            RoomStatus::Playing => write!(f, "playing"),
            RoomStatus::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Guest,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub session_id: SessionId,
    pub display_name: String,
    pub stone: Stone,
    pub role: Role,
    pub ready: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Spectator {
    pub session_id: SessionId,
    pub display_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RoomState {
    pub invite_code: InviteCode,
    pub status: RoomStatus,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Players {
    pub host: PlayerIdentity,
    pub guest: Option<PlayerIdentity>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Seat roles are swapped")]
    RoleMismatch,
    #[error("Host and guest share session {0}")]
    DuplicateSeat(SessionId),
    #[error("Guest plays {0}, the same color as the host")]
    SameColor(Stone),
    #[error("Room is {0} but has no match state to go with it")]
    StatusMismatch(RoomStatus),
    #[error("A skill is armed in a match that is over")]
    PendingSkillAfterMatch,
    #[error("{0} cannot be armed")]
    UntargetedSkillArmed(SkillKind),
    #[error("Winner does not agree with match status")]
    WinnerMismatch,
    #[error("Move history does not match the board")]
    HistoryMismatch,
    #[error("Player {0} has a blank display name")]
    BlankName(SessionId),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub room: RoomState,
    pub players: Players,
    pub spectators: Vec<Spectator>,
    #[serde(rename = "match")]
    pub game: MatchState,
}

impl Snapshot {
    pub fn create(host: SessionId, display_name: String, stone: Stone, invite_code: InviteCode) -> Self {
        let game = MatchState::default().with_narration(format!(
            "Room {} is open. Waiting for an opponent",
            invite_code
        ));
        Snapshot {
            room: RoomState {
                invite_code,
                status: RoomStatus::Lobby,
            },
            players: Players {
                host: PlayerIdentity {
                    session_id: host,
                    display_name,
                    stone,
                    role: Role::Host,
                    ready: false,
                },
                guest: None,
            },
            spectators: Vec::new(),
            game,
        }
    }

    pub fn host(&self) -> &PlayerIdentity {
        &self.players.host
    }

    pub fn guest(&self) -> Option<&PlayerIdentity> {
        self.players.guest.as_ref()
    }

    pub fn status(&self) -> RoomStatus {
        self.room.status
    }

    pub fn narration(&self) -> &str {
        self.game.narration()
    }

    pub fn is_host(&self, id: &SessionId) -> bool {
        self.players.host.session_id == *id
    }

    pub fn seat(&self, id: &SessionId) -> Option<&PlayerIdentity> {
        if self.is_host(id) {
            return Some(&self.players.host);
        }
        self.guest().filter(|guest| guest.session_id == *id)
    }

    pub fn is_spectator(&self, id: &SessionId) -> bool {
        self.spectators.iter().any(|s| s.session_id == *id)
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        let host = &self.players.host;
        if host.role != Role::Host {
            return Err(SnapshotError::RoleMismatch);
        }
        if host.display_name.trim().is_empty() {
            return Err(SnapshotError::BlankName(host.session_id.clone()));
        }
        if let Some(guest) = &self.players.guest {
            if guest.role != Role::Guest {
                return Err(SnapshotError::RoleMismatch);
            }
            if guest.session_id == host.session_id {
                return Err(SnapshotError::DuplicateSeat(guest.session_id.clone()));
            }
            if guest.stone == host.stone {
                return Err(SnapshotError::SameColor(guest.stone));
            }
            if guest.display_name.trim().is_empty() {
                return Err(SnapshotError::BlankName(guest.session_id.clone()));
            }
        }

        let game = &self.game;
        if self.room.status == RoomStatus::Finished && !game.is_over() {
            return Err(SnapshotError::StatusMismatch(self.room.status));
        }
        if self.room.status == RoomStatus::Playing && self.players.guest.is_none() {
            return Err(SnapshotError::StatusMismatch(self.room.status));
        }
        if let Some(kind) = game.pending_skill() {
            if game.is_over() {
                return Err(SnapshotError::PendingSkillAfterMatch);
            }
            if !kind.is_targeted() {
                return Err(SnapshotError::UntargetedSkillArmed(kind));
            }
        }
        if (game.status() == MatchStatus::Won) != game.winner().is_some() {
            return Err(SnapshotError::WinnerMismatch);
        }
        let board = game.board();
        let distinct: HashSet<Position> = game.history().iter().map(|m| m.position).collect();
        let consistent = board.stone_count() == game.history().len()
            && distinct.len() == game.history().len()
            && game
                .history()
                .iter()
                .all(|m| board.get(m.position) == Some(m.stone));
        if !consistent {
            return Err(SnapshotError::HistoryMismatch);
        }
        Ok(())
    }
}
