use crate::gomoku::{Position, SkillKind, Stone};
use crate::messages::Event;
use crate::room::identity::{generate_nickname, InviteCode, SessionId};
use crate::room::reducer::Action;
use crate::room::snapshot::{Role, RoomStatus, Snapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
#[error("Error publishing event")]
pub struct PublishError;

// Fire-and-forget: a failed publish is logged and dropped
pub trait Publish {
    fn publish(&self, event: &Event) -> Result<(), PublishError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    CreateRoom { stone: Stone },
    JoinRoom { code: InviteCode },
    ToggleReady,
    PlaceStone(Position),
    InvokeSkill(SkillKind),
    ResetMatch,
    RequestState,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
enum IntentError {
    #[error("You are not in a room yet")]
    NoRoom,
    #[error("Still waiting for the room state from the host")]
    AwaitingSnapshot,
    #[error("A match can only be reset once it has finished")]
    NotFinished,
}

// Only the host answers join and state requests. Everyone else adopts
// whatever snapshot arrives last.
#[derive(Debug)]
pub struct Session<R: Rng> {
    id: SessionId,
    name: String,
    room: Option<InviteCode>,
    snapshot: Option<Snapshot>,
    presence: Vec<SessionId>,
    notice: String,
    rng: R,
}

impl Session<StdRng> {
    pub fn new(id: SessionId, name: String) -> Self {
        Session::with_rng(id, name, StdRng::from_entropy())
    }
}

impl<R: Rng> Session<R> {
    // The channel refuses blank ids and names, so those get generated ones
    pub fn with_rng(id: SessionId, name: String, mut rng: R) -> Self {
        let id = if id.is_blank() { SessionId::generate() } else { id };
        let name = match name.trim() {
            "" => generate_nickname(&mut rng),
            trimmed => trimmed.to_string(),
        };
        Session {
            id,
            name,
            room: None,
            snapshot: None,
            presence: Vec::new(),
            notice: "Create a room or join one with a code".to_string(),
            rng,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn room(&self) -> Option<&InviteCode> {
        self.room.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn presence(&self) -> &[SessionId] {
        &self.presence
    }

    pub fn room_status(&self) -> RoomStatus {
        self.snapshot
            .as_ref()
            .map_or(RoomStatus::Idle, |snapshot| snapshot.status())
    }

    pub fn role(&self) -> Option<Role> {
        self.snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.seat(&self.id))
            .map(|seat| seat.role)
    }

    pub fn narration(&self) -> &str {
        match &self.snapshot {
            Some(snapshot) => snapshot.narration(),
            None => &self.notice,
        }
    }

    pub fn handle_intent(&mut self, intent: Intent, channel: &impl Publish) -> bool {
        debug!(session = %self.id, ?intent, "handling intent");
        match intent {
            Intent::CreateRoom { stone } => {
                let code = InviteCode::generate(&mut self.rng);
                info!(session = %self.id, %code, %stone, "creating room");
                let snapshot = Snapshot::create(self.id.clone(), self.name.clone(), stone, code.clone());
                self.room = Some(code);
                self.adopt_and_publish(snapshot, channel);
                true
            }
            Intent::JoinRoom { code } => {
                info!(session = %self.id, %code, "joining room");
                self.notice = format!("Joining room {}", code);
                self.room = Some(code);
                self.snapshot = None;
                self.presence.clear();
                publish(
                    channel,
                    &Event::JoinRequest {
                        player_id: self.id.clone(),
                        name: self.name.clone(),
                    },
                );
                true
            }
            Intent::RequestState => {
                if self.room.is_none() {
                    return self.reject(IntentError::NoRoom);
                }
                publish(
                    channel,
                    &Event::StateRequest {
                        player_id: self.id.clone(),
                    },
                );
                true
            }
            Intent::ToggleReady => self.act(Action::ToggleReady, channel),
            Intent::PlaceStone(position) => self.act(Action::PlaceStone(position), channel),
            Intent::InvokeSkill(kind) => self.act(Action::InvokeSkill(kind), channel),
            Intent::ResetMatch => {
                // Resetting mid-match is a policy decision kept out of the reducer
                if self.snapshot.is_some() && self.room_status() != RoomStatus::Finished {
                    return self.reject(IntentError::NotFinished);
                }
                self.act(Action::ResetMatch, channel)
            }
        }
    }

    pub fn handle_event(&mut self, event: Event, channel: &impl Publish) {
        if self.room.is_none() {
            debug!(session = %self.id, kind = event.kind(), "not in a room, ignoring event");
            return;
        }
        match event {
            // No merging: whatever arrives replaces everything we had
            Event::Snapshot(snapshot) => {
                self.snapshot = Some(*snapshot);
            }
            Event::JoinRequest { player_id, name } => {
                let Some(current) = self.hosted_snapshot() else {
                    return;
                };
                if player_id == self.id {
                    return;
                }
                let transition = current.reduce(&player_id, Action::Join { name });
                if transition.applied {
                    self.adopt_and_publish(transition.snapshot, channel);
                } else {
                    warn!(session = %self.id, %player_id, "join request refused");
                }
            }
            Event::StateRequest { player_id } => {
                if let Some(current) = self.hosted_snapshot() {
                    debug!(session = %self.id, %player_id, "answering state request");
                    publish(channel, &Event::snapshot(current));
                }
            }
            Event::Presence { members } => {
                self.presence = members;
            }
        }
    }

    // Some only when this participant hosts the room it holds
    fn hosted_snapshot(&self) -> Option<&Snapshot> {
        self.snapshot
            .as_ref()
            .filter(|snapshot| snapshot.is_host(&self.id))
    }

    fn act(&mut self, action: Action, channel: &impl Publish) -> bool {
        let Some(current) = &self.snapshot else {
            let err = match self.room {
                Some(_) => IntentError::AwaitingSnapshot,
                None => IntentError::NoRoom,
            };
            return self.reject(err);
        };
        let transition = current.reduce(&self.id, action);
        if transition.applied {
            self.adopt_and_publish(transition.snapshot, channel);
        } else {
            debug!(session = %self.id, narration = transition.snapshot.narration(), "action rejected");
            self.snapshot = Some(transition.snapshot);
        }
        transition.applied
    }

    fn reject(&mut self, err: IntentError) -> bool {
        let message = err.to_string();
        match self.snapshot.as_mut() {
            Some(snapshot) => snapshot.game = snapshot.game.with_narration(message),
            None => self.notice = message,
        }
        false
    }

    fn adopt_and_publish(&mut self, snapshot: Snapshot, channel: &impl Publish) {
        publish(channel, &Event::snapshot(&snapshot));
        self.snapshot = Some(snapshot);
    }
}

fn publish(channel: &impl Publish, event: &Event) {
    if let Err(err) = channel.publish(event) {
        warn!(kind = event.kind(), "{}", err);
    }
}
