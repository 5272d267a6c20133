use crate::gomoku::{MatchState, Position, Resolution, SkillKind, Stone};
use crate::room::identity::SessionId;
use crate::room::snapshot::{PlayerIdentity, Role, RoomStatus, Snapshot, Spectator};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Join { name: String },
    ToggleReady,
    PlaceStone(Position),
    InvokeSkill(SkillKind),
    ResetMatch,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("Only seated players can do that")]
    NotSeated,
    #[error("Moves can only be made while a match is playing. The room is {0}")]
    NotPlaying(RoomStatus),
    #[error("Ready checks happen in the lobby. The room is {0}")]
    NotInLobby(RoomStatus),
    #[error("The host is already seated")]
    HostRejoin,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub snapshot: Snapshot,
    pub applied: bool,
}

impl Transition {
    fn applied(snapshot: Snapshot) -> Self {
        Transition {
            snapshot,
            applied: true,
        }
    }

    // Rejections keep everything but the narration
    fn rejected(prior: &Snapshot, err: RoomError) -> Self {
        let mut snapshot = prior.clone();
        snapshot.game = prior.game.with_narration(err.to_string());
        Transition {
            snapshot,
            applied: false,
        }
    }
}

impl Snapshot {
    pub fn reduce(&self, actor: &SessionId, action: Action) -> Transition {
        debug!(%actor, ?action, "reducing room action");
        match action {
            Action::Join { name } => self.join(actor, name),
            Action::ToggleReady => self.toggle_ready(actor),
            Action::PlaceStone(position) => {
                self.play(actor, |game, stone| game.place_stone(stone, position))
            }
            Action::InvokeSkill(kind) => self.play(actor, |game, stone| game.invoke_skill(stone, kind)),
            Action::ResetMatch => self.reset(actor),
        }
    }

    // Seats the first newcomer as guest. Anyone after that watches.
    fn join(&self, actor: &SessionId, name: String) -> Transition {
        if self.is_host(actor) {
            return Transition::rejected(self, RoomError::HostRejoin);
        }
        let mut next = self.clone();
        let returning = self.guest().map(|guest| guest.session_id == *actor);
        match returning {
            Some(true) => {
                if let Some(guest) = next.players.guest.as_mut() {
                    guest.display_name = name;
                }
            }
            Some(false) => {
                match next.spectators.iter_mut().find(|s| s.session_id == *actor) {
                    Some(spectator) => spectator.display_name = name,
                    None => next.spectators.push(Spectator {
                        session_id: actor.clone(),
                        display_name: name,
                    }),
                }
            }
            None => {
                let stone = self.players.host.stone.opponent();
                next.spectators.retain(|s| s.session_id != *actor);
                next.players.host.ready = false;
                next.room.status = RoomStatus::Lobby;
                next.game = MatchState::default().with_narration(format!(
                    "{} joined as {}. Both players, get ready",
                    name, stone
                ));
                next.players.guest = Some(PlayerIdentity {
                    session_id: actor.clone(),
                    display_name: name,
                    stone,
                    role: Role::Guest,
                    ready: false,
                });
            }
        }
        Transition::applied(next)
    }

    fn toggle_ready(&self, actor: &SessionId) -> Transition {
        if self.seat(actor).is_none() {
            return Transition::rejected(self, RoomError::NotSeated);
        }
        if self.room.status != RoomStatus::Lobby {
            return Transition::rejected(self, RoomError::NotInLobby(self.room.status));
        }
        let mut next = self.clone();
        let seat = if self.is_host(actor) {
            &mut next.players.host
        } else {
            match next.players.guest.as_mut() {
                Some(guest) => guest,
                None => return Transition::rejected(self, RoomError::NotSeated),
            }
        };
        seat.ready = !seat.ready;

        let host_ready = next.players.host.ready;
        let narration = match next.players.guest.as_mut() {
            Some(guest) if host_ready && guest.ready => {
                // Both flags are spent on the start so a rematch needs a fresh pair
                guest.ready = false;
                next.players.host.ready = false;
                next.room.status = RoomStatus::Playing;
                next.game = next.game.rematch();
                None
            }
            Some(guest) => {
                let host_name = &next.players.host.display_name;
                Some(match (host_ready, guest.ready) {
                    (true, false) => format!("{} is ready. Waiting for {}", host_name, guest.display_name),
                    (false, true) => format!("{} is ready. Waiting for {}", guest.display_name, host_name),
                    _ => "Waiting for both players to get ready".to_string(),
                })
            }
            None => Some("Waiting for an opponent to join".to_string()),
        };
        if let Some(narration) = narration {
            next.game = next.game.with_narration(narration);
        }
        Transition::applied(next)
    }

    fn play<F>(&self, actor: &SessionId, act: F) -> Transition
    where
        F: FnOnce(&MatchState, Stone) -> Resolution,
    {
        let stone = match self.seat(actor) {
            Some(seat) => seat.stone,
            None => return Transition::rejected(self, RoomError::NotSeated),
        };
        if self.room.status != RoomStatus::Playing {
            return Transition::rejected(self, RoomError::NotPlaying(self.room.status));
        }
        let resolution = act(&self.game, stone);
        let mut next = self.clone();
        if resolution.applied && resolution.state.is_over() {
            next.room.status = RoomStatus::Finished;
        }
        next.game = resolution.state;
        Transition {
            snapshot: next,
            applied: resolution.applied,
        }
    }

    fn reset(&self, actor: &SessionId) -> Transition {
        if self.seat(actor).is_none() {
            return Transition::rejected(self, RoomError::NotSeated);
        }
        let mut next = self.clone();
        next.players.host.ready = false;
        if let Some(guest) = next.players.guest.as_mut() {
            guest.ready = false;
        }
        next.room.status = RoomStatus::Lobby;
        next.game = self
            .game
            .rematch()
            .with_narration("New match. Both players, get ready");
        Transition::applied(next)
    }
}
