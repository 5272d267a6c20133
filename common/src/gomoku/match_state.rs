use crate::gomoku::board::{Board, Move, Occupied, Position};
use crate::gomoku::skill::{self, SkillError, SkillInventory, SkillKind};
use crate::gomoku::stone::{ByStone, Stone, FIRST_TURN};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Playing,
    Won,
    Draw,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("The match is over. Reset to play again")]
    MatchOver,
    #[error("It is {turn}'s turn")]
    NotYourTurn { turn: Stone },
    #[error(transparent)]
    Occupied(#[from] Occupied),
    #[error(transparent)]
    Skill(#[from] SkillError),
}

// Rejected actions come back with the previous state and a new narration
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub state: MatchState,
    pub applied: bool,
    pub message: String,
}

impl Resolution {
    pub(crate) fn from_result<E: fmt::Display>(prior: &MatchState, result: Result<MatchState, E>) -> Self {
        match result {
            Ok(state) => Resolution {
                message: state.narration.clone(),
                state,
                applied: true,
            },
            Err(err) => {
                let message = err.to_string();
                let mut state = prior.clone();
                state.narration = message.clone();
                Resolution {
                    state,
                    applied: false,
                    message,
                }
            }
        }
    }
}

// Invariants:
// - status != Playing implies pending_skill is None
// - winner is Some exactly when status == Won
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MatchState {
    pub(crate) board: Board,
    pub(crate) history: Vec<Move>,
    pub(crate) turn: Stone,
    pub(crate) status: MatchStatus,
    pub(crate) winner: Option<Stone>,
    pub(crate) scores: ByStone<u32>,
    pub(crate) skills: ByStone<SkillInventory>,
    pub(crate) pending_skill: Option<SkillKind>,
    pub(crate) narration: String,
}

impl Default for MatchState {
    fn default() -> Self {
        MatchState::new(ByStone::default())
    }
}

impl MatchState {
    pub fn new(scores: ByStone<u32>) -> Self {
        MatchState {
            board: Board::new(),
            history: Vec::new(),
            turn: FIRST_TURN,
            status: MatchStatus::Playing,
            winner: None,
            scores,
            skills: ByStone::default(),
            pending_skill: None,
            narration: format!("{} moves first", FIRST_TURN),
        }
    }

    pub fn rematch(&self) -> Self {
        MatchState::new(self.scores.clone())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn turn(&self) -> Stone {
        self.turn
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn winner(&self) -> Option<Stone> {
        self.winner
    }

    pub fn scores(&self) -> &ByStone<u32> {
        &self.scores
    }

    pub fn skills(&self, stone: Stone) -> &SkillInventory {
        &self.skills[stone]
    }

    pub fn pending_skill(&self) -> Option<SkillKind> {
        self.pending_skill
    }

    pub fn narration(&self) -> &str {
        &self.narration
    }

    pub fn with_narration(&self, narration: impl Into<String>) -> Self {
        MatchState {
            narration: narration.into(),
            ..self.clone()
        }
    }

    pub fn is_over(&self) -> bool {
        self.status != MatchStatus::Playing
    }

    pub fn place_stone(&self, actor: Stone, position: Position) -> Resolution {
        if let Err(err) = self.ensure_can_act(actor) {
            return Resolution::from_result(self, Err(err));
        }
        if self.pending_skill == Some(SkillKind::AreaClear) {
            return skill::area_clear(self, actor, position);
        }
        Resolution::from_result(self, self.try_place(actor, position))
    }

    pub fn invoke_skill(&self, actor: Stone, kind: SkillKind) -> Resolution {
        if let Err(err) = self.ensure_can_act(actor) {
            return Resolution::from_result(self, Err(err));
        }
        match kind {
            SkillKind::AreaClear => Resolution::from_result(self, self.try_toggle_arm(actor, kind)),
            SkillKind::ForceUndo => skill::force_undo(self, actor),
            SkillKind::DoubleUndo => skill::double_undo(self, actor),
        }
    }

    fn ensure_can_act(&self, actor: Stone) -> Result<(), PlayError> {
        if self.is_over() {
            return Err(PlayError::MatchOver);
        }
        if actor != self.turn {
            return Err(PlayError::NotYourTurn { turn: self.turn });
        }
        Ok(())
    }

    fn try_place(&self, actor: Stone, position: Position) -> Result<MatchState, PlayError> {
        let board = self.board.place_stone(position, actor)?;
        let mut next = self.clone();
        next.history.push(Move {
            position,
            stone: actor,
        });
        // Win takes precedence over a full board
        if board.check_win(position, actor) {
            next.status = MatchStatus::Won;
            next.winner = Some(actor);
            next.scores[actor] += 1;
            next.pending_skill = None;
            next.narration = format!("{} wins with five in a row!", actor);
        } else if board.is_full() {
            next.status = MatchStatus::Draw;
            next.pending_skill = None;
            next.narration = "The board is full. It's a draw".to_string();
        } else {
            next.turn = actor.opponent();
            next.narration = format!("{} played {}. {} to move", actor, position, next.turn);
        }
        next.board = board;
        Ok(next)
    }

    fn try_toggle_arm(&self, actor: Stone, kind: SkillKind) -> Result<MatchState, PlayError> {
        let mut next = self.clone();
        if self.pending_skill == Some(kind) {
            next.pending_skill = None;
            next.narration = format!("{} put {} away", actor, kind);
            return Ok(next);
        }
        skill::ensure_uses(self, actor, kind)?;
        next.pending_skill = Some(kind);
        next.narration = format!("{} readied {}. Pick a target", actor, kind);
        Ok(next)
    }

    // A skill that removes stones voids any result those stones produced
    pub(crate) fn reopen(&mut self) {
        self.status = MatchStatus::Playing;
        self.winner = None;
    }
}
