use crate::gomoku::board::Position;
use crate::gomoku::match_state::{MatchState, Resolution};
use crate::gomoku::stone::Stone;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const USES_PER_MATCH: u32 = 1;

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SkillKind {
    // Clears the 3x3 block around a chosen cell
    AreaClear,
    // Takes back the opponent's last stone
    ForceUndo,
    // Takes back the opponent's last stone and the caster's one before it
    DoubleUndo,
}

impl SkillKind {
    pub const ALL: [SkillKind; 3] = [
        SkillKind::AreaClear,
        SkillKind::ForceUndo,
        SkillKind::DoubleUndo,
    ];

    pub fn is_targeted(self) -> bool {
        matches!(self, SkillKind::AreaClear)
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillKind::AreaClear => write!(f, "Area Clear"),
            SkillKind::ForceUndo => write!(f, "Force Undo"),
            SkillKind::DoubleUndo => write!(f, "Double Undo"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkillError {
    #[error("{stone} has no {kind} left this match")]
    Exhausted { stone: Stone, kind: SkillKind },
    #[error("There are no stones around {target} to clear")]
    NothingToClear { target: Position },
    #[error("{stone} can only undo a move {opponent} just made")]
    NoOpponentMove { stone: Stone, opponent: Stone },
    #[error("{stone} needs a move of their own followed by one from {opponent} to use Double Undo")]
    NoExchange { stone: Stone, opponent: Stone },
}

// Counts only ever go down during a match. A new match starts a new inventory.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SkillInventory {
    area_clear: u32,
    force_undo: u32,
    double_undo: u32,
}

impl Default for SkillInventory {
    fn default() -> Self {
        SkillInventory {
            area_clear: USES_PER_MATCH,
            force_undo: USES_PER_MATCH,
            double_undo: USES_PER_MATCH,
        }
    }
}

impl SkillInventory {
    pub fn empty() -> Self {
        SkillInventory {
            area_clear: 0,
            force_undo: 0,
            double_undo: 0,
        }
    }

    pub fn uses_left(&self, kind: SkillKind) -> u32 {
        match kind {
            SkillKind::AreaClear => self.area_clear,
            SkillKind::ForceUndo => self.force_undo,
            SkillKind::DoubleUndo => self.double_undo,
        }
    }

    fn consume(&mut self, kind: SkillKind) {
        let uses = match kind {
            SkillKind::AreaClear => &mut self.area_clear,
            SkillKind::ForceUndo => &mut self.force_undo,
            SkillKind::DoubleUndo => &mut self.double_undo,
        };
        *uses = uses.saturating_sub(1);
    }
}

pub(crate) fn ensure_uses(state: &MatchState, stone: Stone, kind: SkillKind) -> Result<(), SkillError> {
    if state.skills[stone].uses_left(kind) == 0 {
        return Err(SkillError::Exhausted { stone, kind });
    }
    Ok(())
}

pub fn area_clear(state: &MatchState, caster: Stone, target: Position) -> Resolution {
    Resolution::from_result(state, try_area_clear(state, caster, target))
}

pub fn force_undo(state: &MatchState, caster: Stone) -> Resolution {
    Resolution::from_result(state, try_force_undo(state, caster))
}

pub fn double_undo(state: &MatchState, caster: Stone) -> Resolution {
    Resolution::from_result(state, try_double_undo(state, caster))
}

fn try_area_clear(state: &MatchState, caster: Stone, target: Position) -> Result<MatchState, SkillError> {
    ensure_uses(state, caster, SkillKind::AreaClear)?;
    let cleared: Vec<Position> = target
        .neighbourhood()
        .into_iter()
        .filter(|position| state.board.get(*position).is_some())
        .collect();
    if cleared.is_empty() {
        return Err(SkillError::NothingToClear { target });
    }

    // Stones of either color go, and so do their history entries
    let mut next = state.clone();
    next.board = state.board.with_cleared(&cleared);
    next.history.retain(|m| !cleared.contains(&m.position));
    next.narration = format!(
        "{} used {} on {} and cleared {} stone(s). {} to move",
        caster,
        SkillKind::AreaClear,
        target,
        cleared.len(),
        next.turn
    );
    Ok(spend(next, caster, SkillKind::AreaClear))
}

fn try_force_undo(state: &MatchState, caster: Stone) -> Result<MatchState, SkillError> {
    ensure_uses(state, caster, SkillKind::ForceUndo)?;
    let opponent = caster.opponent();
    let last = match state.history.last() {
        Some(last) if last.stone == opponent => *last,
        _ => return Err(SkillError::NoOpponentMove { stone: caster, opponent }),
    };

    let mut next = state.clone();
    next.history.pop();
    next.board = state.board.with_cleared(&[last.position]);
    next.narration = format!(
        "{} used {} and took back {}'s stone at {}",
        caster,
        SkillKind::ForceUndo,
        opponent,
        last.position
    );
    Ok(spend(next, caster, SkillKind::ForceUndo))
}

fn try_double_undo(state: &MatchState, caster: Stone) -> Result<MatchState, SkillError> {
    ensure_uses(state, caster, SkillKind::DoubleUndo)?;
    let opponent = caster.opponent();
    let (own, theirs) = match state.history.as_slice() {
        [.., own, theirs] if own.stone == caster && theirs.stone == opponent => (*own, *theirs),
        _ => return Err(SkillError::NoExchange { stone: caster, opponent }),
    };

    let mut next = state.clone();
    next.history.truncate(state.history.len() - 2);
    next.board = state.board.with_cleared(&[own.position, theirs.position]);
    next.narration = format!(
        "{} used {} and rewound {} and {}",
        caster,
        SkillKind::DoubleUndo,
        own.position,
        theirs.position
    );
    Ok(spend(next, caster, SkillKind::DoubleUndo))
}

fn spend(mut next: MatchState, caster: Stone, kind: SkillKind) -> MatchState {
    next.skills[caster].consume(kind);
    next.pending_skill = None;
    next.reopen();
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gomoku::board::Move;
    use crate::gomoku::match_state::MatchStatus;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col).unwrap()
    }

    fn play(moves: &[(usize, usize)]) -> MatchState {
        moves.iter().fold(MatchState::default(), |state, &(row, col)| {
            let turn = state.turn();
            let resolution = state.place_stone(turn, pos(row, col));
            assert!(resolution.applied, "{}", resolution.message);
            resolution.state
        })
    }

    #[test]
    fn test_area_clear_on_empty_area_keeps_use() {
        let state = play(&[(7, 7), (7, 8)]);
        let resolution = area_clear(&state, Stone::Black, pos(0, 0));
        assert!(!resolution.applied);
        assert_eq!(
            resolution.state.skills(Stone::Black).uses_left(SkillKind::AreaClear),
            1
        );
        assert_eq!(resolution.state.board(), state.board());
        assert_eq!(resolution.state.history(), state.history());
        assert_eq!(resolution.message, "There are no stones around (0, 0) to clear");
    }

    #[test]
    fn test_area_clear_removes_neighbours_from_board_and_history() {
        // (7,7) B, (7,8) W, (3,3) B, (8,8) W, (0,0) B
        let state = play(&[(7, 7), (7, 8), (3, 3), (8, 8), (0, 0)]);
        let resolution = area_clear(&state, Stone::White, pos(7, 7));
        assert!(resolution.applied);
        let next = resolution.state;
        assert_eq!(next.board().stone_count(), 2);
        assert_eq!(
            next.history(),
            &[
                Move {
                    position: pos(3, 3),
                    stone: Stone::Black
                },
                Move {
                    position: pos(0, 0),
                    stone: Stone::Black
                },
            ]
        );
        assert_eq!(next.skills(Stone::White).uses_left(SkillKind::AreaClear), 0);
        assert_eq!(next.skills(Stone::Black).uses_left(SkillKind::AreaClear), 1);
    }

    #[test]
    fn test_area_clear_needs_uses() {
        let state = play(&[(7, 7)]);
        let spent = area_clear(&state, Stone::White, pos(7, 7)).state;
        let again = play_on(spent, &[(1, 1), (2, 2)]);
        let resolution = area_clear(&again, Stone::White, pos(1, 1));
        assert!(!resolution.applied);
        assert_eq!(resolution.state.board().stone_count(), 2);
    }

    fn play_on(state: MatchState, moves: &[(usize, usize)]) -> MatchState {
        moves.iter().fold(state, |state, &(row, col)| {
            let turn = state.turn();
            state.place_stone(turn, pos(row, col)).state
        })
    }

    #[test]
    fn test_area_clear_voids_a_win() {
        let state = play(&[(7, 3), (0, 0), (7, 4), (0, 2), (7, 5), (0, 4), (7, 6), (0, 6), (7, 7)]);
        assert_eq!(state.status(), MatchStatus::Won);
        // The resolver does not gate on status, callers do
        let resolution = area_clear(&state, Stone::White, pos(7, 6));
        assert!(resolution.applied);
        assert_eq!(resolution.state.status(), MatchStatus::Playing);
        assert_eq!(resolution.state.winner(), None);
    }

    #[test]
    fn test_force_undo_with_empty_history() {
        let state = MatchState::default();
        let resolution = force_undo(&state, Stone::Black);
        assert!(!resolution.applied);
        assert_eq!(
            resolution.state.skills(Stone::Black).uses_left(SkillKind::ForceUndo),
            1
        );
    }

    #[test]
    fn test_force_undo_after_own_move() {
        let state = play(&[(7, 7)]);
        let resolution = force_undo(&state, Stone::Black);
        assert!(!resolution.applied);
        assert_eq!(resolution.state.history().len(), 1);
        assert_eq!(
            resolution.state.skills(Stone::Black).uses_left(SkillKind::ForceUndo),
            1
        );
    }

    #[test]
    fn test_force_undo_removes_opponent_move() {
        let state = play(&[(7, 7), (7, 8)]);
        let resolution = force_undo(&state, Stone::Black);
        assert!(resolution.applied);
        let next = resolution.state;
        assert_eq!(next.history().len(), 1);
        assert_eq!(next.board().get(pos(7, 8)), None);
        assert_eq!(next.board().get(pos(7, 7)), Some(Stone::Black));
        assert_eq!(next.turn(), Stone::Black);
        assert_eq!(next.skills(Stone::Black).uses_left(SkillKind::ForceUndo), 0);
    }

    #[test]
    fn test_double_undo_needs_exchange() {
        assert!(!double_undo(&MatchState::default(), Stone::Black).applied);
        // Only one move on record
        assert!(!double_undo(&play(&[(7, 7)]), Stone::White).applied);
        // Last move is the caster's own
        assert!(!double_undo(&play(&[(7, 7), (7, 8), (6, 6)]), Stone::Black).applied);
    }

    #[test]
    fn test_double_undo_removes_both_moves() {
        let state = play(&[(7, 7), (7, 8), (6, 6)]);
        let resolution = double_undo(&state, Stone::White);
        assert!(resolution.applied);
        let next = resolution.state;
        assert_eq!(
            next.history(),
            &[Move {
                position: pos(7, 7),
                stone: Stone::Black
            }]
        );
        assert_eq!(next.board().stone_count(), 1);
        assert_eq!(next.skills(Stone::White).uses_left(SkillKind::DoubleUndo), 0);
        assert_eq!(next.turn(), Stone::White);
    }

    #[test]
    fn test_untargeted_skill_disarms_pending() {
        let state = play(&[(7, 7), (7, 8)]);
        let armed = state.invoke_skill(Stone::Black, SkillKind::AreaClear).state;
        let resolution = armed.invoke_skill(Stone::Black, SkillKind::ForceUndo);
        assert!(resolution.applied);
        assert_eq!(resolution.state.pending_skill(), None);
        assert_eq!(
            resolution.state.skills(Stone::Black).uses_left(SkillKind::AreaClear),
            1
        );
    }
}
