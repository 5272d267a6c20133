mod board;
mod match_state;
mod skill;
mod stone;

pub use board::{Board, BoardPositionError, Coordinate, Move, Occupied, Position, BOARD_SIZE, WIN_LENGTH};
pub use match_state::{MatchState, MatchStatus, PlayError, Resolution};
pub use skill::{area_clear, double_undo, force_undo, SkillError, SkillInventory, SkillKind, USES_PER_MATCH};
pub use stone::{ByStone, Stone, FIRST_TURN};
