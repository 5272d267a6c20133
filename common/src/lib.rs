pub mod gomoku;
pub mod messages;
pub mod room;

pub use gomoku::{MatchState, MatchStatus, Position, SkillKind, Stone};
pub use messages::{Event, MessageError};
pub use room::{InviteCode, SessionId, Snapshot};
