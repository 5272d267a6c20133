mod identity;
mod reducer;
mod session;
mod snapshot;

pub use identity::{generate_nickname, InviteCode, InviteCodeError, SessionId, INVITE_CODE_LEN};
pub use reducer::{Action, RoomError, Transition};
pub use session::{Intent, Publish, PublishError, Session};
pub use snapshot::{
    PlayerIdentity, Players, Role, RoomState, RoomStatus, Snapshot, SnapshotError, Spectator,
};
