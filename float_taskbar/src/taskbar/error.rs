use super::item::{AppId, ItemId};
use thiserror::Error;

/// Reasons the engine declined to act. None of these reach the user; the
/// display is simply left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("item {0:?} is no longer valid")]
    StaleItem(ItemId),
    #[error("running apps query is unavailable")]
    QueryUnavailable,
    #[error("nothing to display")]
    EmptyQuery,
    #[error("payload {0:?} is not an application")]
    InvalidDropTarget(String),
    #[error("no drop candidate")]
    NoCandidate,
    #[error("{0} cannot be added to favorites")]
    FavoriteRejected(AppId),
    #[error("taskbar is not mapped")]
    NotVisible,
    #[error("a rerender is already pending")]
    AlreadyPending,
}
