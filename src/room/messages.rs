//! Room actor message types.

use crate::game::{
    GameEvent, MatchError,
    entities::{CardId, LinePattern, MatchView, PlayerId, WinResult},
};
use tokio::sync::{mpsc, oneshot};

/// Messages that can be sent to a RoomActor. Every user intent carries a
/// `oneshot` for its outcome, so rejections reach the requesting player
/// and nobody else.
#[derive(Debug)]
pub enum RoomMessage {
    /// Join the lobby
    Join {
        player_id: PlayerId,
        name: String,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Leave the lobby
    Leave {
        player_id: PlayerId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Toggle readiness in the lobby
    SetReady {
        player_id: PlayerId,
        ready: bool,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Request a manual match start
    RequestStart {
        player_id: PlayerId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Mark a cell against the call history
    Mark {
        player_id: PlayerId,
        card_id: CardId,
        row: usize,
        column: usize,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Unmark a previously marked cell
    Unmark {
        player_id: PlayerId,
        card_id: CardId,
        row: usize,
        column: usize,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Claim bingo on a card; the engine re-evaluates it
    ClaimBingo {
        player_id: PlayerId,
        card_id: CardId,
        response: oneshot::Sender<RoomResponse>,
    },

    /// Suspend the caller without touching pool state
    Pause {
        response: oneshot::Sender<RoomResponse>,
    },

    /// Resume the caller on the same pool
    Resume {
        response: oneshot::Sender<RoomResponse>,
    },

    /// End the match with no winner
    EndMatch {
        response: oneshot::Sender<RoomResponse>,
    },

    /// Get a full match snapshot
    GetView {
        response: oneshot::Sender<MatchView>,
    },

    /// Subscribe to match notifications
    Subscribe {
        player_id: PlayerId,
        sender: mpsc::Sender<RoomNotification>,
    },

    /// Unsubscribe from match notifications
    Unsubscribe { player_id: PlayerId },

    /// Internal: advance the match by one tick (driven by the timer)
    Tick,

    /// Shut the room down
    Close {
        response: oneshot::Sender<RoomResponse>,
    },
}

/// Notification pushed to subscribers when the match changes.
#[derive(Clone, Debug)]
pub enum RoomNotification {
    /// A match event everyone should see
    Event(GameEvent),
    /// An intent of yours was rejected; sent to the requester only
    ValidationRejected {
        intent: &'static str,
        reason: MatchError,
    },
}

/// Response from room operations
#[derive(Clone, Debug)]
pub enum RoomResponse {
    /// Operation succeeded
    Success,

    /// Mark applied; carries the win evaluation that followed it
    Marked(WinResult),

    /// Bingo claim accepted with the winning pattern
    BingoConfirmed(LinePattern),

    /// Operation rejected by the engine
    Rejected(MatchError),

    /// Room is shutting down
    Closed,
}

impl RoomResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        !matches!(self, RoomResponse::Rejected(_) | RoomResponse::Closed)
    }

    /// Get the rejection reason if the operation was rejected
    pub fn rejection(&self) -> Option<&MatchError> {
        match self {
            RoomResponse::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}
