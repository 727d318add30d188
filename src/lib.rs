//! # Big Bingo
//!
//! A 75-ball bingo game engine using a type-safe finite state machine (FSM) design.
//!
//! This library provides a complete bingo match engine: card generation,
//! draws without replacement, mark validation against the call history,
//! win detection, and the match lifecycle. The core is implemented as an
//! FSM using `enum_dispatch` for zero-cost trait dispatch; a tokio actor
//! in [`room`] wraps it with the caller's clock and an intent/event
//! interface for presentation layers.
//!
//! ## Architecture
//!
//! A match moves through 4 phases (states):
//!
//! - **Lobby**: Players join and toggle readiness
//! - **Starting**: Fixed countdown before play, ticked at 1Hz
//! - **Active**: The caller draws balls on a randomized cadence while
//!   players mark their cards; the first completed line wins
//! - **Finished**: Terminal; a new match needs a fresh room
//!
//! The engine owns all match state exclusively. Presentation layers are
//! observers: they render [`MatchView`](game::entities::MatchView)
//! snapshots and forward intents, nothing more.
//!
//! ## Core Modules
//!
//! - [`game`]: Card, pool, win detection, and the match state machine
//! - [`room`]: Actor wrapper serializing intents and driving the caller
//!
//! ## Example
//!
//! ```
//! use big_bingo::BingoState;
//!
//! // Create a new match in the lobby state
//! let game = BingoState::new();
//! ```

/// Core match logic, entities, and state machine.
pub mod game;
pub use game::{
    BingoState, GameSettings, GameStateManagement, MatchError, PlayManagement, RosterManagement,
    constants::{self, DEFAULT_MAX_PLAYERS, MIN_PLAYERS, NUM_BALLS},
    entities, functional,
};

/// Room actor: serialized intents, the caller's clock, and notifications.
pub mod room;
pub use room::{RoomActor, RoomConfig, RoomHandle, spawn_room};
