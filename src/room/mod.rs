//! Room management: one actor task per match.
//!
//! The actor serializes intents from the presentation layer, drives the
//! caller's clock, and pushes notifications to subscribers.

pub mod actor;
pub mod config;
pub mod messages;

pub use actor::{RoomActor, RoomHandle, spawn_room};
pub use config::{CallSpeed, RoomConfig};
pub use messages::{RoomMessage, RoomNotification, RoomResponse};
