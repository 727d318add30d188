//! Room actor implementation with async message handling.
//!
//! One actor task owns one match. Serializing every intent and the
//! caller's clock through a single inbox is what guarantees at-most-one
//! in-flight draw and a strictly ordered call history.

use super::{
    config::RoomConfig,
    messages::{RoomMessage, RoomNotification, RoomResponse},
};
use crate::game::{
    BingoState, GameStateManagement, MatchError, PlayManagement, RosterManagement,
    entities::{CardId, MatchView, PlayerId},
};
use std::collections::HashMap;
use tokio::{
    sync::{mpsc, oneshot},
    time::interval,
};

/// Room actor handle for sending messages
#[derive(Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
}

impl RoomHandle {
    /// Send a raw message to the room
    pub async fn send(&self, message: RoomMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Room is closed".to_string())
    }

    async fn request<F>(&self, build: F) -> RoomResponse
    where
        F: FnOnce(oneshot::Sender<RoomResponse>) -> RoomMessage,
    {
        let (tx, rx) = oneshot::channel();
        if self.send(build(tx)).await.is_err() {
            return RoomResponse::Closed;
        }
        rx.await.unwrap_or(RoomResponse::Closed)
    }

    pub async fn join(&self, player_id: PlayerId, name: &str) -> RoomResponse {
        let name = name.to_string();
        self.request(|response| RoomMessage::Join {
            player_id,
            name,
            response,
        })
        .await
    }

    pub async fn leave(&self, player_id: PlayerId) -> RoomResponse {
        self.request(|response| RoomMessage::Leave {
            player_id,
            response,
        })
        .await
    }

    pub async fn set_ready(&self, player_id: PlayerId, ready: bool) -> RoomResponse {
        self.request(|response| RoomMessage::SetReady {
            player_id,
            ready,
            response,
        })
        .await
    }

    pub async fn request_start(&self, player_id: PlayerId) -> RoomResponse {
        self.request(|response| RoomMessage::RequestStart {
            player_id,
            response,
        })
        .await
    }

    pub async fn mark(
        &self,
        player_id: PlayerId,
        card_id: CardId,
        row: usize,
        column: usize,
    ) -> RoomResponse {
        self.request(|response| RoomMessage::Mark {
            player_id,
            card_id,
            row,
            column,
            response,
        })
        .await
    }

    pub async fn unmark(
        &self,
        player_id: PlayerId,
        card_id: CardId,
        row: usize,
        column: usize,
    ) -> RoomResponse {
        self.request(|response| RoomMessage::Unmark {
            player_id,
            card_id,
            row,
            column,
            response,
        })
        .await
    }

    pub async fn claim_bingo(&self, player_id: PlayerId, card_id: CardId) -> RoomResponse {
        self.request(|response| RoomMessage::ClaimBingo {
            player_id,
            card_id,
            response,
        })
        .await
    }

    pub async fn pause(&self) -> RoomResponse {
        self.request(|response| RoomMessage::Pause { response }).await
    }

    pub async fn resume(&self) -> RoomResponse {
        self.request(|response| RoomMessage::Resume { response })
            .await
    }

    pub async fn end_match(&self) -> RoomResponse {
        self.request(|response| RoomMessage::EndMatch { response })
            .await
    }

    pub async fn close(&self) -> RoomResponse {
        self.request(|response| RoomMessage::Close { response })
            .await
    }

    /// Fetch a full match snapshot
    pub async fn view(&self) -> Option<MatchView> {
        let (tx, rx) = oneshot::channel();
        if self
            .send(RoomMessage::GetView { response: tx })
            .await
            .is_err()
        {
            return None;
        }
        rx.await.ok()
    }

    /// Subscribe to match notifications; returns the receiving end
    pub async fn subscribe(&self, player_id: PlayerId) -> mpsc::Receiver<RoomNotification> {
        let (tx, rx) = mpsc::channel(64);
        let _ = self
            .send(RoomMessage::Subscribe {
                player_id,
                sender: tx,
            })
            .await;
        rx
    }

    /// Advance the match by one tick, out of band of the timer. Tests
    /// use this to drive the countdown and caller deterministically.
    pub async fn tick(&self) {
        let _ = self.send(RoomMessage::Tick).await;
    }
}

/// Room actor managing a single bingo match
pub struct RoomActor {
    /// Room configuration
    config: RoomConfig,

    /// Match state (FSM)
    state: BingoState,

    /// Message inbox
    inbox: mpsc::Receiver<RoomMessage>,

    /// Subscribers for match notifications
    subscribers: HashMap<PlayerId, mpsc::Sender<RoomNotification>>,

    /// Is room shut down
    is_closed: bool,
}

impl RoomActor {
    /// Create a new room actor and its handle.
    pub fn new(config: RoomConfig) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(100);

        let state = BingoState::from(config.game_settings());

        let actor = Self {
            config,
            state,
            inbox,
            subscribers: HashMap::new(),
            is_closed: false,
        };

        let handle = RoomHandle { sender };

        (actor, handle)
    }

    /// Run the room actor event loop
    pub async fn run(mut self) {
        log::info!("Room '{}' starting", self.config.name);

        let mut tick_interval = interval(self.config.tick_interval);

        loop {
            tokio::select! {
                // Handle incoming intents
                Some(message) = self.inbox.recv() => {
                    self.handle_message(message);

                    if self.is_closed {
                        break;
                    }
                }

                // Periodic ticks: the countdown and the caller's clock
                _ = tick_interval.tick() => {
                    if !self.is_closed {
                        self.tick();
                    }
                }
            }
        }

        log::info!("Room '{}' closed", self.config.name);
    }

    /// Handle a room message
    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                player_id,
                name,
                response,
            } => {
                let result = self.state.join(player_id, &name);
                self.respond(player_id, "join", result.map(|()| RoomResponse::Success), response);
            }

            RoomMessage::Leave {
                player_id,
                response,
            } => {
                let result = self.state.leave(player_id);
                self.respond(player_id, "leave", result.map(|()| RoomResponse::Success), response);
            }

            RoomMessage::SetReady {
                player_id,
                ready,
                response,
            } => {
                let result = self.state.set_ready(player_id, ready);
                self.respond(
                    player_id,
                    "set_ready",
                    result.map(|()| RoomResponse::Success),
                    response,
                );
            }

            RoomMessage::RequestStart {
                player_id,
                response,
            } => {
                let result = self.state.request_start(player_id);
                self.respond(
                    player_id,
                    "request_start",
                    result.map(|()| RoomResponse::Success),
                    response,
                );
            }

            RoomMessage::Mark {
                player_id,
                card_id,
                row,
                column,
                response,
            } => {
                let result = self.state.mark(player_id, card_id, row, column);
                self.respond(player_id, "mark", result.map(RoomResponse::Marked), response);
            }

            RoomMessage::Unmark {
                player_id,
                card_id,
                row,
                column,
                response,
            } => {
                let result = self.state.unmark(player_id, card_id, row, column);
                self.respond(
                    player_id,
                    "unmark",
                    result.map(|()| RoomResponse::Success),
                    response,
                );
            }

            RoomMessage::ClaimBingo {
                player_id,
                card_id,
                response,
            } => {
                let result = self.state.claim_bingo(player_id, card_id);
                self.respond(
                    player_id,
                    "claim_bingo",
                    result.map(RoomResponse::BingoConfirmed),
                    response,
                );
            }

            RoomMessage::Pause { response } => {
                let result = self.state.pause();
                let _ = response.send(Self::into_response(result.map(|()| RoomResponse::Success)));
                self.settle();
            }

            RoomMessage::Resume { response } => {
                let result = self.state.resume();
                let _ = response.send(Self::into_response(result.map(|()| RoomResponse::Success)));
                self.settle();
            }

            RoomMessage::EndMatch { response } => {
                let result = self.state.end_match();
                let _ = response.send(Self::into_response(result.map(|()| RoomResponse::Success)));
                self.settle();
            }

            RoomMessage::GetView { response } => {
                let _ = response.send(self.state.get_view());
            }

            RoomMessage::Subscribe { player_id, sender } => {
                self.subscribers.insert(player_id, sender);
                log::debug!(
                    "Player {} subscribed to room '{}'",
                    player_id,
                    self.config.name
                );
            }

            RoomMessage::Unsubscribe { player_id } => {
                self.subscribers.remove(&player_id);
                log::debug!(
                    "Player {} unsubscribed from room '{}'",
                    player_id,
                    self.config.name
                );
            }

            RoomMessage::Tick => {
                self.tick();
            }

            RoomMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(RoomResponse::Closed);
            }
        }
    }

    /// Send the intent outcome back to its requester, route a rejection
    /// to that requester's subscription, then settle the FSM.
    fn respond(
        &mut self,
        player_id: PlayerId,
        intent: &'static str,
        result: Result<RoomResponse, MatchError>,
        response: oneshot::Sender<RoomResponse>,
    ) {
        if let Err(reason) = &result {
            self.notify_requester(player_id, intent, reason.clone());
        }
        let _ = response.send(Self::into_response(result));
        self.settle();
    }

    fn into_response(result: Result<RoomResponse, MatchError>) -> RoomResponse {
        result.unwrap_or_else(RoomResponse::Rejected)
    }

    /// Apply pending data-driven transitions and publish events. Runs
    /// after every intent so a recorded win or end request takes effect
    /// before the next timer tick.
    fn settle(&mut self) {
        let state = std::mem::take(&mut self.state);
        self.state = state.resolve();
        self.publish_events();
    }

    /// Advance the FSM by one tick and publish events.
    fn tick(&mut self) {
        let state = std::mem::take(&mut self.state);
        self.state = state.step();
        self.publish_events();
    }

    /// Broadcast drained match events to all subscribers
    fn publish_events(&mut self) {
        for event in self.state.drain_events() {
            log::debug!("Room '{}': {}", self.config.name, event);
            let notification = RoomNotification::Event(event);
            self.subscribers.retain(|player_id, sender| {
                match sender.try_send(notification.clone()) {
                    Ok(()) => true, // Keep subscriber
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        log::warn!("Subscriber {} channel full, dropping notification", player_id);
                        true // Keep subscriber but drop this notification
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        log::debug!("Subscriber {} disconnected, removing", player_id);
                        false // Remove subscriber
                    }
                }
            });
        }
    }

    /// Validation rejections are surfaced to the requesting player only.
    fn notify_requester(&mut self, player_id: PlayerId, intent: &'static str, reason: MatchError) {
        if let Some(sender) = self.subscribers.get(&player_id) {
            let _ = sender.try_send(RoomNotification::ValidationRejected { intent, reason });
        }
    }
}

/// Spawn a room on the current tokio runtime, returning its handle.
pub fn spawn_room(config: RoomConfig) -> RoomHandle {
    let (actor, handle) = RoomActor::new(config);
    tokio::spawn(actor.run());
    handle
}
