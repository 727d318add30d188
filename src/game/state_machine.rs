//! Bingo match state machine implementation.
//!
//! Provides the lifecycle FSM (`Lobby -> Starting -> Active -> Finished`),
//! roster and play management traits, and the shared match data.

use chrono::Utc;
use enum_dispatch::enum_dispatch;
use log::{error, info};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};
use thiserror::Error;

use super::constants;
use super::entities::{
    Call, Card, CardId, Cell, DrawPool, LinePattern, MatchStatus, MatchView, Player, PlayerId,
    PlayerName, PlayerView, WinResult,
};
use super::states::{Active, Finished, Lobby, Starting};

/// Errors that can occur during match operations
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum MatchError {
    #[error("cell is already marked")]
    AlreadyMarked,
    #[error("match is already paused")]
    AlreadyPaused,
    #[error("match is full")]
    CapacityReached,
    #[error("cell is out of bounds")]
    CellOutOfBounds,
    #[error("no balls left in the pool")]
    ExhaustedPool,
    #[error("the free cell can't be changed")]
    ImmutableCell,
    #[error("need 2+ players, all ready")]
    InsufficientPlayers,
    #[error("not allowed in this match phase")]
    InvalidTransition,
    #[error("that number hasn't been called")]
    NotCalled,
    #[error("cell isn't marked")]
    NotMarked,
    #[error("match isn't paused")]
    NotPaused,
    #[error("no winning pattern on that card")]
    NoWinningPattern,
    #[error("player already joined")]
    PlayerAlreadyJoined,
    #[error("card does not exist")]
    UnknownCard,
    #[error("player does not exist")]
    UnknownPlayer,
}

/// Events that occur as a match progresses. Drained by the embedding
/// layer and forwarded to whatever is observing the match.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum GameEvent {
    PlayerJoined(PlayerName),
    PlayerLeft(PlayerName),
    PlayerReady(PlayerName, bool),
    StatusChanged {
        status: MatchStatus,
        countdown: Option<u32>,
    },
    CallIssued {
        call: Call,
        drawn_count: usize,
    },
    CardUpdated {
        card_id: CardId,
        cell: Cell,
    },
    MatchWon {
        player_id: PlayerId,
        pattern: LinePattern,
    },
    MatchPaused,
    MatchResumed,
    PoolExhausted,
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PlayerJoined(name) => format!("{name} joined the lobby"),
            Self::PlayerLeft(name) => format!("{name} left the lobby"),
            Self::PlayerReady(name, true) => format!("{name} is ready"),
            Self::PlayerReady(name, false) => format!("{name} is no longer ready"),
            Self::StatusChanged {
                status,
                countdown: Some(countdown),
            } => format!("match {status} ({countdown}s)"),
            Self::StatusChanged {
                status,
                countdown: None,
            } => format!("match {status}"),
            Self::CallIssued { call, drawn_count } => {
                format!("{call} called ({drawn_count} drawn)")
            }
            Self::CardUpdated { cell, .. } => {
                let action = if cell.marked { "marked" } else { "unmarked" };
                format!("cell ({}, {}) {action}", cell.row, cell.column)
            }
            Self::MatchWon { player_id, pattern } => {
                format!("player {player_id} wins with {pattern}")
            }
            Self::MatchPaused => "calling paused".to_string(),
            Self::MatchResumed => "calling resumed".to_string(),
            Self::PoolExhausted => "pool exhausted with no winner".to_string(),
        };
        write!(f, "{repr}")
    }
}

/// Match configuration settings
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub max_players: usize,
    pub cards_per_player: usize,
    /// Bounds (inclusive, in 1Hz ticks) for the randomized delay
    /// between calls.
    pub min_call_interval_secs: u32,
    pub max_call_interval_secs: u32,
    pub countdown_secs: u32,
    /// Start automatically once 2+ players are present and all ready.
    pub auto_start: bool,
    /// Seed for the engine RNG. `None` seeds from OS entropy; tests pin
    /// this for deterministic replay.
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(
            constants::DEFAULT_MAX_PLAYERS,
            constants::DEFAULT_CARDS_PER_PLAYER,
            constants::DEFAULT_MIN_CALL_INTERVAL_SECS,
            constants::DEFAULT_MAX_CALL_INTERVAL_SECS,
            constants::DEFAULT_COUNTDOWN_SECS,
        )
    }
}

impl GameSettings {
    #[must_use]
    pub const fn new(
        max_players: usize,
        cards_per_player: usize,
        min_call_interval_secs: u32,
        max_call_interval_secs: u32,
        countdown_secs: u32,
    ) -> Self {
        Self {
            max_players,
            cards_per_player,
            min_call_interval_secs,
            max_call_interval_secs,
            countdown_secs,
            auto_start: false,
            seed: None,
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Mutable match data shared across all states
#[derive(Debug)]
pub struct GameData {
    /// Source of all engine randomness: card layouts, the pool shuffle,
    /// and the call cadence. Seedable for deterministic replay.
    pub(super) rng: StdRng,
    /// Players in join order.
    pub players: Vec<Player>,
    /// Ball pool. Replaced with a freshly shuffled pool when a match
    /// leaves the countdown.
    pub pool: DrawPool,
    /// The caller's announcement log: strictly ordered, timestamped,
    /// usable for replay/audit.
    pub calls: Vec<Call>,
    pub winner: Option<PlayerId>,
    pub winning_pattern: Option<LinePattern>,
    pub(super) paused: bool,
    pub(super) end_requested: bool,
    /// Stack of match events for observers to drain.
    pub(super) events: VecDeque<GameEvent>,
    pub(super) settings: GameSettings,
}

impl Default for GameData {
    fn default() -> Self {
        let settings = GameSettings::default();
        settings.into()
    }
}

impl From<GameSettings> for GameData {
    fn from(value: GameSettings) -> Self {
        let mut rng = match value.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let pool = DrawPool::new(&mut rng);
        Self {
            rng,
            players: Vec::with_capacity(value.max_players),
            pool,
            calls: Vec::with_capacity(constants::NUM_BALLS),
            winner: None,
            winning_pattern: None,
            paused: false,
            end_requested: false,
            events: VecDeque::new(),
            settings: value,
        }
    }
}

impl GameData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains_player(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|player| player.id == player_id)
    }

    fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == player_id)
    }

    fn push_event(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    fn quorum_ready(&self) -> bool {
        self.players.len() >= constants::MIN_PLAYERS
            && self.players.iter().all(|player| player.ready)
    }

    fn sample_call_delay(&mut self) -> u32 {
        let lo = self.settings.min_call_interval_secs.max(1);
        let hi = self.settings.max_call_interval_secs.max(lo);
        self.rng.random_range(lo..=hi)
    }

    fn view(&self, status: MatchStatus, countdown: Option<u32>) -> MatchView {
        MatchView {
            status,
            countdown,
            players: self.players.iter().map(PlayerView::from).collect(),
            current_call: self.calls.last().copied(),
            calls: self.calls.clone(),
            remaining: self.pool.remaining_count(),
            winner: self.winner,
            winning_pattern: self.winning_pattern,
            paused: self.paused,
        }
    }
}

/// Trait for managing match state (views, events)
#[enum_dispatch]
pub trait GameStateManagement {
    fn drain_events(&mut self) -> VecDeque<GameEvent>;

    /// Snapshot of the match for the presentation layer
    ///
    /// # Important
    /// This function's return value should be used - ignoring it wastes computation
    #[must_use]
    fn get_view(&self) -> MatchView;

    fn status(&self) -> MatchStatus;
}

/// Trait for roster operations; only the lobby accepts them
#[enum_dispatch]
pub trait RosterManagement {
    fn join(&mut self, player_id: PlayerId, name: &str) -> Result<(), MatchError>;
    fn leave(&mut self, player_id: PlayerId) -> Result<(), MatchError>;
    fn set_ready(&mut self, player_id: PlayerId, ready: bool) -> Result<(), MatchError>;
    fn request_start(&mut self, player_id: PlayerId) -> Result<(), MatchError>;
}

/// Trait for play operations; only an active match accepts them
#[enum_dispatch]
pub trait PlayManagement {
    fn mark(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
        row: usize,
        column: usize,
    ) -> Result<WinResult, MatchError>;
    fn unmark(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
        row: usize,
        column: usize,
    ) -> Result<(), MatchError>;
    fn claim_bingo(&mut self, player_id: PlayerId, card_id: CardId)
    -> Result<LinePattern, MatchError>;
    fn pause(&mut self) -> Result<(), MatchError>;
    fn resume(&mut self) -> Result<(), MatchError>;
    fn end_match(&mut self) -> Result<(), MatchError>;
    fn is_paused(&self) -> bool;
}

/// A bingo match with data and logic for running it end-to-end.
///
/// This struct wraps match data and the current state, providing the
/// core match loop functionality.
#[derive(Debug)]
pub struct Game<T> {
    pub data: GameData,
    pub state: T,
}

impl Default for Game<Lobby> {
    fn default() -> Self {
        Self {
            data: GameData::default(),
            state: Lobby::new(),
        }
    }
}

impl From<GameSettings> for Game<Lobby> {
    fn from(value: GameSettings) -> Self {
        Self {
            data: value.into(),
            state: Lobby::new(),
        }
    }
}

impl From<Game<Lobby>> for Game<Starting> {
    fn from(mut value: Game<Lobby>) -> Self {
        let countdown = value.data.settings.countdown_secs;
        value.data.push_event(GameEvent::StatusChanged {
            status: MatchStatus::Starting,
            countdown: Some(countdown),
        });
        info!(
            "match starting with {} players, {countdown}s countdown",
            value.data.players.len()
        );
        Self {
            data: value.data,
            state: Starting { countdown },
        }
    }
}

impl From<Game<Starting>> for Game<Active> {
    fn from(mut value: Game<Starting>) -> Self {
        // Fresh pool and fresh cards for everyone; anything from a
        // previous match instance is unreachable from here.
        value.data.pool = DrawPool::new(&mut value.data.rng);
        value.data.calls.clear();
        let cards_per_player = value.data.settings.cards_per_player.max(1);
        for i in 0..value.data.players.len() {
            let mut cards = Vec::with_capacity(cards_per_player);
            for _ in 0..cards_per_player {
                cards.push(Card::generate(CardId::new_v4(), &mut value.data.rng));
            }
            value.data.players[i].cards = cards;
        }
        value.data.push_event(GameEvent::StatusChanged {
            status: MatchStatus::Active,
            countdown: None,
        });
        info!("match active with {} players", value.data.players.len());
        let next_call_in = value.data.sample_call_delay();
        Self {
            data: value.data,
            state: Active { next_call_in },
        }
    }
}

impl From<Game<Starting>> for Game<Finished> {
    fn from(mut value: Game<Starting>) -> Self {
        value.data.push_event(GameEvent::StatusChanged {
            status: MatchStatus::Finished,
            countdown: None,
        });
        info!("match ended during countdown");
        Self {
            data: value.data,
            state: Finished {},
        }
    }
}

impl From<Game<Active>> for Game<Finished> {
    fn from(mut value: Game<Active>) -> Self {
        value.data.push_event(GameEvent::StatusChanged {
            status: MatchStatus::Finished,
            countdown: None,
        });
        match value.data.winner {
            Some(winner) => info!("match finished, won by {winner}"),
            None => info!("match finished with no winner"),
        }
        Self {
            data: value.data,
            state: Finished {},
        }
    }
}

macro_rules! impl_game_state_management {
    ($state:ty, $status:expr, $countdown:expr) => {
        impl GameStateManagement for Game<$state> {
            fn drain_events(&mut self) -> VecDeque<GameEvent> {
                std::mem::take(&mut self.data.events)
            }

            fn get_view(&self) -> MatchView {
                let countdown: fn(&Game<$state>) -> Option<u32> = $countdown;
                self.data.view($status, countdown(self))
            }

            fn status(&self) -> MatchStatus {
                $status
            }
        }
    };
}

impl_game_state_management!(Lobby, MatchStatus::Lobby, |_| None);
impl_game_state_management!(Starting, MatchStatus::Starting, |game| Some(
    game.state.countdown
));
impl_game_state_management!(Active, MatchStatus::Active, |_| None);
impl_game_state_management!(Finished, MatchStatus::Finished, |_| None);

impl RosterManagement for Game<Lobby> {
    fn join(&mut self, player_id: PlayerId, name: &str) -> Result<(), MatchError> {
        if self.data.players.len() >= self.data.settings.max_players {
            return Err(MatchError::CapacityReached);
        }
        if self.data.contains_player(player_id) {
            return Err(MatchError::PlayerAlreadyJoined);
        }
        let name = PlayerName::new(name);
        self.data.push_event(GameEvent::PlayerJoined(name.clone()));
        self.data.players.push(Player::new(player_id, name));
        Ok(())
    }

    fn leave(&mut self, player_id: PlayerId) -> Result<(), MatchError> {
        let idx = self
            .data
            .players
            .iter()
            .position(|player| player.id == player_id)
            .ok_or(MatchError::UnknownPlayer)?;
        let player = self.data.players.remove(idx);
        self.data.push_event(GameEvent::PlayerLeft(player.name));
        Ok(())
    }

    fn set_ready(&mut self, player_id: PlayerId, ready: bool) -> Result<(), MatchError> {
        let player = self
            .data
            .player_mut(player_id)
            .ok_or(MatchError::UnknownPlayer)?;
        player.ready = ready;
        let name = player.name.clone();
        self.data.push_event(GameEvent::PlayerReady(name, ready));
        Ok(())
    }

    fn request_start(&mut self, player_id: PlayerId) -> Result<(), MatchError> {
        if !self.data.contains_player(player_id) {
            return Err(MatchError::UnknownPlayer);
        }
        if !self.data.quorum_ready() {
            return Err(MatchError::InsufficientPlayers);
        }
        self.state.start_game = true;
        Ok(())
    }
}

macro_rules! reject_roster_management {
    ($($state:ty),+) => {
        $(impl RosterManagement for Game<$state> {
            fn join(&mut self, _: PlayerId, _: &str) -> Result<(), MatchError> {
                Err(MatchError::InvalidTransition)
            }

            fn leave(&mut self, _: PlayerId) -> Result<(), MatchError> {
                Err(MatchError::InvalidTransition)
            }

            fn set_ready(&mut self, _: PlayerId, _: bool) -> Result<(), MatchError> {
                Err(MatchError::InvalidTransition)
            }

            fn request_start(&mut self, _: PlayerId) -> Result<(), MatchError> {
                Err(MatchError::InvalidTransition)
            }
        })+
    };
}

reject_roster_management!(Starting, Active, Finished);

impl Game<Active> {
    /// Shared validation for mark/unmark: resolve the cell and reject
    /// anything the free center or the grid bounds rule out.
    fn checked_cell(
        &self,
        player_id: PlayerId,
        card_id: CardId,
        row: usize,
        column: usize,
    ) -> Result<Cell, MatchError> {
        if row >= constants::CARD_SIZE || column >= constants::CARD_SIZE {
            return Err(MatchError::CellOutOfBounds);
        }
        let player = self
            .data
            .players
            .iter()
            .find(|player| player.id == player_id)
            .ok_or(MatchError::UnknownPlayer)?;
        let card = player.card(card_id).ok_or(MatchError::UnknownCard)?;
        let cell = card.cell(row, column).ok_or(MatchError::CellOutOfBounds)?;
        if cell.is_free() {
            return Err(MatchError::ImmutableCell);
        }
        Ok(*cell)
    }

    fn apply_mark(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
        row: usize,
        column: usize,
        marked: bool,
    ) -> Result<Cell, MatchError> {
        let card = self
            .data
            .player_mut(player_id)
            .and_then(|player| player.card_mut(card_id))
            .ok_or(MatchError::UnknownCard)?;
        let cell = card.set_marked(row, column, marked);
        self.data
            .push_event(GameEvent::CardUpdated { card_id, cell });
        Ok(cell)
    }

    fn record_win(&mut self, player_id: PlayerId, pattern: LinePattern) {
        if self.data.winner.is_some() {
            return;
        }
        self.data.winner = Some(player_id);
        self.data.winning_pattern = Some(pattern);
        self.data
            .push_event(GameEvent::MatchWon { player_id, pattern });
        info!("player {player_id} wins with {pattern}");
    }
}

impl PlayManagement for Game<Active> {
    fn mark(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
        row: usize,
        column: usize,
    ) -> Result<WinResult, MatchError> {
        let cell = self.checked_cell(player_id, card_id, row, column)?;
        if cell.marked {
            return Err(MatchError::AlreadyMarked);
        }
        let Some(number) = cell.number else {
            return Err(MatchError::ImmutableCell);
        };
        if !self.data.pool.is_called(number) {
            return Err(MatchError::NotCalled);
        }
        self.apply_mark(player_id, card_id, row, column, true)?;

        // Marking never declares victory by itself; the detector runs
        // after every successful mark and the result flows from there.
        let result = self
            .data
            .player_mut(player_id)
            .and_then(|player| player.card_mut(card_id))
            .map(|card| card.evaluate())
            .ok_or(MatchError::UnknownCard)?;
        if let Some(pattern) = result.pattern {
            self.record_win(player_id, pattern);
        }
        Ok(result)
    }

    fn unmark(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
        row: usize,
        column: usize,
    ) -> Result<(), MatchError> {
        let cell = self.checked_cell(player_id, card_id, row, column)?;
        if !cell.marked {
            return Err(MatchError::NotMarked);
        }
        self.apply_mark(player_id, card_id, row, column, false)?;
        Ok(())
    }

    fn claim_bingo(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
    ) -> Result<LinePattern, MatchError> {
        let player = self
            .data
            .players
            .iter()
            .find(|player| player.id == player_id)
            .ok_or(MatchError::UnknownPlayer)?;
        let card = player.card(card_id).ok_or(MatchError::UnknownCard)?;
        let result = card.evaluate();
        let Some(pattern) = result.pattern else {
            return Err(MatchError::NoWinningPattern);
        };
        self.record_win(player_id, pattern);
        Ok(pattern)
    }

    fn pause(&mut self) -> Result<(), MatchError> {
        if self.data.paused {
            return Err(MatchError::AlreadyPaused);
        }
        self.data.paused = true;
        self.data.push_event(GameEvent::MatchPaused);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), MatchError> {
        if !self.data.paused {
            return Err(MatchError::NotPaused);
        }
        self.data.paused = false;
        self.data.push_event(GameEvent::MatchResumed);
        Ok(())
    }

    fn end_match(&mut self) -> Result<(), MatchError> {
        self.data.end_requested = true;
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.data.paused
    }
}

impl PlayManagement for Game<Starting> {
    fn mark(
        &mut self,
        _: PlayerId,
        _: CardId,
        _: usize,
        _: usize,
    ) -> Result<WinResult, MatchError> {
        Err(MatchError::InvalidTransition)
    }

    fn unmark(&mut self, _: PlayerId, _: CardId, _: usize, _: usize) -> Result<(), MatchError> {
        Err(MatchError::InvalidTransition)
    }

    fn claim_bingo(&mut self, _: PlayerId, _: CardId) -> Result<LinePattern, MatchError> {
        Err(MatchError::InvalidTransition)
    }

    fn pause(&mut self) -> Result<(), MatchError> {
        Err(MatchError::InvalidTransition)
    }

    fn resume(&mut self) -> Result<(), MatchError> {
        Err(MatchError::InvalidTransition)
    }

    // Aborting during the countdown is allowed; nothing has been dealt
    // yet and the lobby roster is preserved in the final view.
    fn end_match(&mut self) -> Result<(), MatchError> {
        self.data.end_requested = true;
        Ok(())
    }

    fn is_paused(&self) -> bool {
        false
    }
}

macro_rules! reject_play_management {
    ($($state:ty),+) => {
        $(impl PlayManagement for Game<$state> {
            fn mark(
                &mut self,
                _: PlayerId,
                _: CardId,
                _: usize,
                _: usize,
            ) -> Result<WinResult, MatchError> {
                Err(MatchError::InvalidTransition)
            }

            fn unmark(
                &mut self,
                _: PlayerId,
                _: CardId,
                _: usize,
                _: usize,
            ) -> Result<(), MatchError> {
                Err(MatchError::InvalidTransition)
            }

            fn claim_bingo(&mut self, _: PlayerId, _: CardId) -> Result<LinePattern, MatchError> {
                Err(MatchError::InvalidTransition)
            }

            fn pause(&mut self) -> Result<(), MatchError> {
                Err(MatchError::InvalidTransition)
            }

            fn resume(&mut self) -> Result<(), MatchError> {
                Err(MatchError::InvalidTransition)
            }

            fn end_match(&mut self) -> Result<(), MatchError> {
                Err(MatchError::InvalidTransition)
            }

            fn is_paused(&self) -> bool {
                false
            }
        })+
    };
}

reject_play_management!(Lobby, Finished);

/// The match lifecycle FSM.
///
/// Drive it with a 1Hz [`step`](Self::step) and call
/// [`resolve`](Self::resolve) after intents so data-driven transitions
/// (a recorded win, an end request, an exhausted pool) take effect
/// without waiting for the next tick.
#[enum_dispatch(GameStateManagement, RosterManagement, PlayManagement)]
#[derive(Debug)]
pub enum BingoState {
    Lobby(Game<Lobby>),
    Starting(Game<Starting>),
    Active(Game<Active>),
    Finished(Game<Finished>),
}

impl Default for BingoState {
    fn default() -> Self {
        Self::Lobby(Game::default())
    }
}

impl From<GameSettings> for BingoState {
    fn from(value: GameSettings) -> Self {
        Self::Lobby(value.into())
    }
}

impl BingoState {
    /// Create a new match in the lobby state with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply any pending data-driven transition. Does not consume a
    /// tick, so it is safe to call after every intent.
    #[must_use]
    pub fn resolve(self) -> Self {
        match self {
            Self::Lobby(game) => {
                let auto = game.data.settings.auto_start && game.data.quorum_ready();
                if game.state.start_game || auto {
                    Self::Starting(game.into())
                } else {
                    Self::Lobby(game)
                }
            }
            Self::Starting(game) => {
                if game.data.end_requested {
                    Self::Finished(game.into())
                } else {
                    Self::Starting(game)
                }
            }
            Self::Active(game) => {
                if game.data.winner.is_some() || game.data.end_requested {
                    Self::Finished(game.into())
                } else {
                    Self::Active(game)
                }
            }
            Self::Finished(game) => Self::Finished(game),
        }
    }

    /// Advance the match by one 1Hz tick: run the countdown, and count
    /// down to (and issue) the next call while the match is active.
    #[must_use]
    pub fn step(self) -> Self {
        match self.resolve() {
            Self::Starting(mut game) => {
                game.state.countdown = game.state.countdown.saturating_sub(1);
                if game.state.countdown == 0 {
                    Self::Active(game.into())
                } else {
                    let countdown = game.state.countdown;
                    game.data.push_event(GameEvent::StatusChanged {
                        status: MatchStatus::Starting,
                        countdown: Some(countdown),
                    });
                    Self::Starting(game)
                }
            }
            Self::Active(mut game) => {
                if game.data.paused {
                    return Self::Active(game);
                }
                game.state.next_call_in = game.state.next_call_in.saturating_sub(1);
                if game.state.next_call_in == 0 {
                    match game.issue_call() {
                        Ok(()) => game.state.next_call_in = game.data.sample_call_delay(),
                        // An exhausted pool is fatal: no winner, and the
                        // caller never schedules another draw.
                        Err(reason) => {
                            info!("caller stopped: {reason}");
                            game.data.push_event(GameEvent::PoolExhausted);
                            return Self::Finished(game.into());
                        }
                    }
                }
                Self::Active(game)
            }
            other => other,
        }
    }
}

impl Game<Active> {
    fn issue_call(&mut self) -> Result<(), MatchError> {
        let number = self
            .data
            .pool
            .draw()
            .ok_or(MatchError::ExhaustedPool)?;
        match Call::announce(number, Utc::now()) {
            Some(call) => {
                self.data.calls.push(call);
                let drawn_count = self.data.pool.drawn_count();
                self.data
                    .push_event(GameEvent::CallIssued { call, drawn_count });
            }
            None => error!("drew out-of-range ball {number}"),
        }
        Ok(())
    }
}
