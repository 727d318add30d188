//! Room configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{GameSettings, constants};

/// Call cadence presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallSpeed {
    Relaxed,
    Normal,
    Turbo,
}

impl std::fmt::Display for CallSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallSpeed::Relaxed => write!(f, "relaxed"),
            CallSpeed::Normal => write!(f, "normal"),
            CallSpeed::Turbo => write!(f, "turbo"),
        }
    }
}

impl CallSpeed {
    /// Inclusive bounds, in seconds, for the randomized delay between
    /// calls at this speed.
    pub fn call_interval_secs(self) -> (u32, u32) {
        match self {
            CallSpeed::Relaxed => (5, 8),
            CallSpeed::Normal => (
                constants::DEFAULT_MIN_CALL_INTERVAL_SECS,
                constants::DEFAULT_MAX_CALL_INTERVAL_SECS,
            ),
            CallSpeed::Turbo => (1, 2),
        }
    }
}

/// Room configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Room name
    pub name: String,

    /// Maximum number of players (default: 8)
    pub max_players: usize,

    /// Cards dealt to each player (default: 1)
    pub cards_per_player: usize,

    /// Call cadence preset
    pub speed: CallSpeed,

    /// Pre-game countdown in seconds
    pub countdown_secs: u32,

    /// Start automatically once 2+ players are present and all ready
    pub auto_start: bool,

    /// Engine RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,

    /// Tick period driving the countdown and the caller. One second in
    /// production; tests stretch it and drive ticks by hand.
    #[serde(skip, default = "default_tick_interval")]
    pub tick_interval: Duration,
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            name: "Main Hall".to_string(),
            max_players: constants::DEFAULT_MAX_PLAYERS,
            cards_per_player: constants::DEFAULT_CARDS_PER_PLAYER,
            speed: CallSpeed::Normal,
            countdown_secs: constants::DEFAULT_COUNTDOWN_SECS,
            auto_start: false,
            seed: None,
            tick_interval: default_tick_interval(),
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_players < constants::MIN_PLAYERS {
            return Err(format!(
                "Max players must be at least {}",
                constants::MIN_PLAYERS
            ));
        }

        if self.cards_per_player == 0 || self.cards_per_player > constants::MAX_CARDS_PER_PLAYER {
            return Err(format!(
                "Cards per player must be between 1 and {}",
                constants::MAX_CARDS_PER_PLAYER
            ));
        }

        if self.countdown_secs == 0 {
            return Err("Countdown must be at least 1 second".to_string());
        }

        if self.tick_interval.is_zero() {
            return Err("Tick interval must be nonzero".to_string());
        }

        Ok(())
    }

    /// Engine settings derived from this room configuration.
    pub fn game_settings(&self) -> GameSettings {
        let (min_call_interval_secs, max_call_interval_secs) = self.speed.call_interval_secs();
        GameSettings {
            max_players: self.max_players,
            cards_per_player: self.cards_per_player,
            min_call_interval_secs,
            max_call_interval_secs,
            countdown_secs: self.countdown_secs,
            auto_start: self.auto_start,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RoomConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.speed, CallSpeed::Normal);
    }

    #[test]
    fn test_one_player_room_is_rejected() {
        let config = RoomConfig {
            max_players: 1,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_cards_rejected() {
        let config = RoomConfig {
            cards_per_player: 0,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_speed_presets_are_ordered() {
        let (relaxed_lo, _) = CallSpeed::Relaxed.call_interval_secs();
        let (normal_lo, normal_hi) = CallSpeed::Normal.call_interval_secs();
        let (_, turbo_hi) = CallSpeed::Turbo.call_interval_secs();
        assert!(turbo_hi < normal_lo);
        assert!(normal_hi <= relaxed_lo);
        assert_eq!((normal_lo, normal_hi), (3, 5));
        assert_eq!(CallSpeed::Turbo.to_string(), "turbo");
    }

    #[test]
    fn test_game_settings_carry_speed_bounds() {
        let config = RoomConfig {
            speed: CallSpeed::Turbo,
            ..RoomConfig::default()
        };
        let settings = config.game_settings();
        assert_eq!(settings.min_call_interval_secs, 1);
        assert_eq!(settings.max_call_interval_secs, 2);
    }
}
