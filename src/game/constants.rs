//! Game-wide constants for card geometry, ball ranges, and defaults.

/// Cards are square: 5 columns (B, I, N, G, O) by 5 rows.
pub const CARD_SIZE: usize = 5;

/// Row index of the free cell.
pub const FREE_ROW: usize = 2;

/// Column index of the free cell.
pub const FREE_COL: usize = 2;

/// Total number of balls in the pool.
pub const NUM_BALLS: usize = 75;

/// Number of ball values assigned to each column letter.
pub const BALLS_PER_LETTER: u8 = 15;

/// Number of winning line patterns: 5 rows, 5 columns, 2 diagonals.
pub const NUM_LINE_PATTERNS: usize = 12;

pub const MIN_PLAYERS: usize = 2;
pub const DEFAULT_MAX_PLAYERS: usize = 8;

pub const DEFAULT_CARDS_PER_PLAYER: usize = 1;
pub const MAX_CARDS_PER_PLAYER: usize = 4;

/// Default pre-game countdown, ticked at 1Hz.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 10;

/// Default bounds for the randomized delay between calls.
pub const DEFAULT_MIN_CALL_INTERVAL_SECS: u32 = 3;
pub const DEFAULT_MAX_CALL_INTERVAL_SECS: u32 = 5;

/// Player names longer than this are truncated on entry.
pub const MAX_NAME_LENGTH: usize = 16;
