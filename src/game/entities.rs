use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self};
use uuid::Uuid;

use super::constants;

/// Placeholder for ball values. Balls are numbered 1..=75.
pub type Ball = u8;

/// Column letters of a bingo card. Each letter owns a 15-value range:
/// B 1-15, I 16-30, N 31-45, G 46-60, O 61-75.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Letter {
    B,
    I,
    N,
    G,
    O,
}

impl Letter {
    /// All letters in column order.
    pub const ALL: [Self; constants::CARD_SIZE] = [Self::B, Self::I, Self::N, Self::G, Self::O];

    /// The letter announced with a ball. `None` for values outside 1..=75.
    #[must_use]
    pub fn for_number(number: Ball) -> Option<Self> {
        match number {
            1..=15 => Some(Self::B),
            16..=30 => Some(Self::I),
            31..=45 => Some(Self::N),
            46..=60 => Some(Self::G),
            61..=75 => Some(Self::O),
            _ => None,
        }
    }

    /// Column index of this letter on a card.
    #[must_use]
    pub const fn column(self) -> usize {
        match self {
            Self::B => 0,
            Self::I => 1,
            Self::N => 2,
            Self::G => 3,
            Self::O => 4,
        }
    }

    /// Inclusive ball range for a column index. Column 0 is B.
    #[must_use]
    pub fn range_for_column(column: usize) -> (Ball, Ball) {
        let lo = (column as Ball) * constants::BALLS_PER_LETTER + 1;
        (lo, lo + constants::BALLS_PER_LETTER - 1)
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::B => "B",
            Self::I => "I",
            Self::N => "N",
            Self::G => "G",
            Self::O => "O",
        };
        write!(f, "{repr}")
    }
}

/// A single announced ball. The `at` timestamp makes the call log usable
/// as an audit/replay record.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Call {
    pub number: Ball,
    pub letter: Letter,
    pub at: DateTime<Utc>,
}

impl Call {
    /// Build the announcement for a drawn ball. `None` for values the
    /// pool can never produce.
    #[must_use]
    pub fn announce(number: Ball, at: DateTime<Utc>) -> Option<Self> {
        Letter::for_number(number).map(|letter| Self { number, letter, at })
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.letter, self.number)
    }
}

/// Type alias for player identifiers, supplied by the session layer.
pub type PlayerId = Uuid;

/// Type alias for card identifiers.
pub type CardId = Uuid;

/// One cell of a card. `number` is `None` only for the free center cell,
/// which starts (and stays) marked.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Cell {
    pub column: usize,
    pub row: usize,
    pub number: Option<Ball>,
    pub marked: bool,
}

impl Cell {
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.number.is_none()
    }
}

/// A winning line on a card. Patterns are checked in a fixed priority
/// order so simultaneous completions resolve deterministically: rows 0-4,
/// then columns 0-4, then the two diagonals.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum LinePattern {
    Row(usize),
    Column(usize),
    Diagonal,
    AntiDiagonal,
}

impl fmt::Display for LinePattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Row(row) => write!(f, "row {row}"),
            Self::Column(column) => write!(f, "column {}", Letter::ALL[*column % Letter::ALL.len()]),
            Self::Diagonal => write!(f, "diagonal"),
            Self::AntiDiagonal => write!(f, "anti-diagonal"),
        }
    }
}

/// Outcome of a win evaluation.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct WinResult {
    pub won: bool,
    pub pattern: Option<LinePattern>,
}

impl WinResult {
    #[must_use]
    pub const fn win(pattern: LinePattern) -> Self {
        Self {
            won: true,
            pattern: Some(pattern),
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self {
            won: false,
            pattern: None,
        }
    }
}

/// A 5x5 bingo card. Numbers are immutable once generated; only the
/// per-cell `marked` flags change. Cells are indexed `[column][row]`.
///
/// The card keeps per-row/column/diagonal mark counters so win evaluation
/// after a mark is O(1) instead of rescanning 24 cells.
#[derive(Clone, Debug, Serialize)]
pub struct Card {
    pub id: CardId,
    cells: [[Cell; constants::CARD_SIZE]; constants::CARD_SIZE],
    #[serde(skip)]
    row_marks: [u8; constants::CARD_SIZE],
    #[serde(skip)]
    col_marks: [u8; constants::CARD_SIZE],
    #[serde(skip)]
    diag_marks: u8,
    #[serde(skip)]
    anti_diag_marks: u8,
}

impl Card {
    /// Generate a card: each column samples 5 distinct values from its
    /// 15-value range (Fisher-Yates over the range), and the center cell
    /// is fixed to the pre-marked free cell.
    #[must_use]
    pub fn generate(id: CardId, rng: &mut impl Rng) -> Self {
        let mut cells = [[Cell {
            column: 0,
            row: 0,
            number: None,
            marked: false,
        }; constants::CARD_SIZE]; constants::CARD_SIZE];

        for column in 0..constants::CARD_SIZE {
            let (lo, hi) = Letter::range_for_column(column);
            let mut values: Vec<Ball> = (lo..=hi).collect();
            values.shuffle(rng);

            for row in 0..constants::CARD_SIZE {
                let free = row == constants::FREE_ROW && column == constants::FREE_COL;
                cells[column][row] = Cell {
                    column,
                    row,
                    number: if free { None } else { Some(values[row]) },
                    marked: free,
                };
            }
        }

        let mut card = Self {
            id,
            cells,
            row_marks: [0; constants::CARD_SIZE],
            col_marks: [0; constants::CARD_SIZE],
            diag_marks: 0,
            anti_diag_marks: 0,
        };
        card.count_mark(constants::FREE_ROW, constants::FREE_COL, 1);
        card
    }

    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.cells.get(column)?.get(row)
    }

    #[must_use]
    pub fn cells(&self) -> &[[Cell; constants::CARD_SIZE]; constants::CARD_SIZE] {
        &self.cells
    }

    /// Whether any cell on this card carries `number`.
    #[must_use]
    pub fn contains_number(&self, number: Ball) -> bool {
        Letter::for_number(number)
            .map(Letter::column)
            .is_some_and(|column| {
                self.cells[column]
                    .iter()
                    .any(|cell| cell.number == Some(number))
            })
    }

    /// Flip a cell's mark and maintain the line counters. The state
    /// machine validates the request first; out-of-bounds or redundant
    /// flips are its bugs, not the card's.
    pub(crate) fn set_marked(&mut self, row: usize, column: usize, marked: bool) -> Cell {
        debug_assert!(row < constants::CARD_SIZE && column < constants::CARD_SIZE);
        debug_assert_ne!(self.cells[column][row].marked, marked);
        self.cells[column][row].marked = marked;
        self.count_mark(row, column, if marked { 1 } else { -1 });
        self.cells[column][row]
    }

    fn count_mark(&mut self, row: usize, column: usize, delta: i8) {
        let apply = |count: &mut u8| *count = count.wrapping_add_signed(delta);
        apply(&mut self.row_marks[row]);
        apply(&mut self.col_marks[column]);
        if row == column {
            apply(&mut self.diag_marks);
        }
        if row + column == constants::CARD_SIZE - 1 {
            apply(&mut self.anti_diag_marks);
        }
    }

    /// Evaluate the card against the winning patterns in priority order.
    /// Counter-based, so this is cheap enough to run on every mark.
    #[must_use]
    pub fn evaluate(&self) -> WinResult {
        let full = constants::CARD_SIZE as u8;
        for (row, &marks) in self.row_marks.iter().enumerate() {
            if marks == full {
                return WinResult::win(LinePattern::Row(row));
            }
        }
        for (column, &marks) in self.col_marks.iter().enumerate() {
            if marks == full {
                return WinResult::win(LinePattern::Column(column));
            }
        }
        if self.diag_marks == full {
            return WinResult::win(LinePattern::Diagonal);
        }
        if self.anti_diag_marks == full {
            return WinResult::win(LinePattern::AntiDiagonal);
        }
        WinResult::none()
    }
}

/// The master sequence of 75 balls. The pool is shuffled once at
/// creation, so dealing from the cursor is equivalent to drawing
/// uniformly at random among the remaining balls.
#[derive(Debug)]
pub struct DrawPool {
    balls: [Ball; constants::NUM_BALLS],
    draw_idx: usize,
    called: [bool; constants::NUM_BALLS + 1],
}

impl DrawPool {
    #[must_use]
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut balls = [0; constants::NUM_BALLS];
        for (i, ball) in balls.iter_mut().enumerate() {
            *ball = (i + 1) as Ball;
        }
        balls.shuffle(rng);
        Self {
            balls,
            draw_idx: 0,
            called: [false; constants::NUM_BALLS + 1],
        }
    }

    /// Draw the next ball, or `None` once all 75 have been drawn.
    pub fn draw(&mut self) -> Option<Ball> {
        let ball = *self.balls.get(self.draw_idx)?;
        self.draw_idx += 1;
        self.called[ball as usize] = true;
        Some(ball)
    }

    /// O(1) membership test against the call history.
    #[must_use]
    pub fn is_called(&self, number: Ball) -> bool {
        self.called
            .get(number as usize)
            .copied()
            .unwrap_or_default()
    }

    /// The canonical, strictly ordered call history.
    #[must_use]
    pub fn drawn(&self) -> &[Ball] {
        &self.balls[..self.draw_idx]
    }

    #[must_use]
    pub fn drawn_count(&self) -> usize {
        self.draw_idx
    }

    #[must_use]
    pub fn remaining_count(&self) -> usize {
        constants::NUM_BALLS - self.draw_idx
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.draw_idx == constants::NUM_BALLS
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: &str) -> Self {
        let mut name: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        name.truncate(constants::MAX_NAME_LENGTH);
        Self(name)
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerName {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// A player in the match. Players are stored in join order; that order
/// is the deterministic tie-break wherever several cards are evaluated
/// in one pass.
#[derive(Debug, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: PlayerName,
    pub ready: bool,
    pub cards: Vec<Card>,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: PlayerName) -> Self {
        Self {
            id,
            name,
            ready: false,
            cards: Vec::with_capacity(constants::MAX_CARDS_PER_PLAYER),
        }
    }

    #[must_use]
    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    pub(crate) fn card_mut(&mut self, card_id: CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|card| card.id == card_id)
    }
}

/// Serializable mirror of the lifecycle states, for views and events.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Lobby,
    Starting,
    Active,
    Finished,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Lobby => "lobby",
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// Snapshot of one player for the presentation layer.
#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: PlayerName,
    pub ready: bool,
    pub cards: Vec<Card>,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            ready: player.ready,
            cards: player.cards.clone(),
        }
    }
}

/// Full render snapshot of a match. The engine owns all of this state
/// exclusively; the presentation layer renders snapshots and forwards
/// intents, nothing more.
#[derive(Clone, Debug, Serialize)]
pub struct MatchView {
    pub status: MatchStatus,
    pub countdown: Option<u32>,
    pub players: Vec<PlayerView>,
    pub current_call: Option<Call>,
    pub calls: Vec<Call>,
    pub remaining: usize,
    pub winner: Option<PlayerId>,
    pub winning_pattern: Option<LinePattern>,
    pub paused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0xB1760)
    }

    #[test]
    fn test_letter_for_number_boundaries() {
        assert_eq!(Letter::for_number(1), Some(Letter::B));
        assert_eq!(Letter::for_number(7), Some(Letter::B));
        assert_eq!(Letter::for_number(15), Some(Letter::B));
        assert_eq!(Letter::for_number(16), Some(Letter::I));
        assert_eq!(Letter::for_number(30), Some(Letter::I));
        assert_eq!(Letter::for_number(31), Some(Letter::N));
        assert_eq!(Letter::for_number(45), Some(Letter::N));
        assert_eq!(Letter::for_number(46), Some(Letter::G));
        assert_eq!(Letter::for_number(60), Some(Letter::G));
        assert_eq!(Letter::for_number(61), Some(Letter::O));
        assert_eq!(Letter::for_number(73), Some(Letter::O));
        assert_eq!(Letter::for_number(75), Some(Letter::O));
        assert_eq!(Letter::for_number(0), None);
        assert_eq!(Letter::for_number(76), None);
    }

    #[test]
    fn test_letter_column_round_trip() {
        for (column, letter) in Letter::ALL.into_iter().enumerate() {
            assert_eq!(letter.column(), column);
            let (lo, hi) = Letter::range_for_column(column);
            assert_eq!(Letter::for_number(lo), Some(letter));
            assert_eq!(Letter::for_number(hi), Some(letter));
        }
    }

    #[test]
    fn test_call_announcement_display() {
        let call = Call::announce(7, Utc::now()).unwrap();
        assert_eq!(call.letter, Letter::B);
        assert_eq!(call.to_string(), "B-7");

        let call = Call::announce(73, Utc::now()).unwrap();
        assert_eq!(call.to_string(), "O-73");

        assert!(Call::announce(0, Utc::now()).is_none());
        assert!(Call::announce(200, Utc::now()).is_none());
    }

    #[test]
    fn test_card_column_ranges_and_distinctness() {
        let mut rng = rng();
        let card = Card::generate(Uuid::new_v4(), &mut rng);

        for column in 0..constants::CARD_SIZE {
            let (lo, hi) = Letter::range_for_column(column);
            let numbers: Vec<Ball> = card.cells()[column]
                .iter()
                .filter_map(|cell| cell.number)
                .collect();
            let expected = if column == constants::FREE_COL { 4 } else { 5 };
            assert_eq!(numbers.len(), expected);

            let distinct: HashSet<Ball> = numbers.iter().copied().collect();
            assert_eq!(distinct.len(), numbers.len());
            assert!(numbers.iter().all(|&n| n >= lo && n <= hi));
        }
    }

    #[test]
    fn test_card_free_cell_is_marked_and_numberless() {
        let mut rng = rng();
        let card = Card::generate(Uuid::new_v4(), &mut rng);
        let free = card.cell(constants::FREE_ROW, constants::FREE_COL).unwrap();
        assert!(free.is_free());
        assert!(free.marked);
        assert_eq!(free.number, None);
    }

    #[test]
    fn test_card_no_duplicate_numbers_across_card() {
        let mut rng = rng();
        for _ in 0..50 {
            let card = Card::generate(Uuid::new_v4(), &mut rng);
            let numbers: Vec<Ball> = card
                .cells()
                .iter()
                .flatten()
                .filter_map(|cell| cell.number)
                .collect();
            let distinct: HashSet<Ball> = numbers.iter().copied().collect();
            assert_eq!(distinct.len(), 24);
        }
    }

    #[test]
    fn test_contains_number_matches_the_grid() {
        let mut rng = rng();
        let card = Card::generate(Uuid::new_v4(), &mut rng);
        let on_card: HashSet<Ball> = card
            .cells()
            .iter()
            .flatten()
            .filter_map(|cell| cell.number)
            .collect();
        for number in 1..=75u8 {
            assert_eq!(card.contains_number(number), on_card.contains(&number));
        }
        assert!(!card.contains_number(0));
        assert!(!card.contains_number(76));
    }

    #[test]
    fn test_fresh_card_does_not_win() {
        let mut rng = rng();
        let card = Card::generate(Uuid::new_v4(), &mut rng);
        assert_eq!(card.evaluate(), WinResult::none());
    }

    #[test]
    fn test_row_win_detected_with_priority() {
        let mut rng = rng();
        let mut card = Card::generate(Uuid::new_v4(), &mut rng);
        for column in 0..constants::CARD_SIZE {
            card.set_marked(0, column, true);
        }
        assert_eq!(card.evaluate(), WinResult::win(LinePattern::Row(0)));
    }

    #[test]
    fn test_column_win_uses_free_cell() {
        let mut rng = rng();
        let mut card = Card::generate(Uuid::new_v4(), &mut rng);
        // Column N passes through the free center, so 4 marks complete it.
        for row in [0, 1, 3, 4] {
            card.set_marked(row, constants::FREE_COL, true);
        }
        assert_eq!(
            card.evaluate(),
            WinResult::win(LinePattern::Column(constants::FREE_COL))
        );
    }

    #[test]
    fn test_diagonal_wins() {
        let mut rng = rng();
        let mut card = Card::generate(Uuid::new_v4(), &mut rng);
        for i in [0, 1, 3, 4] {
            card.set_marked(i, i, true);
        }
        assert_eq!(card.evaluate(), WinResult::win(LinePattern::Diagonal));

        let mut card = Card::generate(Uuid::new_v4(), &mut rng);
        for i in [0, 1, 3, 4] {
            card.set_marked(i, constants::CARD_SIZE - 1 - i, true);
        }
        assert_eq!(card.evaluate(), WinResult::win(LinePattern::AntiDiagonal));
    }

    #[test]
    fn test_unmark_reverts_win() {
        let mut rng = rng();
        let mut card = Card::generate(Uuid::new_v4(), &mut rng);
        for column in 0..constants::CARD_SIZE {
            card.set_marked(3, column, true);
        }
        assert!(card.evaluate().won);
        card.set_marked(3, 1, false);
        assert_eq!(card.evaluate(), WinResult::none());
    }

    #[test]
    fn test_pool_partition_invariant() {
        let mut rng = rng();
        let mut pool = DrawPool::new(&mut rng);
        for expected_drawn in 1..=constants::NUM_BALLS {
            assert!(pool.draw().is_some());
            assert_eq!(pool.drawn_count(), expected_drawn);
            assert_eq!(
                pool.drawn_count() + pool.remaining_count(),
                constants::NUM_BALLS
            );
        }
        assert!(pool.is_exhausted());
        assert_eq!(pool.draw(), None);
    }

    #[test]
    fn test_pool_never_repeats_a_ball() {
        let mut rng = rng();
        let mut pool = DrawPool::new(&mut rng);
        let mut seen = HashSet::new();
        while let Some(ball) = pool.draw() {
            assert!((1..=75).contains(&ball));
            assert!(seen.insert(ball), "ball {ball} drawn twice");
            assert!(pool.is_called(ball));
        }
        assert_eq!(seen.len(), constants::NUM_BALLS);
    }

    #[test]
    fn test_pool_is_called_tracks_history() {
        let mut rng = rng();
        let mut pool = DrawPool::new(&mut rng);
        let first = pool.draw().unwrap();
        assert!(pool.is_called(first));
        let uncalled = (1..=75).find(|&n| !pool.is_called(n)).unwrap();
        assert!(!pool.drawn().contains(&uncalled));
        assert!(!pool.is_called(0));
        assert!(!pool.is_called(76));
    }

    #[test]
    fn test_seeded_pools_replay_identically() {
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let mut pool_a = DrawPool::new(&mut rng_a);
        let mut pool_b = DrawPool::new(&mut rng_b);
        for _ in 0..constants::NUM_BALLS {
            assert_eq!(pool_a.draw(), pool_b.draw());
        }
    }

    #[test]
    fn test_player_name_whitespace_and_truncation() {
        let name = PlayerName::new("big bingo fan");
        assert_eq!(name.to_string(), "big_bingo_fan");

        let long = "a".repeat(100);
        let name = PlayerName::new(&long);
        assert_eq!(name.to_string().len(), constants::MAX_NAME_LENGTH);

        let name = PlayerName::from("tab\there".to_string());
        assert_eq!(name.to_string(), "tab_here");
    }

    #[test]
    fn test_line_pattern_display() {
        assert_eq!(LinePattern::Row(0).to_string(), "row 0");
        assert_eq!(LinePattern::Column(4).to_string(), "column O");
        assert_eq!(LinePattern::Diagonal.to_string(), "diagonal");
        assert_eq!(LinePattern::AntiDiagonal.to_string(), "anti-diagonal");
    }

    #[test]
    fn test_card_serializes_without_counters() {
        let mut rng = rng();
        let card = Card::generate(Uuid::new_v4(), &mut rng);
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("cells").is_some());
        assert!(json.get("row_marks").is_none());
    }
}
