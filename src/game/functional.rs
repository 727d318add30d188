//! Pure win-detection functions.
//!
//! [`Card::evaluate`](super::entities::Card::evaluate) answers the same
//! question from incremental counters; the functions here rescan the full
//! grid and serve as the reference implementation for property tests and
//! benchmarks.

use super::constants;
use super::entities::{Card, LinePattern, WinResult};

/// The winning patterns in evaluation priority order: rows 0-4, columns
/// 0-4, main diagonal, anti-diagonal.
#[must_use]
pub fn patterns_in_priority_order() -> [LinePattern; constants::NUM_LINE_PATTERNS] {
    [
        LinePattern::Row(0),
        LinePattern::Row(1),
        LinePattern::Row(2),
        LinePattern::Row(3),
        LinePattern::Row(4),
        LinePattern::Column(0),
        LinePattern::Column(1),
        LinePattern::Column(2),
        LinePattern::Column(3),
        LinePattern::Column(4),
        LinePattern::Diagonal,
        LinePattern::AntiDiagonal,
    ]
}

/// The `(row, column)` cells making up a pattern.
#[must_use]
pub fn pattern_cells(pattern: LinePattern) -> [(usize, usize); constants::CARD_SIZE] {
    let mut cells = [(0, 0); constants::CARD_SIZE];
    for (i, slot) in cells.iter_mut().enumerate() {
        *slot = match pattern {
            LinePattern::Row(row) => (row, i),
            LinePattern::Column(column) => (i, column),
            LinePattern::Diagonal => (i, i),
            LinePattern::AntiDiagonal => (i, constants::CARD_SIZE - 1 - i),
        };
    }
    cells
}

/// Whether every cell of `pattern` is marked on `card`.
#[must_use]
pub fn pattern_complete(card: &Card, pattern: LinePattern) -> bool {
    pattern_cells(pattern)
        .into_iter()
        .all(|(row, column)| card.cells()[column][row].marked)
}

/// Full-rescan evaluation: first complete pattern in priority order.
#[must_use]
pub fn evaluate_cells(card: &Card) -> WinResult {
    patterns_in_priority_order()
        .into_iter()
        .find(|&pattern| pattern_complete(card, pattern))
        .map_or_else(WinResult::none, WinResult::win)
}

/// Count of marked cells, free center included.
#[must_use]
pub fn marked_count(card: &Card) -> usize {
    card.cells()
        .iter()
        .flatten()
        .filter(|cell| cell.marked)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Card;
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn fresh_card() -> Card {
        let mut rng = StdRng::seed_from_u64(99);
        Card::generate(Uuid::new_v4(), &mut rng)
    }

    #[test]
    fn test_every_pattern_has_five_cells_in_bounds() {
        for pattern in patterns_in_priority_order() {
            let cells = pattern_cells(pattern);
            assert_eq!(cells.len(), 5);
            for (row, column) in cells {
                assert!(row < 5 && column < 5);
            }
        }
    }

    #[test]
    fn test_fresh_card_only_free_cell_marked() {
        let card = fresh_card();
        assert_eq!(marked_count(&card), 1);
        assert_eq!(evaluate_cells(&card), WinResult::none());
    }

    #[test]
    fn test_reference_agrees_with_incremental_on_row_win() {
        let mut card = fresh_card();
        for column in 0..5 {
            card.set_marked(0, column, true);
        }
        assert_eq!(evaluate_cells(&card), card.evaluate());
        assert_eq!(evaluate_cells(&card), WinResult::win(LinePattern::Row(0)));
    }

    #[test]
    fn test_four_of_five_everywhere_is_not_a_win() {
        // One unmarked gap per row, placed so every column and both
        // diagonals are punctured too, without touching the free center.
        let gaps = [(0, 0), (1, 3), (2, 4), (3, 1), (4, 2)];
        let mut card = fresh_card();
        for row in 0..5 {
            for column in 0..5 {
                let free = row == 2 && column == 2;
                if !free && !gaps.contains(&(row, column)) {
                    card.set_marked(row, column, true);
                }
            }
        }
        for pattern in patterns_in_priority_order() {
            assert!(!pattern_complete(&card, pattern), "{pattern} complete");
        }
        assert_eq!(card.evaluate(), WinResult::none());
        assert_eq!(evaluate_cells(&card), WinResult::none());
    }

    proptest! {
        // The incremental counters and the full rescan must agree on
        // any reachable mark set.
        #[test]
        fn test_incremental_detector_matches_reference(
            seed in any::<u64>(),
            positions in prop::collection::hash_set((0usize..5, 0usize..5), 0..=24),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut card = Card::generate(Uuid::new_v4(), &mut rng);

            let marks: HashSet<(usize, usize)> = positions
                .into_iter()
                .filter(|&(row, column)| !(row == 2 && column == 2))
                .collect();
            for &(row, column) in &marks {
                card.set_marked(row, column, true);
            }
            prop_assert_eq!(card.evaluate(), evaluate_cells(&card));

            // Unmarking everything restores the no-win baseline.
            for &(row, column) in &marks {
                card.set_marked(row, column, false);
            }
            prop_assert_eq!(card.evaluate(), WinResult::none());
            prop_assert_eq!(card.evaluate(), evaluate_cells(&card));
        }
    }
}
