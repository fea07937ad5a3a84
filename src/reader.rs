//! Page state reader.
//!
//! Builds a [`GameSnapshot`] from the live page through the [`PageDriver`]
//! capability set. Every read is best-effort: missing elements and
//! unparseable text degrade to defaults (zero score, empty cell, not game
//! over) instead of failing the run. Only driver transport faults propagate.

use tracing::trace;

use crate::config::SelectorConfig;
use crate::driver::{DriverError, PageDriver};
use crate::snapshot::{GRID_SIZE, GameSnapshot, Grid, parse_score, parse_tile};

/// Inline-style marker the game sets on its overlay when the run is lost.
const GAME_OVER_MARKER: &str = "display: flex";

/// Reads game state from a page using configured selectors.
pub struct StateReader {
    score_selector: String,
    tiles_selector: String,
    overlay_selector: String,
    row_attr: String,
    col_attr: String,
}

impl StateReader {
    pub fn new(selectors: &SelectorConfig) -> Self {
        Self {
            score_selector: selectors.score.clone(),
            tiles_selector: selectors.tiles.clone(),
            overlay_selector: selectors.overlay.clone(),
            row_attr: selectors.row_attr.clone(),
            col_attr: selectors.col_attr.clone(),
        }
    }

    /// Take one snapshot of the rendered game.
    pub fn read(&self, driver: &mut dyn PageDriver) -> Result<GameSnapshot, DriverError> {
        let score = match driver.query_text(&self.score_selector)? {
            Some(text) => parse_score(&text),
            None => 0,
        };

        let grid = self.read_grid(driver)?;
        let game_over = self.read_game_over(driver)?;

        trace!(score, game_over, "snapshot read");
        Ok(GameSnapshot {
            score,
            grid,
            game_over,
        })
    }

    /// Read the 4×4 grid. Cells missing a position attribute, or whose
    /// position or text does not parse, are treated as empty.
    fn read_grid(&self, driver: &mut dyn PageDriver) -> Result<Grid, DriverError> {
        let mut grid: Grid = [[0; GRID_SIZE]; GRID_SIZE];

        let views = driver.query_all(
            &self.tiles_selector,
            &[self.row_attr.as_str(), self.col_attr.as_str()],
        )?;

        for view in views {
            let Some(row) = view.attribute(&self.row_attr).and_then(parse_index) else {
                continue;
            };
            let Some(col) = view.attribute(&self.col_attr).and_then(parse_index) else {
                continue;
            };
            if let Some(value) = parse_tile(&view.text) {
                grid[row][col] = value;
            }
        }

        Ok(grid)
    }

    /// Game-over detection: the overlay's inline style must carry the
    /// visible-display marker. Absent element or attribute means not over.
    fn read_game_over(&self, driver: &mut dyn PageDriver) -> Result<bool, DriverError> {
        let style = driver.query_attribute(&self.overlay_selector, "style")?;
        Ok(style.is_some_and(|s| s.contains(GAME_OVER_MARKER)))
    }
}

fn parse_index(text: &str) -> Option<usize> {
    let index: usize = text.trim().parse().ok()?;
    (index < GRID_SIZE).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ElementView;
    use std::collections::HashMap;

    /// Scripted page: fixed answers per selector.
    #[derive(Default)]
    struct FakePage {
        score_text: Option<String>,
        overlay_style: Option<String>,
        tiles: Vec<ElementView>,
    }

    impl FakePage {
        fn tile(row: &str, col: &str, text: &str) -> ElementView {
            let mut attributes = HashMap::new();
            attributes.insert("data-row".to_string(), row.to_string());
            attributes.insert("data-col".to_string(), col.to_string());
            ElementView {
                text: text.to_string(),
                attributes,
            }
        }

        fn tile_without_position(text: &str) -> ElementView {
            ElementView {
                text: text.to_string(),
                attributes: HashMap::new(),
            }
        }
    }

    impl PageDriver for FakePage {
        fn query_text(&mut self, selector: &str) -> Result<Option<String>, DriverError> {
            assert_eq!(selector, ".score");
            Ok(self.score_text.clone())
        }

        fn query_attribute(
            &mut self,
            selector: &str,
            name: &str,
        ) -> Result<Option<String>, DriverError> {
            assert_eq!(selector, ".game-over-overlay");
            assert_eq!(name, "style");
            Ok(self.overlay_style.clone())
        }

        fn query_all(
            &mut self,
            selector: &str,
            _attrs: &[&str],
        ) -> Result<Vec<ElementView>, DriverError> {
            assert_eq!(selector, ".grid-cell");
            Ok(self.tiles.clone())
        }

        fn press_key(&mut self, _key: char) -> Result<(), DriverError> {
            unreachable!("reader never presses keys")
        }
    }

    fn reader() -> StateReader {
        StateReader::new(&crate::config::SelectorConfig::default())
    }

    #[test]
    fn reads_score_from_text() {
        let mut page = FakePage {
            score_text: Some("Score: 1234".to_string()),
            ..Default::default()
        };
        let snap = reader().read(&mut page).unwrap();
        assert_eq!(snap.score, 1234);
    }

    #[test]
    fn missing_score_element_defaults_to_zero() {
        let mut page = FakePage::default();
        let snap = reader().read(&mut page).unwrap();
        assert_eq!(snap.score, 0);
    }

    #[test]
    fn score_without_digits_defaults_to_zero() {
        let mut page = FakePage {
            score_text: Some("Score:".to_string()),
            ..Default::default()
        };
        let snap = reader().read(&mut page).unwrap();
        assert_eq!(snap.score, 0);
    }

    #[test]
    fn tiles_land_at_their_positions() {
        let mut page = FakePage {
            tiles: vec![
                FakePage::tile("0", "0", "2"),
                FakePage::tile("1", "1", "4"),
                FakePage::tile("2", "2", "8"),
                FakePage::tile("3", "0", "1024"),
            ],
            ..Default::default()
        };
        let snap = reader().read(&mut page).unwrap();
        assert_eq!(snap.grid[0][0], 2);
        assert_eq!(snap.grid[1][1], 4);
        assert_eq!(snap.grid[2][2], 8);
        assert_eq!(snap.grid[3][0], 1024);
        assert_eq!(snap.max_tile(), 1024);
    }

    #[test]
    fn tiles_without_position_attributes_are_skipped() {
        let mut page = FakePage {
            tiles: vec![
                FakePage::tile_without_position("512"),
                FakePage::tile("0", "1", "2"),
            ],
            ..Default::default()
        };
        let snap = reader().read(&mut page).unwrap();
        assert_eq!(snap.max_tile(), 2);
    }

    #[test]
    fn non_numeric_and_out_of_range_cells_are_empty() {
        let mut page = FakePage {
            tiles: vec![
                FakePage::tile("0", "0", "sparkle"),
                FakePage::tile("0", "1", ""),
                FakePage::tile("9", "0", "64"),
                FakePage::tile("1", "x", "64"),
            ],
            ..Default::default()
        };
        let snap = reader().read(&mut page).unwrap();
        assert_eq!(snap.max_tile(), 0);
    }

    #[test]
    fn overlay_display_flex_means_game_over() {
        let mut page = FakePage {
            overlay_style: Some("display: flex; opacity: 1".to_string()),
            ..Default::default()
        };
        assert!(reader().read(&mut page).unwrap().game_over);
    }

    #[test]
    fn overlay_display_none_is_not_game_over() {
        let mut page = FakePage {
            overlay_style: Some("display: none".to_string()),
            ..Default::default()
        };
        assert!(!reader().read(&mut page).unwrap().game_over);
    }

    #[test]
    fn absent_overlay_is_not_game_over() {
        let mut page = FakePage::default();
        assert!(!reader().read(&mut page).unwrap().game_over);
    }
}
