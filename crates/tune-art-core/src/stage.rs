//! Stage grid: the pixel cells the user paints, with every edit recorded in
//! the shared history.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tune_art_store::{Store, Subscription};

use crate::history::{record_edit, History};

/// Fully transparent, the color of an unpainted cell.
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// One grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// `[r, g, b, a]`.
    pub color: [u8; 4],
    /// Modifier name attached to the cell, if any.
    #[serde(rename = "mod")]
    pub modifier: Option<String>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            color: TRANSPARENT,
            modifier: None,
        }
    }
}

/// Row-major grid of `width * height` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageData {
    pub width: usize,
    pub height: usize,
    pub data: Vec<Cell>,
}

impl StageData {
    /// A transparent grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![Cell::default(); width * height],
        }
    }

    /// Row-major index of `(x, y)`, or `None` outside the grid.
    pub fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.index(x, y).and_then(|i| self.data.get(i))
    }

    /// Number of cells that are not transparent or carry a modifier.
    pub fn painted_count(&self) -> usize {
        self.data.iter().filter(|c| **c != Cell::default()).count()
    }

    fn validate(&self) -> Result<()> {
        let Some(expected) = self.width.checked_mul(self.height) else {
            bail!("Stage size {}x{} is too large", self.width, self.height);
        };
        if self.data.len() != expected {
            bail!(
                "Stage data has {} cells, expected {}x{} = {}",
                self.data.len(),
                self.width,
                self.height,
                expected
            );
        }
        Ok(())
    }
}

/// The stage store plus the history its edits are recorded in.
#[derive(Debug, Clone)]
pub struct Stage {
    store: Store<StageData>,
    history: History,
}

impl Stage {
    pub fn new(width: usize, height: usize, history: History) -> Self {
        Self {
            store: Store::new("stage-data", StageData::new(width, height)),
            history,
        }
    }

    pub fn store(&self) -> &Store<StageData> {
        &self.store
    }

    pub fn get_state(&self) -> std::rc::Rc<StageData> {
        self.store.get_state()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StageData, &StageData) + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Resets the grid to its starting size and contents.
    pub fn clear_stage_data(&self) -> Result<()> {
        let default = self.store.default_state();
        record_edit(&self.store, &self.history, |state| {
            state.width = default.width;
            state.height = default.height;
            state.data = default.data.clone();
        })
    }

    /// Replaces dimensions and cells in one recorded edit.
    ///
    /// # Errors
    ///
    /// Returns an error if `payload.data` does not hold exactly
    /// `width * height` cells.
    pub fn update_stage_data(&self, payload: StageData) -> Result<()> {
        payload.validate()?;
        record_edit(&self.store, &self.history, move |state| {
            state.width = payload.width;
            state.height = payload.height;
            state.data = payload.data;
        })
    }

    /// Paints one cell.
    ///
    /// # Errors
    ///
    /// Returns an error if `(x, y)` is outside the grid.
    pub fn paint_cell(
        &self,
        x: usize,
        y: usize,
        color: [u8; 4],
        modifier: Option<String>,
    ) -> Result<()> {
        let index = self.index_checked(x, y)?;
        record_edit(&self.store, &self.history, move |state| {
            state.data[index] = Cell { color, modifier };
        })
    }

    /// Returns one cell to transparent with no modifier.
    ///
    /// # Errors
    ///
    /// Returns an error if `(x, y)` is outside the grid.
    pub fn erase_cell(&self, x: usize, y: usize) -> Result<()> {
        let index = self.index_checked(x, y)?;
        record_edit(&self.store, &self.history, move |state| {
            state.data[index] = Cell::default();
        })
    }

    fn index_checked(&self, x: usize, y: usize) -> Result<usize> {
        let state = self.store.get_state();
        match state.index(x, y) {
            Some(index) => Ok(index),
            None => bail!(
                "Cell ({x}, {y}) is outside the {}x{} stage",
                state.width,
                state.height
            ),
        }
    }
}
