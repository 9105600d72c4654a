//! Application context: one long-lived instance of every state domain,
//! created at startup and handed to whatever needs it.

use std::cell::RefCell;

use anyhow::{Context, Result};
use tune_art_config::{AppConfig, HexColor};
use tune_art_store::Store;

use crate::history::{History, PatchListener};
use crate::palette::Palette;
use crate::pointer::{update_pointer, PointerState};
use crate::stage::Stage;

/// Owns the stores of the editor and the history they share.
#[derive(Debug)]
pub struct AppContext {
    pub history: History,
    pub stage: Stage,
    pub stage_palette: Palette,
    pub canvas_palette: Palette,
    pub pointer: Store<PointerState>,
    binding: RefCell<Option<PatchListener>>,
}

impl AppContext {
    pub fn new(config: &AppConfig) -> Self {
        let history = History::new(config.history_config());
        tracing::debug!(
            width = config.stage_width,
            height = config.stage_height,
            max_undo_depth = history.config().max_undo_depth,
            "creating app context"
        );
        Self {
            stage: Stage::new(config.stage_width, config.stage_height, history.clone()),
            stage_palette: Palette::new("stage-config", config.stage_primary_color),
            canvas_palette: Palette::new("canvas-config", config.canvas_primary_color),
            pointer: Store::new("pointer", PointerState::default()),
            history,
            binding: RefCell::new(None),
        }
    }

    /// Wires undo and redo to the stage. Calling it again while bound does
    /// nothing.
    pub fn bind_history(&self) {
        let mut binding = self.binding.borrow_mut();
        if binding.is_none() {
            *binding = Some(self.history.bind_store(self.stage.store()));
        }
    }

    pub fn is_history_bound(&self) -> bool {
        self.binding.borrow().is_some()
    }

    pub fn undo(&self) -> bool {
        self.history.undo_change()
    }

    pub fn redo(&self) -> bool {
        self.history.redo_change()
    }

    /// Paints `(x, y)` with `color`, or with the stage palette's color and
    /// modifier when `color` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if no color is given and the palette has none
    /// selected, or if the cell is outside the stage.
    pub fn paint(&self, x: usize, y: usize, color: Option<HexColor>) -> Result<()> {
        let palette = self.stage_palette.get_state();
        let color = color
            .or(palette.primary_color)
            .context("No color selected; pick a color before painting")?;
        self.stage
            .paint_cell(x, y, color.to_rgba(), palette.current_modifier.clone())
    }

    pub fn move_pointer(&self, x: i32, y: i32, mouse_over: bool) {
        update_pointer(&self.pointer, [x, y], mouse_over);
    }

    /// Unbinds the history (clearing it) and drops every store listener.
    pub fn shutdown(&self) {
        if let Some(binding) = self.binding.borrow_mut().take() {
            binding.dispose();
        }
        self.stage.store().destroy();
        self.stage_palette.store().destroy();
        self.canvas_palette.store().destroy();
        self.pointer.destroy();
        self.history.store().destroy();
        tracing::debug!("app context shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> AppConfig {
        AppConfig {
            stage_width: 4,
            stage_height: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_context_uses_config() {
        let config = small_config();
        let ctx = AppContext::new(&config);
        assert_eq!(ctx.stage.get_state().width, 4);
        assert_eq!(
            ctx.stage_palette.get_state().primary_color,
            Some(config.stage_primary_color)
        );
        assert_eq!(
            ctx.canvas_palette.get_state().primary_color,
            Some(config.canvas_primary_color)
        );
        assert!(!ctx.is_history_bound());
    }

    #[test]
    fn test_bind_history_is_idempotent() {
        let ctx = AppContext::new(&small_config());
        ctx.bind_history();
        ctx.bind_history();
        assert_eq!(ctx.history.store().listener_count(), 1);
    }

    #[test]
    fn test_paint_uses_palette() {
        let ctx = AppContext::new(&small_config());
        ctx.stage_palette.set_current_modifier(Some("glow".into()));
        ctx.paint(0, 0, None).unwrap();

        let state = ctx.stage.get_state();
        let cell = state.cell(0, 0).unwrap();
        assert_eq!(cell.color, [0xaf, 0x3e, 0xee, 255]);
        assert_eq!(cell.modifier.as_deref(), Some("glow"));
    }

    #[test]
    fn test_paint_without_color_fails_in_flag_mode() {
        let ctx = AppContext::new(&small_config());
        ctx.stage_palette.set_current_flag(Some(1));
        assert!(ctx.paint(0, 0, None).is_err());
        ctx.paint(0, 0, Some(HexColor::rgb(1, 2, 3))).unwrap();
    }

    #[test]
    fn test_undo_redo_without_binding_only_moves_stacks() {
        let ctx = AppContext::new(&small_config());
        ctx.paint(1, 1, None).unwrap();
        assert!(ctx.undo());
        // Nothing replays the inverse patches.
        assert_ne!(ctx.stage.get_state().painted_count(), 0);
    }

    #[test]
    fn test_shutdown_clears_history_and_listeners() {
        let ctx = AppContext::new(&small_config());
        ctx.bind_history();
        let _sub = ctx.stage.subscribe(|_, _| {});
        ctx.paint(1, 1, None).unwrap();

        ctx.shutdown();
        assert!(!ctx.is_history_bound());
        assert_eq!(ctx.history.undo_depth(), 0);
        assert_eq!(ctx.stage.store().listener_count(), 0);
        assert_eq!(ctx.history.store().listener_count(), 0);
    }
}
