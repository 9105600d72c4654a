//! Tool palette: the active color, modifier or flag. Palette changes are
//! not part of the undo history.

use serde::{Deserialize, Serialize};
use tune_art_config::HexColor;
use tune_art_store::{Store, Subscription, Watch};

/// The active painting tool. A flag excludes the color and modifier tools.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaletteConfig {
    pub primary_color: Option<HexColor>,
    pub current_modifier: Option<String>,
    pub current_flag: Option<u8>,
}

impl PaletteConfig {
    pub fn with_color(color: HexColor) -> Self {
        Self {
            primary_color: Some(color),
            ..Default::default()
        }
    }
}

/// One palette store. The stage and the canvas each own one.
#[derive(Debug, Clone)]
pub struct Palette {
    store: Store<PaletteConfig>,
}

impl Palette {
    pub fn new(name: &str, primary_color: HexColor) -> Self {
        Self {
            store: Store::new(name, PaletteConfig::with_color(primary_color)),
        }
    }

    pub fn store(&self) -> &Store<PaletteConfig> {
        &self.store
    }

    pub fn get_state(&self) -> std::rc::Rc<PaletteConfig> {
        self.store.get_state()
    }

    /// Selects a color and drops the flag.
    pub fn set_primary_color(&self, color: Option<HexColor>) {
        self.store.update(|state| {
            state.primary_color = color;
            state.current_flag = None;
        });
    }

    /// Selects a modifier and drops the flag.
    pub fn set_current_modifier(&self, modifier: Option<String>) {
        self.store.update(|state| {
            state.current_modifier = modifier;
            state.current_flag = None;
        });
    }

    /// Selects a flag, dropping both the modifier and the color.
    pub fn set_current_flag(&self, flag: Option<u8>) {
        self.store.update(|state| {
            state.current_flag = flag;
            state.current_modifier = None;
            state.primary_color = None;
        });
    }

    /// Calls `on_change(new, old)` whenever the primary color changes.
    pub fn on_primary_color<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&Option<HexColor>, &Option<HexColor>) + 'static,
    {
        self.store.select(|state| state.primary_color, on_change)
    }

    pub fn watch_primary_color(&self) -> Watch<Option<HexColor>> {
        self.store.watch(|state| state.primary_color)
    }
}
