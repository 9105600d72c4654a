//! Editing domains for the pixel-art editor: the stage grid, the tool
//! palettes, the pointer, and the context that owns them.

pub mod context;
pub mod history;
pub mod palette;
pub mod pointer;
pub mod stage;

pub use context::AppContext;
pub use history::{record_edit, History};
pub use palette::{Palette, PaletteConfig};
pub use pointer::{pointer_label, update_pointer, watch_pointer_label, PointerState};
pub use stage::{Cell, Stage, StageData, TRANSPARENT};
