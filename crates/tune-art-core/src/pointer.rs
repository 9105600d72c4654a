//! Pointer position over the stage, shown in the info panel.

use serde::{Deserialize, Serialize};
use tune_art_store::{Store, Watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointerState {
    /// Cell coordinates `[x, y]`.
    pub position: [i32; 2],
    pub mouse_over: bool,
}

/// `"x y"` while the pointer is over the stage, `"--"` otherwise.
pub fn pointer_label(state: &PointerState) -> String {
    if state.mouse_over {
        format!("{} {}", state.position[0], state.position[1])
    } else {
        "--".to_string()
    }
}

pub fn update_pointer(store: &Store<PointerState>, position: [i32; 2], mouse_over: bool) {
    store.update(|state| {
        state.position = position;
        state.mouse_over = mouse_over;
    });
}

/// Live pointer label; only changes when the rendered text would.
pub fn watch_pointer_label(store: &Store<PointerState>) -> Watch<String> {
    store.watch(pointer_label)
}
