// Integration tests for the editing domains.
//
// These drive an AppContext the way the editor does: paint through the
// palette, undo and redo through the bound history, and observe the
// stores through selectors.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use tune_art_config::{AppConfig, HexColor};
use tune_art_core::{pointer_label, watch_pointer_label, AppContext, Cell, StageData};

fn context(width: usize, height: usize) -> AppContext {
    let ctx = AppContext::new(&AppConfig {
        stage_width: width,
        stage_height: height,
        ..Default::default()
    });
    ctx.bind_history();
    ctx
}

// ── Undo / redo through the context ────────────────────────────────────

#[test]
fn test_paint_undo_redo() {
    let ctx = context(4, 4);
    let red = HexColor::rgb(255, 0, 0);

    ctx.paint(1, 1, Some(red)).unwrap();
    ctx.paint(2, 2, None).unwrap();
    let painted = ctx.stage.get_state();

    assert!(ctx.undo());
    assert_eq!(*ctx.stage.get_state().cell(2, 2).unwrap(), Cell::default());
    assert!(ctx.undo());
    assert_eq!(*ctx.stage.get_state(), StageData::new(4, 4));
    assert!(!ctx.undo());

    assert!(ctx.redo());
    assert!(ctx.redo());
    assert_eq!(*ctx.stage.get_state(), *painted);
    assert!(!ctx.redo());
}

#[test]
fn test_resize_and_clear_undo() {
    let ctx = context(2, 2);
    ctx.paint(0, 0, None).unwrap();
    ctx.stage.update_stage_data(StageData::new(6, 3)).unwrap();
    ctx.paint(5, 2, None).unwrap();
    ctx.stage.clear_stage_data().unwrap();
    assert_eq!(*ctx.stage.get_state(), StageData::new(2, 2));

    ctx.undo();
    let state = ctx.stage.get_state();
    assert_eq!((state.width, state.height), (6, 3));
    assert_ne!(*state.cell(5, 2).unwrap(), Cell::default());

    ctx.undo();
    ctx.undo();
    let state = ctx.stage.get_state();
    assert_eq!((state.width, state.height), (2, 2));
    assert_eq!(state.painted_count(), 1);
}

#[test]
fn test_new_edit_after_undo_drops_redo() {
    let ctx = context(3, 3);
    ctx.paint(0, 0, None).unwrap();
    ctx.paint(1, 0, None).unwrap();
    ctx.undo();
    assert!(ctx.history.can_redo());

    ctx.stage.erase_cell(0, 0).unwrap();
    assert!(!ctx.history.can_redo());
    assert_eq!(ctx.stage.get_state().painted_count(), 0);
}

#[test]
fn test_palette_changes_are_not_recorded() {
    let ctx = context(2, 2);
    ctx.stage_palette.set_primary_color(Some(HexColor::rgb(0, 0, 0)));
    ctx.canvas_palette.set_current_flag(Some(4));
    ctx.move_pointer(1, 1, true);
    assert_eq!(ctx.history.undo_depth(), 0);
}

// ── Selectors ──────────────────────────────────────────────────────────

#[test]
fn test_cell_selector_ignores_unrelated_changes() {
    let ctx = context(4, 4);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = ctx.stage.store().select(
        |stage: &StageData| stage.cell(0, 0).map(|c| c.color),
        move |new: &Option<[u8; 4]>, _| sink.borrow_mut().push(*new),
    );

    ctx.move_pointer(3, 3, true);
    ctx.paint(3, 3, None).unwrap();
    assert!(seen.borrow().is_empty());

    ctx.paint(0, 0, Some(HexColor::rgb(1, 2, 3))).unwrap();
    ctx.undo();
    assert_eq!(
        *seen.borrow(),
        vec![Some([1, 2, 3, 255]), Some([0, 0, 0, 0])]
    );
}

#[test]
fn test_pointer_label_follows_context() {
    let ctx = context(2, 2);
    let label = watch_pointer_label(&ctx.pointer);
    ctx.move_pointer(7, 8, true);
    assert_eq!(*label.get(), "7 8");
    ctx.move_pointer(7, 8, false);
    assert_eq!(pointer_label(&ctx.pointer.get_state()), "--");
}

#[test]
fn test_depth_watch_tracks_edits() {
    let ctx = context(2, 2);
    let undo_depth = ctx.history.watch_undo_depth();
    ctx.paint(0, 0, None).unwrap();
    ctx.paint(1, 0, None).unwrap();
    ctx.undo();
    assert_eq!(*undo_depth.get(), 1);
}

// ── Rewind property over stage edits ───────────────────────────────────

#[derive(Debug, Clone)]
enum StageEdit {
    Paint(usize, usize, [u8; 4]),
    Erase(usize, usize),
    Resize(usize, usize),
    Clear,
}

fn stage_edit() -> impl Strategy<Value = StageEdit> {
    prop_oneof![
        (0usize..6, 0usize..6, any::<[u8; 4]>()).prop_map(|(x, y, c)| StageEdit::Paint(x, y, c)),
        (0usize..6, 0usize..6).prop_map(|(x, y)| StageEdit::Erase(x, y)),
        (1usize..6, 1usize..6).prop_map(|(w, h)| StageEdit::Resize(w, h)),
        Just(StageEdit::Clear),
    ]
}

proptest! {
    #[test]
    fn prop_stage_rewind_and_replay(edits in proptest::collection::vec(stage_edit(), 0..30)) {
        let ctx = context(3, 3);
        for e in &edits {
            // Out-of-bounds edits fail without touching the stage.
            let _ = match e {
                StageEdit::Paint(x, y, c) => ctx.stage.paint_cell(*x, *y, *c, None),
                StageEdit::Erase(x, y) => ctx.stage.erase_cell(*x, *y),
                StageEdit::Resize(w, h) => ctx.stage.update_stage_data(StageData::new(*w, *h)),
                StageEdit::Clear => ctx.stage.clear_stage_data(),
            };
        }
        let edited = ctx.stage.get_state();

        while ctx.undo() {}
        prop_assert_eq!(&*ctx.stage.get_state(), &StageData::new(3, 3));

        while ctx.redo() {}
        prop_assert_eq!(&*ctx.stage.get_state(), &*edited);
    }
}
