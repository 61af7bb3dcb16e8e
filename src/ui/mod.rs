/// User interface module
///
/// Rows, tray, preview ghost and drop highlights. Pointer input is reported
/// back as `Message`s; the view never mutates the board itself.

pub mod board_view;

pub use board_view::BoardView;
