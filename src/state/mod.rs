/// State management module
///
/// This module handles all board state, including:
/// - Shared data structures (data.rs)
/// - Item ownership and the fixed container set (board.rs)
/// - The drag-interaction state machine (drag.rs)

pub mod board;
pub mod data;
pub mod drag;

pub use board::{Board, BoardError, BoardSnapshot, RowSnapshot};
pub use data::{Container, ContainerId, ImageSource, Item, ItemId};
pub use drag::{DragEvent, DragOutcome, DragState};
