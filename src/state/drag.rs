/// Drag-interaction state machine
///
/// The drag is an explicit value (`DragState`) owned by the application and
/// threaded through `DragState::apply`. Each pointer event becomes a
/// `DragEvent`; the result is the next state plus a `DragOutcome` telling
/// the caller what happened to the board.

use super::board::{Board, BoardError};
use super::data::{ContainerId, ItemId};

const PAYLOAD_PREFIX: &str = "tier-item:";

/// Item identity encoded as transferable text, resolved on drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload(String);

impl DragPayload {
    pub fn encode(item: ItemId) -> Self {
        DragPayload(format!("{}{}", PAYLOAD_PREFIX, item.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The item this payload refers to, if well-formed
    pub fn item(&self) -> Option<ItemId> {
        self.0
            .strip_prefix(PAYLOAD_PREFIX)?
            .parse::<u64>()
            .ok()
            .map(ItemId)
    }
}

/// The in-flight drag
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub item: ItemId,
    pub source: ContainerId,
    pub payload: DragPayload,
    /// Container showing the drop preview (never the source)
    pub hover: Option<ContainerId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Pointer-level input translated for the machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    Start { item: ItemId, source: ContainerId },
    Enter(ContainerId),
    Leave(ContainerId),
    Drop(ContainerId),
    /// Drag finished without landing on a container
    End,
}

/// What a transition did
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Event had no meaning in the current state
    Ignored,
    Started,
    /// Hover target changed (highlight/ghost must be redrawn)
    PreviewChanged,
    Moved {
        item: ItemId,
        from: ContainerId,
        to: ContainerId,
    },
    /// Dropped back onto the source container
    Unchanged,
    Cancelled,
    Rejected(BoardError),
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match self {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    /// Container that should render the highlight and the preview ghost
    pub fn preview_target(&self) -> Option<ContainerId> {
        self.session().and_then(|session| session.hover)
    }

    /// The item a preview ghost should show
    pub fn dragged_item(&self) -> Option<ItemId> {
        self.session().map(|session| session.item)
    }

    /// Run one transition
    pub fn apply(self, event: DragEvent, board: &mut Board) -> (DragState, DragOutcome) {
        match (self, event) {
            (DragState::Idle, DragEvent::Start { item, source }) => {
                if board.owner_of(item) != Some(source) {
                    let error = match board.item(item) {
                        Some(_) => BoardError::NotInContainer { item, container: source },
                        None => BoardError::UnknownItem(item),
                    };
                    return (DragState::Idle, DragOutcome::Rejected(error));
                }

                let session = DragSession {
                    item,
                    source,
                    payload: DragPayload::encode(item),
                    hover: None,
                };
                (DragState::Dragging(session), DragOutcome::Started)
            }

            // One pointer, one session: a second start keeps the first
            (state @ DragState::Dragging(_), DragEvent::Start { .. }) => (state, DragOutcome::Ignored),

            (DragState::Dragging(mut session), DragEvent::Enter(target)) => {
                // Hovering the source shows nothing
                let hover = (target != session.source).then_some(target);
                let outcome = if hover == session.hover {
                    DragOutcome::Ignored
                } else {
                    DragOutcome::PreviewChanged
                };
                session.hover = hover;
                (DragState::Dragging(session), outcome)
            }

            (DragState::Dragging(mut session), DragEvent::Leave(target)) => {
                if session.hover == Some(target) {
                    session.hover = None;
                    (DragState::Dragging(session), DragOutcome::PreviewChanged)
                } else {
                    (DragState::Dragging(session), DragOutcome::Ignored)
                }
            }

            (DragState::Dragging(session), DragEvent::Drop(target)) => {
                (DragState::Idle, commit_drop(session, target, board))
            }

            (DragState::Dragging(_), DragEvent::End) => (DragState::Idle, DragOutcome::Cancelled),

            (DragState::Idle, _) => (DragState::Idle, DragOutcome::Ignored),
        }
    }
}

/// Detach from the source and re-attach at the end of the target
fn commit_drop(session: DragSession, target: ContainerId, board: &mut Board) -> DragOutcome {
    // Panics on an unknown target before touching the source
    board.container(target);

    let Some(item) = session.payload.item() else {
        return DragOutcome::Rejected(BoardError::UnknownItem(session.item));
    };

    if session.source == target {
        return DragOutcome::Unchanged;
    }

    match board.remove_item(item, session.source) {
        Ok(detached) => {
            board.append_item(detached, target);
            DragOutcome::Moved {
                item,
                from: session.source,
                to: target,
            }
        }
        Err(error) => DragOutcome::Rejected(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;
    use crate::state::data::ImageSource;
    use image::ImageFormat;

    fn board_with(count: u8) -> (Board, Vec<ItemId>) {
        let mut board = Board::new(&BoardConfig::default().tiers);
        let ids = (0..count)
            .map(|n| board.add_item(ImageSource::encode(ImageFormat::Png, &[n])))
            .collect();
        (board, ids)
    }

    fn run(board: &mut Board, events: &[DragEvent]) -> (DragState, Vec<DragOutcome>) {
        let mut state = DragState::Idle;
        let mut outcomes = Vec::new();
        for event in events {
            let (next, outcome) = state.apply(*event, board);
            state = next;
            outcomes.push(outcome);
        }
        (state, outcomes)
    }

    #[test]
    fn test_payload_round_trip() {
        let payload = DragPayload::encode(ItemId(42));
        assert_eq!(payload.as_str(), "tier-item:42");
        assert_eq!(payload.item(), Some(ItemId(42)));
        assert_eq!(DragPayload("tier-item:x".into()).item(), None);
    }

    #[test]
    fn test_start_captures_session() {
        let (mut board, ids) = board_with(1);
        let (state, outcomes) = run(
            &mut board,
            &[DragEvent::Start {
                item: ids[0],
                source: ContainerId::Tray,
            }],
        );

        assert_eq!(outcomes, vec![DragOutcome::Started]);
        let session = state.session().unwrap();
        assert_eq!(session.item, ids[0]);
        assert_eq!(session.source, ContainerId::Tray);
        assert_eq!(session.payload.item(), Some(ids[0]));
        assert_eq!(state.preview_target(), None);
    }

    #[test]
    fn test_start_from_wrong_container_is_rejected() {
        let (mut board, ids) = board_with(1);
        let (state, outcomes) = run(
            &mut board,
            &[DragEvent::Start {
                item: ids[0],
                source: ContainerId::Tier(0),
            }],
        );

        assert!(!state.is_dragging());
        assert!(matches!(outcomes[0], DragOutcome::Rejected(BoardError::NotInContainer { .. })));
    }

    #[test]
    fn test_second_start_is_ignored() {
        let (mut board, ids) = board_with(2);
        let (state, outcomes) = run(
            &mut board,
            &[
                DragEvent::Start { item: ids[0], source: ContainerId::Tray },
                DragEvent::Start { item: ids[1], source: ContainerId::Tray },
            ],
        );

        assert_eq!(outcomes[1], DragOutcome::Ignored);
        assert_eq!(state.dragged_item(), Some(ids[0]));
    }

    #[test]
    fn test_hover_marks_preview_except_on_source() {
        let (mut board, ids) = board_with(1);
        let start = DragEvent::Start { item: ids[0], source: ContainerId::Tray };

        let (state, _) = run(&mut board, &[start, DragEvent::Enter(ContainerId::Tier(2))]);
        assert_eq!(state.preview_target(), Some(ContainerId::Tier(2)));

        let (state, outcomes) = run(&mut board, &[start, DragEvent::Enter(ContainerId::Tray)]);
        assert_eq!(state.preview_target(), None);
        assert_eq!(outcomes[1], DragOutcome::Ignored);

        let (state, outcomes) = run(
            &mut board,
            &[
                start,
                DragEvent::Enter(ContainerId::Tier(2)),
                DragEvent::Leave(ContainerId::Tier(2)),
            ],
        );
        assert_eq!(state.preview_target(), None);
        assert_eq!(outcomes[2], DragOutcome::PreviewChanged);
        // Hovering never mutates the board
        assert_eq!(board.tray().items, ids);
    }

    #[test]
    fn test_stale_leave_keeps_current_hover() {
        let (mut board, ids) = board_with(1);
        let (state, _) = run(
            &mut board,
            &[
                DragEvent::Start { item: ids[0], source: ContainerId::Tray },
                DragEvent::Enter(ContainerId::Tier(0)),
                DragEvent::Enter(ContainerId::Tier(1)),
                DragEvent::Leave(ContainerId::Tier(0)),
            ],
        );
        assert_eq!(state.preview_target(), Some(ContainerId::Tier(1)));
    }

    #[test]
    fn test_drop_moves_item_atomically() {
        let (mut board, ids) = board_with(3);
        let tray_before = board.tray().len();

        let (state, outcomes) = run(
            &mut board,
            &[
                DragEvent::Start { item: ids[1], source: ContainerId::Tray },
                DragEvent::Enter(ContainerId::Tier(0)),
                DragEvent::Drop(ContainerId::Tier(0)),
            ],
        );

        assert_eq!(state, DragState::Idle);
        assert_eq!(
            outcomes[2],
            DragOutcome::Moved {
                item: ids[1],
                from: ContainerId::Tray,
                to: ContainerId::Tier(0)
            }
        );
        assert_eq!(board.tray().len(), tray_before - 1);
        assert_eq!(board.container(ContainerId::Tier(0)).items, vec![ids[1]]);
        assert_eq!(board.item(ids[1]).unwrap().id, ids[1]);
        assert!(board.has_exclusive_ownership());
    }

    #[test]
    fn test_drop_appends_at_end() {
        let (mut board, ids) = board_with(3);
        for id in &ids[..2] {
            board.place_item(*id, ContainerId::Tier(1)).unwrap();
        }

        run(
            &mut board,
            &[
                DragEvent::Start { item: ids[2], source: ContainerId::Tray },
                DragEvent::Drop(ContainerId::Tier(1)),
            ],
        );

        assert_eq!(board.container(ContainerId::Tier(1)).items, ids);
    }

    #[test]
    fn test_drop_on_source_is_noop() {
        let (mut board, ids) = board_with(3);
        let before: Vec<Vec<ItemId>> = board.containers().map(|c| c.items.clone()).collect();

        let (state, outcomes) = run(
            &mut board,
            &[
                DragEvent::Start { item: ids[0], source: ContainerId::Tray },
                DragEvent::Enter(ContainerId::Tray),
                DragEvent::Drop(ContainerId::Tray),
            ],
        );

        let after: Vec<Vec<ItemId>> = board.containers().map(|c| c.items.clone()).collect();
        assert_eq!(outcomes[2], DragOutcome::Unchanged);
        assert_eq!(before, after);
        assert!(!state.is_dragging());
    }

    #[test]
    fn test_end_without_drop_cancels() {
        let (mut board, ids) = board_with(2);
        let (state, outcomes) = run(
            &mut board,
            &[
                DragEvent::Start { item: ids[0], source: ContainerId::Tray },
                DragEvent::Enter(ContainerId::Tier(4)),
                DragEvent::End,
            ],
        );

        assert_eq!(outcomes[2], DragOutcome::Cancelled);
        assert_eq!(state, DragState::Idle);
        assert_eq!(board.tray().items, ids);
    }

    #[test]
    fn test_events_while_idle_are_ignored() {
        let (mut board, _) = board_with(1);
        let (_, outcomes) = run(
            &mut board,
            &[
                DragEvent::Enter(ContainerId::Tier(0)),
                DragEvent::Drop(ContainerId::Tier(0)),
                DragEvent::End,
            ],
        );
        assert!(outcomes.iter().all(|o| *o == DragOutcome::Ignored));
        assert_eq!(board.tray().len(), 1);
    }

    #[test]
    fn test_drop_after_reset_is_rejected() {
        let (mut board, ids) = board_with(1);
        board.place_item(ids[0], ContainerId::Tier(0)).unwrap();

        let (state, _) = DragState::Idle.apply(
            DragEvent::Start { item: ids[0], source: ContainerId::Tier(0) },
            &mut board,
        );
        board.reset();
        let (_, outcome) = state.apply(DragEvent::Drop(ContainerId::Tier(3)), &mut board);

        assert!(matches!(outcome, DragOutcome::Rejected(BoardError::NotInContainer { .. })));
        assert_eq!(board.owner_of(ids[0]), Some(ContainerId::Tray));
        assert!(board.has_exclusive_ownership());
    }
}
