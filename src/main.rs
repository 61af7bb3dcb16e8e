use iced::widget::image::Handle;
use iced::{event, mouse, window, Element, Event, Subscription, Task, Theme};
use rfd::FileDialog;
use std::collections::HashMap;
use std::path::PathBuf;

mod config;
mod export;
mod ingest;
mod logging;
mod state;
mod ui;

use config::BoardConfig;
use export::ExportError;
use ingest::{DecodedImage, FileDropZone, IngestError, IngestOrigin, IngestOutcome, RawBlob};
use state::{Board, ContainerId, DragEvent, DragOutcome, DragState, ItemId};

/// Main application state
struct TierBoard {
    config: BoardConfig,
    /// Items and the fixed container set
    board: Board,
    /// The in-flight pointer drag, if any
    drag: DragState,
    /// File-drop candidate marking for OS drags
    file_drop: FileDropZone,
    /// Decoded image handles for rendering, keyed by item
    thumbnails: HashMap<ItemId, Handle>,
    /// Blobs still being decoded
    pending_decodes: usize,
    exporting: bool,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked "Add images"
    PickFiles,
    /// A background decode finished
    Decoded(IngestOrigin, Result<DecodedImage, IngestError>),
    /// Pointer pressed on an item
    DragStart(ItemId, ContainerId),
    HoverEnter(ContainerId),
    HoverLeave(ContainerId),
    /// Pointer released over a container
    DropOn(ContainerId),
    /// Pointer released anywhere else
    DragEnded,
    /// OS drag carrying files entered the window
    FilesHovered,
    FileDropped(PathBuf),
    FilesHoverLeft,
    Reset,
    Export,
    ExportComplete(Result<PathBuf, ExportError>),
}

impl TierBoard {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = BoardConfig::load_or_default();
        let board = Board::new(&config.tiers);

        tracing::info!("Tier Board initialized with {} tiers", board.tiers().len());

        (
            TierBoard {
                config,
                board,
                drag: DragState::Idle,
                file_drop: FileDropZone::new(ContainerId::Tray),
                thumbnails: HashMap::new(),
                pending_decodes: 0,
                exporting: false,
                status: "Add images or drop them onto the window.".to_string(),
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFiles => {
                let extensions: Vec<&str> =
                    self.config.image_extensions.iter().map(String::as_str).collect();

                // Show the native file picker dialog
                let files = FileDialog::new()
                    .set_title("Select Images")
                    .add_filter("Images", &extensions)
                    .pick_files();

                match files {
                    Some(paths) => {
                        let blobs = paths.into_iter().map(RawBlob::File).collect();
                        self.ingest(blobs, IngestOrigin::LocalSelection)
                    }
                    None => Task::none(),
                }
            }
            Message::Decoded(origin, result) => {
                self.pending_decodes = self.pending_decodes.saturating_sub(1);

                match result {
                    Ok(decoded) => {
                        if let IngestOutcome::Added(id) = ingest::accept(&mut self.board, origin, decoded) {
                            self.cache_thumbnail(id);
                        }
                        self.status = format!("{} images on the board.", self.board.total_items());
                    }
                    Err(e) => {
                        tracing::warn!("Skipping image: {}", e);
                        self.status = format!("Skipped: {}", e);
                    }
                }
                Task::none()
            }
            Message::DragStart(item, source) => self.drag_event(DragEvent::Start { item, source }),
            Message::HoverEnter(target) => self.drag_event(DragEvent::Enter(target)),
            Message::HoverLeave(target) => self.drag_event(DragEvent::Leave(target)),
            Message::DropOn(target) => self.drag_event(DragEvent::Drop(target)),
            Message::DragEnded => self.drag_event(DragEvent::End),
            Message::FilesHovered => {
                self.file_drop.hover();
                Task::none()
            }
            Message::FilesHoverLeft => {
                self.file_drop.leave();
                Task::none()
            }
            Message::FileDropped(path) => {
                self.file_drop.dropped();

                if !self.config.accepts(&path) {
                    tracing::debug!("Ignoring dropped non-image {}", path.display());
                    self.status = format!("Not an image: {}", path.display());
                    return Task::none();
                }
                self.ingest(vec![RawBlob::File(path)], IngestOrigin::ExternalDrop)
            }
            Message::Reset => {
                // Any in-flight drag points at a container that may no longer hold its item
                self.drag = DragState::Idle;
                let returned = self.board.reset();
                tracing::info!("Reset returned {} items to the tray", returned);
                self.status = format!("Returned {} items to the tray.", returned);
                Task::none()
            }
            Message::Export => {
                if self.exporting {
                    return Task::none();
                }

                // Show the native save dialog, pre-filled with the fixed name
                let target = FileDialog::new()
                    .set_title("Export Tier Board")
                    .set_directory(export::default_export_dir())
                    .set_file_name(&self.config.export_file_name)
                    .add_filter("PNG image", &["png"])
                    .save_file();

                let Some(path) = target else {
                    return Task::none();
                };

                self.exporting = true;
                self.status = format!("Exporting to {}...", path.display());
                Task::perform(
                    export::export_board_async(self.board.snapshot(), self.config.thumbnail_size, path),
                    Message::ExportComplete,
                )
            }
            Message::ExportComplete(result) => {
                self.exporting = false;
                self.status = match result {
                    Ok(path) => format!("✅ Exported {}", path.display()),
                    Err(e) => {
                        tracing::error!("Export failed: {}", e);
                        format!("Export failed: {}. The board is unchanged, try again.", e)
                    }
                };
                Task::none()
            }
        }
    }

    /// Launch one independent decode task per blob
    fn ingest(&mut self, blobs: Vec<RawBlob>, origin: IngestOrigin) -> Task<Message> {
        if blobs.is_empty() {
            return Task::none();
        }

        self.pending_decodes += blobs.len();
        self.status = format!("Decoding {} images...", self.pending_decodes);
        tracing::debug!("Queued {} blobs from {:?}", blobs.len(), origin);

        Task::batch(blobs.into_iter().map(move |blob| {
            Task::perform(ingest::decode_blob(blob), move |result| Message::Decoded(origin, result))
        }))
    }

    /// Feed one pointer event to the drag machine
    fn drag_event(&mut self, event: DragEvent) -> Task<Message> {
        let (next, outcome) = std::mem::take(&mut self.drag).apply(event, &mut self.board);
        self.drag = next;

        match outcome {
            DragOutcome::Moved { item, from, to } => {
                tracing::debug!("Moved item {} from {} to {}", item, from, to);
            }
            DragOutcome::Rejected(e) => {
                tracing::warn!("Drag rejected: {}", e);
            }
            DragOutcome::Cancelled => tracing::trace!("Drag cancelled"),
            _ => {}
        }
        Task::none()
    }

    fn cache_thumbnail(&mut self, id: ItemId) {
        let Some(item) = self.board.item(id) else {
            return;
        };

        match item.source.to_bytes() {
            Ok(bytes) => {
                self.thumbnails.insert(id, Handle::from_bytes(bytes));
            }
            Err(e) => tracing::warn!("No thumbnail for item {}: {}", id, e),
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        ui::BoardView {
            board: &self.board,
            drag: &self.drag,
            file_drop: &self.file_drop,
            thumbnails: &self.thumbnails,
            cell: self.config.thumbnail_size as f32,
            status: &self.status,
            busy: self.exporting,
        }
        .view()
    }

    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(runtime_message)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// OS file drags, pointer releases outside any drop target and focus loss
fn runtime_message(ev: Event, status: event::Status, _window: window::Id) -> Option<Message> {
    match ev {
        Event::Window(window::Event::FileHovered(_)) => Some(Message::FilesHovered),
        Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
        Event::Window(window::Event::FilesHoveredLeft) => Some(Message::FilesHoverLeft),
        // The release of a drag that leaves the window never reaches us
        Event::Window(window::Event::Unfocused) => Some(Message::DragEnded),
        Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
            if status == event::Status::Ignored =>
        {
            Some(Message::DragEnded)
        }
        _ => None,
    }
}

fn main() -> iced::Result {
    if let Err(e) = logging::init() {
        eprintln!("⚠️  {}", e);
    }

    iced::application("Tier Board", TierBoard::update, TierBoard::view)
        .subscription(TierBoard::subscription)
        .theme(TierBoard::theme)
        .centered()
        .run_with(TierBoard::new)
}
