use iced::mouse::Interaction;
use iced::widget::{
    button, column, container, image, mouse_area, row, scrollable, text, Column, Space,
};
use iced::{Alignment, Background, Border, Color, ContentFit, Element, Length, Theme};
use iced_aw::Wrap;
use std::collections::HashMap;

use crate::ingest::FileDropZone;
use crate::state::{Board, Container, ContainerId, DragState, ItemId};
use crate::Message;

/// Opacity of the preview ghost shown in the hovered row
const GHOST_OPACITY: f32 = 0.4;
const HIGHLIGHT: Color = Color::from_rgb(0.35, 0.65, 1.0);
const ROW_BACKGROUND: Color = Color::from_rgb(0.12, 0.12, 0.12);

/// Everything the board view reads, borrowed from the application
pub struct BoardView<'a> {
    pub board: &'a Board,
    pub drag: &'a DragState,
    pub file_drop: &'a FileDropZone,
    pub thumbnails: &'a HashMap<ItemId, image::Handle>,
    pub cell: f32,
    pub status: &'a str,
    pub busy: bool,
}

impl<'a> BoardView<'a> {
    /// Build the whole window: tier rows, then tray and actions
    pub fn view(&self) -> Element<'a, Message> {
        let tiers: Column<'a, Message> = self
            .board
            .tiers()
            .iter()
            .fold(Column::new().spacing(2), |col, tier| col.push(self.tier_row(tier)));

        let actions = column![
            button("Add images").on_press(Message::PickFiles).padding(10),
            button("Reset").on_press(Message::Reset).padding(10),
            button("Export").on_press_maybe((!self.busy).then_some(Message::Export)).padding(10),
        ]
        .spacing(8);

        let footer = row![actions, self.drop_zone(self.board.tray())]
            .spacing(12)
            .align_y(Alignment::Start);

        let content = column![
            text("Tier Board").size(32),
            tiers,
            footer,
            text(self.status).size(14),
        ]
        .spacing(16)
        .padding(20);

        scrollable(content).into()
    }

    fn tier_row(&self, tier: &'a Container) -> Element<'a, Message> {
        let [r, g, b] = tier.color;
        let label = container(text(tier.label.as_str()).size(28).color(Color::BLACK))
            .center_x(Length::Fixed(self.cell))
            .center_y(Length::Fixed(self.cell))
            .style(move |_theme: &Theme| container::Style {
                background: Some(Background::Color(Color::from_rgb8(r, g, b))),
                ..container::Style::default()
            });

        row![label, self.drop_zone(tier)].into()
    }

    /// A container's items inside a pointer-aware drop target
    fn drop_zone(&self, target: &'a Container) -> Element<'a, Message> {
        let mut cells: Vec<Element<'a, Message>> = target
            .items
            .iter()
            .map(|item| {
                mouse_area(self.thumbnail(*item, 1.0))
                    .on_press(Message::DragStart(*item, target.id))
                    .interaction(Interaction::Grab)
                    .into()
            })
            .collect();

        let previewing = self.drag.preview_target() == Some(target.id);
        if previewing {
            if let Some(item) = self.drag.dragged_item() {
                cells.push(self.thumbnail(item, GHOST_OPACITY));
            }
        }

        let highlighted = previewing || self.file_drop.candidate() == Some(target.id);
        let min_height = if target.id == ContainerId::Tray {
            self.cell * 2.0
        } else {
            self.cell
        };

        // The spacer keeps empty rows tall enough to drop onto
        let content = row![
            Space::with_height(Length::Fixed(min_height)),
            Wrap::with_elements(cells).spacing(4.0).line_spacing(4.0),
        ];
        let zone = container(content)
            .width(Length::Fill)
            .padding(4)
            .style(move |_theme: &Theme| zone_style(highlighted));

        mouse_area(zone)
            .on_enter(Message::HoverEnter(target.id))
            .on_exit(Message::HoverLeave(target.id))
            .on_release(Message::DropOn(target.id))
            .into()
    }

    fn thumbnail(&self, item: ItemId, opacity: f32) -> Element<'a, Message> {
        match self.thumbnails.get(&item) {
            Some(handle) => image(handle.clone())
                .width(Length::Fixed(self.cell))
                .height(Length::Fixed(self.cell))
                .content_fit(ContentFit::Cover)
                .opacity(opacity)
                .into(),
            None => container(text("?").size(24))
                .center_x(Length::Fixed(self.cell))
                .center_y(Length::Fixed(self.cell))
                .into(),
        }
    }
}

fn zone_style(highlighted: bool) -> container::Style {
    let border = if highlighted {
        Border {
            color: HIGHLIGHT,
            width: 2.0,
            radius: 4.0.into(),
        }
    } else {
        Border::default()
    };

    container::Style {
        background: Some(Background::Color(ROW_BACKGROUND)),
        border,
        ..container::Style::default()
    }
}
