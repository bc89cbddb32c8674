use iced::widget::{column, container, row, Column, Space};
use iced::{Alignment, Element, Length};

const WALLET_MODAL_WIDTH: f32 = 360.0;

/// Centers `content` in a boxed, fixed-width overlay.
pub fn modal<'a, Message>(content: Column<'a, Message>) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let dialog = container(content.align_items(Alignment::Center))
        .padding(24)
        .width(Length::Fixed(WALLET_MODAL_WIDTH))
        .style(iced::theme::Container::Box);

    let layout = column![
        Space::with_height(Length::Fill),
        row![
            Space::with_width(Length::Fill),
            dialog,
            Space::with_width(Length::Fill)
        ],
        Space::with_height(Length::Fill),
    ]
    .width(Length::Fill)
    .height(Length::Fill)
    .align_items(Alignment::Center);

    container(layout)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
