use iced::widget::{button, container, row, text};
use iced::{Alignment, Element, Length};

use crate::notify::{NotificationKind, Toast};

fn heading(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Success => "Success",
        NotificationKind::Warning => "Warning",
        NotificationKind::Error => "Error",
    }
}

/// Renders one queued toast with a dismiss button.
pub fn toast<'a, Message>(toast: &'a Toast, dismiss: Message) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let body = row![
        text(heading(toast.kind)).size(14),
        text(&toast.message).size(16).width(Length::Fill),
        button(text("x").size(14)).on_press(dismiss).padding(4),
    ]
    .spacing(12)
    .align_items(Alignment::Center);

    container(body)
        .style(iced::theme::Container::Box)
        .padding(12)
        .width(Length::Fixed(320.0))
        .into()
}
