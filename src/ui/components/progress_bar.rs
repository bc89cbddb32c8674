use iced::widget::{column, progress_bar as iced_progress_bar, text};
use iced::{Alignment, Element, Length};

/// Share of the hard cap raised, with the formatted total beneath it.
pub struct RaisedProgressState {
    pub progress: f32,
    pub label: String,
}

pub fn raised_progress<'a, Message>(state: RaisedProgressState) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    column![
        iced_progress_bar(0.0..=1.0, state.progress.clamp(0.0, 1.0)),
        text(state.label).size(14),
    ]
    .width(Length::Fill)
    .align_items(Alignment::End)
    .spacing(8)
    .into()
}
