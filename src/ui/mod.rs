mod app;
pub mod components;

use iced::{Application, Settings};

use crate::config::PresaleConfig;
use crate::presale::SessionSettings;

pub use app::{Message, PresaleApp};

/// Flags supplied by the binary entrypoint when launching the GUI.
#[derive(Debug, Clone)]
pub struct PresaleGuiFlags {
    pub config: PresaleConfig,
    /// Rules and contract addresses resolved from `config`.
    pub settings: SessionSettings,
}

pub fn launch(flags: PresaleGuiFlags) -> iced::Result {
    PresaleApp::run(Settings::with_flags(flags))
}
