use std::sync::Arc;

use iced::time;
use iced::widget::{button, column, container, row, text, Column};
use iced::{Alignment, Application, Command, Element, Length, Subscription, Theme};

use crate::config::PresaleConfig;
use crate::connector::{ConnectionState, ConnectorKind, RpcWalletConnector, WalletConnector};
use crate::contract::RpcPresaleContract;
use crate::notify::{Toast, ToastQueue};
use crate::presale::{
    DepositOutcome, PresaleController, PresaleSnapshot, PresaleView, SessionSettings,
};
use crate::runtime;

use super::components::{modal, raised_progress, toast, RaisedProgressState};
use super::PresaleGuiFlags;

type GuiController = PresaleController<RpcPresaleContract, ToastQueue>;

/// Single-page presale application.
pub struct PresaleApp {
    model: Model,
}

#[derive(Debug, Clone)]
pub enum Message {
    ConnectPressed,
    CloseWalletModal,
    ConnectWith(ConnectorKind),
    Connected {
        epoch: u64,
        state: ConnectionState,
        controller: Option<GuiController>,
    },
    Disconnect,
    CountdownTick,
    RaisedTick,
    RaisedRefreshed,
    Contribute,
    DepositFinished(DepositOutcome),
    DismissToast(usize),
    ToastTimeout,
}

impl Application for PresaleApp {
    type Executor = iced::executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = PresaleGuiFlags;

    fn new(flags: Self::Flags) -> (Self, Command<Self::Message>) {
        (
            Self {
                model: Model::new(flags),
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        format!("{} Presale", self.model.settings.rules.token_symbol)
    }

    fn update(&mut self, message: Self::Message) -> Command<Self::Message> {
        let mut update = Update::default();
        let model = &mut self.model;

        match message {
            Message::ConnectPressed => model.wallet_modal_open = true,
            Message::CloseWalletModal => model.wallet_modal_open = false,
            Message::ConnectWith(kind) => {
                model.wallet_modal_open = false;
                model.discard_session();
                update.push(model.connect(kind));
            }
            Message::Connected {
                epoch,
                state,
                controller,
            } => {
                if epoch == model.epoch {
                    model.connecting = false;
                    model.connection = state;
                    model.controller = controller;
                    if model.controller.is_some() {
                        update.push(model.refresh_total_raised());
                    }
                }
            }
            Message::Disconnect => {
                model.discard_session();
                model.connection = model.connector.disconnect();
            }
            Message::CountdownTick => model.now_ms = runtime::now_ms(),
            Message::RaisedTick => update.push(model.refresh_total_raised()),
            Message::RaisedRefreshed => model.raised_inflight = false,
            Message::Contribute => {
                if let Some(controller) = model.controller.clone() {
                    let now = runtime::now_ms();
                    update.push(Command::perform(
                        async move { controller.submit_deposit(now).await },
                        Message::DepositFinished,
                    ));
                }
            }
            Message::DepositFinished(outcome) => {
                tracing::debug!(?outcome, "deposit flow finished");
            }
            Message::DismissToast(index) => {
                model.toasts.dismiss(index);
            }
            Message::ToastTimeout => {
                model.toasts.dismiss_oldest();
            }
        }

        model.toast_snapshot = model.toasts.snapshot();
        update.into_command()
    }

    fn view(&self) -> Element<Self::Message> {
        if self.model.wallet_modal_open {
            return wallet_modal();
        }
        let view = self.model.presale_view();

        let connect_button = if self.model.connection.is_active {
            button(text(view.connect_label).size(16)).on_press(Message::Disconnect)
        } else {
            button(text(view.connect_label).size(16))
                .on_press_maybe((!self.model.connecting).then_some(Message::ConnectPressed))
        }
        .padding(10)
        .style(iced::theme::Button::Primary);

        let header = row![
            text(format!("{} PRESALE", self.model.settings.rules.token_symbol))
                .size(28)
                .width(Length::Fill),
            text(&view.network_message).size(14),
            connect_button,
        ]
        .spacing(16)
        .align_items(Alignment::Center);

        let contribute = button(text(view.contribute_label.as_str()).size(18))
            .on_press_maybe(view.can_contribute.then_some(Message::Contribute))
            .padding(14)
            .width(Length::Fill)
            .style(iced::theme::Button::Primary);

        let panel = column![
            text(&view.address_message).size(16),
            text(&view.time_left).size(32),
            text(&view.limit_message).size(18),
            row![
                text(&view.native_balance).size(16).width(Length::Fill),
                text(&view.token_balance).size(16),
            ],
            raised_progress(RaisedProgressState {
                progress: view.raised_progress,
                label: view.total_raised.clone(),
            }),
            contribute,
        ]
        .spacing(18)
        .max_width(560);

        let toasts = self
            .model
            .toast_snapshot
            .iter()
            .enumerate()
            .fold(Column::new().spacing(8), |column, (index, entry)| {
                column.push(toast(entry, Message::DismissToast(index)))
            });

        let layout = column![
            header,
            container(panel).width(Length::Fill).center_x(),
            toasts
        ]
        .spacing(24)
        .padding(20);

        container(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Self::Message> {
        let polling = &self.model.config.polling;
        let mut subscriptions =
            vec![time::every(polling.countdown_interval()).map(|_| Message::CountdownTick)];

        if self.model.controller.is_some() {
            subscriptions
                .push(time::every(polling.total_raised_interval()).map(|_| Message::RaisedTick));
        }
        if !self.model.toasts.is_empty() {
            subscriptions.push(time::every(TOAST_LIFETIME).map(|_| Message::ToastTimeout));
        }

        Subscription::batch(subscriptions)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

const TOAST_LIFETIME: std::time::Duration = std::time::Duration::from_secs(5);

fn wallet_modal<'a>() -> Element<'a, Message> {
    let options = ConnectorKind::ALL.iter().fold(
        column![text("Select a wallet").size(22)].spacing(12),
        |column, kind| {
            column.push(
                button(text(kind.title()).size(16))
                    .on_press(Message::ConnectWith(*kind))
                    .padding(10)
                    .width(Length::Fill),
            )
        },
    );
    modal(options.push(
        button(text("Cancel").size(14))
            .on_press(Message::CloseWalletModal)
            .padding(8),
    ))
}

/// Collects commands produced during a UI update cycle.
#[derive(Default)]
struct Update {
    commands: Vec<Command<Message>>,
}

impl Update {
    fn push(&mut self, command: Command<Message>) {
        self.commands.push(command);
    }

    fn into_command(self) -> Command<Message> {
        Command::batch(self.commands)
    }
}

struct Model {
    config: PresaleConfig,
    settings: SessionSettings,
    connector: Arc<RpcWalletConnector>,
    connection: ConnectionState,
    controller: Option<GuiController>,
    /// Bumped on every connect and disconnect; stale connection results
    /// carrying an older epoch are ignored.
    epoch: u64,
    connecting: bool,
    wallet_modal_open: bool,
    raised_inflight: bool,
    now_ms: u64,
    toasts: ToastQueue,
    toast_snapshot: Vec<Toast>,
}

impl Model {
    fn new(flags: PresaleGuiFlags) -> Self {
        let connector = RpcWalletConnector::new(
            flags.config.network.clone(),
            flags.config.wallet.clone(),
        );
        Self {
            config: flags.config,
            settings: flags.settings,
            connector: Arc::new(connector),
            connection: ConnectionState::disconnected(),
            controller: None,
            epoch: 0,
            connecting: false,
            wallet_modal_open: false,
            raised_inflight: false,
            now_ms: runtime::now_ms(),
            toasts: ToastQueue::default(),
            toast_snapshot: Vec::new(),
        }
    }

    fn connect(&mut self, kind: ConnectorKind) -> Command<Message> {
        self.connecting = true;
        let epoch = self.epoch;
        let connector = Arc::clone(&self.connector);
        let polling = self.config.polling.clone();
        let settings = self.settings.clone();
        let toasts = self.toasts.clone();
        Command::perform(
            async move {
                runtime::open_session(&connector, kind, &polling, settings, toasts).await
            },
            move |(state, controller)| Message::Connected {
                epoch,
                state,
                controller,
            },
        )
    }

    fn discard_session(&mut self) {
        self.epoch += 1;
        self.connecting = false;
        self.raised_inflight = false;
        if let Some(controller) = self.controller.take() {
            controller.disconnect();
        }
    }

    fn refresh_total_raised(&mut self) -> Command<Message> {
        match self.controller.clone() {
            Some(controller) if !self.raised_inflight => {
                self.raised_inflight = true;
                Command::perform(
                    async move { controller.refresh_total_raised().await },
                    |()| Message::RaisedRefreshed,
                )
            }
            _ => Command::none(),
        }
    }

    fn presale_view(&self) -> PresaleView {
        match &self.controller {
            Some(controller) => controller.view(self.now_ms),
            None => PresaleView::derive(
                &PresaleSnapshot::for_connection(self.connection.clone()),
                &self.settings.rules,
                self.now_ms,
            ),
        }
    }
}
