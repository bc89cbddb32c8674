//! Pure derivations from a [`PresaleSnapshot`] to display values.
//!
//! Label and message selection is expressed as ordered guard lists: the
//! first guard whose predicate holds decides the result, so precedence is
//! the order of the table.

use std::fmt;

use ethers_core::types::U256;
use ethers_core::utils::to_checksum;

use crate::config::PresaleRules;
use crate::connector::{ConnectionErrorKind, ConnectionState};

use super::format::{format_amount, raised_progress};
use super::state::{PresaleSnapshot, TierThresholds, UserTier};

pub const COUNTDOWN_ELAPSED: &str = "0 DAYS 00:00:00";
pub const ADDRESS_PLACEHOLDER: &str = "---";
pub const WHITELIST_MARKER: &str = "YOU ARE IN WHITELIST";

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Highest tier whose threshold the balance reaches, or tier 0.
pub fn user_tier(thresholds: &TierThresholds, reference_balance: U256) -> UserTier {
    thresholds
        .levels()
        .iter()
        .rev()
        .find(|threshold| reference_balance >= threshold.required_token_amount)
        .map(|threshold| UserTier::new(threshold.tier_level))
        .unwrap_or(UserTier::NONE)
}

/// Deposit cap message for `tier`. Tier 0 shows the tier-1 cap.
pub fn limit_message(tier: UserTier, rules: &PresaleRules) -> String {
    let index = usize::from(tier.level().max(1)) - 1;
    let amount = rules.tier_amounts[index];
    let tokens = amount.saturating_mul(U256::from(rules.token_rate)) / U256::exp10(18);
    format!(
        "{} {} = {} {}",
        rules.tier_amount_labels[index], rules.native_symbol, tokens, rules.token_symbol
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContributeLabel {
    ConnectWallet,
    NotWhitelisted,
    NotStarted,
    Finished,
    AlreadyContributed,
    InsufficientBalance,
    Pending,
    Contribute,
}

impl ContributeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ContributeLabel::ConnectWallet => "CONNECT WALLET",
            ContributeLabel::NotWhitelisted => "YOU ARE NOT IN WHITELIST",
            ContributeLabel::NotStarted => "PRESALE IS NOT STARTED",
            ContributeLabel::Finished => "PRESALE IS FINISHED",
            ContributeLabel::AlreadyContributed => "YOU CONTRIBUTED ALREADY",
            ContributeLabel::InsufficientBalance => "INSUFFICIENT BALANCE",
            ContributeLabel::Pending => "PENDING",
            ContributeLabel::Contribute => "CONTRIBUTE",
        }
    }
}

impl fmt::Display for ContributeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Gate<'a> {
    snapshot: &'a PresaleSnapshot,
    rules: &'a PresaleRules,
    now_ms: u64,
}

type Guard<T> = (fn(&Gate<'_>) -> bool, T);

const CONTRIBUTE_GUARDS: [Guard<ContributeLabel>; 7] = [
    (inactive, ContributeLabel::ConnectWallet),
    (not_whitelisted, ContributeLabel::NotWhitelisted),
    (not_started, ContributeLabel::NotStarted),
    (finished, ContributeLabel::Finished),
    (already_deposited, ContributeLabel::AlreadyContributed),
    (below_tier_requirement, ContributeLabel::InsufficientBalance),
    (pending, ContributeLabel::Pending),
];

fn inactive(gate: &Gate<'_>) -> bool {
    !gate.snapshot.is_active()
}

fn not_whitelisted(gate: &Gate<'_>) -> bool {
    !gate.snapshot.tier.is_whitelisted()
}

fn not_started(gate: &Gate<'_>) -> bool {
    gate.snapshot.window.is_before_start(gate.now_ms)
}

fn finished(gate: &Gate<'_>) -> bool {
    gate.snapshot.window.is_after_end(gate.now_ms)
}

fn already_deposited(gate: &Gate<'_>) -> bool {
    gate.snapshot.deposit.has_deposited
}

fn below_tier_requirement(gate: &Gate<'_>) -> bool {
    let required = gate
        .rules
        .base_amount
        .saturating_mul(U256::from(gate.snapshot.tier.level()))
        .saturating_add(gate.rules.fee_buffer);
    gate.snapshot
        .balances
        .native
        .is_some_and(|balance| balance < required)
}

fn pending(gate: &Gate<'_>) -> bool {
    gate.snapshot.pending
}

/// Call-to-action label; first matching guard wins, `CONTRIBUTE` otherwise.
pub fn contribute_label(
    snapshot: &PresaleSnapshot,
    rules: &PresaleRules,
    now_ms: u64,
) -> ContributeLabel {
    let gate = Gate {
        snapshot,
        rules,
        now_ms,
    };
    CONTRIBUTE_GUARDS
        .iter()
        .find(|(applies, _)| applies(&gate))
        .map(|(_, label)| *label)
        .unwrap_or(ContributeLabel::Contribute)
}

/// Whether the deposit action is enabled.
///
/// The balance floor is the flat `min_contribution_balance`, independent of
/// the tier; the label uses the tier-scaled requirement instead.
pub fn can_contribute(snapshot: &PresaleSnapshot, rules: &PresaleRules, now_ms: u64) -> bool {
    snapshot.is_active()
        && !snapshot.deposit.has_deposited
        && snapshot.window.contains(now_ms)
        && snapshot
            .balances
            .native
            .map_or(true, |balance| balance >= rules.min_contribution_balance)
        && !snapshot.pending
}

/// Remaining presale time. Before the start the full window length is
/// reported; once started it counts down to the end.
pub fn time_left(snapshot: &PresaleSnapshot, now_ms: u64) -> String {
    if !snapshot.is_active() {
        return COUNTDOWN_ELAPSED.to_owned();
    }
    let window = snapshot.window;
    let effective_now = if window.is_before_start(now_ms) {
        window.start_ms()
    } else {
        now_ms
    };
    match window.end_ms().saturating_sub(effective_now) {
        0 => COUNTDOWN_ELAPSED.to_owned(),
        remaining => format_countdown(remaining),
    }
}

fn format_countdown(remaining_ms: u64) -> String {
    let days = remaining_ms / MS_PER_DAY;
    let hours = (remaining_ms / MS_PER_HOUR) % 24;
    let minutes = (remaining_ms / MS_PER_MINUTE) % 60;
    let seconds = (remaining_ms / MS_PER_SECOND) % 60;
    format!("{days} DAYS {hours:02} : {minutes:02} : {seconds:02}")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkStatus {
    Connected,
    WrongNetwork,
    NoProvider,
    Disconnected,
}

const NETWORK_GUARDS: [(fn(&ConnectionState) -> bool, NetworkStatus); 3] = [
    (|state| state.is_active, NetworkStatus::Connected),
    (
        |state| state.error == ConnectionErrorKind::UnsupportedNetwork,
        NetworkStatus::WrongNetwork,
    ),
    (
        |state| state.error == ConnectionErrorKind::NoProvider,
        NetworkStatus::NoProvider,
    ),
];

pub fn network_status(connection: &ConnectionState) -> NetworkStatus {
    NETWORK_GUARDS
        .iter()
        .find(|(applies, _)| applies(connection))
        .map(|(_, status)| *status)
        .unwrap_or(NetworkStatus::Disconnected)
}

pub fn network_message(connection: &ConnectionState, rules: &PresaleRules) -> String {
    match network_status(connection) {
        NetworkStatus::Connected => format!("CONNECTED TO {}", rules.chain_name),
        NetworkStatus::WrongNetwork => "CONNECTED WRONG NETWORK".to_owned(),
        NetworkStatus::NoProvider => "NO ETHEREUM PROVIDER".to_owned(),
        NetworkStatus::Disconnected => "DISCONNCTED".to_owned(),
    }
}

/// Truncated account label, marked when the account is whitelisted.
pub fn address_message(snapshot: &PresaleSnapshot) -> String {
    let Some(address) = snapshot.connection.address else {
        return ADDRESS_PLACEHOLDER.to_owned();
    };
    let address = to_checksum(&address, None);
    let head = &address[..4];
    let tail = &address[address.len() - 4..];
    if snapshot.tier.is_whitelisted() {
        format!("{WHITELIST_MARKER} {head}...{tail}")
    } else {
        format!("{head}...{tail}")
    }
}

pub fn connect_button_label(connection: &ConnectionState) -> &'static str {
    if connection.is_active {
        "DISCONNECT"
    } else {
        "CONNECT"
    }
}

/// Every display value of the presale page at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct PresaleView {
    pub address_message: String,
    pub network_message: String,
    pub limit_message: String,
    pub time_left: String,
    pub contribute_label: ContributeLabel,
    pub can_contribute: bool,
    pub native_balance: String,
    pub token_balance: String,
    pub total_raised: String,
    pub raised_progress: f32,
    pub connect_label: &'static str,
}

impl PresaleView {
    pub fn derive(snapshot: &PresaleSnapshot, rules: &PresaleRules, now_ms: u64) -> Self {
        Self {
            address_message: address_message(snapshot),
            network_message: network_message(&snapshot.connection, rules),
            limit_message: limit_message(snapshot.tier, rules),
            time_left: time_left(snapshot, now_ms),
            contribute_label: contribute_label(snapshot, rules, now_ms),
            can_contribute: can_contribute(snapshot, rules, now_ms),
            native_balance: format_amount(snapshot.balances.native, 4, &rules.native_symbol),
            token_balance: format_amount(snapshot.balances.presale_token, 4, &rules.token_symbol),
            total_raised: format!(
                "{} RAISED",
                format_amount(snapshot.total_raised, 2, &rules.native_symbol)
            ),
            raised_progress: raised_progress(snapshot.total_raised, rules.hard_cap),
            connect_label: connect_button_label(&snapshot.connection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presale::state::{Balances, DepositStatus, PresaleWindow};
    use ethers_core::types::Address;
    use ethers_core::utils::parse_ether;

    const NOW_MS: u64 = 1_700_000_000_000;
    const NOW_SECS: u64 = NOW_MS / 1_000;

    fn eth(value: &str) -> U256 {
        parse_ether(value).unwrap()
    }

    fn active_snapshot(tier: u8) -> PresaleSnapshot {
        PresaleSnapshot {
            connection: ConnectionState::active(Address::repeat_byte(0xab), 1),
            window: PresaleWindow::new(NOW_SECS - 10, NOW_SECS + 3_661),
            tier: UserTier::new(tier),
            deposit: DepositStatus::default(),
            balances: Balances {
                native: Some(eth("5")),
                presale_token: None,
            },
            total_raised: None,
            pending: false,
        }
    }

    #[test]
    fn tier_is_highest_reached_threshold() {
        let thresholds = TierThresholds::new(eth("100"), eth("200"), eth("300"));
        assert_eq!(user_tier(&thresholds, eth("99")), UserTier::NONE);
        assert_eq!(user_tier(&thresholds, eth("100")).level(), 1);
        assert_eq!(user_tier(&thresholds, eth("250")).level(), 2);
        assert_eq!(user_tier(&thresholds, eth("300")).level(), 3);
        assert_eq!(user_tier(&thresholds, eth("10000")).level(), 3);

        let flat = TierThresholds::new(eth("1"), eth("1"), eth("1"));
        assert_eq!(user_tier(&flat, eth("1")).level(), 3);
    }

    #[test]
    fn limit_message_is_pure_and_defaults_to_tier_one() {
        let rules = PresaleRules::default();
        assert_eq!(limit_message(UserTier::new(3), &rules), "0.6 ETH = 600000 TMX");
        assert_eq!(limit_message(UserTier::new(2), &rules), "0.4 ETH = 400000 TMX");
        assert_eq!(limit_message(UserTier::new(1), &rules), "0.2 ETH = 200000 TMX");
        assert_eq!(limit_message(UserTier::NONE, &rules), "0.2 ETH = 200000 TMX");
        assert_eq!(
            limit_message(UserTier::new(2), &rules),
            limit_message(UserTier::new(2), &rules)
        );
    }

    #[test]
    fn label_precedence_follows_guard_order() {
        let rules = PresaleRules::default();

        let mut snapshot = active_snapshot(0);
        snapshot.connection = ConnectionState::disconnected();
        snapshot.deposit.has_deposited = true;
        snapshot.pending = true;
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::ConnectWallet
        );

        let mut snapshot = active_snapshot(0);
        snapshot.window = PresaleWindow::new(NOW_SECS + 100, NOW_SECS + 200);
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::NotWhitelisted
        );

        snapshot.tier = UserTier::new(1);
        snapshot.deposit.has_deposited = true;
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::NotStarted
        );

        snapshot.window = PresaleWindow::new(NOW_SECS - 200, NOW_SECS - 100);
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::Finished
        );

        let mut snapshot = active_snapshot(2);
        snapshot.deposit.has_deposited = true;
        snapshot.balances.native = Some(U256::zero());
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::AlreadyContributed
        );

        snapshot.deposit.has_deposited = false;
        snapshot.pending = true;
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::InsufficientBalance
        );

        snapshot.balances.native = None;
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::Pending
        );

        snapshot.pending = false;
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::Contribute
        );
        assert_eq!(ContributeLabel::Contribute.to_string(), "CONTRIBUTE");
    }

    #[test]
    fn insufficient_balance_scales_with_tier() {
        let rules = PresaleRules::default();
        let mut snapshot = active_snapshot(3);
        // 0.2 * 3 + 0.02
        snapshot.balances.native = Some(eth("0.619"));
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::InsufficientBalance
        );
        snapshot.balances.native = Some(eth("0.62"));
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::Contribute
        );
    }

    #[test]
    fn gate_uses_flat_floor_regardless_of_tier() {
        // The enable check keeps the flat 0.32 floor even though tier 3 needs
        // 0.62 for the label to read CONTRIBUTE.
        let rules = PresaleRules::default();
        let mut snapshot = active_snapshot(3);
        snapshot.balances.native = Some(eth("0.32"));
        assert!(can_contribute(&snapshot, &rules, NOW_MS));
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::InsufficientBalance
        );

        let mut snapshot = active_snapshot(1);
        snapshot.balances.native = Some(eth("0.3"));
        assert!(!can_contribute(&snapshot, &rules, NOW_MS));
        assert_eq!(
            contribute_label(&snapshot, &rules, NOW_MS),
            ContributeLabel::Contribute
        );
    }

    #[test]
    fn gate_requires_every_condition() {
        let rules = PresaleRules::default();
        let base = active_snapshot(1);
        assert!(can_contribute(&base, &rules, NOW_MS));

        let mut unknown_balance = base.clone();
        unknown_balance.balances.native = None;
        assert!(can_contribute(&unknown_balance, &rules, NOW_MS));

        let mut inactive = base.clone();
        inactive.connection = ConnectionState::disconnected();
        assert!(!can_contribute(&inactive, &rules, NOW_MS));

        let mut deposited = base.clone();
        deposited.deposit.has_deposited = true;
        assert!(!can_contribute(&deposited, &rules, NOW_MS));

        let mut pending = base.clone();
        pending.pending = true;
        assert!(!can_contribute(&pending, &rules, NOW_MS));

        assert!(!can_contribute(&base, &rules, base.window.start_ms() - 1));
        assert!(can_contribute(&base, &rules, base.window.end_ms()));
        assert!(!can_contribute(&base, &rules, base.window.end_ms() + 1));
    }

    #[test]
    fn countdown_formats_remaining_time() {
        let snapshot = active_snapshot(2);
        assert_eq!(time_left(&snapshot, NOW_MS), "0 DAYS 01 : 01 : 01");

        let mut long = snapshot.clone();
        long.window = PresaleWindow::new(NOW_SECS - 10, NOW_SECS + 2 * 86_400 + 5);
        assert_eq!(time_left(&long, NOW_MS), "2 DAYS 00 : 00 : 05");
    }

    #[test]
    fn countdown_reports_full_window_before_start() {
        let mut snapshot = active_snapshot(1);
        snapshot.window = PresaleWindow::new(NOW_SECS + 600, NOW_SECS + 600 + 90);
        assert_eq!(time_left(&snapshot, NOW_MS), "0 DAYS 00 : 01 : 30");
        assert_eq!(time_left(&snapshot, NOW_MS + 300_000), "0 DAYS 00 : 01 : 30");
    }

    fn countdown_seconds(label: &str) -> u64 {
        let (days, clock) = label.split_once(" DAYS ").expect("days part");
        let parts: Vec<u64> = clock
            .split(" : ")
            .map(|part| part.parse().expect("clock part"))
            .collect();
        assert_eq!(parts.len(), 3, "unexpected countdown {label}");
        let days: u64 = days.parse().expect("days");
        days * 86_400 + parts[0] * 3_600 + parts[1] * 60 + parts[2]
    }

    #[test]
    fn countdown_is_non_increasing_and_ends_at_zero() {
        let mut snapshot = active_snapshot(1);
        snapshot.window = PresaleWindow::new(NOW_SECS + 600, NOW_SECS + 600 + 2 * 86_400 + 45);
        let start_ms = snapshot.window.start_ms();
        let end_ms = snapshot.window.end_ms();

        let boundaries = [start_ms - 1, start_ms, start_ms + 1];
        for now in (NOW_MS..end_ms).step_by(7_777_777).chain(boundaries) {
            let label = time_left(&snapshot, now);
            assert_ne!(label, COUNTDOWN_ELAPSED);
            let remaining = countdown_seconds(&label);
            if now >= start_ms {
                assert_eq!(remaining, (end_ms - now) / 1_000);
            } else {
                assert_eq!(remaining, 2 * 86_400 + 45);
            }
        }

        let mut samples: Vec<u64> = (NOW_MS..end_ms).step_by(250_000).collect();
        samples.extend(boundaries);
        samples.push(end_ms - 1);
        samples.sort_unstable();
        let mut previous = u64::MAX;
        for now in samples {
            let remaining = countdown_seconds(&time_left(&snapshot, now));
            assert!(remaining <= previous, "countdown went up at {now}");
            previous = remaining;
        }

        assert_eq!(time_left(&snapshot, end_ms), COUNTDOWN_ELAPSED);
        assert_eq!(time_left(&snapshot, end_ms + 1), COUNTDOWN_ELAPSED);
        assert_eq!(time_left(&snapshot, end_ms + 86_400_000), COUNTDOWN_ELAPSED);
    }

    #[test]
    fn disconnected_view_shows_placeholders() {
        let rules = PresaleRules::default();
        let view = PresaleView::derive(&PresaleSnapshot::default(), &rules, NOW_MS);
        assert_eq!(view.address_message, "---");
        assert_eq!(view.network_message, "DISCONNCTED");
        assert_eq!(view.time_left, "0 DAYS 00:00:00");
        assert_eq!(view.contribute_label, ContributeLabel::ConnectWallet);
        assert!(!view.can_contribute);
        assert_eq!(view.native_balance, "-- ETH");
        assert_eq!(view.token_balance, "-- TMX");
        assert_eq!(view.total_raised, "-- ETH RAISED");
        assert_eq!(view.connect_label, "CONNECT");
    }

    #[test]
    fn network_message_first_match_wins() {
        let rules = PresaleRules::default();
        let mut state = ConnectionState::active(Address::zero(), 1);
        state.error = ConnectionErrorKind::NoProvider;
        assert_eq!(network_message(&state, &rules), "CONNECTED TO ETH MAINNET");

        let wrong = ConnectionState::failed(ConnectionErrorKind::UnsupportedNetwork, Some(5));
        assert_eq!(network_message(&wrong, &rules), "CONNECTED WRONG NETWORK");

        let missing = ConnectionState::failed(ConnectionErrorKind::NoProvider, None);
        assert_eq!(network_message(&missing, &rules), "NO ETHEREUM PROVIDER");
    }

    #[test]
    fn address_message_marks_whitelisted_accounts() {
        let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse()
            .unwrap();
        let mut snapshot = PresaleSnapshot::for_connection(ConnectionState::active(address, 1));
        assert_eq!(address_message(&snapshot), "0x5a...eAed");

        snapshot.tier = UserTier::new(1);
        assert_eq!(address_message(&snapshot), "YOU ARE IN WHITELIST 0x5a...eAed");
    }

    #[test]
    fn active_view_reports_balances_and_progress() {
        let rules = PresaleRules::default();
        let mut snapshot = active_snapshot(2);
        snapshot.balances.presale_token = Some(eth("400000"));
        snapshot.total_raised = Some(eth("12.34"));
        let view = PresaleView::derive(&snapshot, &rules, NOW_MS);
        assert_eq!(view.native_balance, "5.000 ETH");
        assert_eq!(view.token_balance, "4.000e+5 TMX");
        assert_eq!(view.total_raised, "12 ETH RAISED");
        assert_eq!(view.connect_label, "DISCONNECT");
        assert_eq!(view.network_message, "CONNECTED TO ETH MAINNET");
        assert!(view.can_contribute);
        assert!((view.raised_progress - 12.34 / 60.0).abs() < 1e-6);
    }
}
