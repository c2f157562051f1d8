use std::{fmt::Display, str::FromStr};

use itertools::Itertools;

use crate::snapshot::Snapshot;

/// Framing of requests and replies.
pub mod codec;

/// The questions a client may ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryCommand {
    /// `get_hw`
    HardwareVersion,

    /// `get_sw`
    SoftwareVersion,

    /// `get_self_temp`
    SelfTemperature,

    /// `get_relay`
    Relay,

    /// `get_optical_relay`
    OpticalRelay,

    /// `get_dry_contact`
    DryContact,
}

impl QueryCommand {
    /// Every command, in the order the help listing shows them.
    pub const ALL: [QueryCommand; 6] = [
        QueryCommand::HardwareVersion,
        QueryCommand::SoftwareVersion,
        QueryCommand::SelfTemperature,
        QueryCommand::Relay,
        QueryCommand::OpticalRelay,
        QueryCommand::DryContact,
    ];

    /// What a client sends.
    pub fn token(&self) -> &'static str {
        match self {
            QueryCommand::HardwareVersion => "get_hw",
            QueryCommand::SoftwareVersion => "get_sw",
            QueryCommand::SelfTemperature => "get_self_temp",
            QueryCommand::Relay => "get_relay",
            QueryCommand::OpticalRelay => "get_optical_relay",
            QueryCommand::DryContact => "get_dry_contact",
        }
    }

    /// The reply to this command given the snapshot.
    ///
    /// Before anything was decoded, numbers read `0` and sequences read `()`.
    pub fn answer(&self, snapshot: &Snapshot) -> String {
        let status = snapshot.status();

        match self {
            QueryCommand::HardwareVersion => number(status.map(|s| s.hardware_version)),
            QueryCommand::SoftwareVersion => number(status.map(|s| s.software_version)),
            QueryCommand::SelfTemperature => number(status.map(|s| s.self_temperature)),
            QueryCommand::Relay => number(status.map(|s| s.relay_state)),
            QueryCommand::OpticalRelay => {
                tuple(status.into_iter().flat_map(|s| s.optical_relay_state.bits()))
            }
            QueryCommand::DryContact => {
                tuple(
                    status
                        .into_iter()
                        .flat_map(|s| s.dry_contact_state.iter().copied().map(char::from)),
                )
            }
        }
    }
}

impl Display for QueryCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// The request was not one of the [`QueryCommand`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand;

impl FromStr for QueryCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|command| command.token() == s)
            .ok_or(UnknownCommand)
    }
}

fn number(value: Option<u8>) -> String {
    value.unwrap_or_default().to_string()
}

fn quote<D: Display>(item: D) -> String {
    match item.to_string().as_str() {
        "'" => r#""'""#.to_string(),
        "\\" => r"'\\'".to_string(),
        s => format!("'{s}'"),
    }
}

fn tuple<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    format!("({})", items.into_iter().map(quote).join(", "))
}

/// The listing sent for anything not understood.
pub fn help() -> String {
    tuple(QueryCommand::ALL.iter().map(QueryCommand::token))
}

/// Resolve one request line against a snapshot.
pub fn reply(request: &str, snapshot: &Snapshot) -> String {
    match request.parse::<QueryCommand>() {
        Ok(command) => command.answer(snapshot),
        Err(UnknownCommand) => help(),
    }
}
