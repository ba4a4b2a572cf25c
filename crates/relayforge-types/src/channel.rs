//! Channel configuration carried by gateway and relay builds.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::id::hex_u64;

/// Configuration for one communication channel on a relay.
///
/// The startup command is accepted on input but is never serialized back
/// out; callers only ever see the [`properties`](Channel::properties)
/// projection of it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", into = "ChannelView")]
pub struct Channel {
    #[serde(rename = "iid", with = "hex_u64", default)]
    pub interface_id: u64,
    #[serde(rename = "type")]
    pub hash: u64,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub is_return_channel: bool,
    #[serde(default)]
    pub is_negotiation_channel: bool,
    #[serde(default)]
    pub jitter: Value,
    #[serde(default)]
    startup_command: Value,
}

/// Read-only view of a channel's startup configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelProperties {
    pub arguments: Value,
    pub jitter: Value,
}

impl Channel {
    pub fn new(hash: u64, interface_id: u64) -> Self {
        Self {
            interface_id,
            hash,
            error: None,
            is_return_channel: false,
            is_negotiation_channel: false,
            jitter: Value::Null,
            startup_command: Value::Null,
        }
    }

    pub fn with_startup_command(mut self, command: Value) -> Self {
        self.startup_command = command;
        self
    }

    /// Full startup command, for storage and for the customizer only.
    pub fn startup_command(&self) -> &Value {
        &self.startup_command
    }

    /// `{arguments, jitter}` projection of the startup command.
    pub fn properties(&self) -> ChannelProperties {
        ChannelProperties {
            arguments: self
                .startup_command
                .get("arguments")
                .cloned()
                .unwrap_or(Value::Null),
            jitter: self.jitter.clone(),
        }
    }
}

/// Outbound JSON shape of a [`Channel`].
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelView {
    #[serde(rename = "iid", with = "hex_u64")]
    interface_id: u64,
    #[serde(rename = "type")]
    hash: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    is_return_channel: bool,
    #[serde(skip_serializing_if = "is_false")]
    is_negotiation_channel: bool,
    jitter: Value,
    properties_text: Value,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl From<Channel> for ChannelView {
    fn from(channel: Channel) -> Self {
        let properties = channel.properties();
        Self {
            interface_id: channel.interface_id,
            hash: channel.hash,
            error: channel.error,
            is_return_channel: channel.is_return_channel,
            is_negotiation_channel: channel.is_negotiation_channel,
            jitter: channel.jitter,
            properties_text: json!({
                "arguments": properties.arguments,
                "jitter": properties.jitter,
            }),
        }
    }
}
