//! HttpCustomizer -- concrete [`Customizer`] that delegates to the gateway.
//!
//! Posts the relay build's full configuration to the gateway's customization
//! endpoint (`/api/relay/customize`) and returns the patched binary from the
//! response body. Transport and status failures are classified onto
//! [`CustomizeError`] variants.

use std::time::Duration;

use relayforge_core::relay::customizer::Customizer;
use relayforge_types::build::{Architecture, BinaryType, RelayBuild};
use relayforge_types::channel::Channel;
use relayforge_types::error::CustomizeError;
use relayforge_types::id::{AgentId, BuildId};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

/// Gateway-backed customizer.
pub struct HttpCustomizer {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

/// Wire body of a customization call.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomizeRequest<'a> {
    build_id: BuildId,
    arch: Architecture,
    #[serde(rename = "type")]
    binary_type: BinaryType,
    name: Option<&'a str>,
    startup_commands: &'a [Value],
    broadcast_key: &'a str,
    public_key: &'a str,
    channels: Vec<CustomizeChannel<'a>>,
    commands: &'a [Value],
    peripherals: &'a Value,
    parent_gateway_agent_id: AgentId,
}

/// Channel as the customizer sees it: including its startup command.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomizeChannel<'a> {
    #[serde(rename = "iid", with = "relayforge_types::id::hex_u64")]
    interface_id: u64,
    #[serde(rename = "type")]
    hash: u64,
    is_return_channel: bool,
    is_negotiation_channel: bool,
    jitter: &'a Value,
    startup_command: &'a Value,
}

impl<'a> From<&'a Channel> for CustomizeChannel<'a> {
    fn from(channel: &'a Channel) -> Self {
        Self {
            interface_id: channel.interface_id,
            hash: channel.hash,
            is_return_channel: channel.is_return_channel,
            is_negotiation_channel: channel.is_negotiation_channel,
            jitter: &channel.jitter,
            startup_command: channel.startup_command(),
        }
    }
}

impl<'a> From<&'a RelayBuild> for CustomizeRequest<'a> {
    fn from(build: &'a RelayBuild) -> Self {
        Self {
            build_id: build.build_id,
            arch: build.arch,
            binary_type: build.binary_type,
            name: build.name.as_deref(),
            startup_commands: &build.startup_commands,
            broadcast_key: &build.broadcast_key,
            public_key: &build.public_key,
            channels: build.channels.iter().map(CustomizeChannel::from).collect(),
            commands: &build.commands,
            peripherals: &build.peripherals,
            parent_gateway_agent_id: build.parent_gateway_agent_id,
        }
    }
}

impl HttpCustomizer {
    /// Path of the customization endpoint on the gateway.
    const CUSTOMIZE_PATH: &'static str = "/api/relay/customize";

    /// Create a customizer for the gateway at `base_url`.
    ///
    /// `timeout` bounds each HTTP exchange; the pipeline applies its own
    /// deadline on top.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CustomizeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CustomizeError::Other(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, Self::CUSTOMIZE_PATH)
    }

    fn classify_transport(&self, err: reqwest::Error) -> CustomizeError {
        if err.is_timeout() {
            CustomizeError::Timeout(self.timeout)
        } else if err.is_connect() {
            CustomizeError::InvalidGateway(format!("cannot reach {}: {err}", self.base_url))
        } else {
            CustomizeError::Other(format!("HTTP request failed: {err}"))
        }
    }
}

/// Map a non-success gateway status onto a customization fault.
///
/// A gateway that reports its own timeout is treated like a transport
/// timeout of `timeout`.
fn classify_status(status: StatusCode, body: &str, timeout: Duration) -> CustomizeError {
    let detail = if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    };

    match status {
        StatusCode::GONE | StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            CustomizeError::InvalidGateway(detail)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            tracing::debug!(%detail, "gateway reported a timeout");
            CustomizeError::Timeout(timeout)
        }
        s if s.is_client_error() => CustomizeError::Customizer(detail),
        _ => CustomizeError::GatewayResponse(detail),
    }
}

impl Customizer for HttpCustomizer {
    async fn customize(&self, build: &RelayBuild) -> Result<Vec<u8>, CustomizeError> {
        let body = CustomizeRequest::from(build);

        tracing::debug!(build_id = %build.build_id, url = %self.url(), "requesting customization");

        let response = self
            .client
            .post(self.url())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, error_body.trim(), self.timeout));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CustomizeError::GatewayResponse(format!("failed to read body: {e}")))?;

        if bytes.is_empty() {
            return Err(CustomizeError::GatewayResponse(
                "gateway returned an empty binary".to_string(),
            ));
        }

        Ok(bytes.to_vec())
    }
}
