//! Gateway and relay build records, and the request that produces a relay build.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use std::fmt;
use std::str::FromStr;

use crate::channel::Channel;
use crate::id::{AgentId, BuildId};

/// Target CPU architecture of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    X64,
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::X86 => write!(f, "x86"),
            Architecture::X64 => write!(f, "x64"),
        }
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86" => Ok(Architecture::X86),
            "x64" => Ok(Architecture::X64),
            other => Err(format!("invalid architecture: '{other}'")),
        }
    }
}

/// Kind of binary produced for a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryType {
    Exe,
    Dll,
    Shellcode,
}

impl fmt::Display for BinaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryType::Exe => write!(f, "exe"),
            BinaryType::Dll => write!(f, "dll"),
            BinaryType::Shellcode => write!(f, "shellcode"),
        }
    }
}

impl FromStr for BinaryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exe" => Ok(BinaryType::Exe),
            "dll" => Ok(BinaryType::Dll),
            "shellcode" => Ok(BinaryType::Shellcode),
            other => Err(format!("invalid binary type: '{other}'")),
        }
    }
}

/// Relay command set of a gateway build.
///
/// Only the `commands` group is consumed by relay builds; any other groups
/// are kept so the stored record round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayCommands {
    #[serde(default)]
    pub commands: Vec<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A previously built gateway agent. Read-only to the relay pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayBuild {
    pub build_id: BuildId,
    pub agent_id: AgentId,
    pub broadcast_key: String,
    pub public_key: String,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub relay_commands: RelayCommands,
    #[serde(default)]
    pub peripherals: Value,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A generated relay artifact record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayBuild {
    pub build_id: BuildId,
    pub arch: Architecture,
    #[serde(rename = "type")]
    pub binary_type: BinaryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub startup_commands: Vec<Value>,
    pub broadcast_key: String,
    pub public_key: String,
    pub channels: Vec<Channel>,
    pub commands: Vec<Value>,
    pub peripherals: Value,
    pub parent_gateway_agent_id: AgentId,
    pub created_at: DateTime<Utc>,
}

/// A relay build that has not been persisted yet (no build id assigned).
#[derive(Debug, Clone, PartialEq)]
pub struct RelayBuildDraft {
    pub arch: Architecture,
    pub binary_type: BinaryType,
    pub name: Option<String>,
    pub startup_commands: Vec<Value>,
    pub broadcast_key: String,
    pub public_key: String,
    pub channels: Vec<Channel>,
    pub commands: Vec<Value>,
    pub peripherals: Value,
    pub parent_gateway_agent_id: AgentId,
}

impl RelayBuildDraft {
    /// Attach the store-assigned identity to this draft.
    pub fn into_build(self, build_id: BuildId, created_at: DateTime<Utc>) -> RelayBuild {
        RelayBuild {
            build_id,
            arch: self.arch,
            binary_type: self.binary_type,
            name: self.name,
            startup_commands: self.startup_commands,
            broadcast_key: self.broadcast_key,
            public_key: self.public_key,
            channels: self.channels,
            commands: self.commands,
            peripherals: self.peripherals,
            parent_gateway_agent_id: self.parent_gateway_agent_id,
            created_at,
        }
    }
}

/// Request to customize a new relay build from a gateway build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub architecture: Architecture,
    #[serde(rename = "type")]
    pub binary_type: BinaryType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub startup_commands: Vec<Value>,
    pub parent_gateway_build_id: BuildId,
    /// Only consulted when `binary_type` is `shellcode`.
    #[serde(default)]
    pub shellcode: Option<ShellcodeRequest>,
}

/// Output encodings supported by the shellcode generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellcodeFormat {
    Binary = 1,
    Base64 = 2,
    Ruby = 3,
    C = 4,
    Python = 5,
    PowerShell = 6,
    CSharp = 7,
    Hex = 8,
}

impl ShellcodeFormat {
    pub const ALL: [ShellcodeFormat; 8] = [
        ShellcodeFormat::Binary,
        ShellcodeFormat::Base64,
        ShellcodeFormat::Ruby,
        ShellcodeFormat::C,
        ShellcodeFormat::Python,
        ShellcodeFormat::PowerShell,
        ShellcodeFormat::CSharp,
        ShellcodeFormat::Hex,
    ];

    pub fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ShellcodeFormat {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        ShellcodeFormat::ALL
            .into_iter()
            .find(|format| format.code() == code)
            .ok_or(code)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Aplib,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entropy {
    None,
    Random,
    #[default]
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitOption {
    #[default]
    Thread,
    Process,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bypass {
    None,
    Abort,
    #[default]
    Continue,
}

/// Options forwarded to the shellcode generator.
///
/// `format` stays a raw code so that unknown encodings survive
/// deserialization and are rejected by the format resolver instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellcodeRequest {
    #[serde(default = "default_format")]
    pub format: u32,
    #[serde(default)]
    pub compress: Compression,
    #[serde(default)]
    pub entropy: Entropy,
    #[serde(default)]
    pub exit_opt: ExitOption,
    #[serde(default)]
    pub bypass: Bypass,
}

fn default_format() -> u32 {
    ShellcodeFormat::Binary.code()
}

impl Default for ShellcodeRequest {
    fn default() -> Self {
        Self {
            format: default_format(),
            compress: Compression::default(),
            entropy: Entropy::default(),
            exit_opt: ExitOption::default(),
            bypass: Bypass::default(),
        }
    }
}

impl ShellcodeRequest {
    pub fn with_format(format: ShellcodeFormat) -> Self {
        Self {
            format: format.code(),
            ..Self::default()
        }
    }
}
