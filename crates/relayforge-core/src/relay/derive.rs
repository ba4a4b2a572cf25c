//! Derivation of a relay build draft from its parent gateway build.

use relayforge_types::build::{BuildRequest, GatewayBuild, RelayBuildDraft};

/// Build an owned draft from a request and an immutable parent snapshot.
///
/// Architecture, kind, name and startup commands come from the request;
/// keys, channels, the `commands` group, peripherals and the owning agent id
/// are copied from the parent.
pub fn derive_draft(request: &BuildRequest, parent: &GatewayBuild) -> RelayBuildDraft {
    RelayBuildDraft {
        arch: request.architecture,
        binary_type: request.binary_type,
        name: request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
        startup_commands: request.startup_commands.clone(),
        broadcast_key: parent.broadcast_key.clone(),
        public_key: parent.public_key.clone(),
        channels: parent.channels.clone(),
        commands: parent.relay_commands.commands.clone(),
        peripherals: parent.peripherals.clone(),
        parent_gateway_agent_id: parent.agent_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayforge_types::build::{Architecture, BinaryType, RelayCommands};
    use relayforge_types::channel::Channel;
    use relayforge_types::id::{AgentId, BuildId};
    use serde_json::json;

    fn parent() -> GatewayBuild {
        let mut other = serde_json::Map::new();
        other.insert("connectors".to_string(), json!([{"name": "TeamServer"}]));
        GatewayBuild {
            build_id: BuildId(3),
            agent_id: AgentId(42),
            broadcast_key: "bk".to_string(),
            public_key: "pk".to_string(),
            channels: vec![Channel::new(0xaa, 1)],
            relay_commands: RelayCommands {
                commands: vec![json!({"name": "Sleep"})],
                other,
            },
            peripherals: json!([{"name": "Beacon"}]),
            created_at: chrono::Utc::now(),
        }
    }

    fn request(name: Option<&str>) -> BuildRequest {
        BuildRequest {
            architecture: Architecture::X86,
            binary_type: BinaryType::Dll,
            name: name.map(str::to_string),
            startup_commands: vec![json!({"command": "AddChannel"})],
            parent_gateway_build_id: BuildId(3),
            shellcode: None,
        }
    }

    #[test]
    fn test_draft_copies_parent_configuration() {
        let parent = parent();
        let draft = derive_draft(&request(Some("lab")), &parent);

        assert_eq!(draft.arch, Architecture::X86);
        assert_eq!(draft.binary_type, BinaryType::Dll);
        assert_eq!(draft.name.as_deref(), Some("lab"));
        assert_eq!(draft.startup_commands.len(), 1);
        assert_eq!(draft.broadcast_key, "bk");
        assert_eq!(draft.public_key, "pk");
        assert_eq!(draft.channels, parent.channels);
        assert_eq!(draft.commands, vec![json!({"name": "Sleep"})]);
        assert_eq!(draft.peripherals, parent.peripherals);
        assert_eq!(draft.parent_gateway_agent_id, AgentId(42));
    }

    #[test]
    fn test_blank_name_becomes_none() {
        let draft = derive_draft(&request(Some("   ")), &parent());
        assert!(draft.name.is_none());
    }
}
