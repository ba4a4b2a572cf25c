//! File naming for delivered relay artifacts.

use relayforge_types::build::{BinaryType, RelayBuild, ShellcodeFormat, ShellcodeRequest};
use relayforge_types::error::BuildError;

/// Extension for a shellcode output encoding.
pub fn shellcode_extension(format: ShellcodeFormat) -> &'static str {
    match format {
        ShellcodeFormat::Binary => "bin",
        ShellcodeFormat::Base64 => "b64",
        ShellcodeFormat::Ruby => "rb",
        ShellcodeFormat::C => "c",
        ShellcodeFormat::Python => "py",
        ShellcodeFormat::PowerShell => "ps1",
        ShellcodeFormat::CSharp => "cs",
        ShellcodeFormat::Hex => "hex",
    }
}

/// Resolve the artifact extension for a binary kind.
///
/// For shellcode, `shellcode` is the (possibly defaulted) request; an
/// omitted request resolves like the default one. Unknown encodings fail
/// with [`BuildError::UnrecognizedFormat`].
pub fn resolve_extension(
    binary_type: BinaryType,
    shellcode: Option<&ShellcodeRequest>,
) -> Result<&'static str, BuildError> {
    match binary_type {
        BinaryType::Exe => Ok("exe"),
        BinaryType::Dll => Ok("dll"),
        BinaryType::Shellcode => {
            let code = shellcode
                .map(|request| request.format)
                .unwrap_or_else(|| ShellcodeRequest::default().format);
            ShellcodeFormat::try_from(code)
                .map(shellcode_extension)
                .map_err(BuildError::UnrecognizedFormat)
        }
    }
}

/// `Relay_<arch>_<hex id>[_<name>].<extension>`
pub fn artifact_file_name(build: &RelayBuild, extension: &str) -> String {
    let suffix = match build.name.as_deref() {
        Some(name) if !name.is_empty() => format!("_{name}"),
        _ => String::new(),
    };
    format!(
        "Relay_{}_{}{}.{}",
        build.arch, build.build_id, suffix, extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayforge_types::build::Architecture;
    use relayforge_types::id::{AgentId, BuildId};

    fn build(arch: Architecture, id: u16, name: Option<&str>) -> RelayBuild {
        RelayBuild {
            build_id: BuildId(id),
            arch,
            binary_type: BinaryType::Exe,
            name: name.map(str::to_string),
            startup_commands: Vec::new(),
            broadcast_key: String::new(),
            public_key: String::new(),
            channels: Vec::new(),
            commands: Vec::new(),
            peripherals: serde_json::Value::Null,
            parent_gateway_agent_id: AgentId(1),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_non_shellcode_extension_is_kind_name() {
        assert_eq!(resolve_extension(BinaryType::Exe, None).unwrap(), "exe");
        assert_eq!(resolve_extension(BinaryType::Dll, None).unwrap(), "dll");
        // A stray shellcode request is ignored for non-shellcode kinds.
        let stray = ShellcodeRequest {
            format: 99,
            ..ShellcodeRequest::default()
        };
        assert_eq!(resolve_extension(BinaryType::Dll, Some(&stray)).unwrap(), "dll");
    }

    #[test]
    fn test_shellcode_extension_table() {
        let expected = [
            (1, "bin"),
            (2, "b64"),
            (3, "rb"),
            (4, "c"),
            (5, "py"),
            (6, "ps1"),
            (7, "cs"),
            (8, "hex"),
        ];
        for (code, ext) in expected {
            let request = ShellcodeRequest {
                format: code,
                ..ShellcodeRequest::default()
            };
            assert_eq!(
                resolve_extension(BinaryType::Shellcode, Some(&request)).unwrap(),
                ext,
                "format code {code}"
            );
        }
    }

    #[test]
    fn test_shellcode_without_request_defaults_to_bin() {
        assert_eq!(resolve_extension(BinaryType::Shellcode, None).unwrap(), "bin");
    }

    #[test]
    fn test_unknown_encoding_is_rejected() {
        for code in [0, 9, 99] {
            let request = ShellcodeRequest {
                format: code,
                ..ShellcodeRequest::default()
            };
            assert_eq!(
                resolve_extension(BinaryType::Shellcode, Some(&request)),
                Err(BuildError::UnrecognizedFormat(code))
            );
        }
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name(&build(Architecture::X64, 0x1a, None), "exe"),
            "Relay_x64_1a.exe"
        );
        assert_eq!(
            artifact_file_name(&build(Architecture::X86, 0xbeef, Some("lab")), "b64"),
            "Relay_x86_beef_lab.b64"
        );
        assert_eq!(
            artifact_file_name(&build(Architecture::X86, 7, Some("")), "dll"),
            "Relay_x86_7.dll"
        );
    }
}
