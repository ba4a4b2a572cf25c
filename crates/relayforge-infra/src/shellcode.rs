//! CommandShellcodeGenerator -- concrete [`ShellcodeGenerator`] backed by an
//! external converter executable.
//!
//! The customized binary is written to a scratch directory, the converter is
//! run with donut-style flags under a deadline, and the produced file is read
//! back. A converter that overruns is killed. The scratch directory is removed
//! when the call returns.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use relayforge_core::relay::shellcode::ShellcodeGenerator;
use relayforge_types::build::{
    Architecture, Bypass, Compression, Entropy, ExitOption, ShellcodeFormat, ShellcodeRequest,
};
use relayforge_types::error::ShellcodeError;

/// Runs a command-line converter to produce shellcode.
pub struct CommandShellcodeGenerator {
    tool: Option<PathBuf>,
    args: Vec<String>,
    temp_dir: Option<PathBuf>,
    timeout: Duration,
}

impl CommandShellcodeGenerator {
    /// Create a generator. With no `tool`, every conversion fails.
    ///
    /// `timeout` bounds each converter run.
    pub fn new(
        tool: Option<PathBuf>,
        args: Vec<String>,
        temp_dir: Option<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            tool,
            args,
            temp_dir,
            timeout,
        }
    }

    fn scratch_dir(&self) -> Result<tempfile::TempDir, ShellcodeError> {
        let dir = match &self.temp_dir {
            Some(base) => tempfile::Builder::new().prefix("relayforge-").tempdir_in(base),
            None => tempfile::Builder::new().prefix("relayforge-").tempdir(),
        };
        dir.map_err(|e| ShellcodeError::Generation(format!("failed to create scratch dir: {e}")))
    }
}

/// Converter flags for one request, in invocation order.
fn converter_args(
    input: &Path,
    output: &Path,
    format: ShellcodeFormat,
    request: &ShellcodeRequest,
    arch: Architecture,
) -> Vec<String> {
    let arch_code = match arch {
        Architecture::X86 => 1,
        Architecture::X64 => 2,
    };
    let compress = match request.compress {
        Compression::None => 1,
        Compression::Aplib => 2,
    };
    let entropy = match request.entropy {
        Entropy::None => 1,
        Entropy::Random => 2,
        Entropy::Full => 3,
    };
    let exit = match request.exit_opt {
        ExitOption::Thread => 1,
        ExitOption::Process => 2,
    };
    let bypass = match request.bypass {
        Bypass::None => 1,
        Bypass::Abort => 2,
        Bypass::Continue => 3,
    };

    vec![
        "-i".to_string(),
        input.display().to_string(),
        "-o".to_string(),
        output.display().to_string(),
        "-a".to_string(),
        arch_code.to_string(),
        "-f".to_string(),
        format.code().to_string(),
        "-z".to_string(),
        compress.to_string(),
        "-e".to_string(),
        entropy.to_string(),
        "-x".to_string(),
        exit.to_string(),
        "-b".to_string(),
        bypass.to_string(),
    ]
}

impl ShellcodeGenerator for CommandShellcodeGenerator {
    async fn generate(
        &self,
        payload: &[u8],
        request: &ShellcodeRequest,
        arch: Architecture,
    ) -> Result<Vec<u8>, ShellcodeError> {
        let format = ShellcodeFormat::try_from(request.format)
            .map_err(ShellcodeError::UnrecognizedFormat)?;

        let tool = self.tool.as_ref().ok_or_else(|| {
            ShellcodeError::Generation("no shellcode tool configured".to_string())
        })?;

        let scratch = self.scratch_dir()?;
        let input = scratch.path().join("relay.bin");
        let output = scratch.path().join("relay.out");

        tokio::fs::write(&input, payload)
            .await
            .map_err(|e| ShellcodeError::Generation(format!("failed to stage binary: {e}")))?;

        tracing::debug!(
            tool = %tool.display(),
            format = format.code(),
            %arch,
            "running shellcode converter"
        );

        let child = tokio::process::Command::new(tool)
            .args(&self.args)
            .args(converter_args(&input, &output, format, request, arch))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ShellcodeError::Generation(format!("failed to run {}: {e}", tool.display()))
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                tracing::warn!(
                    tool = %tool.display(),
                    timeout_secs = self.timeout.as_secs(),
                    "shellcode converter overran its deadline; killed"
                );
                ShellcodeError::Timeout(self.timeout)
            })?
            .map_err(|e| {
                ShellcodeError::Generation(format!("failed to wait for {}: {e}", tool.display()))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ShellcodeError::Generation(format!(
                "{} exited with {}: {}",
                tool.display(),
                result.status,
                stderr.trim()
            )));
        }

        tokio::fs::read(&output)
            .await
            .map_err(|e| ShellcodeError::Generation(format!("converter produced no output: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converter_args_defaults() {
        let args = converter_args(
            Path::new("/tmp/in.bin"),
            Path::new("/tmp/out.bin"),
            ShellcodeFormat::Base64,
            &ShellcodeRequest::default(),
            Architecture::X64,
        );
        assert_eq!(
            args,
            vec![
                "-i", "/tmp/in.bin", "-o", "/tmp/out.bin", "-a", "2", "-f", "2", "-z", "1", "-e",
                "3", "-x", "1", "-b", "3",
            ]
        );
    }

    const DEADLINE: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_unknown_format_rejected_before_tool_lookup() {
        let generator = CommandShellcodeGenerator::new(None, Vec::new(), None, DEADLINE);
        let request = ShellcodeRequest {
            format: 99,
            ..ShellcodeRequest::default()
        };

        let err = generator
            .generate(b"MZ", &request, Architecture::X86)
            .await
            .unwrap_err();
        assert_eq!(err, ShellcodeError::UnrecognizedFormat(99));
    }

    #[tokio::test]
    async fn test_missing_tool_fails() {
        let generator = CommandShellcodeGenerator::new(None, Vec::new(), None, DEADLINE);
        let err = generator
            .generate(b"MZ", &ShellcodeRequest::default(), Architecture::X86)
            .await
            .unwrap_err();
        assert!(matches!(err, ShellcodeError::Generation(_)));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        /// Generator that runs `script` through `/bin/sh`.
        fn script_generator(dir: &Path, script: &str) -> CommandShellcodeGenerator {
            script_generator_with_deadline(dir, script, DEADLINE)
        }

        fn script_generator_with_deadline(
            dir: &Path,
            script: &str,
            timeout: Duration,
        ) -> CommandShellcodeGenerator {
            let path = dir.join("convert.sh");
            std::fs::write(&path, script).unwrap();
            CommandShellcodeGenerator::new(
                Some(PathBuf::from("/bin/sh")),
                vec![path.display().to_string()],
                Some(dir.to_path_buf()),
                timeout,
            )
        }

        const ECHO_CONVERTER: &str = r#"
out=""; in=""; fmt=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    -i) in="$2"; shift 2 ;;
    -f) fmt="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf 'SC%s:' "$fmt" > "$out"
cat "$in" >> "$out"
"#;

        #[tokio::test]
        async fn test_runs_converter_and_reads_output() {
            let dir = tempfile::tempdir().unwrap();
            let generator = script_generator(dir.path(), ECHO_CONVERTER);

            let out = generator
                .generate(
                    b"MZ",
                    &ShellcodeRequest::with_format(ShellcodeFormat::Hex),
                    Architecture::X64,
                )
                .await
                .unwrap();
            assert_eq!(out, b"SC8:MZ");
        }

        #[tokio::test]
        async fn test_scratch_dir_removed_after_call() {
            let dir = tempfile::tempdir().unwrap();
            let generator = script_generator(dir.path(), ECHO_CONVERTER);

            generator
                .generate(b"MZ", &ShellcodeRequest::default(), Architecture::X86)
                .await
                .unwrap();

            let leftovers: Vec<_> = std::fs::read_dir(dir.path())
                .unwrap()
                .filter_map(Result::ok)
                .filter(|e| e.file_name().to_string_lossy().starts_with("relayforge-"))
                .collect();
            assert!(leftovers.is_empty());
        }

        #[tokio::test]
        async fn test_nonzero_exit_reports_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let generator = script_generator(dir.path(), "echo 'bad PE header' >&2\nexit 3\n");

            let err = generator
                .generate(b"MZ", &ShellcodeRequest::default(), Architecture::X64)
                .await
                .unwrap_err();
            match err {
                ShellcodeError::Generation(message) => {
                    assert!(message.contains("bad PE header"), "got: {message}")
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test(flavor = "current_thread")]
        async fn test_hanging_converter_is_killed_at_deadline() {
            let dir = tempfile::tempdir().unwrap();
            let generator = script_generator_with_deadline(
                dir.path(),
                "exec sleep 30\n",
                Duration::from_millis(200),
            );

            let started = std::time::Instant::now();
            let err = generator
                .generate(b"MZ", &ShellcodeRequest::default(), Architecture::X64)
                .await
                .unwrap_err();

            assert_eq!(err, ShellcodeError::Timeout(Duration::from_millis(200)));
            assert!(
                started.elapsed() < Duration::from_secs(5),
                "took {:?}",
                started.elapsed()
            );
        }

        #[tokio::test(flavor = "current_thread")]
        async fn test_hanging_converter_does_not_block_runtime() {
            let dir = tempfile::tempdir().unwrap();
            let generator = script_generator_with_deadline(
                dir.path(),
                "exec sleep 30\n",
                Duration::from_secs(2),
            );

            // A shorter outer deadline must still fire on a single-threaded runtime.
            let started = std::time::Instant::now();
            let outer = tokio::time::timeout(
                Duration::from_millis(200),
                generator.generate(b"MZ", &ShellcodeRequest::default(), Architecture::X64),
            )
            .await;

            assert!(outer.is_err());
            assert!(started.elapsed() < Duration::from_secs(1));
        }
    }
}
