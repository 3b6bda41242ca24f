//! The pnputil-backed production implementation.

use std::io;
use std::process::{Command, Output};

use super::{classify_delete_outcome, DeleteOutcome, DriverTool};
use crate::error::ToolError;

/// Invokes the system `pnputil` utility.
///
/// Enumeration runs `pnputil -e`; deletion runs `pnputil -d <name>`,
/// which the utility refuses for drivers still bound to an installed
/// device. The force flag is never passed.
#[derive(Debug, Clone)]
pub struct PnpUtil {
    program: String,
}

impl PnpUtil {
    pub fn new() -> Self {
        Self::with_program("pnputil")
    }

    /// Use an explicit executable path instead of `pnputil` from the
    /// search path. Useful when filesystem redirection hides the system
    /// copy, e.g. `C:\Windows\Sysnative\pnputil.exe`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PnpUtil {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverTool for PnpUtil {
    fn enumerate(&self) -> Result<String, ToolError> {
        let output = Command::new(&self.program)
            .arg("-e")
            .output()
            .map_err(map_spawn_error)?;

        if !output.status.success() {
            return Err(ToolError::InvocationFailed {
                code: output.status.code(),
                output: combined_text(&output),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn delete_driver(&self, published_name: &str) -> Result<DeleteOutcome, ToolError> {
        let output = Command::new(&self.program)
            .arg("-d")
            .arg(published_name)
            .output()
            .map_err(map_spawn_error)?;

        Ok(classify_delete_outcome(
            output.status.code(),
            &combined_text(&output),
        ))
    }
}

fn map_spawn_error(error: io::Error) -> ToolError {
    if error.kind() == io::ErrorKind::NotFound {
        ToolError::NotFound
    } else {
        ToolError::InvocationFailed {
            code: None,
            output: error.to_string(),
        }
    }
}

/// Stdout followed by stderr, lossily decoded. The utility writes its
/// diagnostics to stdout, but keep stderr too when something else (a
/// wrapper, the loader) complains there.
fn combined_text(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(stderr.trim_end());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_maps_to_not_found() {
        let tool = PnpUtil::with_program("no-such-pnputil-on-any-system");
        assert!(matches!(tool.enumerate(), Err(ToolError::NotFound)));
        assert!(matches!(
            tool.delete_driver("oem1.inf"),
            Err(ToolError::NotFound)
        ));
    }

    #[cfg(unix)]
    mod with_fake_scripts {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn fake_tool(dir: &TempDir, body: &str) -> PnpUtil {
            let path = dir.path().join("fake-pnputil");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            let mut permissions = std::fs::metadata(&path).unwrap().permissions();
            permissions.set_mode(0o755);
            std::fs::set_permissions(&path, permissions).unwrap();
            PnpUtil::with_program(path.display().to_string())
        }

        #[test]
        fn enumerate_returns_captured_stdout() {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(&dir, "echo 'Microsoft PnP Utility'");

            let text = tool.enumerate().unwrap();
            assert!(text.starts_with("Microsoft PnP Utility"));
        }

        #[test]
        fn enumerate_failure_carries_code_and_output() {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(&dir, "echo 'access denied'; exit 3");

            match tool.enumerate() {
                Err(ToolError::InvocationFailed { code, output }) => {
                    assert_eq!(code, Some(3));
                    assert!(output.contains("access denied"));
                }
                other => panic!("expected InvocationFailed, got {other:?}"),
            }
        }

        #[test]
        fn delete_refusal_is_classified() {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(
                &dir,
                &format!("echo '{}'; exit 1", crate::core::tool::IN_USE_MARKER),
            );

            let outcome = tool.delete_driver("oem3.inf").unwrap();
            assert_eq!(outcome, DeleteOutcome::RefusedInUse);
        }

        #[test]
        fn delete_success_is_classified() {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(&dir, "echo 'Driver package deleted successfully.'");

            assert_eq!(tool.delete_driver("oem3.inf").unwrap(), DeleteOutcome::Deleted);
        }

        #[test]
        fn delete_failure_collects_stderr_too() {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(&dir, "echo 'failed'; echo 'loader: oops' >&2; exit 5");

            match tool.delete_driver("oem3.inf").unwrap() {
                DeleteOutcome::Failed { code, output } => {
                    assert_eq!(code, Some(5));
                    assert!(output.contains("failed"));
                    assert!(output.contains("loader: oops"));
                }
                other => panic!("expected Failed, got {other:?}"),
            }
        }
    }
}
