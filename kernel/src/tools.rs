//! File tools exposed to agent workflows.
//!
//! Agent steps call these without a session id; the session comes from the
//! binding established by [`WorkspaceService::bind`] around the step, or
//! the default session when nothing is bound. Read and list failures an
//! agent can recover from are returned as `ERROR: ...` strings so they can
//! be fed back to the model verbatim.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::vfs::{ErrorKind, WorkspaceError, WorkspaceService};

/// Directory listed when `list_files` is called without one.
pub const DEFAULT_LIST_DIRECTORY: &str = ".";

/// Names accepted by [`AgentTools::execute`].
pub const TOOL_NAMES: [&str; 3] = ["write_file", "read_file", "list_files"];

/// The file tools available to an agent step.
#[derive(Debug, Clone)]
pub struct AgentTools {
    service: Arc<WorkspaceService>,
}

impl AgentTools {
    /// Creates the tool set over a shared service.
    #[must_use]
    pub fn new(service: Arc<WorkspaceService>) -> Self {
        Self { service }
    }

    /// Writes `content` to `path` and reports the normalized path.
    ///
    /// # Errors
    ///
    /// Any write failure is propagated.
    pub fn write_file(&self, path: &str, content: &str) -> Result<String, WorkspaceError> {
        let relative = self.service.write_text(None, path, content)?;
        Ok(format!("WROTE: {relative}"))
    }

    /// Reads `path` as text.
    ///
    /// # Errors
    ///
    /// Missing and binary files are reported in the returned string; other
    /// failures are propagated.
    pub fn read_file(&self, path: &str) -> Result<String, WorkspaceError> {
        match self.service.read_text(None, path) {
            Ok(content) => Ok(content),
            Err(e) => match e.kind() {
                ErrorKind::NotFound => Ok(format!("ERROR: File {path} does not exist.")),
                ErrorKind::BinaryFile => Ok(format!(
                    "ERROR: File {path} is binary and cannot be read as text."
                )),
                _ => Err(e),
            },
        }
    }

    /// Lists every file under `directory`, one path per line.
    ///
    /// # Errors
    ///
    /// A missing directory or an invalid target is reported in the returned
    /// string; other failures are propagated.
    pub fn list_files(&self, directory: Option<&str>) -> Result<String, WorkspaceError> {
        let directory = directory.unwrap_or(DEFAULT_LIST_DIRECTORY);
        match self.service.list_relative_files(None, directory) {
            Ok(files) if files.is_empty() => Ok("No files found.".to_string()),
            Ok(files) => Ok(files.join("\n")),
            Err(e) => match e.kind() {
                ErrorKind::NotFound => Ok(format!("ERROR: {directory} does not exist")),
                ErrorKind::Validation => Ok(format!("ERROR: {directory} is not a directory")),
                _ => Err(e),
            },
        }
    }

    /// Dispatches a tool call by name with JSON object arguments.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Validation`] for an unknown tool or missing
    /// arguments; otherwise behaves like the named method.
    pub fn execute(&self, name: &str, args: &Value) -> Result<String, WorkspaceError> {
        debug!(tool = name, "Executing agent tool");
        match name {
            "write_file" => self.write_file(
                required_str(name, args, "path")?,
                required_str(name, args, "content")?,
            ),
            "read_file" => self.read_file(required_str(name, args, "path")?),
            "list_files" => self.list_files(args.get("directory").and_then(Value::as_str)),
            _ => Err(WorkspaceError::validation(format!("Unknown tool: {name}"))),
        }
    }
}

fn required_str<'a>(tool: &str, args: &'a Value, key: &str) -> Result<&'a str, WorkspaceError> {
    args.get(key).and_then(Value::as_str).ok_or_else(|| {
        WorkspaceError::validation(format!("{tool} requires a string '{key}' argument."))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::WorkspaceSettings;
    use serde_json::json;
    use tempfile::tempdir;

    fn tools(base: &std::path::Path) -> anyhow::Result<AgentTools> {
        let service = WorkspaceService::new(&WorkspaceSettings::with_base_dir(base))?;
        Ok(AgentTools::new(Arc::new(service)))
    }

    #[test]
    fn test_write_read_list() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let tools = tools(dir.path())?;

        assert_eq!(tools.list_files(None)?, "No files found.");
        assert_eq!(tools.write_file("src/main.py", "print(1)")?, "WROTE: src/main.py");
        assert_eq!(tools.write_file("README.md", "# hi")?, "WROTE: README.md");
        assert_eq!(tools.read_file("src/main.py")?, "print(1)");
        assert_eq!(tools.list_files(None)?, "README.md\nsrc/main.py");
        assert_eq!(tools.list_files(Some("src"))?, "src/main.py");
        Ok(())
    }

    #[test]
    fn test_recoverable_errors_are_strings() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let tools = tools(dir.path())?;
        tools.write_file("notes.txt", "n")?;

        assert_eq!(
            tools.read_file("missing.txt")?,
            "ERROR: File missing.txt does not exist."
        );
        assert_eq!(tools.list_files(Some("nope"))?, "ERROR: nope does not exist");
        assert_eq!(
            tools.list_files(Some("notes.txt"))?,
            "ERROR: notes.txt is not a directory"
        );
        Ok(())
    }

    #[test]
    fn test_binary_read_is_reported() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let tools = tools(dir.path())?;
        let root = tools.service.root(None)?;
        std::fs::write(root.join("blob.bin"), [0xff_u8, 0xfe, 0x00])?;

        assert_eq!(
            tools.read_file("blob.bin")?,
            "ERROR: File blob.bin is binary and cannot be read as text."
        );
        Ok(())
    }

    #[test]
    fn test_write_errors_propagate() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let tools = tools(dir.path())?;
        let err = tools
            .write_file("../escape.txt", "x")
            .err()
            .ok_or_else(|| anyhow::anyhow!("write outside root succeeded"))?;
        assert_eq!(err.kind(), ErrorKind::Validation);
        Ok(())
    }

    #[test]
    fn test_execute_dispatch() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let tools = tools(dir.path())?;

        let wrote = tools.execute("write_file", &json!({"path": "a.txt", "content": "A"}))?;
        assert_eq!(wrote, "WROTE: a.txt");
        assert_eq!(tools.execute("read_file", &json!({"path": "a.txt"}))?, "A");
        assert_eq!(tools.execute("list_files", &json!({}))?, "a.txt");
        assert!(tools.execute("read_file", &json!({})).is_err());
        assert!(tools.execute("rm_rf", &json!({})).is_err());
        Ok(())
    }

    #[test]
    fn test_tools_follow_binding() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let tools = tools(dir.path())?;

        tools
            .service
            .bind_sync(Some("alpha"), || tools.write_file("a.txt", "from alpha"))??;
        tools
            .service
            .bind_sync(Some("beta"), || tools.write_file("b.txt", "from beta"))??;

        let alpha = tools.service.bind_sync(Some("alpha"), || tools.list_files(None))??;
        let beta = tools.service.bind_sync(Some("beta"), || tools.list_files(None))??;
        assert_eq!(alpha, "a.txt");
        assert_eq!(beta, "b.txt");
        assert_eq!(tools.list_files(None)?, "No files found.");
        Ok(())
    }
}
