use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::constants::REGISTERED_SERVER_ID;

/// How an MCP host should launch this server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEntry {
    pub name: String,
    pub description: String,
    pub command: String,
    pub cwd: String,
    pub transport: String,
}

impl ServerEntry {
    pub fn new(command: impl Into<String>, cwd: &Path) -> Self {
        ServerEntry {
            name: "Tika MCP Server".to_string(),
            description: "MCP server for extracting content and metadata from files using Apache Tika."
                .to_string(),
            command: command.into(),
            cwd: cwd.to_string_lossy().to_string(),
            transport: "stdio".to_string(),
        }
    }
}

/// Default MCP client configuration file: `~/.mcp/config.json`
pub fn default_client_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;
    Ok(home.join(".mcp").join("config.json"))
}

/// Add or replace this server's entry under `servers` in `config_path`.
///
/// Other entries are left untouched. A file that is not a JSON object is
/// replaced with a fresh configuration.
pub fn register_server(config_path: &Path, entry: &ServerEntry) -> Result<()> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let mut root = read_client_config(config_path)?;
    let servers = root.entry("servers").or_insert_with(|| json!({}));
    if !servers.is_object() {
        warn!("`servers` in {} is not an object, replacing it", config_path.display());
        *servers = json!({});
    }
    if let Value::Object(servers) = servers {
        servers.insert(
            REGISTERED_SERVER_ID.to_string(),
            serde_json::to_value(entry).context("Failed to serialize server entry")?,
        );
    }

    let content = serde_json::to_string_pretty(&root).context("Failed to serialize MCP config")?;
    std::fs::write(config_path, content)
        .with_context(|| format!("Failed to write MCP config: {}", config_path.display()))?;

    info!(path = %config_path.display(), id = REGISTERED_SERVER_ID, "Registered server");
    Ok(())
}

fn read_client_config(config_path: &Path) -> Result<Map<String, Value>> {
    if !config_path.exists() {
        return Ok(Map::new());
    }

    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read MCP config: {}", config_path.display()))?;

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(root)) => Ok(root),
        _ => {
            warn!(
                "Could not parse existing config file at {}, creating a new one",
                config_path.display()
            );
            Ok(Map::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ServerEntry {
        ServerEntry::new("/usr/local/bin/tika-mcp", Path::new("/srv"))
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_register_creates_missing_file_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".mcp").join("config.json");

        register_server(&path, &entry()).unwrap();

        let config = read(&path);
        let server = &config["servers"][REGISTERED_SERVER_ID];
        assert_eq!(server["command"], "/usr/local/bin/tika-mcp");
        assert_eq!(server["cwd"], "/srv");
        assert_eq!(server["transport"], "stdio");
    }

    #[test]
    fn test_register_preserves_other_servers_and_overwrites_own() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            json!({
                "servers": {
                    "other": { "command": "other-server" },
                    (REGISTERED_SERVER_ID): { "command": "stale" }
                },
                "theme": "dark"
            })
            .to_string(),
        )
        .unwrap();

        register_server(&path, &entry()).unwrap();

        let config = read(&path);
        assert_eq!(config["servers"]["other"]["command"], "other-server");
        assert_eq!(config["servers"][REGISTERED_SERVER_ID]["command"], "/usr/local/bin/tika-mcp");
        assert_eq!(config["theme"], "dark");
    }

    #[test]
    fn test_register_replaces_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ broken").unwrap();

        register_server(&path, &entry()).unwrap();

        let config = read(&path);
        assert_eq!(config["servers"].as_object().unwrap().len(), 1);
    }
}
