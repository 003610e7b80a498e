use crate::presence::PresenceStatus;
use anyhow::{anyhow, Result};
use log::{error, warn};
use serenity::all::{ChannelId, RoleId};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Settings which persist across sessions.  Loaded from a JSON document at startup; only the
/// presence status is ever written back.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PersistentState {
    pub bot_presence: BotPresence,
    pub permissions: Permissions,
    pub greetings: Greetings,
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BotPresence {
    pub status: Option<String>,
    pub activity: Option<ActivityConfig>,
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub allowed_role_ids: Vec<String>,
}

impl Permissions {
    /// Whether a member holding `roles` may use privileged commands
    pub fn allows(&self, roles: &[RoleId]) -> bool {
        roles.iter().any(|role| {
            let role = role.to_string();
            self.allowed_role_ids.iter().any(|allowed| *allowed == role)
        })
    }
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Greetings {
    pub channel_id: Option<String>,
    pub welcome: Option<String>,
    pub farewell: Option<String>,
}

impl Greetings {
    pub const DEFAULT_WELCOME: &'static str = "Welcome to the server, {user}!";
    pub const DEFAULT_FAREWELL: &'static str = "{name} has left the server.";

    pub fn channel(&self) -> Option<ChannelId> {
        let id = self.channel_id.as_deref()?;
        match id.parse::<u64>() {
            Ok(id) if id != 0 => Some(ChannelId::new(id)),
            _ => {
                warn!("Ignoring invalid greetings channel id \"{}\"", id);
                None
            }
        }
    }

    pub fn welcome(&self) -> &str {
        self.welcome.as_deref().unwrap_or(Self::DEFAULT_WELCOME)
    }

    pub fn farewell(&self) -> &str {
        self.farewell.as_deref().unwrap_or(Self::DEFAULT_FAREWELL)
    }
}

/// The JSON document backing `PersistentState`
pub struct StateFile {
    path: PathBuf,
    /// Held for a whole read-modify-write, as every write goes through the same temporary file
    write_lock: Mutex<()>,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document.  A missing or unreadable document yields the defaults; this never
    /// stops the bot from starting.
    pub async fn read(&self) -> PersistentState {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!(
                    "Could not read state at `{}` ({}), using defaults",
                    self.path.to_string_lossy(),
                    e
                );
                return PersistentState::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(pstate) => pstate,
            Err(e) => {
                error!(
                    "Could not parse state at `{}` ({}), using defaults",
                    self.path.to_string_lossy(),
                    e
                );
                PersistentState::default()
            }
        }
    }

    /// Replace `bot_presence.status` in the document, leaving every other key as it is.
    pub async fn write_status(&self, status: PresenceStatus) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut doc = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str::<serde_json::Value>(&contents).map_err(|e| {
                anyhow!(
                    "Could not parse state at `{}`: {}",
                    self.path.to_string_lossy(),
                    e
                )
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => serde_json::json!({}),
            Err(e) => {
                return Err(anyhow!(
                    "Could not read state at `{}`: {}",
                    self.path.to_string_lossy(),
                    e
                ))
            }
        };

        let root = doc
            .as_object_mut()
            .ok_or_else(|| anyhow!("State at `{}` is not a JSON object", self.path.to_string_lossy()))?;
        let presence = root
            .entry("bot_presence")
            .or_insert_with(|| serde_json::json!({}));
        if !presence.is_object() {
            *presence = serde_json::json!({});
        }
        presence["status"] = serde_json::Value::String(status.as_str().to_owned());

        self.save(&doc).await
    }

    async fn save(&self, doc: &serde_json::Value) -> Result<()> {
        let path = &self.path;
        let contents = serde_json::to_string_pretty(doc)
            .map_err(|e| anyhow!("Could not serialize state: {}", e))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow!(
                    "Could not create directory `{}`: {}",
                    parent.to_string_lossy(),
                    e
                )
            })?;
        }

        // Create a temporary file in the same directory.
        let tmp_path = path.with_extension("json.new");

        tokio::fs::write(&tmp_path, contents).await.map_err(|e| {
            anyhow!(
                "Could not write state to temporary file `{}`: {}",
                tmp_path.to_string_lossy(),
                e
            )
        })?;

        // Atomically rename the temporary file over the target file.
        tokio::fs::rename(&tmp_path, path).await.map_err(|e| {
            anyhow!(
                "Could not rename temporary file `{}` to `{}`: {}",
                tmp_path.to_string_lossy(),
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(())
    }
}
