//! Shared scaffolding for handler tests

use crate::{
    context::Context,
    gateway::MockGateway,
    listener::Listener,
    persistent_state::{PersistentState, StateFile},
    registry::Registry,
};
use serenity::all::{Member, User};
use tempfile::TempDir;
use tokio::sync::RwLock;

/// Everything a `Context` borrows, backed by a state document in a temporary directory
pub struct Fixture {
    pub pstate: RwLock<PersistentState>,
    pub state_file: StateFile,
    pub listeners: Registry<dyn Listener>,
    pub gateway: MockGateway,
    _dir: TempDir,
}

impl Fixture {
    pub fn new(gateway: MockGateway, doc: &str) -> Self {
        Self::with_listeners(gateway, doc, Vec::new())
    }

    pub fn with_listeners(
        gateway: MockGateway,
        doc: &str,
        listeners: Vec<Box<dyn Listener>>,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, doc).unwrap();

        Self {
            pstate: RwLock::new(serde_json::from_str(doc).unwrap_or_default()),
            state_file: StateFile::new(path),
            listeners: Registry::load("event", listeners),
            gateway,
            _dir: dir,
        }
    }

    pub fn ctx(&self) -> Context<'_> {
        Context {
            pstate: &self.pstate,
            state_file: &self.state_file,
            listeners: &self.listeners,
            gateway: &self.gateway,
        }
    }

    pub fn file_contents(&self) -> String {
        std::fs::read_to_string(self.state_file.path()).unwrap()
    }

    pub fn file_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.file_contents()).unwrap()
    }
}

/// A user without a global display name, so it is shown by its username
pub fn user(id: u64, username: &str) -> User {
    serde_json::from_value(serde_json::json!({
        "id": id.to_string(),
        "username": username,
        "discriminator": "0",
        "global_name": null,
        "avatar": null,
    }))
    .unwrap()
}

/// A member of guild 99, optionally with a server nickname
pub fn member(id: u64, username: &str, nick: Option<&str>) -> Member {
    serde_json::from_value(serde_json::json!({
        "user": serde_json::to_value(user(id, username)).unwrap(),
        "nick": nick,
        "roles": [],
        "joined_at": "2024-01-01T00:00:00Z",
        "deaf": false,
        "mute": false,
        "flags": 0,
        "pending": false,
        "guild_id": "99",
    }))
    .unwrap()
}
