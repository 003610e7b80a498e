//! The bot's online status and activity, and the translation from what is written in the
//! configuration file to what is sent to Discord.

use crate::persistent_state::{ActivityConfig, BotPresence};
use log::warn;
use serenity::all::{ActivityData, OnlineStatus};
use std::fmt;

/// Online status as stored in the configuration file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PresenceStatus {
    #[default]
    Online,
    Idle,
    Dnd,
    Invisible,
}

impl PresenceStatus {
    pub const ALL: [PresenceStatus; 4] = [Self::Online, Self::Idle, Self::Dnd, Self::Invisible];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::Dnd => "dnd",
            Self::Invisible => "invisible",
        }
    }

    /// Human facing label, used for the slash command choices
    pub fn label(&self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Idle => "Idle",
            Self::Dnd => "Do Not Disturb",
            Self::Invisible => "Invisible",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PresenceStatus> for OnlineStatus {
    fn from(status: PresenceStatus) -> Self {
        match status {
            PresenceStatus::Online => OnlineStatus::Online,
            PresenceStatus::Idle => OnlineStatus::Idle,
            PresenceStatus::Dnd => OnlineStatus::DoNotDisturb,
            PresenceStatus::Invisible => OnlineStatus::Invisible,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityKind {
    Playing,
    Streaming,
    Listening,
    Watching,
    Competing,
    Custom,
}

impl ActivityKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "playing" => Some(Self::Playing),
            "streaming" => Some(Self::Streaming),
            "listening" => Some(Self::Listening),
            "watching" => Some(Self::Watching),
            "competing" => Some(Self::Competing),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// A validated activity, ready to be handed to the gateway
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activity {
    pub name: String,
    pub kind: ActivityKind,
    pub url: Option<String>,
}

impl Activity {
    /// Build the activity described by the configuration file.
    ///
    /// Returns `None`, after logging why, when the description is incomplete or names an
    /// activity type Discord does not know about.
    pub fn from_config(cfg: &ActivityConfig) -> Option<Self> {
        let (Some(name), Some(kind)) = (cfg.name.as_deref(), cfg.kind.as_deref()) else {
            warn!("Activity needs both a name and a type, not setting any activity");
            return None;
        };

        let Some(kind) = ActivityKind::parse(kind) else {
            warn!("Unknown activity type \"{}\", not setting any activity", kind);
            return None;
        };

        if kind == ActivityKind::Streaming && cfg.url.is_none() {
            warn!("Streaming activity \"{}\" has no url, not setting any activity", name);
            return None;
        }

        Some(Self {
            name: name.to_owned(),
            kind,
            url: cfg.url.clone(),
        })
    }

    /// Convert to serenity's representation.  Fails only on an unparseable streaming url.
    pub fn to_activity_data(&self) -> serenity::Result<ActivityData> {
        Ok(match self.kind {
            ActivityKind::Playing => ActivityData::playing(&self.name),
            ActivityKind::Streaming => {
                ActivityData::streaming(&self.name, self.url.as_deref().unwrap_or_default())?
            }
            ActivityKind::Listening => ActivityData::listening(&self.name),
            ActivityKind::Watching => ActivityData::watching(&self.name),
            ActivityKind::Competing => ActivityData::competing(&self.name),
            ActivityKind::Custom => ActivityData::custom(&self.name),
        })
    }
}

/// What actually gets applied when the connection becomes ready
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Presence {
    pub status: PresenceStatus,
    pub activity: Option<Activity>,
}

impl Presence {
    pub fn resolve(cfg: &BotPresence) -> Self {
        let status = match cfg.status.as_deref() {
            None => PresenceStatus::default(),
            Some(s) => PresenceStatus::parse(s).unwrap_or_else(|| {
                warn!("Unknown status \"{}\", falling back to online", s);
                PresenceStatus::default()
            }),
        };

        let activity = cfg.activity.as_ref().and_then(Activity::from_config);

        Self { status, activity }
    }
}
