//! The Serenity crate we're using for the Discord API is designed around one callback per event.
//! Lifecycle listeners are looked up by event name instead, so the callbacks are translated into
//! a distinct Event enum which knows its own name.

use serenity::all::{Member, Ready, User};

/// A Discord lifecycle event
pub enum Event {
    Ready(Box<Ready>),
    GuildMemberAddition(Member),
    /// `member` is only known if it was cached before it left
    GuildMemberRemoval {
        user: User,
        member: Option<Member>,
    },
}

/// Names of the events listeners can subscribe to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Ready,
    GuildMemberAddition,
    GuildMemberRemoval,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        Self::Ready,
        Self::GuildMemberAddition,
        Self::GuildMemberRemoval,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::GuildMemberAddition => "guild_member_addition",
            Self::GuildMemberRemoval => "guild_member_removal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Ready(_) => EventKind::Ready,
            Event::GuildMemberAddition(_) => EventKind::GuildMemberAddition,
            Event::GuildMemberRemoval { .. } => EventKind::GuildMemberRemoval,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}
