//! The two surfaces through which handlers talk back to Discord.
//!
//! `Gateway` covers calls that are not tied to a particular interaction, `Interaction` covers a
//! single slash command invocation.  Both are implemented for the corresponding serenity types
//! here; tests substitute mocks.

use crate::presence::{Activity, PresenceStatus};
use anyhow::Result;
use log::warn;
use serenity::all::{
    ChannelId, CommandDataOptionValue, CommandInteraction, CreateCommand,
    CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, EditInteractionResponse, GuildId, Member, RoleId,
};
use serenity::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Replace both the online status and the activity
    fn apply_presence(&self, activity: Option<Activity>, status: PresenceStatus);
    /// Change the online status, keeping the current activity
    fn apply_status(&self, status: PresenceStatus);
    /// Bulk replace the guild's slash commands.  Returns how many Discord now knows about.
    async fn register_guild_commands(
        &self,
        guild_id: GuildId,
        commands: Vec<CreateCommand>,
    ) -> Result<usize>;
    async fn send_message(&self, channel_id: ChannelId, content: String) -> Result<()>;
}

#[async_trait]
impl Gateway for serenity::all::Context {
    fn apply_presence(&self, activity: Option<Activity>, status: PresenceStatus) {
        let activity = activity.and_then(|activity| match activity.to_activity_data() {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Could not build activity \"{}\": {}", activity.name, e);
                None
            }
        });
        self.set_presence(activity, status.into());
    }

    fn apply_status(&self, status: PresenceStatus) {
        match status {
            PresenceStatus::Online => self.online(),
            PresenceStatus::Idle => self.idle(),
            PresenceStatus::Dnd => self.dnd(),
            PresenceStatus::Invisible => self.invisible(),
        }
    }

    async fn register_guild_commands(
        &self,
        guild_id: GuildId,
        commands: Vec<CreateCommand>,
    ) -> Result<usize> {
        let registered = guild_id.set_commands(&self.http, commands).await?;
        Ok(registered.len())
    }

    async fn send_message(&self, channel_id: ChannelId, content: String) -> Result<()> {
        channel_id.say(&self.http, content).await?;
        Ok(())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Interaction: Send + Sync {
    fn command_name(&self) -> String;
    fn string_option(&self, name: &str) -> Option<String>;
    /// Invoking member, if the command was used inside a guild
    fn member(&self) -> Option<Member>;
    fn member_role_ids(&self) -> Vec<RoleId>;
    fn user_tag(&self) -> String;
    /// Whether a reply or deferral has already been sent
    fn is_acknowledged(&self) -> bool;
    async fn reply(&self, content: &str, ephemeral: bool) -> Result<()>;
    async fn defer(&self, ephemeral: bool) -> Result<()>;
    async fn edit_reply(&self, content: &str) -> Result<()>;
    async fn follow_up(&self, content: &str, ephemeral: bool) -> Result<()>;
}

/// A slash command interaction as delivered by serenity
pub struct SlashCommand<'a> {
    ctx: &'a serenity::all::Context,
    command: &'a CommandInteraction,
    acknowledged: AtomicBool,
}

impl<'a> SlashCommand<'a> {
    pub fn new(ctx: &'a serenity::all::Context, command: &'a CommandInteraction) -> Self {
        Self {
            ctx,
            command,
            acknowledged: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Interaction for SlashCommand<'_> {
    fn command_name(&self) -> String {
        self.command.data.name.clone()
    }

    fn string_option(&self, name: &str) -> Option<String> {
        self.command
            .data
            .options
            .iter()
            .find(|option| option.name == name)
            .and_then(|option| match &option.value {
                CommandDataOptionValue::String(value) => Some(value.clone()),
                _ => None,
            })
    }

    fn member(&self) -> Option<Member> {
        self.command.member.as_deref().cloned()
    }

    fn member_role_ids(&self) -> Vec<RoleId> {
        self.command
            .member
            .as_ref()
            .map(|member| member.roles.clone())
            .unwrap_or_default()
    }

    fn user_tag(&self) -> String {
        self.command.user.tag()
    }

    fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::SeqCst)
    }

    async fn reply(&self, content: &str, ephemeral: bool) -> Result<()> {
        let message = CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(ephemeral);
        self.command
            .create_response(&self.ctx.http, CreateInteractionResponse::Message(message))
            .await?;
        self.acknowledged.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn defer(&self, ephemeral: bool) -> Result<()> {
        let message = CreateInteractionResponseMessage::new().ephemeral(ephemeral);
        self.command
            .create_response(&self.ctx.http, CreateInteractionResponse::Defer(message))
            .await?;
        self.acknowledged.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn edit_reply(&self, content: &str) -> Result<()> {
        self.command
            .edit_response(&self.ctx.http, EditInteractionResponse::new().content(content))
            .await?;
        Ok(())
    }

    async fn follow_up(&self, content: &str, ephemeral: bool) -> Result<()> {
        let followup = CreateInteractionResponseFollowup::new()
            .content(content)
            .ephemeral(ephemeral);
        self.command
            .create_followup(&self.ctx.http, followup)
            .await?;
        Ok(())
    }
}
