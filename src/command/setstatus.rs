use crate::{command::*, log_internal, presence::PresenceStatus};
use anyhow::{anyhow, Result};
use log::error;
use serenity::all::{CommandOptionType, CreateCommandOption};

pub const DENIED: &str = "You do not have permission to use this command.";
pub const FAILED: &str = "Failed to set bot status. Check console for errors.";

/// Changes the bot's online status and remembers it across restarts.  Restricted to the roles
/// listed under `permissions.allowed_role_ids`.
pub struct SetStatus;

impl SetStatus {
    async fn apply(&self, ctx: &Context<'_>, status: PresenceStatus) -> Result<()> {
        ctx.gateway.apply_status(status);
        ctx.pstate.write().await.bot_presence.status = Some(status.to_string());
        ctx.state_file.write_status(status).await
    }
}

#[async_trait]
impl Command for SetStatus {
    fn name(&self) -> &'static str {
        "setstatus"
    }

    fn schema(&self) -> CreateCommand {
        let option = PresenceStatus::ALL.into_iter().fold(
            CreateCommandOption::new(
                CommandOptionType::String,
                "status",
                "The status to set (online, idle, dnd, invisible)",
            )
            .required(true),
            |option, status| option.add_string_choice(status.label(), status.as_str()),
        );

        CreateCommand::new(self.name())
            .description("Sets the bot's online status.")
            .add_option(option)
    }

    async fn execute(&self, ctx: &Context<'_>, interaction: &dyn Interaction) -> Result<()> {
        let roles = interaction.member_role_ids();
        let allowed = ctx.pstate.read().await.permissions.allows(&roles);
        if !allowed {
            log_internal!("Denied /{} to {}", self.name(), interaction.user_tag());
            return interaction.reply(DENIED, true).await;
        }

        interaction.defer(true).await?;

        let status = interaction
            .string_option("status")
            .and_then(|status| PresenceStatus::parse(&status))
            .ok_or_else(|| anyhow!("missing or unknown `status` option"))?;

        match self.apply(ctx, status).await {
            Ok(()) => {
                let reply = format!(
                    "Bot status set to: **{}**.",
                    status.as_str().to_uppercase()
                );
                interaction.edit_reply(&reply).await?;
                log_internal!(
                    "Bot status changed to {} by {}",
                    status,
                    interaction.user_tag()
                );
            }
            Err(e) => {
                error!("Error setting bot status to {}: {:#}", status, e);
                interaction.edit_reply(FAILED).await?;
            }
        }

        Ok(())
    }
}
