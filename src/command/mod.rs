use crate::{
    context::Context,
    event::{Event, EventKind},
    gateway::Interaction,
    registry::{Admit, Rejection},
};
use anyhow::{anyhow, Result};
use log::error;
use serenity::all::{CreateCommand, Member};
use serenity::async_trait;

mod setstatus;
mod testjoin;
mod testleave;

const MAX_NAME_LEN: usize = 32;

#[async_trait]
pub trait Command: Sync + Send {
    /// Slash command name, the key it is dispatched by
    fn name(&self) -> &'static str;
    /// Definition pushed to Discord when the connection becomes ready
    fn schema(&self) -> CreateCommand;
    /// Respond to an invocation.  The command is responsible for replying; if this returns an
    /// error, the caller tells the user something went wrong.
    async fn execute(&self, ctx: &Context<'_>, interaction: &dyn Interaction) -> Result<()>;
}

/// Ordered list of available commands
pub fn commands() -> Vec<Box<dyn Command>> {
    vec![
        Box::new(setstatus::SetStatus),
        Box::new(testjoin::TestJoin),
        Box::new(testleave::TestLeave),
    ]
}

impl Admit for dyn Command {
    fn admit(&self) -> Result<String, Rejection> {
        let name = self.name();
        if name.is_empty() {
            return Err(Rejection::EmptyName);
        }
        if !is_valid_name(name) {
            return Err(Rejection::InvalidName(name.to_owned()));
        }

        let schema_name = schema_name(&self.schema()).unwrap_or_default();
        if schema_name != name {
            return Err(Rejection::SchemaMismatch {
                name: name.to_owned(),
                schema_name,
            });
        }

        Ok(name.to_owned())
    }
}

// Discord accepts 1-32 lowercase letters, digits, `-` and `_` for chat input commands.
fn is_valid_name(name: &str) -> bool {
    name.chars().count() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c == '-' || c == '_' || (c.is_alphanumeric() && !c.is_uppercase()))
}

/// The builder keeps its fields private; its serialized form is what Discord receives anyway.
fn schema_name(schema: &CreateCommand) -> Option<String> {
    let value = serde_json::to_value(schema).ok()?;
    value.get("name")?.as_str().map(str::to_owned)
}

/// Run the listener for `kind` as if Discord had sent the event for the invoking member.
async fn simulate_member_event(
    ctx: &Context<'_>,
    interaction: &dyn Interaction,
    kind: EventKind,
    to_event: fn(Member) -> Event,
) -> Result<()> {
    interaction.defer(true).await?;

    let result = async {
        let member = interaction
            .member()
            .ok_or_else(|| anyhow!("command was not used inside a guild"))?;
        let listener = ctx
            .listeners
            .get(kind.name())
            .ok_or_else(|| anyhow!("no listener registered for {}", kind.name()))?;
        listener.execute(ctx, &to_event(member)).await
    }
    .await;

    let reply = match result {
        Ok(()) => format!("Simulated **{}** event successfully!", kind.name()),
        Err(e) => {
            error!("Error simulating {}: {:#}", kind.name(), e);
            format!(
                "Failed to simulate **{}** event. Check console for errors.",
                kind.name()
            )
        }
    };

    interaction.edit_reply(&reply).await
}
