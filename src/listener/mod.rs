use crate::{
    context::Context,
    event::{Event, EventKind},
    persistent_state::Greetings,
    registry::{Admit, Rejection},
};
use anyhow::Result;
use log::debug;
use serenity::all::{Mentionable, User};
use serenity::async_trait;

mod farewell;
mod ready;
mod welcome;

#[async_trait]
pub trait Listener: Sync + Send {
    /// Name of the event this listener is run for, see [`EventKind::name`]
    fn name(&self) -> &'static str;
    /// Only run for the first occurrence of the event
    fn once(&self) -> bool {
        false
    }
    async fn execute(&self, ctx: &Context<'_>, event: &Event) -> Result<()>;
}

/// List of available event listeners
pub fn listeners() -> Vec<Box<dyn Listener>> {
    vec![
        Box::new(ready::Ready),
        Box::new(welcome::Welcome),
        Box::new(farewell::Farewell),
    ]
}

impl Admit for dyn Listener {
    fn admit(&self) -> Result<String, Rejection> {
        match self.name() {
            "" => Err(Rejection::EmptyName),
            name => EventKind::from_name(name)
                .map(|kind| kind.name().to_owned())
                .ok_or_else(|| Rejection::UnknownEvent(name.to_owned())),
        }
    }
}

/// Substitute `{user}` with a mention and `{name}` with the display name.
pub fn render_greeting(template: &str, mention: &str, name: &str) -> String {
    template.replace("{user}", mention).replace("{name}", name)
}

/// Post a greeting for `user` in the configured channel, if there is one.
async fn greet(
    ctx: &Context<'_>,
    template: fn(&Greetings) -> &str,
    user: &User,
    display_name: &str,
) -> Result<()> {
    let (channel_id, content) = {
        let pstate = ctx.pstate.read().await;
        let Some(channel_id) = pstate.greetings.channel() else {
            debug!("No greetings channel configured, not greeting {}", user.tag());
            return Ok(());
        };
        let mention = user.id.mention().to_string();
        let content = render_greeting(template(&pstate.greetings), &mention, display_name);
        (channel_id, content)
    };

    ctx.gateway.send_message(channel_id, content).await
}
