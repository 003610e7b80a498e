mod command;
mod config;
mod context;
mod event;
mod gateway;
mod handler;
mod listener;
mod logging;
mod persistent_state;
mod presence;
mod registry;
#[cfg(test)]
mod testing;

use crate::{persistent_state::StateFile, registry::Registry};
use log::warn;
use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    // Without a token and a guild there is nothing to do; bail out with a non-zero exit code.
    let cfg = crate::config::Config::from_env()?;

    let state_file = StateFile::new(&cfg.state_path);
    crate::log_internal!("Reading state from `{}`", state_file.path().display());
    let pstate = state_file.read().await;

    let commands = Registry::load("command", command::commands());
    let listeners = Registry::load("event", listener::listeners());
    if commands.is_empty() {
        warn!("No commands loaded, the bot will only react to events");
    }
    crate::log_internal!(
        "Loaded {} command(s) ({}) and {} event listener(s) ({})",
        commands.len(),
        commands.names().collect::<Vec<_>>().join(", "),
        listeners.len(),
        listeners.names().collect::<Vec<_>>().join(", "),
    );

    let handler = handler::Handler::new(commands, listeners, pstate, state_file, cfg.guild_id);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS;

    Client::builder(&cfg.discord_token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
