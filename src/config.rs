use serenity::all::GuildId;
use std::path::PathBuf;

const TOKEN_VAR: &str = "DISCORD_TOKEN";
const GUILD_VAR: &str = "GUILD_ID";
const STATE_PATH_VAR: &str = "GREETBOT_CONFIG";
const STATE_PATH_REL_HOME: &str = ".config/greetbot/config.json";

/// Settings the bot cannot start without
pub struct Config {
    pub discord_token: String,
    /// Guild the slash commands are registered in
    pub guild_id: GuildId,
    /// Location of the JSON document holding presence, permissions and greetings
    pub state_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    Missing(&'static str),
    #[error("environment variable `{var}` is not a valid id: `{value}`")]
    InvalidId { var: &'static str, value: String },
    #[error("could not find home directory, set `{0}` instead")]
    NoHome(&'static str),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| {
            lookup(var)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let discord_token = required(TOKEN_VAR)?;

        let guild = required(GUILD_VAR)?;
        let guild_id = match guild.parse::<u64>() {
            Ok(id) if id != 0 => GuildId::new(id),
            _ => {
                return Err(ConfigError::InvalidId {
                    var: GUILD_VAR,
                    value: guild,
                })
            }
        };

        let state_path = match lookup(STATE_PATH_VAR).filter(|p| !p.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => dirs::home_dir()
                .map(|p| p.join(STATE_PATH_REL_HOME))
                .ok_or(ConfigError::NoHome(STATE_PATH_VAR))?,
        };

        Ok(Self {
            discord_token,
            guild_id,
            state_path,
        })
    }
}
