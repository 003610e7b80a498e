use crate::{
    command::Command,
    context::Context,
    event::Event,
    gateway::{Gateway, Interaction, SlashCommand},
    listener::Listener,
    log_event, log_internal,
    logging::PrintColor,
    persistent_state::{PersistentState, StateFile},
    presence::Presence,
    registry::Registry,
};
use log::{debug, error, warn};
use serenity::all::{CommandType, CreateCommand, GuildId, Member, Ready, User};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

pub const EXECUTION_FAILED: &str = "There was an error while executing this command!";

/// What became of an interaction
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatched {
    /// No command with that name is registered
    Unknown,
    Handled,
    /// The command failed and the user was told so
    Failed,
}

/// Discord event handler
pub struct Handler {
    commands: Registry<dyn Command>,
    listeners: Registry<dyn Listener>,
    pstate: RwLock<PersistentState>,
    state_file: StateFile,
    guild_id: GuildId,
    ready: AtomicBool,
}

impl<'a> Handler {
    pub fn new(
        commands: Registry<dyn Command>,
        listeners: Registry<dyn Listener>,
        pstate: PersistentState,
        state_file: StateFile,
        guild_id: GuildId,
    ) -> Self {
        Self {
            commands,
            listeners,
            pstate: RwLock::new(pstate),
            state_file,
            guild_id,
            ready: AtomicBool::new(false),
        }
    }

    fn ctx(&'a self, gateway: &'a dyn Gateway) -> Context<'a> {
        Context {
            pstate: &self.pstate,
            state_file: &self.state_file,
            listeners: &self.listeners,
            gateway,
        }
    }

    /// First connection: apply the stored presence and push the command schemas.  Later ready
    /// events (new gateway sessions) are ignored.
    pub async fn on_ready(&self, gateway: &dyn Gateway) {
        if self.ready.swap(true, Ordering::SeqCst) {
            debug!("Ready fired again, presence and commands already set up");
            return;
        }

        let presence = Presence::resolve(&self.pstate.read().await.bot_presence);
        log_internal!(
            "Setting status to {} with {}",
            presence.status,
            match &presence.activity {
                Some(activity) => format!("activity {:?} \"{}\"", activity.kind, activity.name),
                None => "no activity".to_owned(),
            }
        );
        gateway.apply_presence(presence.activity, presence.status);

        self.register_commands(gateway).await;
    }

    async fn register_commands(&self, gateway: &dyn Gateway) {
        let schemas: Vec<CreateCommand> = self.commands.iter().map(|c| c.schema()).collect();

        log_internal!(
            "Started refreshing {} application (/) commands.",
            schemas.len()
        );

        match gateway
            .register_guild_commands(self.guild_id, schemas)
            .await
        {
            Ok(count) => log_internal!(
                "Successfully reloaded {} application (/) commands in guild {}.",
                count,
                self.guild_id.color(),
            ),
            Err(e) => error!(
                "Could not register commands in guild {}: {:#}",
                self.guild_id, e
            ),
        }
    }

    /// Route a slash command to its handler.  On failure the user gets exactly one error message.
    pub async fn on_interaction(
        &self,
        gateway: &dyn Gateway,
        interaction: &dyn Interaction,
    ) -> Dispatched {
        let name = interaction.command_name();
        let Some(command) = self.commands.get(&name) else {
            error!("No command matching {} was found.", name);
            return Dispatched::Unknown;
        };

        log_event!("{} used /{}", interaction.user_tag(), name);

        let Err(e) = command.execute(&self.ctx(gateway), interaction).await else {
            return Dispatched::Handled;
        };

        error!("Error in command {}: {:#}", name, e);

        let reported = if interaction.is_acknowledged() {
            interaction.follow_up(EXECUTION_FAILED, true).await
        } else {
            interaction.reply(EXECUTION_FAILED, true).await
        };
        if let Err(e) = reported {
            error!("Could not report failure of command {}: {:#}", name, e);
        }

        Dispatched::Failed
    }

    /// Run the listener registered for the event, if any.  Returns whether a listener ran.
    pub async fn on_event(&self, gateway: &dyn Gateway, event: Event) -> bool {
        let Some(entry) = self.listeners.entry(event.name()) else {
            return false;
        };

        let listener = entry.handler();
        if listener.once() && !entry.fire() {
            debug!("Listener for {} already ran once, skipping", event.name());
            return false;
        }

        if let Err(e) = listener.execute(&self.ctx(gateway), &event).await {
            warn!("Error in listener for {}: {:#}", event.name(), e);
        }
        true
    }
}

/// Only slash commands are dispatched, context menu commands are not.
fn is_dispatched(kind: CommandType) -> bool {
    kind == CommandType::ChatInput
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, discord_ctx: serenity::all::Context, ready: Ready) {
        self.on_ready(&discord_ctx).await;
        self.on_event(&discord_ctx, Event::Ready(Box::new(ready)))
            .await;
    }

    async fn interaction_create(
        &self,
        discord_ctx: serenity::all::Context,
        interaction: serenity::all::Interaction,
    ) {
        let serenity::all::Interaction::Command(command) = interaction else {
            return;
        };
        if !is_dispatched(command.data.kind) {
            debug!("Ignoring {:?} command {}", command.data.kind, command.data.name);
            return;
        }

        let interaction = SlashCommand::new(&discord_ctx, &command);
        self.on_interaction(&discord_ctx, &interaction).await;
    }

    async fn guild_member_addition(&self, discord_ctx: serenity::all::Context, new_member: Member) {
        log_event!("{} joined {}", new_member.user.color(), new_member.guild_id.color());
        self.on_event(&discord_ctx, Event::GuildMemberAddition(new_member))
            .await;
    }

    async fn guild_member_removal(
        &self,
        discord_ctx: serenity::all::Context,
        guild_id: GuildId,
        user: User,
        member_data_if_available: Option<Member>,
    ) {
        log_event!("{} left {}", user.color(), guild_id.color());
        self.on_event(
            &discord_ctx,
            Event::GuildMemberRemoval {
                user,
                member: member_data_if_available,
            },
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::tests::Named;
    use crate::gateway::{MockGateway, MockInteraction};
    use crate::presence::{Activity, ActivityKind, PresenceStatus};
    use anyhow::{anyhow, Result};
    use mockall::predicate::eq;
    use serenity::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Replies or defers as told, then fails
    struct Failing {
        defer_first: bool,
    }

    #[async_trait]
    impl Command for Failing {
        fn name(&self) -> &'static str {
            "fail"
        }

        fn schema(&self) -> CreateCommand {
            CreateCommand::new("fail").description("always fails")
        }

        async fn execute(&self, _ctx: &Context<'_>, interaction: &dyn Interaction) -> Result<()> {
            if self.defer_first {
                interaction.defer(true).await?;
            }
            Err(anyhow!("boom"))
        }
    }

    struct Counting {
        name: &'static str,
        once: bool,
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Listener for Counting {
        fn name(&self) -> &'static str {
            self.name
        }

        fn once(&self) -> bool {
            self.once
        }

        async fn execute(&self, _ctx: &Context<'_>, _event: &Event) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("listeners may fail"))
        }
    }

    struct Harness {
        handler: Handler,
        _dir: TempDir,
    }

    fn harness(
        doc: &str,
        commands: Vec<Box<dyn Command>>,
        listeners: Vec<Box<dyn Listener>>,
    ) -> Harness {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, doc).unwrap();

        let handler = Handler::new(
            Registry::load("command", commands),
            Registry::load("event", listeners),
            serde_json::from_str(doc).unwrap(),
            StateFile::new(path),
            GuildId::new(99),
        );
        Harness { handler, _dir: dir }
    }

    fn interaction(name: &str) -> MockInteraction {
        let name = name.to_owned();
        let mut interaction = MockInteraction::new();
        interaction.expect_command_name().return_const(name);
        interaction
            .expect_user_tag()
            .return_const("alice#0001".to_owned());
        interaction
    }

    #[tokio::test]
    async fn test_ready_applies_idle_and_clears_activity() {
        let h = harness(r#"{ "bot_presence": { "status": "idle" } }"#, vec![], vec![]);

        let mut gateway = MockGateway::new();
        gateway
            .expect_apply_presence()
            .with(eq(None::<Activity>), eq(PresenceStatus::Idle))
            .times(1)
            .return_const(());
        gateway
            .expect_register_guild_commands()
            .returning(|_, commands| Ok(commands.len()));

        h.handler.on_ready(&gateway).await;
    }

    #[tokio::test]
    async fn test_ready_applies_activity() {
        let h = harness(
            r#"{ "bot_presence": { "activity": { "name": "the door", "type": "watching" } } }"#,
            vec![],
            vec![],
        );

        let mut gateway = MockGateway::new();
        gateway
            .expect_apply_presence()
            .with(
                eq(Some(Activity {
                    name: "the door".to_owned(),
                    kind: ActivityKind::Watching,
                    url: None,
                })),
                eq(PresenceStatus::Online),
            )
            .times(1)
            .return_const(());
        gateway
            .expect_register_guild_commands()
            .returning(|_, commands| Ok(commands.len()));

        h.handler.on_ready(&gateway).await;
    }

    #[tokio::test]
    async fn test_ready_registers_all_commands_in_guild_once() {
        let h = harness(
            "{}",
            vec![
                Box::new(Named("ping", "ping")),
                Box::new(Named("pong", "pong")),
            ],
            vec![],
        );

        let mut gateway = MockGateway::new();
        gateway.expect_apply_presence().times(1).return_const(());
        gateway
            .expect_register_guild_commands()
            .withf(|guild_id, commands| *guild_id == GuildId::new(99) && commands.len() == 2)
            .times(1)
            .returning(|_, commands| Ok(commands.len()));

        h.handler.on_ready(&gateway).await;
        h.handler.on_ready(&gateway).await;
    }

    #[tokio::test]
    async fn test_registration_failure_is_not_fatal() {
        let h = harness("{}", vec![Box::new(Named("ping", "ping"))], vec![]);

        let mut gateway = MockGateway::new();
        gateway.expect_apply_presence().return_const(());
        gateway
            .expect_register_guild_commands()
            .times(1)
            .returning(|_, _| Err(anyhow!("missing access")));

        h.handler.on_ready(&gateway).await;

        // Still serving commands afterwards
        let interaction = interaction("ping");
        assert_eq!(
            h.handler.on_interaction(&gateway, &interaction).await,
            Dispatched::Handled
        );
    }

    #[tokio::test]
    async fn test_unknown_command_is_dropped() {
        let h = harness("{}", vec![Box::new(Named("ping", "ping"))], vec![]);
        let gateway = MockGateway::new();

        let mut interaction = interaction("nope");
        interaction.expect_reply().never();
        interaction.expect_follow_up().never();

        assert_eq!(
            h.handler.on_interaction(&gateway, &interaction).await,
            Dispatched::Unknown
        );
    }

    #[tokio::test]
    async fn test_success_sends_no_implicit_reply() {
        let h = harness("{}", vec![Box::new(Named("ping", "ping"))], vec![]);
        let gateway = MockGateway::new();

        let mut interaction = interaction("ping");
        interaction.expect_reply().never();
        interaction.expect_follow_up().never();

        assert_eq!(
            h.handler.on_interaction(&gateway, &interaction).await,
            Dispatched::Handled
        );
    }

    #[tokio::test]
    async fn test_failure_before_acknowledging_replies_once() {
        let h = harness("{}", vec![Box::new(Failing { defer_first: false })], vec![]);
        let gateway = MockGateway::new();

        let mut interaction = interaction("fail");
        interaction.expect_is_acknowledged().return_const(false);
        interaction
            .expect_reply()
            .withf(|content, ephemeral| content == EXECUTION_FAILED && *ephemeral)
            .times(1)
            .returning(|_, _| Ok(()));
        interaction.expect_follow_up().never();

        assert_eq!(
            h.handler.on_interaction(&gateway, &interaction).await,
            Dispatched::Failed
        );
    }

    #[tokio::test]
    async fn test_failure_after_deferring_follows_up_once() {
        let h = harness("{}", vec![Box::new(Failing { defer_first: true })], vec![]);
        let gateway = MockGateway::new();

        let mut interaction = interaction("fail");
        interaction.expect_defer().times(1).returning(|_| Ok(()));
        interaction.expect_is_acknowledged().return_const(true);
        interaction.expect_reply().never();
        interaction
            .expect_follow_up()
            .withf(|content, ephemeral| content == EXECUTION_FAILED && *ephemeral)
            .times(1)
            .returning(|_, _| Ok(()));

        assert_eq!(
            h.handler.on_interaction(&gateway, &interaction).await,
            Dispatched::Failed
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_serving_next_interaction() {
        let h = harness(
            "{}",
            vec![
                Box::new(Failing { defer_first: false }),
                Box::new(Named("ping", "ping")),
            ],
            vec![],
        );
        let gateway = MockGateway::new();

        let mut failing = interaction("fail");
        failing.expect_is_acknowledged().return_const(false);
        failing
            .expect_reply()
            .times(1)
            .returning(|_, _| Err(anyhow!("interaction expired")));
        assert_eq!(
            h.handler.on_interaction(&gateway, &failing).await,
            Dispatched::Failed
        );

        let ping = interaction("ping");
        assert_eq!(
            h.handler.on_interaction(&gateway, &ping).await,
            Dispatched::Handled
        );
    }

    #[test]
    fn test_only_slash_commands_are_dispatched() {
        assert!(is_dispatched(CommandType::ChatInput));
        assert!(!is_dispatched(CommandType::User));
        assert!(!is_dispatched(CommandType::Message));
    }

    fn member_left() -> Event {
        Event::GuildMemberRemoval {
            user: crate::testing::user(1, "alice"),
            member: None,
        }
    }

    fn counting(name: &'static str, once: bool) -> (Harness, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let listener = Counting {
            name,
            once,
            runs: runs.clone(),
        };
        (harness("{}", vec![], vec![Box::new(listener)]), runs)
    }

    #[tokio::test]
    async fn test_event_without_listener_is_ignored() {
        let (h, runs) = counting("guild_member_addition", false);
        let gateway = MockGateway::new();

        assert!(!h.handler.on_event(&gateway, member_left()).await);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_listener_runs_on_every_occurrence() {
        let (h, runs) = counting("guild_member_removal", false);
        let gateway = MockGateway::new();

        assert!(h.handler.on_event(&gateway, member_left()).await);
        assert!(h.handler.on_event(&gateway, member_left()).await);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_once_listener_runs_once() {
        let (h, runs) = counting("guild_member_removal", true);
        let gateway = MockGateway::new();

        assert!(h.handler.on_event(&gateway, member_left()).await);
        assert!(!h.handler.on_event(&gateway, member_left()).await);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
