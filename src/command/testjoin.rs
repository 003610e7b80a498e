use crate::command::*;

/// Runs the member join listener for the invoking member
pub struct TestJoin;

#[async_trait]
impl Command for TestJoin {
    fn name(&self) -> &'static str {
        "testjoin"
    }

    fn schema(&self) -> CreateCommand {
        CreateCommand::new(self.name()).description("Simulates a user joining the server.")
    }

    async fn execute(&self, ctx: &Context<'_>, interaction: &dyn Interaction) -> Result<()> {
        simulate_member_event(
            ctx,
            interaction,
            EventKind::GuildMemberAddition,
            Event::GuildMemberAddition,
        )
        .await
    }
}
