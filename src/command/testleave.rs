use crate::command::*;

/// Runs the member leave listener for the invoking member
pub struct TestLeave;

#[async_trait]
impl Command for TestLeave {
    fn name(&self) -> &'static str {
        "testleave"
    }

    fn schema(&self) -> CreateCommand {
        CreateCommand::new(self.name()).description("Simulates a user leaving the server.")
    }

    async fn execute(&self, ctx: &Context<'_>, interaction: &dyn Interaction) -> Result<()> {
        simulate_member_event(
            ctx,
            interaction,
            EventKind::GuildMemberRemoval,
            |member| Event::GuildMemberRemoval {
                user: member.user.clone(),
                member: Some(member),
            },
        )
        .await
    }
}
