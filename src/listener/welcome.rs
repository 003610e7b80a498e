use crate::listener::*;

/// Greets members joining a guild
pub struct Welcome;

#[async_trait]
impl Listener for Welcome {
    fn name(&self) -> &'static str {
        EventKind::GuildMemberAddition.name()
    }

    async fn execute(&self, ctx: &Context<'_>, event: &Event) -> Result<()> {
        let Event::GuildMemberAddition(member) = event else {
            return Ok(());
        };

        greet(ctx, Greetings::welcome, &member.user, member.display_name()).await
    }
}
