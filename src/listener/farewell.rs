use crate::listener::*;

/// Says goodbye to members leaving a guild
pub struct Farewell;

#[async_trait]
impl Listener for Farewell {
    fn name(&self) -> &'static str {
        EventKind::GuildMemberRemoval.name()
    }

    async fn execute(&self, ctx: &Context<'_>, event: &Event) -> Result<()> {
        let Event::GuildMemberRemoval { user, member, .. } = event else {
            return Ok(());
        };

        // The member is only known if it was cached before it left.
        let display_name = member
            .as_ref()
            .map(|member| member.display_name())
            .unwrap_or_else(|| user.display_name());

        greet(ctx, Greetings::farewell, user, display_name).await
    }
}
