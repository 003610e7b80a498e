use crate::{listener::*, log_event, logging::*};

/// Reports the connection once Discord has accepted us
pub struct Ready;

#[async_trait]
impl Listener for Ready {
    fn name(&self) -> &'static str {
        EventKind::Ready.name()
    }

    fn once(&self) -> bool {
        true
    }

    async fn execute(&self, _ctx: &Context<'_>, event: &Event) -> Result<()> {
        let Event::Ready(ready) = event else {
            return Ok(());
        };

        log_event!(
            "Ready! Logged in as {} (id {}), connected to {} server(s)",
            ready.user.color(),
            ready.user.id,
            ready.guilds.len(),
        );
        Ok(())
    }
}
