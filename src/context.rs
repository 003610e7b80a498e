use crate::{
    gateway::Gateway, listener::Listener, persistent_state::PersistentState,
    persistent_state::StateFile, registry::Registry,
};
use tokio::sync::RwLock;

/// Collection of data that is shared across events
pub struct Context<'a> {
    // Greetbot's own state
    pub pstate: &'a RwLock<PersistentState>,
    pub state_file: &'a StateFile,
    pub listeners: &'a Registry<dyn Listener>,
    // Discord side
    pub gateway: &'a dyn Gateway,
}
