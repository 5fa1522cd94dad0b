use async_trait::async_trait;
use ch_core::ports::RegistrationEventPort;
use ch_core::{FlowId, RegistrationState};
use tracing::info;

/// Publishes state changes to the log.
pub struct TracingEventPort;

#[async_trait]
impl RegistrationEventPort for TracingEventPort {
    async fn emit_state_changed(&self, flow_id: &FlowId, state: &RegistrationState) {
        match state.error() {
            Some(error) => info!(%flow_id, phase = state.phase(), %error, "registration state changed"),
            None => info!(%flow_id, phase = state.phase(), "registration state changed"),
        }
    }
}
