use crate::ids::FlowId;
use crate::registration::RegistrationState;

#[async_trait::async_trait]
pub trait RegistrationEventPort: Send + Sync {
    async fn emit_state_changed(&self, flow_id: &FlowId, state: &RegistrationState);
}
