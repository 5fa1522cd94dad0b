use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Identifies one mounted registration workflow instance.
///
/// Only used to correlate log records and state-change notifications; it is
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(String);

impl_id!(FlowId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_flow_ids_are_distinct() {
        assert_ne!(FlowId::new(), FlowId::new());
    }

    #[test]
    fn flow_id_from_str_round_trips_display() {
        let id = FlowId::from("flow-1");
        assert_eq!(id.to_string(), "flow-1");
        assert_eq!(id.as_str(), "flow-1");
    }
}
