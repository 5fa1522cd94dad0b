//! ID type wrappers for type safety.

mod id_macro;
pub mod flow_id;
pub mod uid;

pub use flow_id::FlowId;
pub use uid::Uid;
