//! Command catalog. Each module declares its operations and how they mount
//! into the registry.
pub mod configure;
pub mod create;
pub mod gateway;
pub mod identity;
pub mod memory;
pub mod observability;
pub mod operation;
pub mod runtime;

pub use configure::ConfigureShowHandler;
pub use gateway::GatewayHandlers;
pub use operation::{Operation, OperationHandler};
pub use runtime::DevHandler;
