pub mod gateway;
pub mod service;
pub mod variables;

pub use gateway::{GatewayError, GatewayOperation, InMemoryTaskGateway, TaskAssignmentGateway};
pub use service::{ApprovalTaskService, ServiceError};
pub use variables::{
    completion_variables, delegation_from_variables, delegation_variables, routing_variables,
    undelegated_completion_variables, VariableError,
};
