//! Tool registry composition and dispatch.
//!
//! Independently written [`ToolProvider`]s are mounted into one
//! [`ToolRegistry`] namespace, optionally under a prefix, and the
//! [`Dispatcher`] routes `{qualifiedName, arguments}` calls to the owning
//! handler.

pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod execution_context;
pub mod provider;
pub mod registry;
pub mod schema;
pub mod traits;
pub mod wire;

pub use descriptor::{ToolDescriptor, ToolHandler};
pub use dispatcher::Dispatcher;
pub use error::{BulkFailure, BulkProgress, HandlerFailure, RemoteFailure, RemoteKind, ToolError};
pub use execution_context::ExecutionContext;
pub use provider::ToolProvider;
pub use registry::{qualify, MountInfo, ToolRegistry};
pub use schema::{Arguments, ParamType, ParameterSchema};
pub use traits::{AuditLogger, TracingAuditLogger};
pub use wire::{CatalogEntry, ErrorBody, InvocationRequest, InvocationResponse};
