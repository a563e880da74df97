//! Orchestration services for the catalog and tool invocation.

mod catalog;
mod gateway;

pub use catalog::{CatalogSyncReport, CatalogSyncWarning, RefreshError, ToolCatalogSynchronizer};
pub use gateway::{
    GatewayService, GatewayServiceError, GatewayServiceResult, GatewaySettings,
    RegisterServerRequest, ServerDeregistration, ServerRegistration, ToolInvocationRequest,
};
