//! Reconciles the persisted tool catalog with what a backend reports.
//!
//! Registration and deregistration deliberately take separate paths:
//! registration sync never fails the caller and reports problems as
//! warnings, while teardown is all-or-nothing.

use crate::registry::{
    domain::{CatalogTool, McpServer, QualifiedToolName},
    ports::{
        McpCatalogError, McpCatalogRepository, McpCatalogResult, McpSession, McpSessionError,
    },
};
use mockable::Clock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Advisory problem encountered while cataloguing tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogSyncWarning {
    /// The backend could not list its tools.
    ListingFailed {
        /// Backend failure message.
        message: String,
    },
    /// The backend reported a tool the catalog cannot represent.
    ToolRejected {
        /// Tool name as reported.
        tool: String,
        /// Validation failure message.
        message: String,
    },
    /// A tool could not be inserted or updated.
    PersistFailed {
        /// Qualified tool name.
        tool: QualifiedToolName,
        /// Persistence failure message.
        message: String,
    },
    /// A stale tool could not be removed.
    RemoveFailed {
        /// Qualified tool name.
        tool: QualifiedToolName,
        /// Persistence failure message.
        message: String,
    },
}

impl fmt::Display for CatalogSyncWarning {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListingFailed { message } => write!(formatter, "tool listing failed: {message}"),
            Self::ToolRejected { tool, message } => {
                write!(formatter, "tool '{tool}' rejected: {message}")
            }
            Self::PersistFailed { tool, message } => {
                write!(formatter, "tool '{tool}' not persisted: {message}")
            }
            Self::RemoveFailed { tool, message } => {
                write!(formatter, "stale tool '{tool}' not removed: {message}")
            }
        }
    }
}

/// Outcome of a catalog synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSyncReport {
    /// Tools newly added to the catalog.
    pub added: Vec<QualifiedToolName>,
    /// Tools removed because the backend no longer offers them.
    pub removed: Vec<QualifiedToolName>,
    /// Advisory problems; none of them failed the pass.
    pub warnings: Vec<CatalogSyncWarning>,
}

impl CatalogSyncReport {
    /// Returns whether the pass completed without warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Drives catalog creation, refresh, and teardown for one server at a time.
#[derive(Clone)]
pub struct ToolCatalogSynchronizer<R, C>
where
    R: McpCatalogRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> ToolCatalogSynchronizer<R, C>
where
    R: McpCatalogRepository,
    C: Clock + Send + Sync,
{
    /// Creates a synchronizer over `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Catalogues every tool `session` reports for a freshly registered
    /// server, each enabled.
    ///
    /// Never fails: listing and persistence problems become warnings on the
    /// returned report and the tools catalogued so far are kept.
    pub async fn register_tools(
        &self,
        server: &McpServer,
        session: &dyn McpSession,
    ) -> CatalogSyncReport {
        let mut report = CatalogSyncReport::default();
        let definitions = match session.list_tools().await {
            Ok(definitions) => definitions,
            Err(err) => {
                warn!(server = %server.name(), error = %err, "tool discovery failed");
                report.warnings.push(CatalogSyncWarning::ListingFailed {
                    message: err.to_string(),
                });
                return report;
            }
        };

        for definition in definitions {
            let reported_name = definition.name().to_owned();
            match CatalogTool::discovered(server, definition, &*self.clock) {
                Ok(tool) => self.insert_reporting(&tool, &mut report).await,
                Err(err) => report.warnings.push(CatalogSyncWarning::ToolRejected {
                    tool: reported_name,
                    message: err.to_string(),
                }),
            }
        }

        info!(
            server = %server.name(),
            added = report.added.len(),
            warnings = report.warnings.len(),
            "catalogued tools"
        );
        report
    }

    /// Re-lists the backend's tools and reconciles the catalog with them.
    ///
    /// Tools still offered keep their enabled flag and pick up the latest
    /// description and schema; new tools are added enabled; tools no longer
    /// offered are removed. Per-tool persistence failures become warnings.
    ///
    /// # Errors
    ///
    /// Returns the session error when the backend cannot list its tools, or
    /// the repository error when the current catalog cannot be read.
    pub async fn refresh_tools(
        &self,
        server: &McpServer,
        session: &dyn McpSession,
    ) -> Result<CatalogSyncReport, RefreshError> {
        let definitions = session.list_tools().await.map_err(RefreshError::Listing)?;
        let mut existing: BTreeMap<String, CatalogTool> = self
            .repository
            .list_tools_for_server(server.name())
            .await
            .map_err(RefreshError::Catalog)?
            .into_iter()
            .map(|tool| (tool.name().to_owned(), tool))
            .collect();

        let mut report = CatalogSyncReport::default();
        for definition in definitions {
            let reported_name = definition.name().to_owned();
            let discovered = match CatalogTool::discovered(server, definition, &*self.clock) {
                Ok(tool) => tool,
                Err(err) => {
                    report.warnings.push(CatalogSyncWarning::ToolRejected {
                        tool: reported_name,
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            match existing.remove(&reported_name) {
                Some(mut current) => {
                    current.refresh_metadata(
                        discovered.description(),
                        discovered.input_schema(),
                        &*self.clock,
                    );
                    if let Err(err) = self.repository.update_tool(&current).await {
                        report.warnings.push(CatalogSyncWarning::PersistFailed {
                            tool: current.qualified_name().clone(),
                            message: err.to_string(),
                        });
                    }
                }
                None => self.insert_reporting(&discovered, &mut report).await,
            }
        }

        for stale in existing.into_values() {
            match self.repository.delete_tool(stale.id()).await {
                Ok(()) => report.removed.push(stale.qualified_name().clone()),
                Err(err) => report.warnings.push(CatalogSyncWarning::RemoveFailed {
                    tool: stale.qualified_name().clone(),
                    message: err.to_string(),
                }),
            }
        }

        info!(
            server = %server.name(),
            added = report.added.len(),
            removed = report.removed.len(),
            warnings = report.warnings.len(),
            "refreshed tool catalog"
        );
        Ok(report)
    }

    /// Removes every tool of `server`, then the server itself.
    ///
    /// The first tool that fails to delete aborts the teardown and leaves
    /// both the server and all of its tools in place.
    ///
    /// # Errors
    ///
    /// Returns the repository error that aborted the teardown.
    pub async fn tear_down(&self, server: &McpServer) -> McpCatalogResult<Vec<CatalogTool>> {
        let removed = self.repository.remove_server(server.id()).await?;
        info!(server = %server.name(), removed = removed.len(), "removed server and its tools");
        Ok(removed)
    }

    async fn insert_reporting(&self, tool: &CatalogTool, report: &mut CatalogSyncReport) {
        match self.repository.insert_tool(tool).await {
            Ok(()) => report.added.push(tool.qualified_name().clone()),
            Err(err) => {
                warn!(tool = %tool.qualified_name(), error = %err, "failed to catalogue tool");
                report.warnings.push(CatalogSyncWarning::PersistFailed {
                    tool: tool.qualified_name().clone(),
                    message: err.to_string(),
                });
            }
        }
    }
}

/// Failures that abort a catalog refresh before any change is made.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// The backend could not list its tools.
    #[error(transparent)]
    Listing(McpSessionError),
    /// The current catalog could not be read.
    #[error(transparent)]
    Catalog(McpCatalogError),
}
