//! Build-time-populated request routing.
//!
//! The route tables are filled once from declarative module registrations
//! and are read-only afterward; dispatch is a plain table lookup keyed by
//! the request's type identifier.

use std::collections::HashMap;

use blockloom_module_api::{
    Envelope, ExecContext, RawHandler, RouteTableKind, ServiceRegistrar,
};
use tracing::{debug, trace};

use crate::capability::CapabilityKind;
use crate::error::{Error, Result};
use crate::registry::ModuleRegistry;

struct RouteEntry {
    module: String,
    handler: RawHandler,
}

#[derive(Default)]
struct RouterBuilder {
    commands: HashMap<String, RouteEntry>,
    queries: HashMap<String, RouteEntry>,
    /// Module currently registering; set by `Router::build` before each
    /// `register_services` call so conflicts can name both claimants.
    module: String,
}

impl RouterBuilder {
    fn table_mut(&mut self, table: RouteTableKind) -> &mut HashMap<String, RouteEntry> {
        match table {
            RouteTableKind::Command => &mut self.commands,
            RouteTableKind::Query => &mut self.queries,
        }
    }
}

impl ServiceRegistrar for RouterBuilder {
    fn register_handler(
        &mut self,
        table: RouteTableKind,
        type_id: &str,
        handler: RawHandler,
    ) -> anyhow::Result<()> {
        let module = self.module.clone();
        let entries = self.table_mut(table);
        if let Some(existing) = entries.get(type_id) {
            return Err(Error::duplicate_route(table, type_id, &existing.module, &module).into());
        }
        debug!(
            target: "blockloom_runtime::router",
            module = %module,
            %table,
            type_id = %type_id,
            "route registered"
        );
        entries.insert(type_id.to_string(), RouteEntry { module, handler });
        Ok(())
    }
}

/// Immutable dispatch table from request type identifier to handler.
///
/// Commands and queries live in separate physical tables; the router
/// attaches no further semantics to the split. Dispatch is reentrant and
/// lock-free: the tables never change after `build`.
pub struct Router {
    commands: HashMap<String, RouteEntry>,
    queries: HashMap<String, RouteEntry>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("queries", &self.queries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Router {
    /// Collects service registrations from every module exposing Services,
    /// in registration order.
    ///
    /// Two modules claiming the same type identifier within one table fail
    /// the build.
    pub fn build(registry: &ModuleRegistry) -> Result<Self> {
        let mut builder = RouterBuilder::default();
        for (name, slot) in registry.modules_with(CapabilityKind::Services) {
            let Some(services) = slot.module.as_services() else {
                continue;
            };
            builder.module = name.to_string();
            services
                .register_services(&mut builder)
                .map_err(|cause| match cause.downcast::<Error>() {
                    Ok(error) => error,
                    Err(cause) => Error::registration(name, "services", cause),
                })?;
        }
        debug!(
            target: "blockloom_runtime::router",
            commands = builder.commands.len(),
            queries = builder.queries.len(),
            "router built"
        );
        Ok(Self {
            commands: builder.commands,
            queries: builder.queries,
        })
    }

    /// Resolves and invokes the handler for `type_id` in the given table.
    ///
    /// An unregistered identifier is a routing error; handler failures
    /// propagate tagged with the request type.
    pub fn route(
        &self,
        table: RouteTableKind,
        ctx: &ExecContext,
        type_id: &str,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        let entries = match table {
            RouteTableKind::Command => &self.commands,
            RouteTableKind::Query => &self.queries,
        };
        let Some(entry) = entries.get(type_id) else {
            return Err(Error::unknown_route(table, type_id));
        };
        trace!(
            target: "blockloom_runtime::router",
            module = %entry.module,
            %table,
            type_id = %type_id,
            "dispatch"
        );
        (entry.handler)(ctx, payload).map_err(|cause| Error::handler(type_id, cause))
    }

    pub fn route_command(
        &self,
        ctx: &ExecContext,
        type_id: &str,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        self.route(RouteTableKind::Command, ctx, type_id, payload)
    }

    pub fn route_query(&self, ctx: &ExecContext, type_id: &str, payload: &[u8]) -> Result<Vec<u8>> {
        self.route(RouteTableKind::Query, ctx, type_id, payload)
    }

    /// Dispatches a request envelope against the given table.
    pub fn route_envelope(
        &self,
        table: RouteTableKind,
        ctx: &ExecContext,
        request: &Envelope,
    ) -> Result<Vec<u8>> {
        self.route(table, ctx, &request.type_id, &request.payload)
    }

    pub fn has_route(&self, table: RouteTableKind, type_id: &str) -> bool {
        match table {
            RouteTableKind::Command => self.commands.contains_key(type_id),
            RouteTableKind::Query => self.queries.contains_key(type_id),
        }
    }

    /// Registered identifiers in the given table, sorted.
    pub fn type_ids(&self, table: RouteTableKind) -> Vec<&str> {
        let entries = match table {
            RouteTableKind::Command => &self.commands,
            RouteTableKind::Query => &self.queries,
        };
        let mut out: Vec<&str> = entries.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
