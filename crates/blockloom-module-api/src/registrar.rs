use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::context::ExecContext;
use crate::envelope::TypedMessage;

/// Type-erased request handler stored in a route table.
pub type RawHandler = Box<dyn Fn(&ExecContext, &[u8]) -> Result<Vec<u8>> + Send + Sync>;

/// Type-erased forward-migration handler.
pub type MigrationHandler = Box<dyn Fn(&ExecContext) -> Result<()> + Send + Sync>;

/// Which physical route table a handler is registered into.
///
/// The runtime attaches no semantics beyond table selection; callers decide
/// which table to dispatch against at their own trust boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTableKind {
    Command,
    Query,
}

impl fmt::Display for RouteTableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Query => f.write_str("query"),
        }
    }
}

/// Object-safe registration surface handed to [`HasServices`] modules.
///
/// Most modules use the typed helpers on [`ServiceRegistrarExt`] instead of
/// registering erased handlers directly.
///
/// [`HasServices`]: crate::HasServices
pub trait ServiceRegistrar {
    /// Registers an erased handler under `type_id` in the given table.
    ///
    /// A `type_id` already claimed in that table is a registration error.
    fn register_handler(
        &mut self,
        table: RouteTableKind,
        type_id: &str,
        handler: RawHandler,
    ) -> Result<()>;
}

/// Typed registration helpers layered over any [`ServiceRegistrar`].
///
/// The constructed dispatch entry decodes the opaque payload into `Req`,
/// invokes the module handler, and re-encodes `Res` for the response
/// envelope, so dispatch never inspects payloads reflectively.
pub trait ServiceRegistrarExt: ServiceRegistrar {
    fn register_command<Req, Res, F>(&mut self, handler: F) -> Result<()>
    where
        Req: TypedMessage,
        Res: TypedMessage,
        F: Fn(&ExecContext, Req) -> Result<Res> + Send + Sync + 'static,
    {
        self.register_handler(RouteTableKind::Command, Req::TYPE_ID, erase(handler))
    }

    fn register_query<Req, Res, F>(&mut self, handler: F) -> Result<()>
    where
        Req: TypedMessage,
        Res: TypedMessage,
        F: Fn(&ExecContext, Req) -> Result<Res> + Send + Sync + 'static,
    {
        self.register_handler(RouteTableKind::Query, Req::TYPE_ID, erase(handler))
    }
}

impl<R: ServiceRegistrar + ?Sized> ServiceRegistrarExt for R {}

fn erase<Req, Res, F>(handler: F) -> RawHandler
where
    Req: TypedMessage,
    Res: TypedMessage,
    F: Fn(&ExecContext, Req) -> Result<Res> + Send + Sync + 'static,
{
    Box::new(move |ctx, payload| {
        let request = Req::decode(payload)?;
        let response = handler(ctx, request)?;
        response.encode()
    })
}

/// Registration surface handed to [`HasMigrations`] modules, scoped to the
/// registering module by the runtime.
///
/// [`HasMigrations`]: crate::HasMigrations
pub trait MigrationRegistrar {
    /// Registers the forward migration applied when the module's recorded
    /// version equals `from_version`.
    ///
    /// Registering the same `from_version` twice is a registration error.
    fn register(&mut self, from_version: u64, handler: MigrationHandler) -> Result<()>;
}
