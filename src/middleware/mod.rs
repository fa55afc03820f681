/// Middleware module
///
/// Per-route access guards.

mod jwt_middleware;

pub use jwt_middleware::{Access, RequireAccess};
