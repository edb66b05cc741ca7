pub mod dispatch;
pub mod invocation;
pub mod middleware;

pub use dispatch::CommandRouter;
pub use invocation::{InvocationRecord, InvocationStatus};
pub use middleware::{AuthGuard, DryRunMiddleware, LoggingMiddleware, Middleware};
