pub mod guard;
mod middleware;
mod public;

pub use guard::{GuardDecision, GuardRoutes, LocaleGuard, evaluate};
pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use public::{DEFAULT_REVALIDATE, HttpOptions, HttpState, build_router};
