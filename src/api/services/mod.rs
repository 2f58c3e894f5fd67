pub mod accounts;
pub mod health;
pub mod links;
pub mod logs;
pub mod redirect;

pub use accounts::{AccountRoutes, AuthRateLimit, account_routes, auth_rate_limit};
pub use health::{HealthService, health_routes};
pub use links::{LinkRoutes, link_routes};
pub use logs::{LogRoutes, log_routes};
pub use redirect::{RedirectService, redirect_routes};
