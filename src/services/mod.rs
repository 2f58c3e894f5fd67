//! Service layer for business logic
//!
//! Every service takes the shared store through its constructor.

mod access_logger;
mod account_service;
pub mod enrichment;
pub mod geoip;
mod link_service;
mod resolver;
pub mod slug;

pub use access_logger::{
    AccessLogger, DEFAULT_LOG_LIMIT, MAX_LOG_LIMIT, VisitContext, normalize_limit,
};
pub use account_service::{AccountService, LOGIN_FAILED_MESSAGE, SignupRequest};
pub use enrichment::{Browser, DeviceType, Os, UserAgentInfo, parse_user_agent};
pub use geoip::{GeoInfo, GeoIpLookup, GeoIpProvider};
pub use link_service::{CreateLinkRequest, LinkService};
pub use resolver::{LinkResolver, LogDispatch};
pub use slug::{RandomSlugSource, SLUG_ALPHABET, SlugGenerator, SlugSource};
