pub mod access_log;
pub mod link;
pub mod user;

pub use access_log::Entity as AccessLogEntity;
pub use link::Entity as LinkEntity;
pub use user::Entity as UserEntity;
