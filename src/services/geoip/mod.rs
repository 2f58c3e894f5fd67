//! IP 地理位置查询
//!
//! 访问日志用它补充 country / city，查询失败时字段留空。

mod external_api;
mod provider;

pub use external_api::ExternalApiProvider;
pub use provider::{DisabledProvider, GeoInfo, GeoIpLookup, GeoIpProvider};
