use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum LinktrailError {
    NotFound(String),
    Gone(String),
    Forbidden(String),
    Unauthorized(String),
    Conflict(String),
    /// 插入时 slug 已被占用（check 与 insert 之间被抢占），可重试
    SlugConflict(String),
    InvalidInput(String),
    GenerationExhausted(String),
    ServiceUnavailable(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
}

impl LinktrailError {
    /// 错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LinktrailError::NotFound(_) => "E001",
            LinktrailError::Gone(_) => "E002",
            LinktrailError::Forbidden(_) => "E003",
            LinktrailError::Unauthorized(_) => "E004",
            LinktrailError::Conflict(_) => "E005",
            LinktrailError::SlugConflict(_) => "E006",
            LinktrailError::InvalidInput(_) => "E007",
            LinktrailError::GenerationExhausted(_) => "E008",
            LinktrailError::ServiceUnavailable(_) => "E009",
            LinktrailError::DatabaseConfig(_) => "E010",
            LinktrailError::DatabaseConnection(_) => "E011",
        }
    }

    /// 错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LinktrailError::NotFound(_) => "Resource Not Found",
            LinktrailError::Gone(_) => "Resource Gone",
            LinktrailError::Forbidden(_) => "Forbidden",
            LinktrailError::Unauthorized(_) => "Unauthorized",
            LinktrailError::Conflict(_) => "Conflict",
            LinktrailError::SlugConflict(_) => "Slug Conflict",
            LinktrailError::InvalidInput(_) => "Invalid Input",
            LinktrailError::GenerationExhausted(_) => "Slug Generation Exhausted",
            LinktrailError::ServiceUnavailable(_) => "Service Unavailable",
            LinktrailError::DatabaseConfig(_) => "Database Configuration Error",
            LinktrailError::DatabaseConnection(_) => "Database Connection Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            LinktrailError::NotFound(msg)
            | LinktrailError::Gone(msg)
            | LinktrailError::Forbidden(msg)
            | LinktrailError::Unauthorized(msg)
            | LinktrailError::Conflict(msg)
            | LinktrailError::SlugConflict(msg)
            | LinktrailError::InvalidInput(msg)
            | LinktrailError::GenerationExhausted(msg)
            | LinktrailError::ServiceUnavailable(msg)
            | LinktrailError::DatabaseConfig(msg)
            | LinktrailError::DatabaseConnection(msg) => msg,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            LinktrailError::NotFound(_) => StatusCode::NOT_FOUND,
            LinktrailError::Gone(_) => StatusCode::GONE,
            LinktrailError::Forbidden(_) => StatusCode::FORBIDDEN,
            LinktrailError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            LinktrailError::Conflict(_) | LinktrailError::SlugConflict(_) => StatusCode::CONFLICT,
            LinktrailError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LinktrailError::GenerationExhausted(_) | LinktrailError::DatabaseConfig(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            LinktrailError::ServiceUnavailable(_) | LinktrailError::DatabaseConnection(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// 创建链接时可以整体重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, LinktrailError::SlugConflict(_))
    }

    /// 彩色输出（用于启动失败时打印到终端）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LinktrailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LinktrailError {}

// 便捷的构造函数
impl LinktrailError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LinktrailError::NotFound(msg.into())
    }

    pub fn gone<T: Into<String>>(msg: T) -> Self {
        LinktrailError::Gone(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        LinktrailError::Forbidden(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        LinktrailError::Unauthorized(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        LinktrailError::Conflict(msg.into())
    }

    pub fn slug_conflict<T: Into<String>>(msg: T) -> Self {
        LinktrailError::SlugConflict(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        LinktrailError::InvalidInput(msg.into())
    }

    pub fn generation_exhausted<T: Into<String>>(msg: T) -> Self {
        LinktrailError::GenerationExhausted(msg.into())
    }

    pub fn service_unavailable<T: Into<String>>(msg: T) -> Self {
        LinktrailError::ServiceUnavailable(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinktrailError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinktrailError::DatabaseConnection(msg.into())
    }
}

impl From<sea_orm::DbErr> for LinktrailError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::{DbErr, SqlErr};

        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                return LinktrailError::Conflict(detail);
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                return LinktrailError::InvalidInput(detail);
            }
            _ => {}
        }
        match err {
            DbErr::RecordNotFound(msg) => LinktrailError::NotFound(msg),
            other => LinktrailError::ServiceUnavailable(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for LinktrailError {
    fn from(err: serde_json::Error) -> Self {
        LinktrailError::InvalidInput(err.to_string())
    }
}

impl actix_web::ResponseError for LinktrailError {
    fn status_code(&self) -> StatusCode {
        self.http_status()
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        crate::api::error_response(self)
    }
}

pub type Result<T> = std::result::Result<T, LinktrailError>;
