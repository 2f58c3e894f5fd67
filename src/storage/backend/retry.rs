//! 瞬时数据库错误的重试
//!
//! 重定向路径上的点击计数和访问日志都是并发写，SQLite 下 BUSY/LOCKED
//! 很常见。约束冲突由调用方转换成 `SlugConflict` / `Conflict`，这里从不重试。

use std::future::Future;
use std::ops::Deref;
use std::time::Duration;

use rand::RngExt;
use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use tokio::time::sleep;
use tracing::{debug, warn};

/// MySQL 锁等待超时/死锁、PostgreSQL 序列化失败/死锁、SQLite BUSY/LOCKED 及其扩展码
const TRANSIENT_CODES: &[&str] = &[
    "1205", "1213", "40001", "40P01", "5", "6", "261", "262", "517", "773",
];

/// 驱动没给错误码时按消息匹配
const TRANSIENT_MESSAGES: &[&str] = &[
    "database is locked",
    "database table is locked",
    "deadlock",
    "lock wait timeout",
    "serialization failure",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 稍后重试可能成功
    Transient,
    /// 重试也不会变的结果，直接交给调用方
    Permanent,
}

pub fn classify(err: &DbErr) -> ErrorClass {
    // 唯一键、外键冲突
    if err.sql_err().is_some() {
        return ErrorClass::Permanent;
    }

    let transient = match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(runtime) | DbErr::Query(runtime) => runtime_is_transient(runtime),
        _ => false,
    };

    if transient {
        ErrorClass::Transient
    } else {
        ErrorClass::Permanent
    }
}

fn runtime_is_transient(err: &RuntimeErr) -> bool {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            let code = sqlx_err
                .deref()
                .as_database_error()
                .and_then(|db_err| db_err.code().map(|c| c.into_owned()));
            match code {
                Some(code) => TRANSIENT_CODES.contains(&code.as_str()),
                None => message_is_transient(&sqlx_err.to_string()),
            }
        }
        RuntimeErr::Internal(msg) => message_is_transient(msg),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

fn message_is_transient(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    TRANSIENT_MESSAGES.iter().any(|needle| msg.contains(needle))
}

/// 重试次数与退避窗口，来自 `[database]` 配置
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    /// 第 `retry` 次重试前的等待时间（从 1 开始）。
    ///
    /// 窗口为 `base * 2^(retry-1)`，封顶 `max_delay_ms`；实际等待取窗口后半段的随机值，
    /// 所以永远不会超过 `max_delay_ms`。
    pub fn delay_for(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(32);
        let window = self
            .base_delay_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_delay_ms);
        let floor = window / 2;
        Duration::from_millis(rand::rng().random_range(floor..=window))
    }
}

/// Run `attempt` until it succeeds, fails permanently, or the retry budget
/// is spent. `op` only labels the log lines.
pub async fn with_retry<T, F, Fut>(
    op: &str,
    config: RetryConfig,
    mut attempt: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut retries = 0;
    loop {
        let err = match attempt().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("{} recovered after {} retries", op, retries);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if classify(&err) == ErrorClass::Permanent {
            return Err(err);
        }
        if retries >= config.max_retries {
            warn!("{} still failing after {} retries: {}", op, retries, err);
            return Err(err);
        }

        retries += 1;
        let delay = config.delay_for(retries);
        warn!(
            "{} hit a transient error, retry {}/{} in {:?}: {}",
            op, retries, config.max_retries, delay, err
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::error::ConnAcquireErr;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn exec_err(msg: &str) -> DbErr {
        DbErr::Exec(RuntimeErr::Internal(msg.to_string()))
    }

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 2,
            max_delay_ms: 10,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(&DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)),
            ErrorClass::Transient
        );
        assert_eq!(classify(&exec_err("database is locked")), ErrorClass::Transient);
        assert_eq!(
            classify(&DbErr::Query(RuntimeErr::Internal(
                "Deadlock found when trying to get lock".to_string()
            ))),
            ErrorClass::Transient
        );

        assert_eq!(
            classify(&exec_err("UNIQUE constraint failed: links.slug")),
            ErrorClass::Permanent
        );
        assert_eq!(
            classify(&DbErr::RecordNotFound("nope".to_string())),
            ErrorClass::Permanent
        );
    }

    #[test]
    fn test_delay_stays_inside_window() {
        let config = RetryConfig::default();
        for _ in 0..50 {
            let first = config.delay_for(1).as_millis() as u64;
            assert!((50..=100).contains(&first));

            let third = config.delay_for(3).as_millis() as u64;
            assert!((200..=400).contains(&third));

            // 远超上限的次数也不会溢出或超出 max_delay_ms
            let late = config.delay_for(200).as_millis() as u64;
            assert!((1000..=2000).contains(&late));
        }
    }

    #[tokio::test]
    async fn test_recovers_after_busy() {
        let calls = AtomicU32::new(0);

        let result = with_retry("increment_clicks(x)", fast(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(exec_err("database is locked"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let calls = AtomicU32::new(0);

        let result = with_retry("sweep_expired", fast(2), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_budget_runs_once() {
        let calls = AtomicU32::new(0);

        let result = with_retry("create_link(abc)", fast(0), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(exec_err("database is locked")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);

        let result = with_retry("create_link(abc)", fast(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(exec_err("UNIQUE constraint failed: links.slug")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
