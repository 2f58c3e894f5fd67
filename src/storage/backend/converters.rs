use chrono::Utc;

use crate::storage::{AccessLogEntry, Link, NewAccessLog, NewLink, NewUser, User};
use migration::entities::{access_log, link, user};

/// 将 Sea-ORM Model 转换为 Link
pub fn model_to_link(model: link::Model) -> Link {
    Link {
        id: model.id,
        slug: model.slug,
        target_url: model.target_url,
        created_at: model.created_at,
        expires_at: model.expires_at,
        click_limit: model.click_limit,
        click_count: model.click_count.max(0),
        deleted_at: model.deleted_at,
        owner_id: model.user_id,
    }
}

/// 新链接的 ActiveModel，id 由数据库分配，点击数从 0 开始
pub fn new_link_to_active_model(new_link: &NewLink) -> link::ActiveModel {
    use sea_orm::ActiveValue::*;

    link::ActiveModel {
        id: NotSet,
        slug: Set(new_link.slug.clone()),
        target_url: Set(new_link.target_url.clone()),
        created_at: Set(Utc::now()),
        expires_at: Set(new_link.expires_at),
        click_limit: Set(new_link.click_limit),
        click_count: Set(0),
        deleted_at: Set(None),
        user_id: Set(new_link.owner_id),
    }
}

pub fn access_log_to_entry(model: access_log::Model) -> AccessLogEntry {
    AccessLogEntry {
        id: model.id,
        link_id: model.link_id,
        accessed_at: model.accessed_at,
        ip_address: model.ip_address,
        user_agent: model.user_agent,
        referer: model.referer,
        country: model.country,
        city: model.city,
        device_type: model.device_type,
        browser: model.browser,
        os: model.os,
    }
}

pub fn new_access_log_to_active_model(entry: NewAccessLog) -> access_log::ActiveModel {
    use sea_orm::ActiveValue::*;

    access_log::ActiveModel {
        id: NotSet,
        link_id: Set(entry.link_id),
        accessed_at: Set(entry.accessed_at),
        ip_address: Set(entry.ip_address),
        user_agent: Set(entry.user_agent),
        referer: Set(entry.referer),
        country: Set(entry.country),
        city: Set(entry.city),
        device_type: Set(entry.device_type),
        browser: Set(entry.browser),
        os: Set(entry.os),
    }
}

pub fn model_to_user(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        created_at: model.created_at,
    }
}

pub fn new_user_to_active_model(new_user: &NewUser) -> user::ActiveModel {
    use sea_orm::ActiveValue::*;

    user::ActiveModel {
        id: NotSet,
        username: Set(new_user.username.clone()),
        email: Set(new_user.email.clone()),
        password_hash: Set(new_user.password_hash.clone()),
        created_at: Set(Utc::now()),
    }
}
