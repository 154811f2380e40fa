//! # 用户名生成
//!
//! 以展示名为首选；冲突时追加时间戳派生后缀，流程绝不因撞名失败

use crate::error::Result;
use entity::{LocalAccounts, local_accounts};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

/// 展示名为空时的兜底名称
pub fn fallback_display_name(now: chrono::NaiveDateTime) -> String {
    format!("user{}", now.format("%y%m%d%H%M%S"))
}

/// 在当前连接（通常是事务）里解析出一个未占用的用户名
pub async fn unique_username<C: ConnectionTrait>(
    conn: &C,
    preferred: &str,
    now: chrono::NaiveDateTime,
) -> Result<String> {
    let preferred = preferred.trim();
    let base = if preferred.is_empty() {
        fallback_display_name(now)
    } else {
        preferred.to_string()
    };

    if !username_taken(conn, &base).await? {
        return Ok(base);
    }

    let stamped = format!("{}{}", base, now.format("%y%m%d%H%M%S"));
    if !username_taken(conn, &stamped).await? {
        return Ok(stamped);
    }

    // 同一秒内的并发撞名，退化为递增后缀
    for n in 1.. {
        let candidate = format!("{stamped}-{n}");
        if !username_taken(conn, &candidate).await? {
            return Ok(candidate);
        }
    }
    unreachable!("递增后缀必然终止")
}

async fn username_taken<C: ConnectionTrait>(conn: &C, name: &str) -> Result<bool> {
    Ok(LocalAccounts::find()
        .filter(local_accounts::Column::Username.eq(name))
        .one(conn)
        .await?
        .is_some())
}
