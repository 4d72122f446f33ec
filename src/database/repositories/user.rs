use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::{UserRecord, UserStore};
use crate::error::StoreError;

const SELECT_USER: &str = r#"
    SELECT
        pk AS id,
        username,
        firstname AS first_name,
        lastname AS last_name,
        password AS password_hash,
        stay_logged_in_key,
        deactivated,
        deleted
    FROM t_pf_user
"#;

const RETURNING_USER: &str = r#"
    RETURNING
        pk AS id,
        username,
        firstname AS first_name,
        lastname AS last_name,
        password AS password_hash,
        stay_logged_in_key,
        deactivated,
        deleted
"#;

/// 基于 Postgres 的用户存储库实现
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!("{SELECT_USER} WHERE pk = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!("{SELECT_USER} WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_password(
        &self,
        id: i32,
        password_hash: &str,
        stay_logged_in_key: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE t_pf_user SET password = $1, stay_logged_in_key = $2, last_password_change = now() \
             WHERE pk = $3 {RETURNING_USER}"
        ))
        .bind(password_hash)
        .bind(stay_logged_in_key)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if user.is_some() {
            tracing::info!("Password changed and stay-logged-in key renewed for user {}", id);
        }
        Ok(user)
    }

    async fn renew_stay_logged_in_key(
        &self,
        id: i32,
        stay_logged_in_key: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE t_pf_user SET stay_logged_in_key = $1 WHERE pk = $2 {RETURNING_USER}"
        ))
        .bind(stay_logged_in_key)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if user.is_some() {
            tracing::info!("Stay-logged-in key renewed for user {}", id);
        }
        Ok(user)
    }
}
