use sqlx::PgPool;

use crate::database::GroupMembership;

/// 用户组存储库
pub struct GroupRepository;

impl GroupRepository {
    /// 读取全部用户组成员关系，用于填充进程内用户组缓存
    pub async fn load_memberships(pool: &PgPool) -> Result<Vec<GroupMembership>, sqlx::Error> {
        let rows = sqlx::query_as::<_, GroupMembership>(
            r#"
            SELECT gu.group_id, gu.user_id
            FROM t_group_user gu
            JOIN t_group g ON g.pk = gu.group_id
            WHERE g.deleted = false
            "#,
        )
        .fetch_all(pool)
        .await?;

        tracing::debug!("Loaded {} group memberships", rows.len());
        Ok(rows)
    }
}
