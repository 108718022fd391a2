use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::error::{AppError, AppResult};
use crate::middleware::Actor;

/// 活动聊天群组的类型
pub const EVENT_GROUP_KIND: &str = "evento";

/// 活动被删除后群组列表里显示的名称
pub const REMOVED_EVENT_NAME: &str = "Evento Removido";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    #[serde(rename = "grupoId")]
    pub group_id: i32,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "eventoId")]
    pub event_id: Option<i32>,
    #[serde(rename = "organizadorId")]
    pub organizer_id: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct JoinGroupRequest {
    #[serde(rename = "eventoId")]
    pub event_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct JoinOutcome {
    #[serde(rename = "grupoId")]
    pub group_id: i32,
    #[serde(rename = "grupoNome")]
    pub group_name: String,
    #[serde(rename = "jaMembro")]
    pub already_member: bool,
}

#[derive(Debug, Serialize, FromRow)]
pub struct GuestGroup {
    #[serde(rename = "grupoId")]
    pub group_id: i32,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "eventoId")]
    pub event_id: Option<i32>,
    #[serde(rename = "eventoNome")]
    pub event_name: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct OrganizerGroup {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub group: Group,
    #[serde(rename = "nomeEvento")]
    pub event_name: Option<String>,
    #[serde(rename = "dataInicio")]
    pub event_start_date: Option<NaiveDate>,
}

const GROUP_COLUMNS: &str = "group_id, name, description, kind, event_id, organizer_id, created_at";

impl Group {
    /// 在创建活动的事务中一起创建群组
    pub async fn insert_for_event(
        conn: &mut PgConnection,
        event_id: i32,
        organizer_id: i32,
        event_name: &str,
    ) -> AppResult<Self> {
        let group = sqlx::query_as::<_, Group>(&format!(
            r#"
            INSERT INTO groups (name, description, kind, event_id, organizer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(event_name)
        .bind(format!("Grupo de chat do evento {}", event_name))
        .bind(EVENT_GROUP_KIND)
        .bind(event_id)
        .bind(organizer_id)
        .fetch_one(conn)
        .await?;

        Ok(group)
    }

    pub async fn find_by_id(pool: &PgPool, group_id: i32) -> AppResult<Option<Self>> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE group_id = $1"
        ))
        .bind(group_id)
        .fetch_optional(pool)
        .await?;

        Ok(group)
    }

    pub async fn find_for_event(pool: &PgPool, event_id: i32) -> AppResult<Option<Self>> {
        let group = sqlx::query_as::<_, Group>(&format!(
            r#"
            SELECT {GROUP_COLUMNS}
            FROM groups
            WHERE event_id = $1 AND kind = $2
            ORDER BY group_id ASC
            LIMIT 1
            "#
        ))
        .bind(event_id)
        .bind(EVENT_GROUP_KIND)
        .fetch_optional(pool)
        .await?;

        Ok(group)
    }

    /// 加入活动群组，重复加入不报错
    pub async fn join_event_group(
        pool: &PgPool,
        guest_id: i32,
        event_id: i32,
    ) -> AppResult<JoinOutcome> {
        let group = Self::find_for_event(pool, event_id).await?.ok_or_else(|| {
            AppError::NotFound("Grupo de chat não encontrado para este evento.".into())
        })?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO group_members (group_id, guest_id)
            VALUES ($1, $2)
            ON CONFLICT (group_id, guest_id) DO NOTHING
            "#,
        )
        .bind(group.group_id)
        .bind(guest_id)
        .execute(pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            tracing::info!("Guest {} joined group {}", guest_id, group.group_id);
        }

        Ok(JoinOutcome {
            group_id: group.group_id,
            group_name: group.name,
            already_member: inserted == 0,
        })
    }

    pub async fn is_member(pool: &PgPool, group_id: i32, guest_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM group_members
                WHERE group_id = $1 AND guest_id = $2
            )
            "#,
        )
        .bind(group_id)
        .bind(guest_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// 组织者只能进入自己创建的群组，访客必须是成员
    pub async fn accessible_by(pool: &PgPool, group_id: i32, actor: &Actor) -> AppResult<Self> {
        let group = Self::find_by_id(pool, group_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Grupo não encontrado".into()))?;

        let allowed = match actor {
            Actor::Organizer(organizer) => organizer.organizer_id == group.organizer_id,
            Actor::Guest(guest) => Self::is_member(pool, group_id, guest.guest_id).await?,
        };

        if !allowed {
            return Err(AppError::Forbidden("Sem acesso a este grupo".into()));
        }

        Ok(group)
    }

    pub async fn list_for_guest(pool: &PgPool, guest_id: i32) -> AppResult<Vec<GuestGroup>> {
        let groups = sqlx::query_as::<_, GuestGroup>(
            r#"
            SELECT
                g.group_id, g.name, g.description, g.event_id,
                COALESCE(e.name, $2) AS event_name
            FROM group_members m
            JOIN groups g ON g.group_id = m.group_id
            LEFT JOIN events e ON e.event_id = g.event_id
            WHERE m.guest_id = $1
            ORDER BY m.joined_at DESC
            "#,
        )
        .bind(guest_id)
        .bind(REMOVED_EVENT_NAME)
        .fetch_all(pool)
        .await?;

        Ok(groups)
    }

    pub async fn list_for_organizer(
        pool: &PgPool,
        organizer_id: i32,
    ) -> AppResult<Vec<OrganizerGroup>> {
        let groups = sqlx::query_as::<_, OrganizerGroup>(
            r#"
            SELECT
                g.group_id, g.name, g.description, g.kind, g.event_id, g.organizer_id, g.created_at,
                e.name AS event_name, e.start_date AS event_start_date
            FROM groups g
            LEFT JOIN events e ON e.event_id = g.event_id
            WHERE g.organizer_id = $1
            ORDER BY g.created_at DESC
            "#,
        )
        .bind(organizer_id)
        .fetch_all(pool)
        .await?;

        Ok(groups)
    }
}
