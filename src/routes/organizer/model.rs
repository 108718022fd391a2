use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};
use crate::utils::{hash_password, verify_password};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Organizer {
    #[serde(rename = "organizadorId")]
    pub organizer_id: i32,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizerRequest {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "senha")]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RecentEvent {
    #[serde(rename = "eventoId")]
    pub event_id: i32,
    #[serde(rename = "nomeEvento")]
    pub name: String,
    #[serde(rename = "dataInicio")]
    pub start_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct OrganizerStats {
    #[serde(rename = "totalEventos")]
    pub total_events: i64,
    #[serde(rename = "eventosAtivos")]
    pub active_events: i64,
}

#[derive(Debug, Serialize)]
pub struct OrganizerProfile {
    #[serde(flatten)]
    pub organizer: Organizer,
    #[serde(rename = "eventos")]
    pub recent_events: Vec<RecentEvent>,
    #[serde(rename = "estatisticas")]
    pub stats: OrganizerStats,
}

const ORGANIZER_COLUMNS: &str = "organizer_id, name, email, password_hash, avatar_url, created_at";

impl Organizer {
    pub async fn create(pool: &PgPool, req: CreateOrganizerRequest) -> AppResult<Self> {
        let (Some(name), Some(email), Some(password)) = (req.name, req.email, req.password) else {
            return Err(AppError::Validation(
                "Nome, email e senha são obrigatórios".into(),
            ));
        };
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Nome, email e senha são obrigatórios".into(),
            ));
        }

        let password_hash = hash_password(&password)?;

        sqlx::query_as::<_, Organizer>(&format!(
            r#"
            INSERT INTO organizers (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {ORGANIZER_COLUMNS}
            "#
        ))
        .bind(name.trim())
        .bind(email.trim())
        .bind(password_hash)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Email já cadastrado!"))
    }

    pub async fn find_by_id(pool: &PgPool, organizer_id: i32) -> AppResult<Option<Self>> {
        let organizer = sqlx::query_as::<_, Organizer>(&format!(
            "SELECT {ORGANIZER_COLUMNS} FROM organizers WHERE organizer_id = $1"
        ))
        .bind(organizer_id)
        .fetch_optional(pool)
        .await?;

        Ok(organizer)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> AppResult<Option<Self>> {
        let organizer = sqlx::query_as::<_, Organizer>(&format!(
            "SELECT {ORGANIZER_COLUMNS} FROM organizers WHERE email = $1"
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

        Ok(organizer)
    }

    /// 邮箱不存在和密码错误返回同一个错误
    pub async fn login(pool: &PgPool, req: &LoginRequest) -> AppResult<Self> {
        let organizer = Self::find_by_email(pool, &req.email)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Credenciais inválidas".into()))?;

        if !verify_password(&req.password, &organizer.password_hash)? {
            return Err(AppError::Unauthenticated("Credenciais inválidas".into()));
        }

        Ok(organizer)
    }

    pub async fn profile(pool: &PgPool, organizer_id: i32) -> AppResult<OrganizerProfile> {
        let organizer = Self::find_by_id(pool, organizer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Organizador não encontrado".into()))?;

        let recent_events = sqlx::query_as::<_, RecentEvent>(
            r#"
            SELECT event_id, name, start_date
            FROM events
            WHERE organizer_id = $1
            ORDER BY start_date DESC
            LIMIT 5
            "#,
        )
        .bind(organizer_id)
        .fetch_all(pool)
        .await?;

        let (total_events, active_events): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'ativo')
            FROM events
            WHERE organizer_id = $1
            "#,
        )
        .bind(organizer_id)
        .fetch_one(pool)
        .await?;

        Ok(OrganizerProfile {
            organizer,
            recent_events,
            stats: OrganizerStats {
                total_events,
                active_events,
            },
        })
    }
}
