use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};
use crate::routes::event::model::{EventListing, LISTING_SELECT, MediaScope};

/// 收藏对象：活动或组织者，二选一
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteTarget {
    Event(i32),
    Organizer(i32),
}

impl FavoriteTarget {
    fn not_found_message(&self) -> &'static str {
        match self {
            FavoriteTarget::Event(_) => "Evento não encontrado",
            FavoriteTarget::Organizer(_) => "Organizador não encontrado",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AddFavoriteRequest {
    #[serde(rename = "eventoId")]
    pub event_id: Option<i32>,
    #[serde(rename = "organizadorId")]
    pub organizer_id: Option<i32>,
}

impl TryFrom<AddFavoriteRequest> for FavoriteTarget {
    type Error = AppError;

    fn try_from(req: AddFavoriteRequest) -> Result<Self, Self::Error> {
        match (req.event_id, req.organizer_id) {
            (Some(event_id), None) => Ok(FavoriteTarget::Event(event_id)),
            (None, Some(organizer_id)) => Ok(FavoriteTarget::Organizer(organizer_id)),
            (None, None) => Err(AppError::Validation(
                "eventoId ou organizadorId é obrigatório".into(),
            )),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "Informe apenas eventoId ou organizadorId".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Favorite {
    #[serde(rename = "favoritoId")]
    pub favorite_id: i32,
    #[serde(rename = "convidadoId")]
    pub guest_id: i32,
    #[serde(rename = "eventoId")]
    pub event_id: Option<i32>,
    #[serde(rename = "organizadorId")]
    pub organizer_id: Option<i32>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct FavoriteOrganizer {
    #[serde(rename = "organizadorId")]
    pub organizer_id: i32,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(rename = "favoritadoEm")]
    pub favorited_at: DateTime<Utc>,
}

const FAVORITE_COLUMNS: &str = "favorite_id, guest_id, event_id, organizer_id, created_at";

impl Favorite {
    async fn target_exists(pool: &PgPool, target: FavoriteTarget) -> AppResult<bool> {
        let query = match target {
            FavoriteTarget::Event(_) => "SELECT EXISTS(SELECT 1 FROM events WHERE event_id = $1)",
            FavoriteTarget::Organizer(_) => {
                "SELECT EXISTS(SELECT 1 FROM organizers WHERE organizer_id = $1)"
            }
        };
        let id = match target {
            FavoriteTarget::Event(id) | FavoriteTarget::Organizer(id) => id,
        };

        let exists: bool = sqlx::query_scalar(query).bind(id).fetch_one(pool).await?;
        Ok(exists)
    }

    async fn find(pool: &PgPool, guest_id: i32, target: FavoriteTarget) -> AppResult<Option<Self>> {
        let (column, id) = match target {
            FavoriteTarget::Event(id) => ("event_id", id),
            FavoriteTarget::Organizer(id) => ("organizer_id", id),
        };

        let favorite = sqlx::query_as::<_, Favorite>(&format!(
            "SELECT {FAVORITE_COLUMNS} FROM favorites WHERE guest_id = $1 AND {column} = $2"
        ))
        .bind(guest_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(favorite)
    }

    /// 已存在时返回原记录和 false
    pub async fn add(
        pool: &PgPool,
        guest_id: i32,
        target: FavoriteTarget,
    ) -> AppResult<(Self, bool)> {
        if !Self::target_exists(pool, target).await? {
            return Err(AppError::NotFound(target.not_found_message().into()));
        }

        // 冲突目标必须带上部分唯一索引的谓词
        let (event_id, organizer_id, conflict) = match target {
            FavoriteTarget::Event(id) => (Some(id), None, "(guest_id, event_id) WHERE event_id IS NOT NULL"),
            FavoriteTarget::Organizer(id) => (
                None,
                Some(id),
                "(guest_id, organizer_id) WHERE organizer_id IS NOT NULL",
            ),
        };

        let inserted = sqlx::query_as::<_, Favorite>(&format!(
            r#"
            INSERT INTO favorites (guest_id, event_id, organizer_id)
            VALUES ($1, $2, $3)
            ON CONFLICT {conflict} DO NOTHING
            RETURNING {FAVORITE_COLUMNS}
            "#
        ))
        .bind(guest_id)
        .bind(event_id)
        .bind(organizer_id)
        .fetch_optional(pool)
        .await?;

        if let Some(favorite) = inserted {
            tracing::info!("Guest {} favorited {:?}", guest_id, target);
            return Ok((favorite, true));
        }

        let existing = Self::find(pool, guest_id, target).await?.ok_or_else(|| {
            AppError::Internal(format!("favorite {:?} of guest {} vanished", target, guest_id))
        })?;
        Ok((existing, false))
    }

    pub async fn remove(pool: &PgPool, guest_id: i32, target: FavoriteTarget) -> AppResult<()> {
        let (column, id) = match target {
            FavoriteTarget::Event(id) => ("event_id", id),
            FavoriteTarget::Organizer(id) => ("organizer_id", id),
        };

        let deleted = sqlx::query(&format!(
            "DELETE FROM favorites WHERE guest_id = $1 AND {column} = $2"
        ))
        .bind(guest_id)
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound("Favorito não encontrado".into()));
        }
        Ok(())
    }

    /// 最近收藏的排在前面
    pub async fn list_events(pool: &PgPool, guest_id: i32) -> AppResult<Vec<EventListing>> {
        let mut events = sqlx::query_as::<_, EventListing>(&format!(
            r#"
            {LISTING_SELECT}
            JOIN favorites f ON f.event_id = e.event_id
            WHERE f.guest_id = $1
            ORDER BY f.created_at DESC, f.favorite_id DESC
            "#
        ))
        .bind(guest_id)
        .fetch_all(pool)
        .await?;

        EventListing::attach_children(pool, &mut events, MediaScope::CoverOnly).await?;
        Ok(events)
    }

    pub async fn list_organizers(pool: &PgPool, guest_id: i32) -> AppResult<Vec<FavoriteOrganizer>> {
        let organizers = sqlx::query_as::<_, FavoriteOrganizer>(
            r#"
            SELECT o.organizer_id, o.name, o.avatar_url, f.created_at AS favorited_at
            FROM favorites f
            JOIN organizers o ON o.organizer_id = f.organizer_id
            WHERE f.guest_id = $1
            ORDER BY f.created_at DESC, f.favorite_id DESC
            "#,
        )
        .bind(guest_id)
        .fetch_all(pool)
        .await?;

        Ok(organizers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_target_is_required() {
        let target = FavoriteTarget::try_from(AddFavoriteRequest {
            event_id: Some(3),
            organizer_id: None,
        });
        assert_eq!(target.unwrap(), FavoriteTarget::Event(3));

        let target = FavoriteTarget::try_from(AddFavoriteRequest {
            event_id: None,
            organizer_id: Some(9),
        });
        assert_eq!(target.unwrap(), FavoriteTarget::Organizer(9));

        assert!(matches!(
            FavoriteTarget::try_from(AddFavoriteRequest::default()),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            FavoriteTarget::try_from(AddFavoriteRequest {
                event_id: Some(1),
                organizer_id: Some(1),
            }),
            Err(AppError::Validation(_))
        ));
    }
}
