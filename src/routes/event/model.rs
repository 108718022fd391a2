use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};

use super::filter::{PriceClass, PublicEventFilters, StartsOn, VenueType, is_known_category};
use crate::error::{AppError, AppResult};
use crate::routes::group::model::Group;
use crate::routes::ticket::model::Ticket;

pub const ACTIVE_STATUS: &str = "ativo";

const MEDIA_KINDS: [&str; 3] = ["capa", "imagem", "galeria"];
const COVER_KIND: &str = "capa";
const DEFAULT_MEDIA_KIND: &str = "imagem";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Location {
    #[serde(rename = "localizacaoId")]
    pub location_id: i32,
    #[serde(rename = "endereco")]
    pub address: Option<String>,
    #[serde(rename = "cidade")]
    pub city: Option<String>,
    #[serde(rename = "estado")]
    pub state: Option<String>,
    #[serde(rename = "cep")]
    pub postal_code: Option<String>,
    #[serde(rename = "complemento")]
    pub complement: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationInput {
    #[serde(rename = "endereco")]
    pub address: Option<String>,
    #[serde(rename = "cidade")]
    pub city: Option<String>,
    #[serde(rename = "estado")]
    pub state: Option<String>,
    #[serde(rename = "cep")]
    pub postal_code: Option<String>,
    #[serde(rename = "complemento")]
    pub complement: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Event {
    #[serde(rename = "eventoId")]
    pub event_id: i32,
    #[serde(rename = "organizadorId")]
    pub organizer_id: i32,
    #[serde(rename = "localizacaoId")]
    pub location_id: i32,
    #[serde(rename = "nomeEvento")]
    pub name: String,
    #[serde(rename = "descEvento")]
    pub description: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "privacidadeEvento")]
    pub visibility: String,
    #[serde(rename = "dataInicio")]
    pub start_date: NaiveDate,
    #[serde(rename = "horaInicio")]
    pub start_time: Option<NaiveTime>,
    #[serde(rename = "dataFim")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "horaFim")]
    pub end_time: Option<NaiveTime>,
    #[serde(rename = "statusEvento")]
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrganizerSummary {
    #[serde(rename = "organizadorId")]
    pub organizer_id: i32,
    #[serde(rename = "nome")]
    pub organizer_name: String,
    #[serde(rename = "email")]
    pub organizer_email: String,
    #[serde(rename = "avatarUrl")]
    pub organizer_avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Media {
    #[serde(rename = "midiaId")]
    pub media_id: i32,
    #[serde(rename = "eventoId")]
    pub event_id: i32,
    pub url: String,
    #[serde(rename = "tipo")]
    pub kind: String,
}

/// 活动连同地点、组织者、票档和图片
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EventListing {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub event: Event,
    #[serde(rename = "localizacao")]
    #[sqlx(flatten)]
    pub location: Location,
    #[serde(rename = "organizador")]
    #[sqlx(flatten)]
    pub organizer: OrganizerSummary,
    #[serde(rename = "Ingressos")]
    #[sqlx(skip)]
    pub tickets: Vec<Ticket>,
    #[serde(rename = "Midia")]
    #[sqlx(skip)]
    pub media: Vec<Media>,
}

impl StartsOn for EventListing {
    fn starts_on(&self) -> NaiveDate {
        self.event.start_date
    }
}

impl EventListing {
    pub fn prices(&self) -> Vec<f64> {
        self.tickets.iter().map(|t| t.price).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaScope {
    All,
    CoverOnly,
}

pub(crate) const LISTING_SELECT: &str = r#"
    SELECT
        e.event_id, e.organizer_id, e.location_id, e.name, e.description, e.category,
        e.visibility, e.start_date, e.start_time, e.end_date, e.end_time, e.status, e.created_at,
        l.address, l.city, l.state, l.postal_code, l.complement, l.latitude, l.longitude,
        o.name AS organizer_name, o.email AS organizer_email, o.avatar_url AS organizer_avatar_url
    FROM events e
    JOIN locations l ON l.location_id = e.location_id
    JOIN organizers o ON o.organizer_id = e.organizer_id
"#;

const EVENT_COLUMNS: &str = "event_id, organizer_id, location_id, name, description, category, \
     visibility, start_date, start_time, end_date, end_time, status, created_at";

const LOCATION_COLUMNS: &str =
    "location_id, address, city, state, postal_code, complement, latitude, longitude";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaInput {
    pub url: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketInput {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "preco")]
    pub price: Option<f64>,
    #[serde(rename = "quantidade")]
    pub quantity: Option<i32>,
    #[serde(rename = "dataLimiteVenda")]
    pub sale_deadline: Option<NaiveDate>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "tipo", alias = "categoria")]
    pub category: Option<String>,
    #[serde(rename = "privacidade")]
    pub visibility: Option<String>,
    #[serde(rename = "dataInicio")]
    pub start_date: Option<String>,
    #[serde(rename = "horaInicio")]
    pub start_time: Option<String>,
    #[serde(rename = "dataFim")]
    pub end_date: Option<String>,
    #[serde(rename = "horaFim")]
    pub end_time: Option<String>,
    #[serde(rename = "localizacao")]
    pub location: Option<LocationInput>,
    #[serde(rename = "fotos", default)]
    pub media: Vec<MediaInput>,
    #[serde(rename = "ingressos", default)]
    pub tickets: Vec<TicketInput>,
    pub status: Option<String>,
    #[serde(rename = "criarChat", default = "default_true")]
    pub create_chat: bool,
}

impl Default for CreateEventRequest {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            category: None,
            visibility: None,
            start_date: None,
            start_time: None,
            end_date: None,
            end_time: None,
            location: None,
            media: Vec::new(),
            tickets: Vec::new(),
            status: None,
            create_chat: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: i32,
    pub sale_deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub category: String,
    pub visibility: String,
    pub start_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_date: NaiveDate,
    pub end_time: Option<NaiveTime>,
    pub status: String,
    pub location: LocationInput,
    pub media: Vec<(String, String)>,
    pub tickets: Vec<NewTicket>,
    pub create_chat: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatedEvent {
    #[serde(rename = "evento")]
    pub event: EventListing,
    #[serde(rename = "grupoChat")]
    pub group: Option<Group>,
}

#[derive(Debug, Serialize)]
pub struct PublicEventPage {
    #[serde(rename = "eventos")]
    pub events: Vec<EventListing>,
    pub total: i64,
    #[serde(rename = "totalPaginas")]
    pub total_pages: i64,
    #[serde(rename = "paginaAtual")]
    pub page: i64,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 接受 `YYYY-MM-DD` 或以它开头的 ISO 时间戳
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn optional_time(raw: Option<String>, message: &str) -> AppResult<Option<NaiveTime>> {
    match non_blank(raw) {
        Some(raw) => parse_time(&raw)
            .map(Some)
            .ok_or_else(|| AppError::Validation(message.into())),
        None => Ok(None),
    }
}

impl CreateEventRequest {
    pub fn validate(self) -> AppResult<NewEvent> {
        let (Some(name), Some(description), Some(category), Some(visibility), Some(start_date), Some(location)) = (
            non_blank(self.name),
            non_blank(self.description),
            non_blank(self.category),
            non_blank(self.visibility),
            non_blank(self.start_date),
            self.location,
        ) else {
            return Err(AppError::Validation("Campos obrigatórios não preenchidos".into()));
        };

        if !is_known_category(&category) {
            return Err(AppError::Validation(format!("Categoria inválida: {}", category)));
        }

        let start_date = parse_date(&start_date)
            .ok_or_else(|| AppError::Validation("Data de início inválida".into()))?;
        let end_date = match non_blank(self.end_date) {
            Some(raw) => {
                parse_date(&raw).ok_or_else(|| AppError::Validation("Data de término inválida".into()))?
            }
            None => start_date,
        };
        if end_date < start_date {
            return Err(AppError::Validation(
                "Data de término anterior à data de início".into(),
            ));
        }

        let start_time = optional_time(self.start_time, "Hora de início inválida")?;
        let end_time = optional_time(self.end_time, "Hora de término inválida")?;

        let mut media = Vec::with_capacity(self.media.len());
        for item in self.media {
            let url = non_blank(item.url)
                .ok_or_else(|| AppError::Validation("URL da mídia é obrigatória".into()))?;
            let kind = non_blank(item.kind).unwrap_or_else(|| DEFAULT_MEDIA_KIND.to_string());
            if !MEDIA_KINDS.contains(&kind.as_str()) {
                return Err(AppError::Validation(format!("Tipo de mídia inválido: {}", kind)));
            }
            media.push((url, kind));
        }

        let mut tickets = Vec::with_capacity(self.tickets.len());
        for item in self.tickets {
            let name = non_blank(item.name)
                .ok_or_else(|| AppError::Validation("Nome do ingresso é obrigatório".into()))?;
            let price = item.price.unwrap_or(0.0);
            if !price.is_finite() || price < 0.0 {
                return Err(AppError::Validation(
                    "Preço do ingresso não pode ser negativo".into(),
                ));
            }
            tickets.push(NewTicket {
                name,
                description: non_blank(item.description),
                price,
                quantity: item.quantity.unwrap_or(0).max(0),
                sale_deadline: item.sale_deadline,
            });
        }

        Ok(NewEvent {
            name,
            description,
            category,
            visibility,
            start_date,
            start_time,
            end_date,
            end_time,
            status: non_blank(self.status).unwrap_or_else(|| ACTIVE_STATUS.to_string()),
            location,
            media,
            tickets,
            create_chat: self.create_chat,
        })
    }
}

impl Location {
    /// 按 (纬度, 经度, 地址) 精确匹配复用已有地点
    ///
    /// 必须在事务内调用：同一个键的咨询锁持有到事务提交，并发创建只会插入一行
    pub async fn find_or_create(conn: &mut PgConnection, input: &LocationInput) -> AppResult<Self> {
        sqlx::query(
            r#"
            SELECT pg_advisory_xact_lock(
                hashtext(concat_ws('|', 'locations', $1::float8::text, $2::float8::text, $3::text))
            )
            "#,
        )
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.address.as_deref())
        .execute(&mut *conn)
        .await?;

        let existing = sqlx::query_as::<_, Location>(&format!(
            r#"
            SELECT {LOCATION_COLUMNS}
            FROM locations
            WHERE latitude IS NOT DISTINCT FROM $1
              AND longitude IS NOT DISTINCT FROM $2
              AND address IS NOT DISTINCT FROM $3
            ORDER BY location_id ASC
            LIMIT 1
            "#
        ))
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.address.as_deref())
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(location) = existing {
            tracing::debug!("Reusing location {}", location.location_id);
            return Ok(location);
        }

        let location = sqlx::query_as::<_, Location>(&format!(
            r#"
            INSERT INTO locations (address, city, state, postal_code, complement, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(input.address.as_deref())
        .bind(input.city.as_deref())
        .bind(input.state.as_deref())
        .bind(input.postal_code.as_deref())
        .bind(input.complement.as_deref())
        .bind(input.latitude)
        .bind(input.longitude)
        .fetch_one(&mut *conn)
        .await?;

        Ok(location)
    }

    /// 最多 50 个 "城市, 州"
    pub async fn list_cities(pool: &PgPool) -> AppResult<Vec<String>> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT DISTINCT city, state
            FROM locations
            WHERE city IS NOT NULL
            ORDER BY city ASC, state ASC
            LIMIT 50
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(city, state)| match state {
                Some(state) => format!("{}, {}", city, state),
                None => city,
            })
            .collect())
    }
}

impl Media {
    pub async fn find_by_events(
        pool: &PgPool,
        event_ids: &[i32],
        scope: MediaScope,
    ) -> AppResult<Vec<Self>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT media_id, event_id, url, kind FROM media WHERE event_id = ANY(",
        );
        builder.push_bind(event_ids.to_vec()).push(")");
        if scope == MediaScope::CoverOnly {
            builder.push(" AND kind = ").push_bind(COVER_KIND);
        }
        builder.push(" ORDER BY media_id ASC");

        let media = builder.build_query_as::<Media>().fetch_all(pool).await?;
        Ok(media)
    }
}

fn push_public_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &PublicEventFilters) {
    builder.push(" WHERE e.status = ").push_bind(ACTIVE_STATUS);

    if !filters.categories.is_empty() {
        builder.push(" AND e.category IN (");
        let mut separated = builder.separated(", ");
        for category in &filters.categories {
            separated.push_bind(category.clone());
        }
        separated.push_unseparated(")");
    }

    match filters.venue {
        VenueType::Online => {
            builder.push(" AND l.address IS NULL");
        }
        VenueType::InPerson => {
            builder.push(" AND l.address IS NOT NULL");
        }
        VenueType::Any => {}
    }

    if let Some(city) = &filters.city {
        builder
            .push(" AND l.city ILIKE ")
            .push_bind(super::filter::like_pattern(city));
    }
}

impl EventListing {
    /// 批量加载票档和图片
    pub async fn attach_children(
        pool: &PgPool,
        events: &mut [EventListing],
        scope: MediaScope,
    ) -> AppResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let ids: Vec<i32> = events.iter().map(|e| e.event.event_id).collect();

        let mut tickets: HashMap<i32, Vec<Ticket>> = HashMap::new();
        for ticket in Ticket::find_by_events(pool, &ids).await? {
            tickets.entry(ticket.event_id).or_default().push(ticket);
        }
        let mut media: HashMap<i32, Vec<Media>> = HashMap::new();
        for item in Media::find_by_events(pool, &ids, scope).await? {
            media.entry(item.event_id).or_default().push(item);
        }

        for event in events.iter_mut() {
            let id = event.event.event_id;
            event.tickets = tickets.remove(&id).unwrap_or_default();
            event.media = media.remove(&id).unwrap_or_default();
        }
        Ok(())
    }
}

impl Event {
    /// 活动、图片、票档和群组在同一个事务里写入
    pub async fn create(pool: &PgPool, organizer_id: i32, new: NewEvent) -> AppResult<CreatedEvent> {
        let mut tx = pool.begin().await?;

        let location = Location::find_or_create(&mut *tx, &new.location).await?;

        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (
                organizer_id, location_id, name, description, category, visibility,
                start_date, start_time, end_date, end_time, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(organizer_id)
        .bind(location.location_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.category)
        .bind(&new.visibility)
        .bind(new.start_date)
        .bind(new.start_time)
        .bind(new.end_date)
        .bind(new.end_time)
        .bind(&new.status)
        .fetch_one(&mut *tx)
        .await?;

        for (url, kind) in &new.media {
            sqlx::query("INSERT INTO media (event_id, url, kind) VALUES ($1, $2, $3)")
                .bind(event.event_id)
                .bind(url)
                .bind(kind)
                .execute(&mut *tx)
                .await?;
        }

        for ticket in &new.tickets {
            sqlx::query(
                r#"
                INSERT INTO tickets (event_id, name, description, price, quantity, sale_deadline)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(event.event_id)
            .bind(&ticket.name)
            .bind(ticket.description.as_deref())
            .bind(ticket.price)
            .bind(ticket.quantity)
            .bind(ticket.sale_deadline)
            .execute(&mut *tx)
            .await?;
        }

        let group = if new.create_chat {
            Some(Group::insert_for_event(&mut *tx, event.event_id, organizer_id, &new.name).await?)
        } else {
            None
        };

        tx.commit().await?;
        tracing::info!(
            "Event {} created by organizer {} (chat group: {})",
            event.event_id,
            organizer_id,
            group.is_some()
        );

        let event = Self::find_by_id(pool, event.event_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("event {} vanished after commit", event.event_id)))?;

        Ok(CreatedEvent { event, group })
    }

    pub async fn find_by_id(pool: &PgPool, event_id: i32) -> AppResult<Option<EventListing>> {
        let listing = sqlx::query_as::<_, EventListing>(&format!(
            "{LISTING_SELECT} WHERE e.event_id = $1"
        ))
        .bind(event_id)
        .fetch_optional(pool)
        .await?;

        let Some(listing) = listing else {
            return Ok(None);
        };
        let mut listings = [listing];
        EventListing::attach_children(pool, &mut listings, MediaScope::All).await?;
        let [listing] = listings;
        Ok(Some(listing))
    }

    pub async fn list_by_organizer(pool: &PgPool, organizer_id: i32) -> AppResult<Vec<EventListing>> {
        let mut events = sqlx::query_as::<_, EventListing>(&format!(
            "{LISTING_SELECT} WHERE e.organizer_id = $1 ORDER BY e.start_date ASC, e.event_id ASC"
        ))
        .bind(organizer_id)
        .fetch_all(pool)
        .await?;

        EventListing::attach_children(pool, &mut events, MediaScope::All).await?;
        Ok(events)
    }

    /// 价格筛选在分页之后进行，总数不受价格筛选影响
    pub async fn list_public(pool: &PgPool, filters: &PublicEventFilters) -> AppResult<PublicEventPage> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM events e JOIN locations l ON l.location_id = e.location_id",
        );
        push_public_filters(&mut count, filters);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(LISTING_SELECT);
        push_public_filters(&mut query, filters);
        if filters.has_active_filters() {
            query.push(" ORDER BY e.start_date ASC, e.event_id ASC");
        } else {
            query.push(" ORDER BY RANDOM()");
        }
        query
            .push(" LIMIT ")
            .push_bind(filters.page_size)
            .push(" OFFSET ")
            .push_bind(filters.offset());

        let mut events = query.build_query_as::<EventListing>().fetch_all(pool).await?;
        EventListing::attach_children(pool, &mut events, MediaScope::CoverOnly).await?;

        if filters.price != PriceClass::Any {
            events.retain(|event| filters.price.matches(&event.prices()));
        }

        tracing::debug!(
            "Public listing page {} returned {} of {} events",
            filters.page,
            events.len(),
            total
        );

        Ok(PublicEventPage {
            events,
            total,
            total_pages: filters.total_pages(total),
            page: filters.page,
        })
    }

    pub async fn search_by_name(pool: &PgPool, term: &str, limit: i64) -> AppResult<Vec<EventListing>> {
        let mut events = sqlx::query_as::<_, EventListing>(&format!(
            r#"
            {LISTING_SELECT}
            WHERE e.status = $1 AND e.name ILIKE $2
            ORDER BY e.start_date ASC, e.event_id ASC
            LIMIT $3
            "#
        ))
        .bind(ACTIVE_STATUS)
        .bind(super::filter::like_pattern(term))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        EventListing::attach_children(pool, &mut events, MediaScope::All).await?;
        Ok(events)
    }

    /// 首页：单一分类，按开始日期取前 `limit` 个
    pub async fn list_home(
        pool: &PgPool,
        category: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<EventListing>> {
        let mut query = QueryBuilder::<Postgres>::new(LISTING_SELECT);
        query.push(" WHERE e.status = ").push_bind(ACTIVE_STATUS);
        if let Some(category) = category {
            query.push(" AND e.category = ").push_bind(category.to_string());
        }
        query
            .push(" ORDER BY e.start_date ASC, e.event_id ASC LIMIT ")
            .push_bind(limit);

        let mut events = query.build_query_as::<EventListing>().fetch_all(pool).await?;
        EventListing::attach_children(pool, &mut events, MediaScope::CoverOnly).await?;
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateEventRequest {
        CreateEventRequest {
            name: Some("Festival de Jazz".into()),
            description: Some("Três noites de música".into()),
            category: Some("Festas e Shows".into()),
            visibility: Some("publico".into()),
            start_date: Some("2026-11-20".into()),
            location: Some(LocationInput {
                address: Some("Rua das Flores, 10".into()),
                city: Some("Curitiba".into()),
                latitude: Some(-25.43),
                longitude: Some(-49.27),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_are_applied() {
        let new = valid_request().validate().unwrap();
        assert_eq!(new.status, ACTIVE_STATUS);
        assert_eq!(new.end_date, new.start_date);
        assert!(new.create_chat);
        assert!(new.media.is_empty());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let req = CreateEventRequest {
            location: None,
            ..valid_request()
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        let req = CreateEventRequest {
            name: Some("   ".into()),
            ..valid_request()
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let req = CreateEventRequest {
            category: Some("Astronomia".into()),
            ..valid_request()
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn iso_timestamps_and_times_are_accepted() {
        let req = CreateEventRequest {
            start_date: Some("2026-11-20T18:00:00.000Z".into()),
            start_time: Some("18:30".into()),
            end_date: Some("2026-11-22".into()),
            ..valid_request()
        };
        let new = req.validate().unwrap();
        assert_eq!(new.start_date, NaiveDate::from_ymd_opt(2026, 11, 20).unwrap());
        assert_eq!(new.start_time, NaiveTime::from_hms_opt(18, 30, 0));
        assert_eq!(new.end_date, NaiveDate::from_ymd_opt(2026, 11, 22).unwrap());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let req = CreateEventRequest {
            end_date: Some("2026-11-19".into()),
            ..valid_request()
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn ticket_and_media_defaults() {
        let req = CreateEventRequest {
            media: vec![MediaInput {
                url: Some("https://cdn.example/capa.png".into()),
                kind: None,
            }],
            tickets: vec![TicketInput {
                name: Some("Pista".into()),
                ..Default::default()
            }],
            ..valid_request()
        };
        let new = req.validate().unwrap();
        assert_eq!(new.media[0].1, DEFAULT_MEDIA_KIND);
        assert_eq!(new.tickets[0].price, 0.0);
        assert_eq!(new.tickets[0].quantity, 0);
    }

    #[test]
    fn negative_price_and_bad_media_kind_are_rejected() {
        let req = CreateEventRequest {
            tickets: vec![TicketInput {
                name: Some("VIP".into()),
                price: Some(-1.0),
                ..Default::default()
            }],
            ..valid_request()
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        let req = CreateEventRequest {
            media: vec![MediaInput {
                url: Some("https://cdn.example/x.mp4".into()),
                kind: Some("video".into()),
            }],
            ..valid_request()
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn create_chat_defaults_to_true_when_absent() {
        let req: CreateEventRequest = serde_json::from_value(serde_json::json!({
            "nome": "x",
            "categoria": "Esporte"
        }))
        .unwrap();
        assert!(req.create_chat);
        assert_eq!(req.category.as_deref(), Some("Esporte"));
    }
}
