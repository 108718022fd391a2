use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};

/// 活动下的票档
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ticket {
    #[serde(rename = "ingressoId")]
    pub ticket_id: i32,
    #[serde(rename = "eventoId")]
    pub event_id: i32,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: Option<String>,
    #[serde(rename = "preco")]
    pub price: f64,
    #[serde(rename = "quantidade")]
    pub quantity: i32,
    #[serde(rename = "dataLimiteVenda")]
    pub sale_deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Confirmado")]
    Confirmed,
    #[serde(rename = "Cancelado")]
    Cancelled,
    #[serde(rename = "Reembolsado")]
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pendente",
            PaymentStatus::Confirmed => "Confirmado",
            PaymentStatus::Cancelled => "Cancelado",
            PaymentStatus::Refunded => "Reembolsado",
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Pendente" => Ok(PaymentStatus::Pending),
            "Confirmado" => Ok(PaymentStatus::Confirmed),
            "Cancelado" => Ok(PaymentStatus::Cancelled),
            "Reembolsado" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

/// 购买记录使用小写的状态值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "confirmado")]
    Confirmed,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pendente",
            PurchaseStatus::Confirmed => "confirmado",
            PurchaseStatus::Cancelled => "cancelado",
        }
    }
}

impl TryFrom<String> for PurchaseStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pendente" => Ok(PurchaseStatus::Pending),
            "confirmado" => Ok(PurchaseStatus::Confirmed),
            "cancelado" => Ok(PurchaseStatus::Cancelled),
            other => Err(format!("unknown purchase status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Participation {
    #[serde(rename = "participacaoId")]
    pub participation_id: i32,
    #[serde(rename = "convidadoId")]
    pub guest_id: i32,
    #[serde(rename = "ingressoId")]
    pub ticket_id: i32,
    #[serde(rename = "statusPagamento")]
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    #[serde(rename = "codigoTransacao")]
    pub transaction_code: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Purchase {
    #[serde(rename = "compraId")]
    pub purchase_id: i32,
    #[serde(rename = "convidadoId")]
    pub guest_id: i32,
    #[serde(rename = "ingressoId")]
    pub ticket_id: i32,
    #[serde(rename = "quantidade")]
    pub quantity: i32,
    #[serde(rename = "valorTotal")]
    pub total_amount: f64,
    #[serde(rename = "statusPagamento")]
    #[sqlx(try_from = "String")]
    pub payment_status: PurchaseStatus,
    #[serde(rename = "compradoEm")]
    pub created_at: DateTime<Utc>,
}

/// 购买历史里附带票档和活动名称
#[derive(Debug, Serialize, FromRow)]
pub struct PurchaseHistoryEntry {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub purchase: Purchase,
    #[serde(rename = "ingressoNome")]
    pub ticket_name: String,
    #[serde(rename = "preco")]
    pub ticket_price: f64,
    #[serde(rename = "eventoId")]
    pub event_id: i32,
    #[serde(rename = "eventoNome")]
    pub event_name: String,
}

#[derive(Debug, Serialize)]
pub struct ParticipationOutcome {
    #[serde(rename = "participacao")]
    pub participation: Participation,
    #[serde(rename = "compra")]
    pub purchase: Option<Purchase>,
    #[serde(rename = "eventoId")]
    pub event_id: i32,
    /// false 表示参与记录此前已确认，本次只追加了购买记录
    #[serde(rename = "novaParticipacao")]
    pub newly_confirmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParticipationState {
    #[serde(rename = "Participa")]
    Participating,
    #[serde(rename = "Não Participa")]
    NotParticipating,
    #[serde(rename = "Não Aplicável")]
    NotApplicable,
}

const PARTICIPATION_COLUMNS: &str =
    "participation_id, guest_id, ticket_id, payment_status, transaction_code, created_at";
const PURCHASE_COLUMNS: &str =
    "purchase_id, guest_id, ticket_id, quantity, total_amount, payment_status, created_at";

/// 模拟支付生成的交易号
pub fn transaction_code(guest_id: i32, at: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("TRANS-{}-{}-{}", at.timestamp_millis(), guest_id, &suffix[..8])
}

pub fn purchase_total(price: f64, quantity: i32) -> f64 {
    price * quantity as f64
}

impl Ticket {
    pub async fn find_by_id(pool: &PgPool, ticket_id: i32) -> AppResult<Option<Self>> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT ticket_id, event_id, name, description, price, quantity, sale_deadline
            FROM tickets
            WHERE ticket_id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(pool)
        .await?;

        Ok(ticket)
    }

    pub async fn find_by_events(pool: &PgPool, event_ids: &[i32]) -> AppResult<Vec<Self>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT ticket_id, event_id, name, description, price, quantity, sale_deadline
            FROM tickets
            WHERE event_id = ANY($1)
            ORDER BY price ASC, ticket_id ASC
            "#,
        )
        .bind(event_ids)
        .fetch_all(pool)
        .await?;

        Ok(tickets)
    }
}

impl Participation {
    pub async fn find(pool: &PgPool, guest_id: i32, ticket_id: i32) -> AppResult<Option<Self>> {
        let participation = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM participations WHERE guest_id = $1 AND ticket_id = $2"
        ))
        .bind(guest_id)
        .bind(ticket_id)
        .fetch_optional(pool)
        .await?;

        Ok(participation)
    }

    /// 写入或把未确认的记录改为已确认；已确认时返回 None
    async fn confirm(pool: &PgPool, guest_id: i32, ticket_id: i32) -> AppResult<Option<Self>> {
        let code = transaction_code(guest_id, Utc::now());

        let participation = sqlx::query_as::<_, Participation>(&format!(
            r#"
            INSERT INTO participations (guest_id, ticket_id, payment_status, transaction_code)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (guest_id, ticket_id) DO UPDATE
                SET payment_status = EXCLUDED.payment_status,
                    transaction_code = EXCLUDED.transaction_code,
                    updated_at = NOW()
                WHERE participations.payment_status <> EXCLUDED.payment_status
            RETURNING {PARTICIPATION_COLUMNS}
            "#
        ))
        .bind(guest_id)
        .bind(ticket_id)
        .bind(PaymentStatus::Confirmed.as_str())
        .bind(code)
        .fetch_optional(pool)
        .await?;

        Ok(participation)
    }

    /// 购买票档：参与记录幂等，购买记录每次追加
    pub async fn participate(
        pool: &PgPool,
        guest_id: i32,
        ticket_id: i32,
        quantity: i32,
    ) -> AppResult<ParticipationOutcome> {
        if quantity < 1 {
            return Err(AppError::Validation("Quantidade deve ser maior que zero".into()));
        }

        let ticket = Ticket::find_by_id(pool, ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ingresso não encontrado.".into()))?;

        let existing = Self::find(pool, guest_id, ticket_id).await?;
        let confirmed_before = existing
            .as_ref()
            .is_some_and(|p| p.payment_status == PaymentStatus::Confirmed);

        let (participation, newly_confirmed) = if confirmed_before {
            (existing, false)
        } else {
            match Self::confirm(pool, guest_id, ticket_id).await? {
                Some(participation) => (Some(participation), true),
                // 并发请求已经先确认了
                None => (Self::find(pool, guest_id, ticket_id).await?, false),
            }
        };
        let participation = participation.ok_or_else(|| {
            AppError::Internal(format!(
                "participation for guest {} and ticket {} vanished",
                guest_id, ticket_id
            ))
        })?;

        // 购买记录只是历史，写入失败不影响参与结果
        let purchase = match Purchase::record(pool, guest_id, &ticket, quantity).await {
            Ok(purchase) => Some(purchase),
            Err(e) => {
                tracing::warn!(
                    "Failed to record purchase for guest {} ticket {}: {}",
                    guest_id,
                    ticket_id,
                    e
                );
                None
            }
        };

        Ok(ParticipationOutcome {
            participation,
            purchase,
            event_id: ticket.event_id,
            newly_confirmed,
        })
    }

    pub async fn status_for_event(
        pool: &PgPool,
        guest_id: i32,
        event_id: i32,
    ) -> AppResult<ParticipationState> {
        let ticket_ids: Vec<i32> =
            sqlx::query_scalar("SELECT ticket_id FROM tickets WHERE event_id = $1")
                .bind(event_id)
                .fetch_all(pool)
                .await?;

        if ticket_ids.is_empty() {
            return Ok(ParticipationState::NotParticipating);
        }

        let latest: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT participation_id
            FROM participations
            WHERE guest_id = $1 AND ticket_id = ANY($2) AND payment_status = $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(guest_id)
        .bind(&ticket_ids)
        .bind(PaymentStatus::Confirmed.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(if latest.is_some() {
            ParticipationState::Participating
        } else {
            ParticipationState::NotParticipating
        })
    }
}

impl Purchase {
    pub async fn record(
        pool: &PgPool,
        guest_id: i32,
        ticket: &Ticket,
        quantity: i32,
    ) -> AppResult<Self> {
        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            r#"
            INSERT INTO purchases (guest_id, ticket_id, quantity, total_amount, payment_status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PURCHASE_COLUMNS}
            "#
        ))
        .bind(guest_id)
        .bind(ticket.ticket_id)
        .bind(quantity)
        .bind(purchase_total(ticket.price, quantity))
        .bind(PurchaseStatus::Confirmed.as_str())
        .fetch_one(pool)
        .await?;

        Ok(purchase)
    }

    pub async fn history_for_guest(
        pool: &PgPool,
        guest_id: i32,
    ) -> AppResult<Vec<PurchaseHistoryEntry>> {
        let entries = sqlx::query_as::<_, PurchaseHistoryEntry>(
            r#"
            SELECT
                p.purchase_id, p.guest_id, p.ticket_id, p.quantity, p.total_amount,
                p.payment_status, p.created_at,
                t.name AS ticket_name, t.price AS ticket_price,
                e.event_id, e.name AS event_name
            FROM purchases p
            JOIN tickets t ON t.ticket_id = p.ticket_id
            JOIN events e ON e.event_id = t.event_id
            WHERE p.guest_id = $1
            ORDER BY p.created_at DESC, p.purchase_id DESC
            "#,
        )
        .bind(guest_id)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }
}
