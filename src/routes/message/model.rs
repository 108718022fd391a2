use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};
use crate::middleware::Actor;
use crate::utils::ActorKind;

const UNKNOWN_SENDER: &str = "Usuário desconhecido";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "texto")]
    Text,
    #[serde(rename = "imagem")]
    Image,
    #[serde(rename = "audio")]
    Audio,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "texto",
            MessageKind::Image => "imagem",
            MessageKind::Audio => "audio",
        }
    }
}

impl TryFrom<String> for MessageKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "texto" => Ok(MessageKind::Text),
            "imagem" => Ok(MessageKind::Image),
            "audio" => Ok(MessageKind::Audio),
            other => Err(format!("unknown message kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    #[serde(rename = "mensagemId")]
    pub message_id: i32,
    #[serde(rename = "grupoId")]
    pub group_id: i32,
    #[serde(rename = "texto")]
    pub content: Option<String>,
    #[serde(rename = "tipo")]
    #[sqlx(try_from = "String")]
    pub kind: MessageKind,
    #[serde(rename = "usuarioId")]
    pub sender_id: i32,
    #[serde(rename = "tipoUsuario")]
    #[sqlx(try_from = "String")]
    pub sender_kind: ActorKind,
    #[serde(rename = "urlArquivo")]
    pub attachment_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Sender {
    /// 发送者记录不存在时使用占位名称
    pub fn resolve(name: Option<String>, email: Option<String>) -> Self {
        match name {
            Some(name) => Sender { name, email },
            None => Sender {
                name: UNKNOWN_SENDER.to_string(),
                email: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageWithSender {
    #[serde(flatten)]
    pub message: Message,
    #[serde(rename = "usuario")]
    pub sender: Sender,
}

#[derive(Debug, FromRow)]
struct MessageRow {
    #[sqlx(flatten)]
    message: Message,
    sender_name: Option<String>,
    sender_email: Option<String>,
}

impl From<MessageRow> for MessageWithSender {
    fn from(row: MessageRow) -> Self {
        MessageWithSender {
            message: row.message,
            sender: Sender::resolve(row.sender_name, row.sender_email),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateMessageRequest {
    #[serde(rename = "texto", alias = "conteudo")]
    pub content: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: Option<String>,
    #[serde(rename = "urlArquivo")]
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub content: Option<String>,
    pub kind: MessageKind,
    pub attachment_url: Option<String>,
}

impl CreateMessageRequest {
    pub fn validate(self) -> AppResult<NewMessage> {
        let content = self
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let attachment_url = self
            .attachment_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let kind = match self.kind {
            Some(kind) => MessageKind::try_from(kind)
                .map_err(|_| AppError::Validation("Tipo de mensagem inválido".into()))?,
            None => MessageKind::Text,
        };

        match kind {
            MessageKind::Text if content.is_none() => Err(AppError::Validation(
                "Texto da mensagem é obrigatório".into(),
            )),
            MessageKind::Image | MessageKind::Audio if attachment_url.is_none() => Err(
                AppError::Validation("URL do arquivo é obrigatória".into()),
            ),
            _ => Ok(NewMessage {
                content,
                kind,
                attachment_url,
            }),
        }
    }
}

const MESSAGE_COLUMNS: &str =
    "message_id, group_id, content, kind, sender_id, sender_kind, attachment_url, created_at";

impl Message {
    /// 调用方负责检查群组访问权限
    pub async fn create(
        pool: &PgPool,
        group_id: i32,
        actor: &Actor,
        new: NewMessage,
    ) -> AppResult<MessageWithSender> {
        let message = sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (group_id, content, kind, sender_id, sender_kind, attachment_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(group_id)
        .bind(new.content)
        .bind(new.kind.as_str())
        .bind(actor.id())
        .bind(actor.kind().as_str())
        .bind(new.attachment_url)
        .fetch_one(pool)
        .await?;

        Ok(MessageWithSender {
            message,
            sender: Sender::resolve(Some(actor.name().to_string()), Some(actor.email().to_string())),
        })
    }

    pub async fn list_for_group(pool: &PgPool, group_id: i32) -> AppResult<Vec<MessageWithSender>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT
                m.message_id, m.group_id, m.content, m.kind, m.sender_id, m.sender_kind,
                m.attachment_url, m.created_at,
                COALESCE(o.name, g.name) AS sender_name,
                COALESCE(o.email, g.email) AS sender_email
            FROM messages m
            LEFT JOIN organizers o
                ON m.sender_kind = 'organizador' AND o.organizer_id = m.sender_id
            LEFT JOIN guests g
                ON m.sender_kind = 'convidado' AND g.guest_id = m.sender_id
            WHERE m.group_id = $1
            ORDER BY m.created_at ASC, m.message_id ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(MessageWithSender::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_required_for_text_messages() {
        let req = CreateMessageRequest {
            content: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        let new = CreateMessageRequest {
            content: Some(" olá ".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(new.kind, MessageKind::Text);
        assert_eq!(new.content.as_deref(), Some("olá"));
    }

    #[test]
    fn attachments_need_a_url() {
        let req = CreateMessageRequest {
            kind: Some("imagem".into()),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        let new = CreateMessageRequest {
            kind: Some("audio".into()),
            attachment_url: Some("https://cdn.example/a.ogg".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(new.kind, MessageKind::Audio);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let req = CreateMessageRequest {
            content: Some("oi".into()),
            kind: Some("video".into()),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn conteudo_is_accepted_as_text() {
        let req: CreateMessageRequest =
            serde_json::from_value(serde_json::json!({ "conteudo": "bom dia" })).unwrap();
        assert_eq!(req.content.as_deref(), Some("bom dia"));
    }

    #[test]
    fn missing_sender_falls_back_to_placeholder() {
        let sender = Sender::resolve(None, Some("x@y.z".into()));
        assert_eq!(sender.name, UNKNOWN_SENDER);
        assert_eq!(sender.email, None);

        let json = serde_json::to_value(&sender).unwrap();
        assert_eq!(json, serde_json::json!({ "nome": "Usuário desconhecido" }));
    }
}
