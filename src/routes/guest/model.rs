use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::error::{AppError, AppResult};
use crate::utils::{digits_only, hash_password, verify_password};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Guest {
    #[serde(rename = "convidadoId")]
    pub guest_id: i32,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "cpf")]
    pub national_id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[serde(rename = "genero")]
    pub gender: Option<String>,
    #[serde(rename = "dataNascimento")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "endereco")]
    pub address: Option<String>,
    #[serde(rename = "cidade")]
    pub city: Option<String>,
    #[serde(rename = "cep")]
    pub postal_code: Option<String>,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(rename = "sobreMim")]
    pub bio: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGuestRequest {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "senha")]
    pub password: Option<String>,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[serde(rename = "genero")]
    pub gender: Option<String>,
    #[serde(rename = "dataNascimento")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "endereco")]
    pub address: Option<String>,
    #[serde(rename = "cidade")]
    pub city: Option<String>,
    pub cep: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGuestRequest {
    #[serde(rename = "nome")]
    pub name: Option<String>,
    #[serde(rename = "sobreMim")]
    pub bio: Option<String>,
    #[serde(rename = "genero")]
    pub gender: Option<String>,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[serde(rename = "dataNascimento")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "endereco")]
    pub address: Option<String>,
    #[serde(rename = "cidade")]
    pub city: Option<String>,
    pub cep: Option<String>,
    #[serde(rename = "senha")]
    pub password: Option<String>,
}

const GUEST_COLUMNS: &str = "guest_id, name, national_id, email, password_hash, phone, gender, \
     birth_date, address, city, postal_code, avatar_url, bio, created_at";

/// 清洗后为空的号码按 NULL 存储
fn cleaned_digits(value: Option<&str>) -> Option<String> {
    value.map(digits_only).filter(|v| !v.is_empty())
}

impl Guest {
    pub async fn create(pool: &PgPool, req: CreateGuestRequest) -> AppResult<Self> {
        let national_id = cleaned_digits(req.cpf.as_deref());
        let email = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let (Some(national_id), Some(email)) = (national_id, email) else {
            return Err(AppError::Validation("CPF e email são obrigatórios".into()));
        };
        let password = req
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Validation("Senha é obrigatória".into()))?;

        // 先查重，给出具体的冲突字段；唯一索引兜底并发情况
        let (cpf_taken, email_taken): (bool, bool) = sqlx::query_as(
            r#"
            SELECT
                EXISTS(SELECT 1 FROM guests WHERE national_id = $1),
                EXISTS(SELECT 1 FROM guests WHERE email = $2)
            "#,
        )
        .bind(&national_id)
        .bind(email)
        .fetch_one(pool)
        .await?;

        if cpf_taken {
            return Err(AppError::Conflict("CPF já cadastrado".into()));
        }
        if email_taken {
            return Err(AppError::Conflict("Email já cadastrado".into()));
        }

        let password_hash = hash_password(&password)?;

        sqlx::query_as::<_, Guest>(&format!(
            r#"
            INSERT INTO guests (
                name, national_id, email, password_hash, phone, gender,
                birth_date, address, city, postal_code
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {GUEST_COLUMNS}
            "#
        ))
        .bind(req.name.unwrap_or_default())
        .bind(&national_id)
        .bind(email)
        .bind(password_hash)
        .bind(cleaned_digits(req.phone.as_deref()))
        .bind(req.gender)
        .bind(req.birth_date)
        .bind(req.address)
        .bind(req.city)
        .bind(cleaned_digits(req.cep.as_deref()))
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Dados duplicados (CPF ou email já existem)"))
    }

    pub async fn find_by_id(pool: &PgPool, guest_id: i32) -> AppResult<Option<Self>> {
        let guest = sqlx::query_as::<_, Guest>(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests WHERE guest_id = $1"
        ))
        .bind(guest_id)
        .fetch_optional(pool)
        .await?;

        Ok(guest)
    }

    pub async fn login(pool: &PgPool, email: &str, password: &str) -> AppResult<Self> {
        let guest = sqlx::query_as::<_, Guest>(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests WHERE email = $1"
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Credenciais inválidas".into()))?;

        if !verify_password(password, &guest.password_hash)? {
            return Err(AppError::Unauthenticated("Credenciais inválidas".into()));
        }

        Ok(guest)
    }

    /// 只更新请求中出现的字段
    pub async fn update(pool: &PgPool, guest_id: i32, req: UpdateGuestRequest) -> AppResult<Self> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE guests SET ");
        let mut fields = builder.separated(", ");

        if let Some(name) = req.name {
            fields.push("name = ").push_bind_unseparated(name);
        }
        if let Some(bio) = req.bio {
            fields.push("bio = ").push_bind_unseparated(bio);
        }
        if let Some(gender) = req.gender {
            fields.push("gender = ").push_bind_unseparated(gender);
        }
        if let Some(phone) = req.phone.as_deref() {
            fields.push("phone = ").push_bind_unseparated(cleaned_digits(Some(phone)));
        }
        if let Some(birth_date) = req.birth_date {
            fields.push("birth_date = ").push_bind_unseparated(birth_date);
        }
        if let Some(address) = req.address {
            fields.push("address = ").push_bind_unseparated(address);
        }
        if let Some(city) = req.city {
            fields.push("city = ").push_bind_unseparated(city);
        }
        if let Some(cep) = req.cep.as_deref() {
            fields.push("postal_code = ").push_bind_unseparated(cleaned_digits(Some(cep)));
        }
        if let Some(password) = req.password.filter(|p| !p.trim().is_empty()) {
            fields
                .push("password_hash = ")
                .push_bind_unseparated(hash_password(&password)?);
        }
        // 保证 SET 子句非空
        fields.push("guest_id = guest_id");

        builder.push(" WHERE guest_id = ").push_bind(guest_id);
        builder.push(format!(" RETURNING {GUEST_COLUMNS}"));

        builder
            .build_query_as::<Guest>()
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Convidado não encontrado".into()))
    }
}
