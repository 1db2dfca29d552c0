//! Database helpers for identity provisioning and tenant resolution.
//!
//! Uniqueness (email among active users, slug among active tenants, one
//! primary membership per user) is enforced by partial unique indexes; the
//! resolvers here treat a unique-violation on insert as "someone else already
//! created it" and answer with a compensating re-read instead of surfacing a
//! failure.

use axum::{http::StatusCode, response::IntoResponse};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{error, Instrument};
use uuid::Uuid;

use super::state::AuthConfig;
use super::types::Role;
use super::utils::{
    email_local_part, is_unique_violation, is_unique_violation_on, slug_with_suffix, slugify,
};
use super::{ADMIN_TENANT_NAME, ADMIN_TENANT_SLUG, SLUG_MAX_ATTEMPTS};

const PRIMARY_MEMBERSHIP_CONSTRAINT: &str = "user_tenants_primary_idx";

#[derive(Clone, Debug)]
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) email: String,
    pub(crate) display_name: Option<String>,
    pub(crate) locale: String,
    pub(crate) created_at: String,
}

#[derive(Clone, Debug)]
pub(crate) struct TenantRecord {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) slug: String,
    pub(crate) settings: serde_json::Value,
    pub(crate) features: serde_json::Value,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

#[derive(Clone, Debug)]
pub(crate) struct MembershipRecord {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
    pub(crate) tenant_id: Uuid,
    pub(crate) role: Role,
    pub(crate) is_primary: bool,
    pub(crate) joined_at: String,
}

#[derive(Debug)]
pub(crate) enum ProvisionError {
    /// The user's primary tenant exists but is no longer active.
    NotFound,
    /// A uniqueness conflict that survived the retry budget.
    Conflict(&'static str),
    Database(sqlx::Error),
}

impl IntoResponse for ProvisionError {
    /// Maps provisioning failures into stable HTTP responses.
    /// Database errors are logged server-side and surfaced as `500` without
    /// leaking details; a failed handshake therefore denies the sign-in.
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Conflict(message) => (StatusCode::CONFLICT, message).into_response(),
            Self::Database(err) => {
                error!("Database error: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

enum CreateError {
    SlugTaken,
    PrimaryExists,
    Database(sqlx::Error),
}

/// Look up an active user by email, creating one on first sign-in.
///
/// Idempotent under concurrent first-sign-in attempts: losing the insert race
/// falls back to reading the winner's row.
pub(crate) async fn resolve_user(
    pool: &PgPool,
    email: &str,
    display_name: Option<&str>,
) -> Result<UserRecord, ProvisionError> {
    if let Some(user) = find_user_by_email(pool, email)
        .await
        .map_err(ProvisionError::Database)?
    {
        return Ok(user);
    }

    let query = r#"
        INSERT INTO users (email, display_name)
        VALUES ($1, $2)
        RETURNING
            id, email, display_name, locale,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
    "#;
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let insert = sqlx::query(query)
        .bind(email)
        .bind(display_name)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match insert {
        Ok(row) => user_from_row(&row).map_err(ProvisionError::Database),
        Err(err) if is_unique_violation(&err) => {
            // Lost the race; the winner's row is authoritative.
            find_user_by_email(pool, email)
                .await
                .map_err(ProvisionError::Database)?
                .ok_or(ProvisionError::Database(sqlx::Error::RowNotFound))
        }
        Err(err) => Err(ProvisionError::Database(err)),
    }
}

/// Resolve the user's primary tenant, creating tenant + membership on first
/// sign-in.
///
/// The admin designation comes from the injected configuration: that identity
/// gets the fixed admin tenant and the `admin` role, everyone else gets
/// `"{local-part}'s Organization"` and `retailer`. Slug collisions retry with
/// a numeric suffix; a concurrent primary-membership insert is answered by
/// re-reading the winner's pair.
pub(crate) async fn resolve_tenant_for_user(
    pool: &PgPool,
    user: &UserRecord,
    config: &AuthConfig,
) -> Result<(TenantRecord, MembershipRecord), ProvisionError> {
    if let Some((tenant, membership)) = find_primary_membership(pool, user.id)
        .await
        .map_err(ProvisionError::Database)?
    {
        if !tenant.is_active {
            return Err(ProvisionError::NotFound);
        }
        return Ok((tenant, membership));
    }

    let (name, base_slug, role) = if config.is_admin_email(&user.email) {
        (
            ADMIN_TENANT_NAME.to_string(),
            ADMIN_TENANT_SLUG.to_string(),
            Role::Admin,
        )
    } else {
        let local = email_local_part(&user.email);
        (
            format!("{local}'s Organization"),
            slugify(local),
            Role::Retailer,
        )
    };

    let mut attempt = 0;
    loop {
        let slug = if attempt == 0 {
            base_slug.clone()
        } else {
            slug_with_suffix(&base_slug, attempt + 1)
        };

        match insert_tenant_and_membership(pool, user.id, &name, &slug, role).await {
            Ok(pair) => return Ok(pair),
            Err(CreateError::SlugTaken) => {
                attempt += 1;
                if attempt >= SLUG_MAX_ATTEMPTS {
                    return Err(ProvisionError::Conflict("Tenant slug is unavailable."));
                }
            }
            Err(CreateError::PrimaryExists) => {
                // A concurrent resolution won; return its pair.
                let found = find_primary_membership(pool, user.id)
                    .await
                    .map_err(ProvisionError::Database)?;
                return match found {
                    Some((tenant, membership)) if tenant.is_active => Ok((tenant, membership)),
                    Some(_) => Err(ProvisionError::NotFound),
                    None => Err(ProvisionError::Database(sqlx::Error::RowNotFound)),
                };
            }
            Err(CreateError::Database(err)) => return Err(ProvisionError::Database(err)),
        }
    }
}

/// Live primary-tenant lookup for the tenant-info endpoint.
///
/// Unlike the resolver's lookup this filters inactive tenants in SQL, so an
/// inactive tenant reads as "no tenant" rather than a visible row.
pub(crate) async fn fetch_tenant_info(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<(TenantRecord, MembershipRecord)>, sqlx::Error> {
    let query = r#"
        SELECT
            t.id AS tenant_id,
            t.name,
            t.slug,
            t.settings::text AS settings,
            t.features::text AS features,
            t.is_active,
            to_char(t.created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS tenant_created_at,
            ut.id AS membership_id,
            ut.user_id,
            ut.role::text AS role,
            ut.is_primary,
            to_char(ut.joined_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS joined_at
        FROM user_tenants ut
        JOIN tenants t ON t.id = ut.tenant_id
        WHERE ut.user_id = $1 AND ut.is_primary AND t.is_active
        LIMIT 1
    "#;
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    row.map(|row| tenant_membership_from_row(&row)).transpose()
}

/// Set the database session context consumed by row-level-security policies.
pub(crate) async fn set_session_context(
    pool: &PgPool,
    tenant_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    let query = "SELECT set_session_context($1, $2)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(tenant_id)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(())
}

async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
    let query = r#"
        SELECT
            id, email, display_name, locale,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
        FROM users
        WHERE email = $1 AND is_active
        LIMIT 1
    "#;
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    row.map(|row| user_from_row(&row)).transpose()
}

/// Primary-membership lookup used by the resolver.
///
/// Returns the tenant regardless of its active flag so the caller can
/// distinguish "no membership" from "membership into a deactivated tenant".
async fn find_primary_membership(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<(TenantRecord, MembershipRecord)>, sqlx::Error> {
    let query = r#"
        SELECT
            t.id AS tenant_id,
            t.name,
            t.slug,
            t.settings::text AS settings,
            t.features::text AS features,
            t.is_active,
            to_char(t.created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS tenant_created_at,
            ut.id AS membership_id,
            ut.user_id,
            ut.role::text AS role,
            ut.is_primary,
            to_char(ut.joined_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS joined_at
        FROM user_tenants ut
        JOIN tenants t ON t.id = ut.tenant_id
        WHERE ut.user_id = $1 AND ut.is_primary
        LIMIT 1
    "#;
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    row.map(|row| tenant_membership_from_row(&row)).transpose()
}

/// Create a tenant and its primary membership as one logical unit.
async fn insert_tenant_and_membership(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    slug: &str,
    role: Role,
) -> Result<(TenantRecord, MembershipRecord), CreateError> {
    let mut tx = pool.begin().await.map_err(CreateError::Database)?;

    let query = r#"
        INSERT INTO tenants (name, slug, created_by, updated_by)
        VALUES ($1, $2, $3, $3)
        RETURNING
            id, name, slug,
            settings::text AS settings,
            features::text AS features,
            is_active,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
    "#;
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let insert = sqlx::query(query)
        .bind(name)
        .bind(slug)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let tenant_row = match insert {
        Ok(row) => row,
        Err(err) if is_unique_violation(&err) => {
            let _ = tx.rollback().await;
            return Err(CreateError::SlugTaken);
        }
        Err(err) => return Err(CreateError::Database(err)),
    };
    let tenant = tenant_from_row(&tenant_row).map_err(CreateError::Database)?;

    let query = r#"
        INSERT INTO user_tenants (user_id, tenant_id, role, is_primary, created_by, updated_by)
        VALUES ($1, $2, $3::tenant_role, TRUE, $1, $1)
        RETURNING
            id, user_id, tenant_id,
            role::text AS role,
            is_primary,
            to_char(joined_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS joined_at
    "#;
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let insert = sqlx::query(query)
        .bind(user_id)
        .bind(tenant.id)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let membership_row = match insert {
        Ok(row) => row,
        Err(err) if is_unique_violation_on(&err, PRIMARY_MEMBERSHIP_CONSTRAINT) => {
            let _ = tx.rollback().await;
            return Err(CreateError::PrimaryExists);
        }
        Err(err) => return Err(CreateError::Database(err)),
    };
    let membership = membership_from_row(&membership_row).map_err(CreateError::Database)?;

    tx.commit().await.map_err(CreateError::Database)?;

    Ok((tenant, membership))
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        locale: row.get("locale"),
        created_at: row.get("created_at"),
    })
}

fn tenant_from_row(row: &PgRow) -> Result<TenantRecord, sqlx::Error> {
    Ok(TenantRecord {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        settings: json_field(row, "settings")?,
        features: json_field(row, "features")?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}

fn membership_from_row(row: &PgRow) -> Result<MembershipRecord, sqlx::Error> {
    Ok(MembershipRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        tenant_id: row.get("tenant_id"),
        role: role_field(row, "role")?,
        is_primary: row.get("is_primary"),
        joined_at: row.get("joined_at"),
    })
}

fn tenant_membership_from_row(
    row: &PgRow,
) -> Result<(TenantRecord, MembershipRecord), sqlx::Error> {
    let tenant = TenantRecord {
        id: row.get("tenant_id"),
        name: row.get("name"),
        slug: row.get("slug"),
        settings: json_field(row, "settings")?,
        features: json_field(row, "features")?,
        is_active: row.get("is_active"),
        created_at: row.get("tenant_created_at"),
    };
    let membership = MembershipRecord {
        id: row.get("membership_id"),
        user_id: row.get("user_id"),
        tenant_id: row.get("tenant_id"),
        role: role_field(row, "role")?,
        is_primary: row.get("is_primary"),
        joined_at: row.get("joined_at"),
    };
    Ok((tenant, membership))
}

fn json_field(row: &PgRow, column: &str) -> Result<serde_json::Value, sqlx::Error> {
    let text: String = row.get(column);
    serde_json::from_str(&text).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

fn role_field(row: &PgRow, column: &str) -> Result<Role, sqlx::Error> {
    let text: String = row.get(column);
    Role::from_db(&text)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown tenant role: {text}").into()))
}
