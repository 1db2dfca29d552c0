//! Session claims and the request-visible session view.
//!
//! Claims are a read-only projection of the provisioning result. They are
//! computed once per successful sign-in handshake, embedded in the signed
//! session token, and copied verbatim into a `SessionView` on every request.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::state::AuthConfig;
use super::storage::{MembershipRecord, TenantRecord, UserRecord};
use super::token::TokenPayload;
use super::types::Role;

/// Minimal signed payload used to reconstruct a session without a database
/// round trip.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
    pub tenant_slug: String,
    pub is_admin: bool,
}

/// Session shape exposed to request handlers and the UI.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub user: SessionUser,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub tenant_id: Uuid,
    pub role: Role,
    pub tenant_slug: String,
    pub is_admin: bool,
}

/// Project the provisioning result into session claims.
///
/// `is_admin` is derived from the configured administrator identity rather
/// than the stored role.
pub(crate) fn build_claims(
    user: &UserRecord,
    tenant: &TenantRecord,
    membership: &MembershipRecord,
    config: &AuthConfig,
) -> SessionClaims {
    SessionClaims {
        user_id: user.id,
        tenant_id: tenant.id,
        role: membership.role,
        tenant_slug: tenant.slug.clone(),
        is_admin: config.is_admin_email(&user.email),
    }
}

/// Copy token claims verbatim into the request-visible session shape.
///
/// Must not touch the database; the token signature was already verified.
pub(crate) fn rehydrate_session(payload: &TokenPayload) -> SessionView {
    SessionView {
        user: SessionUser {
            id: payload.claims.user_id,
            name: payload.name.clone(),
            email: payload.email.clone(),
            image: payload.image.clone(),
            tenant_id: payload.claims.tenant_id,
            role: payload.claims.role,
            tenant_slug: payload.claims.tenant_slug.clone(),
            is_admin: payload.claims.is_admin,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(admin: Option<&str>) -> AuthConfig {
        AuthConfig::new(
            "https://foyer.dev".to_string(),
            SecretString::from("sekret".to_string()),
        )
        .with_admin_email(admin.map(str::to_string))
    }

    fn user(email: &str) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: None,
            locale: "en".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn tenant(slug: &str) -> TenantRecord {
        TenantRecord {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            slug: slug.to_string(),
            settings: serde_json::json!({}),
            features: serde_json::json!({}),
            is_active: true,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn membership(user_id: Uuid, tenant_id: Uuid, role: Role) -> MembershipRecord {
        MembershipRecord {
            id: Uuid::new_v4(),
            user_id,
            tenant_id,
            role,
            is_primary: true,
            joined_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn claims_project_provisioning_result() {
        let user = user("jane@example.com");
        let tenant = tenant("jane");
        let membership = membership(user.id, tenant.id, Role::Retailer);

        let claims = build_claims(&user, &tenant, &membership, &config(None));

        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.tenant_id, tenant.id);
        assert_eq!(claims.role, Role::Retailer);
        assert_eq!(claims.tenant_slug, "jane");
        assert!(!claims.is_admin);
    }

    #[test]
    fn admin_flag_comes_from_identity_not_role() {
        let user = user("root@foyer.dev");
        let tenant = tenant("foyer-admin");
        // Stored role intentionally differs from the admin designation.
        let membership = membership(user.id, tenant.id, Role::Retailer);

        let claims = build_claims(
            &user,
            &tenant,
            &membership,
            &config(Some("root@foyer.dev")),
        );

        assert!(claims.is_admin);
        assert_eq!(claims.role, Role::Retailer);
    }

    #[test]
    fn rehydrate_copies_claims_verbatim() {
        let claims = SessionClaims {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: Role::Admin,
            tenant_slug: "foyer-admin".to_string(),
            is_admin: true,
        };
        let payload = TokenPayload {
            claims: claims.clone(),
            name: Some("Root".to_string()),
            email: Some("root@foyer.dev".to_string()),
            image: None,
            exp: 0,
        };

        let view = rehydrate_session(&payload);

        assert_eq!(view.user.id, claims.user_id);
        assert_eq!(view.user.tenant_id, claims.tenant_id);
        assert_eq!(view.user.role, Role::Admin);
        assert_eq!(view.user.tenant_slug, "foyer-admin");
        assert!(view.user.is_admin);
        assert_eq!(view.user.name.as_deref(), Some("Root"));
        assert_eq!(view.user.email.as_deref(), Some("root@foyer.dev"));
        assert_eq!(view.user.image, None);
    }

    #[test]
    fn claims_serialize_with_camel_case_keys() {
        let claims = SessionClaims {
            user_id: Uuid::nil(),
            tenant_id: Uuid::nil(),
            role: Role::Retailer,
            tenant_slug: "jane".to_string(),
            is_admin: false,
        };
        let value = serde_json::to_value(&claims).ok();
        let Some(value) = value else {
            panic!("claims must serialize");
        };
        assert!(value.get("userId").is_some());
        assert!(value.get("tenantId").is_some());
        assert!(value.get("tenantSlug").is_some());
        assert!(value.get("isAdmin").is_some());
    }
}
