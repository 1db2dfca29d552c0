//! Request/response types for the auth and tenant surface.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role a membership grants inside its tenant.
///
/// The primary membership's role is the one surfaced in session claims.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Retailer,
    Brand,
    Admin,
    Platform,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Retailer => "retailer",
            Self::Brand => "brand",
            Self::Admin => "admin",
            Self::Platform => "platform",
        }
    }

    /// Parse the database representation of a role.
    #[must_use]
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "retailer" => Some(Self::Retailer),
            "brand" => Some(Self::Brand),
            "admin" => Some(Self::Admin),
            "platform" => Some(Self::Platform),
            _ => None,
        }
    }
}

/// Verified external identity delivered by the provider callback.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SigninRequest {
    /// Identity provider that verified the email (currently only `google`).
    pub provider: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackLoginResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[schema(value_type = Object)]
    pub settings: serde_json::Value,
    #[schema(value_type = Object)]
    pub features: serde_json::Value,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserTenantResponse {
    pub id: String,
    pub user_id: String,
    pub tenant_id: String,
    pub role: Role,
    pub is_primary: bool,
    pub joined_at: String,
}

/// Live tenant lookup result, distinct from the claims baked into the token.
#[derive(Debug, Serialize, ToSchema)]
pub struct TenantInfoResponse {
    pub tenant: TenantResponse,
    #[serde(rename = "userTenant")]
    pub user_tenant: UserTenantResponse,
}
