use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of JWT. Only access tokens authenticate API calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
}

/// JWT payload issued by the external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,     // user ID
    pub email: String, // verified email, drives role resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
    #[serde(default = "access")]
    pub kind: TokenKind,
}

fn access() -> TokenKind {
    TokenKind::Access
}
