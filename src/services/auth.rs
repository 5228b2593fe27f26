//! # Authentication Service
//!
//! Login, identity lookup, and logout. Login stores the returned credentials
//! in the gateway's session context; logout clears them. The backend issues
//! stateless tokens, so logout is a purely local operation.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ldap::LdapUser;
use crate::error::ApiResult;
use crate::gateway::ApiGateway;
use crate::session::Session;

/// Credentials for the login endpoint
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Payload returned by a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

/// Client for the authentication endpoints
#[derive(Debug, Clone)]
pub struct AuthService {
    gateway: ApiGateway,
}

impl AuthService {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// Authenticate and store the returned session
    ///
    /// POST /auth/login
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        debug!(username = %username, "Logging in");

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.gateway.post("/auth/login", &request).await?;

        self.gateway
            .session()
            .store(Session::new(&response.token, &response.username));

        info!(username = %response.username, "Login succeeded");
        Ok(response)
    }

    /// Fetch the authenticated user's profile and cache it on the session
    ///
    /// GET /auth/me
    pub async fn current_user(&self) -> ApiResult<LdapUser> {
        let profile: LdapUser = self.gateway.get("/auth/me").await?;

        if let Ok(value) = serde_json::to_value(&profile) {
            self.gateway.session().set_user_info(value);
        }

        Ok(profile)
    }

    /// Discard the local session
    pub fn logout(&self) {
        info!("Logging out");
        self.gateway.session().clear();
    }
}
