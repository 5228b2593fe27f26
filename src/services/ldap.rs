//! # LDAP Directory Service
//!
//! User and group management against the platform's LDAP integration. The
//! directory endpoints take the target environment in the request body and
//! respond with the usual envelope.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Ack;
use crate::error::ApiResult;
use crate::gateway::ApiGateway;

/// Directory account entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdapUser {
    pub uid: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        rename = "gidNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub gid_number: Option<String>,
    #[serde(
        rename = "homeDirectory",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub home_directory: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Directory group entry with resolved members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapGroup {
    pub groupname: String,
    #[serde(
        rename = "gidNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub gid_number: Option<String>,
    #[serde(default)]
    pub members: Vec<LdapUser>,
}

/// Parameters for creating a directory account
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest {
    pub env: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "gidNumber", skip_serializing_if = "Option::is_none")]
    pub gid_number: Option<String>,
    #[serde(rename = "homeDirectory", skip_serializing_if = "Option::is_none")]
    pub home_directory: Option<String>,
}

/// Parameters for creating a directory group
#[derive(Debug, Clone, Serialize)]
pub struct CreateGroupRequest {
    pub env: String,
    pub groupname: String,
    #[serde(rename = "gidNumber", skip_serializing_if = "Option::is_none")]
    pub gid_number: Option<String>,
}

/// Parameters for adding a user to a group
#[derive(Debug, Clone, Serialize)]
pub struct GroupMembershipRequest {
    pub env: String,
    pub username: String,
    pub groupname: String,
}

/// Acknowledgement for account creation, echoing the created entry
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserAck {
    pub success: bool,
    #[serde(default)]
    pub user: Option<LdapUser>,
}

/// Acknowledgement for group creation, echoing the created entry
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroupAck {
    pub success: bool,
    #[serde(default)]
    pub group: Option<LdapGroup>,
}

#[derive(Serialize)]
struct EnvParam<'a> {
    env: &'a str,
}

#[derive(Serialize)]
struct UserLookup<'a> {
    uid: &'a str,
    env: &'a str,
}

#[derive(Serialize)]
struct GroupLookup<'a> {
    groupname: &'a str,
    env: &'a str,
}

/// Client for the LDAP directory endpoints
#[derive(Debug, Clone)]
pub struct LdapService {
    gateway: ApiGateway,
}

impl LdapService {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// List directory users in an environment
    ///
    /// POST /ldap/users
    pub async fn users(&self, env: &str) -> ApiResult<Vec<LdapUser>> {
        debug!(env = %env, "Listing LDAP users");
        self.gateway.post("/ldap/users", &EnvParam { env }).await
    }

    /// Look up a single user by uid
    ///
    /// POST /ldap/user/info
    pub async fn user_info(&self, uid: &str, env: &str) -> ApiResult<LdapUser> {
        self.gateway
            .post("/ldap/user/info", &UserLookup { uid, env })
            .await
    }

    /// List directory groups in an environment
    ///
    /// POST /ldap/groups
    pub async fn groups(&self, env: &str) -> ApiResult<Vec<LdapGroup>> {
        debug!(env = %env, "Listing LDAP groups");
        self.gateway.post("/ldap/groups", &EnvParam { env }).await
    }

    /// Look up a single group with its members
    ///
    /// POST /ldap/group/info
    pub async fn group_info(&self, groupname: &str, env: &str) -> ApiResult<LdapGroup> {
        self.gateway
            .post("/ldap/group/info", &GroupLookup { groupname, env })
            .await
    }

    /// Create a directory account
    ///
    /// POST /ldap/user/create
    pub async fn create_user(&self, request: &CreateUserRequest) -> ApiResult<CreateUserAck> {
        debug!(env = %request.env, username = %request.username, "Creating LDAP user");
        self.gateway.post("/ldap/user/create", request).await
    }

    /// Create a directory group
    ///
    /// POST /ldap/group/create
    pub async fn create_group(&self, request: &CreateGroupRequest) -> ApiResult<CreateGroupAck> {
        debug!(env = %request.env, groupname = %request.groupname, "Creating LDAP group");
        self.gateway.post("/ldap/group/create", request).await
    }

    /// Add an existing user to a group
    ///
    /// POST /ldap/group/add
    pub async fn add_user_to_group(&self, request: &GroupMembershipRequest) -> ApiResult<Ack> {
        self.gateway.post("/ldap/group/add", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_deserialization() {
        let user: LdapUser = serde_json::from_value(json!({
            "uid": "u1001",
            "username": "alice",
            "email": "alice@example.com",
            "gidNumber": "500",
            "homeDirectory": "/home/alice",
            "groups": ["ops", "hadoop"]
        }))
        .unwrap();

        assert_eq!(user.uid, "u1001");
        assert_eq!(user.gid_number.as_deref(), Some("500"));
        assert_eq!(user.home_directory.as_deref(), Some("/home/alice"));
        assert_eq!(user.groups, vec!["ops", "hadoop"]);
    }

    #[test]
    fn test_user_minimal_fields() {
        let user: LdapUser = serde_json::from_value(json!({
            "uid": "u1",
            "username": "bob"
        }))
        .unwrap();

        assert!(user.email.is_none());
        assert!(user.groups.is_empty());
    }

    #[test]
    fn test_group_deserialization() {
        let group: LdapGroup = serde_json::from_value(json!({
            "groupname": "hadoop",
            "gidNumber": "600",
            "members": [{"uid": "u1", "username": "bob", "groups": []}]
        }))
        .unwrap();

        assert_eq!(group.groupname, "hadoop");
        assert_eq!(group.members.len(), 1);
    }

    #[test]
    fn test_create_user_request_serializes_ldap_attribute_names() {
        let request = CreateUserRequest {
            env: "prod".to_string(),
            username: "carol".to_string(),
            email: None,
            gid_number: Some("500".to_string()),
            home_directory: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["gidNumber"], "500");
        assert!(value.get("homeDirectory").is_none());
        assert!(value.get("email").is_none());
    }

    #[test]
    fn test_create_user_ack() {
        let ack: CreateUserAck = serde_json::from_value(json!({
            "success": true,
            "user": {"uid": "u2", "username": "carol", "groups": []}
        }))
        .unwrap();

        assert!(ack.success);
        assert_eq!(ack.user.unwrap().username, "carol");
    }
}
