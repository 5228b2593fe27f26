//! # Domain Services
//!
//! Typed wrappers over the request gateway for the platform's feature
//! endpoints: authentication, alerting, LDAP directory management, and
//! cluster statistics. Every method is a thin call through the gateway, so
//! failures arrive as [`crate::ApiError`] and callers branch on kind; a list
//! caller that prefers degraded output can fall back to an empty page itself.

pub mod alerts;
pub mod auth;
pub mod cluster;
pub mod ldap;

pub use alerts::{
    AlertHistoryEntry, AlertNotifyTemplate, AlertRule, AlertRuleRequest, AlertService,
    EngineStatus, HistoryListQuery, HistoryStatus, RuleListQuery, Severity, TemplateKind,
    TemplateRequest,
};
pub use auth::{AuthService, LoginResponse};
pub use cluster::{ClusterNode, ClusterOverview, ClusterService, Component, NodesQuery};
pub use ldap::{
    CreateGroupRequest, CreateUserRequest, GroupMembershipRequest, LdapGroup, LdapService,
    LdapUser,
};

use serde::{Deserialize, Serialize};

/// Paginated list envelope used by the platform's list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

impl<T> Default for Page<T> {
    /// An empty first page, the customary fallback for list callers that
    /// tolerate a degraded view
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            size: 20,
        }
    }
}

/// Bare acknowledgement returned by mutation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}
