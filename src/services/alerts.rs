//! # Alerting Service
//!
//! Alert rule CRUD, notification templates, alert history, and control of the
//! server-side evaluation engine. Rules pair a PromQL expression with a
//! threshold condition and a severity; firing rules generate history entries
//! and notifications through the configured templates.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use super::{Ack, Page};
use crate::error::ApiResult;
use crate::gateway::ApiGateway;

/// Severity grades for alert rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Delivery channel of a notification template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Email,
    Http,
    Lechat,
}

impl TemplateKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Email => "email",
            TemplateKind::Http => "http",
            TemplateKind::Lechat => "lechat",
        }
    }
}

/// Lifecycle of a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Triggered,
    Recovered,
}

/// A configured alert rule as the backend stores it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: i64,
    pub name: String,
    /// Component grouping (hdfs, hive, mysql, host, ...)
    pub category: String,
    pub promql: String,
    /// Comparison plus threshold, e.g. "> 80"
    pub condition: String,
    pub level: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress: Option<String>,
    /// Re-notification interval in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<i64>,
    pub enabled: bool,
    /// Evaluation state: ok, alerting, silenced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_alert_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_template_id: Option<i64>,
    /// Seconds the condition must hold before firing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_send_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Writable fields for creating or updating a rule
#[derive(Debug, Clone, Serialize)]
pub struct AlertRuleRequest {
    pub name: String,
    pub category: String,
    pub promql: String,
    pub condition: String,
    pub level: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<i64>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_template_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_send_count: Option<i64>,
}

/// Filters for the paginated rule listing
#[derive(Debug, Clone, Serialize)]
pub struct RuleListQuery {
    pub page: i64,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Default for RuleListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 20,
            category: None,
            level: None,
            enabled: None,
            alert_state: None,
            name: None,
        }
    }
}

/// Notification template: a delivery channel plus its parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertNotifyTemplate {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    /// Channel-specific configuration, schema varies by kind
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Writable fields for creating or updating a template
#[derive(Debug, Clone, Serialize)]
pub struct TemplateRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    pub params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A recorded alert occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertHistoryEntry {
    pub id: i64,
    pub rule_id: i64,
    pub rule_name: String,
    pub category: String,
    pub level: Severity,
    pub status: HistoryStatus,
    pub message: String,
    /// Monitored value at trigger time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    pub notified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    pub created_at: String,
}

/// Filters for the paginated history listing
#[derive(Debug, Clone, Serialize)]
pub struct HistoryListQuery {
    pub page: i64,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<HistoryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl Default for HistoryListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 20,
            rule_id: None,
            category: None,
            level: None,
            status: None,
            start_time: None,
            end_time: None,
        }
    }
}

/// State of the server-side evaluation engine
#[derive(Debug, Clone, Deserialize)]
pub struct EngineStatus {
    pub running: bool,
    #[serde(default)]
    pub uptime: Option<f64>,
    #[serde(default)]
    pub last_check: Option<String>,
}

/// Acknowledgement from an engine control endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EngineAck {
    pub status: String,
}

/// Client for the alerting endpoints
#[derive(Debug, Clone)]
pub struct AlertService {
    gateway: ApiGateway,
}

impl AlertService {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    // ===================================================================================
    // RULES
    // ===================================================================================

    /// List rules with pagination and filtering
    ///
    /// GET /alert/rule
    pub async fn rules(&self, query: &RuleListQuery) -> ApiResult<Page<AlertRule>> {
        debug!(page = query.page, size = query.size, "Listing alert rules");
        self.gateway.get_with("/alert/rule", query).await
    }

    /// List the known component categories
    ///
    /// GET /alert/rule/categories
    pub async fn rule_categories(&self) -> ApiResult<Vec<String>> {
        self.gateway.get("/alert/rule/categories").await
    }

    /// Get a rule by id
    ///
    /// GET /alert/rule/{id}
    pub async fn rule(&self, id: i64) -> ApiResult<AlertRule> {
        self.gateway.get(&format!("/alert/rule/{}", id)).await
    }

    /// Create a rule
    ///
    /// POST /alert/rule
    pub async fn create_rule(&self, rule: &AlertRuleRequest) -> ApiResult<AlertRule> {
        debug!(name = %rule.name, category = %rule.category, "Creating alert rule");
        self.gateway.post("/alert/rule", rule).await
    }

    /// Update a rule
    ///
    /// PUT /alert/rule/{id}
    pub async fn update_rule(&self, id: i64, rule: &AlertRuleRequest) -> ApiResult<AlertRule> {
        self.gateway.put(&format!("/alert/rule/{}", id), rule).await
    }

    /// Delete a rule
    ///
    /// DELETE /alert/rule/{id}
    pub async fn delete_rule(&self, id: i64) -> ApiResult<Ack> {
        self.gateway.delete(&format!("/alert/rule/{}", id)).await
    }

    // ===================================================================================
    // NOTIFICATION TEMPLATES
    // ===================================================================================

    /// List templates, optionally filtered by channel
    ///
    /// GET /alert/notify_template
    pub async fn templates(
        &self,
        kind: Option<TemplateKind>,
    ) -> ApiResult<Vec<AlertNotifyTemplate>> {
        match kind {
            Some(kind) => {
                self.gateway
                    .get_with("/alert/notify_template", &[("type", kind.as_str())])
                    .await
            }
            None => self.gateway.get("/alert/notify_template").await,
        }
    }

    /// Get a template by id
    ///
    /// GET /alert/notify_template/{id}
    pub async fn template(&self, id: i64) -> ApiResult<AlertNotifyTemplate> {
        self.gateway
            .get(&format!("/alert/notify_template/{}", id))
            .await
    }

    /// Create a template
    ///
    /// POST /alert/notify_template
    pub async fn create_template(
        &self,
        template: &TemplateRequest,
    ) -> ApiResult<AlertNotifyTemplate> {
        self.gateway.post("/alert/notify_template", template).await
    }

    /// Update a template
    ///
    /// PUT /alert/notify_template/{id}
    pub async fn update_template(
        &self,
        id: i64,
        template: &TemplateRequest,
    ) -> ApiResult<AlertNotifyTemplate> {
        self.gateway
            .put(&format!("/alert/notify_template/{}", id), template)
            .await
    }

    /// Delete a template
    ///
    /// DELETE /alert/notify_template/{id}
    pub async fn delete_template(&self, id: i64) -> ApiResult<Ack> {
        self.gateway
            .delete(&format!("/alert/notify_template/{}", id))
            .await
    }

    // ===================================================================================
    // HISTORY
    // ===================================================================================

    /// List history entries with pagination and filtering
    ///
    /// GET /alert/history
    pub async fn history(&self, query: &HistoryListQuery) -> ApiResult<Page<AlertHistoryEntry>> {
        debug!(page = query.page, size = query.size, "Listing alert history");
        self.gateway.get_with("/alert/history", query).await
    }

    /// Get a history entry by id
    ///
    /// GET /alert/history/{id}
    pub async fn history_entry(&self, id: i64) -> ApiResult<AlertHistoryEntry> {
        self.gateway.get(&format!("/alert/history/{}", id)).await
    }

    /// Delete a history entry
    ///
    /// DELETE /alert/history/{id}
    pub async fn delete_history(&self, id: i64) -> ApiResult<Ack> {
        self.gateway.delete(&format!("/alert/history/{}", id)).await
    }

    // ===================================================================================
    // EVALUATION ENGINE
    // ===================================================================================

    /// Get the evaluation engine state
    ///
    /// GET /alert/engine/status
    pub async fn engine_status(&self) -> ApiResult<EngineStatus> {
        self.gateway.get("/alert/engine/status").await
    }

    /// Start the evaluation engine
    ///
    /// POST /alert/engine/start
    pub async fn start_engine(&self) -> ApiResult<EngineAck> {
        self.gateway
            .request::<EngineAck, ()>(Method::POST, "/alert/engine/start", None)
            .await
    }

    /// Stop the evaluation engine
    ///
    /// POST /alert/engine/stop
    pub async fn stop_engine(&self) -> ApiResult<EngineAck> {
        self.gateway
            .request::<EngineAck, ()>(Method::POST, "/alert/engine/stop", None)
            .await
    }

    /// Run one evaluation pass immediately
    ///
    /// POST /alert/engine/test
    pub async fn test_engine(&self) -> ApiResult<EngineAck> {
        self.gateway
            .request::<EngineAck, ()>(Method::POST, "/alert/engine/test", None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_serialization() {
        assert_eq!(serde_json::to_value(Severity::Critical).unwrap(), "critical");
        let level: Severity = serde_json::from_value(json!("high")).unwrap();
        assert_eq!(level, Severity::High);
    }

    #[test]
    fn test_rule_deserialization() {
        let rule: AlertRule = serde_json::from_value(json!({
            "id": 3,
            "name": "hdfs-datanode-down",
            "category": "hdfs",
            "promql": "up{job=\"datanode\"}",
            "condition": "< 1",
            "level": "critical",
            "description": "DataNode process not responding",
            "labels": {"team": "bigdata"},
            "repeat": 1800,
            "enabled": true,
            "alert_state": "ok",
            "notify_template_id": 1,
            "for_duration": 120,
            "created_at": "2024-03-01 09:30:00"
        }))
        .unwrap();

        assert_eq!(rule.id, 3);
        assert_eq!(rule.level, Severity::Critical);
        assert_eq!(rule.labels.unwrap()["team"], "bigdata");
        assert_eq!(rule.for_duration, Some(120));
        assert!(rule.last_alert_time.is_none());
    }

    #[test]
    fn test_rule_page_deserialization() {
        let page: Page<AlertRule> = serde_json::from_value(json!({
            "items": [{
                "id": 1,
                "name": "host-cpu-high",
                "category": "host",
                "promql": "cpu_usage",
                "condition": "> 90",
                "level": "medium",
                "enabled": true
            }],
            "total": 1,
            "page": 1,
            "size": 20
        }))
        .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "host-cpu-high");
    }

    #[test]
    fn test_rule_query_default_and_serialization() {
        let query = RuleListQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.size, 20);

        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value, json!({"page": 1, "size": 20}));

        let filtered = RuleListQuery {
            category: Some("hive".to_string()),
            level: Some(Severity::Low),
            ..Default::default()
        };
        let value = serde_json::to_value(&filtered).unwrap();
        assert_eq!(value["category"], "hive");
        assert_eq!(value["level"], "low");
    }

    #[test]
    fn test_template_kind_field_name() {
        let template: AlertNotifyTemplate = serde_json::from_value(json!({
            "id": 1,
            "name": "ops-email",
            "type": "email",
            "params": {"smtp_server": "mail.internal", "smtp_port": 25}
        }))
        .unwrap();

        assert_eq!(template.kind, TemplateKind::Email);
        assert_eq!(template.params["smtp_port"], 25);

        let request = TemplateRequest {
            name: "hook".to_string(),
            kind: TemplateKind::Http,
            params: json!({"url": "http://hook.internal"}),
            description: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "http");
    }

    #[test]
    fn test_history_entry_deserialization() {
        let entry: AlertHistoryEntry = serde_json::from_value(json!({
            "id": 9,
            "rule_id": 3,
            "rule_name": "hdfs-datanode-down",
            "category": "hdfs",
            "level": "critical",
            "status": "triggered",
            "message": "DataNode down on dn-03",
            "alert_value": "0",
            "notified": true,
            "notified_at": "2024-03-02 04:11:09",
            "created_at": "2024-03-02 04:11:02"
        }))
        .unwrap();

        assert_eq!(entry.status, HistoryStatus::Triggered);
        assert!(entry.notified);
        assert!(entry.resolved_at.is_none());
    }

    #[test]
    fn test_engine_status_deserialization() {
        let status: EngineStatus = serde_json::from_value(json!({
            "running": true,
            "uptime": 86400.5,
            "last_check": "2024-03-02 04:10:00"
        }))
        .unwrap();
        assert!(status.running);

        let minimal: EngineStatus = serde_json::from_value(json!({"running": false})).unwrap();
        assert!(!minimal.running);
        assert!(minimal.uptime.is_none());
    }
}
