//! # Cluster Monitoring Service
//!
//! Read-only views over the Prometheus-backed cluster state: a fleet overview,
//! the per-node listing, and the health of the big-data components (HDFS, Hive,
//! ZooKeeper, ...) broken down by service and instance.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::Page;
use crate::error::ApiResult;
use crate::gateway::ApiGateway;

/// Healthy/total instance counts for one service
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceStatus {
    pub healthy: i64,
    pub total: i64,
}

/// Fleet-wide summary
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterOverview {
    pub total_nodes: i64,
    pub healthy_nodes: i64,
    pub unhealthy_nodes: i64,
    pub avg_cpu_usage: f64,
    pub avg_memory_usage: f64,
    pub avg_disk_usage: f64,
    #[serde(default)]
    pub services_status: HashMap<String, ServiceStatus>,
    pub update_time: String,
}

/// One physical or virtual host in the cluster
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterNode {
    pub hostname: String,
    pub instance: String,
    pub job: String,
    pub status: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub network_bytes_recv: f64,
    pub network_bytes_sent: f64,
    pub load_1m: f64,
    /// Seconds since boot
    pub uptime: f64,
    pub uptime_formatted: String,
    pub last_seen: String,
}

/// Filters for the node listing
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

/// One scraped instance of a component service
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentInstance {
    pub instance: String,
    pub job: String,
    pub status: String,
    pub value: f64,
    /// Raw Prometheus labels for the instance
    #[serde(default)]
    pub metric: HashMap<String, Value>,
}

/// A named service within a component (e.g. NameNode within HDFS)
#[derive(Debug, Clone, Deserialize)]
pub struct MonitoredService {
    pub name: String,
    pub display_name: String,
    /// PromQL expression backing the service status
    pub query: String,
    #[serde(default)]
    pub instances: Vec<ComponentInstance>,
    pub total_instances: i64,
    pub healthy_instances: i64,
    #[serde(default)]
    pub error: Option<String>,
}

/// A detailed metric attached to a component
#[derive(Debug, Clone, Deserialize)]
pub struct MetricDetail {
    pub description: String,
    pub query: String,
    pub result: Value,
}

/// Aggregated health of one big-data component
#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    /// healthy, warning, unhealthy, or unknown
    pub status: String,
    pub total_instances: i64,
    pub healthy_instances: i64,
    #[serde(default)]
    pub services: Vec<MonitoredService>,
    pub update_time: String,
    #[serde(default)]
    pub detailed_metrics: Option<HashMap<String, MetricDetail>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// All components keyed by name (hdfs, hive, zookeeper, ...)
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentsResponse {
    #[serde(default)]
    pub components: HashMap<String, Component>,
}

/// Client for the cluster monitoring endpoints
#[derive(Debug, Clone)]
pub struct ClusterService {
    gateway: ApiGateway,
}

impl ClusterService {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// Get the fleet-wide summary
    ///
    /// GET /cluster/overview
    pub async fn overview(&self) -> ApiResult<ClusterOverview> {
        self.gateway.get("/cluster/overview").await
    }

    /// List nodes with optional filters and pagination
    ///
    /// GET /cluster/nodes
    pub async fn nodes(&self, query: &NodesQuery) -> ApiResult<Page<ClusterNode>> {
        self.gateway.get_with("/cluster/nodes", query).await
    }

    /// Get the health of every monitored component
    ///
    /// GET /cluster/components
    pub async fn components(&self) -> ApiResult<ComponentsResponse> {
        self.gateway.get("/cluster/components").await
    }

    /// Get one component with its detailed metrics
    ///
    /// GET /cluster/components/{name}
    pub async fn component(&self, name: &str) -> ApiResult<Component> {
        self.gateway
            .get(&format!("/cluster/components/{}", name))
            .await
    }
}
