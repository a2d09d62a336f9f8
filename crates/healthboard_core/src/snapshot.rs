//! Payloads returned by the backend for each tab.
//!
//! Field names follow the backend's PascalCase JSON. Collections default to
//! empty and scalars to `None` so partially collected servers still decode.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::ViewKind;

/// Scalar the backend sometimes sends as a string, sometimes as a number or list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LooseText(pub String);

impl LooseText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for LooseText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(LooseText(value_to_text(&value)))
    }
}

pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

pub(crate) fn text(value: &Option<LooseText>) -> &str {
    value.as_ref().map(LooseText::as_str).unwrap_or("")
}

/// Fields shared by every snapshot payload.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SnapshotMeta {
    pub last_update: Option<LooseText>,
    pub collection_duration: Option<LooseText>,
    #[serde(rename = "error")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Health(HealthSnapshot),
    Clusters(ClustersSnapshot),
    FileShares(FileSharesSnapshot),
    SqlInstances(SqlSnapshot),
    MessageQueues(QueuesSnapshot),
    RoleSwitches(RoleSwitchSnapshot),
}

impl Snapshot {
    pub fn meta(&self) -> &SnapshotMeta {
        match self {
            Snapshot::Health(s) => &s.meta,
            Snapshot::Clusters(s) => &s.meta,
            Snapshot::FileShares(s) => &s.meta,
            Snapshot::SqlInstances(s) => &s.meta,
            Snapshot::MessageQueues(s) => &s.meta,
            Snapshot::RoleSwitches(s) => &s.meta,
        }
    }

    /// Opaque version token; `None` when the payload carries no `LastUpdate`.
    pub fn version(&self) -> Option<&str> {
        self.meta()
            .last_update
            .as_ref()
            .map(LooseText::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn error(&self) -> Option<&str> {
        self.meta().error.as_deref().filter(|e| !e.is_empty())
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            Snapshot::Health(_) => ViewKind::HealthDashboard,
            Snapshot::Clusters(_) => ViewKind::Clusters,
            Snapshot::FileShares(_) => ViewKind::FileShares,
            Snapshot::SqlInstances(_) => ViewKind::SqlInstances,
            Snapshot::MessageQueues(_) => ViewKind::MessageQueues,
            Snapshot::RoleSwitches(_) => ViewKind::RoleSwitches,
        }
    }
}

/// Decodes a snapshot body for the given tab shape.
///
/// Returns `Ok(None)` for tabs that have no snapshot (the event log).
pub fn decode_snapshot(kind: ViewKind, body: &str) -> Result<Option<Snapshot>, serde_json::Error> {
    let snapshot = match kind {
        ViewKind::HealthDashboard => Snapshot::Health(serde_json::from_str(body)?),
        ViewKind::Clusters => Snapshot::Clusters(serde_json::from_str(body)?),
        ViewKind::FileShares => Snapshot::FileShares(serde_json::from_str(body)?),
        ViewKind::SqlInstances => Snapshot::SqlInstances(serde_json::from_str(body)?),
        ViewKind::MessageQueues => Snapshot::MessageQueues(serde_json::from_str(body)?),
        ViewKind::RoleSwitches => Snapshot::RoleSwitches(serde_json::from_str(body)?),
        ViewKind::EventLog => return Ok(None),
    };
    Ok(Some(snapshot))
}

// --- health ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HealthSnapshot {
    #[serde(flatten)]
    pub meta: SnapshotMeta,
    pub total_servers: Option<LooseText>,
    pub success_count: Option<LooseText>,
    pub failed_count: Option<LooseText>,
    pub servers: Vec<ServerHealth>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServerHealth {
    pub server_name: String,
    #[serde(rename = "DMZGroup")]
    pub dmz_group: Option<String>,
    pub collected_at: Option<LooseText>,
    pub error: Option<String>,
    #[serde(rename = "CPU")]
    pub cpu: Option<f64>,
    #[serde(rename = "RAM")]
    pub ram: Option<RamUsage>,
    pub disks: Vec<DiskUsage>,
    #[serde(rename = "TopCPUServices")]
    pub top_cpu_services: Vec<ProcessUsage>,
    #[serde(rename = "TopRAMServices")]
    pub top_ram_services: Vec<ProcessUsage>,
    #[serde(rename = "DServices")]
    pub d_services: Vec<ServiceState>,
    pub trellix_status: Vec<ServiceState>,
    pub firewall: Option<FirewallProfiles>,
    #[serde(rename = "IIS")]
    pub iis: Option<IisStatus>,
    pub pending_updates: Option<PendingUpdates>,
}

impl ServerHealth {
    pub fn ram_percent(&self) -> Option<f64> {
        self.ram.as_ref().and_then(|ram| ram.percent_used)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RamUsage {
    pub percent_used: Option<f64>,
    #[serde(rename = "UsedGB")]
    pub used_gb: Option<f64>,
    #[serde(rename = "TotalGB")]
    pub total_gb: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DiskUsage {
    pub drive: String,
    #[serde(rename = "FreeGB")]
    pub free_gb: Option<f64>,
    #[serde(rename = "TotalGB")]
    pub total_gb: Option<f64>,
    pub percent_free: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProcessUsage {
    pub name: String,
    #[serde(rename = "CPUPercent")]
    pub cpu_percent: Option<f64>,
    #[serde(rename = "MemoryMB")]
    pub memory_mb: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceState {
    pub name: String,
    pub display_name: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FirewallProfiles {
    pub domain: bool,
    pub private: bool,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IisStatus {
    pub installed: bool,
    pub service_state: Option<String>,
    pub error: Option<String>,
    pub app_pools: Vec<IisItem>,
    pub sites: Vec<IisItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IisItem {
    pub name: String,
    pub state: Option<String>,
    pub bindings: Option<LooseText>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PendingUpdates {
    pub enabled: bool,
    pub count: u32,
    pub error: Option<String>,
    pub updates: Vec<PendingUpdate>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PendingUpdate {
    pub name: String,
    #[serde(rename = "ArticleID")]
    pub article_id: Option<LooseText>,
}

// --- clusters -------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ClustersSnapshot {
    #[serde(flatten)]
    pub meta: SnapshotMeta,
    pub total_clusters: Option<u32>,
    pub online_count: Option<u32>,
    pub failed_count: Option<u32>,
    pub loaded_files: Vec<LooseText>,
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Cluster {
    pub cluster_name: String,
    pub cluster_type: Option<String>,
    pub error: Option<String>,
    pub nodes: Vec<ClusterNode>,
    pub roles: Vec<ClusterRole>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ClusterNode {
    pub name: String,
    pub state: Option<String>,
    #[serde(rename = "IPAddresses")]
    pub ip_addresses: Option<LooseText>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ClusterRole {
    pub name: String,
    pub state: Option<String>,
    pub owner_node: Option<String>,
    pub port: Option<LooseText>,
    #[serde(rename = "IPAddresses")]
    pub ip_addresses: Option<LooseText>,
}

// --- file shares ----------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FileSharesSnapshot {
    #[serde(flatten)]
    pub meta: SnapshotMeta,
    pub total_servers: Option<u32>,
    pub file_servers: Vec<FileServer>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FileServer {
    pub server_name: String,
    pub share_count: Option<u32>,
    pub error: Option<String>,
    pub shares: Vec<FileShare>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FileShare {
    pub share_name: String,
    pub share_path: Option<String>,
    pub share_state: Option<String>,
}

// --- SQL ------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SqlSnapshot {
    #[serde(flatten)]
    pub meta: SnapshotMeta,
    pub total_instances: Option<u32>,
    pub instances: Vec<SqlInstance>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SqlInstance {
    pub server_name: String,
    #[serde(rename = "SQLVersion")]
    pub sql_version: Option<String>,
    pub database_count: Option<u32>,
    pub error: Option<String>,
    pub databases: Vec<SqlDatabase>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SqlDatabase {
    pub database_name: String,
    pub compatibility_level: Option<LooseText>,
    #[serde(rename = "DataFileSizeMB")]
    pub data_file_size_mb: Option<f64>,
    #[serde(rename = "LogFileSizeMB")]
    pub log_file_size_mb: Option<f64>,
    #[serde(rename = "TotalSizeMB")]
    pub total_size_mb: Option<f64>,
}

// --- MQ -------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct QueuesSnapshot {
    #[serde(flatten)]
    pub meta: SnapshotMeta,
    pub total_servers: Option<u32>,
    pub servers: Vec<MqServer>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MqServer {
    pub server_name: String,
    pub error: Option<String>,
    pub queue_managers: Vec<QueueManager>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct QueueManager {
    pub queue_manager: String,
    pub status: Option<String>,
    pub port: Option<LooseText>,
    pub queues: Vec<Queue>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Queue {
    pub queue_name: String,
    pub current_depth: Option<LooseText>,
    pub max_depth: Option<LooseText>,
}

// --- role switches --------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RoleSwitchSnapshot {
    #[serde(flatten)]
    pub meta: SnapshotMeta,
    pub total_events: Option<u32>,
    pub days_back: Option<u32>,
    pub switches: Vec<RoleSwitch>,
}

impl RoleSwitchSnapshot {
    pub fn days_back(&self) -> u32 {
        self.days_back.unwrap_or(30)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RoleSwitch {
    pub time_created: Option<LooseText>,
    pub cluster_name: Option<String>,
    pub cluster_type: Option<String>,
    pub event_type: Option<String>,
    pub role_name: Option<String>,
    pub source_node: Option<String>,
    pub target_node: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_payload_decodes_with_missing_sections() {
        let body = r#"{
            "LastUpdate": "2024-01-01T00:00:00",
            "CollectionDuration": "12s",
            "TotalServers": 1,
            "Servers": [{ "ServerName": "SQL01", "CPU": 42, "RAM": { "PercentUsed": 91.5 } }]
        }"#;
        let snapshot = decode_snapshot(ViewKind::HealthDashboard, body)
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.version(), Some("2024-01-01T00:00:00"));
        let Snapshot::Health(health) = snapshot else {
            panic!("expected health snapshot");
        };
        assert_eq!(health.servers[0].cpu, Some(42.0));
        assert_eq!(health.servers[0].ram_percent(), Some(91.5));
        assert!(health.servers[0].disks.is_empty());
    }

    #[test]
    fn loose_text_accepts_numbers_and_lists() {
        let body = r#"{ "Clusters": [{ "ClusterName": "C1",
            "Nodes": [{ "Name": "N1", "IPAddresses": ["10.0.0.1", "10.0.0.2"] }],
            "Roles": [{ "Name": "QM1", "Port": 1414 }] }] }"#;
        let Some(Snapshot::Clusters(clusters)) =
            decode_snapshot(ViewKind::Clusters, body).unwrap()
        else {
            panic!("expected clusters snapshot");
        };
        let cluster = &clusters.clusters[0];
        assert_eq!(text(&cluster.nodes[0].ip_addresses), "10.0.0.1, 10.0.0.2");
        assert_eq!(text(&cluster.roles[0].port), "1414");
        assert_eq!(Snapshot::Clusters(clusters.clone()).version(), None);
    }

    #[test]
    fn remote_error_field_is_exposed() {
        let snapshot = decode_snapshot(ViewKind::FileShares, r#"{ "error": "no data file" }"#)
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.error(), Some("no data file"));
    }

    #[test]
    fn event_log_has_no_snapshot() {
        assert!(decode_snapshot(ViewKind::EventLog, "{}").unwrap().is_none());
    }
}
