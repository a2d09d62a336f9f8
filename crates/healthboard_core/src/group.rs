use std::fmt;

use serde::{Deserialize, Serialize};

/// Wire identifier of a tab, sent to the backend as `group=<id>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> ViewKind {
        ViewKind::from_group(&self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Rendering shape and behaviour of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    HealthDashboard,
    Clusters,
    FileShares,
    SqlInstances,
    MessageQueues,
    RoleSwitches,
    EventLog,
}

/// Granularity at which a search query is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    /// The whole card text decides; matched fields get marks.
    WholeCard,
    /// The card label or any nested table row decides.
    LabelOrRows,
    /// Every table row is matched and hidden on its own.
    Rows,
    /// Rows are matched on normalized fields before rendering.
    Structured,
}

/// What the refresh button does on a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Drive the remote collection task and wait for a new snapshot.
    Task,
    /// Re-fetch the current snapshot.
    Reload,
    /// Refresh is not available.
    None,
}

impl ViewKind {
    pub const INFRA: [ViewKind; 5] = [
        ViewKind::Clusters,
        ViewKind::FileShares,
        ViewKind::SqlInstances,
        ViewKind::MessageQueues,
        ViewKind::RoleSwitches,
    ];

    /// Every id that is not a known infrastructure or log tab is a health group.
    pub fn from_group(id: &str) -> Self {
        match id {
            "ClustersWindows" => ViewKind::Clusters,
            "UdzialySieciowe" => ViewKind::FileShares,
            "InstancjeSQL" => ViewKind::SqlInstances,
            "KolejkiMQ" => ViewKind::MessageQueues,
            "PrzelaczeniaRol" => ViewKind::RoleSwitches,
            "LogiEventLog" => ViewKind::EventLog,
            _ => ViewKind::HealthDashboard,
        }
    }

    /// Fixed wire id, `None` for health groups which are named by configuration.
    pub fn group_id(self) -> Option<&'static str> {
        match self {
            ViewKind::HealthDashboard => None,
            ViewKind::Clusters => Some("ClustersWindows"),
            ViewKind::FileShares => Some("UdzialySieciowe"),
            ViewKind::SqlInstances => Some("InstancjeSQL"),
            ViewKind::MessageQueues => Some("KolejkiMQ"),
            ViewKind::RoleSwitches => Some("PrzelaczeniaRol"),
            ViewKind::EventLog => Some("LogiEventLog"),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewKind::HealthDashboard => "Server health",
            ViewKind::Clusters => "Windows clusters",
            ViewKind::FileShares => "File shares",
            ViewKind::SqlInstances => "SQL instances",
            ViewKind::MessageQueues => "MQ queues",
            ViewKind::RoleSwitches => "Role switches",
            ViewKind::EventLog => "Event logs",
        }
    }

    pub fn is_infra(self) -> bool {
        Self::INFRA.contains(&self)
    }

    pub fn match_scope(self) -> MatchScope {
        match self {
            ViewKind::HealthDashboard | ViewKind::Clusters => MatchScope::WholeCard,
            ViewKind::FileShares | ViewKind::SqlInstances => MatchScope::LabelOrRows,
            ViewKind::MessageQueues | ViewKind::RoleSwitches => MatchScope::Rows,
            ViewKind::EventLog => MatchScope::Structured,
        }
    }

    /// Whether the tab shows the shared search bar.
    pub fn search_placeholder(self) -> Option<&'static str> {
        match self {
            ViewKind::HealthDashboard => Some("Search servers..."),
            ViewKind::Clusters => Some("Search clusters..."),
            ViewKind::FileShares => Some("Search shares..."),
            ViewKind::SqlInstances => Some("Search SQL instances..."),
            ViewKind::MessageQueues => Some("Search MQ queues..."),
            ViewKind::RoleSwitches => Some("Search role switches..."),
            ViewKind::EventLog => None,
        }
    }

    pub fn is_searchable(self) -> bool {
        self.search_placeholder().is_some()
    }

    pub fn supports_critical_filter(self) -> bool {
        matches!(self, ViewKind::HealthDashboard)
    }

    pub fn is_sortable(self) -> bool {
        matches!(self, ViewKind::RoleSwitches | ViewKind::EventLog)
    }

    pub fn refresh_mode(self) -> RefreshMode {
        match self {
            ViewKind::HealthDashboard => RefreshMode::Task,
            ViewKind::Clusters
            | ViewKind::FileShares
            | ViewKind::SqlInstances
            | ViewKind::MessageQueues
            | ViewKind::RoleSwitches => RefreshMode::Reload,
            ViewKind::EventLog => RefreshMode::None,
        }
    }

    /// Event logs are fetched on demand by each user and never polled.
    pub fn is_background_polled(self) -> bool {
        !matches!(self, ViewKind::EventLog)
    }

    pub fn has_snapshot(self) -> bool {
        !matches!(self, ViewKind::EventLog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infra_ids_round_trip_through_from_group() {
        for kind in ViewKind::INFRA {
            let id = kind.group_id().unwrap();
            assert_eq!(ViewKind::from_group(id), kind);
        }
        assert_eq!(ViewKind::from_group("LogiEventLog"), ViewKind::EventLog);
    }

    #[test]
    fn unknown_groups_are_health_dashboards() {
        assert_eq!(ViewKind::from_group("DCI"), ViewKind::HealthDashboard);
        assert_eq!(GroupId::new("DMZ").kind(), ViewKind::HealthDashboard);
    }

    #[test]
    fn event_log_has_no_shared_search_or_refresh() {
        assert!(!ViewKind::EventLog.is_searchable());
        assert_eq!(ViewKind::EventLog.refresh_mode(), RefreshMode::None);
        assert!(!ViewKind::EventLog.is_background_polled());
    }
}
