//! Snapshot -> document rendering and the statistics header.

use std::borrow::Cow;
use std::fmt::Display;

use crate::document::{Block, Card, Column, Document, Row, Section, Table, TableBlock, Tone};
use crate::snapshot::{
    text, Cluster, ClustersSnapshot, FileSharesSnapshot, HealthSnapshot, QueuesSnapshot,
    RoleSwitch, RoleSwitchSnapshot, ServerHealth, Snapshot, SqlSnapshot,
};
use crate::sort::{CompareKind, SortColumn, SortDirection, SortRow, SortState};
use crate::view_model::StatsView;

/// CPU or RAM load at or above this percentage marks a server critical.
pub const CRITICAL_THRESHOLD: f64 = 90.0;

/// Inclusive threshold, either metric suffices.
pub fn is_critical(cpu: Option<f64>, ram_percent: Option<f64>) -> bool {
    cpu.is_some_and(|v| v >= CRITICAL_THRESHOLD)
        || ram_percent.is_some_and(|v| v >= CRITICAL_THRESHOLD)
}

pub fn render_document(snapshot: &Snapshot, role_sort: SortState<RoleSwitchColumn>) -> Document {
    match snapshot {
        Snapshot::Health(s) => render_health(s),
        Snapshot::Clusters(s) => render_clusters(s),
        Snapshot::FileShares(s) => render_file_shares(s),
        Snapshot::SqlInstances(s) => render_sql(s),
        Snapshot::MessageQueues(s) => render_queues(s),
        Snapshot::RoleSwitches(s) => render_role_switches(s, role_sort),
    }
}

fn num(value: Option<f64>) -> String {
    value.unwrap_or(0.0).to_string()
}

fn or_dash(value: Option<impl Display>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}

// --- health ---------------------------------------------------------------

fn render_health(snapshot: &HealthSnapshot) -> Document {
    if snapshot.servers.is_empty() {
        return Document::empty("No data");
    }
    Document {
        blocks: snapshot.servers.iter().map(health_card).map(Block::Card).collect(),
        empty_message: None,
    }
}

fn health_card(server: &ServerHealth) -> Card {
    let mut badges: Vec<String> = server.dmz_group.iter().cloned().collect();
    let collected = text(&server.collected_at);
    if !collected.is_empty() {
        badges.push(collected.to_string());
    }

    if let Some(error) = server.error.as_deref().filter(|e| !e.is_empty()) {
        return Card {
            key: server.server_name.clone(),
            title: server.server_name.clone(),
            badges,
            tone: Tone::Error,
            lines: vec![error.to_string()],
            ..Card::default()
        };
    }

    let cpu = server.cpu.unwrap_or(0.0);
    let ram = server.ram.clone().unwrap_or_default();
    let critical = is_critical(server.cpu, server.ram_percent());

    let mut sections = vec![
        Section::new("disks", "Disks").with_lines(
            server
                .disks
                .iter()
                .map(|d| format!("{} {}/{} GB free", d.drive, num(d.free_gb), num(d.total_gb)))
                .collect(),
        ),
        Section::new("top-cpu", "Top 3 CPU").collapsible().with_lines(
            server
                .top_cpu_services
                .iter()
                .map(|p| format!("{} {}%", p.name, num(p.cpu_percent)))
                .collect(),
        ),
        Section::new("top-ram", "Top 3 RAM").collapsible().with_lines(
            server
                .top_ram_services
                .iter()
                .map(|p| format!("{} {} MB", p.name, num(p.memory_mb)))
                .collect(),
        ),
        Section::new(
            "d-services",
            format!("D:\\ services ({})", server.d_services.len()),
        )
        .collapsible()
        .with_lines(none_if_empty(
            server
                .d_services
                .iter()
                .map(|s| format!("{}: {}", s.name, s.state.as_deref().unwrap_or("")))
                .collect(),
        )),
        Section::new("trellix", "Trellix").with_lines(
            server
                .trellix_status
                .iter()
                .map(|s| s.state.clone().unwrap_or_default())
                .collect(),
        ),
    ];

    let firewall = server.firewall.clone().unwrap_or_default();
    sections.push(Section::new("firewall", "Firewall").with_lines(vec![
        format!("Domain: {}", on_off(firewall.domain)),
        format!("Private: {}", on_off(firewall.private)),
        format!("Public: {}", on_off(firewall.public)),
    ]));

    if let Some(iis) = server.iis.as_ref().filter(|iis| iis.installed) {
        let mut lines: Vec<String> = iis.error.iter().cloned().collect();
        lines.push(format!("Application pools ({})", iis.app_pools.len()));
        lines.extend(none_if_empty(
            iis.app_pools
                .iter()
                .map(|p| format!("{} {}", p.name, p.state.as_deref().unwrap_or("")))
                .collect(),
        ));
        lines.push(format!("Sites ({})", iis.sites.len()));
        lines.extend(none_if_empty(
            iis.sites
                .iter()
                .map(|s| format!("{} {}", s.name, s.state.as_deref().unwrap_or("")))
                .collect(),
        ));
        sections.push(
            Section::new(
                "iis",
                format!("IIS {}", iis.service_state.as_deref().unwrap_or("")),
            )
            .collapsible()
            .with_lines(lines),
        );
    }

    if let Some(updates) = server.pending_updates.as_ref().filter(|u| u.enabled) {
        let mut lines: Vec<String> = updates.error.iter().cloned().collect();
        if updates.count == 0 {
            lines.push("No pending updates".to_string());
        }
        lines.extend(updates.updates.iter().map(|u| {
            let article = text(&u.article_id);
            if article.is_empty() {
                u.name.clone()
            } else {
                format!("KB{article}")
            }
        }));
        sections.push(
            Section::new("updates", format!("SCCM updates {}", updates.count))
                .collapsible()
                .with_lines(lines),
        );
    }

    Card {
        key: server.server_name.clone(),
        title: server.server_name.clone(),
        badges,
        tone: if critical { Tone::Warning } else { Tone::Normal },
        critical,
        lines: vec![
            format!("CPU {cpu}%"),
            format!(
                "RAM {}% ({}/{} GB)",
                num(ram.percent_used),
                num(ram.used_gb),
                num(ram.total_gb)
            ),
        ],
        sections,
    }
}

fn none_if_empty(lines: Vec<String>) -> Vec<String> {
    if lines.is_empty() {
        vec!["None".to_string()]
    } else {
        lines
    }
}

// --- clusters -------------------------------------------------------------

fn render_clusters(snapshot: &ClustersSnapshot) -> Document {
    if snapshot.clusters.is_empty() {
        return Document::empty("No cluster data");
    }
    Document {
        blocks: snapshot.clusters.iter().map(cluster_card).map(Block::Card).collect(),
        empty_message: None,
    }
}

fn cluster_card(cluster: &Cluster) -> Card {
    let mut card = Card {
        key: cluster.cluster_name.clone(),
        title: cluster.cluster_name.clone(),
        badges: vec![cluster
            .cluster_type
            .clone()
            .unwrap_or_else(|| "Unknown".to_string())],
        ..Card::default()
    };

    if let Some(error) = cluster.error.as_deref().filter(|e| !e.is_empty()) {
        card.tone = Tone::Error;
        card.lines.push(error.to_string());
        return card;
    }

    card.sections = cluster
        .nodes
        .iter()
        .map(|node| {
            let mut lines = vec![
                format!("Status: {}", node.state.as_deref().unwrap_or("")),
                format!("IP: {}", non_empty_or(text(&node.ip_addresses), "N/A")),
            ];
            let roles: Vec<String> = cluster
                .roles
                .iter()
                .filter(|role| role.owner_node.as_deref() == Some(node.name.as_str()))
                .map(|role| {
                    let port = text(&role.port);
                    let port = if port.is_empty() {
                        String::new()
                    } else {
                        format!(" PORT({port})")
                    };
                    let ips = text(&role.ip_addresses);
                    let ips = if ips.is_empty() {
                        String::new()
                    } else {
                        format!(" {ips}")
                    };
                    format!(
                        "{} [STATUS({}){}]{}",
                        role.name,
                        role.state.as_deref().unwrap_or(""),
                        port,
                        ips
                    )
                })
                .collect();
            if roles.is_empty() {
                lines.push("No roles".to_string());
            } else {
                lines.extend(roles);
            }
            Section::new(&node.name, node.name.clone()).with_lines(lines)
        })
        .collect();
    card
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

// --- file shares ----------------------------------------------------------

fn render_file_shares(snapshot: &FileSharesSnapshot) -> Document {
    if snapshot.file_servers.is_empty() {
        return Document::empty("No file share data");
    }
    let blocks = snapshot
        .file_servers
        .iter()
        .map(|server| {
            let mut card = Card {
                key: server.server_name.clone(),
                title: server.server_name.clone(),
                badges: vec![format!("{} shares", server.share_count.unwrap_or(0))],
                ..Card::default()
            };
            match server.error.as_deref().filter(|e| !e.is_empty()) {
                Some(error) => {
                    card.tone = Tone::Error;
                    card.lines.push(error.to_string());
                }
                None => {
                    let table = Table {
                        columns: vec![
                            Column::plain("Share name"),
                            Column::plain("Path"),
                            Column::plain("State"),
                        ],
                        rows: server
                            .shares
                            .iter()
                            .map(|share| {
                                let state = share.share_state.clone().unwrap_or_default();
                                let tone = if state == "Online" { Tone::Good } else { Tone::Error };
                                Row::new(vec![
                                    share.share_name.clone(),
                                    share.share_path.clone().unwrap_or_default(),
                                    state,
                                ])
                                .with_tone(tone)
                            })
                            .collect(),
                    };
                    card.sections.push(Section::new("shares", "Shares").with_table(table));
                }
            }
            Block::Card(card)
        })
        .collect();
    Document {
        blocks,
        empty_message: None,
    }
}

// --- SQL ------------------------------------------------------------------

fn render_sql(snapshot: &SqlSnapshot) -> Document {
    if snapshot.instances.is_empty() {
        return Document::empty("No SQL instance data");
    }
    let blocks = snapshot
        .instances
        .iter()
        .map(|instance| {
            let mut card = Card {
                key: instance.server_name.clone(),
                title: instance.server_name.clone(),
                ..Card::default()
            };
            if let Some(error) = instance.error.as_deref().filter(|e| !e.is_empty()) {
                card.tone = Tone::Error;
                card.lines.push(error.to_string());
                return Block::Card(card);
            }
            let count = instance.database_count.unwrap_or(0);
            card.lines = vec![
                format!(
                    "SQL version: {}",
                    instance.sql_version.as_deref().unwrap_or("N/A")
                ),
                format!("Databases: {count}"),
            ];
            let table = Table {
                columns: ["Database", "Compat.", "Data (MB)", "Log (MB)", "Total (MB)"]
                    .into_iter()
                    .map(Column::plain)
                    .collect(),
                rows: instance
                    .databases
                    .iter()
                    .map(|db| {
                        Row::new(vec![
                            db.database_name.clone(),
                            text(&db.compatibility_level).to_string(),
                            num(db.data_file_size_mb),
                            num(db.log_file_size_mb),
                            num(db.total_size_mb),
                        ])
                    })
                    .collect(),
            };
            card.sections.push(
                Section::new("databases", format!("Databases ({count})"))
                    .collapsible()
                    .with_table(table),
            );
            Block::Card(card)
        })
        .collect();
    Document {
        blocks,
        empty_message: None,
    }
}

// --- MQ -------------------------------------------------------------------

fn render_queues(snapshot: &QueuesSnapshot) -> Document {
    if snapshot.servers.is_empty() {
        return Document::empty(
            "No MQ queue data. Make sure config_mq.json exists in the data directory.",
        );
    }

    let mut rows = Vec::new();
    for server in &snapshot.servers {
        if let Some(error) = server.error.as_deref().filter(|e| !e.is_empty()) {
            rows.push(
                Row::new(vec![format!("{}: {}", server.server_name, error)]).with_tone(Tone::Error),
            );
            continue;
        }
        for manager in &server.queue_managers {
            let status = manager.status.clone().unwrap_or_default();
            let tone = if status == "Running" { Tone::Good } else { Tone::Error };
            for queue in &manager.queues {
                rows.push(
                    Row::new(vec![
                        manager.queue_manager.clone(),
                        status.clone(),
                        text(&manager.port).to_string(),
                        queue.queue_name.clone(),
                        server.server_name.clone(),
                    ])
                    .with_tone(tone),
                );
            }
        }
    }

    if rows.is_empty() {
        return Document::empty("No queues to display");
    }

    let table = TableBlock {
        key: "MQ-All".to_string(),
        title: "IBM MQ queues".to_string(),
        subtitle: format!("{} queues", rows.len()),
        table: Table {
            columns: ["QManager", "Status", "Port", "Queue", "Server"]
                .into_iter()
                .map(Column::plain)
                .collect(),
            rows,
        },
    };
    Document {
        blocks: vec![Block::Table(table)],
        empty_message: None,
    }
}

// --- role switches --------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSwitchColumn {
    TimeCreated,
    ClusterName,
    ClusterType,
    EventType,
    RoleName,
    SourceNode,
    TargetNode,
}

impl SortColumn for RoleSwitchColumn {
    const ALL: &'static [Self] = &[
        RoleSwitchColumn::TimeCreated,
        RoleSwitchColumn::ClusterName,
        RoleSwitchColumn::ClusterType,
        RoleSwitchColumn::EventType,
        RoleSwitchColumn::RoleName,
        RoleSwitchColumn::SourceNode,
        RoleSwitchColumn::TargetNode,
    ];

    fn key(self) -> &'static str {
        match self {
            RoleSwitchColumn::TimeCreated => "TimeCreated",
            RoleSwitchColumn::ClusterName => "ClusterName",
            RoleSwitchColumn::ClusterType => "ClusterType",
            RoleSwitchColumn::EventType => "EventType",
            RoleSwitchColumn::RoleName => "RoleName",
            RoleSwitchColumn::SourceNode => "SourceNode",
            RoleSwitchColumn::TargetNode => "TargetNode",
        }
    }

    fn label(self) -> &'static str {
        match self {
            RoleSwitchColumn::TimeCreated => "Date/Time",
            RoleSwitchColumn::ClusterName => "Cluster",
            RoleSwitchColumn::ClusterType => "Type",
            RoleSwitchColumn::EventType => "Event",
            RoleSwitchColumn::RoleName => "Role",
            RoleSwitchColumn::SourceNode => "From node",
            RoleSwitchColumn::TargetNode => "To node",
        }
    }

    fn compare_kind(self) -> CompareKind {
        match self {
            RoleSwitchColumn::TimeCreated => CompareKind::Timestamp,
            _ => CompareKind::Text,
        }
    }
}

impl SortRow<RoleSwitchColumn> for RoleSwitch {
    fn sort_value(&self, column: RoleSwitchColumn) -> Cow<'_, str> {
        let value = match column {
            RoleSwitchColumn::TimeCreated => return Cow::Borrowed(text(&self.time_created)),
            RoleSwitchColumn::ClusterName => &self.cluster_name,
            RoleSwitchColumn::ClusterType => &self.cluster_type,
            RoleSwitchColumn::EventType => &self.event_type,
            RoleSwitchColumn::RoleName => &self.role_name,
            RoleSwitchColumn::SourceNode => &self.source_node,
            RoleSwitchColumn::TargetNode => &self.target_node,
        };
        Cow::Borrowed(value.as_deref().unwrap_or(""))
    }
}

pub fn default_role_sort() -> SortState<RoleSwitchColumn> {
    SortState::new(RoleSwitchColumn::TimeCreated, SortDirection::Descending)
}

pub fn event_type_tone(event_type: &str) -> Tone {
    let et = event_type.to_lowercase();
    if et.contains("failed") || et.contains("offline") {
        Tone::Error
    } else if et.contains("started") || et.contains("moved") {
        Tone::Warning
    } else if et.contains("completed") || et.contains("online") {
        Tone::Good
    } else {
        Tone::Normal
    }
}

fn render_role_switches(
    snapshot: &RoleSwitchSnapshot,
    sort: SortState<RoleSwitchColumn>,
) -> Document {
    if snapshot.switches.is_empty() {
        return Document::empty(format!(
            "No role switch events in the last {} days",
            snapshot.days_back()
        ));
    }

    let mut switches: Vec<&RoleSwitch> = snapshot.switches.iter().collect();
    sort.apply(&mut switches);

    let rows = switches
        .into_iter()
        .map(|sw| {
            let event = sw.event_type.clone().unwrap_or_default();
            let tone = event_type_tone(&event);
            Row::new(vec![
                text(&sw.time_created).to_string(),
                sw.cluster_name.clone().unwrap_or_default(),
                sw.cluster_type.clone().unwrap_or_default(),
                event,
                sw.role_name.clone().unwrap_or_default(),
                dash_if_blank(&sw.source_node),
                dash_if_blank(&sw.target_node),
            ])
            .with_tone(tone)
        })
        .collect();

    let columns = RoleSwitchColumn::ALL
        .iter()
        .map(|&column| Column {
            key: column.key().to_string(),
            label: column.label().to_string(),
            indicator: sort.indicator(column),
        })
        .collect();

    let table = TableBlock {
        key: "RoleSwitches-All".to_string(),
        title: "Cluster role switch history".to_string(),
        subtitle: format!(
            "{} events (last {} days)",
            snapshot.switches.len(),
            snapshot.days_back()
        ),
        table: Table { columns, rows },
    };
    Document {
        blocks: vec![Block::Table(table)],
        empty_message: None,
    }
}

fn dash_if_blank(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

// --- statistics -----------------------------------------------------------

pub fn render_stats(snapshot: &Snapshot) -> StatsView {
    let meta = snapshot.meta();
    let mut stats = StatsView {
        last_update: or_dash(snapshot.version()),
        duration: non_empty_or(text(&meta.collection_duration), "-").to_string(),
        ..StatsView::placeholder()
    };
    let failed = |errors: usize| errors.to_string();

    match snapshot {
        Snapshot::Health(s) => {
            let critical = s
                .servers
                .iter()
                .filter(|server| is_critical(server.cpu, server.ram_percent()))
                .count();
            stats.total = non_empty_or(text(&s.total_servers), "0").to_string();
            stats.success = non_empty_or(text(&s.success_count), "0").to_string();
            stats.failed = non_empty_or(text(&s.failed_count), "0").to_string();
            stats.critical = critical.to_string();
        }
        Snapshot::Clusters(s) => {
            stats.total = s.total_clusters.unwrap_or(0).to_string();
            stats.success = s.online_count.unwrap_or(0).to_string();
            stats.failed = s.failed_count.unwrap_or(0).to_string();
            stats.critical = if s.loaded_files.is_empty() {
                "-".to_string()
            } else {
                format!("{} files", s.loaded_files.len())
            };
        }
        Snapshot::FileShares(s) => {
            let shares: u32 = s.file_servers.iter().filter_map(|f| f.share_count).sum();
            stats.total = s.total_servers.unwrap_or(0).to_string();
            stats.success = shares.to_string();
            stats.failed = failed(s.file_servers.iter().filter(|f| f.error.is_some()).count());
        }
        Snapshot::SqlInstances(s) => {
            let databases: u32 = s.instances.iter().filter_map(|i| i.database_count).sum();
            stats.total = s.total_instances.unwrap_or(0).to_string();
            stats.success = format!("{databases} databases");
            stats.failed = failed(s.instances.iter().filter(|i| i.error.is_some()).count());
        }
        Snapshot::MessageQueues(s) => {
            let managers: usize = s.servers.iter().map(|m| m.queue_managers.len()).sum();
            stats.total = s.total_servers.unwrap_or(0).to_string();
            stats.success = managers.to_string();
            stats.failed = failed(s.servers.iter().filter(|m| m.error.is_some()).count());
        }
        Snapshot::RoleSwitches(s) => {
            stats.total = s.total_events.unwrap_or(0).to_string();
            stats.success = s.days_back().to_string();
        }
    }
    stats
}
