use std::sync::Once;

use healthboard_core::{
    decode_snapshot, update, AppState, BlockView, CardView, ContentView, FetchPurpose, GroupId,
    Msg, Snapshot, TableView, ViewKind,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(healthboard_logging::initialize_for_tests);
}

const HEALTH: &str = r#"{
    "LastUpdate": "2024-01-01T00:00:00",
    "TotalServers": 3, "SuccessCount": 3, "FailedCount": 0,
    "Servers": [
        { "ServerName": "SQL01", "CPU": 91, "RAM": { "PercentUsed": 50 },
          "TopCPUServices": [{ "Name": "sqlservr", "CPUPercent": 80 }] },
        { "ServerName": "DC01", "CPU": 10, "RAM": { "PercentUsed": 90 } },
        { "ServerName": "APP01", "CPU": 89, "RAM": { "PercentUsed": 89.9 } }
    ]
}"#;

const SHARES: &str = r#"{
    "LastUpdate": "2024-01-01T00:00:00",
    "FileServers": [
        { "ServerName": "FS01", "ShareCount": 2, "Shares": [
            { "ShareName": "Finance", "SharePath": "D:\\Finance", "ShareState": "Online" },
            { "ShareName": "HR", "SharePath": "D:\\HR", "ShareState": "Online" } ] },
        { "ServerName": "FS02", "ShareCount": 1, "Shares": [
            { "ShareName": "Public", "SharePath": "E:\\Public", "ShareState": "Offline" } ] }
    ]
}"#;

const QUEUES: &str = r#"{
    "LastUpdate": "2024-01-01T00:00:00",
    "Servers": [
        { "ServerName": "MQ1", "QueueManagers": [
            { "QueueManager": "QM1", "Status": "Running", "Port": 1414,
              "Queues": [{ "QueueName": "ORDERS.IN" }, { "QueueName": "BILLING.OUT" }] } ] }
    ]
}"#;

const SQL: &str = r#"{
    "LastUpdate": "2024-01-01T00:00:00",
    "Instances": [
        { "ServerName": "SQL01", "SQLVersion": "15.0", "DatabaseCount": 2, "Databases": [
            { "DatabaseName": "Payroll", "CompatibilityLevel": 150, "TotalSizeMB": 120.5 },
            { "DatabaseName": "Ledger", "CompatibilityLevel": 150, "TotalSizeMB": 80 } ] },
        { "ServerName": "SQL02", "SQLVersion": "16.0", "DatabaseCount": 1, "Databases": [
            { "DatabaseName": "Archive", "CompatibilityLevel": 160 } ] }
    ]
}"#;

const CLUSTERS: &str = r#"{
    "LastUpdate": "2024-01-01T00:00:00",
    "Clusters": [
        { "ClusterName": "CL-SQL", "ClusterType": "SQL",
          "Nodes": [{ "Name": "NODE1", "State": "Up" }, { "Name": "NODE2", "State": "Up" }],
          "Roles": [{ "Name": "SQLRole", "State": "Online", "OwnerNode": "NODE2" }] },
        { "ClusterName": "CL-FILE", "ClusterType": "FileServer",
          "Nodes": [{ "Name": "NODE3", "State": "Down" }] }
    ]
}"#;

const SWITCHES: &str = r#"{
    "LastUpdate": "2024-01-01T00:00:00",
    "TotalEvents": 3, "DaysBack": 7,
    "Switches": [
        { "TimeCreated": "2024-01-02T10:00:00", "ClusterName": "beta", "EventType": "Role moved" },
        { "TimeCreated": "garbage", "ClusterName": "Alpha", "EventType": "Role online" },
        { "TimeCreated": "2024-01-03T10:00:00", "ClusterName": "gamma", "EventType": "Move failed" }
    ]
}"#;

fn open(group: &str, kind: ViewKind, body: &str) -> AppState {
    let group = GroupId::new(group);
    let snapshot: Snapshot = decode_snapshot(kind, body).unwrap().unwrap();
    let (state, _) = update(AppState::new(), Msg::TabSelected(group.clone()));
    let (state, _) = update(
        state,
        Msg::SnapshotLoaded {
            group,
            purpose: FetchPurpose::Load,
            result: Ok(snapshot),
        },
    );
    state
}

fn blocks(state: &AppState) -> Vec<BlockView> {
    match state.view().content {
        ContentView::Blocks(blocks) => blocks,
        other => panic!("expected blocks, got {other:?}"),
    }
}

fn cards(state: &AppState) -> Vec<CardView> {
    blocks(state)
        .into_iter()
        .map(|block| match block {
            BlockView::Card(card) => card,
            BlockView::Table(_) => panic!("expected cards"),
        })
        .collect()
}

fn table(state: &AppState) -> TableView {
    match blocks(state).into_iter().next() {
        Some(BlockView::Table(table)) => table,
        other => panic!("expected a table block, got {other:?}"),
    }
}

fn visible_keys(state: &AppState) -> Vec<String> {
    cards(state)
        .into_iter()
        .filter(|card| card.visible)
        .map(|card| card.key)
        .collect()
}

fn search(state: AppState, query: &str) -> AppState {
    update(state, Msg::SearchChanged(query.to_string())).0
}

#[test]
fn search_hides_non_matching_cards_and_marks_matches() {
    init_logging();
    let state = search(open("DCI", ViewKind::HealthDashboard, HEALTH), "SqL");
    assert_eq!(visible_keys(&state), vec!["SQL01"]);
    let sql = &cards(&state)[0];
    assert!(sql.highlighted);
    assert_eq!(sql.title.text(), "SQL01");
    assert_eq!(sql.title.segments()[0].text, "SQL");
    assert!(sql.title.segments()[0].is_match);
}

#[test]
fn search_is_idempotent_and_clearing_restores_the_plain_view() {
    init_logging();
    let state = open("DCI", ViewKind::HealthDashboard, HEALTH);
    let plain = state.view().content;

    let once = search(state, "sql");
    let first = once.view().content;
    let twice = search(once, "sql");
    assert_eq!(twice.view().content, first);

    let cleared = search(twice, "   ");
    assert_eq!(cleared.view().content, plain);
}

#[test]
fn critical_filter_uses_inclusive_threshold_on_either_metric() {
    init_logging();
    let state = open("DCI", ViewKind::HealthDashboard, HEALTH);
    assert_eq!(state.view().stats.critical, "2");
    assert_eq!(state.view().critical_only, Some(false));

    let (state, _) = update(state, Msg::CriticalFilterToggled);
    assert_eq!(state.view().critical_only, Some(true));
    assert_eq!(visible_keys(&state), vec!["SQL01", "DC01"]);
}

#[test]
fn critical_filter_and_search_intersect() {
    init_logging();
    let state = open("DCI", ViewKind::HealthDashboard, HEALTH);
    let (state, _) = update(state, Msg::CriticalFilterToggled);
    let state = search(state, "dc");
    assert_eq!(visible_keys(&state), vec!["DC01"]);

    let state = search(state, "app");
    assert!(visible_keys(&state).is_empty());

    // Switching the filter off clears the query as well.
    let (state, _) = update(state, Msg::CriticalFilterToggled);
    assert_eq!(state.view().search.unwrap().query, "");
    assert_eq!(visible_keys(&state), vec!["SQL01", "DC01", "APP01"]);
}

#[test]
fn matched_collapsed_sections_open_and_stay_open() {
    init_logging();
    let state = open("DCI", ViewKind::HealthDashboard, HEALTH);
    let (state, _) = update(
        state,
        Msg::SectionToggled {
            card: "SQL01".to_string(),
            section: "top-cpu".to_string(),
        },
    );
    let section = |state: &AppState| {
        cards(state)[0]
            .sections
            .iter()
            .find(|s| s.name == "top-cpu")
            .cloned()
            .unwrap()
    };
    assert!(!section(&state).expanded);

    let state = search(state, "sqlservr");
    assert!(section(&state).expanded);
    assert!(section(&state).lines[0].has_match());

    let state = search(state, "");
    assert!(section(&state).expanded);
    assert!(!section(&state).lines[0].has_match());
}

#[test]
fn file_share_card_stays_when_only_a_row_matches() {
    init_logging();
    let state = search(open("UdzialySieciowe", ViewKind::FileShares, SHARES), "finance");
    assert_eq!(visible_keys(&state), vec!["FS01"]);
    let fs01 = &cards(&state)[0];
    assert!(!fs01.highlighted);
    let rows = &fs01.sections[0].table.as_ref().unwrap().rows;
    assert!(rows[0].highlighted);
    assert!(rows.iter().all(|row| row.visible));

    let state = search(state, "fs02");
    assert_eq!(visible_keys(&state), vec!["FS02"]);
    assert!(cards(&state)[1].highlighted);
}

#[test]
fn sql_database_match_opens_the_collapsed_section() {
    init_logging();
    let state = open("InstancjeSQL", ViewKind::SqlInstances, SQL);
    let (state, _) = update(
        state,
        Msg::SectionToggled {
            card: "SQL01".to_string(),
            section: "databases".to_string(),
        },
    );
    let databases = |state: &AppState| cards(state)[0].sections[0].clone();
    assert!(!databases(&state).expanded);

    let state = search(state, "ledger");
    assert_eq!(visible_keys(&state), vec!["SQL01"]);
    let sql01 = &cards(&state)[0];
    assert!(!sql01.highlighted);
    assert!(!sql01.title.has_match());
    let section = databases(&state);
    assert!(section.expanded);
    let rows = section.table.unwrap().rows;
    let marked: Vec<bool> = rows.iter().map(|row| row.highlighted).collect();
    assert_eq!(marked, vec![false, true]);
    assert!(rows.iter().all(|row| row.visible));
    assert!(rows[1].cells[0].has_match());

    // The section stays open once the query is cleared.
    let state = search(state, "");
    assert!(databases(&state).expanded);

    let state = search(state, "sql02");
    assert_eq!(visible_keys(&state), vec!["SQL02"]);
    assert!(cards(&state)[1].title.has_match());
}

#[test]
fn cluster_cards_match_on_any_node_or_role() {
    init_logging();
    let state = search(open("ClustersWindows", ViewKind::Clusters, CLUSTERS), "sqlrole");
    assert_eq!(visible_keys(&state), vec!["CL-SQL"]);
    let cluster = &cards(&state)[0];
    assert!(cluster.highlighted);
    let node2 = cluster
        .sections
        .iter()
        .find(|section| section.name == "NODE2")
        .unwrap();
    assert!(node2.lines.iter().any(|line| line.has_match()));

    let state = search(state, "node3");
    assert_eq!(visible_keys(&state), vec!["CL-FILE"]);
    assert!(cards(&state)[1].sections[0].title.has_match());
}

#[test]
fn queue_rows_are_filtered_individually() {
    init_logging();
    let state = search(open("KolejkiMQ", ViewKind::MessageQueues, QUEUES), "orders");
    let queues = table(&state);
    assert!(queues.visible);
    let shown: Vec<bool> = queues.rows.iter().map(|row| row.visible).collect();
    assert_eq!(shown, vec![true, false]);

    let state = search(state, "nothing-like-this");
    assert!(!table(&state).visible);
}

#[test]
fn role_switches_sort_by_time_and_toggle_direction() {
    init_logging();
    let state = open("PrzelaczeniaRol", ViewKind::RoleSwitches, SWITCHES);
    let clusters = |state: &AppState| -> Vec<String> {
        table(state)
            .rows
            .iter()
            .map(|row| row.cells[1].text())
            .collect()
    };
    // Initial order is newest first; unparseable dates sort before valid ones.
    assert_eq!(clusters(&state), vec!["gamma", "beta", "Alpha"]);
    assert_eq!(table(&state).columns[0].indicator, Some("▼"));

    let (state, _) = update(state, Msg::SortClicked("TimeCreated".to_string()));
    assert_eq!(clusters(&state), vec!["Alpha", "beta", "gamma"]);
    assert_eq!(table(&state).columns[0].indicator, Some("▲"));

    let (state, _) = update(state, Msg::SortClicked("TimeCreated".to_string()));
    assert_eq!(clusters(&state), vec!["gamma", "beta", "Alpha"]);

    let (state, _) = update(state, Msg::SortClicked("ClusterName".to_string()));
    assert_eq!(clusters(&state), vec!["Alpha", "beta", "gamma"]);
    let indicators: Vec<Option<&str>> = table(&state)
        .columns
        .iter()
        .map(|column| column.indicator)
        .collect();
    assert_eq!(
        indicators,
        vec![None, Some("▲"), None, None, None, None, None]
    );
}

#[test]
fn tab_switch_resets_filters_and_sort() {
    init_logging();
    let state = open("PrzelaczeniaRol", ViewKind::RoleSwitches, SWITCHES);
    let (state, _) = update(state, Msg::SortClicked("ClusterName".to_string()));
    let state = search(state, "alpha");
    let (state, _) = update(state, Msg::TabSelected(GroupId::new("DCI")));
    let (state, _) = update(state, Msg::TabSelected(GroupId::new("PrzelaczeniaRol")));
    let view = state.view_state();
    assert!(view.search().is_empty());
    assert_eq!(view.role_sort(), healthboard_core::default_role_sort());
    assert!(!view.critical_only());
}

#[test]
fn event_log_tab_has_no_shared_search() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::TabSelected(GroupId::new("LogiEventLog")));
    let mut state = state;
    state.consume_dirty();
    let (mut state, _) = update(state, Msg::SearchChanged("x".to_string()));
    assert!(!state.consume_dirty());
    assert_eq!(state.view().search, None);
    assert_eq!(state.view().critical_only, None);
}
