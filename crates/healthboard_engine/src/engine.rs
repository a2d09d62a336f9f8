use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use healthboard_core::{FetchPurpose, GroupId, LogQuery, TimerSlot};
use healthboard_logging::{board_debug, board_info};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::{ApiSettings, DashboardApi, EngineError, EngineEvent, ReqwestApi};

enum ApiRequest {
    FetchSnapshot {
        group: GroupId,
        purpose: FetchPurpose,
    },
    QueryTaskStatus {
        generation: u64,
    },
    StartTask {
        generation: u64,
    },
    LoadLogTypes,
    FetchLogs {
        request: u64,
        query: LogQuery,
    },
}

enum EngineCommand {
    Request(ApiRequest),
    Schedule {
        timer: TimerSlot,
        generation: u64,
        after: Duration,
    },
    Cancel {
        timer: TimerSlot,
    },
}

/// Owns the engine thread. Commands go in, [`EngineEvent`]s come out.
///
/// Dropping the handle closes the command channel, which stops the thread
/// and its runtime.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: &ApiSettings) -> Result<Self, EngineError> {
        let api = ReqwestApi::new(settings)?;
        board_info!("Engine talking to {}", settings.endpoint);
        Self::with_api(Arc::new(api))
    }

    pub fn with_api(api: Arc<dyn DashboardApi>) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = Runtime::new()?;

        thread::spawn(move || {
            let mut timers: HashMap<TimerSlot, CancellationToken> = HashMap::new();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Schedule {
                        timer,
                        generation,
                        after,
                    } => {
                        let token = CancellationToken::new();
                        if let Some(previous) = timers.insert(timer, token.clone()) {
                            previous.cancel();
                        }
                        let event_tx = event_tx.clone();
                        runtime.spawn(run_timer(timer, generation, after, token, event_tx));
                    }
                    EngineCommand::Cancel { timer } => {
                        if let Some(previous) = timers.remove(&timer) {
                            board_debug!("Cancelled {timer:?} timer");
                            previous.cancel();
                        }
                    }
                    EngineCommand::Request(request) => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let event = handle_request(api.as_ref(), request).await;
                            let _ = event_tx.send(event);
                        });
                    }
                }
            }
            for token in timers.into_values() {
                token.cancel();
            }
            board_debug!("Engine thread stopped");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    fn request(&self, request: ApiRequest) {
        self.send(EngineCommand::Request(request));
    }

    pub fn fetch_snapshot(&self, group: GroupId, purpose: FetchPurpose) {
        self.request(ApiRequest::FetchSnapshot { group, purpose });
    }

    pub fn query_task_status(&self, generation: u64) {
        self.request(ApiRequest::QueryTaskStatus { generation });
    }

    pub fn start_task(&self, generation: u64) {
        self.request(ApiRequest::StartTask { generation });
    }

    pub fn load_log_types(&self) {
        self.request(ApiRequest::LoadLogTypes);
    }

    pub fn fetch_logs(&self, request: u64, query: LogQuery) {
        self.request(ApiRequest::FetchLogs { request, query });
    }

    /// Arms `timer`, replacing whatever was pending in that slot.
    pub fn schedule(&self, timer: TimerSlot, generation: u64, after: Duration) {
        self.send(EngineCommand::Schedule {
            timer,
            generation,
            after,
        });
    }

    pub fn cancel(&self, timer: TimerSlot) {
        self.send(EngineCommand::Cancel { timer });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn run_timer(
    timer: TimerSlot,
    generation: u64,
    after: Duration,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(after) => {
            let _ = event_tx.send(EngineEvent::TimerFired { timer, generation });
        }
    }
}

async fn handle_request(api: &dyn DashboardApi, request: ApiRequest) -> EngineEvent {
    match request {
        ApiRequest::FetchSnapshot { group, purpose } => {
            let result = api.snapshot(&group).await;
            EngineEvent::SnapshotFetched {
                group,
                purpose,
                result,
            }
        }
        ApiRequest::QueryTaskStatus { generation } => EngineEvent::TaskStatus {
            generation,
            result: api.task_status().await,
        },
        ApiRequest::StartTask { generation } => EngineEvent::TaskStarted {
            generation,
            result: api.start_task().await,
        },
        ApiRequest::LoadLogTypes => EngineEvent::LogTypes(api.log_types().await),
        ApiRequest::FetchLogs { request, query } => EngineEvent::Logs {
            request,
            result: api.logs(&query).await,
        },
    }
}
