use healthboard_core::{Effect, Msg};
use healthboard_engine::{EngineEvent, EngineHandle};
use healthboard_logging::{board_debug, board_warn};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchSnapshot { group, purpose } => {
                    board_debug!("FetchSnapshot group={group} purpose={purpose:?}");
                    self.engine.fetch_snapshot(group, purpose);
                }
                Effect::QueryTaskStatus { generation } => {
                    board_debug!("QueryTaskStatus generation={generation}");
                    self.engine.query_task_status(generation);
                }
                Effect::StartTask { generation } => {
                    board_debug!("StartTask generation={generation}");
                    self.engine.start_task(generation);
                }
                Effect::LoadLogTypes => self.engine.load_log_types(),
                Effect::FetchLogs { request, query } => {
                    board_debug!(
                        "FetchLogs request={request} servers={} type={} period={}",
                        query.servers,
                        query.log_type,
                        query.period.token()
                    );
                    self.engine.fetch_logs(request, query);
                }
                Effect::Schedule {
                    timer,
                    generation,
                    after,
                } => self.engine.schedule(timer, generation, after),
                Effect::CancelTimer { timer } => self.engine.cancel(timer),
            }
        }
    }

    pub fn try_recv(&self) -> Option<Msg> {
        self.engine.try_recv().map(event_to_msg)
    }
}

fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::SnapshotFetched {
            group,
            purpose,
            result,
        } => {
            if let Err(err) = &result {
                board_debug!("Snapshot for {group} ({purpose:?}) failed: {err}");
            }
            Msg::SnapshotLoaded {
                group,
                purpose,
                result,
            }
        }
        EngineEvent::TaskStatus { generation, result } => {
            Msg::TaskStatusReceived { generation, result }
        }
        EngineEvent::TaskStarted { generation, result } => {
            Msg::TaskStartReceived { generation, result }
        }
        EngineEvent::LogTypes(result) => Msg::LogTypesLoaded(result),
        EngineEvent::Logs { request, result } => {
            if let Err(err) = &result {
                board_warn!("Log request {request} failed: {err}");
            }
            Msg::LogsLoaded { request, result }
        }
        EngineEvent::TimerFired { timer, generation } => Msg::TimerFired { timer, generation },
    }
}
