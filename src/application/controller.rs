use crate::application::remote_mirror::RemoteMirror;
use crate::domain::models::{
    DEFAULT_INTERVAL, DEFAULT_REPEAT, PlantType, RAIN_OVERRIDE_NOTE, WateringConfig,
    WateringEvent,
};
use crate::domain::schedule;
use crate::infrastructure::config::ConfigRepository;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::record_log::LogSink;
use chrono::{Local, NaiveDate};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

pub const MIRROR_SUCCESS_MESSAGE: &str = "✅ 已成功寫入 Google Sheets！";
pub const MIRROR_ERROR_PREFIX: &str = "❌ Google Sheets 寫入錯誤：";
pub const SUBMIT_ERROR_PREFIX: &str = "❌ 發生錯誤：";
const LOG_SEPARATOR_WIDTH: usize = 30;

type TodayProvider = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStep {
    SaveConfig,
    ComputeSchedule,
    RenderReport,
    AppendLog,
    PublishRemote,
}

impl SubmitStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SaveConfig => "save_config",
            Self::ComputeSchedule => "compute_schedule",
            Self::RenderReport => "render_report",
            Self::AppendLog => "append_log",
            Self::PublishRemote => "publish_remote",
        }
    }
}

impl fmt::Display for SubmitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values the form opens with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDefaults {
    pub plant_type: PlantType,
    pub start_date: NaiveDate,
    pub interval: u32,
    pub repeat: u32,
    pub rain_override: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub plant_type: PlantType,
    pub interval: u32,
    pub repeat: u32,
    /// Set when the rain-override box is ticked.
    pub rain_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WateringReport {
    pub header: String,
    pub lines: Vec<String>,
    pub note_line: Option<String>,
}

impl WateringReport {
    pub fn from_event(event: &WateringEvent) -> Self {
        Self {
            header: event.header(),
            lines: event.schedule_lines(),
            note_line: event.note_line(),
        }
    }

    pub fn to_log_block(&self) -> String {
        let mut block = format!("{}\n", self.header);
        for line in &self.lines {
            block.push_str(line);
            block.push('\n');
        }
        if let Some(note_line) = &self.note_line {
            block.push_str(note_line);
            block.push('\n');
        }
        block.push_str(&"-".repeat(LOG_SEPARATOR_WIDTH));
        block.push('\n');
        block
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: SubmitStep,
    pub message: String,
    pub trace: String,
}

impl StepFailure {
    fn new(step: SubmitStep, prefix: &str, error: &InfraError) -> Self {
        Self {
            step,
            message: format!("{prefix}\n{error}"),
            trace: diagnostic_trace(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatus {
    Published,
    Failed(StepFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Displayed {
        report: WateringReport,
        mirror: MirrorStatus,
        completed: Vec<SubmitStep>,
    },
    Failed {
        failure: StepFailure,
        report: Option<WateringReport>,
        completed: Vec<SubmitStep>,
    },
}

impl SubmissionOutcome {
    pub fn completed_steps(&self) -> &[SubmitStep] {
        match self {
            Self::Displayed { completed, .. } | Self::Failed { completed, .. } => completed,
        }
    }

    pub fn report(&self) -> Option<&WateringReport> {
        match self {
            Self::Displayed { report, .. } => Some(report),
            Self::Failed { report, .. } => report.as_ref(),
        }
    }
}

/// Renders an error and its `source()` chain, one cause per line.
pub fn diagnostic_trace(error: &(dyn StdError + 'static)) -> String {
    let mut trace = format!("{error:?}");
    let mut source = error.source();
    while let Some(cause) = source {
        trace.push_str(&format!("\ncaused by: {cause}"));
        source = cause.source();
    }
    trace
}

pub struct FormController {
    config_repository: Arc<dyn ConfigRepository>,
    log_sink: Arc<dyn LogSink>,
    remote_mirror: Arc<dyn RemoteMirror>,
    today_provider: TodayProvider,
}

impl FormController {
    pub fn new(
        config_repository: Arc<dyn ConfigRepository>,
        log_sink: Arc<dyn LogSink>,
        remote_mirror: Arc<dyn RemoteMirror>,
    ) -> Self {
        Self {
            config_repository,
            log_sink,
            remote_mirror,
            today_provider: Arc::new(|| Local::now().date_naive()),
        }
    }

    pub fn with_today_provider(mut self, today_provider: TodayProvider) -> Self {
        self.today_provider = today_provider;
        self
    }

    pub fn prefill(&self, rain_date: Option<NaiveDate>) -> FormDefaults {
        let stored = self.config_repository.load();
        let persisted_date = stored
            .as_ref()
            .map(|config| config.date)
            .unwrap_or_else(|| (self.today_provider)());

        let plant_type = stored
            .as_ref()
            .map(|config| config.plant_type)
            .unwrap_or_default();
        let (interval, repeat) = match stored.as_ref().map(|config| config.validate().map(|()| config)) {
            Some(Ok(config)) => (config.interval, config.repeat),
            Some(Err(reason)) => {
                tracing::warn!(%reason, "persisted watering options out of range; using defaults");
                (DEFAULT_INTERVAL, DEFAULT_REPEAT)
            }
            None => (DEFAULT_INTERVAL, DEFAULT_REPEAT),
        };

        FormDefaults {
            plant_type,
            start_date: rain_date.unwrap_or(persisted_date),
            interval,
            repeat,
            rain_override: rain_date.is_some(),
            note: rain_date.map(|_| RAIN_OVERRIDE_NOTE.to_string()),
        }
    }

    /// Runs save, compute, render, log and publish in order. Nothing is rolled back.
    pub async fn submit(&self, request: SubmitRequest) -> SubmissionOutcome {
        let defaults = self.prefill(request.rain_date);
        let config = WateringConfig {
            plant_type: request.plant_type,
            date: defaults.start_date,
            interval: request.interval,
            repeat: request.repeat,
        };
        let mut completed = Vec::with_capacity(5);

        if let Err(error) = self.config_repository.save(&config) {
            return Self::failed(SubmitStep::SaveConfig, &error, None, completed);
        }
        completed.push(SubmitStep::SaveConfig);

        let computed_dates = match schedule::compute(config.date, config.interval, config.repeat) {
            Ok(dates) => dates,
            Err(error) => return Self::failed(SubmitStep::ComputeSchedule, &error, None, completed),
        };
        completed.push(SubmitStep::ComputeSchedule);

        let event = WateringEvent {
            plant_type: config.plant_type,
            start_date: config.date,
            interval: config.interval,
            repeat: config.repeat,
            computed_dates,
            note: defaults.note,
        };
        let report = WateringReport::from_event(&event);
        completed.push(SubmitStep::RenderReport);

        if let Err(error) = self.log_sink.append(&report.to_log_block()) {
            return Self::failed(SubmitStep::AppendLog, &error, Some(report), completed);
        }
        completed.push(SubmitStep::AppendLog);

        let mirror = match self.remote_mirror.publish(&event).await {
            Ok(()) => {
                completed.push(SubmitStep::PublishRemote);
                MirrorStatus::Published
            }
            Err(error) => {
                tracing::warn!(%error, "remote mirror failed; schedule kept locally");
                MirrorStatus::Failed(StepFailure::new(
                    SubmitStep::PublishRemote,
                    MIRROR_ERROR_PREFIX,
                    &error,
                ))
            }
        };

        tracing::info!(
            plant_type = config.plant_type.as_str(),
            start_date = %config.date,
            interval = config.interval,
            repeat = config.repeat,
            "watering schedule estimated"
        );
        SubmissionOutcome::Displayed {
            report,
            mirror,
            completed,
        }
    }

    fn failed(
        step: SubmitStep,
        error: &InfraError,
        report: Option<WateringReport>,
        completed: Vec<SubmitStep>,
    ) -> SubmissionOutcome {
        tracing::error!(step = %step, %error, "watering submission failed");
        SubmissionOutcome::Failed {
            failure: StepFailure::new(step, SUBMIT_ERROR_PREFIX, error),
            report,
            completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::InMemoryConfigRepository;
    use crate::infrastructure::record_log::InMemoryLogSink;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingMirror {
        published: Mutex<Vec<WateringEvent>>,
        fail_with_network_error: bool,
    }

    impl RecordingMirror {
        fn failing() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
                fail_with_network_error: true,
            }
        }

        fn published(&self) -> Vec<WateringEvent> {
            self.published.lock().expect("mirror mutex poisoned").clone()
        }
    }

    #[async_trait]
    impl RemoteMirror for RecordingMirror {
        async fn publish(&self, event: &WateringEvent) -> Result<(), InfraError> {
            if self.fail_with_network_error {
                return Err(InfraError::Sheets(
                    "network error while appending row: connection refused".to_string(),
                ));
            }
            self.published
                .lock()
                .expect("mirror mutex poisoned")
                .push(event.clone());
            Ok(())
        }
    }

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
    }

    fn stored_config() -> WateringConfig {
        WateringConfig {
            plant_type: PlantType::Large,
            date: date("2024-01-01"),
            interval: 7,
            repeat: 3,
        }
    }

    struct Harness {
        config: Arc<InMemoryConfigRepository>,
        log: Arc<InMemoryLogSink>,
        mirror: Arc<RecordingMirror>,
        controller: FormController,
    }

    fn harness(
        config: InMemoryConfigRepository,
        log: InMemoryLogSink,
        mirror: RecordingMirror,
    ) -> Harness {
        let config = Arc::new(config);
        let log = Arc::new(log);
        let mirror = Arc::new(mirror);
        let controller = FormController::new(
            Arc::clone(&config) as Arc<dyn ConfigRepository>,
            Arc::clone(&log) as Arc<dyn LogSink>,
            Arc::clone(&mirror) as Arc<dyn RemoteMirror>,
        )
        .with_today_provider(Arc::new(|| date("2024-06-15")));
        Harness {
            config,
            log,
            mirror,
            controller,
        }
    }

    fn request(rain_date: Option<NaiveDate>) -> SubmitRequest {
        SubmitRequest {
            plant_type: PlantType::Large,
            interval: 7,
            repeat: 3,
            rain_date,
        }
    }

    #[test]
    fn prefill_without_config_uses_today_and_defaults() {
        let h = harness(
            InMemoryConfigRepository::default(),
            InMemoryLogSink::default(),
            RecordingMirror::default(),
        );
        let defaults = h.controller.prefill(None);
        assert_eq!(defaults.start_date, date("2024-06-15"));
        assert_eq!(defaults.plant_type, PlantType::Small);
        assert_eq!(defaults.interval, DEFAULT_INTERVAL);
        assert_eq!(defaults.repeat, DEFAULT_REPEAT);
        assert!(!defaults.rain_override);
        assert_eq!(defaults.note, None);
    }

    #[test]
    fn prefill_prefers_rain_date_over_persisted_date() {
        let h = harness(
            InMemoryConfigRepository::with_config(stored_config()),
            InMemoryLogSink::default(),
            RecordingMirror::default(),
        );
        assert_eq!(h.controller.prefill(None).start_date, date("2024-01-01"));

        let defaults = h.controller.prefill(Some(date("2024-01-05")));
        assert_eq!(defaults.start_date, date("2024-01-05"));
        assert_eq!(defaults.plant_type, PlantType::Large);
        assert!(defaults.rain_override);
        assert_eq!(defaults.note.as_deref(), Some(RAIN_OVERRIDE_NOTE));
    }

    #[test]
    fn prefill_falls_back_when_persisted_options_are_unknown() {
        let mut config = stored_config();
        config.interval = 9;
        config.repeat = 4;
        let h = harness(
            InMemoryConfigRepository::with_config(config),
            InMemoryLogSink::default(),
            RecordingMirror::default(),
        );
        let defaults = h.controller.prefill(None);
        assert_eq!(defaults.interval, DEFAULT_INTERVAL);
        assert_eq!(defaults.repeat, DEFAULT_REPEAT);
    }

    #[test]
    fn prefill_resets_both_options_when_one_is_out_of_range() {
        let mut config = stored_config();
        config.interval = 14;
        config.repeat = 7;
        let h = harness(
            InMemoryConfigRepository::with_config(config),
            InMemoryLogSink::default(),
            RecordingMirror::default(),
        );
        let defaults = h.controller.prefill(None);
        assert_eq!(defaults.plant_type, PlantType::Large);
        assert_eq!(defaults.start_date, date("2024-01-01"));
        assert_eq!(defaults.interval, DEFAULT_INTERVAL);
        assert_eq!(defaults.repeat, DEFAULT_REPEAT);
    }

    #[tokio::test]
    async fn successful_submit_runs_every_step() {
        let h = harness(
            InMemoryConfigRepository::with_config(stored_config()),
            InMemoryLogSink::default(),
            RecordingMirror::default(),
        );
        let outcome = h.controller.submit(request(None)).await;

        assert_eq!(
            outcome.completed_steps(),
            &[
                SubmitStep::SaveConfig,
                SubmitStep::ComputeSchedule,
                SubmitStep::RenderReport,
                SubmitStep::AppendLog,
                SubmitStep::PublishRemote,
            ]
        );
        match &outcome {
            SubmissionOutcome::Displayed { report, mirror, .. } => {
                assert_eq!(mirror, &MirrorStatus::Published);
                assert_eq!(
                    report.lines,
                    vec![
                        "第 1 次：2024-01-08".to_string(),
                        "第 2 次：2024-01-15".to_string(),
                        "第 3 次：2024-01-22".to_string(),
                    ]
                );
            }
            other => panic!("expected displayed outcome, got {other:?}"),
        }
        assert_eq!(
            h.log.blocks(),
            vec![concat!(
                "【大植株】澆水預估\n",
                "最近一次澆水日：2024-01-01\n",
                "週期：7 天，預估次數：3\n",
                "第 1 次：2024-01-08\n",
                "第 2 次：2024-01-15\n",
                "第 3 次：2024-01-22\n",
                "------------------------------\n",
            )
            .to_string()]
        );
        assert_eq!(h.mirror.published().len(), 1);
    }

    #[tokio::test]
    async fn rain_override_saves_rain_date_and_notes_it() {
        let h = harness(
            InMemoryConfigRepository::with_config(stored_config()),
            InMemoryLogSink::default(),
            RecordingMirror::default(),
        );
        let outcome = h.controller.submit(request(Some(date("2024-02-28")))).await;

        let report = outcome.report().expect("report rendered");
        assert_eq!(report.note_line.as_deref(), Some("【備註】因下雨提前澆水（選擇日期）"));
        assert_eq!(h.config.load().expect("saved").date, date("2024-02-28"));
        assert!(h.log.blocks()[0].contains("【備註】因下雨提前澆水（選擇日期）\n---"));
        assert_eq!(
            h.mirror.published()[0].note.as_deref(),
            Some(RAIN_OVERRIDE_NOTE)
        );
    }

    #[tokio::test]
    async fn mirror_network_failure_keeps_display_and_log() {
        let h = harness(
            InMemoryConfigRepository::with_config(stored_config()),
            InMemoryLogSink::default(),
            RecordingMirror::failing(),
        );
        let outcome = h.controller.submit(request(None)).await;

        match &outcome {
            SubmissionOutcome::Displayed {
                report,
                mirror: MirrorStatus::Failed(failure),
                completed,
            } => {
                assert_eq!(report.lines.len(), 3);
                assert_eq!(failure.step, SubmitStep::PublishRemote);
                assert!(failure.message.starts_with(MIRROR_ERROR_PREFIX));
                assert!(failure.message.contains("connection refused"));
                assert!(failure.trace.contains("Sheets"));
                assert!(!completed.contains(&SubmitStep::PublishRemote));
                assert!(completed.contains(&SubmitStep::AppendLog));
            }
            other => panic!("expected displayed outcome with mirror failure, got {other:?}"),
        }
        assert_eq!(h.log.blocks().len(), 1);
    }

    #[tokio::test]
    async fn config_save_failure_stops_before_any_other_effect() {
        let h = harness(
            InMemoryConfigRepository::failing(),
            InMemoryLogSink::default(),
            RecordingMirror::default(),
        );
        let outcome = h.controller.submit(request(None)).await;

        match &outcome {
            SubmissionOutcome::Failed {
                failure, report, ..
            } => {
                assert_eq!(failure.step, SubmitStep::SaveConfig);
                assert!(failure.message.starts_with(SUBMIT_ERROR_PREFIX));
                assert!(failure.trace.contains("caused by: config store is read-only"));
                assert!(report.is_none());
            }
            other => panic!("expected failed outcome, got {other:?}"),
        }
        assert!(outcome.completed_steps().is_empty());
        assert!(h.log.blocks().is_empty());
        assert!(h.mirror.published().is_empty());
    }

    #[tokio::test]
    async fn compute_failure_leaves_saved_config_in_place() {
        let h = harness(
            InMemoryConfigRepository::default(),
            InMemoryLogSink::default(),
            RecordingMirror::default(),
        );
        let outcome = h.controller.submit(request(Some(NaiveDate::MAX))).await;

        match &outcome {
            SubmissionOutcome::Failed { failure, .. } => {
                assert_eq!(failure.step, SubmitStep::ComputeSchedule)
            }
            other => panic!("expected failed outcome, got {other:?}"),
        }
        assert_eq!(outcome.completed_steps(), &[SubmitStep::SaveConfig]);
        assert_eq!(h.config.load().expect("config saved").date, NaiveDate::MAX);
        assert!(h.log.blocks().is_empty());
        assert!(h.mirror.published().is_empty());
    }

    #[tokio::test]
    async fn log_failure_keeps_rendered_report_and_skips_mirror() {
        let h = harness(
            InMemoryConfigRepository::default(),
            InMemoryLogSink::failing(),
            RecordingMirror::default(),
        );
        let outcome = h.controller.submit(request(None)).await;

        match &outcome {
            SubmissionOutcome::Failed {
                failure, report, ..
            } => {
                assert_eq!(failure.step, SubmitStep::AppendLog);
                assert!(report.is_some());
            }
            other => panic!("expected failed outcome, got {other:?}"),
        }
        assert_eq!(
            outcome.completed_steps(),
            &[
                SubmitStep::SaveConfig,
                SubmitStep::ComputeSchedule,
                SubmitStep::RenderReport,
            ]
        );
        assert!(h.config.load().is_some());
        assert!(h.mirror.published().is_empty());
    }

    #[test]
    fn diagnostic_trace_walks_source_chain() {
        let error = InfraError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "records.txt missing",
        ));
        let trace = diagnostic_trace(&error);
        assert!(trace.starts_with("Io("));
        assert!(trace.ends_with("caused by: records.txt missing"));
    }
}
