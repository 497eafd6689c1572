//! The application context handed to a front-end.
//!
//! [`Dashboard`] owns every piece of session and pipeline state. Front-ends
//! issue commands against it and re-render from its accessors; nothing is
//! global. Mock operations and chat replies finish on the tokio runtime and
//! are delivered back through an internal channel, drained by
//! [`Dashboard::pump`] or awaited with [`Dashboard::next_event`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::assets::{sample_assets, AssetLibrary, ImageAsset};
use crate::chat::{ChatAssistant, QUICK_QUESTION_KEYS};
use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::i18n::{Localizer, Params};
use crate::operations::mock::{DamageAnalysis, DamageSummary, EnhancementResult, ReportPackage};
use crate::operations::{
    MockPayload, OperationId, OperationKind, OperationOutcome, OperationRunner, OperationStatus,
};
use crate::pipeline::{PipelineState, Stage, UnmetPrecondition};
use crate::report::ReportSelection;
use crate::session::{AuthFailure, Session, SessionStore};

/// Something that finished in the background.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    Operation(OperationOutcome),
    ChatReply(String),
}

/// Tags events with the workspace they belong to, so completions that
/// outlive a sign-out are dropped.
struct Envelope {
    generation: u64,
    event: DashboardEvent,
}

/// Result of asking for a mock operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Started(OperationId),
    /// Ignored: the same kind is still in flight
    AlreadyRunning,
    Unmet(UnmetPrecondition),
}

/// Latest payload of each operation kind.
#[derive(Debug, Clone, Default)]
pub struct StageResults {
    pub enhancement: Option<EnhancementResult>,
    pub analysis: Option<DamageAnalysis>,
    pub summary: Option<DamageSummary>,
    pub report: Option<ReportPackage>,
}

pub struct Dashboard {
    sessions: SessionStore,
    localizer: Localizer,
    pipeline: PipelineState,
    assets: AssetLibrary,
    runner: OperationRunner,
    chat: ChatAssistant,
    report: ReportSelection,
    results: StageResults,
    /// One-shot message for the user (e.g. "download started")
    notice: Option<String>,
    last_error: Option<String>,
    chat_delay: Duration,
    generation: u64,
    events_tx: UnboundedSender<Envelope>,
    events_rx: UnboundedReceiver<Envelope>,
}

impl Dashboard {
    pub fn new(db: Arc<Database>, config: &Config) -> Self {
        let localizer = Localizer::new(&config.locale.language);
        let chat = ChatAssistant::new(localizer.translate("welcomeMessage"));
        let (events_tx, events_rx) = unbounded_channel();

        Self {
            sessions: SessionStore::new(db, &config.session),
            localizer,
            pipeline: PipelineState::new(),
            assets: AssetLibrary::new(),
            runner: OperationRunner::new(config.operations.clone()),
            chat,
            report: ReportSelection::default(),
            results: StageResults::default(),
            notice: None,
            last_error: None,
            chat_delay: config.operations.chat_reply_delay(),
            generation: 0,
            events_tx,
            events_rx,
        }
    }

    /// Open the database at the configured location and build a dashboard.
    pub fn open(config: &Config) -> Result<Self> {
        let db = Database::open(&Config::database_path())?;
        db.migrate()?;
        Ok(Self::new(Arc::new(db), config))
    }

    // ============================================
    // Session
    // ============================================

    pub fn session(&self) -> Option<&Session> {
        self.sessions.current()
    }

    pub fn is_authenticated(&self) -> bool {
        self.sessions.is_authenticated()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn require_session(&self) -> Result<&Session> {
        self.sessions.current().ok_or(Error::NotAuthenticated)
    }

    /// Sign in and start a fresh pipeline.
    pub async fn login(
        &mut self,
        identifier: &str,
        secret: &str,
    ) -> std::result::Result<Session, AuthFailure> {
        let session = self.sessions.authenticate(identifier, secret).await?;
        self.reset_workspace();
        Ok(session)
    }

    /// Pick up the persisted session from a previous run, if any.
    pub fn restore(&mut self) -> Option<Session> {
        let session = self.sessions.restore_session();
        self.reset_workspace();
        session
    }

    /// Sign out and drop all pipeline state.
    pub fn logout(&mut self) {
        self.sessions.end_session();
        self.reset_workspace();
    }

    fn reset_workspace(&mut self) {
        self.generation += 1;
        // Work from the previous session finishes on the old runner and its
        // completion is dropped as stale.
        self.runner = self.runner.detached();
        self.pipeline.reset();
        self.assets.clear();
        self.results = StageResults::default();
        self.report = ReportSelection::default();
        self.notice = None;
        self.last_error = None;
        self.chat.reset(self.localizer.translate("welcomeMessage"));
    }

    // ============================================
    // Language
    // ============================================

    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    pub fn set_language(&mut self, code: &str) {
        self.localizer.set_language(code);
    }

    pub fn cycle_language(&mut self) {
        self.localizer.cycle_language();
    }

    pub fn t(&self, key: &str) -> String {
        self.localizer.translate(key)
    }

    pub fn t_with(&self, key: &str, params: &Params) -> String {
        self.localizer.translate_with(key, params)
    }

    // ============================================
    // Pipeline and images
    // ============================================

    pub fn pipeline(&self) -> &PipelineState {
        &self.pipeline
    }

    pub fn assets(&self) -> &AssetLibrary {
        &self.assets
    }

    /// Jump to a stage. Out-of-range indices are ignored (`Ok(false)`).
    ///
    /// Navigation does not wait for running operations. A completion that
    /// arrives after a jump finishes whichever stage is active by then.
    pub fn navigate(&mut self, index: usize) -> Result<bool> {
        self.require_session()?;
        Ok(self.pipeline.advance_to(index))
    }

    /// Replace the image set. A non-empty upload finishes the Upload stage
    /// when it is the active one.
    pub fn upload(&mut self, images: Vec<ImageAsset>) -> Result<()> {
        self.require_session()?;
        let has_images = !images.is_empty();
        self.assets.replace(images);
        if has_images && self.pipeline.active_stage() == Stage::Upload {
            self.pipeline.complete_current_and_advance();
        }
        Ok(())
    }

    pub fn select_sample_data(&mut self) -> Result<()> {
        self.upload(sample_assets())
    }

    /// The images a stage works on, or why it has none.
    pub fn images_for(
        &self,
        stage: Stage,
    ) -> std::result::Result<&[ImageAsset], UnmetPrecondition> {
        self.assets.images_for(stage)
    }

    /// Whether the stage's operation may start right now.
    pub fn stage_readiness(&self, stage: Stage) -> std::result::Result<(), UnmetPrecondition> {
        let active = self.pipeline.active_stage();
        if stage != active {
            return Err(UnmetPrecondition::StageNotActive {
                required: stage,
                active,
            });
        }
        self.assets.images_for(stage)?;
        if stage == Stage::Report && self.report.is_empty() {
            return Err(UnmetPrecondition::NoFormatsSelected);
        }
        Ok(())
    }

    // ============================================
    // Operations
    // ============================================

    /// Start the mock operation for `kind` if its stage is ready.
    ///
    /// Completion advances the pipeline from whatever stage is active at
    /// that moment.
    pub fn trigger(&mut self, kind: OperationKind) -> Result<Trigger> {
        self.require_session()?;

        if let Err(reason) = self.stage_readiness(kind.stage()) {
            tracing::debug!(%kind, %reason, "Operation blocked");
            return Ok(Trigger::Unmet(reason));
        }

        let Some(handle) = self.runner.run(kind) else {
            return Ok(Trigger::AlreadyRunning);
        };

        let id = handle.id();
        let generation = self.generation;
        let tx = self.events_tx.clone();
        handle.on_complete(move |outcome| {
            let _ = tx.send(Envelope {
                generation,
                event: DashboardEvent::Operation(outcome),
            });
        });

        self.notice = None;
        self.last_error = None;
        Ok(Trigger::Started(id))
    }

    pub fn is_running(&self, kind: OperationKind) -> bool {
        self.runner.is_running(kind)
    }

    pub fn progress(&self, kind: OperationKind) -> Option<f64> {
        self.runner.progress(kind)
    }

    /// An operation or chat reply is still outstanding.
    pub fn has_pending_work(&self) -> bool {
        self.runner.any_running() || self.chat.is_typing()
    }

    pub fn results(&self) -> &StageResults {
        &self.results
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn report(&self) -> &ReportSelection {
        &self.report
    }

    pub fn toggle_report_format(&mut self, id: &str) -> bool {
        self.report.toggle(id)
    }

    // ============================================
    // Chat
    // ============================================

    pub fn chat(&self) -> &ChatAssistant {
        &self.chat
    }

    /// Post a chat message. Returns `Ok(false)` for blank input.
    pub fn send_chat(&mut self, text: &str) -> Result<bool> {
        self.require_session()?;
        let Some(intent) = self.chat.submit(text) else {
            return Ok(false);
        };

        let reply = self.localizer.translate(intent.response_key());
        let tx = self.events_tx.clone();
        let generation = self.generation;
        let delay = self.chat_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Envelope {
                generation,
                event: DashboardEvent::ChatReply(reply),
            });
        });
        Ok(true)
    }

    /// Send one of the four quick questions (0-based).
    pub fn send_quick_question(&mut self, index: usize) -> Result<bool> {
        match QUICK_QUESTION_KEYS.get(index) {
            Some(key) => {
                let text = self.localizer.translate(key);
                self.send_chat(&text)
            }
            None => Ok(false),
        }
    }

    // ============================================
    // Event delivery
    // ============================================

    /// Apply every event that has already arrived. Returns how many were
    /// applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(envelope) = self.events_rx.try_recv() {
            if self.apply(envelope).is_some() {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next event, apply it and return it.
    ///
    /// Blocks until something arrives, so only await this while
    /// [`has_pending_work`](Self::has_pending_work) is true.
    pub async fn next_event(&mut self) -> Option<DashboardEvent> {
        loop {
            let envelope = self.events_rx.recv().await?;
            if let Some(event) = self.apply(envelope) {
                return Some(event);
            }
        }
    }

    fn apply(&mut self, envelope: Envelope) -> Option<DashboardEvent> {
        if envelope.generation != self.generation {
            tracing::debug!(
                generation = envelope.generation,
                current = self.generation,
                "Dropping event from a previous session"
            );
            return None;
        }

        match &envelope.event {
            DashboardEvent::Operation(outcome) => self.apply_outcome(outcome),
            DashboardEvent::ChatReply(text) => self.chat.receive_reply(text.clone()),
        }
        Some(envelope.event)
    }

    fn apply_outcome(&mut self, outcome: &OperationOutcome) {
        match &outcome.status {
            OperationStatus::Completed(payload) => {
                self.store_result(payload.clone());
                self.pipeline.complete_current_and_advance();
            }
            OperationStatus::Failed(reason) => {
                let params = Params::new()
                    .with("operation", outcome.kind)
                    .with("reason", reason);
                self.last_error = Some(self.localizer.translate_with("operationFailed", &params));
            }
            OperationStatus::Running => {
                tracing::warn!(kind = %outcome.kind, "Received non-terminal outcome");
            }
        }
    }

    fn store_result(&mut self, payload: MockPayload) {
        match payload {
            MockPayload::Enhancement(r) => self.results.enhancement = Some(r),
            MockPayload::Analysis(r) => self.results.analysis = Some(r),
            MockPayload::Summary(r) => self.results.summary = Some(r),
            MockPayload::Report(r) => {
                self.results.report = Some(r);
                self.notice = Some(self.localizer.translate("downloadStarted"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperationsConfig;
    use crate::pipeline::StageStatus;

    fn dashboard() -> Dashboard {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.migrate().unwrap();
        Dashboard::new(db, &Config::default())
    }

    async fn signed_in() -> Dashboard {
        let mut dashboard = dashboard();
        dashboard
            .login("unhcr.admin", "humanitarian2024")
            .await
            .unwrap();
        dashboard
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_require_session() {
        let mut dashboard = dashboard();
        assert!(matches!(
            dashboard.trigger(OperationKind::Enhance),
            Err(Error::NotAuthenticated)
        ));
        assert!(matches!(
            dashboard.select_sample_data(),
            Err(Error::NotAuthenticated)
        ));
        assert!(matches!(dashboard.navigate(2), Err(Error::NotAuthenticated)));
        assert!(matches!(
            dashboard.send_chat("hi"),
            Err(Error::NotAuthenticated)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enhance_without_images_is_unmet() {
        let mut dashboard = signed_in().await;
        dashboard.navigate(1).unwrap();

        assert_eq!(
            dashboard.trigger(OperationKind::Enhance).unwrap(),
            Trigger::Unmet(UnmetPrecondition::NoImages)
        );
        assert_eq!(
            dashboard.images_for(Stage::Analyze),
            Err(UnmetPrecondition::NoImages)
        );
        assert!(!dashboard.has_pending_work());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_outside_active_stage_is_unmet() {
        let mut dashboard = signed_in().await;
        dashboard.select_sample_data().unwrap();

        assert_eq!(
            dashboard.trigger(OperationKind::Summarize).unwrap(),
            Trigger::Unmet(UnmetPrecondition::StageNotActive {
                required: Stage::Summarize,
                active: Stage::Enhance,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sample_data_completes_upload() {
        let mut dashboard = signed_in().await;
        dashboard.select_sample_data().unwrap();

        assert_eq!(dashboard.assets().images().len(), 2);
        assert_eq!(dashboard.pipeline().status(Stage::Upload), StageStatus::Completed);
        assert_eq!(dashboard.pipeline().active_stage(), Stage::Enhance);

        // A second upload replaces the images but does not advance again.
        dashboard.select_sample_data().unwrap();
        assert_eq!(dashboard.pipeline().active_stage(), Stage::Enhance);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enhancement_completion_advances_pipeline() {
        let mut dashboard = signed_in().await;
        dashboard.select_sample_data().unwrap();

        assert!(matches!(
            dashboard.trigger(OperationKind::Enhance).unwrap(),
            Trigger::Started(_)
        ));
        assert_eq!(
            dashboard.trigger(OperationKind::Enhance).unwrap(),
            Trigger::AlreadyRunning
        );
        assert_eq!(dashboard.pump(), 0);

        let event = dashboard.next_event().await.unwrap();
        assert!(matches!(event, DashboardEvent::Operation(_)));
        assert_eq!(dashboard.pipeline().active_stage(), Stage::Analyze);
        assert_eq!(
            dashboard.results().enhancement.as_ref().unwrap().damage_areas_detected,
            4
        );

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(dashboard.pump(), 0);
        assert_eq!(dashboard.pipeline().active_stage(), Stage::Analyze);
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_sets_download_notice() {
        let mut dashboard = signed_in().await;
        dashboard.select_sample_data().unwrap();
        dashboard.navigate(Stage::Report.index()).unwrap();

        dashboard.trigger(OperationKind::GenerateReport).unwrap();
        dashboard.next_event().await.unwrap();

        assert!(dashboard.pipeline().is_terminal());
        assert_eq!(
            dashboard.notice(),
            Some("Download started! Files will be saved to your downloads folder.")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_needs_a_format() {
        let mut dashboard = signed_in().await;
        dashboard.navigate(Stage::Report.index()).unwrap();
        dashboard.toggle_report_format("pdf");

        assert_eq!(
            dashboard.trigger(OperationKind::GenerateReport).unwrap(),
            Trigger::Unmet(UnmetPrecondition::NoFormatsSelected)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_operation_keeps_stage() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.migrate().unwrap();
        let config = Config {
            operations: OperationsConfig {
                fail: vec![OperationKind::Enhance],
                ..OperationsConfig::default()
            },
            ..Config::default()
        };
        let mut dashboard = Dashboard::new(db, &config);
        dashboard.login("wfp.logistics", "foodsecurity").await.unwrap();
        dashboard.select_sample_data().unwrap();

        dashboard.trigger(OperationKind::Enhance).unwrap();
        dashboard.next_event().await.unwrap();

        assert_eq!(dashboard.pipeline().active_stage(), Stage::Enhance);
        assert!(dashboard.results().enhancement.is_none());
        assert!(dashboard.last_error().unwrap().starts_with("enhance failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_after_logout_is_dropped() {
        let mut dashboard = signed_in().await;
        dashboard.select_sample_data().unwrap();
        dashboard.trigger(OperationKind::Enhance).unwrap();

        dashboard.logout();
        dashboard
            .login("unhcr.admin", "humanitarian2024")
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(dashboard.pump(), 0);
        assert_eq!(dashboard.pipeline(), &PipelineState::new());
        assert!(dashboard.assets().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_restarts_after_relogin() {
        let mut dashboard = signed_in().await;
        dashboard.select_sample_data().unwrap();
        dashboard.trigger(OperationKind::Enhance).unwrap();

        dashboard.logout();
        dashboard
            .login("unhcr.admin", "humanitarian2024")
            .await
            .unwrap();
        assert!(!dashboard.has_pending_work());

        dashboard.select_sample_data().unwrap();
        assert!(matches!(
            dashboard.trigger(OperationKind::Enhance).unwrap(),
            Trigger::Started(_)
        ));
        assert!(dashboard.has_pending_work());

        let event = tokio::time::timeout(Duration::from_secs(60), dashboard.next_event())
            .await
            .expect("completion for the new session")
            .unwrap();
        assert!(matches!(event, DashboardEvent::Operation(_)));
        assert_eq!(dashboard.pipeline().active_stage(), Stage::Analyze);
        assert!(dashboard.results().enhancement.is_some());
        assert!(!dashboard.has_pending_work());
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_reply_uses_active_language() {
        let mut dashboard = signed_in().await;
        assert!(!dashboard.send_chat("  ").unwrap());

        assert!(dashboard.send_quick_question(1).unwrap());
        assert!(dashboard.chat().is_typing());
        assert!(dashboard.has_pending_work());

        let event = dashboard.next_event().await.unwrap();
        match event {
            DashboardEvent::ChatReply(text) => assert!(text.contains("Central High School")),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(!dashboard.chat().is_typing());
        assert_eq!(dashboard.chat().messages().len(), 3);
        assert!(!dashboard.send_quick_question(4).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_clears_everything() {
        let mut dashboard = signed_in().await;
        dashboard.select_sample_data().unwrap();
        dashboard.send_chat("aid").unwrap();

        dashboard.logout();
        assert!(!dashboard.is_authenticated());
        assert!(dashboard.assets().is_empty());
        assert_eq!(dashboard.chat().messages().len(), 1);
        assert_eq!(dashboard.pipeline().active_index(), 0);
        assert!(dashboard.restore().is_none());
    }

    #[tokio::test]
    async fn test_instant_operations() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.migrate().unwrap();
        let mut config = Config::default();
        config.operations = OperationsConfig::instant();
        config.session.auth_latency_ms = 0;

        let mut dashboard = Dashboard::new(db, &config);
        dashboard.login("unicef.analyst", "children2024").await.unwrap();
        dashboard.select_sample_data().unwrap();
        dashboard.trigger(OperationKind::Enhance).unwrap();
        dashboard.next_event().await.unwrap();
        assert_eq!(dashboard.pipeline().active_stage(), Stage::Analyze);
    }
}
