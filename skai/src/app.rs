//! Application state for the TUI.

use std::path::Path;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use skai_core::operations::OperationKind;
use skai_core::report::REPORT_FORMATS;
use skai_core::{AuthFailure, Dashboard, ImageAsset, ImageRole, Session, Stage, Trigger};

/// Which screen is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Screen {
    #[default]
    Login,
    Dashboard,
}

/// Login form field with keyboard focus.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LoginField {
    #[default]
    Identifier,
    Secret,
}

/// Where keystrokes go on the dashboard screen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Focus {
    #[default]
    Pipeline,
    /// Typing into the chat box
    Chat,
    /// Typing image paths for an upload
    Upload,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub identifier: String,
    pub secret: String,
    pub field: LoginField,
    pub error: Option<String>,
    /// Set while the credential check is in progress
    pub authenticating: bool,
    /// Index into the demo account hints, for F2 cycling
    hint_index: usize,
}

impl LoginForm {
    fn active_input(&mut self) -> &mut String {
        match self.field {
            LoginField::Identifier => &mut self.identifier,
            LoginField::Secret => &mut self.secret,
        }
    }
}

/// Main application state.
pub struct App {
    pub dashboard: Dashboard,
    pub screen: Screen,
    pub login: LoginForm,
    pub focus: Focus,
    /// Chat box contents
    pub chat_input: String,
    /// Upload box contents (whitespace-separated paths)
    pub upload_input: String,
    /// Highlighted row in the report format list
    pub report_cursor: usize,
    pub should_quit: bool,
    /// Credentials waiting to be checked by the main loop
    login_request: Option<(String, String)>,
}

impl App {
    pub fn new(dashboard: Dashboard) -> Self {
        let screen = if dashboard.is_authenticated() {
            Screen::Dashboard
        } else {
            Screen::Login
        };

        Self {
            dashboard,
            screen,
            login: LoginForm::default(),
            focus: Focus::default(),
            chat_input: String::new(),
            upload_input: String::new(),
            report_cursor: 0,
            should_quit: false,
            login_request: None,
        }
    }

    /// Apply finished background work. Called once per tick.
    pub fn tick(&mut self) {
        let applied = self.dashboard.pump();
        if applied > 0 {
            tracing::debug!(applied, "Applied dashboard events");
        }
    }

    /// Credentials submitted since the last call, if any.
    pub fn take_login_request(&mut self) -> Option<(String, String)> {
        let request = self.login_request.take();
        self.login.authenticating = request.is_some();
        request
    }

    /// Record the outcome of a credential check.
    pub fn finish_login(&mut self, result: std::result::Result<Session, AuthFailure>) {
        self.login.authenticating = false;
        match result {
            Ok(session) => {
                tracing::info!(user = %session.username, "Signed in from TUI");
                self.login = LoginForm::default();
                self.focus = Focus::Pipeline;
                self.report_cursor = 0;
                self.screen = Screen::Dashboard;
            }
            Err(failure) => {
                tracing::info!(identifier = %failure.identifier, "Sign-in rejected");
                self.login.secret.clear();
                self.login.error = Some(self.dashboard.t("invalidCredentials"));
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        let result = match self.screen {
            Screen::Login => {
                self.handle_login_key(key);
                Ok(())
            }
            Screen::Dashboard => match self.focus {
                Focus::Pipeline => self.handle_pipeline_key(key),
                Focus::Chat => self.handle_chat_key(key),
                Focus::Upload => self.handle_upload_key(key),
            },
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "Dashboard command failed");
        }
    }

    /// Handle keyboard input on the login screen.
    fn handle_login_key(&mut self, key: KeyEvent) {
        if self.login.authenticating {
            return;
        }

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.login.field = match self.login.field {
                    LoginField::Identifier => LoginField::Secret,
                    LoginField::Secret => LoginField::Identifier,
                };
            }
            KeyCode::F(2) => {
                let identifiers = self.dashboard.sessions().credentials().identifiers();
                if !identifiers.is_empty() {
                    let index = self.login.hint_index % identifiers.len();
                    self.login.identifier = identifiers[index].to_string();
                    self.login.hint_index = index + 1;
                    self.login.field = LoginField::Secret;
                }
            }
            KeyCode::F(3) => {
                self.dashboard.cycle_language();
            }
            KeyCode::Enter => {
                if self.login.field == LoginField::Identifier {
                    self.login.field = LoginField::Secret;
                } else {
                    self.login.error = None;
                    self.login_request =
                        Some((self.login.identifier.trim().to_string(), self.login.secret.clone()));
                }
            }
            KeyCode::Backspace => {
                self.login.active_input().pop();
            }
            KeyCode::Char(c) => {
                self.login.active_input().push(c);
            }
            _ => {}
        }
    }

    /// The active stage's operation is still running.
    fn stage_busy(&self) -> bool {
        OperationKind::for_stage(self.dashboard.pipeline().active_stage())
            .is_some_and(|kind| self.dashboard.is_running(kind))
    }

    /// Handle keyboard input while the pipeline has focus.
    fn handle_pipeline_key(&mut self, key: KeyEvent) -> Result<()> {
        let active = self.dashboard.pipeline().active_stage();

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            // The stepper stays put while the active stage is working, so
            // the completion lands on the stage that started it.
            KeyCode::Char('1'..='5') | KeyCode::Left | KeyCode::Char('h')
            | KeyCode::Right | KeyCode::Char('l')
                if self.stage_busy() => {}
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.dashboard.navigate(index)?;
            }
            KeyCode::Left | KeyCode::Char('h') => {
                let index = self.dashboard.pipeline().active_index();
                if index > 0 {
                    self.dashboard.navigate(index - 1)?;
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let index = self.dashboard.pipeline().active_index();
                self.dashboard.navigate(index + 1)?;
            }
            KeyCode::Enter => {
                self.run_stage_action(active)?;
            }
            KeyCode::Char('s') => {
                self.dashboard.select_sample_data()?;
            }
            KeyCode::Char('u') => {
                self.upload_input.clear();
                self.focus = Focus::Upload;
            }
            KeyCode::Char('c') | KeyCode::Tab => {
                self.focus = Focus::Chat;
            }
            KeyCode::F(n @ 1..=4) => {
                self.dashboard.send_quick_question(n as usize - 1)?;
            }
            KeyCode::Char('L') => {
                self.dashboard.cycle_language();
            }
            KeyCode::Char('o') => {
                self.sign_out();
            }
            KeyCode::Down | KeyCode::Char('j') if active == Stage::Report => {
                self.report_cursor = (self.report_cursor + 1) % REPORT_FORMATS.len();
            }
            KeyCode::Up | KeyCode::Char('k') if active == Stage::Report => {
                self.report_cursor =
                    (self.report_cursor + REPORT_FORMATS.len() - 1) % REPORT_FORMATS.len();
            }
            KeyCode::Char(' ') if active == Stage::Report => {
                let id = REPORT_FORMATS[self.report_cursor].id;
                self.dashboard.toggle_report_format(id);
            }
            _ => {}
        }
        Ok(())
    }

    /// Handle keyboard input while typing a chat message.
    fn handle_chat_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Tab => {
                self.focus = Focus::Pipeline;
            }
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.chat_input);
                self.dashboard.send_chat(&text)?;
            }
            KeyCode::F(n @ 1..=4) => {
                self.dashboard.send_quick_question(n as usize - 1)?;
            }
            KeyCode::Backspace => {
                self.chat_input.pop();
            }
            KeyCode::Char(c) => {
                self.chat_input.push(c);
            }
            _ => {}
        }
        Ok(())
    }

    /// Handle keyboard input while typing upload paths.
    fn handle_upload_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.upload_input.clear();
                self.focus = Focus::Pipeline;
            }
            KeyCode::Enter => {
                let images = assets_from_paths(&self.upload_input);
                self.upload_input.clear();
                self.focus = Focus::Pipeline;
                if !images.is_empty() {
                    self.dashboard.upload(images)?;
                }
            }
            KeyCode::Backspace => {
                self.upload_input.pop();
            }
            KeyCode::Char(c) => {
                self.upload_input.push(c);
            }
            _ => {}
        }
        Ok(())
    }

    /// Enter on the pipeline: the active stage's primary action.
    fn run_stage_action(&mut self, stage: Stage) -> Result<()> {
        let Some(kind) = OperationKind::for_stage(stage) else {
            return self.dashboard.select_sample_data().map_err(Into::into);
        };

        match self.dashboard.trigger(kind)? {
            Trigger::Started(id) => tracing::debug!(%kind, %id, "Started from TUI"),
            Trigger::AlreadyRunning => {}
            Trigger::Unmet(reason) => tracing::debug!(%kind, %reason, "Stage not ready"),
        }
        Ok(())
    }

    fn sign_out(&mut self) {
        self.dashboard.logout();
        self.chat_input.clear();
        self.upload_input.clear();
        self.focus = Focus::Pipeline;
        self.screen = Screen::Login;
    }
}

/// Turn typed paths into assets: the first is the pre-disaster image, the
/// rest are post-disaster.
fn assets_from_paths(input: &str) -> Vec<ImageAsset> {
    input
        .split_whitespace()
        .enumerate()
        .map(|(i, path)| {
            let role = if i == 0 {
                ImageRole::Pre
            } else {
                ImageRole::Post
            };
            ImageAsset::from_path(format!("upload-{}", i + 1), Path::new(path), role)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skai_core::{Config, Database, StageStatus};
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn app() -> App {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        App::new(Dashboard::new(Arc::new(db), &Config::default()))
    }

    async fn signed_in_app() -> App {
        let mut app = app();
        let result = app.dashboard.login("unhcr.admin", "humanitarian2024").await;
        app.finish_login(result);
        app
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_form_submits_credentials() {
        let mut app = app();
        assert_eq!(app.screen, Screen::Login);

        type_text(&mut app, "unhcr.admin");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.login.field, LoginField::Secret);
        type_text(&mut app, "humanitarian2024");
        app.handle_key(key(KeyCode::Enter));

        let (identifier, secret) = app.take_login_request().unwrap();
        assert!(app.login.authenticating);
        let result = app.dashboard.login(&identifier, &secret).await;
        app.finish_login(result);

        assert_eq!(app.screen, Screen::Dashboard);
        assert!(app.login.identifier.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_login_shows_message() {
        let mut app = app();
        let result = app.dashboard.login("unhcr.admin", "nope").await;
        app.finish_login(result);

        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.login.error.as_deref(), Some("Invalid username or password"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_f2_cycles_demo_accounts() {
        let mut app = app();
        app.handle_key(key(KeyCode::F(2)));
        let first = app.login.identifier.clone();
        app.handle_key(key(KeyCode::F(2)));
        assert_ne!(app.login.identifier, first);
        assert_eq!(app.login.field, LoginField::Secret);
    }

    #[tokio::test(start_paused = true)]
    async fn test_number_keys_navigate() {
        let mut app = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('4')));
        assert_eq!(app.dashboard.pipeline().active_stage(), Stage::Summarize);
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.dashboard.pipeline().active_stage(), Stage::Analyze);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_on_upload_uses_samples() {
        let mut app = signed_in_app().await;
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.dashboard.assets().images().len(), 2);
        assert_eq!(app.dashboard.pipeline().active_stage(), Stage::Enhance);

        app.handle_key(key(KeyCode::Enter));
        assert!(app.dashboard.is_running(OperationKind::Enhance));
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_waits_for_running_stage() {
        let mut app = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('s')));
        app.handle_key(key(KeyCode::Enter));
        assert!(app.dashboard.is_running(OperationKind::Enhance));

        app.handle_key(key(KeyCode::Char('4')));
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.dashboard.pipeline().active_stage(), Stage::Enhance);

        app.dashboard.next_event().await.unwrap();
        assert_eq!(app.dashboard.pipeline().status(Stage::Enhance), StageStatus::Completed);
        assert_eq!(app.dashboard.pipeline().active_stage(), Stage::Analyze);

        app.handle_key(key(KeyCode::Char('4')));
        assert_eq!(app.dashboard.pipeline().active_stage(), Stage::Summarize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_paths() {
        let mut app = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('u')));
        assert_eq!(app.focus, Focus::Upload);
        type_text(&mut app, "before.png after.png");
        app.handle_key(key(KeyCode::Enter));

        let images = app.dashboard.assets().images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].role, ImageRole::Pre);
        assert_eq!(images[1].name, "after.png");
        assert_eq!(app.focus, Focus::Pipeline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_typing_does_not_trigger_shortcuts() {
        let mut app = signed_in_app().await;
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "q shelter");
        assert!(!app.should_quit);

        app.handle_key(key(KeyCode::Enter));
        assert!(app.chat_input.is_empty());
        assert!(app.dashboard.chat().is_typing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_toggle() {
        let mut app = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('5')));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.dashboard.report().is_selected("images"));
        assert_eq!(app.dashboard.report().count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_returns_to_login() {
        let mut app = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('o')));
        assert_eq!(app.screen, Screen::Login);
        assert!(!app.dashboard.is_authenticated());
    }
}
