use std::path::PathBuf;

use futures_util::FutureExt;
use rand::Rng;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use gita_core::{
    CommandVoice, Config, ExplainError, Explanation, ExplanationClient, Narrator, Provider,
    Session, ShareCard, ShareError, ShareOutcome, Sharer, SpeechEvent, SubscriptionForm,
    VerseRequest,
};

/// Controls bar element with keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Chapter,
    Verse,
    Language,
    Explain,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Chapter => Focus::Verse,
            Focus::Verse => Focus::Language,
            Focus::Language => Focus::Explain,
            Focus::Explain => Focus::Chapter,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Chapter => Focus::Explain,
            Focus::Verse => Focus::Chapter,
            Focus::Language => Focus::Verse,
            Focus::Explain => Focus::Language,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    About,
    Subscribe,
    ProviderPicker,
    ApiKeyInput,
}

type ExplainTask = JoinHandle<Result<Explanation, ExplainError>>;
type ShareTask = JoinHandle<Result<ShareOutcome, ShareError>>;

pub struct App {
    pub should_quit: bool,
    pub focus: Focus,
    pub popup: Option<Popup>,

    // Verse selection and the explanation slot
    pub session: Session,
    client: ExplanationClient,
    explain_task: Option<(u64, ExplainTask)>,

    // Capabilities
    narrator: Narrator,
    sharer: Sharer,
    share_task: Option<ShareTask>,

    // Content state
    pub content_scroll: u16,
    pub content_height: u16,
    pub total_content_lines: u16,
    pub animation_frame: usize,

    /// One-line status message, cleared on the next key press.
    pub notice: Option<String>,

    pub subscription: SubscriptionForm,

    // Provider setup
    pub config: Config,
    config_path: Option<PathBuf>,
    pub provider_picker_state: ListState,
    pub api_key_input: String,
    pub api_key_input_cursor: usize,
    pub api_key_target_provider: Option<Provider>,
}

impl App {
    /// Build the app from config and start loading a random verse.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new<R: Rng + ?Sized>(config: Config, config_path: Option<PathBuf>, rng: &mut R) -> Self {
        let client = ExplanationClient::from_config(&config);
        let narrator = Narrator::new(Box::new(CommandVoice::new(&config.speech_command())));
        let sharer = Sharer::from_config(&config);
        Self::with_services(config, config_path, client, narrator, sharer, rng)
    }

    pub fn with_services<R: Rng + ?Sized>(
        config: Config,
        config_path: Option<PathBuf>,
        client: ExplanationClient,
        narrator: Narrator,
        sharer: Sharer,
        rng: &mut R,
    ) -> Self {
        let (session, request) = Session::start(rng);
        let mut app = Self {
            should_quit: false,
            focus: Focus::Explain,
            popup: None,
            session,
            client,
            explain_task: None,
            narrator,
            sharer,
            share_task: None,
            content_scroll: 0,
            content_height: 0,
            total_content_lines: 0,
            animation_frame: 0,
            notice: None,
            subscription: SubscriptionForm::new(),
            config,
            config_path,
            provider_picker_state: ListState::default(),
            api_key_input: String::new(),
            api_key_input_cursor: 0,
            api_key_target_provider: None,
        };
        app.spawn_fetch(request);
        app
    }

    pub fn provider(&self) -> Provider {
        self.client.provider()
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn quit(&mut self) {
        self.narrator.stop();
        self.should_quit = true;
    }

    // Selection

    pub fn next_value(&mut self) {
        self.change_selection(|session, focus| match focus {
            Focus::Chapter => session.next_chapter(),
            Focus::Verse => session.next_verse(),
            Focus::Language => session.next_language(),
            Focus::Explain => {}
        });
    }

    pub fn prev_value(&mut self) {
        self.change_selection(|session, focus| match focus {
            Focus::Chapter => session.prev_chapter(),
            Focus::Verse => session.prev_verse(),
            Focus::Language => session.prev_language(),
            Focus::Explain => {}
        });
    }

    /// Move the verse by `delta`, stopping at the ends of the chapter.
    pub fn jump_verse(&mut self, delta: i32) {
        let range = self.session.verse_range();
        let target = (self.session.selection().verse as i32 + delta)
            .clamp(*range.start() as i32, *range.end() as i32);
        self.change_selection(|session, _| {
            session.set_verse(target as u16);
        });
    }

    fn change_selection(&mut self, change: impl FnOnce(&mut Session, Focus)) {
        let before = (self.session.selection().chapter, self.session.selection().verse);
        change(&mut self.session, self.focus);
        let after = (self.session.selection().chapter, self.session.selection().verse);
        if before != after {
            self.narrator.stop();
        }
    }

    // Explanation requests

    /// Request an explanation of the selected verse. Ignored while loading.
    pub fn explain(&mut self) {
        let Some(request) = self.session.request() else {
            return;
        };
        self.narrator.stop();
        self.content_scroll = 0;
        self.spawn_fetch(request);
    }

    fn spawn_fetch(&mut self, request: VerseRequest) {
        let client = self.client.clone();
        let id = request.id;
        let task = tokio::spawn(async move {
            client
                .fetch_explanation(request.chapter, request.verse, &request.language)
                .await
        });
        self.explain_task = Some((id, task));
    }

    /// Collect finished background work. Called after every event.
    pub fn poll_tasks(&mut self) {
        self.poll_explain_task();
        self.poll_share_task();
        self.narrator.poll();
    }

    fn poll_explain_task(&mut self) {
        let (id, joined) = match self.explain_task.as_mut() {
            Some((id, task)) => match task.now_or_never() {
                Some(joined) => (*id, joined),
                None => return,
            },
            None => return,
        };
        self.explain_task = None;

        let outcome = joined.unwrap_or_else(|e| Err(ExplainError::Interrupted(e.to_string())));
        if self.session.resolve(id, outcome) {
            self.narrator.stop();
            self.content_scroll = 0;
        }
    }

    fn poll_share_task(&mut self) {
        let Some(task) = self.share_task.as_mut() else {
            return;
        };
        let Some(joined) = task.now_or_never() else {
            return;
        };
        self.share_task = None;

        self.notice = Some(match joined {
            Ok(Ok(ShareOutcome::Shared)) => "Verse card shared".to_string(),
            Ok(Ok(ShareOutcome::Downloaded(path))) => {
                format!("Verse card saved to {}", path.display())
            }
            Ok(Err(ShareError::FontUnavailable)) => {
                "Sharing needs a Devanagari font: set font_path in the config".to_string()
            }
            Ok(Err(e)) => {
                warn!(error = %e, "share failed");
                format!("Could not share the verse card: {}", e)
            }
            Err(e) => {
                warn!(error = %e, "share task did not complete");
                "Could not share the verse card".to_string()
            }
        });
    }

    // Narration

    pub fn is_speaking(&self) -> bool {
        self.narrator.is_speaking()
    }

    /// Start or stop reading the Sanskrit verse aloud.
    pub fn toggle_speech(&mut self) {
        let Some(text) = self.session.explanation().map(|e| e.sanskrit.clone()) else {
            return;
        };
        match self.narrator.toggle(&text) {
            SpeechEvent::Unavailable => {
                self.notice = Some(format!(
                    "Speech is not available: install {} or set speech_command",
                    self.config.speech_command()
                ));
            }
            SpeechEvent::Failed(e) => self.notice = Some(format!("Speech failed: {}", e)),
            _ => {}
        }
    }

    // Sharing

    pub fn is_sharing(&self) -> bool {
        self.share_task.is_some()
    }

    /// Render the shown verse card on a blocking task and deliver it.
    pub fn share(&mut self) {
        if self.share_task.is_some() {
            return;
        }
        let (Some(explanation), Some(shown)) = (self.session.explanation(), self.session.displayed())
        else {
            return;
        };
        let card = ShareCard {
            chapter: shown.chapter,
            verse: shown.verse,
            explanation: explanation.clone(),
        };
        let sharer = self.sharer.clone();
        self.notice = Some("Preparing verse card...".to_string());
        self.share_task = Some(tokio::task::spawn_blocking(move || sharer.share(&card)));
    }

    pub fn open_about(&mut self) {
        self.popup = Some(Popup::About);
    }

    // Subscription

    pub fn open_subscribe(&mut self) {
        self.popup = Some(Popup::Subscribe);
    }

    // Provider setup

    pub fn open_provider_picker(&mut self) {
        let current = Provider::all().iter().position(|p| *p == self.provider());
        self.provider_picker_state.select(current.or(Some(0)));
        self.popup = Some(Popup::ProviderPicker);
    }

    pub fn provider_picker_nav_down(&mut self) {
        let count = Provider::all().len();
        let i = self.provider_picker_state.selected().map_or(0, |i| (i + 1) % count);
        self.provider_picker_state.select(Some(i));
    }

    pub fn provider_picker_nav_up(&mut self) {
        let count = Provider::all().len();
        let i = self
            .provider_picker_state
            .selected()
            .map_or(0, |i| (i + count - 1) % count);
        self.provider_picker_state.select(Some(i));
    }

    /// Switch to the highlighted provider, asking for a key first if needed.
    pub fn select_provider(&mut self) {
        let Some(provider) = self
            .provider_picker_state
            .selected()
            .and_then(|i| Provider::all().get(i).copied())
        else {
            return;
        };

        if self.config.key_source(provider).is_none() {
            self.api_key_target_provider = Some(provider);
            self.api_key_input.clear();
            self.api_key_input_cursor = 0;
            self.popup = Some(Popup::ApiKeyInput);
        } else {
            self.popup = None;
            self.apply_provider(provider);
        }
    }

    pub fn submit_api_key(&mut self) {
        if self.api_key_input.trim().is_empty() {
            return;
        }
        let Some(provider) = self.api_key_target_provider.take() else {
            self.popup = None;
            return;
        };
        self.config.set_api_key(provider, &self.api_key_input);
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
        self.popup = None;
        self.apply_provider(provider);
    }

    fn apply_provider(&mut self, provider: Provider) {
        self.config.set_provider(provider);
        self.client = ExplanationClient::from_config(&self.config);
        info!(provider = provider.as_str(), model = self.client.model(), "provider changed");
        self.save_config();
        self.notice = Some(format!("Using {} ({})", provider.display_name(), self.client.model()));
    }

    fn save_config(&mut self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            warn!(error = %e, path = %path.display(), "failed to save config");
            self.notice = Some(format!("Could not save config: {}", e));
        }
    }

    // Content scrolling

    pub fn scroll_down(&mut self) {
        if self.content_scroll < self.total_content_lines.saturating_sub(self.content_height) {
            self.content_scroll = self.content_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.content_scroll = self.content_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.content_height / 2;
        let max_scroll = self.total_content_lines.saturating_sub(self.content_height);
        self.content_scroll = (self.content_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.content_height / 2;
        self.content_scroll = self.content_scroll.saturating_sub(half_page);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 4;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use gita_core::speech::{Playback, Utterance, Voice};
    use gita_core::{RequestStatus, FETCH_ERROR_MESSAGE};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    #[derive(Clone, Default)]
    pub(crate) struct CountingVoice {
        pub started: Arc<AtomicUsize>,
        pub cancelled: Arc<AtomicUsize>,
    }

    struct CountingPlayback {
        cancelled: Arc<AtomicUsize>,
    }

    impl Playback for CountingPlayback {
        fn is_finished(&mut self) -> bool {
            false
        }

        fn cancel(&mut self) {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Voice for CountingVoice {
        fn speak(&self, _utterance: &Utterance) -> io::Result<Box<dyn Playback>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingPlayback {
                cancelled: self.cancelled.clone(),
            }))
        }
    }

    pub(crate) fn explanation() -> Explanation {
        Explanation {
            sanskrit: "कर्मण्येवाधिकारस्ते मा फलेषु कदाचन".to_string(),
            transliteration: "karmaṇy evādhikāras te mā phaleṣu kadācana".to_string(),
            translation: "You have a right to your actions, never to their fruits.".to_string(),
            modern_context: "Focus on the effort you control.".to_string(),
            practical_application: "Prepare well, then let go of the outcome.".to_string(),
            key_takeaway: "Do the work, release the result.".to_string(),
        }
    }

    /// App with an unconfigured backend, so every fetch fails without I/O.
    pub(crate) fn test_app(voice: CountingVoice) -> (App, TempDir) {
        let dir = tempdir().unwrap();
        let sharer = Sharer::new(Some(dir.path().join("missing.ttf")), None, dir.path().to_path_buf());
        let app = App::with_services(
            Config::new(),
            Some(dir.path().join("config.json")),
            ExplanationClient::unconfigured(Provider::Gemini),
            Narrator::new(Box::new(voice)),
            sharer,
            &mut StdRng::seed_from_u64(42),
        );
        (app, dir)
    }

    pub(crate) async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.poll_tasks();
            if app.explain_task.is_none() && app.share_task.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("background task did not finish");
    }

    /// Put a successful explanation of the current selection on screen.
    pub(crate) fn show_explanation(app: &mut App) {
        let request = app.session.request().unwrap();
        assert!(app.session.resolve(request.id, Ok(explanation())));
    }

    #[tokio::test]
    async fn test_start_loads_a_verse_and_reports_failure() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        assert!(app.session.is_loading());
        let first = app.session.displayed().unwrap().clone();
        assert_eq!(first.language, "English");

        settle(&mut app).await;
        assert_eq!(
            app.session.status(),
            &RequestStatus::Error(FETCH_ERROR_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_explain_is_ignored_while_loading() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        let first_id = app.session.displayed().unwrap().id;
        app.explain();
        assert_eq!(app.session.displayed().unwrap().id, first_id);

        settle(&mut app).await;
        app.explain();
        assert_eq!(app.session.displayed().unwrap().id, first_id + 1);
        assert!(app.session.is_loading());
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn test_double_toggle_stops_playback() {
        let voice = CountingVoice::default();
        let (mut app, _dir) = test_app(voice.clone());
        settle(&mut app).await;
        show_explanation(&mut app);

        app.toggle_speech();
        assert!(app.is_speaking());
        app.toggle_speech();
        assert!(!app.is_speaking());
        assert_eq!(voice.started.load(Ordering::SeqCst), 1);
        assert_eq!(voice.cancelled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_changing_verse_stops_playback() {
        let voice = CountingVoice::default();
        let (mut app, _dir) = test_app(voice.clone());
        settle(&mut app).await;
        show_explanation(&mut app);

        app.toggle_speech();
        app.focus = Focus::Verse;
        app.next_value();
        assert!(!app.is_speaking());
        assert_eq!(voice.cancelled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_language_change_keeps_playback() {
        let voice = CountingVoice::default();
        let (mut app, _dir) = test_app(voice.clone());
        settle(&mut app).await;
        show_explanation(&mut app);

        app.toggle_speech();
        app.focus = Focus::Language;
        app.next_value();
        assert!(app.is_speaking());
    }

    #[tokio::test]
    async fn test_new_request_stops_playback() {
        let voice = CountingVoice::default();
        let (mut app, _dir) = test_app(voice.clone());
        settle(&mut app).await;
        show_explanation(&mut app);

        app.toggle_speech();
        app.explain();
        assert!(!app.is_speaking());
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn test_jump_verse_clamps_to_chapter() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        app.jump_verse(10_000);
        let last = *app.session.verse_range().end();
        assert_eq!(app.session.selection().verse, last);
        app.jump_verse(-10_000);
        assert_eq!(app.session.selection().verse, 1);
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn test_share_without_font_sets_notice() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        settle(&mut app).await;

        app.share();
        assert!(!app.is_sharing());

        show_explanation(&mut app);
        app.share();
        assert!(app.is_sharing());
        settle(&mut app).await;
        assert!(app.notice.as_deref().unwrap().contains("font"));
    }

    #[tokio::test]
    async fn test_switch_to_ollama_saves_config() {
        let (mut app, dir) = test_app(CountingVoice::default());
        settle(&mut app).await;

        app.open_provider_picker();
        assert_eq!(app.popup, Some(Popup::ProviderPicker));
        assert_eq!(app.provider_picker_state.selected(), Some(0));
        app.provider_picker_nav_up();
        app.select_provider();

        assert_eq!(app.popup, None);
        assert_eq!(app.provider(), Provider::Ollama);
        assert_eq!(app.model(), "llama3.2:latest");
        let saved = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(saved.provider(), Provider::Ollama);
    }
}
