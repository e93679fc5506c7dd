use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, Popup};
use crate::tui::AppEvent;

/// Verses skipped by H/L.
const VERSE_JUMP: i32 = 10;

/// Convert a character index to a byte index for UTF-8 string manipulation
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    app.notice = None;

    match app.popup {
        Some(Popup::About) => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q' | 'a')) {
                app.popup = None;
            }
        }
        Some(Popup::Subscribe) => handle_subscribe(app, key),
        Some(Popup::ProviderPicker) => handle_provider_picker(app, key),
        Some(Popup::ApiKeyInput) => handle_api_key_input(app, key),
        None => handle_main(app, key),
    }
}

fn handle_main(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('q') => app.quit(),

        // Controls bar
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),
        KeyCode::Char('h') | KeyCode::Left => app.prev_value(),
        KeyCode::Char('l') | KeyCode::Right => app.next_value(),
        KeyCode::Char('H') => app.jump_verse(-VERSE_JUMP),
        KeyCode::Char('L') => app.jump_verse(VERSE_JUMP),
        KeyCode::Enter | KeyCode::Char('e') => app.explain(),

        // Verse card actions
        KeyCode::Char('p') | KeyCode::Char(' ') => app.toggle_speech(),
        KeyCode::Char('s') => app.share(),

        // Popups
        KeyCode::Char('a') => app.open_about(),
        KeyCode::Char('w') => app.open_subscribe(),
        KeyCode::Char('P') => app.open_provider_picker(),

        // Content scrolling
        KeyCode::Char('d') if ctrl => app.scroll_half_page_down(),
        KeyCode::Char('u') if ctrl => app.scroll_half_page_up(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.content_scroll = 0,
        KeyCode::Char('G') => {
            app.content_scroll = app.total_content_lines.saturating_sub(app.content_height);
        }

        _ => {}
    }
}

fn handle_subscribe(app: &mut App, key: KeyEvent) {
    let form = &mut app.subscription;

    if form.submitted {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => app.popup = None,
            // Register another number
            KeyCode::Enter | KeyCode::Char('r') => form.reset(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.popup = None,
        KeyCode::Enter => {
            form.submit();
        }
        KeyCode::Backspace => form.backspace(),
        KeyCode::Delete => form.delete(),
        KeyCode::Left => form.move_left(),
        KeyCode::Right => form.move_right(),
        KeyCode::Home => form.move_home(),
        KeyCode::End => form.move_end(),
        KeyCode::Char(c) => form.insert(c),
        _ => {}
    }
}

fn handle_provider_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.popup = None,
        KeyCode::Char('j') | KeyCode::Down => app.provider_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.provider_picker_nav_up(),
        KeyCode::Enter => app.select_provider(),
        _ => {}
    }
}

fn handle_api_key_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.popup = None;
            app.api_key_input.clear();
            app.api_key_input_cursor = 0;
            app.api_key_target_provider = None;
        }
        KeyCode::Enter => app.submit_api_key(),
        KeyCode::Backspace => {
            if app.api_key_input_cursor > 0 {
                app.api_key_input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
                app.api_key_input.remove(byte_pos);
            }
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.api_key_input, app.api_key_input_cursor);
            app.api_key_input.insert(byte_pos, c);
            app.api_key_input_cursor += 1;
        }
        KeyCode::Left => {
            app.api_key_input_cursor = app.api_key_input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let len = app.api_key_input.chars().count();
            app.api_key_input_cursor = (app.api_key_input_cursor + 1).min(len);
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(),
        MouseEventKind::ScrollUp => app.scroll_up(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{settle, test_app, CountingVoice};
    use crate::app::Focus;

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_str(app: &mut App, s: &str) {
        s.chars().for_each(|c| press(app, KeyCode::Char(c)));
    }

    #[test]
    fn test_char_to_byte_index() {
        assert_eq!(char_to_byte_index("कर्म", 1), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[tokio::test]
    async fn test_tab_cycles_focus() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        assert_eq!(app.focus, Focus::Explain);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Chapter);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Focus::Explain);
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn test_chapter_keys_reset_verse_when_out_of_range() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        settle(&mut app).await;
        app.session.set_chapter(18);
        app.session.set_verse(78);

        app.focus = Focus::Chapter;
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.session.selection().chapter, 1);
        assert_eq!(app.session.selection().verse, 1);
        assert!(!app.session.is_loading());
    }

    #[tokio::test]
    async fn test_subscribe_flow() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        settle(&mut app).await;

        press(&mut app, KeyCode::Char('w'));
        assert_eq!(app.popup, Some(Popup::Subscribe));

        type_str(&mut app, "12345");
        press(&mut app, KeyCode::Enter);
        assert!(!app.subscription.submitted);

        type_str(&mut app, "6");
        press(&mut app, KeyCode::Enter);
        assert!(app.subscription.submitted);

        press(&mut app, KeyCode::Char('r'));
        assert!(!app.subscription.submitted);
        assert_eq!(app.subscription.phone, "123456");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.popup, None);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_api_key_popup_for_provider_without_key() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        settle(&mut app).await;
        if app.config.key_source(gita_core::Provider::OpenAI).is_some() {
            return;
        }

        press(&mut app, KeyCode::Char('P'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.popup, Some(Popup::ApiKeyInput));

        type_str(&mut app, "sk-tesx");
        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "t");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.popup, None);
        assert_eq!(app.provider(), gita_core::Provider::OpenAI);
        assert_eq!(app.config.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[tokio::test]
    async fn test_empty_api_key_keeps_popup_waiting_for_key() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        settle(&mut app).await;
        if app.config.key_source(gita_core::Provider::OpenAI).is_some() {
            return;
        }

        press(&mut app, KeyCode::Char('P'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.popup, Some(Popup::ApiKeyInput));
        assert_eq!(app.api_key_target_provider, Some(gita_core::Provider::OpenAI));

        type_str(&mut app, "sk-test");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.popup, None);
        assert_eq!(app.provider(), gita_core::Provider::OpenAI);
        assert_eq!(app.config.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[tokio::test]
    async fn test_about_popup_opens_and_closes() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        settle(&mut app).await;

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.popup, Some(Popup::About));
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.popup, None);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_q_and_ctrl_c_quit() {
        let (mut app, _dir) = test_app(CountingVoice::default());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let (mut app, _dir) = test_app(CountingVoice::default());
        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert!(app.should_quit);
    }
}
