//! Read-aloud of the Sanskrit verse through an external speech synthesizer.
//!
//! At most one playback is active at a time. A missing synthesizer is not an
//! error: narration just does nothing.

use std::io;
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

/// What to say and how.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// BCP 47 language tag, e.g. `hi-IN`.
    pub lang: String,
    /// 1.0 is the synthesizer's normal speed.
    pub rate: f32,
    /// 1.0 is the synthesizer's normal pitch.
    pub pitch: f32,
}

impl Utterance {
    /// Devanagari verse text: Hindi voice, slightly slower and deeper.
    pub fn sanskrit(text: &str) -> Self {
        Self {
            text: text.to_string(),
            lang: "hi-IN".to_string(),
            rate: 0.8,
            pitch: 0.9,
        }
    }
}

/// A running playback.
pub trait Playback: Send {
    fn is_finished(&mut self) -> bool;
    fn cancel(&mut self);
}

/// Something that can start speaking an utterance.
pub trait Voice: Send {
    fn speak(&self, utterance: &Utterance) -> io::Result<Box<dyn Playback>>;
}

/// Speaks by spawning an espeak-compatible program (`-v`, `-s`, `-p` flags).
#[derive(Debug, Clone)]
pub struct CommandVoice {
    program: String,
}

const BASE_WORDS_PER_MINUTE: f32 = 175.0;
const BASE_PITCH: f32 = 50.0;

impl CommandVoice {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn args(utterance: &Utterance) -> Vec<String> {
        vec![
            "-v".to_string(),
            voice_for_tag(&utterance.lang),
            "-s".to_string(),
            ((BASE_WORDS_PER_MINUTE * utterance.rate).round() as u32).to_string(),
            "-p".to_string(),
            ((BASE_PITCH * utterance.pitch).round().clamp(0.0, 99.0) as u32).to_string(),
            utterance.text.clone(),
        ]
    }
}

/// Primary language subtag, which is what espeak names its voices after.
fn voice_for_tag(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("en")
        .to_lowercase()
}

impl Voice for CommandVoice {
    fn speak(&self, utterance: &Utterance) -> io::Result<Box<dyn Playback>> {
        let child = Command::new(&self.program)
            .args(Self::args(utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(Box::new(ChildPlayback { child }))
    }
}

struct ChildPlayback {
    child: Child,
}

impl Playback for ChildPlayback {
    fn is_finished(&mut self) -> bool {
        // An error from try_wait means the process is gone either way.
        !matches!(self.child.try_wait(), Ok(None))
    }

    fn cancel(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Lifecycle notifications from the narrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started,
    Stopped,
    Ended,
    Failed(String),
    /// No synthesizer available; nothing happened.
    Unavailable,
}

pub struct Narrator {
    voice: Option<Box<dyn Voice>>,
    active: Option<Box<dyn Playback>>,
}

impl Narrator {
    pub fn new(voice: Box<dyn Voice>) -> Self {
        Self {
            voice: Some(voice),
            active: None,
        }
    }

    /// A narrator without a voice; every toggle is a no-op.
    pub fn silent() -> Self {
        Self {
            voice: None,
            active: None,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.active.is_some()
    }

    /// Stop the active playback, or start speaking `text` with the Sanskrit
    /// voice settings.
    pub fn toggle(&mut self, text: &str) -> SpeechEvent {
        // A playback that ended between ticks no longer counts as active.
        self.poll();
        if self.stop() {
            return SpeechEvent::Stopped;
        }

        let Some(voice) = &self.voice else {
            return SpeechEvent::Unavailable;
        };

        match voice.speak(&Utterance::sanskrit(text)) {
            Ok(playback) => {
                self.active = Some(playback);
                SpeechEvent::Started
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("speech synthesizer not installed, narration disabled");
                self.voice = None;
                SpeechEvent::Unavailable
            }
            Err(e) => {
                warn!(error = %e, "speech synthesizer failed to start");
                SpeechEvent::Failed(e.to_string())
            }
        }
    }

    /// Cancel any active playback. Returns true if something was playing.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some(mut playback) => {
                playback.cancel();
                true
            }
            None => false,
        }
    }

    /// Report `Ended` once the active playback has finished on its own.
    pub fn poll(&mut self) -> Option<SpeechEvent> {
        let finished = self.active.as_mut().map(|p| p.is_finished())?;
        if finished {
            self.active = None;
            Some(SpeechEvent::Ended)
        } else {
            None
        }
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Voice that records what it was asked to say.
    #[derive(Clone, Default)]
    pub struct FakeVoice {
        pub spoken: Arc<Mutex<Vec<Utterance>>>,
        pub cancelled: Arc<AtomicUsize>,
        pub finished: Arc<AtomicBool>,
        pub missing: bool,
    }

    struct FakePlayback {
        cancelled: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
    }

    impl Playback for FakePlayback {
        fn is_finished(&mut self) -> bool {
            self.finished.load(Ordering::SeqCst)
        }

        fn cancel(&mut self) {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Voice for FakeVoice {
        fn speak(&self, utterance: &Utterance) -> io::Result<Box<dyn Playback>> {
            if self.missing {
                return Err(io::Error::new(io::ErrorKind::NotFound, "espeak-ng"));
            }
            self.spoken.lock().unwrap().push(utterance.clone());
            Ok(Box::new(FakePlayback {
                cancelled: self.cancelled.clone(),
                finished: self.finished.clone(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeVoice;
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_sanskrit_utterance_settings() {
        let utterance = Utterance::sanskrit("धर्मक्षेत्रे कुरुक्षेत्रे");
        assert_eq!(utterance.lang, "hi-IN");
        assert!(utterance.rate < 1.0);
        assert!(utterance.pitch < 1.0);
    }

    #[test]
    fn test_command_args() {
        let args = CommandVoice::args(&Utterance::sanskrit("ॐ"));
        assert_eq!(args, vec!["-v", "hi", "-s", "140", "-p", "45", "ॐ"]);
    }

    #[test]
    fn test_voice_for_tag() {
        assert_eq!(voice_for_tag("hi-IN"), "hi");
        assert_eq!(voice_for_tag("en_GB"), "en");
        assert_eq!(voice_for_tag(""), "en");
    }

    #[test]
    fn test_toggle_twice_stops_instead_of_starting_again() {
        let voice = FakeVoice::default();
        let mut narrator = Narrator::new(Box::new(voice.clone()));

        assert_eq!(narrator.toggle("verse"), SpeechEvent::Started);
        assert!(narrator.is_speaking());
        assert_eq!(narrator.toggle("verse"), SpeechEvent::Stopped);
        assert!(!narrator.is_speaking());

        assert_eq!(voice.spoken.lock().unwrap().len(), 1);
        assert_eq!(voice.cancelled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_toggle_after_unpolled_end_starts_again() {
        let voice = FakeVoice::default();
        let mut narrator = Narrator::new(Box::new(voice.clone()));

        assert_eq!(narrator.toggle("verse"), SpeechEvent::Started);
        voice.finished.store(true, Ordering::SeqCst);
        assert_eq!(narrator.toggle("verse"), SpeechEvent::Started);

        assert_eq!(voice.spoken.lock().unwrap().len(), 2);
        assert_eq!(voice.cancelled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_poll_reports_end() {
        let voice = FakeVoice::default();
        let mut narrator = Narrator::new(Box::new(voice.clone()));
        narrator.toggle("verse");

        assert_eq!(narrator.poll(), None);
        voice.finished.store(true, Ordering::SeqCst);
        assert_eq!(narrator.poll(), Some(SpeechEvent::Ended));
        assert!(!narrator.is_speaking());
        assert_eq!(narrator.poll(), None);
    }

    #[test]
    fn test_missing_synthesizer_is_silent() {
        let voice = FakeVoice {
            missing: true,
            ..FakeVoice::default()
        };
        let mut narrator = Narrator::new(Box::new(voice));
        assert_eq!(narrator.toggle("verse"), SpeechEvent::Unavailable);
        assert!(!narrator.is_speaking());
        assert_eq!(narrator.toggle("verse"), SpeechEvent::Unavailable);

        let mut silent = Narrator::silent();
        assert_eq!(silent.toggle("verse"), SpeechEvent::Unavailable);
    }

    #[test]
    fn test_drop_cancels_playback() {
        let voice = FakeVoice::default();
        {
            let mut narrator = Narrator::new(Box::new(voice.clone()));
            narrator.toggle("verse");
        }
        assert_eq!(voice.cancelled.load(Ordering::SeqCst), 1);
    }
}
