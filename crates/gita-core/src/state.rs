//! UI-agnostic selection and request state.
//!
//! [`Session`] owns the current chapter/verse/language selection and the
//! status of the single explanation slot. It never performs I/O: callers take
//! the [`VerseRequest`] ticket from [`Session::request`], run the fetch, and
//! hand the outcome back through [`Session::resolve`].

use std::ops::RangeInclusive;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::chapters::{self, ChapterInfo, CHAPTERS, DEFAULT_LANGUAGE, LANGUAGES};
use crate::error::ExplainError;
use crate::explanation::Explanation;

/// The only error text ever shown to the user for a failed request.
pub const FETCH_ERROR_MESSAGE: &str =
    "Unable to fetch the wisdom at this moment. Please verify your connection or try again.";

/// Status of the explanation slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Success(Explanation),
    Error(String),
}

/// The user's current choice of verse and language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub chapter: u8,
    pub verse: u16,
    pub language: String,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            chapter: 2,
            verse: 47,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Ticket for one explanation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerseRequest {
    pub id: u64,
    pub chapter: u8,
    pub verse: u16,
    pub language: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    selection: Selection,
    status: RequestStatus,
    /// Request the current status belongs to.
    displayed: Option<VerseRequest>,
    next_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start on a random verse in English and immediately begin loading it.
    pub fn start<R: Rng + ?Sized>(rng: &mut R) -> (Self, VerseRequest) {
        let (chapter, verse) = chapters::random_verse(rng);
        let mut session = Self {
            selection: Selection {
                chapter,
                verse,
                language: DEFAULT_LANGUAGE.to_string(),
            },
            ..Self::default()
        };
        let request = session.begin();
        (session, request)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn status(&self) -> &RequestStatus {
        &self.status
    }

    pub fn displayed(&self) -> Option<&VerseRequest> {
        self.displayed.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, RequestStatus::Loading)
    }

    pub fn explanation(&self) -> Option<&Explanation> {
        match &self.status {
            RequestStatus::Success(explanation) => Some(explanation),
            _ => None,
        }
    }

    pub fn chapter_info(&self) -> &'static ChapterInfo {
        // Selection only ever holds numbers from the table.
        chapters::chapter(self.selection.chapter).unwrap_or(&CHAPTERS[0])
    }

    pub fn verse_range(&self) -> RangeInclusive<u16> {
        1..=self.chapter_info().verse_count
    }

    /// Select a chapter, resetting the verse to 1 when it falls outside the
    /// new chapter. Returns false for an unknown chapter number.
    pub fn set_chapter(&mut self, number: u8) -> bool {
        let Some(info) = chapters::chapter(number) else {
            return false;
        };
        self.selection.chapter = info.number;
        if self.selection.verse > info.verse_count {
            self.selection.verse = 1;
        }
        true
    }

    pub fn next_chapter(&mut self) {
        let next = self.selection.chapter % CHAPTERS.len() as u8 + 1;
        self.set_chapter(next);
    }

    pub fn prev_chapter(&mut self) {
        let prev = if self.selection.chapter <= 1 {
            CHAPTERS.len() as u8
        } else {
            self.selection.chapter - 1
        };
        self.set_chapter(prev);
    }

    /// Select a verse of the current chapter. Out-of-range verses are refused.
    pub fn set_verse(&mut self, verse: u16) -> bool {
        if !self.verse_range().contains(&verse) {
            return false;
        }
        self.selection.verse = verse;
        true
    }

    pub fn next_verse(&mut self) {
        let count = self.chapter_info().verse_count;
        self.selection.verse = self.selection.verse % count + 1;
    }

    pub fn prev_verse(&mut self) {
        let count = self.chapter_info().verse_count;
        self.selection.verse = if self.selection.verse <= 1 {
            count
        } else {
            self.selection.verse - 1
        };
    }

    /// Any string is accepted; the backend decides what to make of it.
    pub fn set_language(&mut self, language: &str) {
        self.selection.language = language.to_string();
    }

    pub fn next_language(&mut self) {
        let idx = self.language_index().map(|i| (i + 1) % LANGUAGES.len()).unwrap_or(0);
        self.selection.language = LANGUAGES[idx].to_string();
    }

    pub fn prev_language(&mut self) {
        let idx = self
            .language_index()
            .map(|i| (i + LANGUAGES.len() - 1) % LANGUAGES.len())
            .unwrap_or(0);
        self.selection.language = LANGUAGES[idx].to_string();
    }

    fn language_index(&self) -> Option<usize> {
        LANGUAGES.iter().position(|l| *l == self.selection.language)
    }

    /// Begin a request for the current selection.
    ///
    /// Returns `None` while a request is already loading.
    pub fn request(&mut self) -> Option<VerseRequest> {
        if self.is_loading() {
            debug!("explain ignored, request already in flight");
            return None;
        }
        Some(self.begin())
    }

    fn begin(&mut self) -> VerseRequest {
        self.next_id += 1;
        let request = VerseRequest {
            id: self.next_id,
            chapter: self.selection.chapter,
            verse: self.selection.verse,
            language: self.selection.language.clone(),
        };
        info!(
            id = request.id,
            chapter = request.chapter,
            verse = request.verse,
            language = %request.language,
            "requesting explanation"
        );
        self.status = RequestStatus::Loading;
        self.displayed = Some(request.clone());
        request
    }

    /// Record the outcome of request `id`.
    ///
    /// Outcomes of superseded requests are dropped; returns whether the
    /// status changed.
    pub fn resolve(&mut self, id: u64, outcome: Result<Explanation, ExplainError>) -> bool {
        if id != self.next_id || !self.is_loading() {
            debug!(id, latest = self.next_id, "dropping stale explanation outcome");
            return false;
        }

        self.status = match outcome {
            Ok(explanation) => RequestStatus::Success(explanation),
            Err(e) => {
                debug!(id, kind = e.kind(), "explanation request ended in error");
                RequestStatus::Error(FETCH_ERROR_MESSAGE.to_string())
            }
        };
        true
    }
}
