use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::session::{Session, SessionSettings, Tick};
use crate::store::{DocumentId, DocumentStore, LibraryState, StoreError, StoredDocument};
use crate::tokenize::truncate_to_limit;

/// Text a session reported as changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub id: DocumentId,
    pub text: String,
}

/// One open document: its persisted fields plus the live session reading it
#[derive(Debug)]
pub struct Document<C: Clock = SystemClock> {
    pub id: DocumentId,
    pub display_name: String,
    // Host's canonical copy, last acknowledged from the session
    saved_text: String,
    session: Session<C>,
}

impl<C: Clock> Document<C> {
    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn saved_text(&self) -> &str {
        &self.saved_text
    }
}

/// Host for a set of documents, one of them in the foreground.
///
/// Only the active document is ever allowed to play; switching away suspends
/// it. Text edits go through [`Library::set_text`] which enforces the word
/// ceiling; sessions report accepted changes back over a channel and
/// [`Library::sync`] folds them into the persisted state.
pub struct Library<S: DocumentStore, C: Clock + Clone = SystemClock> {
    store: S,
    settings: SessionSettings,
    max_words: usize,
    clock: C,
    documents: Vec<Document<C>>,
    active: usize,
    changes_tx: Sender<TextChange>,
    changes_rx: Receiver<TextChange>,
    dirty: bool,
}

impl<S: DocumentStore> Library<S, SystemClock> {
    pub fn open(store: S, config: &Config) -> Result<Self, StoreError> {
        Self::open_with_clock(store, config, SystemClock)
    }
}

impl<S: DocumentStore, C: Clock + Clone> Library<S, C> {
    /// Loads the stored documents, or starts with a single empty one.
    pub fn open_with_clock(store: S, config: &Config, clock: C) -> Result<Self, StoreError> {
        let state = store.load()?;
        let (changes_tx, changes_rx) = mpsc::channel();
        let mut library = Self {
            store,
            settings: SessionSettings::from(config),
            max_words: config.max_words,
            clock,
            documents: Vec::new(),
            active: 0,
            changes_tx,
            changes_rx,
            dirty: false,
        };

        for doc in state.documents {
            library.push_document(doc.id, doc.display_name, doc.raw_text);
        }
        if library.documents.is_empty() {
            library.push_document(DocumentId::new("1"), "Article 1".to_string(), String::new());
            library.dirty = true;
        }

        let active = state
            .active
            .and_then(|id| library.position(&id))
            .unwrap_or(0);
        library.active = active;
        info!(
            documents = library.documents.len(),
            active = %library.documents[active].id,
            "library opened"
        );
        Ok(library)
    }

    /// Opens a new empty document named `Article {n}` and makes it active.
    pub fn add_document(&mut self) -> DocumentId {
        let name = format!("Article {}", self.documents.len() + 1);
        self.add_document_with(name, "")
    }

    /// Opens a new document with the given name and text and makes it active.
    pub fn add_document_with(&mut self, name: impl Into<String>, text: &str) -> DocumentId {
        let id = self.fresh_id();
        let name = name.into();
        self.push_document(id.clone(), name, String::new());
        self.dirty = true;
        debug!(id = %id, "document added");

        let index = self.documents.len() - 1;
        self.activate_index(index);
        if !text.is_empty() {
            self.set_text(&id, text);
        }
        id
    }

    /// Closes a document. The last remaining document cannot be closed.
    pub fn close_document(&mut self, id: &DocumentId) -> bool {
        if self.documents.len() <= 1 {
            return false;
        }
        let Some(index) = self.position(id) else {
            return false;
        };

        let was_active = index == self.active;
        self.documents.remove(index);
        if was_active {
            self.active = 0;
        } else if index < self.active {
            self.active -= 1;
        }
        self.dirty = true;
        debug!(id = %id, "document closed");
        true
    }

    /// Brings a document to the foreground, suspending every other one.
    pub fn activate(&mut self, id: &DocumentId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.activate_index(index);
                true
            }
            None => false,
        }
    }

    pub fn activate_next(&mut self) {
        let next = (self.active + 1) % self.documents.len();
        self.activate_index(next);
    }

    pub fn activate_previous(&mut self) {
        let len = self.documents.len();
        let previous = (self.active + len - 1) % len;
        self.activate_index(previous);
    }

    pub fn rename_document(&mut self, id: &DocumentId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        match self.position(id) {
            Some(index) => {
                self.documents[index].display_name = name.to_string();
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Hands new text to a document's session, cut down to the word ceiling.
    pub fn set_text(&mut self, id: &DocumentId, raw: &str) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let truncated = truncate_to_limit(raw, self.max_words);
        if truncated.was_truncated() {
            warn!(
                id = %id,
                kept = truncated.kept_words,
                dropped = truncated.dropped_words,
                "text truncated to word limit"
            );
        }
        self.documents[index].session.set_text(truncated.text);
        true
    }

    pub fn set_active_text(&mut self, raw: &str) {
        let id = self.active_id().clone();
        self.set_text(&id, raw);
    }

    /// Fires any due ticks. Returns the tick of the active document.
    pub fn poll(&mut self) -> Tick {
        let mut active_tick = Tick::Idle;
        for (index, doc) in self.documents.iter_mut().enumerate() {
            let tick = doc.session.poll();
            if index == self.active {
                active_tick = tick;
            }
        }
        active_tick
    }

    /// Earliest pending tick across all documents
    pub fn next_deadline(&self) -> Option<Instant> {
        self.documents
            .iter()
            .filter_map(|d| d.session.next_deadline())
            .min()
    }

    /// Applies text changes reported by sessions to the host's copy.
    ///
    /// Returns how many documents actually changed.
    pub fn sync(&mut self) -> usize {
        let mut changed = 0;
        while let Ok(change) = self.changes_rx.try_recv() {
            let Some(index) = self.position(&change.id) else {
                continue;
            };
            let doc = &mut self.documents[index];
            if doc.saved_text == change.text {
                continue;
            }
            doc.saved_text = change.text;
            changed += 1;
        }
        if changed > 0 {
            self.dirty = true;
        }
        changed
    }

    /// Syncs, then writes the library to the store if anything changed.
    pub fn save(&mut self) -> Result<bool, StoreError> {
        self.sync();
        if !self.dirty {
            return Ok(false);
        }
        self.store.save(&self.state())?;
        self.dirty = false;
        debug!(documents = self.documents.len(), "library saved");
        Ok(true)
    }

    /// Persisted view of the library, from the host's acknowledged copies
    pub fn state(&self) -> LibraryState {
        LibraryState {
            documents: self
                .documents
                .iter()
                .map(|d| StoredDocument {
                    id: d.id.clone(),
                    display_name: d.display_name.clone(),
                    raw_text: d.saved_text.clone(),
                })
                .collect(),
            active: Some(self.active_id().clone()),
        }
    }

    pub fn documents(&self) -> &[Document<C>] {
        &self.documents
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_id(&self) -> &DocumentId {
        &self.documents[self.active].id
    }

    pub fn active_document(&self) -> &Document<C> {
        &self.documents[self.active]
    }

    pub fn active_session(&self) -> &Session<C> {
        &self.documents[self.active].session
    }

    pub fn active_session_mut(&mut self) -> &mut Session<C> {
        &mut self.documents[self.active].session
    }

    pub fn session(&self, id: &DocumentId) -> Option<&Session<C>> {
        self.position(id).map(|i| &self.documents[i].session)
    }

    pub fn session_mut(&mut self, id: &DocumentId) -> Option<&mut Session<C>> {
        self.position(id).map(move |i| &mut self.documents[i].session)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    fn activate_index(&mut self, index: usize) {
        for (i, doc) in self.documents.iter_mut().enumerate() {
            if i != index {
                doc.session.suspend();
            }
        }
        if self.active != index {
            self.dirty = true;
        }
        self.active = index;
    }

    fn push_document(&mut self, id: DocumentId, display_name: String, raw_text: String) {
        let truncated = truncate_to_limit(&raw_text, self.max_words);
        if truncated.was_truncated() {
            warn!(
                id = %id,
                kept = truncated.kept_words,
                dropped = truncated.dropped_words,
                "stored text truncated to word limit"
            );
            // the store still holds the longer text
            self.dirty = true;
        }
        let text = truncated.text;
        let mut session = Session::with_clock(text.clone(), self.settings, self.clock.clone());

        let tx = self.changes_tx.clone();
        let listener_id = id.clone();
        session.on_text_change(move |text| {
            let _ = tx.send(TextChange {
                id: listener_id.clone(),
                text: text.to_owned(),
            });
        });

        self.documents.push(Document {
            id,
            display_name,
            saved_text: text,
            session,
        });
    }

    fn position(&self, id: &DocumentId) -> Option<usize> {
        self.documents.iter().position(|d| &d.id == id)
    }

    fn fresh_id(&self) -> DocumentId {
        let mut millis = chrono::Utc::now().timestamp_millis();
        loop {
            let id = DocumentId::new(millis.to_string());
            if self.position(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryDocumentStore;
    use std::time::Duration;

    fn library_with(
        state: LibraryState,
    ) -> (Library<MemoryDocumentStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let library = Library::open_with_clock(
            MemoryDocumentStore::with_state(state),
            &Config::default(),
            clock.clone(),
        )
        .unwrap();
        (library, clock)
    }

    fn two_documents() -> LibraryState {
        LibraryState {
            documents: vec![
                StoredDocument {
                    id: "1".into(),
                    display_name: "Article 1".into(),
                    raw_text: "first document text".into(),
                },
                StoredDocument {
                    id: "2".into(),
                    display_name: "Article 2".into(),
                    raw_text: "second one".into(),
                },
            ],
            active: Some("2".into()),
        }
    }

    #[test]
    fn test_empty_store_opens_one_blank_document() {
        let (library, _) = library_with(LibraryState::default());
        assert_eq!(library.documents().len(), 1);
        assert_eq!(library.active_id().as_str(), "1");
        assert_eq!(library.active_document().display_name, "Article 1");
        assert!(library.active_session().words().is_empty());
        assert!(library.is_dirty());
    }

    #[test]
    fn test_open_restores_documents_and_active() {
        let (library, _) = library_with(two_documents());
        assert_eq!(library.documents().len(), 2);
        assert_eq!(library.active_id().as_str(), "2");
        assert_eq!(library.active_session().words(), ["second", "one"]);
        assert!(!library.is_dirty());
    }

    #[test]
    fn test_unknown_active_id_falls_back_to_first() {
        let mut state = two_documents();
        state.active = Some("gone".into());
        let (library, _) = library_with(state);
        assert_eq!(library.active_index(), 0);
    }

    #[test]
    fn test_switching_documents_suspends_the_previous_one() {
        let (mut library, clock) = library_with(two_documents());
        library.active_session_mut().toggle_play();
        clock.advance(Duration::from_millis(200));
        assert_eq!(library.poll(), Tick::Advanced(1));

        library.activate(&"1".into());
        let background = library.session(&"2".into()).unwrap();
        assert!(!background.is_playing());
        assert_eq!(background.current_index(), 1);
        assert!(library.next_deadline().is_none());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let (mut library, _) = library_with(two_documents());
        library.session_mut(&"1".into()).unwrap().seek(2);
        library.session_mut(&"2".into()).unwrap().set_speed(900);

        let first = library.session(&"1".into()).unwrap();
        let second = library.session(&"2".into()).unwrap();
        assert_eq!(first.current_index(), 2);
        assert_eq!(second.current_index(), 0);
        assert_eq!(first.wpm(), 300);
        assert_eq!(second.wpm(), 900);
    }

    #[test]
    fn test_text_changes_sync_back_to_the_host() {
        let (mut library, _) = library_with(two_documents());
        library.set_text(&"1".into(), "brand new words");
        assert_eq!(library.sync(), 1);

        let state = library.state();
        assert_eq!(state.get(&"1".into()).unwrap().raw_text, "brand new words");
        assert_eq!(state.get(&"2".into()).unwrap().raw_text, "second one");
    }

    #[test]
    fn test_echoed_text_does_not_mark_dirty() {
        let (mut library, _) = library_with(two_documents());
        library.set_text(&"2".into(), "second one");
        assert_eq!(library.sync(), 0);
        assert!(!library.is_dirty());
    }

    #[test]
    fn test_save_only_writes_when_changed() {
        let (mut library, _) = library_with(two_documents());
        assert!(!library.save().unwrap());

        library.set_active_text("edited");
        assert!(library.save().unwrap());
        assert!(!library.save().unwrap());
    }

    #[test]
    fn test_word_ceiling_truncates_text() {
        let clock = ManualClock::new();
        let config = Config {
            max_words: 3,
            ..Config::default()
        };
        let mut library =
            Library::open_with_clock(MemoryDocumentStore::new(), &config, clock).unwrap();

        library.set_active_text("one  two\nthree four five");
        assert_eq!(library.active_session().words(), ["one", "two", "three"]);
        assert_eq!(library.active_session().raw_text(), "one two three");
        library.sync();
        assert_eq!(library.active_document().saved_text(), "one two three");
    }

    #[test]
    fn test_stored_text_over_ceiling_is_truncated_on_open() {
        let clock = ManualClock::new();
        let config = Config {
            max_words: 2,
            ..Config::default()
        };
        let store = MemoryDocumentStore::with_state(two_documents());
        let mut library = Library::open_with_clock(store, &config, clock).unwrap();
        assert_eq!(
            library.session(&"1".into()).unwrap().words(),
            ["first", "document"]
        );
        assert!(library.is_dirty());

        assert!(library.save().unwrap());
        let stored = library.store().snapshot();
        assert_eq!(stored.get(&"1".into()).unwrap().raw_text, "first document");
        assert_eq!(stored.get(&"2".into()).unwrap().raw_text, "second one");
        assert!(!library.save().unwrap());
    }

    #[test]
    fn test_add_document_activates_it() {
        let (mut library, _) = library_with(two_documents());
        library.active_session_mut().toggle_play();

        let id = library.add_document();
        assert_eq!(library.active_id(), &id);
        assert_eq!(library.active_document().display_name, "Article 3");
        assert!(!library.session(&"2".into()).unwrap().is_playing());
    }

    #[test]
    fn test_add_document_with_text() {
        let (mut library, _) = library_with(LibraryState::default());
        let id = library.add_document_with("notes", "read this now");
        assert_eq!(
            library.session(&id).unwrap().words(),
            ["read", "this", "now"]
        );
        library.sync();
        assert_eq!(library.state().get(&id).unwrap().raw_text, "read this now");
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let (mut library, _) = library_with(LibraryState::default());
        let a = library.add_document();
        let b = library.add_document();
        assert_ne!(a, b);
    }

    #[test]
    fn test_cannot_close_last_document() {
        let (mut library, _) = library_with(LibraryState::default());
        let id = library.active_id().clone();
        assert!(!library.close_document(&id));
        assert_eq!(library.documents().len(), 1);
    }

    #[test]
    fn test_closing_active_document_activates_first() {
        let (mut library, _) = library_with(two_documents());
        assert!(library.close_document(&"2".into()));
        assert_eq!(library.active_id().as_str(), "1");
        assert!(library.session(&"2".into()).is_none());
    }

    #[test]
    fn test_closing_earlier_document_keeps_active() {
        let (mut library, _) = library_with(two_documents());
        library.add_document();
        let active = library.active_id().clone();
        assert!(library.close_document(&"1".into()));
        assert_eq!(library.active_id(), &active);
    }

    #[test]
    fn test_next_and_previous_wrap_around() {
        let (mut library, _) = library_with(two_documents());
        library.activate_next();
        assert_eq!(library.active_id().as_str(), "1");
        library.activate_previous();
        assert_eq!(library.active_id().as_str(), "2");
    }

    #[test]
    fn test_rename_document() {
        let (mut library, _) = library_with(two_documents());
        assert!(library.rename_document(&"1".into(), "  Essay "));
        assert!(!library.rename_document(&"1".into(), "   "));
        assert!(!library.rename_document(&"nope".into(), "x"));
        assert_eq!(library.documents()[0].display_name, "Essay");
    }
}
