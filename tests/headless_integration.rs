use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use glance::config::Config;
use glance::library::Library;
use glance::runtime::{FixedTicker, ReaderEvent, Runner, TestEventSource};
use glance::store::{DocumentStore, FileDocumentStore, MemoryDocumentStore};
use glance::Tick;

// Headless integration using the internal runtime + Library without a TTY.
// Verifies that playback advances on real time and stops on the last word.
#[test]
fn headless_playback_reads_to_the_end() {
    let config = Config {
        wpm: 1000, // 60ms per word
        ..Config::default()
    };
    let mut library = Library::open(MemoryDocumentStore::new(), &config).unwrap();
    library.set_active_text("The quick brown fox");

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(100)),
    );

    // Producer: press space to start playback
    tx.send(ReaderEvent::Key(KeyEvent::new(
        KeyCode::Char(' '),
        KeyModifiers::NONE,
    )))
    .unwrap();

    let started = Instant::now();
    let mut ticks = Vec::new();
    for _ in 0..200u32 {
        match runner.step(library.next_deadline()) {
            ReaderEvent::Key(key) if key.code == KeyCode::Char(' ') => {
                library.active_session_mut().toggle_play();
            }
            ReaderEvent::Tick => match library.poll() {
                Tick::Idle => {}
                tick => ticks.push(tick),
            },
            _ => {}
        }
        if matches!(ticks.last(), Some(Tick::Finished(_))) {
            break;
        }
    }

    assert_eq!(
        ticks,
        vec![
            Tick::Advanced(1),
            Tick::Advanced(2),
            Tick::Advanced(3),
            Tick::Finished(3)
        ]
    );
    let session = library.active_session();
    assert!(!session.is_playing());
    assert_eq!(session.current_word(), Some("fox"));
    // Four intervals of 60ms each
    assert!(started.elapsed() >= Duration::from_millis(240));
}

#[test]
fn headless_pause_stops_advancing() {
    let mut library = Library::open(MemoryDocumentStore::new(), &Config::default()).unwrap();
    library.set_active_text("one two three four five");

    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(10)),
    );

    library.active_session_mut().toggle_play();
    library.active_session_mut().toggle_play();
    assert!(library.next_deadline().is_none());

    for _ in 0..30u32 {
        if let ReaderEvent::Tick = runner.step(library.next_deadline()) {
            assert_eq!(library.poll(), Tick::Idle);
        }
    }
    assert_eq!(library.active_session().current_index(), 0);
}

#[test]
fn documents_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.json");
    let config = Config::default();

    let second_id = {
        let mut library = Library::open(FileDocumentStore::with_path(&path), &config).unwrap();
        library.set_active_text("first article body");
        let id = library.add_document_with("Essay", "second article");
        library.rename_document(&id, "Long essay");
        assert!(library.save().unwrap());
        id
    };

    let stored = FileDocumentStore::with_path(&path).load().unwrap();
    assert_eq!(stored.documents.len(), 2);
    assert_eq!(stored.active.as_ref(), Some(&second_id));

    let library = Library::open(FileDocumentStore::with_path(&path), &config).unwrap();
    assert_eq!(library.active_id(), &second_id);
    assert_eq!(library.active_document().display_name, "Long essay");
    assert_eq!(library.active_session().words(), ["second", "article"]);
    assert_eq!(library.documents()[0].session().raw_text(), "first article body");
}
