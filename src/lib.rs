// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod library;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod store;
pub mod timer;
pub mod tokenize;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, PlaybackLimits, Profile};
pub use library::Library;
pub use session::{PlayState, Session, SessionSettings, Snapshot, Tick};
