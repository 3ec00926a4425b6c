// Practice engine and its collaborators. The terminal front end (App, ui)
// lives in the binary; everything here runs headless.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod feedback;
pub mod inactivity;
pub mod keyboard;
pub mod line;
pub mod logging;
pub mod matcher;
pub mod rehearsal;
pub mod runtime;
pub mod scheduler;
pub mod script;
pub mod session;
pub mod speech;
pub mod stats;
pub mod transcript;
pub mod util;

pub use rehearsal::Rehearsal;
