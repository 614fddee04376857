pub mod config;
pub mod document;
pub mod git;
pub mod ignore;
pub mod logger;
pub mod structure;
pub mod transport;
pub mod updater;

pub use config::{Config, RunConfig};
pub use document::{assemble, LINE_CEILING, PREVIEW_LINES};
pub use ignore::IgnoreSet;
pub use logger::Logger;
pub use transport::{classify_status, unique_filename, Disposition, QueryTransport};
pub use updater::{apply, ApiResponse, FileUpdateSpec};
