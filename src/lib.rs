pub mod api;
pub mod config;
pub mod directory;
pub mod domain;
pub mod observability;
pub mod projection;
pub mod storage;

pub use config::Config;
pub use domain::{FilterMode, ReferenceId, Trace};
pub use projection::{collect_references, filter_trace, TranscriptProjector, ViewerScope};
