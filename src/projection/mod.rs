//! Viewer-scoped projection of rule-engine transcripts.
//!
//! [`filter_trace`] narrows a transcript to what one viewer should see,
//! [`collect_references`] mines it for identities to resolve, and
//! [`TranscriptProjector`] composes both around a loader and a resolver.

pub mod filter;
pub mod projector;
pub mod references;

pub use filter::{compute_keep_set, filter_trace, KeepSet, ViewerScope};
pub use projector::{Handles, Projection, ProjectionError, TranscriptProjector};
pub use references::{collect_references, ReferenceCollector};
