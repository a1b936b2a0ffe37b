pub mod filter;
pub mod reference;
pub mod subject;
pub mod transcript;

pub use filter::FilterMode;
pub use reference::{ReferenceId, Target, TestValue};
pub use subject::Subject;
pub use transcript::{ActionResult, ConditionResult, RuleId, RuleResult, Trace, TraceId};
