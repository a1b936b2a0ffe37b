use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::reference::{ReferenceId, Target, TestValue};
use super::subject::Subject;

/// Action kind recorded when a matched rule deliberately does nothing.
pub const ACTION_NOTHING: &str = "nothing";

/// Unique transcript identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn new(id: impl Into<String>) -> Self {
        TraceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rule identifier, used as the key linking rules, conditions and actions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        RuleId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        RuleId::new(id)
    }
}

/// Outcome of evaluating one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_id: RuleId,

    #[serde(default)]
    pub rule_name: String,

    /// Identity owning the rule; missing in some legacy transcripts
    #[serde(default)]
    pub owner_id: Option<ReferenceId>,

    /// Whether the rule as a whole passed
    #[serde(default)]
    pub matched: bool,

    /// Explanation of the outcome
    #[serde(default)]
    pub reason: String,
}

impl RuleResult {
    pub fn new(rule_id: impl Into<String>, owner_id: impl Into<String>, matched: bool) -> Self {
        RuleResult {
            rule_id: RuleId::new(rule_id),
            rule_name: String::new(),
            owner_id: Some(ReferenceId::new(owner_id)),
            matched,
            reason: String::new(),
        }
    }

    /// Returns true if `viewer` owns this rule.
    #[inline]
    pub fn is_owned_by(&self, viewer: &ReferenceId) -> bool {
        self.owner_id.as_ref() == Some(viewer)
    }
}

/// Outcome of one condition within a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionResult {
    pub rule_id: RuleId,

    #[serde(default)]
    pub field_name: String,

    /// Comparison operator (e.g., "contains", "is-any")
    #[serde(default, alias = "condition")]
    pub operator: String,

    #[serde(default)]
    pub test_value: TestValue,

    #[serde(default)]
    pub matched: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ConditionResult {
    pub fn new(rule_id: impl Into<String>, field_name: impl Into<String>, test_value: TestValue) -> Self {
        ConditionResult {
            rule_id: RuleId::new(rule_id),
            field_name: field_name.into(),
            operator: String::new(),
            test_value,
            matched: false,
            note: None,
        }
    }
}

/// Outcome of one action a matched rule attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Owning rule; effects may be recorded without one
    #[serde(default)]
    pub rule_id: Option<RuleId>,

    /// Action kind (e.g., "addcc", "email", "nothing")
    #[serde(default)]
    pub action: String,

    #[serde(default)]
    pub target: Target,

    #[serde(default)]
    pub applied: bool,

    #[serde(default)]
    pub applied_reason: String,

    /// Why the action was taken
    #[serde(default)]
    pub reason: String,
}

impl ActionResult {
    pub fn new(rule_id: Option<&str>, action: impl Into<String>, target: Target) -> Self {
        ActionResult {
            rule_id: rule_id.map(RuleId::new),
            action: action.into(),
            target,
            applied: true,
            applied_reason: String::new(),
            reason: String::new(),
        }
    }

    /// Returns true for the explicit do-nothing action.
    pub fn is_no_op(&self) -> bool {
        self.action == ACTION_NOTHING
    }
}

/// Complete record of one rule-evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub id: TraceId,

    /// The run was simulated and no action was really applied
    #[serde(default)]
    pub dry_run: bool,

    /// When the run happened, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,

    /// Absent once the object data has been discarded by retention
    #[serde(default)]
    pub subject_transcript: Option<Subject>,

    #[serde(default)]
    pub rule_transcripts: BTreeMap<RuleId, RuleResult>,

    /// Conditions per rule, in evaluation order
    #[serde(default)]
    pub condition_transcripts: BTreeMap<RuleId, Vec<ConditionResult>>,

    /// Actions in application order
    #[serde(default)]
    pub action_transcripts: Vec<ActionResult>,

    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Trace {
    /// Create an empty transcript.
    pub fn new(id: impl Into<String>) -> Self {
        Trace {
            id: TraceId::new(id),
            dry_run: false,
            time: None,
            subject_transcript: None,
            rule_transcripts: BTreeMap::new(),
            condition_transcripts: BTreeMap::new(),
            action_transcripts: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Returns true if the object details were discarded.
    pub fn details_discarded(&self) -> bool {
        self.subject_transcript.is_none()
    }

    /// Add a rule result, keyed by its rule id.
    pub fn push_rule(&mut self, rule: RuleResult) {
        self.rule_transcripts.insert(rule.rule_id.clone(), rule);
    }

    /// Append a condition result to its rule's ordered list.
    pub fn push_condition(&mut self, condition: ConditionResult) {
        self.condition_transcripts
            .entry(condition.rule_id.clone())
            .or_default()
            .push(condition);
    }

    pub fn push_action(&mut self, action: ActionResult) {
        self.action_transcripts.push(action);
    }

    /// Conditions evaluated for `rule_id`, in evaluation order.
    pub fn conditions_for_rule(&self, rule_id: &RuleId) -> &[ConditionResult] {
        self.condition_transcripts
            .get(rule_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Actions attributed to `rule_id`, in application order.
    pub fn actions_for_rule<'a>(&'a self, rule_id: &'a RuleId) -> impl Iterator<Item = &'a ActionResult> + 'a {
        self.action_transcripts
            .iter()
            .filter(move |action| action.rule_id.as_ref() == Some(rule_id))
    }

    /// Rule an action is attributed to, if it exists in this transcript.
    pub fn rule_for_action(&self, action: &ActionResult) -> Option<&RuleResult> {
        action
            .rule_id
            .as_ref()
            .and_then(|rule_id| self.rule_transcripts.get(rule_id))
    }
}
