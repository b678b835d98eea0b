//! Audience segmentation — the rule evaluator shared by the customer list
//! filter, segment previews and segment creation.

pub mod builder;
pub mod computed;
pub mod engine;
pub mod rules;
pub mod segment;
pub mod session;
pub mod summary;
pub mod validation;

pub use builder::{SegmentBuilder, SegmentError};
pub use engine::{evaluate, filter, RuleEvaluator};
pub use rules::{Logic, Operator, Rule, RuleDraft, RuleField, RuleSet, RuleSetDraft};
pub use segment::{NewSegment, Segment};
pub use session::AudienceView;
pub use summary::{ActiveFilter, FilterPanel, FilterResult};
pub use validation::{validate, ValidationError, ValidationResult};
