/// Request context, authorization and notification collaborators
pub mod context;
/// Field schemas of the stashable entities
pub mod domains;
/// Schema-driven domain values parsed from request payloads
pub mod parser_domain;
/// Calendar, center and report lookups shared by every operation
pub mod reporting;
/// Promise/actual scoreboard for a single week
pub mod scoreboard;
/// Scoreboard edit windows per quarter
pub mod scoreboard_lock;
/// Scoreboards for several weeks
pub mod scoreboard_multi_week;
/// Per-week draft storage
pub mod stash;
/// The submission lifecycle: merge, commit and coordinator
pub mod submission;
/// Grouped validation of a merged submission
pub mod validation;
