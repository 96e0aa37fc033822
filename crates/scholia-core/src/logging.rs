//! Structured logging schema and field name constants for scholia.
//!
//! These are the fields every pipeline entry point emits, so log aggregation
//! can query by the same names across subsystems. Component-local fields
//! (`component`, `step`, `term`, `error`) are written inline at the call site.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Operation completions (extraction, canonicalization) |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (similarity candidates, predicates) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "inference", "catalog", "pipeline", "similarity"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "extract", "embed_texts", "select_for", "canonicalize"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Paper UUID being processed.
pub const PAPER_ID: &str = "paper_id";

/// Rubric identifier.
pub const RUBRIC_ID: &str = "rubric_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned.
pub const RESULT_COUNT: &str = "result_count";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";
