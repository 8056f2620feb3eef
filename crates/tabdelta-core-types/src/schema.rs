//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical across the core, store and
//! engine layers so captured events can be asserted on reliably.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_TABLE: &str = "table";
pub const FIELD_DESCRIPTOR_ID: &str = "descriptor_id";
pub const FIELD_COLUMN: &str = "column";

// Collection sizes
pub const FIELD_ROW_COUNT: &str = "row_count";
pub const FIELD_INSERTED: &str = "inserted";
pub const FIELD_REUSED: &str = "reused";
pub const FIELD_BACKFILLED: &str = "backfilled";
pub const FIELD_NEW_COLUMNS: &str = "new_columns";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_accessibility() {
        assert!(!FIELD_COMPONENT.is_empty());
        assert!(!FIELD_OP.is_empty());
        assert!(!FIELD_TABLE.is_empty());
        assert!(!EVENT_START.is_empty());
        assert!(!EVENT_END.is_empty());
        assert!(!EVENT_END_ERROR.is_empty());
    }

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }

    #[test]
    fn test_delta_counters_are_distinct() {
        let counters = [FIELD_INSERTED, FIELD_REUSED, FIELD_BACKFILLED];
        for (i, a) in counters.iter().enumerate() {
            for b in counters.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
