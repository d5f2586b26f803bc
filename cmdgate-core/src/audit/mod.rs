pub mod decision_log;

pub use decision_log::{
    ACTION_CODE_VALIDATION, ACTION_COMMAND_VALIDATION, ACTION_CONFIRMATION_DENIED,
    ACTION_CONFIRMATION_GRANTED, ACTION_POLICY_RESOLUTION, AuditDecision, AuditEntry, AuditLogger,
    AuditSummary,
};
