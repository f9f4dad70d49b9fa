//! Exit codes for the CLI

use ci_decision_core::DecisionError;

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Invalid task descriptor
pub const TASK_ERROR: i32 = 3;

/// Backend refused or failed to register a task
pub const BACKEND_ERROR: i32 = 4;

/// Map an error to the exit code for its category
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<DecisionError>() {
        Some(DecisionError::Config(_)) => CONFIG_ERROR,
        Some(DecisionError::Task(_)) => TASK_ERROR,
        Some(DecisionError::Backend(_)) => BACKEND_ERROR,
        _ => ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ci_decision_core::{BackendError, TaskError};

    #[test]
    fn test_exit_code_per_category() {
        let err = anyhow::Error::from(DecisionError::from(TaskError::EmptyName));
        assert_eq!(for_error(&err), TASK_ERROR);

        let err = anyhow::Error::from(DecisionError::from(BackendError::Rejected {
            backend: "recording".to_string(),
            task: "tidy".to_string(),
            reason: "offline".to_string(),
        }));
        assert_eq!(for_error(&err), BACKEND_ERROR);

        assert_eq!(for_error(&anyhow::anyhow!("boom")), ERROR);
    }

    #[test]
    fn test_exit_code_through_context() {
        let err = anyhow::Error::from(DecisionError::from(TaskError::EmptyName))
            .context("loading decision tasks");
        assert_eq!(for_error(&err), TASK_ERROR);
    }
}
