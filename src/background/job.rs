//! Units of work executed by the task queue.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Work that can be submitted to a [`TaskQueue`](super::TaskQueue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
    /// Integer addition.
    Add { x: i64, y: i64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("integer overflow computing {x} + {y}")]
    Overflow { x: i64, y: i64 },
}

impl Job {
    pub fn add(x: i64, y: i64) -> Self {
        Job::Add { x, y }
    }

    /// Short name used in logs and task handles.
    pub fn name(&self) -> &'static str {
        match self {
            Job::Add { .. } => "add",
        }
    }

    pub fn run(&self) -> Result<i64, JobError> {
        match *self {
            Job::Add { x, y } => x.checked_add(y).ok_or(JobError::Overflow { x, y }),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Add { x, y } => write!(f, "add({x}, {y})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_runs() {
        assert_eq!(Job::add(2, 3).run(), Ok(5));
        assert_eq!(Job::add(-7, 3).run(), Ok(-4));
    }

    #[test]
    fn add_overflow_fails() {
        assert_eq!(
            Job::add(i64::MAX, 1).run(),
            Err(JobError::Overflow { x: i64::MAX, y: 1 })
        );
    }

    #[test]
    fn serializes_with_tag() {
        let json = serde_json::to_value(Job::add(2, 3)).unwrap();
        assert_eq!(json, serde_json::json!({ "job": "add", "x": 2, "y": 3 }));
        assert_eq!(Job::add(2, 3).to_string(), "add(2, 3)");
    }
}
