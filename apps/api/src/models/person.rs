#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// A person that can carry assessments: either a candidate in the hiring
/// pipeline or an internal employee. Replaces a weakly-typed
/// (person_type, person_id) pair with a tagged variant, so the tag→table
/// mapping lives in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum PersonRef {
    Candidate(i64),
    Employee(i64),
}

impl PersonRef {
    pub fn id(&self) -> i64 {
        match self {
            PersonRef::Candidate(id) | PersonRef::Employee(id) => *id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            PersonRef::Candidate(_) => "candidate",
            PersonRef::Employee(_) => "employee",
        }
    }

    /// Dispatch table: which table holds this person.
    pub fn table_name(&self) -> &'static str {
        match self {
            PersonRef::Candidate(_) => "candidates",
            PersonRef::Employee(_) => "employees",
        }
    }

    /// UI stream key for evaluation updates targeting this person.
    pub fn stream_key(&self) -> String {
        format!("{}_{}_evaluations", self.kind(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_dispatch() {
        assert_eq!(PersonRef::Candidate(1).table_name(), "candidates");
        assert_eq!(PersonRef::Employee(1).table_name(), "employees");
    }

    #[test]
    fn stream_key_encodes_kind_and_id() {
        assert_eq!(
            PersonRef::Candidate(42).stream_key(),
            "candidate_42_evaluations"
        );
        assert_eq!(
            PersonRef::Employee(7).stream_key(),
            "employee_7_evaluations"
        );
    }

    #[test]
    fn serializes_as_tagged_variant() {
        let json = serde_json::to_value(PersonRef::Candidate(42)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "candidate", "id": 42}));
    }
}
