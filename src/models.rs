use serde::{Deserialize, Serialize};

/// A persisted student record. `id` and `created_at` never change once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub age: String,
    pub hobby: String,
    pub created_at: u64,
    pub updated_at: Option<u64>,
}

/// Caller-editable fields, used both to create and to fully replace a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentPayload {
    pub name: String,
    pub email: String,
    pub age: String,
    pub hobby: String,
}

/// On-disk image of a directory: the id counter plus every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub next_id: u64,
    pub students: Vec<Student>,
}
