use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::models::{Snapshot, Student, StudentPayload};

/// Source of record timestamps, in nanoseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        Utc::now()
            .timestamp_nanos_opt()
            .and_then(|nanos| u64::try_from(nanos).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("{msg}")]
    NotFound { msg: String },
}

impl DirectoryError {
    pub fn not_found(id: u64) -> Self {
        Self::NotFound {
            msg: format!("Student with id={} not found", id),
        }
    }
}

/// In-memory set of students keyed by id.
///
/// Ids come from a counter that only moves forward, so an id is never handed
/// out twice, even after the student holding it was deleted.
#[derive(Clone)]
pub struct StudentDirectory {
    students: BTreeMap<u64, Student>,
    next_id: u64,
    clock: Arc<dyn Clock>,
}

impl Default for StudentDirectory {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl StudentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            students: BTreeMap::new(),
            next_id: 0,
            clock,
        }
    }

    /// Rebuilds a directory from a snapshot. The counter is raised past the
    /// highest stored id if the snapshot claims otherwise.
    pub fn from_snapshot(snapshot: Snapshot, clock: Arc<dyn Clock>) -> Self {
        let mut directory = Self::with_clock(clock);
        for student in snapshot.students {
            let id = student.id;
            if directory.students.insert(id, student).is_some() {
                log::warn!("Snapshot holds student id={} more than once, keeping the last copy", id);
            }
        }

        let floor = directory
            .students
            .keys()
            .next_back()
            .map(|id| id.saturating_add(1))
            .unwrap_or(0);
        if floor > snapshot.next_id {
            log::warn!(
                "Snapshot id counter {} is behind stored ids, raising it to {}",
                snapshot.next_id,
                floor
            );
        }
        directory.next_id = snapshot.next_id.max(floor);
        directory
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            next_id: self.next_id,
            students: self.students.values().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Returns `None` only once the id space is used up.
    pub fn add_student(&mut self, payload: StudentPayload) -> Option<Student> {
        let id = self.next_id;
        self.next_id = id.checked_add(1)?;

        let student = Student {
            id,
            name: payload.name,
            email: payload.email,
            age: payload.age,
            hobby: payload.hobby,
            created_at: self.clock.now(),
            updated_at: None,
        };
        self.students.insert(id, student.clone());
        Some(student)
    }

    pub fn get_student(&self, id: u64) -> Result<Student, DirectoryError> {
        self.students
            .get(&id)
            .cloned()
            .ok_or_else(|| DirectoryError::not_found(id))
    }

    pub fn update_student(
        &mut self,
        id: u64,
        payload: StudentPayload,
    ) -> Result<Student, DirectoryError> {
        let now = self.clock.now();
        let student = self
            .students
            .get_mut(&id)
            .ok_or_else(|| DirectoryError::not_found(id))?;

        student.name = payload.name;
        student.email = payload.email;
        student.age = payload.age;
        student.hobby = payload.hobby;
        // wall clocks can step backwards
        student.updated_at = Some(now.max(student.created_at));
        Ok(student.clone())
    }

    pub fn delete_student(&mut self, id: u64) -> Result<Student, DirectoryError> {
        self.students
            .remove(&id)
            .ok_or_else(|| DirectoryError::not_found(id))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{ann, payload, ManualClock};
    use super::*;

    fn directory_at(nanos: u64) -> (StudentDirectory, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at(nanos));
        (StudentDirectory::with_clock(clock.clone()), clock)
    }

    #[test]
    fn added_student_reads_back_with_payload_fields() {
        let (mut directory, _) = directory_at(1_000);
        let created = directory
            .add_student(payload("Bob", "b@y.org", "19", "rowing"))
            .unwrap();

        let fetched = directory.get_student(created.id).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Bob");
        assert_eq!(fetched.email, "b@y.org");
        assert_eq!(fetched.age, "19");
        assert_eq!(fetched.hobby, "rowing");
        assert_eq!(fetched.created_at, 1_000);
        assert_eq!(fetched.updated_at, None);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn payload_fields_are_not_validated() {
        let (mut directory, _) = directory_at(0);
        let created = directory.add_student(payload("", "", "", "")).unwrap();
        assert_eq!(directory.get_student(created.id).unwrap().name, "");
    }

    #[test]
    fn unknown_ids_are_not_found_everywhere() {
        let (mut directory, _) = directory_at(0);
        directory.add_student(ann("20")).unwrap();

        for id in [1, 42, u64::MAX] {
            assert_eq!(directory.get_student(id), Err(DirectoryError::not_found(id)));
            assert_eq!(
                directory.update_student(id, ann("21")),
                Err(DirectoryError::not_found(id))
            );
            assert_eq!(directory.delete_student(id), Err(DirectoryError::not_found(id)));
        }
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn not_found_message_names_the_id() {
        let (directory, _) = directory_at(0);
        let err = directory.get_student(7).unwrap_err();
        assert!(err.to_string().contains("id=7"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn update_replaces_fields_and_keeps_identity() {
        let (mut directory, clock) = directory_at(100);
        let created = directory.add_student(ann("20")).unwrap();

        clock.set(250);
        let updated = directory
            .update_student(created.id, payload("Annie", "annie@x.com", "21", "go"))
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, 100);
        assert_eq!(updated.updated_at, Some(250));
        assert_eq!(updated.name, "Annie");
        assert_eq!(updated.hobby, "go");
        assert_eq!(directory.get_student(created.id).unwrap(), updated);
    }

    #[test]
    fn every_update_refreshes_updated_at() {
        let (mut directory, clock) = directory_at(10);
        let id = directory.add_student(ann("20")).unwrap().id;

        clock.set(20);
        directory.update_student(id, ann("21")).unwrap();
        clock.set(30);
        let second = directory.update_student(id, ann("22")).unwrap();
        assert_eq!(second.updated_at, Some(30));
        assert_eq!(second.age, "22");
    }

    #[test]
    fn updated_at_never_precedes_created_at() {
        let (mut directory, clock) = directory_at(5_000);
        let id = directory.add_student(ann("20")).unwrap().id;

        clock.set(1_000);
        let updated = directory.update_student(id, ann("21")).unwrap();
        assert_eq!(updated.updated_at, Some(5_000));
    }

    #[test]
    fn delete_returns_last_state_once() {
        let (mut directory, clock) = directory_at(1);
        let id = directory.add_student(ann("20")).unwrap().id;
        clock.set(2);
        let updated = directory.update_student(id, ann("21")).unwrap();

        assert_eq!(directory.delete_student(id), Ok(updated));
        assert_eq!(directory.delete_student(id), Err(DirectoryError::not_found(id)));
        assert_eq!(directory.get_student(id), Err(DirectoryError::not_found(id)));
        assert!(directory.is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (mut directory, _) = directory_at(0);
        let first = directory.add_student(ann("20")).unwrap().id;
        let second = directory.add_student(ann("20")).unwrap().id;
        directory.delete_student(second).unwrap();

        let third = directory.add_student(ann("20")).unwrap().id;
        assert_eq!((first, second, third), (0, 1, 2));
    }

    #[test]
    fn exhausted_id_space_yields_none() {
        let clock = Arc::new(ManualClock::default());
        let mut directory = StudentDirectory::from_snapshot(
            Snapshot {
                next_id: u64::MAX - 1,
                students: Vec::new(),
            },
            clock,
        );

        assert_eq!(directory.add_student(ann("20")).unwrap().id, u64::MAX - 1);
        assert_eq!(directory.add_student(ann("20")), None);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn snapshot_counter_is_raised_past_stored_ids() {
        let (mut source, _) = directory_at(0);
        for _ in 0..3 {
            source.add_student(ann("20")).unwrap();
        }
        let mut snapshot = source.snapshot();
        snapshot.next_id = 1;

        let mut restored = StudentDirectory::from_snapshot(snapshot, Arc::new(ManualClock::default()));
        assert_eq!(restored.len(), 3);
        assert_eq!(restored.add_student(ann("20")).unwrap().id, 3);
    }

    #[test]
    fn ann_lifecycle() {
        let (mut directory, clock) = directory_at(1_000);
        let created = directory.add_student(ann("20")).unwrap();
        assert_eq!(created.created_at, 1_000);
        assert_eq!(created.updated_at, None);

        clock.set(2_000);
        let updated = directory.update_student(created.id, ann("21")).unwrap();
        assert_eq!(updated.age, "21");
        assert!(updated.updated_at.unwrap() >= created.created_at);

        let deleted = directory.delete_student(created.id).unwrap();
        assert_eq!(deleted, updated);
        assert!(matches!(
            directory.get_student(created.id),
            Err(DirectoryError::NotFound { .. })
        ));
    }
}
