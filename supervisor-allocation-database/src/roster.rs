// The roster is created by an administrator import outside of this system. Here we only
// turn already exported entries into persons and provide a small demo roster.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::DatabaseError;
use crate::models::{InstructorProfile, Person, PersonId, PersonKind, Role};

/// One row of an exported roster file. Missing quotas fall back to the configured default.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub handle: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub research_area: Option<String>,
    #[serde(default)]
    pub select_quota: Option<u32>,
    #[serde(default)]
    pub confirm_quota: Option<u32>,
}

impl RosterEntry {
    #[must_use]
    pub fn into_person(self, default_quota: u32) -> Person {
        let kind = match self.role {
            Role::Student => PersonKind::Student,
            Role::Administrator => PersonKind::Administrator,
            Role::Instructor => {
                let confirm_quota = self.confirm_quota.unwrap_or(default_quota);
                PersonKind::Instructor(InstructorProfile {
                    title: self.title.unwrap_or_default(),
                    research_area: self.research_area.unwrap_or_default(),
                    select_quota: self.select_quota.unwrap_or(confirm_quota),
                    confirm_quota,
                })
            }
        };
        Person {
            id: PersonId::new(self.id),
            handle: self.handle,
            name: self.name,
            kind,
        }
    }
}

/// Builds persons from roster entries. Entries repeating an id or handle that was already
/// seen are skipped, the first one wins.
#[must_use]
pub fn build_roster(entries: Vec<RosterEntry>, default_quota: u32) -> Vec<Person> {
    let mut ids = HashSet::new();
    let mut handles = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            if ids.contains(&entry.id) || handles.contains(&entry.handle) {
                warn!(id = %entry.id, handle = %entry.handle, "skipping duplicate roster entry");
                return false;
            }
            ids.insert(entry.id.clone());
            handles.insert(entry.handle.clone());
            true
        })
        .map(|entry| entry.into_person(default_quota))
        .collect()
}

pub async fn load_roster(path: &Path, default_quota: u32) -> Result<Vec<Person>, DatabaseError> {
    let content = tokio::fs::read(path).await?;
    let entries: Vec<RosterEntry> = serde_json::from_slice(&content)?;
    Ok(build_roster(entries, default_quota))
}

fn instructor(id: &str, handle: &str, name: &str, title: &str, area: &str, quota: u32) -> Person {
    Person {
        id: PersonId::from(id),
        handle: handle.to_owned(),
        name: name.to_owned(),
        kind: PersonKind::Instructor(InstructorProfile {
            title: title.to_owned(),
            research_area: area.to_owned(),
            select_quota: quota,
            confirm_quota: quota,
        }),
    }
}

fn student(id: &str, handle: &str, name: &str) -> Person {
    Person {
        id: PersonId::from(id),
        handle: handle.to_owned(),
        name: name.to_owned(),
        kind: PersonKind::Student,
    }
}

/// Demo roster used when no roster file is configured.
#[must_use]
pub fn default_roster() -> Vec<Person> {
    vec![
        Person {
            id: PersonId::from("admin"),
            handle: "admin".to_owned(),
            name: "System Administrator".to_owned(),
            kind: PersonKind::Administrator,
        },
        instructor("t1", "T001", "Prof. Zhang", "Professor", "Artificial intelligence and deep learning", 5),
        instructor("t2", "T002", "Assoc. Prof. Li", "Associate Professor", "Cloud computing and distributed systems", 3),
        instructor("t3", "T003", "Dr. Wang", "Lecturer", "Frontend engineering", 4),
        instructor("t4", "T004", "Prof. Zhao", "Professor", "Network security and cryptography", 2),
        student("s1", "S2021001", "Chen"),
        student("s2", "S2021002", "Lin"),
        student("s3", "S2021003", "Huang"),
        student("s4", "S2021004", "Zhou"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, handle: &str, role: Role) -> RosterEntry {
        RosterEntry {
            id: id.to_owned(),
            handle: handle.to_owned(),
            name: id.to_uppercase(),
            role,
            title: None,
            research_area: None,
            select_quota: None,
            confirm_quota: None,
        }
    }

    #[test]
    fn missing_quotas_use_default() {
        let person = entry("t7", "T007", Role::Instructor).into_person(6);
        let profile = person.instructor_profile().unwrap();
        assert_eq!(profile.confirm_quota, 6);
        assert_eq!(profile.select_quota, 6);
    }

    #[test]
    fn duplicates_are_skipped() {
        let roster = build_roster(
            vec![
                entry("s1", "S1", Role::Student),
                entry("s2", "S1", Role::Student),
                entry("s1", "S3", Role::Student),
                entry("s4", "S4", Role::Student),
            ],
            5,
        );
        let ids: Vec<&str> = roster.iter().map(|person| person.id.as_str()).collect();
        assert_eq!(ids, ["s1", "s4"]);
    }

    #[tokio::test]
    async fn loads_roster_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        tokio::fs::write(
            &path,
            r#"[
                {"id":"admin","handle":"admin","name":"Admin","role":"administrator"},
                {"id":"t1","handle":"T001","name":"Prof. A","role":"instructor","confirm_quota":2},
                {"id":"s1","handle":"S001","name":"Student A","role":"student"}
            ]"#,
        )
        .await
        .unwrap();
        let roster = load_roster(&path, 5).await.unwrap();
        assert_eq!(roster.len(), 3);
        assert_eq!(roster[1].instructor_profile().unwrap().confirm_quota, 2);
    }
}
