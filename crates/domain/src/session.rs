use std::collections::BTreeMap;

use crate::{RecordDate, SessionRecord, Set};

/// Session records which belong to the same training session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionGroup {
    pub key: String,
    pub date: RecordDate,
    pub program_title: Option<String>,
    pub records: Vec<SessionRecord>,
}

fn session_key(record: &SessionRecord) -> String {
    match record.session_id {
        Some(id) => id.to_string(),
        None => format!(
            "{}-{}",
            record.date,
            record.program_title.as_deref().unwrap_or("session")
        ),
    }
}

/// Group records by session, most recent session first.
///
/// Records without a session ID are grouped by date and program title.
#[must_use]
pub fn group_sessions(records: &[SessionRecord]) -> Vec<SessionGroup> {
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    let mut groups: Vec<SessionGroup> = vec![];

    for record in records {
        let key = session_key(record);
        if let Some(&i) = index.get(&key) {
            groups[i].records.push(record.clone());
        } else {
            index.insert(key.clone(), groups.len());
            groups.push(SessionGroup {
                key,
                date: record.date.clone(),
                program_title: record.program_title.clone(),
                records: vec![record.clone()],
            });
        }
    }

    groups.sort_by(|a, b| b.date.cmp(&a.date));
    groups
}

#[must_use]
pub fn format_sets(sets: &[Set]) -> String {
    if sets.is_empty() {
        return "No sets recorded".to_string();
    }
    sets.iter()
        .map(|set| format!("{}kg x {}", set.weight_or_zero(), set.reps_or_zero()))
        .collect::<Vec<_>>()
        .join(" · ")
}
