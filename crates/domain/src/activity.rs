use crate::{
    ManualRecord, Method, PrMap, ReadError, RecordDate, SessionRecord, Source, UserID,
    best_metric, reaches_personal_record,
};

#[allow(async_fn_in_trait)]
pub trait ActivityService {
    async fn get_activity(&self, user_id: UserID) -> Result<Vec<ActivityRow>, ReadError>;
}

/// One entry of the combined activity feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    pub exercise: String,
    pub weight: Option<f32>,
    pub reps: Option<u32>,
    pub sets: Option<u32>,
    pub date: RecordDate,
    pub source: Source,
    pub is_pr: bool,
}

impl ActivityRow {
    fn from_manual(record: &ManualRecord, pr_map: &PrMap) -> Self {
        Self {
            exercise: record.name.clone(),
            weight: record.weight,
            reps: record.reps,
            sets: record.sets,
            date: record.date.clone(),
            source: Source::Manual,
            is_pr: reaches_personal_record(&record.key(), Some(record.metric()), pr_map),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_session(record: &SessionRecord, pr_map: &PrMap, session_method: Method) -> Self {
        Self {
            exercise: record.exercise_name.clone(),
            weight: best_metric(&record.sets, Method::MaxWeight),
            reps: record.best_set().and_then(|set| set.reps),
            sets: Some(record.sets.len() as u32),
            date: record.date.clone(),
            source: record.source,
            is_pr: reaches_personal_record(&record.key(), record.metric(session_method), pr_map),
        }
    }
}

/// Combine manual and session records into one feed, most recent first.
///
/// Session records are represented by their heaviest set. `session_method` must be the method
/// the personal record map was built with. Rows with unparsed dates are kept at the end.
#[must_use]
pub fn merge_activity(
    manual: &[ManualRecord],
    session: &[SessionRecord],
    pr_map: &PrMap,
    session_method: Method,
) -> Vec<ActivityRow> {
    let mut rows = manual
        .iter()
        .map(|record| ActivityRow::from_manual(record, pr_map))
        .chain(
            session
                .iter()
                .map(|record| ActivityRow::from_session(record, pr_map, session_method)),
        )
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}
