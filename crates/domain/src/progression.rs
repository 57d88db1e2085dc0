use std::collections::{BTreeMap, btree_map::Entry};

use crate::{ExerciseKey, ManualRecord, ReadError, RecordDate, SessionRecord, UserID};

#[allow(async_fn_in_trait)]
pub trait ProgressionService {
    async fn get_progression(
        &self,
        user_id: UserID,
        exercise_key: &ExerciseKey,
    ) -> Result<Vec<ProgressionPoint>, ReadError>;
}

#[allow(async_fn_in_trait)]
pub trait ProgressionRepository {
    /// Pre-aggregated progression of one exercise, as maintained by the data source.
    async fn read_progression(
        &self,
        user_id: UserID,
        exercise_key: &ExerciseKey,
        limit: Option<usize>,
    ) -> Result<Vec<AggregatedPoint>, ReadError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManualPoint {
    pub date: RecordDate,
    pub weight: Option<f32>,
    pub reps: Option<u32>,
    pub sets: Option<u32>,
}

impl ManualPoint {
    #[must_use]
    pub fn volume(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let volume = self.weight.unwrap_or_default()
            * self.reps.unwrap_or_default() as f32
            * self.sets.unwrap_or_default() as f32;
        volume
    }

    #[must_use]
    pub fn is_single(&self) -> bool {
        self.reps == Some(1)
    }
}

impl From<&ManualRecord> for ManualPoint {
    fn from(value: &ManualRecord) -> Self {
        Self {
            date: value.date.clone(),
            weight: value.weight,
            reps: value.reps,
            sets: value.sets,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedPoint {
    pub date: RecordDate,
    pub best_metric: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionPoint {
    pub date: RecordDate,
    pub weight: f32,
    pub actual_1rm: bool,
}

impl SessionPoint {
    /// Heaviest set of the record, which is an actual one-rep max if any set of that weight was
    /// a single repetition.
    #[must_use]
    pub fn from_record(record: &SessionRecord) -> Option<Self> {
        let weight = record.best_set()?.weight_or_zero();
        Some(Self {
            date: record.date.clone(),
            weight,
            actual_1rm: record
                .sets
                .iter()
                .any(|set| set.is_single() && set.weight_or_zero().total_cmp(&weight).is_eq()),
        })
    }
}

/// One point of the merged timeline of an exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionPoint {
    pub date: RecordDate,
    pub date_label: String,
    pub weight: Option<f32>,
    pub volume: Option<f32>,
    pub best_metric: Option<f32>,
    pub actual_1rm: bool,
    pub actual_1rm_pr: bool,
}

impl ProgressionPoint {
    fn new(date: RecordDate) -> Self {
        Self {
            date_label: date.label(),
            date,
            weight: None,
            volume: None,
            best_metric: None,
            actual_1rm: false,
            actual_1rm_pr: false,
        }
    }
}

/// Merge manual, pre-aggregated and session-derived points into one series ordered by date.
///
/// Points of the same day share one entry. Session data overrides the weight of manual data,
/// and an actual one-rep max observed in a session overrides the estimate of that day. Only the
/// most recent entry with the highest actual one-rep max is marked as `actual_1rm_pr`.
#[must_use]
pub fn merge_series(
    manual: &[ManualPoint],
    aggregated: &[AggregatedPoint],
    session: &[SessionPoint],
) -> Vec<ProgressionPoint> {
    let mut buckets: BTreeMap<RecordDate, ProgressionPoint> = BTreeMap::new();

    for point in manual {
        let bucket = bucket(&mut buckets, &point.date);
        let weight = point.weight.unwrap_or_default();
        *bucket.volume.get_or_insert(0.0) += point.volume();
        match bucket.weight {
            Some(current) if weight < current => {}
            Some(current) if weight.total_cmp(&current).is_eq() => {
                bucket.actual_1rm |= point.is_single();
            }
            _ => {
                bucket.weight = Some(weight);
                bucket.actual_1rm = point.is_single();
            }
        }
    }

    for point in aggregated {
        let bucket = bucket(&mut buckets, &point.date);
        bucket.best_metric = Some(
            bucket
                .best_metric
                .map_or(point.best_metric, |current| current.max(point.best_metric)),
        );
    }

    for point in heaviest_per_day(session) {
        let bucket = bucket(&mut buckets, &point.date);
        bucket.weight = Some(point.weight);
        if point.actual_1rm {
            bucket.actual_1rm = true;
            bucket.best_metric = Some(point.weight);
        }
    }

    let mut points = buckets.into_values().collect::<Vec<_>>();
    mark_actual_1rm_pr(&mut points);
    points
}

fn bucket<'a>(
    buckets: &'a mut BTreeMap<RecordDate, ProgressionPoint>,
    date: &RecordDate,
) -> &'a mut ProgressionPoint {
    let date = date.truncated();
    buckets
        .entry(date.clone())
        .or_insert_with(|| ProgressionPoint::new(date))
}

fn heaviest_per_day(points: &[SessionPoint]) -> Vec<SessionPoint> {
    let mut result: BTreeMap<RecordDate, SessionPoint> = BTreeMap::new();
    for point in points {
        match result.entry(point.date.truncated()) {
            Entry::Vacant(entry) => {
                entry.insert(point.clone());
            }
            Entry::Occupied(mut entry) => {
                let current = entry.get();
                let heavier = point
                    .weight
                    .total_cmp(&current.weight)
                    .then(point.actual_1rm.cmp(&current.actual_1rm))
                    .is_gt();
                if heavier {
                    entry.insert(point.clone());
                }
            }
        }
    }
    result.into_values().collect()
}

fn mark_actual_1rm_pr(points: &mut [ProgressionPoint]) {
    let max = points
        .iter()
        .filter(|p| p.actual_1rm)
        .filter_map(|p| p.weight)
        .max_by(f32::total_cmp);

    for point in points.iter_mut() {
        point.actual_1rm_pr = false;
    }

    if let Some(max) = max {
        if let Some(point) = points.iter_mut().rev().find(|p| {
            p.actual_1rm && p.weight.is_some_and(|weight| weight.total_cmp(&max).is_eq())
        }) {
            point.actual_1rm_pr = true;
        }
    }
}

#[must_use]
pub fn manual_points(records: &[ManualRecord]) -> Vec<ManualPoint> {
    records.iter().map(ManualPoint::from).collect()
}

#[must_use]
pub fn session_points(records: &[SessionRecord]) -> Vec<SessionPoint> {
    records.iter().filter_map(SessionPoint::from_record).collect()
}

/// Progression of a single exercise from all sources.
///
/// The pre-aggregated points are expected to belong to the given exercise already.
#[must_use]
pub fn progression_for(
    exercise_key: &ExerciseKey,
    manual: &[ManualRecord],
    aggregated: &[AggregatedPoint],
    session: &[SessionRecord],
) -> Vec<ProgressionPoint> {
    let manual = manual
        .iter()
        .filter(|r| r.key() == *exercise_key)
        .map(ManualPoint::from)
        .collect::<Vec<_>>();
    let session = session
        .iter()
        .filter(|r| r.key() == *exercise_key)
        .filter_map(SessionPoint::from_record)
        .collect::<Vec<_>>();
    merge_series(&manual, aggregated, &session)
}
