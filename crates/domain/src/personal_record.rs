use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, btree_map::Entry},
    fmt,
};

use crate::{ExerciseKey, Method, ReadError, Record, RecordDate, UserID};

#[allow(async_fn_in_trait)]
pub trait PersonalRecordService {
    async fn get_personal_records(&self, user_id: UserID) -> Result<PrMap, ReadError>;
}

#[allow(async_fn_in_trait)]
pub trait PersonalRecordRepository {
    /// Personal records maintained by the data source itself.
    async fn read_personal_records(
        &self,
        user_id: UserID,
    ) -> Result<Vec<PersonalRecord>, ReadError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonalRecord {
    pub exercise_key: ExerciseKey,
    pub exercise_name: String,
    pub pr_value: f32,
    pub pr_date: RecordDate,
}

pub type PrMap = BTreeMap<ExerciseKey, PersonalRecord>;

impl PersonalRecord {
    /// Candidate derived from a single record.
    ///
    /// Records without a metric or with an empty exercise key cannot be a candidate.
    #[must_use]
    pub fn from_record(record: &Record, session_method: Method) -> Option<Self> {
        let exercise_key = record.key();
        if exercise_key.is_empty() {
            return None;
        }
        Some(Self {
            exercise_key,
            exercise_name: record.name().to_string(),
            pr_value: record.metric(session_method)?,
            pr_date: record.date().clone(),
        })
    }

    /// Total order of candidates: higher value first, then more recent date.
    ///
    /// The exercise name only separates candidates with identical value and date.
    #[must_use]
    pub fn cmp_rank(&self, other: &Self) -> Ordering {
        self.pr_value
            .total_cmp(&other.pr_value)
            .then_with(|| self.pr_date.cmp(&other.pr_date))
            .then_with(|| self.exercise_name.cmp(&other.exercise_name))
    }
}

/// Fold a candidate into the map, replacing the current entry only if the candidate ranks higher.
#[must_use]
pub fn merge_one(mut pr_map: PrMap, candidate: PersonalRecord) -> PrMap {
    match pr_map.entry(candidate.exercise_key.clone()) {
        Entry::Vacant(entry) => {
            entry.insert(candidate);
        }
        Entry::Occupied(mut entry) => {
            if candidate.cmp_rank(entry.get()) == Ordering::Greater {
                entry.insert(candidate);
            }
        }
    }
    pr_map
}

#[must_use]
pub fn build_pr_map(records: &[Record], session_method: Method) -> PrMap {
    records
        .iter()
        .filter_map(|record| PersonalRecord::from_record(record, session_method))
        .fold(PrMap::new(), merge_one)
}

/// Whether the record reaches the tracked personal record of its exercise.
///
/// The comparison is not strict, so every record equal to the best value is reported.
#[must_use]
pub fn is_personal_record(record: &Record, pr_map: &PrMap, session_method: Method) -> bool {
    reaches_personal_record(&record.key(), record.metric(session_method), pr_map)
}

#[must_use]
pub fn reaches_personal_record(
    exercise_key: &ExerciseKey,
    value: Option<f32>,
    pr_map: &PrMap,
) -> bool {
    match (value, pr_map.get(exercise_key)) {
        (Some(value), Some(personal_record)) => value >= personal_record.pr_value,
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Divergence {
    Value {
        exercise_key: ExerciseKey,
        local: f32,
        server: f32,
    },
    MissingLocally(ExerciseKey),
    MissingOnServer(ExerciseKey),
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::Value {
                exercise_key,
                local,
                server,
            } => write!(f, "{exercise_key}: local {local} != server {server}"),
            Divergence::MissingLocally(exercise_key) => {
                write!(f, "{exercise_key}: missing locally")
            }
            Divergence::MissingOnServer(exercise_key) => {
                write!(f, "{exercise_key}: missing on server")
            }
        }
    }
}

const CROSS_CHECK_TOLERANCE: f32 = 0.001;

/// Compare locally computed personal records with the ones provided by the data source.
#[must_use]
pub fn cross_check(local: &PrMap, server: &[PersonalRecord]) -> Vec<Divergence> {
    let server = server
        .iter()
        .map(|pr| PersonalRecord {
            exercise_key: ExerciseKey::new(&pr.exercise_key),
            ..pr.clone()
        })
        .fold(PrMap::new(), merge_one);
    let keys = local.keys().chain(server.keys()).collect::<BTreeSet<_>>();

    keys.into_iter()
        .filter_map(|key| match (local.get(key), server.get(key)) {
            (Some(local), Some(server)) => {
                if (local.pr_value - server.pr_value).abs() > CROSS_CHECK_TOLERANCE {
                    Some(Divergence::Value {
                        exercise_key: key.clone(),
                        local: local.pr_value,
                        server: server.pr_value,
                    })
                } else {
                    None
                }
            }
            (Some(_), None) => Some(Divergence::MissingOnServer(key.clone())),
            (None, Some(_)) => Some(Divergence::MissingLocally(key.clone())),
            (None, None) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{ManualRecord, SessionRecord, Set, Source};

    use super::*;

    fn manual(name: &str, weight: f32, date: &str) -> Record {
        Record::from(ManualRecord {
            id: 1.into(),
            user_id: 1.into(),
            name: name.to_string(),
            weight: Some(weight),
            reps: Some(5),
            sets: Some(3),
            date: RecordDate::parse(date),
        })
    }

    fn session(name: &str, sets: Vec<Set>, date: &str) -> Record {
        Record::from(SessionRecord {
            session_id: Some(1.into()),
            exercise_name: name.to_string(),
            date: RecordDate::parse(date),
            sets,
            program_title: None,
            source: Source::Session,
        })
    }

    fn pr(name: &str, value: f32, date: &str) -> PersonalRecord {
        PersonalRecord {
            exercise_key: ExerciseKey::new(name),
            exercise_name: name.to_string(),
            pr_value: value,
            pr_date: RecordDate::parse(date),
        }
    }

    #[test]
    fn test_build_pr_map_empty() {
        assert_eq!(build_pr_map(&[], Method::MaxWeight), PrMap::new());
    }

    #[test]
    fn test_build_pr_map_later_date_wins_tie() {
        let pr_map = build_pr_map(
            &[
                manual("Bench", 100.0, "2024-01-01"),
                manual("Bench", 100.0, "2024-03-01"),
            ],
            Method::MaxWeight,
        );
        assert_eq!(pr_map.len(), 1);
        assert_eq!(pr_map[&ExerciseKey::new("Bench")], pr("Bench", 100.0, "2024-03-01"));
    }

    #[test]
    fn test_build_pr_map_higher_value_wins_over_later_date() {
        let pr_map = build_pr_map(
            &[
                manual("Bench", 100.0, "2024-01-01"),
                manual("Bench", 100.0, "2024-03-01"),
                manual("Bench", 110.0, "2024-01-15"),
            ],
            Method::MaxWeight,
        );
        assert_eq!(pr_map[&ExerciseKey::new("Bench")], pr("Bench", 110.0, "2024-01-15"));
    }

    #[test]
    fn test_build_pr_map_is_independent_of_order() {
        let records = [
            manual("bench", 100.0, "2024-01-01"),
            session("BENCH", vec![Set::new(90.0, 5), Set::new(100.0, 2)], "2024-03-01"),
            manual("Bench", 95.0, "2024-04-01"),
            manual("squat", 140.0, "2024-02-01"),
            session("Squat", vec![Set::new(140.0, 1)], "2024-02-01T09:00:00"),
        ];
        let expected = build_pr_map(&records, Method::MaxWeight);

        for rotation in 0..records.len() {
            let mut rotated = records.to_vec();
            rotated.rotate_left(rotation);
            assert_eq!(build_pr_map(&rotated, Method::MaxWeight), expected);
            rotated.reverse();
            assert_eq!(build_pr_map(&rotated, Method::MaxWeight), expected);
        }

        assert_eq!(expected[&ExerciseKey::new("Bench")].pr_date, RecordDate::parse("2024-03-01"));
        assert_eq!(expected[&ExerciseKey::new("Bench")].exercise_name, "BENCH");
        assert_eq!(
            expected[&ExerciseKey::new("Squat")].pr_date,
            RecordDate::parse("2024-02-01T09:00:00")
        );
    }

    #[test]
    fn test_build_pr_map_identical_value_and_date() {
        let records = [
            manual("bench", 100.0, "2024-01-01"),
            manual("Bench", 100.0, "2024-01-01"),
        ];
        let mut reversed = records.to_vec();
        reversed.reverse();
        assert_eq!(
            build_pr_map(&records, Method::MaxWeight),
            build_pr_map(&reversed, Method::MaxWeight)
        );
    }

    #[test]
    fn test_build_pr_map_session_method() {
        let records = [
            manual("Bench", 85.0, "2024-01-01"),
            session("Bench", vec![Set::new(60.0, 15)], "2024-01-02"),
        ];
        assert_eq!(
            build_pr_map(&records, Method::MaxWeight)[&ExerciseKey::new("Bench")].pr_value,
            85.0
        );
        assert_eq!(
            build_pr_map(&records, Method::Epley)[&ExerciseKey::new("Bench")].pr_value,
            90.0
        );
    }

    #[test]
    fn test_build_pr_map_skips_records_without_metric() {
        let pr_map = build_pr_map(
            &[
                session("Row", vec![], "2024-01-01"),
                manual("  ", 50.0, "2024-01-01"),
            ],
            Method::MaxWeight,
        );
        assert_eq!(pr_map, PrMap::new());
    }

    #[test]
    fn test_build_pr_map_parsed_date_wins_over_unparsed() {
        let pr_map = build_pr_map(
            &[
                manual("Bench", 100.0, "2024-01-01"),
                manual("Bench", 100.0, "unknown"),
            ],
            Method::MaxWeight,
        );
        assert_eq!(pr_map[&ExerciseKey::new("Bench")].pr_date, RecordDate::parse("2024-01-01"));
    }

    #[rstest]
    #[case::higher(pr("Bench", 110.0, "2024-01-01"), pr("Bench", 100.0, "2024-03-01"), Ordering::Greater)]
    #[case::lower(pr("Bench", 90.0, "2024-03-01"), pr("Bench", 100.0, "2024-01-01"), Ordering::Less)]
    #[case::later(pr("Bench", 100.0, "2024-03-01"), pr("Bench", 100.0, "2024-01-01"), Ordering::Greater)]
    #[case::equal(pr("Bench", 100.0, "2024-03-01"), pr("Bench", 100.0, "2024-03-01"), Ordering::Equal)]
    fn test_personal_record_cmp_rank(
        #[case] a: PersonalRecord,
        #[case] b: PersonalRecord,
        #[case] expected: Ordering,
    ) {
        assert_eq!(a.cmp_rank(&b), expected);
        assert_eq!(b.cmp_rank(&a), expected.reverse());
    }

    #[test]
    fn test_merge_one() {
        let pr_map = merge_one(PrMap::new(), pr("Bench", 100.0, "2024-03-01"));
        let pr_map = merge_one(pr_map, pr("Bench", 100.0, "2024-01-01"));
        assert_eq!(pr_map[&ExerciseKey::new("Bench")], pr("Bench", 100.0, "2024-03-01"));
        let pr_map = merge_one(pr_map, pr("Bench", 100.5, "2023-01-01"));
        assert_eq!(pr_map[&ExerciseKey::new("Bench")], pr("Bench", 100.5, "2023-01-01"));
    }

    #[rstest]
    #[case::above(manual("Bench", 120.0, "2024-05-01"), true)]
    #[case::equal(manual("Bench", 110.0, "2023-05-01"), true)]
    #[case::below(manual("Bench", 100.0, "2024-05-01"), false)]
    #[case::untracked(manual("Squat", 200.0, "2024-05-01"), false)]
    #[case::no_metric(session("Bench", vec![], "2024-05-01"), false)]
    fn test_is_personal_record(#[case] record: Record, #[case] expected: bool) {
        let pr_map = PrMap::from([(ExerciseKey::new("Bench"), pr("Bench", 110.0, "2024-01-15"))]);
        assert_eq!(is_personal_record(&record, &pr_map, Method::MaxWeight), expected);
    }

    // Equal values are deliberately reported as personal records, so several historical
    // entries can be flagged at the same time.
    #[test]
    fn test_is_personal_record_flags_all_entries_with_best_value() {
        let records = [
            manual("Bench", 100.0, "2024-01-01"),
            manual("Bench", 100.0, "2024-03-01"),
            manual("Bench", 90.0, "2024-04-01"),
        ];
        let pr_map = build_pr_map(&records, Method::MaxWeight);
        assert_eq!(
            records
                .iter()
                .map(|record| is_personal_record(record, &pr_map, Method::MaxWeight))
                .collect::<Vec<_>>(),
            vec![true, true, false]
        );
    }

    #[test]
    fn test_cross_check() {
        let local = build_pr_map(
            &[
                manual("Bench", 100.0, "2024-01-01"),
                manual("Squat", 140.0, "2024-01-01"),
                manual("Row", 70.0, "2024-01-01"),
            ],
            Method::MaxWeight,
        );
        let server = [
            pr("bench", 100.0, "2024-01-01"),
            pr("Squat", 150.0, "2024-02-01"),
            pr("Deadlift", 180.0, "2024-02-01"),
        ];
        assert_eq!(
            cross_check(&local, &server),
            vec![
                Divergence::MissingLocally(ExerciseKey::new("Deadlift")),
                Divergence::MissingOnServer(ExerciseKey::new("Row")),
                Divergence::Value {
                    exercise_key: ExerciseKey::new("Squat"),
                    local: 140.0,
                    server: 150.0
                },
            ]
        );
        assert_eq!(
            cross_check(&local, &server)[2].to_string(),
            "Squat: local 140 != server 150"
        );
        assert_eq!(cross_check(&PrMap::new(), &[]), vec![]);
    }
}
