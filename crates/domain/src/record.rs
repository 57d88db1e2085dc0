use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use derive_more::Deref;
use uuid::Uuid;

use crate::{ExerciseKey, ManualPoint, Method, ReadError, Set, best_metric, best_set};

#[allow(async_fn_in_trait)]
pub trait ManualRecordRepository {
    /// Manual records of the user, ordered by date descending.
    async fn read_manual_records(&self, user_id: UserID) -> Result<Vec<ManualRecord>, ReadError>;
}

#[allow(async_fn_in_trait)]
pub trait UnifiedRecordRepository {
    /// Session-derived records of the user, ordered by date descending.
    async fn read_unified_records(
        &self,
        user_id: UserID,
        filter: &RecordFilter,
    ) -> Result<Vec<SessionRecord>, ReadError>;
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserID(Uuid);

impl UserID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for UserID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for UserID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecordID(Uuid);

impl RecordID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for RecordID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for RecordID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

#[derive(Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionID(Uuid);

impl SessionID {
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for SessionID {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<u128> for SessionID {
    fn from(value: u128) -> Self {
        Self(Uuid::from_bytes(value.to_be_bytes()))
    }
}

/// Date of a record as delivered by the data source.
///
/// Values which cannot be interpreted as a date are kept verbatim. All unparsed dates order
/// before all parsed dates.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecordDate {
    Unparsed(String),
    Parsed(NaiveDateTime),
}

const DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_DATE_TIME_FORMATS: [&str; 2] =
    ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

impl RecordDate {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();

        if let Ok(date_time) = DateTime::parse_from_rfc3339(trimmed) {
            return RecordDate::Parsed(date_time.naive_local());
        }

        for format in OFFSET_DATE_TIME_FORMATS {
            if let Ok(date_time) = DateTime::parse_from_str(trimmed, format) {
                return RecordDate::Parsed(date_time.naive_local());
            }
        }

        for format in DATE_TIME_FORMATS {
            if let Ok(date_time) = NaiveDateTime::parse_from_str(trimmed, format) {
                return RecordDate::Parsed(date_time);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return RecordDate::Parsed(date.and_time(NaiveTime::MIN));
        }

        RecordDate::Unparsed(value.to_string())
    }

    #[must_use]
    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            RecordDate::Parsed(date_time) => Some(date_time.date()),
            RecordDate::Unparsed(_) => None,
        }
    }

    /// Start of the day for parsed dates, unparsed dates are returned unchanged.
    #[must_use]
    pub fn truncated(&self) -> RecordDate {
        match self {
            RecordDate::Parsed(date_time) => {
                RecordDate::Parsed(date_time.date().and_time(NaiveTime::MIN))
            }
            RecordDate::Unparsed(raw) => RecordDate::Unparsed(raw.clone()),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            RecordDate::Parsed(date_time) => date_time.format("%b %-d, %Y").to_string(),
            RecordDate::Unparsed(raw) => raw.clone(),
        }
    }

    #[must_use]
    pub fn is_parsed(&self) -> bool {
        matches!(self, RecordDate::Parsed(_))
    }
}

impl From<NaiveDate> for RecordDate {
    fn from(value: NaiveDate) -> Self {
        RecordDate::Parsed(value.and_time(NaiveTime::MIN))
    }
}

impl From<NaiveDateTime> for RecordDate {
    fn from(value: NaiveDateTime) -> Self {
        RecordDate::Parsed(value)
    }
}

impl From<&str> for RecordDate {
    fn from(value: &str) -> Self {
        RecordDate::parse(value)
    }
}

impl fmt::Display for RecordDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordDate::Parsed(date_time) => {
                if date_time.time() == NaiveTime::MIN {
                    write!(f, "{}", date_time.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", date_time.format("%Y-%m-%dT%H:%M:%S"))
                }
            }
            RecordDate::Unparsed(raw) => write!(f, "{raw}"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    #[default]
    Manual,
    Session,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Manual => write!(f, "manual"),
            Source::Session => write!(f, "session"),
        }
    }
}

/// A single ad-hoc log entry with exactly one implied set.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualRecord {
    pub id: RecordID,
    pub user_id: UserID,
    pub name: String,
    pub weight: Option<f32>,
    pub reps: Option<u32>,
    pub sets: Option<u32>,
    pub date: RecordDate,
}

impl ManualRecord {
    #[must_use]
    pub fn key(&self) -> ExerciseKey {
        ExerciseKey::new(&self.name)
    }

    #[must_use]
    pub fn set(&self) -> Set {
        Set {
            weight: self.weight,
            reps: self.reps,
            rpe: None,
        }
    }

    #[must_use]
    pub fn metric(&self) -> f32 {
        self.set().contribution(Method::MaxWeight)
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        ManualPoint::from(self).volume()
    }
}

/// All sets of one exercise performed within one training session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub session_id: Option<SessionID>,
    pub exercise_name: String,
    pub date: RecordDate,
    pub sets: Vec<Set>,
    pub program_title: Option<String>,
    pub source: Source,
}

impl SessionRecord {
    #[must_use]
    pub fn key(&self) -> ExerciseKey {
        ExerciseKey::new(&self.exercise_name)
    }

    #[must_use]
    pub fn metric(&self, method: Method) -> Option<f32> {
        best_metric(&self.sets, method)
    }

    #[must_use]
    pub fn best_set(&self) -> Option<&Set> {
        best_set(&self.sets)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Manual(ManualRecord),
    Session(SessionRecord),
}

impl Record {
    #[must_use]
    pub fn key(&self) -> ExerciseKey {
        match self {
            Record::Manual(record) => record.key(),
            Record::Session(record) => record.key(),
        }
    }

    /// Manual records are always evaluated by their weight.
    #[must_use]
    pub fn metric(&self, session_method: Method) -> Option<f32> {
        match self {
            Record::Manual(record) => Some(record.metric()),
            Record::Session(record) => record.metric(session_method),
        }
    }

    #[must_use]
    pub fn date(&self) -> &RecordDate {
        match self {
            Record::Manual(record) => &record.date,
            Record::Session(record) => &record.date,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Record::Manual(record) => &record.name,
            Record::Session(record) => &record.exercise_name,
        }
    }

    #[must_use]
    pub fn source(&self) -> Source {
        match self {
            Record::Manual(_) => Source::Manual,
            Record::Session(record) => record.source,
        }
    }
}

impl From<ManualRecord> for Record {
    fn from(value: ManualRecord) -> Self {
        Record::Manual(value)
    }
}

impl From<SessionRecord> for Record {
    fn from(value: SessionRecord) -> Self {
        Record::Session(value)
    }
}

#[must_use]
pub fn records(manual: &[ManualRecord], session: &[SessionRecord]) -> Vec<Record> {
    manual
        .iter()
        .cloned()
        .map(Record::from)
        .chain(session.iter().cloned().map(Record::from))
        .collect()
}

/// All distinct exercise keys, empty keys excluded.
#[must_use]
pub fn exercise_keys(records: &[Record]) -> BTreeSet<ExerciseKey> {
    records
        .iter()
        .map(Record::key)
        .filter(|key| !key.is_empty())
        .collect()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub limit: Option<usize>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RecordFilter {
    /// Whether the date lies within the inclusive bounds.
    ///
    /// Unparsed dates only pass an unbounded filter.
    #[must_use]
    pub fn contains(&self, date: &RecordDate) -> bool {
        match date.day() {
            Some(day) => {
                self.from.is_none_or(|from| day >= from) && self.to.is_none_or(|to| day <= to)
            }
            None => self.from.is_none() && self.to.is_none(),
        }
    }
}
