use liftlog_domain as domain;
use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

#[derive(serde::Serialize, serde::Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct Set {
    #[serde(default, deserialize_with = "lenient_f32")]
    pub weight: Option<f32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub reps: Option<u32>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub rpe: Option<f32>,
}

impl From<Set> for domain::Set {
    fn from(value: Set) -> Self {
        Self {
            weight: value.weight,
            reps: value.reps,
            rpe: value.rpe,
        }
    }
}

impl From<domain::Set> for Set {
    fn from(value: domain::Set) -> Self {
        Self {
            weight: value.weight,
            reps: value.reps,
            rpe: value.rpe,
        }
    }
}

/// Sets as delivered by the data source, either structured or as an encoded JSON string.
///
/// Elements are kept undecoded so that a single malformed set cannot invalidate the row.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawSets {
    Array(Vec<Value>),
    Encoded(String),
    Other(Value),
}

impl RawSets {
    /// Invalid sets are treated as empty sets, sets which are not a list result in an empty list.
    #[must_use]
    pub fn resolve(self) -> Vec<domain::Set> {
        let values = match self {
            RawSets::Array(values) => values,
            RawSets::Encoded(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Array(values)) => values,
                Ok(_) => {
                    warn!("encoded sets {text:?} are not a list");
                    vec![]
                }
                Err(err) => {
                    warn!("failed to decode sets {text:?}: {err}");
                    vec![]
                }
            },
            RawSets::Other(value) => {
                warn!("sets {value} are not a list");
                vec![]
            }
        };
        values.iter().map(decode_set).collect()
    }
}

fn decode_set(value: &Value) -> domain::Set {
    match Set::deserialize(value) {
        Ok(set) => set.into(),
        Err(err) => {
            warn!("invalid set {value}: {err}");
            domain::Set::default()
        }
    }
}

impl Default for RawSets {
    fn default() -> Self {
        RawSets::Array(vec![])
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct ManualRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub weight: Option<f32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub reps: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub sets: Option<u32>,
    #[serde(default)]
    pub date: Option<String>,
}

impl From<ManualRecord> for domain::ManualRecord {
    fn from(value: ManualRecord) -> Self {
        Self {
            id: value.id.into(),
            user_id: value.user_id.into(),
            name: value.name.unwrap_or_default(),
            weight: value.weight,
            reps: value.reps,
            sets: value.sets,
            date: domain::RecordDate::parse(&value.date.unwrap_or_default()),
        }
    }
}

impl From<&domain::ManualRecord> for ManualRecord {
    fn from(value: &domain::ManualRecord) -> Self {
        Self {
            id: *value.id,
            user_id: *value.user_id,
            name: Some(value.name.clone()),
            weight: value.weight,
            reps: value.reps,
            sets: value.sets,
            date: Some(value.date.to_string()),
        }
    }
}

/// Row of the unified view, which combines all session-derived exercise entries.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct UnifiedRecord {
    pub user_id: Uuid,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub exercise_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub sets: Option<RawSets>,
    #[serde(default)]
    pub program_title: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl From<UnifiedRecord> for domain::SessionRecord {
    fn from(value: UnifiedRecord) -> Self {
        Self {
            session_id: value.session_id.map(domain::SessionID::from),
            exercise_name: value.exercise_name.unwrap_or_default(),
            date: domain::RecordDate::parse(&value.date.unwrap_or_default()),
            sets: value.sets.unwrap_or_default().resolve(),
            program_title: value.program_title,
            source: match value.source.as_deref() {
                Some("manual") => domain::Source::Manual,
                _ => domain::Source::Session,
            },
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct ProgressionRow {
    pub user_id: Uuid,
    #[serde(default)]
    pub exercise_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub best_metric: Option<f32>,
}

impl ProgressionRow {
    #[must_use]
    pub fn key(&self) -> domain::ExerciseKey {
        domain::ExerciseKey::new(self.exercise_name.as_deref().unwrap_or_default())
    }
}

impl TryFrom<ProgressionRow> for domain::AggregatedPoint {
    type Error = RowError;

    fn try_from(value: ProgressionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            date: domain::RecordDate::parse(&value.date.unwrap_or_default()),
            best_metric: value.best_metric.ok_or(RowError::Missing("best_metric"))?,
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct PersonalRecordRow {
    pub user_id: Uuid,
    pub exercise_name: String,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub pr_value: Option<f32>,
    #[serde(default)]
    pub pr_date: Option<String>,
}

impl TryFrom<PersonalRecordRow> for domain::PersonalRecord {
    type Error = RowError;

    fn try_from(value: PersonalRecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            exercise_key: domain::ExerciseKey::new(&value.exercise_name),
            pr_value: value.pr_value.ok_or(RowError::Missing("pr_value"))?,
            pr_date: domain::RecordDate::parse(&value.pr_date.unwrap_or_default()),
            exercise_name: value.exercise_name,
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RowError {
    #[error("missing {0}")]
    Missing(&'static str),
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub session_metric: String,
    pub activity_limit: Option<usize>,
    pub progression_limit: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from(domain::Settings::default())
    }
}

impl From<domain::Settings> for Settings {
    fn from(value: domain::Settings) -> Self {
        Self {
            session_metric: value.session_metric.to_string(),
            activity_limit: value.activity_limit,
            progression_limit: value.progression_limit,
        }
    }
}

impl From<Settings> for domain::Settings {
    fn from(value: Settings) -> Self {
        Self {
            session_metric: value
                .session_metric
                .parse::<domain::Method>()
                .unwrap_or_else(|err| {
                    warn!("{err}, using {}", domain::Method::default());
                    domain::Method::default()
                }),
            activity_limit: value.activity_limit,
            progression_limit: value.progression_limit,
        }
    }
}

fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f32>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(lenient_number)
        .map(|number| number as f32))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(lenient_number)
        .filter(|number| {
            number.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(number)
        })
        .map(|number| number as u32))
}
