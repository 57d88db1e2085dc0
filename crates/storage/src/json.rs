use std::path::Path;

use anyhow::Context;
use liftlog_domain as domain;
use log::{debug, warn};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use strum::AsRefStr;

use crate::wire::{ManualRecord, PersonalRecordRow, ProgressionRow, Settings, UnifiedRecord};

/// Data access on a single JSON document holding one array per collection.
#[derive(Debug, Default, Clone)]
pub struct JsonStorage {
    document: Map<String, Value>,
}

impl JsonStorage {
    pub fn new(document: Value) -> Result<Self, JsonStorageError> {
        match document {
            Value::Object(document) => Ok(Self { document }),
            _ => Err(JsonStorageError::InvalidDocument),
        }
    }

    pub fn load(path: &Path) -> Result<Self, JsonStorageError> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let document = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        debug!("loaded {}", path.display());
        Self::new(document)
    }

    /// Invalid rows are skipped.
    fn get_all<V>(&self, collection: Collection) -> Result<Vec<V>, JsonStorageError>
    where
        V: DeserializeOwned,
    {
        match self.document.get(collection.as_ref()) {
            None | Some(Value::Null) => Ok(vec![]),
            Some(Value::Array(values)) => Ok(values
                .iter()
                .filter_map(|value| match V::deserialize(value) {
                    Ok(row) => Some(row),
                    Err(err) => {
                        warn!("skipping invalid row in {}: {err}", collection.as_ref());
                        None
                    }
                })
                .collect()),
            Some(_) => Err(JsonStorageError::InvalidCollection(
                collection.as_ref().to_string(),
            )),
        }
    }
}

impl std::str::FromStr for JsonStorage {
    type Err = JsonStorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(serde_json::from_str(s).context("failed to parse document")?)
    }
}

fn sort_by_date_descending<T>(items: &mut [T], date: impl Fn(&T) -> &domain::RecordDate) {
    items.sort_by(|a, b| date(b).cmp(date(a)));
}

fn truncate<T>(items: &mut Vec<T>, limit: Option<usize>) {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
}

impl domain::ManualRecordRepository for JsonStorage {
    async fn read_manual_records(
        &self,
        user_id: domain::UserID,
    ) -> Result<Vec<domain::ManualRecord>, domain::ReadError> {
        let mut records = self
            .get_all::<ManualRecord>(Collection::Exercises)?
            .into_iter()
            .filter(|row| row.user_id == *user_id)
            .map(domain::ManualRecord::from)
            .collect::<Vec<_>>();
        sort_by_date_descending(&mut records, |r| &r.date);
        Ok(records)
    }
}

impl domain::UnifiedRecordRepository for JsonStorage {
    async fn read_unified_records(
        &self,
        user_id: domain::UserID,
        filter: &domain::RecordFilter,
    ) -> Result<Vec<domain::SessionRecord>, domain::ReadError> {
        let mut records = self
            .get_all::<UnifiedRecord>(Collection::Unified)?
            .into_iter()
            .filter(|row| row.user_id == *user_id)
            .map(domain::SessionRecord::from)
            .filter(|record| filter.contains(&record.date))
            .collect::<Vec<_>>();
        sort_by_date_descending(&mut records, |r| &r.date);
        truncate(&mut records, filter.limit);
        Ok(records)
    }
}

impl domain::ProgressionRepository for JsonStorage {
    async fn read_progression(
        &self,
        user_id: domain::UserID,
        exercise_key: &domain::ExerciseKey,
        limit: Option<usize>,
    ) -> Result<Vec<domain::AggregatedPoint>, domain::ReadError> {
        let mut points = self
            .get_all::<ProgressionRow>(Collection::Progression)?
            .into_iter()
            .filter(|row| row.user_id == *user_id && row.key() == *exercise_key)
            .filter_map(|row| {
                domain::AggregatedPoint::try_from(row)
                    .inspect_err(|err| warn!("skipping progression of {exercise_key}: {err}"))
                    .ok()
            })
            .collect::<Vec<_>>();
        sort_by_date_descending(&mut points, |p| &p.date);
        truncate(&mut points, limit);
        Ok(points)
    }
}

impl domain::PersonalRecordRepository for JsonStorage {
    async fn read_personal_records(
        &self,
        user_id: domain::UserID,
    ) -> Result<Vec<domain::PersonalRecord>, domain::ReadError> {
        Ok(self
            .get_all::<PersonalRecordRow>(Collection::PersonalRecords)?
            .into_iter()
            .filter(|row| row.user_id == *user_id)
            .filter_map(|row| {
                domain::PersonalRecord::try_from(row)
                    .inspect_err(|err| warn!("skipping personal record: {err}"))
                    .ok()
            })
            .collect())
    }
}

impl domain::SettingsRepository for JsonStorage {
    async fn read_settings(&self) -> Result<domain::Settings, domain::ReadError> {
        match self.document.get(Collection::Settings.as_ref()) {
            None | Some(Value::Null) => Ok(domain::Settings::default()),
            Some(value) => Ok(Settings::deserialize(value)
                .map_err(|err| JsonStorageError::Other(err.into()))?
                .into()),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum JsonStorageError {
    #[error("document is not a JSON object")]
    InvalidDocument,
    #[error("collection {0} is not an array")]
    InvalidCollection(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<JsonStorageError> for domain::ReadError {
    fn from(value: JsonStorageError) -> Self {
        domain::ReadError::Storage(domain::StorageError::Other(Box::new(value)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum Collection {
    #[strum(serialize = "exercises")]
    Exercises,
    #[strum(serialize = "exercise_unified_view")]
    Unified,
    #[strum(serialize = "exercise_progression")]
    Progression,
    #[strum(serialize = "personal_records")]
    PersonalRecords,
    #[strum(serialize = "settings")]
    Settings,
}
