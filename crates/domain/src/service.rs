use futures_util::future::join;
use log::{debug, error, warn};

use crate::{
    ActivityRow, ActivityService, ExerciseKey, ManualRecord, ManualRecordRepository,
    PersonalRecordRepository, PersonalRecordService, PrMap, ProgressionPoint,
    ProgressionRepository, ProgressionService, ReadError, RecordFilter, SessionRecord, Settings,
    SettingsRepository, UnifiedRecordRepository, UserID, build_pr_map, cross_check,
    merge_activity, progression_for, records,
};

pub struct Service<R> {
    repository: R,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func.await;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(crate::StorageError::NoConnection) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R: SettingsRepository> Service<R> {
    async fn settings(&self) -> Settings {
        match self.repository.read_settings().await {
            Ok(settings) => settings,
            Err(err) => {
                warn!("failed to read settings, using defaults: {err}");
                Settings::default()
            }
        }
    }
}

impl<R: ManualRecordRepository + UnifiedRecordRepository> Service<R> {
    async fn read_records(
        &self,
        user_id: UserID,
        filter: &RecordFilter,
    ) -> Result<(Vec<ManualRecord>, Vec<SessionRecord>), ReadError> {
        let (manual, session) = join(
            async {
                log_on_error!(
                    self.repository.read_manual_records(user_id),
                    ReadError,
                    "read",
                    "manual records"
                )
            },
            async {
                log_on_error!(
                    self.repository.read_unified_records(user_id, filter),
                    ReadError,
                    "read",
                    "session records"
                )
            },
        )
        .await;
        Ok((manual?, session?))
    }
}

impl<R> PersonalRecordService for Service<R>
where
    R: ManualRecordRepository
        + UnifiedRecordRepository
        + PersonalRecordRepository
        + SettingsRepository,
{
    async fn get_personal_records(&self, user_id: UserID) -> Result<PrMap, ReadError> {
        let settings = self.settings().await;
        let (manual, session) = self.read_records(user_id, &RecordFilter::default()).await?;
        let pr_map = build_pr_map(&records(&manual, &session), settings.session_metric);

        match self.repository.read_personal_records(user_id).await {
            Ok(server) => {
                for divergence in cross_check(&pr_map, &server) {
                    debug!("personal record divergence: {divergence}");
                }
            }
            Err(err) => warn!("failed to read personal records for cross-check: {err}"),
        }

        Ok(pr_map)
    }
}

impl<R> ProgressionService for Service<R>
where
    R: ManualRecordRepository
        + UnifiedRecordRepository
        + ProgressionRepository
        + SettingsRepository,
{
    async fn get_progression(
        &self,
        user_id: UserID,
        exercise_key: &ExerciseKey,
    ) -> Result<Vec<ProgressionPoint>, ReadError> {
        let settings = self.settings().await;
        let (records, aggregated) = join(
            self.read_records(user_id, &RecordFilter::default()),
            self.repository
                .read_progression(user_id, exercise_key, settings.progression_limit),
        )
        .await;
        let (manual, session) = records?;
        let aggregated = aggregated.unwrap_or_else(|err| {
            warn!("failed to read progression of {exercise_key}: {err}");
            vec![]
        });
        Ok(progression_for(exercise_key, &manual, &aggregated, &session))
    }
}

impl<R> ActivityService for Service<R>
where
    R: ManualRecordRepository + UnifiedRecordRepository + SettingsRepository,
{
    async fn get_activity(&self, user_id: UserID) -> Result<Vec<ActivityRow>, ReadError> {
        let settings = self.settings().await;
        let (manual, session) = self.read_records(user_id, &RecordFilter::default()).await?;
        let pr_map = build_pr_map(&records(&manual, &session), settings.session_metric);
        let mut rows = merge_activity(&manual, &session, &pr_map, settings.session_metric);
        if let Some(limit) = settings.activity_limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}
