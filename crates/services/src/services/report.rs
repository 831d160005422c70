//! Activity reports for supervisors and the read-only client view.

use db::models::{
    cleaning_activity::{ActivityStatus, ActivitySummary, CleaningActivity},
    deficiency::Deficiency,
    organisation::Organisation,
    room_task::{RoomTask, RoomTaskDetail, RoomTaskStatus},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    auth::{CLIENT, STAFF, Scope},
    error::{ActionError, Found, StoreContext},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct StatusCounts {
    pub not_started: i64,
    pub in_progress: i64,
    pub done: i64,
    pub inspected_pass: i64,
    pub inspected_fail: i64,
    pub has_issues: i64,
}

impl StatusCounts {
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a RoomTaskStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            let slot = match status {
                RoomTaskStatus::NotStarted => &mut counts.not_started,
                RoomTaskStatus::InProgress => &mut counts.in_progress,
                RoomTaskStatus::Done => &mut counts.done,
                RoomTaskStatus::InspectedPass => &mut counts.inspected_pass,
                RoomTaskStatus::InspectedFail => &mut counts.inspected_fail,
                RoomTaskStatus::HasIssues => &mut counts.has_issues,
            };
            *slot += 1;
        }
        counts
    }

    pub fn inspected(&self) -> i64 {
        self.inspected_pass + self.inspected_fail
    }

    /// Passes over inspected rooms, as a percentage. `None` before any inspection.
    pub fn pass_rate(&self) -> Option<f64> {
        match self.inspected() {
            0 => None,
            inspected => Some(self.inspected_pass as f64 * 100.0 / inspected as f64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ActivityReport {
    pub activity: ActivitySummary,
    pub counts: StatusCounts,
    pub inspected: i64,
    pub pass_rate: Option<f64>,
    pub pass_rate_threshold: i64,
    pub meets_threshold: Option<bool>,
    pub open_deficiencies: i64,
    pub tasks: Vec<RoomTaskDetail>,
}

#[derive(Clone)]
pub struct ReportService {
    pool: SqlitePool,
}

impl ReportService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn build(
        &self,
        organisation: &Organisation,
        activity: ActivitySummary,
    ) -> Result<ActivityReport, ActionError> {
        let tasks = RoomTask::find_details_by_activity(&self.pool, organisation.id, activity.activity.id)
            .await
            .store("Failed to load report")?;
        let open_deficiencies =
            Deficiency::count_open_for_activity(&self.pool, organisation.id, activity.activity.id)
                .await
                .store("Failed to load report")?;

        let counts = StatusCounts::tally(tasks.iter().map(|detail| &detail.task.status));
        let pass_rate = counts.pass_rate();
        Ok(ActivityReport {
            activity,
            inspected: counts.inspected(),
            pass_rate,
            pass_rate_threshold: organisation.pass_rate_threshold,
            meets_threshold: pass_rate.map(|rate| rate >= organisation.pass_rate_threshold as f64),
            open_deficiencies,
            counts,
            tasks,
        })
    }

    pub async fn activity_report(
        &self,
        scope: &Scope,
        activity_id: Uuid,
    ) -> Result<ActivityReport, ActionError> {
        scope.require(STAFF)?;
        let activity = CleaningActivity::find_summary(&self.pool, scope.org_id(), activity_id)
            .await
            .store("Failed to load report")?
            .found("Activity")?;
        self.build(&scope.organisation, activity).await
    }

    /// Closed activities in the calling client's buildings, newest first.
    pub async fn client_reports(&self, scope: &Scope) -> Result<Vec<ActivityReport>, ActionError> {
        scope.require(CLIENT)?;
        let client_id = scope.client_id.ok_or(ActionError::Unauthorized)?;
        let activities = CleaningActivity::find_summaries(
            &self.pool,
            scope.org_id(),
            Some(ActivityStatus::Closed),
            Some(client_id),
        )
        .await
        .store("Failed to load reports")?;

        let mut reports = Vec::with_capacity(activities.len());
        for activity in activities {
            reports.push(self.build(&scope.organisation, activity).await?);
        }
        Ok(reports)
    }

    pub async fn client_report(
        &self,
        scope: &Scope,
        activity_id: Uuid,
    ) -> Result<ActivityReport, ActionError> {
        scope.require(CLIENT)?;
        let client_id = scope.client_id.ok_or(ActionError::Unauthorized)?;
        let activity = CleaningActivity::find_summary(&self.pool, scope.org_id(), activity_id)
            .await
            .store("Failed to load report")?
            .filter(|summary| {
                summary.client_id == client_id && summary.activity.status == ActivityStatus::Closed
            })
            .found("Activity")?;
        self.build(&scope.organisation, activity).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use db::models::{
        cleaning_activity::CreateCleaningActivity,
        room_task::InspectionOutcome,
    };

    use super::*;
    use crate::services::{
        activity::{ActivityService, AssignRoomTask},
        room_task::{InspectRoomTask, RoomTaskService},
        test_support::Fixture,
    };

    #[test]
    fn pass_rate_is_passes_over_inspected() {
        let counts = StatusCounts::tally(&[
            RoomTaskStatus::InspectedPass,
            RoomTaskStatus::InspectedPass,
            RoomTaskStatus::InspectedPass,
            RoomTaskStatus::InspectedFail,
            RoomTaskStatus::Done,
        ]);
        assert_eq!(counts.inspected(), 4);
        assert_eq!(counts.pass_rate(), Some(75.0));
        assert_eq!(StatusCounts::default().pass_rate(), None);
    }

    #[tokio::test]
    async fn closed_activity_reports_reach_the_client() {
        let fx = Fixture::new().await;
        let sup = fx.supervisor();
        let activities = ActivityService::new(fx.pool());
        let tasks = RoomTaskService::new(fx.pool());

        let detail = activities
            .create(
                &sup,
                &CreateCleaningActivity {
                    floor_id: fx.floor_id,
                    name: "Month end".to_string(),
                    scheduled_date: NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
                    window_start: None,
                    window_end: None,
                    notes: None,
                    template_id: None,
                },
            )
            .await
            .unwrap();
        let activity_id = detail.summary.activity.id;
        for task in &detail.tasks {
            activities
                .assign_task(&sup, task.task.id, &AssignRoomTask { user_id: Some(fx.janitor_id) })
                .await
                .unwrap();
        }
        activities.publish(&sup, activity_id).await.unwrap();
        for (detail, outcome) in detail.tasks.iter().zip([InspectionOutcome::Pass, InspectionOutcome::Fail]) {
            tasks.complete(&fx.janitor(), detail.task.id).await.unwrap();
            tasks
                .inspect(
                    &sup,
                    detail.task.id,
                    &InspectRoomTask {
                        outcome,
                        note: None,
                        deficiency: None,
                    },
                )
                .await
                .unwrap();
        }

        let service = ReportService::new(fx.pool());
        let report = service.activity_report(&sup, activity_id).await.unwrap();
        assert_eq!(report.inspected, 2);
        assert_eq!(report.pass_rate, Some(50.0));
        assert_eq!(report.pass_rate_threshold, 80);
        assert_eq!(report.meets_threshold, Some(false));

        assert!(service.client_reports(&fx.client()).await.unwrap().is_empty());
        activities.close(&sup, activity_id).await.unwrap();
        let reports = service.client_reports(&fx.client()).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].counts.inspected_fail, 1);

        let err = service.activity_report(&fx.client(), activity_id).await.unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));
    }
}
