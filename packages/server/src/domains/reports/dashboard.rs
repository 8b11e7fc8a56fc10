use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::activities::Activity;
use crate::domains::hubs::{Hub, VolunteerRequest};
use crate::domains::payments::Payment;
use crate::domains::placements::Placement;
use crate::domains::recognitions::Recognition;
use crate::domains::trainings::Training;
use crate::domains::users::User;

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub volunteers: i64,
    pub members: i64,
    pub approved_hubs: i64,
    pub active_placements: i64,
    pub completed_activities: i64,
    pub total_hours: f64,
    pub completed_donations: i64,
    pub open_requests: i64,
    pub completed_trainings: i64,
    pub featured_recognitions: i64,
}

#[derive(Debug, Serialize)]
pub struct TopVolunteer {
    pub id: Uuid,
    pub name: String,
    pub total_hours: f64,
    pub activities_completed: i32,
}

#[derive(Debug, Serialize)]
pub struct RegionCount {
    pub region: Option<String>,
    pub count: i64,
}

/// Admin dashboard payload: headline counts, the latest completed
/// activities, the volunteer leaderboard and the hub map.
#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub summary: DashboardSummary,
    pub recent_activities: Vec<Activity>,
    pub top_volunteers: Vec<TopVolunteer>,
    pub hub_distribution: Vec<RegionCount>,
}

impl DashboardReport {
    /// Assemble the dashboard in one round of concurrent queries. The date
    /// window narrows the activity counts only; headline totals stay global.
    pub async fn build(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        pool: &PgPool,
    ) -> Result<Self> {
        let (
            volunteers,
            members,
            approved_hubs,
            active_placements,
            completed_activities,
            total_hours,
            completed_donations,
            open_requests,
        ) = tokio::try_join!(
            User::count_by_role("volunteer", pool),
            User::count_by_role("member", pool),
            Hub::count_by_status("approved", pool),
            Placement::count_active(pool),
            Activity::count_completed(from, to, pool),
            Activity::sum_hours(from, to, pool),
            Payment::count_completed_donations(pool),
            VolunteerRequest::count_open(pool),
        )?;

        let (completed_trainings, featured_recognitions, recent_activities, top, regions) =
            tokio::try_join!(
                Training::count_completed(pool),
                Recognition::count_featured(pool),
                Activity::recent_completed(10, pool),
                User::top_volunteers(10, pool),
                Hub::region_distribution(pool),
            )?;

        Ok(Self {
            summary: DashboardSummary {
                volunteers,
                members,
                approved_hubs,
                active_placements,
                completed_activities,
                total_hours,
                completed_donations,
                open_requests,
                completed_trainings,
                featured_recognitions,
            },
            recent_activities,
            top_volunteers: top
                .into_iter()
                .map(|u| TopVolunteer {
                    id: u.id,
                    name: u.name,
                    total_hours: u.total_hours,
                    activities_completed: u.activities_completed,
                })
                .collect(),
            hub_distribution: regions
                .into_iter()
                .map(|(region, count)| RegionCount { region, count })
                .collect(),
        })
    }
}
