use axum::extract::{Extension, Path};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{ApiError, Items};
use crate::domains::hubs::VolunteerRequest;
use crate::domains::matching::{rank_candidates, CandidateProfile};
use crate::domains::placements::Placement;
use crate::domains::users::User;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

pub fn router() -> Router {
    Router::new()
        .route("/match/:request_id", post(match_handler))
        .route("/approve/:request_id", post(approve_handler))
        .route("/pending", get(pending_handler))
}

#[derive(Debug, Serialize)]
pub struct MatchedVolunteer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: Vec<String>,
    pub total_hours: f64,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub request_id: Uuid,
    pub matches: Vec<MatchedVolunteer>,
    pub total_matches: usize,
}

/// Birth date of someone turning `age` today. Used to translate the age
/// window into date-of-birth bounds.
fn birth_date_for_age(today: NaiveDate, age: i32) -> Option<NaiveDate> {
    today.checked_sub_months(Months::new((age.max(0) as u32) * 12))
}

/// Date-of-birth bounds for an age window. The lower bound uses
/// `age_max + 1` years so volunteers currently aged exactly `age_max`
/// stay inside until their next birthday.
fn age_window(
    today: NaiveDate,
    age_min: Option<i32>,
    age_max: Option<i32>,
) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let born_on_or_before = age_min.and_then(|age| birth_date_for_age(today, age));
    let born_on_or_after = age_max.and_then(|age| birth_date_for_age(today, age + 1));
    (born_on_or_before, born_on_or_after)
}

/// Run the matching pipeline for an open request: SQL filter on age and
/// gender, then skill/qualification/language overlap and weighted scoring.
pub async fn match_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<MatchResponse>, ApiError> {
    auth.ensure_coordinator()?;

    let request = VolunteerRequest::find_by_id(request_id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Volunteer request"))?;

    if request.status != "open" {
        return Err(ApiError::BadRequest(
            "Request is not open for matching".to_string(),
        ));
    }

    let criteria = &request.criteria.0;
    let today = Utc::now().date_naive();
    let (born_on_or_before, born_on_or_after) = age_window(today, criteria.age_min, criteria.age_max);
    let gender = criteria
        .gender
        .as_deref()
        .filter(|g| !g.is_empty() && *g != "any");

    let candidates =
        User::find_match_candidates(gender, born_on_or_before, born_on_or_after, &state.db_pool)
            .await?;

    let (ranked, total_matches) = rank_candidates(
        &request.required_skills,
        criteria,
        candidates,
        request.number_of_volunteers.max(0) as usize,
        CandidateProfile::from_user,
    );

    let matches = ranked
        .into_iter()
        .map(|scored| MatchedVolunteer {
            id: scored.candidate.id,
            name: scored.candidate.name.clone(),
            email: scored.candidate.email.clone(),
            phone: scored.candidate.phone.clone(),
            skills: scored.candidate.profile.skills.clone(),
            total_hours: scored.candidate.total_hours,
            score: scored.score,
        })
        .collect();

    Ok(Json(MatchResponse {
        request_id,
        matches,
        total_matches,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub volunteer_ids: Vec<Uuid>,
}

/// Approve a set of matched volunteers: the request is marked filled and an
/// active placement is created for each volunteer.
pub async fn approve_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<Items<Placement>>, ApiError> {
    auth.ensure_coordinator()?;

    if req.volunteer_ids.is_empty() {
        return Err(ApiError::BadRequest("volunteer_ids is empty".to_string()));
    }

    let request = VolunteerRequest::find_by_id(request_id, &state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("Volunteer request"))?;

    let volunteers =
        User::find_active_volunteers_by_ids(&req.volunteer_ids, &state.db_pool).await?;
    if volunteers.len() != req.volunteer_ids.len() {
        return Err(ApiError::BadRequest(
            "All ids must refer to active volunteers".to_string(),
        ));
    }

    VolunteerRequest::mark_filled(
        request.id,
        auth.user_id,
        volunteers.len() as i32,
        &state.db_pool,
    )
    .await?;

    let mut placements = Vec::with_capacity(volunteers.len());
    for volunteer in &volunteers {
        let placement = Placement::insert_active(
            volunteer.id,
            request.hub_id,
            request.id,
            &request.title,
            &state.db_pool,
        )
        .await?;
        placements.push(placement);
    }

    tracing::info!(
        request_id = %request.id,
        volunteers = placements.len(),
        "Volunteer request filled"
    );

    Ok(Json(Items::new(placements)))
}

/// Open requests awaiting matching, most urgent first.
pub async fn pending_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
) -> Result<Json<Items<VolunteerRequest>>, ApiError> {
    auth.ensure_coordinator()?;
    let requests = VolunteerRequest::list_open(&state.db_pool).await?;
    Ok(Json(Items::new(requests)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_birth_date_for_age() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(
            birth_date_for_age(today, 18),
            Some(NaiveDate::from_ymd_opt(2007, 6, 15).unwrap())
        );
        assert_eq!(birth_date_for_age(today, 0), Some(today));
    }

    #[test]
    fn test_age_window_includes_exact_age_max() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let (before, after) = age_window(today, Some(18), Some(25));

        assert_eq!(before, Some(NaiveDate::from_ymd_opt(2007, 6, 15).unwrap()));
        // Lower bound spans the whole 25th year.
        assert_eq!(after, Some(NaiveDate::from_ymd_opt(1999, 6, 15).unwrap()));

        // Someone who turned 25 yesterday is still inside the window.
        let aged_25 = NaiveDate::from_ymd_opt(2000, 6, 14).unwrap();
        assert!(aged_25 >= after.unwrap());
        assert!(aged_25 <= before.unwrap());
    }

    #[test]
    fn test_age_window_open_ends() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(age_window(today, None, None), (None, None));

        let (before, after) = age_window(today, Some(18), None);
        assert!(before.is_some());
        assert!(after.is_none());
    }
}
