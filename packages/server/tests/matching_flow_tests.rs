//! End-to-end matching flow at the model layer: hub onboarding, request
//! posting, candidate filtering, scoring and placement creation.

mod common;

use chrono::NaiveDate;
use sqlx::types::Json;
use uuid::Uuid;

use server_core::domains::hubs::{
    Hub, MatchCriteria, NewHub, NewVolunteerRequest, VolunteerRequest,
};
use server_core::domains::matching::{rank_candidates, CandidateProfile};
use server_core::domains::placements::Placement;
use server_core::domains::users::{Qualification, User};

fn sample_hub() -> NewHub {
    let tag = Uuid::new_v4().simple().to_string();
    NewHub {
        name: format!("Hub {}", &tag[..6]),
        organization_type: "ngo".to_string(),
        email: format!("hub-{tag}@example.org"),
        phone: "+251911555555".to_string(),
        address: Json(Default::default()),
        contact_person: Json(Default::default()),
        description: None,
        website: None,
        social_media: Json(Default::default()),
        capacity: 20,
    }
}

fn sample_request(skills: &[&str], criteria: MatchCriteria) -> NewVolunteerRequest {
    NewVolunteerRequest {
        title: "Community health outreach".to_string(),
        description: None,
        category: Some("health".to_string()),
        required_skills: skills.iter().map(|s| s.to_string()).collect(),
        criteria: Json(criteria),
        start_date: None,
        end_date: None,
        location: Json(Default::default()),
        number_of_volunteers: 2,
        priority: "high".to_string(),
        compensation: Json(Default::default()),
    }
}

async fn volunteer_with_skills(
    skills: &[&str],
    hours: f64,
    pool: &sqlx::PgPool,
) -> User {
    let mut user = common::sample_user("volunteer");
    user.profile.0.skills = skills.iter().map(|s| s.to_string()).collect();
    user.profile.0.qualifications = vec![Qualification {
        title: Some("Nursing Diploma".to_string()),
        institution: None,
        year: None,
        certificate: None,
    }];
    let user = user.insert(pool).await.unwrap();
    if hours > 0.0 {
        User::add_completed_activity(user.id, hours, pool).await.unwrap();
    }
    User::find_by_id(user.id, pool).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_hub_approval_sets_verified() {
    let pool = common::test_pool().await;

    let hub = Hub::insert(&sample_hub(), &pool).await.unwrap();
    assert_eq!(hub.status, "pending");
    assert!(!hub.verified);

    let approved = Hub::set_status(hub.id, "approved", &pool)
        .await
        .unwrap()
        .unwrap();
    assert!(approved.verified);

    let suspended = Hub::set_status(hub.id, "suspended", &pool)
        .await
        .unwrap()
        .unwrap();
    assert!(!suspended.verified);
}

#[tokio::test]
async fn test_match_and_fill_request() {
    let pool = common::test_pool().await;

    let hub = Hub::insert(&sample_hub(), &pool).await.unwrap();
    let request = VolunteerRequest::insert(
        hub.id,
        &sample_request(&["first aid"], MatchCriteria::default()),
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(request.status, "open");

    let matching = volunteer_with_skills(&["First Aid", "Cooking"], 50.0, &pool).await;
    let _non_matching = volunteer_with_skills(&["Accounting"], 200.0, &pool).await;

    let candidates = User::find_match_candidates(None, None, None, &pool)
        .await
        .unwrap();

    let (ranked, _) = rank_candidates(
        &request.required_skills,
        &request.criteria.0,
        candidates,
        request.number_of_volunteers as usize,
        CandidateProfile::from_user,
    );

    assert!(ranked.iter().any(|s| s.candidate.id == matching.id));
    assert!(ranked
        .iter()
        .all(|s| !s.candidate.profile.skills.contains(&"Accounting".to_string())));

    // Approve the match: fill the request and create placements.
    let admin = common::sample_user("admin").insert(&pool).await.unwrap();
    let filled =
        VolunteerRequest::mark_filled(request.id, admin.id, 1, &pool).await.unwrap();
    assert_eq!(filled.status, "filled");
    assert_eq!(filled.filled_by, Some(admin.id));
    assert!(filled.filled_at.is_some());

    let placement =
        Placement::insert_active(matching.id, hub.id, request.id, &request.title, &pool)
            .await
            .unwrap();
    assert_eq!(placement.status, "active");
    assert!(placement.start_date.is_some());
}

#[tokio::test]
async fn test_age_window_filters_candidates() {
    let pool = common::test_pool().await;

    let mut young = common::sample_user("volunteer");
    young.date_of_birth = NaiveDate::from_ymd_opt(2010, 1, 1);
    let young = young.insert(&pool).await.unwrap();

    let mut adult = common::sample_user("volunteer");
    adult.date_of_birth = NaiveDate::from_ymd_opt(1990, 1, 1);
    let adult = adult.insert(&pool).await.unwrap();

    // Born exactly on the cutoff: the bound is inclusive.
    let mut boundary = common::sample_user("volunteer");
    boundary.date_of_birth = NaiveDate::from_ymd_opt(2007, 6, 15);
    let boundary = boundary.insert(&pool).await.unwrap();

    // Born on or before 2007-06-15 (18+ as of 2025-06-15).
    let candidates = User::find_match_candidates(
        None,
        NaiveDate::from_ymd_opt(2007, 6, 15),
        None,
        &pool,
    )
    .await
    .unwrap();

    let ids: Vec<_> = candidates.iter().map(|u| u.id).collect();
    assert!(ids.contains(&adult.id));
    assert!(ids.contains(&boundary.id));
    assert!(!ids.contains(&young.id));
}

#[tokio::test]
async fn test_self_service_placement_fills_request() {
    let pool = common::test_pool().await;

    let hub = Hub::insert(&sample_hub(), &pool).await.unwrap();
    let mut new_request = sample_request(&[], MatchCriteria::default());
    new_request.number_of_volunteers = 1;
    let request = VolunteerRequest::insert(hub.id, &new_request, &pool).await.unwrap();

    let updated = VolunteerRequest::add_volunteer(request.id, &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.current_volunteers, 1);
    assert_eq!(updated.status, "filled");
}

#[tokio::test]
async fn test_open_requests_ordered_by_priority() {
    let pool = common::test_pool().await;

    let hub = Hub::insert(&sample_hub(), &pool).await.unwrap();

    let mut low = sample_request(&[], MatchCriteria::default());
    low.priority = "low".to_string();
    let low = VolunteerRequest::insert(hub.id, &low, &pool).await.unwrap();

    let mut urgent = sample_request(&[], MatchCriteria::default());
    urgent.priority = "urgent".to_string();
    let urgent = VolunteerRequest::insert(hub.id, &urgent, &pool).await.unwrap();

    let open = VolunteerRequest::list_open(&pool).await.unwrap();
    let low_pos = open.iter().position(|r| r.id == low.id).unwrap();
    let urgent_pos = open.iter().position(|r| r.id == urgent.id).unwrap();
    assert!(urgent_pos < low_pos);
}
