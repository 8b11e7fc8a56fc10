//! Trainings, payments, ID cards and form fields against a real Postgres.

mod common;

use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use server_core::domains::communications::{Communication, NewCommunication};
use server_core::domains::form_fields::{FormField, NewFormField};
use server_core::domains::idcards::{card_type_for_role, generate_card_number, IdCard};
use server_core::domains::payments::{
    generate_transaction_id, MembershipType, NewMembershipType, NewPayment, Payment,
};
use server_core::domains::programs::Registration;
use server_core::domains::trainings::{NewTraining, Training};
use server_core::domains::users::User;
use server_core::server::routes::payments::settle_payment;

fn sample_training(max_participants: Option<i32>) -> NewTraining {
    NewTraining {
        title: "First aid basics".to_string(),
        description: None,
        category: Some("health".to_string()),
        level: "beginner".to_string(),
        instructor_id: None,
        start_date: None,
        end_date: None,
        duration: Some(8.0),
        location: None,
        max_participants,
        materials: Json(Vec::new()),
        prerequisites: Vec::new(),
        certification: Json(Default::default()),
        cost: Json(Default::default()),
    }
}

#[tokio::test]
async fn test_training_capacity_enforced() {
    let pool = common::test_pool().await;

    let instructor = common::sample_user("admin").insert(&pool).await.unwrap();
    let training = Training::insert(&sample_training(Some(1)), instructor.id, &pool)
        .await
        .unwrap();
    assert_eq!(training.instructor_id, Some(instructor.id));

    let first = common::sample_user("volunteer").insert(&pool).await.unwrap();
    let second = common::sample_user("volunteer").insert(&pool).await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let claimed = Training::claim_slot(training.id, &mut tx).await.unwrap();
    assert!(claimed.is_some());
    Registration::insert_tx(first.id, "training", training.id, "confirmed", &mut tx)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    // Second registration hits the cap.
    let mut tx = pool.begin().await.unwrap();
    let claimed = Training::claim_slot(training.id, &mut tx).await.unwrap();
    assert!(claimed.is_none());
    tx.rollback().await.unwrap();

    assert!(
        Registration::exists(first.id, "training", training.id, &pool)
            .await
            .unwrap()
    );
    assert!(
        !Registration::exists(second.id, "training", training.id, &pool)
            .await
            .unwrap()
    );

    let mine = Training::list_for_user(first.id, &pool).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, training.id);
}

#[tokio::test]
async fn test_duplicate_registration_rejected_by_constraint() {
    let pool = common::test_pool().await;

    let user = common::sample_user("volunteer").insert(&pool).await.unwrap();
    let target = Uuid::new_v4();

    let first = Registration::insert(user.id, "event", target, "pending", &pool)
        .await
        .unwrap();

    // A second live registration for the same target trips the partial
    // unique index even without the handler's exists check.
    let duplicate = Registration::insert(user.id, "event", target, "pending", &pool).await;
    assert!(duplicate.is_err());

    // Cancelled rows do not block signing up again.
    sqlx::query("UPDATE registrations SET status = 'cancelled' WHERE id = $1")
        .bind(first.id)
        .execute(&pool)
        .await
        .unwrap();

    Registration::insert(user.id, "event", target, "pending", &pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_membership_type_listing_and_update() {
    let pool = common::test_pool().await;

    let new = NewMembershipType {
        name: format!("Annual {}", Uuid::new_v4().simple()),
        description: None,
        amount: 500.0,
        currency: "ETB".to_string(),
        duration: 1,
        duration_type: "year".to_string(),
        benefits: vec!["newsletter".to_string()],
        active: true,
        sort_order: 1,
    };
    let tier = MembershipType::insert(&new, &pool).await.unwrap();

    let mut replacement = new;
    replacement.active = false;
    let updated = MembershipType::update(tier.id, &replacement, &pool)
        .await
        .unwrap()
        .unwrap();
    assert!(!updated.active);

    let active_only = MembershipType::list(false, &pool).await.unwrap();
    assert!(active_only.iter().all(|t| t.id != tier.id));

    let all = MembershipType::list(true, &pool).await.unwrap();
    assert!(all.iter().any(|t| t.id == tier.id));

    assert!(MembershipType::delete(tier.id, &pool).await.unwrap());
    assert!(!MembershipType::delete(tier.id, &pool).await.unwrap());
}

#[tokio::test]
async fn test_payment_lifecycle() {
    let pool = common::test_pool().await;

    let user = common::sample_user("member").insert(&pool).await.unwrap();

    let new = NewPayment {
        payment_type: "donation".to_string(),
        amount: 250.0,
        currency: "ETB".to_string(),
        method: "telebirr".to_string(),
        payment_provider: None,
        metadata: Json(serde_json::json!({})),
        description: None,
        related_to: Json(Default::default()),
    };
    let transaction_id = generate_transaction_id(Utc::now());
    let payment = Payment::insert(Some(user.id), &new, &transaction_id, "processing", &pool)
        .await
        .unwrap();
    assert_eq!(payment.status, "processing");
    assert!(payment.processed_at.is_none());

    let settled = Payment::mark_completed(payment.id, &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.status, "completed");
    assert!(settled.processed_at.is_some());

    let found = Payment::find_by_transaction_id(&transaction_id, &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, payment.id);

    // Same transaction id again trips the unique constraint.
    let duplicate = Payment::insert(Some(user.id), &new, &transaction_id, "pending", &pool).await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn test_settlement_bumps_payer_donation_count() {
    let pool = common::test_pool().await;

    let user = common::sample_user("member").insert(&pool).await.unwrap();

    let new = NewPayment {
        payment_type: "membership_fee".to_string(),
        amount: 500.0,
        currency: "ETB".to_string(),
        method: "cbe".to_string(),
        payment_provider: None,
        metadata: Json(serde_json::json!({})),
        description: None,
        related_to: Json(Default::default()),
    };
    let transaction_id = generate_transaction_id(Utc::now());
    let payment = Payment::insert(Some(user.id), &new, &transaction_id, "processing", &pool)
        .await
        .unwrap();

    // Settlement credits the payer regardless of payment type.
    settle_payment(payment.id, payment.user_id, &pool).await.unwrap();

    let settled = Payment::find_by_transaction_id(&transaction_id, &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.status, "completed");

    let reloaded = User::find_by_id(user.id, &pool).await.unwrap().unwrap();
    assert_eq!(reloaded.donations_made, 1);
}

#[tokio::test]
async fn test_communication_delivery_outcomes() {
    let pool = common::test_pool().await;

    let admin = common::sample_user("admin").insert(&pool).await.unwrap();

    let new = NewCommunication {
        channel: "email".to_string(),
        subject: Some("Volunteer day".to_string()),
        content: "This Saturday at the hub.".to_string(),
        recipients: Json(Default::default()),
        scheduled_at: None,
        attachments: Json(Vec::new()),
    };
    let queued = Communication::insert(admin.id, &new, "sending", &pool)
        .await
        .unwrap();
    assert_eq!(queued.status, "sending");

    let sent = Communication::mark_sent(queued.id, 42, &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sent.status, "sent");
    assert_eq!(sent.sent_count, 42);
    assert!(sent.sent_at.is_some());

    // A delivery that cannot resolve its audience lands in failed, not
    // stuck in sending.
    let stuck = Communication::insert(admin.id, &new, "sending", &pool)
        .await
        .unwrap();
    let failed = Communication::mark_failed(stuck.id, &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.status, "failed");
    assert!(failed.sent_at.is_none());
}

#[tokio::test]
async fn test_id_card_issue_and_public_lookup() {
    let pool = common::test_pool().await;

    let user = common::sample_user("volunteer").insert(&pool).await.unwrap();

    assert!(IdCard::find_active_for_user(user.id, &pool)
        .await
        .unwrap()
        .is_none());

    let card_type = card_type_for_role(&user.role);
    let card_number = generate_card_number(card_type, Utc::now());
    let card = IdCard::insert(
        user.id,
        &card_number,
        card_type,
        None,
        None,
        Some("photo.jpg"),
        "{}",
        &Json(Default::default()),
        &pool,
    )
    .await
    .unwrap();
    assert_eq!(card.status, "active");

    let active = IdCard::find_active_for_user(user.id, &pool).await.unwrap();
    assert_eq!(active.unwrap().id, card.id);

    let public = IdCard::find_public_by_card_number(&card_number, &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(public.card_number, card_number);
    assert_eq!(public.holder_name, user.name);

    assert!(
        IdCard::find_public_by_card_number("VNXX000000NOPE", &pool)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_form_field_unique_key_and_reorder() {
    let pool = common::test_pool().await;

    let admin = common::sample_user("admin").insert(&pool).await.unwrap();
    let key_a = format!("field_{}", Uuid::new_v4().simple());
    let key_b = format!("field_{}", Uuid::new_v4().simple());

    let new_field = |key: &str, order: i32| NewFormField {
        form_type: "volunteer".to_string(),
        field_key: key.to_string(),
        field_type: "text".to_string(),
        label: "Label".to_string(),
        placeholder: None,
        description: None,
        required: false,
        options: Json(Vec::new()),
        validation: Json(Default::default()),
        default_value: None,
        sort_order: order,
        section: None,
        admin_only: false,
    };

    let a = FormField::insert(admin.id, &new_field(&key_a, 0), &pool).await.unwrap();
    let b = FormField::insert(admin.id, &new_field(&key_b, 1), &pool).await.unwrap();

    // Duplicate key on the same form type is rejected.
    assert!(FormField::insert(admin.id, &new_field(&key_a, 5), &pool)
        .await
        .is_err());

    FormField::reorder("volunteer", &[b.id, a.id], admin.id, &pool)
        .await
        .unwrap();

    let fields = FormField::list_all("volunteer", &pool).await.unwrap();
    let pos_a = fields.iter().position(|f| f.id == a.id).unwrap();
    let pos_b = fields.iter().position(|f| f.id == b.id).unwrap();
    assert!(pos_b < pos_a);

    // Soft delete hides the field from the public listing only.
    assert!(FormField::deactivate(a.id, admin.id, &pool).await.unwrap());
    let active = FormField::list_active("volunteer", &pool).await.unwrap();
    assert!(active.iter().all(|f| f.id != a.id));
    let all = FormField::list_all("volunteer", &pool).await.unwrap();
    assert!(all.iter().any(|f| f.id == a.id));
}
