use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Per-dimension ratings on a 1..5 scale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ratings {
    pub punctuality: Option<i32>,
    pub teamwork: Option<i32>,
    pub communication: Option<i32>,
    pub problem_solving: Option<i32>,
    pub dedication: Option<i32>,
    pub overall: Option<i32>,
}

/// What the evaluation relates to (a placement, activity or training).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedTo {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub ref_id: Option<Uuid>,
}

/// Evaluation model - a structured assessment of a volunteer's performance.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub evaluator_id: Uuid,
    pub evaluation_type: String,
    pub related_to: Json<RelatedTo>,
    pub ratings: Json<Ratings>,
    pub comments: Option<String>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub recommendations: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_status() -> String {
    "submitted".to_string()
}

#[derive(Debug, Deserialize)]
pub struct NewEvaluation {
    pub user_id: Uuid,
    pub evaluation_type: String,
    #[serde(default)]
    pub related_to: Json<RelatedTo>,
    #[serde(default)]
    pub ratings: Json<Ratings>,
    pub comments: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    pub recommendations: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Evaluation {
    pub async fn insert(evaluator_id: Uuid, new: &NewEvaluation, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO evaluations (
                user_id, evaluator_id, evaluation_type, related_to, ratings,
                comments, strengths, areas_for_improvement, recommendations, status
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(new.user_id)
        .bind(evaluator_id)
        .bind(&new.evaluation_type)
        .bind(&new.related_to)
        .bind(&new.ratings)
        .bind(&new.comments)
        .bind(&new.strengths)
        .bind(&new.areas_for_improvement)
        .bind(&new.recommendations)
        .bind(&new.status)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Evaluations where the user is the subject.
    pub async fn list_for_user(user_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM evaluations WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
