use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Postal/administrative address. Region granularity follows the Ethiopian
/// administrative divisions used by partner hubs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub city: Option<String>,
    pub region: Option<String>,
    pub subcity: Option<String>,
    pub woreda: Option<String>,
    pub kebele: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Identification {
    pub id_type: Option<String>,
    pub id_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Qualification {
    pub title: Option<String>,
    pub institution: Option<String>,
    pub year: Option<i32>,
    pub certificate: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageSkill {
    pub language: Option<String>,
    /// basic, conversational, fluent or native
    pub proficiency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyContact {
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Volunteer-facing profile: skills, qualifications and languages feed the
/// matching scorer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub photo: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub qualifications: Vec<Qualification>,
    pub languages: Vec<LanguageSkill>,
    pub emergency_contact: Option<EmergencyContact>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub language: Option<String>,
    pub notifications: Option<serde_json::Value>,
    pub availability: Vec<serde_json::Value>,
    pub interests: Vec<String>,
    pub preferred_regions: Vec<String>,
}

/// User model - SQL persistence layer.
///
/// Stats counters are flattened into columns so the reports dashboard can
/// aggregate without unpacking JSONB.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub phone: String,
    pub alternative_phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Json<Address>,
    pub identification: Json<Identification>,
    pub profile: Json<UserProfile>,
    pub preferences: Json<Preferences>,
    pub membership_status: String,
    pub membership_expiry: Option<DateTime<Utc>>,
    pub volunteer_status: String,
    pub total_hours: f64,
    pub activities_completed: i32,
    pub donations_made: i32,
    pub trainings_completed: i32,
    pub recognitions_received: i32,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub hub_affiliation: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial self-service profile update. Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub alternative_phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<Json<Address>>,
    pub identification: Option<Json<Identification>>,
    pub profile: Option<Json<UserProfile>>,
    pub preferences: Option<Json<Preferences>>,
}

impl User {
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert new user. The id and timestamps come from the database.
    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO users (
                name, email, password_hash, role, phone, alternative_phone,
                date_of_birth, gender, address, identification, profile,
                preferences, membership_status, membership_expiry,
                volunteer_status, hub_affiliation
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                     $13, $14, $15, $16)
             RETURNING *",
        )
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(&self.role)
        .bind(&self.phone)
        .bind(&self.alternative_phone)
        .bind(self.date_of_birth)
        .bind(&self.gender)
        .bind(&self.address)
        .bind(&self.identification)
        .bind(&self.profile)
        .bind(&self.preferences)
        .bind(&self.membership_status)
        .bind(self.membership_expiry)
        .bind(&self.volunteer_status)
        .bind(self.hub_affiliation)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Apply a partial profile update; absent fields are left untouched.
    pub async fn update_profile(
        id: Uuid,
        update: &ProfileUpdate,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE users SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                alternative_phone = COALESCE($4, alternative_phone),
                date_of_birth = COALESCE($5, date_of_birth),
                gender = COALESCE($6, gender),
                address = COALESCE($7, address),
                identification = COALESCE($8, identification),
                profile = COALESCE($9, profile),
                preferences = COALESCE($10, preferences),
                updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.phone)
        .bind(&update.alternative_phone)
        .bind(update.date_of_birth)
        .bind(&update.gender)
        .bind(&update.address)
        .bind(&update.identification)
        .bind(&update.profile)
        .bind(&update.preferences)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn touch_last_login(id: Uuid, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Active volunteers passing the SQL-filterable matching criteria.
    ///
    /// Birth-date bounds implement the age window; volunteers without a
    /// recorded date of birth are excluded when a bound is set.
    pub async fn find_match_candidates(
        gender: Option<&str>,
        born_on_or_before: Option<NaiveDate>,
        born_on_or_after: Option<NaiveDate>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM users
             WHERE role = 'volunteer'
               AND volunteer_status = 'active'
               AND ($1::text IS NULL OR gender = $1)
               AND ($2::date IS NULL OR date_of_birth <= $2)
               AND ($3::date IS NULL OR date_of_birth >= $3)",
        )
        .bind(gender)
        .bind(born_on_or_before)
        .bind(born_on_or_after)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Subset of `ids` that are active volunteers (for placement approval).
    pub async fn find_active_volunteers_by_ids(ids: &[Uuid], pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM users
             WHERE id = ANY($1)
               AND role = 'volunteer'
               AND volunteer_status = 'active'",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_by_role(role: &str, pool: &PgPool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Top volunteers ranked by accumulated hours (for the dashboard).
    pub async fn top_volunteers(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM users
             WHERE role = 'volunteer'
             ORDER BY total_hours DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Record a completed activity against the user's stats counters.
    pub async fn add_completed_activity(id: Uuid, hours: f64, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE users
             SET total_hours = total_hours + $2,
                 activities_completed = activities_completed + 1,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(hours)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn increment_donations(id: Uuid, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE users SET donations_made = donations_made + 1, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn increment_recognitions(id: Uuid, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE users SET recognitions_received = recognitions_received + 1,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Store a profile photo (used by self-service ID card issuance).
    pub async fn set_profile_photo(id: Uuid, photo: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE users
             SET profile = jsonb_set(profile, '{photo}', to_jsonb($2::text)),
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(photo)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_decodes_from_empty_object() {
        let profile: UserProfile = serde_json::from_str("{}").unwrap();
        assert!(profile.skills.is_empty());
        assert!(profile.photo.is_none());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Abebe".to_string(),
            email: "abebe@example.org".to_string(),
            password_hash: "secret-hash".to_string(),
            role: "volunteer".to_string(),
            phone: "+251911000000".to_string(),
            alternative_phone: None,
            date_of_birth: None,
            gender: None,
            address: Json(Address::default()),
            identification: Json(Identification::default()),
            profile: Json(UserProfile::default()),
            preferences: Json(Preferences::default()),
            membership_status: "none".to_string(),
            membership_expiry: None,
            volunteer_status: "active".to_string(),
            total_hours: 0.0,
            activities_completed: 0,
            donations_made: 0,
            trainings_completed: 0,
            recognitions_received: 0,
            verified: false,
            verified_at: None,
            last_login_at: None,
            hub_affiliation: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "abebe@example.org");
    }
}
