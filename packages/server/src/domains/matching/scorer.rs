//! Pure scoring functions for volunteer matching.
//!
//! These functions contain NO side effects - they implement the business
//! logic for filtering candidate volunteers against a request's criteria and
//! ranking them by a weighted match score. Age and gender filtering happen
//! in SQL before candidates reach this module.
//!
//! Score composition (max 100):
//! - required-skill overlap, up to 40
//! - accumulated volunteer hours, up to 20 (capped at 100 hours)
//! - qualification overlap, up to 20
//! - language overlap, up to 20
//!
//! The score only ranks candidates for manual admin approval; it is never a
//! hard threshold.

use crate::domains::hubs::MatchCriteria;
use crate::domains::users::User;

pub const SKILL_WEIGHT: f64 = 40.0;
pub const EXPERIENCE_WEIGHT: f64 = 20.0;
pub const QUALIFICATION_WEIGHT: f64 = 20.0;
pub const LANGUAGE_WEIGHT: f64 = 20.0;

/// Hours at which the experience term saturates.
pub const EXPERIENCE_HOURS_CAP: f64 = 100.0;

/// Extra candidates returned beyond the requested headcount, so admins have
/// alternates to choose from.
pub const CANDIDATE_BUFFER: usize = 5;

/// The matching-relevant slice of a volunteer's profile.
#[derive(Debug, Clone, Default)]
pub struct CandidateProfile {
    pub skills: Vec<String>,
    pub total_hours: f64,
    pub qualification_titles: Vec<String>,
    pub languages: Vec<String>,
}

impl CandidateProfile {
    pub fn from_user(user: &User) -> Self {
        Self {
            skills: user.profile.skills.clone(),
            total_hours: user.total_hours,
            qualification_titles: user
                .profile
                .qualifications
                .iter()
                .filter_map(|q| q.title.clone())
                .collect(),
            languages: user
                .profile
                .languages
                .iter()
                .filter_map(|l| l.language.clone())
                .collect(),
        }
    }
}

/// A candidate that passed all hard criteria, with its match score.
#[derive(Debug)]
pub struct ScoredCandidate<T> {
    pub candidate: T,
    pub score: f64,
}

/// Case-insensitive substring match: a held attribute satisfies a required
/// one when it contains it ("amharic (native)" satisfies "amharic").
fn matches_requirement(held: &str, required: &str) -> bool {
    held.to_lowercase().contains(&required.to_lowercase())
}

/// Number of required entries satisfied by at least one held entry.
fn overlap_count(required: &[String], held: &[String]) -> usize {
    required
        .iter()
        .filter(|req| held.iter().any(|h| matches_requirement(h, req)))
        .count()
}

/// Hard filter: candidates failing any specified overlap criterion are
/// excluded entirely, regardless of score.
pub fn meets_criteria(
    required_skills: &[String],
    criteria: &MatchCriteria,
    candidate: &CandidateProfile,
) -> bool {
    if !required_skills.is_empty() && overlap_count(required_skills, &candidate.skills) == 0 {
        return false;
    }
    if !criteria.qualifications.is_empty()
        && overlap_count(&criteria.qualifications, &candidate.qualification_titles) == 0
    {
        return false;
    }
    if !criteria.languages.is_empty()
        && overlap_count(&criteria.languages, &candidate.languages) == 0
    {
        return false;
    }
    true
}

/// Weighted match score in [0, 100].
pub fn score_candidate(
    required_skills: &[String],
    criteria: &MatchCriteria,
    candidate: &CandidateProfile,
) -> f64 {
    let mut score = 0.0;

    if !required_skills.is_empty() {
        let matched = overlap_count(required_skills, &candidate.skills) as f64;
        score += matched / required_skills.len() as f64 * SKILL_WEIGHT;
    }

    score += (candidate.total_hours / EXPERIENCE_HOURS_CAP * EXPERIENCE_WEIGHT)
        .min(EXPERIENCE_WEIGHT)
        .max(0.0);

    if !criteria.qualifications.is_empty() {
        let matched =
            overlap_count(&criteria.qualifications, &candidate.qualification_titles) as f64;
        score += matched / criteria.qualifications.len() as f64 * QUALIFICATION_WEIGHT;
    }

    if !criteria.languages.is_empty() {
        let matched = overlap_count(&criteria.languages, &candidate.languages) as f64;
        score += matched / criteria.languages.len() as f64 * LANGUAGE_WEIGHT;
    }

    score
}

/// Filter, score and rank candidates for a request.
///
/// Returns the top `headcount + CANDIDATE_BUFFER` scored candidates (best
/// first) and the total number of candidates that passed the hard filter.
pub fn rank_candidates<T>(
    required_skills: &[String],
    criteria: &MatchCriteria,
    candidates: Vec<T>,
    headcount: usize,
    profile_of: impl Fn(&T) -> CandidateProfile,
) -> (Vec<ScoredCandidate<T>>, usize) {
    let mut scored: Vec<ScoredCandidate<T>> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let profile = profile_of(&candidate);
            if !meets_criteria(required_skills, criteria, &profile) {
                return None;
            }
            let score = score_candidate(required_skills, criteria, &profile);
            Some(ScoredCandidate { candidate, score })
        })
        .collect();

    let total_matches = scored.len();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(headcount + CANDIDATE_BUFFER);

    (scored, total_matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn candidate(
        candidate_skills: &[&str],
        hours: f64,
        quals: &[&str],
        langs: &[&str],
    ) -> CandidateProfile {
        CandidateProfile {
            skills: skills(candidate_skills),
            total_hours: hours,
            qualification_titles: skills(quals),
            languages: skills(langs),
        }
    }

    #[test]
    fn test_full_skill_overlap_scores_skill_weight() {
        let required = skills(&["first aid", "logistics"]);
        let c = candidate(&["First Aid", "Logistics"], 0.0, &[], &[]);
        let score = score_candidate(&required, &MatchCriteria::default(), &c);
        assert_eq!(score, SKILL_WEIGHT);
    }

    #[test]
    fn test_partial_skill_overlap_is_proportional() {
        let required = skills(&["first aid", "logistics"]);
        let c = candidate(&["first aid"], 0.0, &[], &[]);
        let score = score_candidate(&required, &MatchCriteria::default(), &c);
        assert_eq!(score, SKILL_WEIGHT / 2.0);
    }

    #[test]
    fn test_skill_match_is_case_insensitive_substring() {
        let required = skills(&["nursing"]);
        let c = candidate(&["Pediatric NURSING (certified)"], 0.0, &[], &[]);
        assert!(meets_criteria(&required, &MatchCriteria::default(), &c));
        let score = score_candidate(&required, &MatchCriteria::default(), &c);
        assert_eq!(score, SKILL_WEIGHT);
    }

    #[test]
    fn test_hours_term_caps_at_experience_weight() {
        let c = candidate(&[], 250.0, &[], &[]);
        let score = score_candidate(&[], &MatchCriteria::default(), &c);
        assert_eq!(score, EXPERIENCE_WEIGHT);
    }

    #[test]
    fn test_hours_term_is_proportional_below_cap() {
        let c = candidate(&[], 50.0, &[], &[]);
        let score = score_candidate(&[], &MatchCriteria::default(), &c);
        assert_eq!(score, EXPERIENCE_WEIGHT / 2.0);
    }

    #[test]
    fn test_max_score_is_100() {
        let required = skills(&["driving"]);
        let criteria = MatchCriteria {
            qualifications: skills(&["nursing degree"]),
            languages: skills(&["amharic"]),
            ..Default::default()
        };
        let c = candidate(
            &["driving"],
            500.0,
            &["Nursing Degree"],
            &["Amharic", "English"],
        );
        let score = score_candidate(&required, &criteria, &c);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_missing_required_skill_fails_filter() {
        let required = skills(&["first aid"]);
        let c = candidate(&["cooking"], 80.0, &[], &[]);
        assert!(!meets_criteria(&required, &MatchCriteria::default(), &c));
    }

    #[test]
    fn test_missing_required_language_fails_filter() {
        let criteria = MatchCriteria {
            languages: skills(&["oromo"]),
            ..Default::default()
        };
        let c = candidate(&[], 0.0, &[], &["amharic"]);
        assert!(!meets_criteria(&[], &criteria, &c));
    }

    #[test]
    fn test_missing_required_qualification_fails_filter() {
        let criteria = MatchCriteria {
            qualifications: skills(&["medical degree"]),
            ..Default::default()
        };
        let c = candidate(&[], 0.0, &["teaching certificate"], &[]);
        assert!(!meets_criteria(&[], &criteria, &c));
    }

    #[test]
    fn test_no_criteria_accepts_everyone() {
        let c = candidate(&[], 0.0, &[], &[]);
        assert!(meets_criteria(&[], &MatchCriteria::default(), &c));
        assert_eq!(score_candidate(&[], &MatchCriteria::default(), &c), 0.0);
    }

    #[test]
    fn test_rank_orders_by_score_descending() {
        let required = skills(&["first aid", "logistics"]);
        let candidates = vec![
            candidate(&["first aid"], 0.0, &[], &[]),
            candidate(&["first aid", "logistics"], 100.0, &[], &[]),
            candidate(&["logistics"], 10.0, &[], &[]),
        ];

        let (ranked, total) = rank_candidates(
            &required,
            &MatchCriteria::default(),
            candidates,
            10,
            |c| c.clone(),
        );

        assert_eq!(total, 3);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].score, SKILL_WEIGHT + EXPERIENCE_WEIGHT);
        assert!(ranked[0].score >= ranked[1].score);
        assert!(ranked[1].score >= ranked[2].score);
    }

    #[test]
    fn test_rank_truncates_to_headcount_plus_buffer() {
        let candidates: Vec<CandidateProfile> = (0..20)
            .map(|i| candidate(&["first aid"], i as f64, &[], &[]))
            .collect();

        let (ranked, total) = rank_candidates(
            &skills(&["first aid"]),
            &MatchCriteria::default(),
            candidates,
            2,
            |c| c.clone(),
        );

        assert_eq!(total, 20);
        assert_eq!(ranked.len(), 2 + CANDIDATE_BUFFER);
    }

    #[test]
    fn test_rank_drops_filtered_candidates_from_total() {
        let candidates = vec![
            candidate(&["first aid"], 0.0, &[], &[]),
            candidate(&["cooking"], 0.0, &[], &[]),
        ];

        let (ranked, total) = rank_candidates(
            &skills(&["first aid"]),
            &MatchCriteria::default(),
            candidates,
            5,
            |c| c.clone(),
        );

        assert_eq!(total, 1);
        assert_eq!(ranked.len(), 1);
    }
}
