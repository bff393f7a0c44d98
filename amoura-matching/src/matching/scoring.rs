use std::collections::{BTreeSet, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Viewer-side inputs to the aggregator. Gender preference and discovery
/// filtering happen store-side before candidates reach this module; only the
/// attributes scored in memory are carried here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerAttrs {
    pub member_ref: String,
    #[serde(default)]
    pub passions: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// A discoverable candidate profile as served by the user service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub member_ref: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub passions: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// The cohort id-lists, one per matching dimension, plus the two
/// edge-derived lists. Each list holds candidate member refs sharing that
/// attribute or relation with the viewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CohortLists {
    #[serde(default)]
    pub same_day_job: Vec<String>,
    #[serde(default)]
    pub same_religion: Vec<String>,
    #[serde(default)]
    pub same_degree: Vec<String>,
    #[serde(default)]
    pub same_origin_country: Vec<String>,
    #[serde(default)]
    pub same_settled_country: Vec<String>,
    #[serde(default)]
    pub same_city: Vec<String>,
    #[serde(default)]
    pub same_mother_tongue: Vec<String>,
    #[serde(default)]
    pub same_star_sign: Vec<String>,
    #[serde(default)]
    pub shortlisted: Vec<String>,
    #[serde(default)]
    pub likes_me: Vec<String>,
    #[serde(default)]
    pub liked: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchCategory {
    SameDayJob,
    SameReligion,
    SameDegree,
    SameOriginCountry,
    SameSettledCountry,
    SameCity,
    SameMotherTongue,
    SameStarSign,
    Shortlisted,
    LikesMe,
    SamePassions,
    SameInterests,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedMatch {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub score: u32,
    pub categories: Vec<MatchCategory>,
    pub is_liked: bool,
}

/// Rank the viewer's matches.
///
/// Scoring: +1 per cohort the candidate appears in (the nine attribute
/// cohorts plus `likes_me`; `liked` deliberately never scores, you get no
/// credit for your own likes), +1 for a passions overlap, +1 for an
/// interests overlap. Candidates matching no cohort are not matches and are
/// dropped, however discoverable they are.
///
/// Ordering: score descending, then members who like the viewer, then
/// online members, then an ascending per-session pseudo-random key. The key
/// is drawn from a generator seeded with `session_seed ^ hash(member_ref)`,
/// so equal-score order is stable for the whole session and reshuffles on
/// the next one.
///
/// Pure: no I/O, deterministic for fixed inputs and seed.
pub fn compute_matches(
    viewer: &ViewerAttrs,
    candidates: Vec<Candidate>,
    cohorts: &CohortLists,
    session_seed: u64,
) -> Vec<RankedMatch> {
    let mut by_ref: HashMap<String, Candidate> = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate.member_ref == viewer.member_ref {
            continue;
        }
        by_ref.insert(candidate.member_ref.clone(), candidate);
    }

    let scoring_cohorts: [(&[String], MatchCategory); 10] = [
        (&cohorts.same_day_job, MatchCategory::SameDayJob),
        (&cohorts.same_religion, MatchCategory::SameReligion),
        (&cohorts.same_degree, MatchCategory::SameDegree),
        (&cohorts.same_origin_country, MatchCategory::SameOriginCountry),
        (&cohorts.same_settled_country, MatchCategory::SameSettledCountry),
        (&cohorts.same_city, MatchCategory::SameCity),
        (&cohorts.same_mother_tongue, MatchCategory::SameMotherTongue),
        (&cohorts.same_star_sign, MatchCategory::SameStarSign),
        (&cohorts.shortlisted, MatchCategory::Shortlisted),
        (&cohorts.likes_me, MatchCategory::LikesMe),
    ];

    let mut tallies: HashMap<&str, (u32, BTreeSet<MatchCategory>)> = HashMap::new();
    for (list, category) in scoring_cohorts {
        for member_ref in list {
            let Some((member_ref, _)) = by_ref.get_key_value(member_ref.as_str()) else {
                continue;
            };
            let entry = tallies.entry(member_ref).or_default();
            // A ref repeated inside one list still counts once
            if entry.1.insert(category) {
                entry.0 += 1;
            }
        }
    }

    // Passions/interests overlap, evaluated once per candidate
    for (member_ref, candidate) in &by_ref {
        if !viewer.passions.is_empty() && intersects(&viewer.passions, &candidate.passions) {
            let entry = tallies.entry(member_ref).or_default();
            if entry.1.insert(MatchCategory::SamePassions) {
                entry.0 += 1;
            }
        }
        if !viewer.interests.is_empty() && intersects(&viewer.interests, &candidate.interests) {
            let entry = tallies.entry(member_ref).or_default();
            if entry.1.insert(MatchCategory::SameInterests) {
                entry.0 += 1;
            }
        }
    }

    let likes_me: HashSet<&str> = cohorts.likes_me.iter().map(|s| s.as_str()).collect();
    let liked: HashSet<&str> = cohorts.liked.iter().map(|s| s.as_str()).collect();

    struct Entry {
        ranked: RankedMatch,
        likes_viewer: bool,
        online: bool,
        key: f64,
    }

    let mut entries: Vec<Entry> = tallies
        .into_iter()
        .filter(|(_, (score, _))| *score > 0)
        .map(|(member_ref, (score, categories))| {
            let candidate = by_ref[member_ref].clone();
            Entry {
                likes_viewer: likes_me.contains(member_ref),
                online: candidate.is_online,
                key: tiebreak_key(session_seed, member_ref),
                ranked: RankedMatch {
                    is_liked: liked.contains(member_ref),
                    candidate,
                    score,
                    categories: categories.into_iter().collect(),
                },
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.ranked
            .score
            .cmp(&a.ranked.score)
            .then_with(|| b.likes_viewer.cmp(&a.likes_viewer))
            .then_with(|| b.online.cmp(&a.online))
            .then_with(|| a.key.total_cmp(&b.key))
    });

    entries.into_iter().map(|e| e.ranked).collect()
}

fn intersects(a: &[String], b: &[String]) -> bool {
    a.iter().any(|x| b.contains(x))
}

/// Per-candidate tiebreak key: one draw from a generator seeded with the
/// session seed xor a hash of the candidate id.
pub fn tiebreak_key(session_seed: u64, member_ref: &str) -> f64 {
    let mut rng = StdRng::seed_from_u64(session_seed ^ fnv1a64(member_ref));
    rng.gen::<f64>()
}

/// FNV-1a, 64-bit. Platform-independent so the tiebreak survives
/// serialization of the seed across clients.
fn fnv1a64(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(member_ref: &str) -> Candidate {
        Candidate {
            member_ref: member_ref.to_string(),
            display_name: Some(format!("member {member_ref}")),
            photo_url: None,
            city: None,
            is_online: false,
            passions: vec![],
            interests: vec![],
        }
    }

    fn viewer() -> ViewerAttrs {
        ViewerAttrs {
            member_ref: "YBE00000001".into(),
            passions: vec![],
            interests: vec![],
        }
    }

    fn refs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn zero_cohort_candidates_are_dropped() {
        let candidates = vec![candidate("YBE00000002"), candidate("YBE00000003")];
        let cohorts = CohortLists {
            same_religion: refs(&["YBE00000002"]),
            ..Default::default()
        };

        let ranked = compute_matches(&viewer(), candidates, &cohorts, 7);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate.member_ref, "YBE00000002");
    }

    #[test]
    fn never_returns_a_non_candidate() {
        let cohorts = CohortLists {
            same_city: refs(&["YBE00000099"]),
            ..Default::default()
        };
        let ranked = compute_matches(&viewer(), vec![candidate("YBE00000002")], &cohorts, 7);
        assert!(ranked.is_empty());
    }

    #[test]
    fn never_returns_the_viewer() {
        let cohorts = CohortLists {
            same_city: refs(&["YBE00000001"]),
            ..Default::default()
        };
        let ranked = compute_matches(&viewer(), vec![candidate("YBE00000001")], &cohorts, 7);
        assert!(ranked.is_empty());
    }

    #[test]
    fn score_counts_each_cohort_once() {
        let mut c = candidate("YBE00000002");
        c.passions = vec!["Hiking".into()];
        let cohorts = CohortLists {
            shortlisted: refs(&["YBE00000002"]),
            same_religion: refs(&["YBE00000002", "YBE00000002"]),
            ..Default::default()
        };
        let mut v = viewer();
        v.passions = vec!["Hiking".into(), "Chess".into()];

        let ranked = compute_matches(&v, vec![c], &cohorts, 7);
        assert_eq!(ranked.len(), 1);
        // shortlisted + sameReligion + one shared passion = 3
        assert_eq!(ranked[0].score, 3);
        assert_eq!(
            ranked[0].categories,
            vec![
                MatchCategory::SameReligion,
                MatchCategory::Shortlisted,
                MatchCategory::SamePassions
            ]
        );
    }

    #[test]
    fn liked_by_me_does_not_score_but_likes_me_does() {
        let candidates = vec![candidate("YBE00000002"), candidate("YBE00000003")];
        let cohorts = CohortLists {
            liked: refs(&["YBE00000002"]),
            likes_me: refs(&["YBE00000003"]),
            ..Default::default()
        };

        let ranked = compute_matches(&viewer(), candidates, &cohorts, 7);
        // Liking someone gives them no score; being liked by them does.
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate.member_ref, "YBE00000003");
        assert_eq!(ranked[0].categories, vec![MatchCategory::LikesMe]);
        assert!(!ranked[0].is_liked);
    }

    #[test]
    fn is_liked_flag_marks_outgoing_likes() {
        let cohorts = CohortLists {
            same_city: refs(&["YBE00000002"]),
            liked: refs(&["YBE00000002"]),
            ..Default::default()
        };
        let ranked = compute_matches(&viewer(), vec![candidate("YBE00000002")], &cohorts, 7);
        assert_eq!(ranked[0].score, 1);
        assert!(ranked[0].is_liked);
    }

    #[test]
    fn empty_viewer_passions_never_bonus() {
        let mut c = candidate("YBE00000002");
        c.passions = vec!["Hiking".into()];
        let cohorts = CohortLists {
            same_city: refs(&["YBE00000002"]),
            ..Default::default()
        };
        let ranked = compute_matches(&viewer(), vec![c], &cohorts, 7);
        assert_eq!(ranked[0].score, 1);
    }

    #[test]
    fn ordering_score_then_likes_me_then_online() {
        let mut online = candidate("YBE00000004");
        online.is_online = true;
        let candidates = vec![
            candidate("YBE00000002"), // score 2
            candidate("YBE00000003"), // score 1, likes viewer
            online,                   // score 1, online
            candidate("YBE00000005"), // score 1
        ];
        let cohorts = CohortLists {
            same_city: refs(&["YBE00000002", "YBE00000003", "YBE00000004", "YBE00000005"]),
            same_religion: refs(&["YBE00000002"]),
            likes_me: refs(&["YBE00000003"]),
            ..Default::default()
        };

        let ranked = compute_matches(&viewer(), candidates, &cohorts, 7);
        let order: Vec<&str> = ranked.iter().map(|r| r.candidate.member_ref.as_str()).collect();
        assert_eq!(
            order,
            vec!["YBE00000002", "YBE00000003", "YBE00000004", "YBE00000005"]
        );
    }

    #[test]
    fn fixed_seed_is_idempotent() {
        let candidates: Vec<Candidate> =
            (2..40).map(|i| candidate(&format!("YBE{i:08}"))).collect();
        let cohorts = CohortLists {
            same_city: candidates.iter().map(|c| c.member_ref.clone()).collect(),
            ..Default::default()
        };

        let first = compute_matches(&viewer(), candidates.clone(), &cohorts, 1234);
        let second = compute_matches(&viewer(), candidates, &cohorts, 1234);
        let a: Vec<&str> = first.iter().map(|r| r.candidate.member_ref.as_str()).collect();
        let b: Vec<&str> = second.iter().map(|r| r.candidate.member_ref.as_str()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_can_reorder_equal_scores() {
        let candidates: Vec<Candidate> =
            (2..40).map(|i| candidate(&format!("YBE{i:08}"))).collect();
        let cohorts = CohortLists {
            same_city: candidates.iter().map(|c| c.member_ref.clone()).collect(),
            ..Default::default()
        };

        let orders: Vec<Vec<String>> = (0..8)
            .map(|seed| {
                compute_matches(&viewer(), candidates.clone(), &cohorts, seed)
                    .into_iter()
                    .map(|r| r.candidate.member_ref)
                    .collect()
            })
            .collect();

        // 38 equal-score candidates over 8 seeds: at least one pair differs
        assert!(orders.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn tiebreak_key_is_stable_per_id_and_seed() {
        let k1 = tiebreak_key(99, "YBE00000010");
        let k2 = tiebreak_key(99, "YBE00000010");
        assert_eq!(k1, k2);
        assert_ne!(tiebreak_key(99, "YBE00000010"), tiebreak_key(100, "YBE00000010"));
    }

    #[test]
    fn missing_attributes_degrade_gracefully() {
        // A candidate with nothing filled in, present in one cohort, still ranks
        let bare = Candidate {
            member_ref: "YBE00000002".into(),
            display_name: None,
            photo_url: None,
            city: None,
            is_online: false,
            passions: vec![],
            interests: vec![],
        };
        let cohorts = CohortLists {
            same_star_sign: refs(&["YBE00000002"]),
            ..Default::default()
        };
        let ranked = compute_matches(&viewer(), vec![bare], &cohorts, 7);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 1);
    }
}
