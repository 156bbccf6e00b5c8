//! Cross-source duplicate removal.

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use tracing::debug;
use wayfinder_sources::LngLat;

use crate::candidate::Candidate;

/// Drop every candidate that repeats an earlier one.
///
/// Two candidates are duplicates when their dedup keys match and their
/// best-known positions are within `epsilon_degrees` on both axes. Input order
/// is the precedence order, so the first occurrence is kept. Candidates with no
/// position at all are never considered duplicates.
pub fn deduplicate(candidates: Vec<Candidate>, epsilon_degrees: f64) -> Vec<Candidate> {
    let mut kept_positions: HashMap<String, Vec<LngLat>> = HashMap::new();
    let before = candidates.len();

    let kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|candidate| {
            let Some(position) = candidate.best_known_position() else {
                return true;
            };
            let seen = kept_positions
                .entry(candidate.dedup_key.clone())
                .or_default();
            if seen
                .iter()
                .any(|p| p.within_degrees(&position, epsilon_degrees))
            {
                debug!(id = %candidate.id, key = %candidate.dedup_key, "Dropping duplicate candidate");
                return false;
            }
            seen.push(position);
            true
        })
        .collect();

    if kept.len() < before {
        debug!(dropped = before - kept.len(), "Deduplication removed candidates");
    }
    kept
}

/// Suffix repeated ids with `#2`, `#3`, ... so every id is unique within the slice.
pub fn ensure_unique_ids(candidates: &mut [Candidate]) {
    let mut taken: HashSet<String> = HashSet::with_capacity(candidates.len());
    for candidate in candidates.iter_mut() {
        if !taken.contains(&candidate.id) {
            taken.insert(candidate.id.clone());
            continue;
        }
        let unique = (2..)
            .map(|n| format!("{}#{n}", candidate.id))
            .find(|id| !taken.contains(id))
            .unwrap_or_default();
        taken.insert(unique.clone());
        candidate.id = unique;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{SourceKind, dedup_key};

    fn at(id: &str, name: &str, kind: SourceKind, position: Option<LngLat>) -> Candidate {
        Candidate {
            id: id.to_string(),
            display_name: name.to_string(),
            secondary_text: None,
            coordinates: position,
            approximate_coordinates: None,
            source_kind: kind,
            category: None,
            distance_meters: None,
            locality: false,
            dedup_key: dedup_key(name),
            is_address: false,
            is_location_poi: false,
            rating: None,
        }
    }

    #[test]
    fn test_first_seen_wins() {
        let here = LngLat::new(-9.14, 38.71);
        let close = LngLat::new(-9.145, 38.714);
        let kept = deduplicate(
            vec![
                at("poi:1", "Joe's Cafe", SourceKind::LocalPoi, Some(here)),
                at("suggest:1", "JOE'S  CAFE", SourceKind::Suggestion, Some(close)),
                at("geocode:1", "joe's cafe", SourceKind::Geocode, Some(here)),
            ],
            0.01,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "poi:1");
    }

    #[test]
    fn test_same_name_far_apart_survives() {
        let kept = deduplicate(
            vec![
                at("a", "Starbucks", SourceKind::Suggestion, Some(LngLat::new(-9.14, 38.71))),
                at("b", "Starbucks", SourceKind::Suggestion, Some(LngLat::new(-9.10, 38.71))),
            ],
            0.01,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_different_names_survive() {
        let here = LngLat::new(-9.14, 38.71);
        let kept = deduplicate(
            vec![
                at("a", "Cafe A", SourceKind::Suggestion, Some(here)),
                at("b", "Cafe B", SourceKind::Geocode, Some(here)),
            ],
            0.01,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_positionless_never_duplicate() {
        let here = LngLat::new(-9.14, 38.71);
        let kept = deduplicate(
            vec![
                at("a", "Rossio", SourceKind::Suggestion, Some(here)),
                at("b", "Rossio", SourceKind::Geocode, None),
                at("c", "Rossio", SourceKind::Geocode, None),
            ],
            0.01,
        );
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_approximate_position_counts() {
        let mut approx = at("b", "Rossio", SourceKind::Geocode, None);
        approx.approximate_coordinates = Some(LngLat::new(-9.1395, 38.7139));
        let kept = deduplicate(
            vec![
                at("a", "Rossio", SourceKind::Suggestion, Some(LngLat::new(-9.14, 38.714))),
                approx,
            ],
            0.01,
        );
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_unique_ids() {
        let mut candidates = vec![
            at("suggest:x", "A", SourceKind::Suggestion, None),
            at("suggest:x", "B", SourceKind::Suggestion, None),
            at("suggest:x#2", "C", SourceKind::Suggestion, None),
            at("suggest:x", "D", SourceKind::Suggestion, None),
        ];
        ensure_unique_ids(&mut candidates);
        let ids: Vec<_> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["suggest:x", "suggest:x#2", "suggest:x#2#2", "suggest:x#3"]);
    }
}
