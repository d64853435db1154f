use crate::models::Feature;

use super::identifier::ancestor_chain;

/// Resolve `target_id` and its taxonomy ancestors, child first:
/// `[target, parent, grandparent, ...]`.
///
/// An unknown target yields an empty chain. Ancestor identifiers with no matching
/// feature are skipped, since a group marker may or may not have its own record.
pub fn resolve_chain<'a>(target_id: &str, all_features: &'a [Feature]) -> Vec<&'a Feature> {
    let Some(target) = all_features.iter().find(|f| f.id == target_id) else {
        return Vec::new();
    };

    let ancestors = ancestor_chain(&target.feature_identifier)
        .into_iter()
        .filter_map(|identifier| {
            all_features
                .iter()
                .find(|f| f.feature_identifier == identifier)
        });

    std::iter::once(target).chain(ancestors).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(id: &str, identifier: &str) -> Feature {
        Feature {
            id: id.to_string(),
            feature_identifier: identifier.to_string(),
            feature_name: identifier.to_string(),
            feature_description: String::new(),
            selected: false,
        }
    }

    fn ids(chain: &[&Feature]) -> Vec<String> {
        chain.iter().map(|f| f.id.clone()).collect()
    }

    #[test]
    fn test_unknown_target_yields_empty_chain() {
        let features = vec![feature("1", "paper.parent")];
        assert!(resolve_chain("missing", &features).is_empty());
    }

    #[test]
    fn test_chain_is_child_first() {
        let features = vec![
            feature("1", "paper.parent"),
            feature("2", "paper.experiments.parent"),
            feature("3", "paper.experiments.conditions.parent"),
            feature("4", "paper.experiments.conditions.name"),
        ];
        assert_eq!(ids(&resolve_chain("4", &features)), vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_gaps_in_taxonomy_are_skipped() {
        let features = vec![
            feature("1", "paper.parent"),
            feature("4", "paper.experiments.conditions.name"),
        ];
        assert_eq!(ids(&resolve_chain("4", &features)), vec!["4", "1"]);
    }

    #[test]
    fn test_top_level_target_is_alone() {
        let features = vec![feature("1", "paper.parent"), feature("2", "title")];
        assert_eq!(ids(&resolve_chain("1", &features)), vec!["1"]);
        assert_eq!(ids(&resolve_chain("2", &features)), vec!["2"]);
    }
}
