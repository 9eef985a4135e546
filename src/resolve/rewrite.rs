//! Override rewriting through a translation map.

use crate::node::OverrideEntry;
use super::translate::GuidTranslationMap;

/// Rewrite the first path element of every entry through `map`.
///
/// Only `guid_path[0]` ever changes; deeper elements address nested
/// instances in their own namespaces and are left for those instances.
/// Entries whose head is unmapped (and malformed entries) pass through.
pub fn translate_overrides(
    entries: &[OverrideEntry],
    map: &GuidTranslationMap,
) -> Vec<OverrideEntry> {
    if map.is_empty() {
        return entries.to_vec();
    }
    entries
        .iter()
        .map(|entry| match entry.head().and_then(|head| map.get(head)) {
            Some(target) => {
                let mut translated = entry.clone();
                translated.guid_path[0] = target;
                translated
            }
            None => entry.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Guid;

    fn g(session: u32, local: u32) -> Guid {
        Guid::new(session, local)
    }

    #[test]
    fn test_empty_map_is_identity() {
        let entries = vec![
            OverrideEntry::new(vec![g(20, 1), g(30, 1)]).with_text("a"),
            OverrideEntry::default(),
        ];
        assert_eq!(translate_overrides(&entries, &GuidTranslationMap::new()), entries);
    }

    #[test]
    fn test_only_head_rewritten() {
        let map: GuidTranslationMap =
            [(g(20, 1), g(10, 1)), (g(30, 1), g(10, 9))].into_iter().collect();
        let entries =
            vec![OverrideEntry::new(vec![g(20, 1), g(30, 1), g(40, 1)]).with_visible(false)];
        let out = translate_overrides(&entries, &map);

        assert_eq!(out[0].guid_path, vec![g(10, 1), g(30, 1), g(40, 1)]);
        assert_eq!(out[0].visible, Some(false));
    }

    #[test]
    fn test_unmapped_and_malformed_pass_through() {
        let map: GuidTranslationMap = [(g(20, 1), g(10, 1))].into_iter().collect();
        let entries = vec![OverrideEntry::new(vec![g(99, 9)]), OverrideEntry::default()];
        assert_eq!(translate_overrides(&entries, &map), entries);
    }
}
