//! Outfit slot model and display summaries
//!
//! An outfit maps each category slot to the items worn there. Multi-slot
//! categories (top, pants) stack any number of items; the rest hold at most
//! one. The active composition lives in memory; saved outfits persist the
//! slot map as JSON.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::taxonomy::Category;

/// Slot assignments for one outfit
///
/// Canonical form: every category key present, guids deduplicated in
/// insertion order, single-slot categories holding at most one guid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutfitSlots {
    slots: BTreeMap<Category, Vec<Uuid>>,
}

impl Default for OutfitSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl OutfitSlots {
    /// Empty composition: every slot present, nothing assigned
    pub fn new() -> Self {
        let mut slots = BTreeMap::new();
        for category in Category::all() {
            slots.insert(category, Vec::new());
        }
        OutfitSlots { slots }
    }

    /// Normalize a stored or user-supplied slot object
    ///
    /// Older records vary in shape, so parsing is lenient:
    /// - missing keys and `null` become empty slots
    /// - a bare guid string becomes a one-element slot
    /// - duplicates collapse to the first occurrence
    /// - unparseable guids and unknown keys are dropped
    /// - single-slot categories keep only their first entry
    pub fn from_value(value: &serde_json::Value) -> Self {
        let mut outfit = Self::new();
        let Some(object) = value.as_object() else {
            return outfit;
        };

        for (key, raw) in object {
            let Ok(category) = key.parse::<Category>() else {
                continue;
            };
            let guids: Vec<Uuid> = match raw {
                serde_json::Value::String(s) => Uuid::parse_str(s).into_iter().collect(),
                serde_json::Value::Array(entries) => entries
                    .iter()
                    .filter_map(|v| v.as_str())
                    .filter_map(|s| Uuid::parse_str(s).ok())
                    .collect(),
                _ => Vec::new(),
            };
            for guid in guids {
                outfit.assign(category, guid);
            }
        }
        outfit
    }

    /// Parse the stored JSON form, normalizing as in [`Self::from_value`]
    pub fn from_storage_json(json: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(json) {
            Ok(value) => Self::from_value(&value),
            Err(_) => Self::new(),
        }
    }

    /// Storage form: a JSON object with only the occupied slots
    pub fn to_storage_json(&self) -> String {
        let occupied: BTreeMap<String, Vec<String>> = self
            .slots
            .iter()
            .filter(|(_, guids)| !guids.is_empty())
            .map(|(category, guids)| {
                (
                    category.to_string(),
                    guids.iter().map(|g| g.to_string()).collect(),
                )
            })
            .collect();
        // String-keyed maps of strings always serialize
        serde_json::to_string(&occupied).unwrap_or_else(|_| "{}".to_string())
    }

    /// Items assigned to one slot
    pub fn items_in(&self, category: Category) -> &[Uuid] {
        self.slots.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every assigned guid across all slots, in slot order
    pub fn all_items(&self) -> Vec<Uuid> {
        self.slots.values().flatten().copied().collect()
    }

    /// Assign an item to a slot
    ///
    /// Single-slot categories replace the previous occupant; multi-slot
    /// categories append unless the guid is already present.
    pub fn assign(&mut self, category: Category, guid: Uuid) {
        let slot = self.slots.entry(category).or_default();
        if category.is_multi_slot() {
            if !slot.contains(&guid) {
                slot.push(guid);
            }
        } else {
            slot.clear();
            slot.push(guid);
        }
    }

    /// Remove one item from one slot. Returns true if it was present.
    pub fn unassign(&mut self, category: Category, guid: Uuid) -> bool {
        let slot = self.slots.entry(category).or_default();
        let before = slot.len();
        slot.retain(|g| *g != guid);
        slot.len() != before
    }

    /// Empty one slot
    pub fn clear_slot(&mut self, category: Category) {
        self.slots.entry(category).or_default().clear();
    }

    /// Empty every slot
    pub fn clear_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.clear();
        }
    }

    /// Strip a guid from every slot (used when an item is deleted).
    /// Returns true if anything changed.
    pub fn remove_item_everywhere(&mut self, guid: Uuid) -> bool {
        let mut changed = false;
        for slot in self.slots.values_mut() {
            let before = slot.len();
            slot.retain(|g| *g != guid);
            changed |= slot.len() != before;
        }
        changed
    }

    /// Strip a guid from every slot except its category (used when an
    /// item's category is edited). Returns true if anything changed.
    pub fn purge_category_mismatches(&mut self, guid: Uuid, category: Category) -> bool {
        let mut changed = false;
        for (slot_category, slot) in self.slots.iter_mut() {
            if *slot_category == category {
                continue;
            }
            let before = slot.len();
            slot.retain(|g| *g != guid);
            changed |= slot.len() != before;
        }
        changed
    }

    /// Drop guids the predicate rejects (used when loading a saved outfit
    /// whose items may have been deleted since)
    pub fn retain_items<F: Fn(&Uuid) -> bool>(&mut self, keep: F) {
        for slot in self.slots.values_mut() {
            slot.retain(|g| keep(g));
        }
    }

    /// True when no slot holds anything
    pub fn is_empty(&self) -> bool {
        self.slots.values().all(Vec::is_empty)
    }

    /// Number of slots holding at least one item
    pub fn occupied_slot_count(&self) -> usize {
        self.slots.values().filter(|s| !s.is_empty()).count()
    }
}

/// Item metadata needed to describe a slot in one line
#[derive(Debug, Clone)]
pub struct SlotItemInfo {
    pub tag: String,
    pub color: String,
}

/// One-line summary of a single item: `tag · color`, eliding absent halves
pub fn summarize_item(item: &SlotItemInfo) -> String {
    let tag = item.tag.trim();
    let color = item.color.trim();
    match (tag.is_empty(), color.is_empty()) {
        (false, false) => format!("{} · {}", tag, color),
        (false, true) => tag.to_string(),
        (true, false) => color.to_string(),
        (true, true) => "—".to_string(),
    }
}

/// One-line summary of a slot's contents
///
/// Empty slots read "—". Multi-item slots list the first two item
/// summaries and elide the rest.
pub fn summarize_slot(items: &[SlotItemInfo]) -> String {
    match items {
        [] => "—".to_string(),
        [only] => summarize_item(only),
        many => {
            let mut parts: Vec<String> = many.iter().take(2).map(summarize_item).collect();
            if many.len() > 2 {
                parts.push("...".to_string());
            }
            format!("{} items: {}", many.len(), parts.join(" / "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn guid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn test_new_is_empty() {
        let outfit = OutfitSlots::new();
        assert!(outfit.is_empty());
        assert_eq!(outfit.occupied_slot_count(), 0);
        for category in Category::all() {
            assert!(outfit.items_in(category).is_empty());
        }
    }

    #[test]
    fn test_single_slot_replaces() {
        let mut outfit = OutfitSlots::new();
        outfit.assign(Category::Hat, guid(1));
        outfit.assign(Category::Hat, guid(2));
        assert_eq!(outfit.items_in(Category::Hat), &[guid(2)]);
    }

    #[test]
    fn test_multi_slot_appends_without_duplicates() {
        let mut outfit = OutfitSlots::new();
        outfit.assign(Category::Top, guid(1));
        outfit.assign(Category::Top, guid(2));
        outfit.assign(Category::Top, guid(1));
        assert_eq!(outfit.items_in(Category::Top), &[guid(1), guid(2)]);
    }

    #[test]
    fn test_unassign() {
        let mut outfit = OutfitSlots::new();
        outfit.assign(Category::Top, guid(1));
        outfit.assign(Category::Top, guid(2));
        assert!(outfit.unassign(Category::Top, guid(1)));
        assert!(!outfit.unassign(Category::Top, guid(1)));
        assert_eq!(outfit.items_in(Category::Top), &[guid(2)]);
    }

    #[test]
    fn test_remove_item_everywhere() {
        let mut outfit = OutfitSlots::new();
        outfit.assign(Category::Top, guid(1));
        outfit.assign(Category::Pants, guid(1));
        outfit.assign(Category::Shoes, guid(2));
        assert!(outfit.remove_item_everywhere(guid(1)));
        assert!(outfit.items_in(Category::Top).is_empty());
        assert!(outfit.items_in(Category::Pants).is_empty());
        assert_eq!(outfit.items_in(Category::Shoes), &[guid(2)]);
        assert!(!outfit.remove_item_everywhere(guid(1)));
    }

    #[test]
    fn test_purge_category_mismatches() {
        let mut outfit = OutfitSlots::new();
        outfit.assign(Category::Top, guid(1));
        outfit.assign(Category::Pants, guid(1));
        // Item 1 is now a pants item; its stale top placement goes away
        assert!(outfit.purge_category_mismatches(guid(1), Category::Pants));
        assert!(outfit.items_in(Category::Top).is_empty());
        assert_eq!(outfit.items_in(Category::Pants), &[guid(1)]);
    }

    #[test]
    fn test_from_value_normalizes_shapes() {
        let hat = guid(1);
        let top_a = guid(2);
        let top_b = guid(3);
        let value = json!({
            "hat": hat.to_string(),
            "top": [top_a.to_string(), top_b.to_string(), top_a.to_string()],
            "scarf": null,
            "socks": ["not-a-slot"],
            "pants": ["not-a-guid"],
        });
        let outfit = OutfitSlots::from_value(&value);
        assert_eq!(outfit.items_in(Category::Hat), &[hat]);
        assert_eq!(outfit.items_in(Category::Top), &[top_a, top_b]);
        assert!(outfit.items_in(Category::Scarf).is_empty());
        assert!(outfit.items_in(Category::Pants).is_empty());
        assert!(outfit.items_in(Category::Shoes).is_empty());
    }

    #[test]
    fn test_from_value_truncates_single_slots() {
        let value = json!({
            "shoes": [guid(1).to_string(), guid(2).to_string()],
        });
        let outfit = OutfitSlots::from_value(&value);
        assert_eq!(outfit.items_in(Category::Shoes), &[guid(1)]);
    }

    #[test]
    fn test_storage_json_round_trip() {
        let mut outfit = OutfitSlots::new();
        outfit.assign(Category::Hat, guid(1));
        outfit.assign(Category::Top, guid(2));
        outfit.assign(Category::Top, guid(3));

        let json = outfit.to_storage_json();
        assert!(!json.contains("scarf"), "empty slots are omitted: {}", json);

        let restored = OutfitSlots::from_storage_json(&json);
        assert_eq!(restored, outfit);
    }

    #[test]
    fn test_from_storage_json_garbage() {
        assert!(OutfitSlots::from_storage_json("not json").is_empty());
        assert!(OutfitSlots::from_storage_json("[1,2,3]").is_empty());
    }

    #[test]
    fn test_retain_items() {
        let mut outfit = OutfitSlots::new();
        outfit.assign(Category::Top, guid(1));
        outfit.assign(Category::Top, guid(2));
        outfit.retain_items(|g| *g == guid(2));
        assert_eq!(outfit.items_in(Category::Top), &[guid(2)]);
    }

    #[test]
    fn test_summarize_item() {
        let full = SlotItemInfo {
            tag: "sweater".into(),
            color: "green".into(),
        };
        assert_eq!(summarize_item(&full), "sweater · green");

        let tag_only = SlotItemInfo {
            tag: "sweater".into(),
            color: "".into(),
        };
        assert_eq!(summarize_item(&tag_only), "sweater");

        let color_only = SlotItemInfo {
            tag: " ".into(),
            color: "green".into(),
        };
        assert_eq!(summarize_item(&color_only), "green");

        let neither = SlotItemInfo {
            tag: "".into(),
            color: "".into(),
        };
        assert_eq!(summarize_item(&neither), "—");
    }

    #[test]
    fn test_summarize_slot() {
        assert_eq!(summarize_slot(&[]), "—");

        let a = SlotItemInfo {
            tag: "tee".into(),
            color: "white".into(),
        };
        let b = SlotItemInfo {
            tag: "jacket".into(),
            color: "navy".into(),
        };
        let c = SlotItemInfo {
            tag: "coat".into(),
            color: "gray".into(),
        };

        assert_eq!(summarize_slot(&[a.clone()]), "tee · white");
        assert_eq!(
            summarize_slot(&[a.clone(), b.clone()]),
            "2 items: tee · white / jacket · navy"
        );
        assert_eq!(
            summarize_slot(&[a, b, c]),
            "3 items: tee · white / jacket · navy / ..."
        );
    }
}
