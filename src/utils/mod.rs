//! # Utilities
//!
//! Serde helpers shared by the world store.

/// Serializes a `HashMap<Position, V>` as a sorted vector of `[position,
/// value]` entries. JSON object keys must be strings, so coordinate-keyed
/// maps round-trip through an entry list instead; sorting keeps save files
/// byte-stable for identical state.
pub mod position_map {
    use crate::game::Position;
    use serde::de::Deserializer;
    use serde::ser::Serializer;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    pub fn serialize<V, S>(map: &HashMap<Position, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        let mut entries: Vec<(&Position, &V)> = map.iter().collect();
        entries.sort_by_key(|(pos, _)| **pos);
        serializer.collect_seq(entries)
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<HashMap<Position, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let entries: Vec<(Position, V)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::game::Position;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super::position_map")]
        map: HashMap<Position, Vec<String>>,
    }

    #[test]
    fn test_position_map_round_trip() {
        let mut map = HashMap::new();
        map.insert(Position::new(1, -2), vec!["a".to_string()]);
        map.insert(Position::new(-3, 4), vec!["b".to_string(), "c".to_string()]);

        let json = serde_json::to_string(&Holder { map }).unwrap();
        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.map.len(), 2);
        assert_eq!(back.map[&Position::new(1, -2)], vec!["a".to_string()]);
    }

    #[test]
    fn test_serialization_is_sorted_and_stable() {
        let mut map = HashMap::new();
        for x in [5, -1, 3, 0] {
            map.insert(Position::new(x, 0), vec!["x".to_string()]);
        }
        let holder = Holder { map };
        let first = serde_json::to_string(&holder).unwrap();
        let second = serde_json::to_string(&holder).unwrap();
        assert_eq!(first, second);
        // Sorted by coordinate, so -1 serializes before 5.
        assert!(first.find("-1").unwrap() < first.find('5').unwrap());
    }
}
