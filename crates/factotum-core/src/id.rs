use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Arena slot of a placed object inside the object registry.
    pub struct ObjectKey;
}

/// Public identity of a placed building. Allocated monotonically and never
/// reused, even after the building is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Identifies a mineral deposit by its index in the scene's deposit list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MineralId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids_order_by_allocation() {
        assert!(ObjectId(0) < ObjectId(1));
        assert_ne!(ObjectId(3), ObjectId(4));
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(MineralId(0), "north deposit");
        map.insert(MineralId(1), "south deposit");
        assert_eq!(map[&MineralId(1)], "south deposit");
    }
}
