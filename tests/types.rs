// ABOUTME: Integration tests for the typed identifiers.
// ABOUTME: Tests abbreviation, conversions, and serde behavior.

use rollout::types::*;
use std::collections::HashSet;

mod ids {
    use super::*;

    #[test]
    fn short_id_is_twelve_characters() {
        let id = ContainerId::new("0123456789abcdef0123456789abcdef");
        assert_eq!(id.short(), "0123456789ab");
        assert_eq!(id.short().len(), SHORT_ID_LEN);
    }

    #[test]
    fn short_id_of_short_value_is_whole_value() {
        assert_eq!(ContainerId::new("abc").short(), "abc");
        assert_eq!(ContainerId::new("").short(), "");
    }

    #[test]
    fn display_is_full_value() {
        let id = MachineId::new("edge-1");
        assert_eq!(id.to_string(), "edge-1");
        assert_eq!(id.as_str(), "edge-1");
    }

    #[test]
    fn conversions_from_strings() {
        let from_str: ServiceId = "svc-web".into();
        let from_string: ServiceId = String::from("svc-web").into();
        assert_eq!(from_str, from_string);
        assert_eq!(from_string.into_inner(), "svc-web");
    }

    #[test]
    fn ids_hash_by_value() {
        let set: HashSet<ContainerId> = ["a", "b", "a"].into_iter().map(ContainerId::new).collect();
        assert_eq!(set.len(), 2);
    }
}

mod serde_format {
    use super::*;

    #[test]
    fn serializes_as_plain_string() {
        let id = ContainerId::new("c0ffee");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c0ffee\"");
    }

    #[test]
    fn deserializes_from_plain_string() {
        let id: MachineId = serde_json::from_str("\"edge-1\"").unwrap();
        assert_eq!(id, MachineId::new("edge-1"));
    }
}
