#![cfg_attr(not(test), no_std)] // Shared by the engine crates without pulling std into the data model

extern crate alloc;

// Enable std if the feature is active (tests link it anyway)
#[cfg(all(feature = "std", not(test)))]
extern crate std;

pub mod connector;
pub mod dictionary;
pub mod disjunct;
pub mod ids;
pub mod model;

// Re-export core types for convenience
pub use connector::{label_matches, link_label, Connector, ConnectorError, ConnectorFlags, Direction};
pub use dictionary::{Dictionary, LEFT_WALL, RIGHT_WALL, UNKNOWN_WORD};
pub use disjunct::Disjunct;
pub use ids::{DisjunctId, EntryId};
pub use model::*;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;
    use rkyv::{from_bytes, to_bytes};

    #[test]
    fn test_enum_serialization() {
        let original = Side::Right;

        let bytes = to_bytes::<_, 256>(&original).expect("Failed to serialize Side");
        let deserialized: Side = from_bytes(&bytes).expect("Failed to deserialize Side");

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_id_serialization() {
        let original = EntryId::new(42);

        let bytes = to_bytes::<_, 256>(&original).expect("Failed to serialize EntryId");
        let deserialized: EntryId = from_bytes(&bytes).expect("Failed to deserialize EntryId");

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_id_layout() {
        // EntryId(u32) should be exactly 4 bytes
        assert_eq!(core::mem::size_of::<EntryId>(), 4);
        assert_eq!(core::mem::size_of::<Option<EntryId>>(), 8);
    }

    #[test]
    fn test_lexicon_snapshot() {
        let data = LexiconData {
            version: 1,
            language: "en".to_string(),
            entries: vec![LexEntry {
                id: EntryId(0),
                word: "flag.n".to_string(),
                disjuncts: vec![Disjunct::new(
                    DisjunctId(0),
                    vec![Connector::parse("Ds-").unwrap()],
                    vec![Connector::parse("Ss+").unwrap()],
                    0,
                )],
                corpus_cost: Some(0.5),
            }],
            knowledge: Knowledge {
                domain_starters: vec![DomainStarter { label: "W".to_string(), domain: "m".to_string() }],
                ..Knowledge::default()
            },
            constraints: vec![],
            affixes: AffixTable::default(),
        };

        let bytes = to_bytes::<_, 1024>(&data).expect("Failed to serialize LexiconData");
        let restored: LexiconData = from_bytes(&bytes).expect("Failed to deserialize LexiconData");
        assert_eq!(restored, data);
        assert_eq!(restored.entries[0].base(), "flag");
    }
}
