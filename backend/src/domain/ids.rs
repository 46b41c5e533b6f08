//! Integer identifiers for catalogue entities.
//!
//! Identifiers are assigned by the relational store (serial columns) and are
//! never minted by the domain. Each entity gets its own newtype so a user id
//! cannot be passed where a hashtag id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_entity_id {
    (
        $(#[$outer:meta])*
        $name:ident
    ) => {
        $(#[$outer])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw store identifier.
            pub const fn new(raw: i32) -> Self {
                Self(raw)
            }

            /// Raw integer value as stored in the database.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl From<i32> for $name {
            fn from(raw: i32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_entity_id! {
    /// Identifier of a row in `users`.
    UserId
}

define_entity_id! {
    /// Identifier of a row in `hashtags`.
    HashtagId
}

define_entity_id! {
    /// Identifier of a row in `projects`.
    ProjectId
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn ids_serialise_as_bare_integers() {
        let json = serde_json::to_string(&ProjectId::new(7)).expect("serialise id");
        assert_eq!(json, "7");

        let parsed: HashtagId = serde_json::from_str("12").expect("deserialise id");
        assert_eq!(parsed.get(), 12);
    }

    #[rstest]
    fn ids_order_by_raw_value() {
        let mut ids = vec![UserId::new(3), UserId::new(1), UserId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![UserId::new(1), UserId::new(2), UserId::new(3)]);
    }
}
