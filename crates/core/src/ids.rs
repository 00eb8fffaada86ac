// SPDX-License-Identifier: MIT

//! Natural-key identifiers for chapters, lessons, models, and connected clients.
//!
//! Unlike a worker run or a job, these are not randomly generated: a model id is
//! the model descriptor's canonical object-store path, and a client id is derived
//! from the transport-level peer address. Two equal strings must always denote
//! the same entity, so these are plain newtypes over `String`, not nanoid-backed.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! natural_key_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

natural_key_id!(ModelId, "Canonical object-store path of a model descriptor; the fleet's dedup key.");
natural_key_id!(ChapterId, "Identifier of a chapter as named by the document store.");
natural_key_id!(LessonId, "Identifier of a lesson within a chapter.");
natural_key_id!(ClientId, "Identifier of one connected client within a worker, derived from its peer address.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_inner_string() {
        let id = ModelId::new("model-info/alphabet.json");
        assert_eq!(id.to_string(), "model-info/alphabet.json");
    }

    #[test]
    fn equal_strings_are_equal_ids() {
        assert_eq!(ModelId::from("a"), ModelId::from("a".to_string()));
    }

    #[test]
    fn borrows_as_str_for_map_lookup() {
        use std::collections::HashMap;
        let mut map: HashMap<ClientId, u32> = HashMap::new();
        map.insert(ClientId::new("127.0.0.1:9001"), 1);
        assert_eq!(map.get("127.0.0.1:9001"), Some(&1));
    }
}
