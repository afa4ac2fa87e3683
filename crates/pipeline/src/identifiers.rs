//! Newtype domain identifiers.
//!
//! Every stored entity is addressed by a distinct newtype wrapping its document
//! key. This prevents accidentally passing, for example, a [`CategoryId`]
//! where a [`BlogId`] is expected even though both are strings in the store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is blank.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for document keys the gateway may assign itself.
// Adds generate() on top of string_id!.
// ---------------------------------------------------------------------------
macro_rules! document_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        string_id! {
            $(#[$attr])*
            $name
        }

        impl $name {
            /// Generates a fresh random document key (32 lowercase hex characters).
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Document keys
// ---------------------------------------------------------------------------

document_id! {
    /// Identifies a blog post document in the `blogs` collection.
    ///
    /// Assigned by the store gateway at creation time so the document write can
    /// be batched with its category update in a single transaction.
    BlogId
}

document_id! {
    /// Identifies a category document in the `categories` collection.
    CategoryId
}

document_id! {
    /// Identifies an entry in the append-only `activities` collection.
    ActivityId
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies an authenticated user by the `uid` the identity service issued.
    ///
    /// Blog records carry the author's id in `author_id`.
    UserId
}

string_id! {
    /// Human-readable category label (e.g. `"Technology"`).
    ///
    /// Names are unique by convention only: the gateway finds a category by
    /// name before deciding whether to increment or create it.
    CategoryName
}

impl CategoryName {
    /// Label for articles the model could not categorize.
    pub const GENERAL: &'static str = "General";

    /// The [`CategoryName::GENERAL`] label.
    pub fn general() -> Self {
        Self(Self::GENERAL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identifiers_are_rejected() {
        assert!(BlogId::new("").is_none());
        assert!(CategoryName::new("   ").is_none());
        assert_eq!(UserId::new("uid-1").unwrap().as_str(), "uid-1");
    }

    #[test]
    fn generated_keys_are_unique_hex() {
        let a = BlogId::generate();
        let b = BlogId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn identifiers_serialize_as_plain_strings() {
        let id = CategoryName::new("Tech").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"Tech\"");
    }

    #[test]
    fn general_category_is_a_valid_name() {
        assert_eq!(CategoryName::general(), CategoryName::new("General").unwrap());
    }
}
