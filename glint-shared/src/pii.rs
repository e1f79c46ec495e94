use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for customer contact data (emails, phone numbers) carried on
/// tokens and records. Debug and Display render a fixed mask, so claims
/// and events can be logged wholesale without leaking the value.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Wire formats (JWT claims, API responses) carry the real value;
        // the mask applies only to the log-facing trait impls.
        self.0.serialize(serializer)
    }
}

impl<T> From<T> for Masked<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}
