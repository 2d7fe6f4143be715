use std::fmt;

use uuid::Uuid;

/// Correlation id that follows a single refresh cycle through the logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_ids_are_unique_and_hyphenated() {
        let a = TraceId::new();
        let b = TraceId::new();

        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 36);
        assert_eq!(a.to_string(), a.as_uuid().to_string());
    }
}
