//! Target application set

use serde::{Deserialize, Serialize};

use crate::ClassifierError;

/// Ordered, case-insensitive set of application names the user wants to
/// stay on. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TargetSet {
    /// Names as given (trimmed), in first-seen order
    names: Vec<String>,
    /// Lowercased keys, parallel to `names`
    keys: Vec<String>,
}

impl TargetSet {
    /// Build from raw names. Blank entries and case-insensitive duplicates
    /// are dropped; the first spelling wins.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for name in names {
            let trimmed = name.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            let key = trimmed.to_lowercase();
            if !set.keys.contains(&key) {
                set.names.push(trimmed.to_string());
                set.keys.push(key);
            }
        }
        set
    }

    /// Exact, trimmed, case-insensitive membership test
    pub fn matches(&self, title: &str) -> bool {
        let key = title.trim().to_lowercase();
        !key.is_empty() && self.keys.iter().any(|k| *k == key)
    }

    /// An empty set is accepted but can never produce a focused tick
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.names.is_empty() {
            Err(ClassifierError::InvalidTargetSet(
                "no target applications selected".into(),
            ))
        } else {
            Ok(())
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl From<Vec<String>> for TargetSet {
    fn from(names: Vec<String>) -> Self {
        Self::new(names)
    }
}

impl From<TargetSet> for Vec<String> {
    fn from(set: TargetSet) -> Self {
        set.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_case_insensitive_match() {
        let targets = TargetSet::new(["Editor", "  Terminal "]);

        assert!(targets.matches("editor"));
        assert!(targets.matches("  EDITOR  "));
        assert!(targets.matches("terminal"));
        // No substring matching
        assert!(!targets.matches("Editor - main.rs"));
        assert!(!targets.matches("Edit"));
        assert!(!targets.matches(""));
    }

    #[test]
    fn test_dedup_keeps_first_spelling() {
        let targets = TargetSet::new(["Editor", "EDITOR", "", "   ", "Browser"]);
        assert_eq!(targets.names(), &["Editor".to_string(), "Browser".to_string()]);
    }

    #[test]
    fn test_empty_set_is_invalid() {
        let targets = TargetSet::new(Vec::<String>::new());
        assert!(matches!(
            targets.validate(),
            Err(ClassifierError::InvalidTargetSet(_))
        ));
        assert!(!targets.matches("anything"));
    }
}
