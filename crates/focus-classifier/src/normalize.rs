//! Distractor name normalization
//!
//! Window titles vary per document ("Inbox - Chrome", "News - Chrome"), so
//! distracted time is grouped under a stable application name before it is
//! attributed. Never used for target matching.

use serde::{Deserialize, Serialize};

/// Ledger bucket for ticks with no resolvable foreground window
pub const NO_ACTIVE_WINDOW: &str = "(no active window)";

/// Maps any title containing `keyword` to `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    /// Matched case-insensitively as a substring of the title
    pub keyword: String,
    /// Display name for the ledger
    pub name: String,
}

impl AliasRule {
    pub fn new(keyword: &str, name: &str) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            name: name.to_string(),
        }
    }
}

/// Ordered alias table; first matching rule wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppNameNormalizer {
    rules: Vec<AliasRule>,
}

impl Default for AppNameNormalizer {
    fn default() -> Self {
        Self::new(vec![
            AliasRule::new("chrome", "Google Chrome"),
            AliasRule::new("firefox", "Mozilla Firefox"),
            AliasRule::new("code", "Visual Studio Code"),
            AliasRule::new("word", "Microsoft Word"),
            AliasRule::new("excel", "Microsoft Excel"),
            AliasRule::new("powerpoint", "Microsoft PowerPoint"),
            AliasRule::new("file explorer", "File Explorer"),
            AliasRule::new("spotify", "Spotify"),
            AliasRule::new("terminal", "Terminal"),
            AliasRule::new("cmd", "Terminal"),
            AliasRule::new("powershell", "Terminal"),
        ])
    }
}

impl AppNameNormalizer {
    pub fn new(rules: Vec<AliasRule>) -> Self {
        let rules = rules
            .into_iter()
            .filter(|r| !r.keyword.trim().is_empty())
            .map(|r| AliasRule {
                keyword: r.keyword.trim().to_lowercase(),
                name: r.name,
            })
            .collect();
        Self { rules }
    }

    /// Normalizer that only trims titles
    pub fn passthrough() -> Self {
        Self { rules: Vec::new() }
    }

    /// Ledger key for a title
    pub fn normalize(&self, title: &str) -> String {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return NO_ACTIVE_WINDOW.to_string();
        }

        let lower = trimmed.to_lowercase();
        self.rules
            .iter()
            .find(|rule| lower.contains(&rule.keyword))
            .map(|rule| rule.name.clone())
            .unwrap_or_else(|| trimmed.to_string())
    }

    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_aliases() {
        let n = AppNameNormalizer::default();
        assert_eq!(n.normalize("Inbox - Google Chrome"), "Google Chrome");
        assert_eq!(n.normalize("Windows PowerShell"), "Terminal");
        assert_eq!(n.normalize("  Slack  "), "Slack");
    }

    #[test]
    fn test_first_rule_wins() {
        let n = AppNameNormalizer::new(vec![
            AliasRule::new("mail", "Mail"),
            AliasRule::new("chrome", "Google Chrome"),
        ]);
        assert_eq!(n.normalize("Gmail - Chrome"), "Mail");
    }

    #[test]
    fn test_empty_title_goes_to_sentinel() {
        let n = AppNameNormalizer::passthrough();
        assert_eq!(n.normalize(""), NO_ACTIVE_WINDOW);
        assert_eq!(n.normalize("   "), NO_ACTIVE_WINDOW);
        assert_eq!(n.normalize(" Browser "), "Browser");
    }
}
