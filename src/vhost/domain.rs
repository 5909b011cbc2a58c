//! Domain rules
//!
//! A domain is a glob-style hostname pattern selecting a virtual host.

use std::collections::HashMap;

use regex::Regex;

use super::state::ItemState;
use super::stream::Stream;

/// A hostname pattern owned by a virtual host
pub struct Domain {
    /// The configured pattern (e.g. "*.example.com")
    pub name: String,

    /// Compiled matcher; `None` when the pattern does not compile, in
    /// which case the domain can never match but reconciliation
    /// proceeds
    matcher: Option<Regex>,

    /// Streams pulled because of this domain rule
    pub stream_map: HashMap<u32, Stream>,

    /// Reconciliation state
    pub state: ItemState,
}

impl Domain {
    /// Create a domain rule from its pattern
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let matcher = compile_pattern(&name);

        if matcher.is_none() {
            tracing::warn!(pattern = %name, "Domain pattern does not compile; it will never match");
        }

        Self {
            name,
            matcher,
            stream_map: HashMap::new(),
            state: ItemState::New,
        }
    }

    /// Whether `host` matches this domain's pattern
    pub fn matches(&self, host: &str) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.is_match(host))
    }
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Domain")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("streams", &self.stream_map.len())
            .finish_non_exhaustive()
    }
}

/// Compile a glob pattern into an anchored regex
///
/// Regex metacharacters are escaped first, then `*` becomes `.*` and
/// `?` becomes `.?`.
fn compile_pattern(name: &str) -> Option<Regex> {
    let escaped = regex::escape(name)
        .replace(r"\*", ".*")
        .replace(r"\?", ".?");

    Regex::new(&format!("^{}$", escaped)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_pattern() {
        let domain = Domain::new("*.example.com");

        assert!(domain.matches("a.example.com"));
        assert!(domain.matches("deep.sub.example.com"));
        assert!(!domain.matches("example.com"));
        assert!(!domain.matches("a.example.org"));
    }

    #[test]
    fn test_literal_pattern() {
        let domain = Domain::new("stream.example.com");

        assert!(domain.matches("stream.example.com"));
        // Dots are literal, not regex wildcards
        assert!(!domain.matches("streamXexampleXcom"));
    }

    #[test]
    fn test_question_mark_pattern() {
        let domain = Domain::new("cdn?.example.com");

        assert!(domain.matches("cdn1.example.com"));
        assert!(domain.matches("cdn.example.com"));
        assert!(!domain.matches("cdn12.example.com"));
    }
}
