//! Robots rules and rule groups
//!
//! A [`Group`] is the set of allow/disallow rules and crawl-delay that applies
//! to one user agent on one domain. Groups are immutable once built.

use regex::Regex;
use std::time::Duration;

/// Precedence weight of a bare `/` rule when nothing else matched
const CATCH_ALL_WEIGHT: usize = 1;

/// A single robots directive
#[derive(Debug, Clone)]
pub struct Rule {
    path: String,
    allow: bool,
    pattern: Option<Regex>,
}

impl Rule {
    /// Creates a rule, compiling a wildcard matcher when the path uses `*` or `$`
    ///
    /// Returns None if the wildcard path cannot be compiled.
    pub fn new(path: impl Into<String>, allow: bool) -> Option<Self> {
        let path = path.into();
        let pattern = if path.contains('*') || path.contains('$') {
            Some(compile_wildcard(&path)?)
        } else {
            None
        };
        Some(Self {
            path,
            allow,
            pattern,
        })
    }

    pub fn allow(path: impl Into<String>) -> Option<Self> {
        Self::new(path, true)
    }

    pub fn disallow(path: impl Into<String>) -> Option<Self> {
        Self::new(path, false)
    }

    /// The path as written in robots.txt
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_allow(&self) -> bool {
        self.allow
    }

    pub fn has_pattern(&self) -> bool {
        self.pattern.is_some()
    }
}

/// Compiles a robots wildcard path into an anchored regex
///
/// `*` matches any run of characters and a trailing `$` anchors the end of
/// the path; everything else is literal.
fn compile_wildcard(path: &str) -> Option<Regex> {
    let (body, anchored) = match path.strip_suffix('$') {
        Some(body) => (body, true),
        None => (path, false),
    };

    let mut source = String::with_capacity(body.len() + 8);
    source.push('^');
    for (i, literal) in body.split('*').enumerate() {
        if i > 0 {
            source.push_str(".*");
        }
        source.push_str(&regex::escape(literal));
    }
    if anchored {
        source.push('$');
    }

    Regex::new(&source).ok()
}

/// The rules applicable to one user agent on one domain
#[derive(Debug, Clone, Default)]
pub struct Group {
    rules: Vec<Rule>,
    agent: String,
    crawl_delay: Duration,
}

impl Group {
    pub fn new(agent: impl Into<String>, rules: Vec<Rule>, crawl_delay: Duration) -> Self {
        Self {
            rules,
            agent: agent.into(),
            crawl_delay,
        }
    }

    /// The user agent line this group was declared for
    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Crawl-delay declared for the group, zero if none
    pub fn crawl_delay(&self) -> Duration {
        self.crawl_delay
    }

    /// Finds the rule deciding `path`
    ///
    /// A wildcard rule weighs the length of its path text, a literal prefix
    /// rule the length of its prefix, and a bare `/` only applies while
    /// nothing else has matched. Ties keep the first declared rule.
    pub fn find_rule(&self, path: &str) -> Option<&Rule> {
        let mut best = None;
        let mut weight = 0;

        for rule in &self.rules {
            if let Some(pattern) = &rule.pattern {
                if pattern.is_match(path) && rule.path.len() > weight {
                    weight = rule.path.len();
                    best = Some(rule);
                }
            } else if rule.path == "/" && weight == 0 {
                weight = CATCH_ALL_WEIGHT;
                best = Some(rule);
            } else if path.starts_with(&rule.path) && rule.path.len() > weight {
                weight = rule.path.len();
                best = Some(rule);
            }
        }

        best
    }

    /// Tests whether `path` may be crawled; no matching rule means allowed
    pub fn test(&self, path: &str) -> bool {
        self.find_rule(path).map_or(true, Rule::is_allow)
    }
}
