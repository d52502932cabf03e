//! Robots.txt parser implementation
//!
//! This module turns robots.txt content into the [`Group`] that applies to a
//! given user agent, driving the robotstxt crate's parse callbacks.

use crate::robots::rules::{Group, Rule};
use robotstxt::{parse_robotstxt, RobotsParseHandler};
use std::time::Duration;

/// A user-agent block as declared in the file
#[derive(Debug, Default)]
struct DeclaredGroup {
    agents: Vec<String>,
    rules: Vec<Rule>,
    crawl_delay: Option<Duration>,
}

/// Collects declared groups from parse callbacks
///
/// Consecutive `User-agent` lines open one group; the first rule line after
/// them closes the agent list.
#[derive(Debug, Default)]
struct GroupCollector {
    groups: Vec<DeclaredGroup>,
    collecting_agents: bool,
}

impl GroupCollector {
    fn current(&mut self) -> Option<&mut DeclaredGroup> {
        self.collecting_agents = false;
        self.groups.last_mut()
    }

    fn push_rule(&mut self, value: &str, allow: bool) {
        let value = value.trim();
        // An empty Disallow/Allow value places no restriction
        if value.is_empty() {
            return;
        }
        let Some(rule) = Rule::new(value, allow) else {
            tracing::debug!("Skipping uncompilable robots rule: {}", value);
            return;
        };
        if let Some(group) = self.current() {
            group.rules.push(rule);
        }
    }
}

impl RobotsParseHandler for GroupCollector {
    fn handle_robots_start(&mut self) {
        self.groups.clear();
        self.collecting_agents = false;
    }

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        if !self.collecting_agents {
            self.groups.push(DeclaredGroup::default());
            self.collecting_agents = true;
        }
        if let Some(group) = self.groups.last_mut() {
            group.agents.push(user_agent.trim().to_lowercase());
        }
    }

    fn handle_allow(&mut self, _line_num: u32, value: &str) {
        self.push_rule(value, true);
    }

    fn handle_disallow(&mut self, _line_num: u32, value: &str) {
        self.push_rule(value, false);
    }

    fn handle_sitemap(&mut self, _line_num: u32, _value: &str) {}

    fn handle_unknown_action(&mut self, _line_num: u32, action: &str, value: &str) {
        if !action.trim().eq_ignore_ascii_case("crawl-delay") {
            return;
        }
        let Ok(seconds) = value.trim().parse::<f64>() else {
            return;
        };
        if !seconds.is_finite() || seconds < 0.0 {
            return;
        }
        if let Some(group) = self.current() {
            group.crawl_delay = Some(Duration::from_secs_f64(seconds));
        }
    }
}

/// Checks whether a group declared for `declared` names our (lowercase) agent
///
/// `Mozilla/5.0 (compatible; Googlebot/2.1; ...)` matches groups declared for
/// `googlebot` as well as for `mozilla`, so the whole string is matched by
/// containment.
fn agent_matches(declared: &str, user_agent: &str) -> bool {
    !declared.is_empty() && declared != "*" && user_agent.contains(declared)
}

/// Builds the group that applies to `user_agent` from robots.txt content
///
/// A group naming the agent wins over the `*` group; among named groups the
/// longest matching agent wins. Rules of every block that applies are
/// merged in file order.
///
/// # Returns
///
/// * `Some(Group)` - A group applies to the agent
/// * `None` - The file declares nothing for this agent
pub fn parse_group(content: &str, user_agent: &str) -> Option<Group> {
    let mut collector = GroupCollector::default();
    parse_robotstxt(content, &mut collector);

    let normalized_agent = user_agent.to_lowercase();

    let best_specific = collector
        .groups
        .iter()
        .flat_map(|g| g.agents.iter())
        .filter(|a| agent_matches(a, &normalized_agent))
        .max_by_key(|a| a.len())
        .cloned();

    let selected_agent = match best_specific {
        Some(agent) => agent,
        None if collector
            .groups
            .iter()
            .any(|g| g.agents.iter().any(|a| a == "*")) =>
        {
            "*".to_string()
        }
        None => return None,
    };

    let mut rules = Vec::new();
    let mut crawl_delay = None;
    for group in collector
        .groups
        .into_iter()
        .filter(|g| g.agents.iter().any(|a| *a == selected_agent))
    {
        rules.extend(group.rules);
        crawl_delay = crawl_delay.or(group.crawl_delay);
    }

    Some(Group::new(
        selected_agent,
        rules,
        crawl_delay.unwrap_or(Duration::ZERO),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = "TestBot/1.0";

    #[test]
    fn test_parse_disallow_specific() {
        let group = parse_group("User-agent: *\nDisallow: /admin", AGENT).unwrap();
        assert_eq!(group.agent(), "*");
        assert!(group.test("/"));
        assert!(group.test("/page"));
        assert!(!group.test("/admin"));
        assert!(!group.test("/admin/users"));
    }

    #[test]
    fn test_parse_allow_and_disallow() {
        let content = "User-agent: *\nDisallow: /private\nAllow: /private/public";
        let group = parse_group(content, AGENT).unwrap();
        assert!(!group.test("/private"));
        assert!(group.test("/private/public"));
    }

    #[test]
    fn test_specific_agent_preferred_over_wildcard() {
        let content = "User-agent: *\nDisallow: /\n\nUser-agent: testbot\nDisallow: /secret";
        let group = parse_group(content, AGENT).unwrap();
        assert_eq!(group.agent(), "testbot");
        assert!(group.test("/page"));
        assert!(!group.test("/secret"));
    }

    #[test]
    fn test_other_agent_group_ignored() {
        let content = "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let group = parse_group(content, "GoodBot").unwrap();
        assert!(group.test("/page"));
        let group = parse_group(content, "BadBot").unwrap();
        assert!(!group.test("/page"));
    }

    #[test]
    fn test_default_user_agent_matches_googlebot_group() {
        let content = "User-agent: Googlebot\nDisallow: /nogoogle\n\nUser-agent: *\nDisallow: /";
        let group = parse_group(content, crate::config::DEFAULT_USER_AGENT).unwrap();
        assert_eq!(group.agent(), "googlebot");
        assert!(group.test("/page"));
        assert!(!group.test("/nogoogle"));
    }

    #[test]
    fn test_multiple_agents_share_group() {
        let content = "User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 3\nDisallow: /x";
        let group = parse_group(content, "BotB").unwrap();
        assert_eq!(group.crawl_delay(), Duration::from_secs(3));
        assert!(!group.test("/x"));
        assert!(parse_group(content, "BotC").is_none());
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let content = "User-agent: *\nCrawl-delay: 10\nDisallow: /admin";
        let group = parse_group(content, AGENT).unwrap();
        assert_eq!(group.crawl_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_crawl_delay_decimal_and_case() {
        let content = "User-agent: *\ncrawl-delay: 2.5";
        let group = parse_group(content, AGENT).unwrap();
        assert_eq!(group.crawl_delay(), Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_crawl_delay_ignored() {
        let content = "User-agent: *\nCrawl-delay: soon\nDisallow: /a";
        let group = parse_group(content, AGENT).unwrap();
        assert_eq!(group.crawl_delay(), Duration::ZERO);
    }

    #[test]
    fn test_empty_disallow_allows_everything() {
        let group = parse_group("User-agent: *\nDisallow:", AGENT).unwrap();
        assert!(group.rules().is_empty());
        assert!(group.test("/anything"));
    }

    #[test]
    fn test_empty_content() {
        assert!(parse_group("", AGENT).is_none());
    }

    #[test]
    fn test_garbage_content() {
        assert!(parse_group("This is not valid robots.txt {{{", AGENT).is_none());
    }

    #[test]
    fn test_wildcard_rule_parsed() {
        let group = parse_group("User-agent: *\nDisallow: /*.pdf$", AGENT).unwrap();
        assert!(!group.test("/files/a.pdf"));
        assert!(group.test("/files/a.html"));
    }
}
