use crate::activity::{ActivityRecord, Category};
use crate::constants::{GOAL_TITLE_DIRECTIVES, GOAL_TOKEN_MIN_CHARS};

/// Lower-case a title and drop one leading directive such as "limit ".
/// Returns `None` when nothing usable is left.
#[must_use]
pub fn goal_keyword(title: &str) -> Option<String> {
    let lowered = title.trim_start().to_lowercase();
    let stripped = GOAL_TITLE_DIRECTIVES
        .iter()
        .find_map(|directive| lowered.strip_prefix(directive))
        .unwrap_or(lowered.as_str())
        .trim();
    (!stripped.is_empty()).then(|| stripped.to_string())
}

/// Decides which activities count toward a goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalMatcher {
    category: Category,
    keyword: Option<String>,
}

impl GoalMatcher {
    #[must_use]
    pub fn new(category: Category, title: Option<&str>) -> Self {
        Self {
            category,
            keyword: title.and_then(goal_keyword),
        }
    }

    #[must_use]
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    #[must_use]
    pub fn matches(&self, activity: &ActivityRecord) -> bool {
        if activity.category != self.category {
            return false;
        }
        let Some(keyword) = &self.keyword else {
            return true;
        };
        let name = activity.name.to_lowercase();
        name.contains(keyword.as_str())
            || keyword.contains(name.as_str())
            || keyword
                .split_whitespace()
                .filter(|word| word.chars().count() >= GOAL_TOKEN_MIN_CHARS)
                .any(|word| name.contains(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn named(name: &str, category: Category) -> ActivityRecord {
        let at = Utc.with_ymd_and_hms(2025, 1, 8, 12, 0, 0).unwrap();
        ActivityRecord::scored(1, 1, name, category, Some(30), false, at)
    }

    #[test]
    fn strips_one_leading_directive() {
        assert_eq!(goal_keyword("Limit Gaming").as_deref(), Some("gaming"));
        assert_eq!(goal_keyword("  Reduce social media ").as_deref(), Some("social media"));
        assert_eq!(goal_keyword("limit limit scrolling").as_deref(), Some("limit scrolling"));
        assert_eq!(goal_keyword("Limit "), None);
        assert_eq!(goal_keyword("   "), None);
        assert_eq!(goal_keyword("Limit").as_deref(), Some("limit"));
    }

    #[test]
    fn matches_substrings_both_ways_and_long_tokens() {
        let matcher = GoalMatcher::new(Category::Leisure, Some("Limit video games"));
        assert!(matcher.matches(&named("Played video games with Sam", Category::Leisure)));
        assert!(matcher.matches(&named("Video", Category::Leisure)));
        assert!(matcher.matches(&named("board games night", Category::Leisure)));
        assert!(!matcher.matches(&named("watched tv", Category::Leisure)));
        assert!(!matcher.matches(&named("video games", Category::Career)));
    }

    #[test]
    fn short_tokens_are_ignored() {
        let matcher = GoalMatcher::new(Category::Health, Some("Target run far"));
        assert_eq!(matcher.keyword(), Some("run far"));
        assert!(!matcher.matches(&named("fun run", Category::Health)));
        assert!(matcher.matches(&named("run", Category::Health)));
    }

    #[test]
    fn blank_title_matches_by_category() {
        let matcher = GoalMatcher::new(Category::Career, Some("achieve "));
        assert!(matcher.keyword().is_none());
        assert!(matcher.matches(&named("anything", Category::Career)));
        assert!(GoalMatcher::new(Category::Career, None).matches(&named("x", Category::Career)));
    }
}
