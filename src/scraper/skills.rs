use crate::utils::config::SkillRequirement;

/// Skill keywords split by requirement, lowercased once at construction.
///
/// With any required keyword configured, a job matches when at least one required
/// keyword appears; optional keywords are then ignored. Without required keywords,
/// any optional keyword suffices, and an empty list matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillPolicy {
    required: Vec<String>,
    optional: Vec<String>,
}

impl SkillPolicy {
    pub fn new(skills: &[SkillRequirement]) -> Self {
        let (required, optional): (Vec<_>, Vec<_>) =
            skills.iter().partition(|skill| skill.is_required());

        let lower = |group: Vec<&SkillRequirement>| -> Vec<String> {
            group
                .into_iter()
                .map(|skill| skill.keyword().to_lowercase())
                .collect()
        };

        Self {
            required: lower(required),
            optional: lower(optional),
        }
    }

    /// `haystack` must already be lowercased.
    pub fn matches(&self, haystack: &str) -> bool {
        let found = |keywords: &[String]| keywords.iter().any(|k| haystack.contains(k.as_str()));

        if !self.required.is_empty() {
            found(&self.required)
        } else if !self.optional.is_empty() {
            found(&self.optional)
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword(name: &str) -> SkillRequirement {
        SkillRequirement::Keyword(name.to_string())
    }

    fn requirement(name: &str, required: bool) -> SkillRequirement {
        SkillRequirement::Requirement {
            name: name.to_string(),
            required,
        }
    }

    #[test]
    fn required_keyword_must_be_present() {
        let policy = SkillPolicy::new(&[requirement("rust", true)]);
        assert!(!policy.matches("senior go developer"));
        assert!(policy.matches("we write rust and nothing else"));
    }

    #[test]
    fn optional_hit_does_not_rescue_missing_required() {
        let policy = SkillPolicy::new(&[requirement("rust", true), keyword("python")]);
        assert!(!policy.matches("python shop"));
        assert!(policy.matches("rust backend"));
    }

    #[test]
    fn one_required_keyword_suffices() {
        let policy = SkillPolicy::new(&[requirement("rust", true), requirement("kafka", true)]);
        assert!(policy.matches("rust only"));
    }

    #[test]
    fn optional_keywords_are_ored() {
        let policy = SkillPolicy::new(&[keyword("go"), keyword("python")]);
        assert!(!policy.matches("java and kotlin"));
        assert!(policy.matches("python developer"));
        assert!(policy.matches("golang developer"));
    }

    #[test]
    fn non_required_tables_count_as_optional() {
        let policy = SkillPolicy::new(&[requirement("elixir", false)]);
        assert!(!policy.matches("ruby"));
        assert!(policy.matches("elixir and phoenix"));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let policy = SkillPolicy::new(&[keyword("TypeScript")]);
        assert!(policy.matches("strong typescript skills"));
    }

    #[test]
    fn empty_list_matches_everything() {
        let policy = SkillPolicy::new(&[]);
        assert!(policy.matches(""));
        assert!(policy.matches("anything at all"));
    }
}
