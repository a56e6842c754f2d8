//! Branch name templates.
//!
//! A template such as `{type}/{issue}-{title}` is filled in from an
//! [`Issue`]. Free-text fields are slugified so the result is a valid ref name.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::trackers::Issue;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([^{}]*)\}").unwrap();
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BranchNameError {
    #[error("Can't create branch, issue has no assignee and branch format requires it")]
    MissingAssignee,

    #[error("Unknown placeholder '{{{0}}}' in branch_name_format")]
    UnknownPlaceholder(String),

    #[error("Branch name format produced an empty name")]
    Empty,
}

/// Lowercase ASCII slug: anything that is not a letter or digit becomes a single `-`
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    NON_ALNUM
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Render `format` for `issue`
pub fn format_branch_name(format: &str, issue: &Issue) -> Result<String, BranchNameError> {
    let mut name = String::with_capacity(format.len() + issue.title.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(format) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        name.push_str(&format[last..whole.start]);
        last = whole.end;

        let value = match &caps[1] {
            "issue" | "id" => issue.id.to_string(),
            "title" => slugify(&issue.title),
            "type" | "issuetype" => slugify(&issue.issue_type),
            "assignee" => match &issue.assignee {
                Some(assignee) => slugify(assignee),
                None => return Err(BranchNameError::MissingAssignee),
            },
            other => return Err(BranchNameError::UnknownPlaceholder(other.to_string())),
        };
        name.push_str(&value);
    }
    name.push_str(&format[last..]);

    let name = name.trim_matches(|c: char| c == '-' || c == '/').to_string();
    if name.is_empty() {
        return Err(BranchNameError::Empty);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Fix login bug"), "fix-login-bug");
        assert_eq!(slugify("  Add: dark mode!! (v2) "), "add-dark-mode-v2");
        assert_eq!(slugify("Crème brûlée"), "cr-me-br-l-e");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_default_format() {
        let issue = Issue::new(456, "Add dark mode");
        assert_eq!(
            format_branch_name("{issue}-{title}", &issue).unwrap(),
            "456-add-dark-mode"
        );
    }

    #[test]
    fn test_all_placeholders() {
        let issue = Issue::new("ENG-7", "Speed up CI")
            .with_type("Bug")
            .with_assignee("Ada Lovelace");
        assert_eq!(
            format_branch_name("{assignee}/{type}/{id}-{title}", &issue).unwrap(),
            "ada-lovelace/bug/ENG-7-speed-up-ci"
        );
        assert_eq!(
            format_branch_name("{issuetype}/{issue}", &issue).unwrap(),
            "bug/ENG-7"
        );
    }

    #[test]
    fn test_missing_assignee_is_error() {
        let issue = Issue::new(123, "Fix login bug");
        let err = format_branch_name("{issue}-{assignee}-{title}", &issue).unwrap_err();
        assert_eq!(err, BranchNameError::MissingAssignee);
        assert_eq!(
            err.to_string(),
            "Can't create branch, issue has no assignee and branch format requires it"
        );
    }

    #[test]
    fn test_missing_assignee_ok_when_not_in_format() {
        let issue = Issue::new(123, "Fix login bug");
        assert!(format_branch_name("{issue}-{title}", &issue).is_ok());
    }

    #[test]
    fn test_unknown_placeholder() {
        let issue = Issue::new(1, "x");
        let err = format_branch_name("{issue}-{milestone}", &issue).unwrap_err();
        assert_eq!(err, BranchNameError::UnknownPlaceholder("milestone".to_string()));
        assert_eq!(
            err.to_string(),
            "Unknown placeholder '{milestone}' in branch_name_format"
        );
    }

    #[test]
    fn test_empty_title_trims_separator() {
        let issue = Issue::new(9, "!!!");
        assert_eq!(format_branch_name("{issue}-{title}", &issue).unwrap(), "9");
    }
}
