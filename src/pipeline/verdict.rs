//! Analysis-wide result from container results

use crate::model::{Container, ScanResult};

/// Language whose scanners only escalate to a warning in pairs
pub const JAVASCRIPT: &str = "JavaScript";

/// Folds container results into the analysis result.
///
/// `failed` dominates `warning`, which dominates `passed`. A JavaScript warning
/// counts only when at least two JavaScript containers warned. Containers without
/// a result, or whose tool errored, do not move the verdict.
pub fn final_result<'a, I>(containers: I) -> ScanResult
where
    I: IntoIterator<Item = &'a Container>,
{
    let mut javascript_warnings = 0usize;
    let mut other_warnings = 0usize;

    for container in containers {
        match container.result {
            Some(ScanResult::Failed) => return ScanResult::Failed,
            Some(ScanResult::Warning) if container.language() == JAVASCRIPT => {
                javascript_warnings += 1;
            }
            Some(ScanResult::Warning) => other_warnings += 1,
            _ => {}
        }
    }

    if other_warnings > 0 || javascript_warnings >= 2 {
        ScanResult::Warning
    } else {
        ScanResult::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScannerScope, SecurityTest};
    use yare::parameterized;

    fn container(language: &str, result: Option<ScanResult>) -> Container {
        let mut container = Container::new(SecurityTest {
            name: format!("{}-scanner", language),
            image: "scanner".to_string(),
            image_tag: String::new(),
            command: "scan".to_string(),
            scope: ScannerScope::Language,
            language: language.to_string(),
            default_enabled: true,
            timeout_secs: 60,
        });
        container.result = result;
        container
    }

    use ScanResult::{Error, Failed, Passed, Warning};

    #[parameterized(
        all_passed = { &[("Go", Passed), ("Python", Passed)], Passed },
        one_failed = { &[("Go", Passed), ("Python", Failed), ("Ruby", Passed)], Failed },
        failed_beats_warning = { &[("Go", Warning), ("Python", Failed)], Failed },
        one_warning = { &[("Go", Warning), ("Python", Passed)], Warning },
        single_javascript_warning = { &[("JavaScript", Warning), ("Go", Passed)], Passed },
        two_javascript_warnings = { &[("JavaScript", Warning), ("JavaScript", Warning)], Warning },
        tool_error_ignored = { &[("Python", Error), ("Go", Passed)], Passed },
        empty = { &[], Passed },
    )]
    fn test_final_result(results: &[(&str, ScanResult)], expected: ScanResult) {
        let containers: Vec<_> = results
            .iter()
            .map(|(language, result)| container(language, Some(*result)))
            .collect();
        assert_eq!(final_result(&containers), expected);
    }

    #[test]
    fn test_unfinished_containers_ignored() {
        let containers = vec![container("Go", None), container("Python", Some(Passed))];
        assert_eq!(final_result(&containers), Passed);
    }
}
