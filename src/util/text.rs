//! Text helpers for command templates and raw tool output

const GIT_REPO_PLACEHOLDER: &str = "%GIT_REPO%";
const GIT_BRANCH_PLACEHOLDER: &str = "%GIT_BRANCH%";
const GIT_SSH_KEY_PLACEHOLDER: &str = "%GIT_PRIVATE_SSH_KEY%";

/// Suppression marker recognized on a flagged source line
pub const NOHUSKY_MARKER: &str = "#nohusky";

/// Requirements file name the safety image writes its warnings against
const SAFETY_REQUIREMENTS_FILE: &str = "safety_scanfleet_requirements_raw.txt";

/// Renders a scanner command template.
///
/// Returns an empty string when the repository URL, branch or template is empty;
/// callers treat that as "nothing runnable".
pub fn render_command(template: &str, url: &str, branch: &str, ssh_key: &str) -> String {
    if url.is_empty() || branch.is_empty() || template.is_empty() {
        return String::new();
    }

    template
        .replace(GIT_REPO_PLACEHOLDER, url)
        .replace(GIT_BRANCH_PLACEHOLDER, branch)
        .replace(GIT_SSH_KEY_PLACEHOLDER, ssh_key)
}

/// Last line of `s`, or empty when `s` is empty
pub fn last_line(s: &str) -> &str {
    s.lines().last().unwrap_or("")
}

/// Every line of `s` except the last one
pub fn all_lines_but_last(s: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = s.lines().collect();
    lines.pop();
    lines
}

/// Escapes stray backslashes so safety's JSON survives deserialization
pub fn sanitize_safety_json(s: &str) -> String {
    s.replace('\\', "\\\\").replace("\\\"", "\\\\\"")
}

/// Rewrites a safety "unpinned requirement" warning into a user-facing hint
pub fn adjust_warning_message(raw: &str) -> String {
    let mut parts = raw.split(':');
    let _prefix = parts.next();
    match parts.next() {
        Some(message) => {
            let message = message
                .replace(SAFETY_REQUIREMENTS_FILE, "'requirements.txt'")
                .replace(" unpinned", "Unpinned");
            format!(
                "{} It can be checked if you pin it in a format such as this: \"mypacket==3.2.9\"",
                message
            )
        }
        None => raw.to_string(),
    }
}

/// True when the numbered code snippet carries the suppression marker on `line_number`.
///
/// Snippets look like `"41 secret = 'x'\n42 password = 'y' #nohusky\n"`: each line starts
/// with its source line number.
pub fn has_nohusky_marker(code: &str, line_number: u64) -> bool {
    let wanted = line_number.to_string();
    code.lines().any(|line| {
        let trimmed = line.trim_start();
        let number: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
        number == wanted && line.contains(NOHUSKY_MARKER)
    })
}

/// Removes duplicates while keeping first-seen order
pub fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
