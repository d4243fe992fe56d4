//! Ordered first-match-wins line classification

use tracing::trace;

/// One classification rule. Rules are tried in slice order.
pub struct Rule<S> {
    pub field: &'static str,
    pub matches: fn(&str) -> bool,
    pub apply: fn(&mut S, &str),
}

/// Apply the first matching rule to each line.
///
/// Each line contributes to at most one rule; lines matching nothing are
/// skipped.
pub fn classify<'a, S>(lines: impl IntoIterator<Item = &'a str>, rules: &[Rule<S>], state: &mut S) {
    for line in lines {
        match rules.iter().find(|rule| (rule.matches)(line)) {
            Some(rule) => {
                trace!("line {:?} classified as {}", line, rule.field);
                (rule.apply)(state, line);
            }
            None => trace!("line {:?} matched no rule", line),
        }
    }
}
