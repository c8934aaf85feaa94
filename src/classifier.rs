/// How a single target character renders.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum CharClass {
    Correct,
    Incorrect,
    /// caret position of the active token
    Pending,
    Untyped,
}

/// Classify every character of `target` against what was typed for it.
///
/// Comparison is per `char`. A committed (inactive) token typed shorter than
/// its target scores the missing tail as incorrect.
pub fn classify(target: &str, typed: &str, is_active: bool) -> Vec<CharClass> {
    let typed: Vec<char> = typed.chars().collect();

    target
        .chars()
        .enumerate()
        .map(|(i, expected)| match typed.get(i) {
            Some(&c) if c == expected => CharClass::Correct,
            Some(_) => CharClass::Incorrect,
            None if is_active && i == typed.len() => CharClass::Pending,
            None if is_active => CharClass::Untyped,
            None => CharClass::Incorrect,
        })
        .collect()
}

/// Number of positions where `typed` matches `target`, capped at the shorter length.
pub fn match_len(target: &str, typed: &str) -> usize {
    target
        .chars()
        .zip(typed.chars())
        .filter(|(expected, actual)| expected == actual)
        .count()
}
