use derive_more::{AsRef, Deref, Display};

/// Grouping identity of an exercise across all record sources.
///
/// Two names which only differ in case or surrounding whitespace result in the same key.
/// Internal whitespace and punctuation are kept as they are.
#[derive(AsRef, Deref, Debug, Display, Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseKey(String);

impl ExerciseKey {
    #[must_use]
    pub fn new(name: &str) -> Self {
        ExerciseKey(normalize(name))
    }
}

impl From<&str> for ExerciseKey {
    fn from(value: &str) -> Self {
        ExerciseKey::new(value)
    }
}

/// Trim the name, lowercase it and uppercase only its first character.
#[must_use]
pub fn normalize(name: &str) -> String {
    let lowercase = name.trim().to_lowercase();
    let mut chars = lowercase.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
