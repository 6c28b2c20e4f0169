use uuid::Uuid;

use crate::MediaKind;

/// Strategy for naming stored objects. Names never come from user input.
pub trait NameStrategy: Send + Sync {
    /// Generate a fresh object name for an upload of `kind`
    fn generate(&self, kind: MediaKind) -> String;
}

/// Default strategy: `<uuid v4>.<ext>`, safe under concurrent invocation
#[derive(Debug, Clone, Default)]
pub struct RandomNameStrategy;

impl NameStrategy for RandomNameStrategy {
    fn generate(&self, kind: MediaKind) -> String {
        format!("{}.{}", Uuid::new_v4().simple(), kind.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_carry_the_kind_extension() {
        let names = RandomNameStrategy;
        assert!(names.generate(MediaKind::Image).ends_with(".jpg"));
        assert!(names.generate(MediaKind::Video).ends_with(".mp4"));
    }

    #[test]
    fn rapid_calls_never_repeat() {
        let names = RandomNameStrategy;
        let generated: HashSet<String> = (0..10_000)
            .map(|_| names.generate(MediaKind::Image))
            .collect();
        assert_eq!(generated.len(), 10_000);
    }

    #[test]
    fn token_is_a_simple_uuid() {
        let name = RandomNameStrategy.generate(MediaKind::Video);
        let token = name.strip_suffix(".mp4").unwrap();
        assert_eq!(token.len(), 32);
        assert!(Uuid::parse_str(token).is_ok());
    }
}
