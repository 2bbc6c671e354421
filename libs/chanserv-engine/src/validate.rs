use crate::config::LimitsConfig;
use crate::error::TopicError;

/// mIRC formatting codes: bold, colour, reset, reverse, italic, underline.
const FORMATTING_CODES: &[char] = &['\x02', '\x03', '\x0f', '\x16', '\x1d', '\x1f'];

/// Checks candidate topics against length and content rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicValidator {
    max_len: usize,
    allow_formatting: bool,
}

impl TopicValidator {
    pub fn new(max_len: usize, allow_formatting: bool) -> Self {
        Self {
            max_len,
            allow_formatting,
        }
    }

    /// Length bound in bytes, shared with the composer's pre-check.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn is_valid_topic_text(&self, text: &str) -> bool {
        if text.len() > self.max_len {
            return false;
        }
        // NUL, CR and LF would end or split the protocol line.
        if text.contains(['\0', '\r', '\n']) {
            return false;
        }
        self.allow_formatting || !text.contains(FORMATTING_CODES)
    }

    pub fn validate(&self, text: &str) -> Result<(), TopicError> {
        if self.is_valid_topic_text(text) {
            Ok(())
        } else {
            Err(TopicError::InvalidTopic)
        }
    }
}

impl From<LimitsConfig> for TopicValidator {
    fn from(limits: LimitsConfig) -> Self {
        Self::new(limits.max_topic_len, limits.allow_formatting)
    }
}

impl Default for TopicValidator {
    fn default() -> Self {
        LimitsConfig::default().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_bound_is_inclusive() {
        let v = TopicValidator::new(10, true);
        assert!(v.validate(&"a".repeat(10)).is_ok());
        assert_eq!(v.validate(&"a".repeat(11)), Err(TopicError::InvalidTopic));
    }

    #[test]
    fn line_breaks_and_nul_are_always_rejected() {
        let v = TopicValidator::new(100, true);
        for bad in ["a\rb", "a\nb", "a\0b"] {
            assert!(!v.is_valid_topic_text(bad), "{bad:?}");
        }
    }

    #[test]
    fn formatting_codes_follow_policy() {
        let text = "\x02bold\x02 and \x0304red";
        assert!(TopicValidator::new(100, true).is_valid_topic_text(text));
        assert!(!TopicValidator::new(100, false).is_valid_topic_text(text));
    }

    #[test]
    fn empty_topic_is_valid() {
        assert!(TopicValidator::default().validate("").is_ok());
    }

    #[test]
    fn bound_counts_bytes() {
        let v = TopicValidator::new(4, true);
        assert!(v.validate("éé").is_ok());
        assert!(v.validate("ééé").is_err());
    }
}
