use std::fmt;
use std::str::FromStr;

bitflags::bitflags! {
    /// Channel access capabilities granted through a channel's access list.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u32 {
        const VOICE = 1 << 0;
        const AUTOVOICE = 1 << 1;
        const HALFOP = 1 << 2;
        const AUTOHALFOP = 1 << 3;
        const OP = 1 << 4;
        const AUTOOP = 1 << 5;
        /// May change the channel topic through services.
        const TOPIC = 1 << 6;
        const SET = 1 << 7;
        const REMOVE = 1 << 8;
        const INVITE = 1 << 9;
        const RECOVER = 1 << 10;
        const FLAGS = 1 << 11;
        const ACLVIEW = 1 << 12;
        const FOUNDER = 1 << 13;
        const AKICK = 1 << 14;
        const EXEMPT = 1 << 15;
    }
}

/// Flag letters in display order.
const LETTERS: &[(char, AccessFlags)] = &[
    ('v', AccessFlags::VOICE),
    ('V', AccessFlags::AUTOVOICE),
    ('h', AccessFlags::HALFOP),
    ('H', AccessFlags::AUTOHALFOP),
    ('o', AccessFlags::OP),
    ('O', AccessFlags::AUTOOP),
    ('t', AccessFlags::TOPIC),
    ('s', AccessFlags::SET),
    ('r', AccessFlags::REMOVE),
    ('i', AccessFlags::INVITE),
    ('R', AccessFlags::RECOVER),
    ('f', AccessFlags::FLAGS),
    ('A', AccessFlags::ACLVIEW),
    ('F', AccessFlags::FOUNDER),
    ('b', AccessFlags::AKICK),
    ('e', AccessFlags::EXEMPT),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown access flag '{0}'")]
pub struct InvalidFlag(pub char);

impl AccessFlags {
    pub fn from_letter(letter: char) -> Option<Self> {
        LETTERS
            .iter()
            .find(|(c, _)| *c == letter)
            .map(|(_, flag)| *flag)
    }
}

impl FromStr for AccessFlags {
    type Err = InvalidFlag;

    /// Parses a flag string such as `+Aiotv`. A leading `+` is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('+')
            .unwrap_or(s)
            .chars()
            .try_fold(AccessFlags::empty(), |acc, c| {
                AccessFlags::from_letter(c)
                    .map(|flag| acc | flag)
                    .ok_or(InvalidFlag(c))
            })
    }
}

impl fmt::Display for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("+")?;
        for (letter, flag) in LETTERS {
            if self.contains(*flag) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flag_string() {
        let flags: AccessFlags = "+Aiotv".parse().unwrap();
        assert!(flags.contains(AccessFlags::TOPIC));
        assert!(flags.contains(AccessFlags::OP | AccessFlags::VOICE));
        assert!(!flags.contains(AccessFlags::FOUNDER));
    }

    #[test]
    fn plus_sign_is_optional() {
        assert_eq!("t".parse::<AccessFlags>(), Ok(AccessFlags::TOPIC));
        assert_eq!("+".parse::<AccessFlags>(), Ok(AccessFlags::empty()));
    }

    #[test]
    fn letters_are_case_sensitive() {
        assert_eq!("o".parse::<AccessFlags>(), Ok(AccessFlags::OP));
        assert_eq!("O".parse::<AccessFlags>(), Ok(AccessFlags::AUTOOP));
        assert_eq!("+tx".parse::<AccessFlags>(), Err(InvalidFlag('x')));
    }

    #[test]
    fn displays_in_canonical_order() {
        let flags = AccessFlags::TOPIC | AccessFlags::VOICE | AccessFlags::ACLVIEW;
        assert_eq!(flags.to_string(), "+vtA");
    }
}
