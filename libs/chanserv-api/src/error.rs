use std::fmt;

/// Fault class reported back to the requester.
///
/// The command framework of the services process groups every failure
/// into one of these classes; clients key their behaviour off the class
/// and show the message text to humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Required arguments are missing.
    NeedMoreParams,
    /// Arguments are present but unusable (syntax, content, length).
    BadParams,
    /// The named target does not exist or is not live.
    NoSuchTarget,
    /// The requester lacks the privilege, or the target is locked.
    NoPrivs,
    /// The command verb is not known to this service.
    UnknownCommand,
}

impl Fault {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fault::NeedMoreParams => "needmoreparams",
            Fault::BadParams => "badparams",
            Fault::NoSuchTarget => "nosuch_target",
            Fault::NoPrivs => "noprivs",
            Fault::UnknownCommand => "unknown_command",
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
