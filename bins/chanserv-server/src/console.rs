use chanserv_api::{Actor, ParseActorError};
use chanserv_engine::{Reply, TopicService, TopicVerb};

/// One line read from the operator console.
#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleLine<'a> {
    Blank,
    Help,
    Command { actor: Actor, command: &'a str },
}

/// Parse `<actor> <VERB> <args...>`, or `HELP`.
pub fn parse_line(line: &str) -> Result<ConsoleLine<'_>, ParseActorError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleLine::Blank);
    }
    if line.eq_ignore_ascii_case("help") {
        return Ok(ConsoleLine::Help);
    }
    let (actor, command) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    Ok(ConsoleLine::Command {
        actor: actor.parse()?,
        command: command.trim_start(),
    })
}

pub fn render(reply: &Reply) -> String {
    match reply {
        Reply::Success(text) => format!("OK {text}"),
        Reply::Fail(fault, text) => format!("{fault} {text}"),
    }
}

pub fn help_lines() -> Vec<String> {
    let mut lines = vec!["Usage: <nick:NAME|account:NAME|-> <command> [args]".to_string()];
    for verb in TopicVerb::ALL {
        lines.push(format!("  {:<14}{}", verb.name(), verb.description()));
        lines.push(format!("  {:<14}{}", "", verb.syntax()));
    }
    lines
}

/// Output lines for one console line.
pub fn respond(service: &TopicService, line: &str) -> Vec<String> {
    match parse_line(line) {
        Ok(ConsoleLine::Blank) => Vec::new(),
        Ok(ConsoleLine::Help) => help_lines(),
        Ok(ConsoleLine::Command { actor, command }) => {
            service.handle(&actor, command).iter().map(render).collect()
        }
        Err(e) => vec![format!("error {e}")],
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chanserv_api::{AccessFlags, Fault, ManualClock};
    use chanserv_engine::audit::RecordingAudit;
    use chanserv_engine::sync::RecordingUplink;
    use chanserv_engine::validate::TopicValidator;
    use chanserv_engine::{ChannelRegistry, RegistrationRecord, RegistrationStore};

    use super::*;

    fn service() -> TopicService {
        let channels = Arc::new(ChannelRegistry::new());
        channels.join("#help", "bob");
        let registrations = Arc::new(RegistrationStore::new());
        registrations.register(RegistrationRecord::new("#help").with_access("alice", AccessFlags::TOPIC));
        TopicService::new(
            channels,
            registrations,
            TopicValidator::default(),
            Arc::new(RecordingUplink::new()),
            Arc::new(RecordingAudit::new()),
            Arc::new(ManualClock::new(100)),
        )
    }

    #[test]
    fn parses_actor_and_command() {
        assert_eq!(
            parse_line("nick:alice TOPIC #help hi there").unwrap(),
            ConsoleLine::Command {
                actor: Actor::session("alice"),
                command: "TOPIC #help hi there",
            }
        );
        assert_eq!(parse_line("  ").unwrap(), ConsoleLine::Blank);
        assert_eq!(parse_line("help").unwrap(), ConsoleLine::Help);
        assert!(parse_line("alice TOPIC #help hi").is_err());
    }

    #[test]
    fn renders_replies_with_their_class() {
        assert_eq!(render(&Reply::Success("done".into())), "OK done");
        assert_eq!(
            render(&Reply::Fail(Fault::NoPrivs, "nope".into())),
            "noprivs nope"
        );
    }

    #[test]
    fn responds_to_commands() {
        let service = service();
        assert_eq!(
            respond(&service, "nick:alice TOPIC #help hi"),
            vec!["OK Topic set to hi on #help.".to_string()]
        );
        assert_eq!(
            respond(&service, "- TOPIC #help hi"),
            vec!["noprivs You are not authorized to perform this operation.".to_string()]
        );
        assert!(respond(&service, "bogus").first().unwrap().starts_with("error "));
    }

    #[test]
    fn help_lists_every_verb() {
        let help = help_lines().join("\n");
        for verb in TopicVerb::ALL {
            assert!(help.contains(verb.syntax()));
        }
    }
}
