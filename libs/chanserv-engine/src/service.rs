use std::sync::Arc;

use chanserv_api::{Actor, AuditLog, Clock, Fault, TopicChange, UpstreamLink};

use crate::channel::ChannelRegistry;
use crate::command::{split_verb, TopicRequest, TopicVerb};
use crate::commit::commit;
use crate::compose::compose;
use crate::error::TopicError;
use crate::gate::authorize;
use crate::registration::RegistrationStore;
use crate::sync::publish;
use crate::validate::TopicValidator;

/// A request that made it all the way through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicOutcome {
    /// Channel name as the requester wrote it.
    pub channel: String,
    /// The event sent upstream.
    pub change: TopicChange,
    /// Whether the requester should get a confirmation. Channel members see
    /// the change through the normal topic notification instead.
    pub confirm: bool,
}

/// A line of feedback to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Success(String),
    Fail(Fault, String),
}

impl Reply {
    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success(_))
    }
}

/// Replies for a pipeline result.
pub fn replies(result: &Result<TopicOutcome, TopicError>) -> Vec<Reply> {
    match result {
        Ok(outcome) if outcome.confirm => vec![Reply::Success(format!(
            "Topic set to {} on {}.",
            outcome.change.text, outcome.channel
        ))],
        Ok(_) => Vec::new(),
        Err(e) => {
            let fault = e.fault();
            let mut out = vec![Reply::Fail(fault, e.to_string())];
            if let Some(hint) = e.syntax_hint() {
                out.push(Reply::Fail(fault, hint));
            }
            out
        }
    }
}

/// The topic pipeline: gate → compose → validate → commit → publish.
///
/// A request that fails a stage never reaches the next one and leaves the
/// channel untouched.
pub struct TopicService {
    channels: Arc<ChannelRegistry>,
    registrations: Arc<RegistrationStore>,
    validator: TopicValidator,
    uplink: Arc<dyn UpstreamLink>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TopicService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicService")
            .field("channels", &self.channels.len())
            .field("registrations", &self.registrations.len())
            .field("validator", &self.validator)
            .finish()
    }
}

impl TopicService {
    pub fn new(
        channels: Arc<ChannelRegistry>,
        registrations: Arc<RegistrationStore>,
        validator: TopicValidator,
        uplink: Arc<dyn UpstreamLink>,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            channels,
            registrations,
            validator,
            uplink,
            audit,
            clock,
        }
    }

    pub fn channels(&self) -> &Arc<ChannelRegistry> {
        &self.channels
    }

    pub fn registrations(&self) -> &Arc<RegistrationStore> {
        &self.registrations
    }

    pub fn validator(&self) -> TopicValidator {
        self.validator
    }

    pub fn set_validator(&mut self, validator: TopicValidator) {
        self.validator = validator;
    }

    /// Run one request through the pipeline.
    pub fn execute(&self, request: &TopicRequest) -> Result<TopicOutcome, TopicError> {
        let result = self.run(request);
        match &result {
            Ok(outcome) => tracing::info!(
                verb = %request.verb,
                channel = %outcome.change.channel,
                setter = %outcome.change.setter,
                ts = outcome.change.ts,
                prev_ts = outcome.change.prev_ts,
                "topic changed"
            ),
            Err(e) => tracing::debug!(
                verb = %request.verb,
                channel = %request.channel,
                actor = %request.actor,
                reason = e.code(),
                "topic request rejected"
            ),
        }
        result
    }

    fn run(&self, request: &TopicRequest) -> Result<TopicOutcome, TopicError> {
        request.check_syntax()?;

        let channel = request.channel.as_str();
        authorize(
            &self.registrations,
            &self.channels,
            &request.actor,
            channel,
            request.kind().gate_order(),
        )?;

        let setter = request.actor.setter();
        let now = self.clock.now();
        let validator = self.validator;

        // Compose, validate and commit against the record as it is right now;
        // if the channel went away since the gate, nothing is written.
        let (committed, name, text) = self
            .channels
            .update(channel, |record| -> Result<_, TopicError> {
                if record.member_count() == 0 {
                    return Err(TopicError::ChannelEmpty(channel.to_string()));
                }
                let candidate = compose(
                    &record.topic,
                    request.kind(),
                    &request.text,
                    channel,
                    validator.max_len(),
                )?;
                validator.validate(&candidate)?;
                let committed = commit(record, candidate, setter, now);
                Ok((committed, record.name.clone(), record.topic.clone()))
            })
            .ok_or_else(|| TopicError::ChannelEmpty(channel.to_string()))??;

        let change = publish(
            self.uplink.as_ref(),
            &name,
            setter,
            committed.topic_ts,
            committed.previous_ts,
            &text,
        );

        let registered = self
            .registrations
            .find(channel)
            .map(|r| r.name.clone())
            .unwrap_or(name);
        self.audit
            .log_action(&request.actor, request.verb.name(), &registered);

        let confirm = !request
            .actor
            .nick()
            .is_some_and(|nick| self.channels.is_member(channel, nick));

        Ok(TopicOutcome {
            channel: channel.to_string(),
            change,
            confirm,
        })
    }

    /// Parse and execute a command line on behalf of `actor`.
    pub fn handle(&self, actor: &Actor, line: &str) -> Vec<Reply> {
        let Some((verb_name, args)) = split_verb(line) else {
            return Vec::new();
        };
        let Some(verb) = TopicVerb::from_name(verb_name) else {
            return vec![Reply::Fail(
                Fault::UnknownCommand,
                format!("Invalid command: {verb_name}. Use HELP for a command listing."),
            )];
        };
        let result = TopicRequest::parse(verb, args, actor.clone())
            .and_then(|request| self.execute(&request));
        replies(&result)
    }
}
