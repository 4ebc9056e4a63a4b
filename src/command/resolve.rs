//! Argument resolution for command processors.

use tracing::debug;

use crate::chan::is_channel_name;

use super::{CommandInvocation, Param, Signature};

/// Split off the first whitespace-delimited token.
fn next_token(text: &str) -> (Option<&str>, &str) {
    let text = text.trim_start();
    if text.is_empty() {
        return (None, text);
    }
    match text.split_once(char::is_whitespace) {
        Some((token, rest)) => (Some(token), rest.trim_start()),
        None => (Some(text), ""),
    }
}

fn satisfied(param: Param, present: bool) -> bool {
    match param {
        Param::Required => present,
        Param::Optional => true,
        Param::Rejected => !present,
    }
}

/// Resolve `args` against `signature`.
///
/// A channel-shaped first token becomes the channel unless channels are
/// rejected; a user is then taken only when required. Otherwise, if users
/// are accepted, the first token is the user and a channel-shaped second
/// token the channel. Whatever is left is the text.
pub(super) fn resolve(
    signature: Signature,
    command: String,
    args: &str,
    active: Option<&str>,
    channel_types: &str,
) -> Option<CommandInvocation> {
    let args = args.trim();
    let mut channel = None;
    let mut user = None;
    let mut text = args;

    if let (Some(first), rest) = next_token(args) {
        if signature.channel != Param::Rejected && is_channel_name(first, channel_types) {
            channel = Some(first);
            text = rest;
            if signature.user == Param::Required {
                if let (Some(second), rest) = next_token(text) {
                    user = Some(second);
                    text = rest;
                }
            }
        } else if signature.user != Param::Rejected {
            user = Some(first);
            text = rest;
            if signature.channel != Param::Rejected {
                if let (Some(second), rest) = next_token(text) {
                    if is_channel_name(second, channel_types) {
                        channel = Some(second);
                        text = rest;
                    }
                }
            }
        }
    }

    if channel.is_none() && signature.channel == Param::Required && signature.active_fallback {
        channel = active.filter(|name| is_channel_name(name, channel_types));
    }

    let complete = satisfied(signature.channel, channel.is_some())
        && satisfied(signature.user, user.is_some())
        && satisfied(signature.text, !text.is_empty());
    if !complete {
        debug!(
            command = %command,
            channel = ?channel,
            user = ?user,
            "dropping command with unmet parameters"
        );
        return None;
    }

    Some(CommandInvocation {
        command,
        channel: channel.map(str::to_owned),
        user: user.map(str::to_owned),
        text: text.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chan::DEFAULT_CHANNEL_TYPES;
    use Param::{Optional, Rejected, Required};

    fn run(signature: Signature, args: &str, active: Option<&str>) -> Option<CommandInvocation> {
        resolve(signature, "test".into(), args, active, DEFAULT_CHANNEL_TYPES)
    }

    fn parts(inv: &CommandInvocation) -> (Option<&str>, Option<&str>, &str) {
        (inv.channel.as_deref(), inv.user.as_deref(), inv.text.as_str())
    }

    #[test]
    fn test_next_token() {
        assert_eq!(next_token("  a  b c "), (Some("a"), "b c "));
        assert_eq!(next_token("a"), (Some("a"), ""));
        assert_eq!(next_token("   "), (None, ""));
    }

    #[test]
    fn test_channel_first() {
        let sig = Signature::new(Optional, Optional, Optional);
        let inv = run(sig, "#rust bob hi", None).unwrap();
        assert_eq!(parts(&inv), (Some("#rust"), None, "bob hi"));

        let sig = Signature::new(Required, Required, Optional);
        let inv = run(sig, "#rust bob hi", None).unwrap();
        assert_eq!(parts(&inv), (Some("#rust"), Some("bob"), "hi"));
    }

    #[test]
    fn test_rejected_channel_keeps_text() {
        let sig = Signature::new(Rejected, Rejected, Required);
        let inv = run(sig, "#rust is great", Some("#rust")).unwrap();
        assert_eq!(parts(&inv), (None, None, "#rust is great"));
    }

    #[test]
    fn test_user_then_channel() {
        let sig = Signature::new(Optional, Optional, Optional);
        let inv = run(sig, "bob #rust hello", None).unwrap();
        assert_eq!(parts(&inv), (Some("#rust"), Some("bob"), "hello"));

        let inv = run(sig, "bob hello #rust", None).unwrap();
        assert_eq!(parts(&inv), (None, Some("bob"), "hello #rust"));
    }

    #[test]
    fn test_active_fallback_needs_channel_shape() {
        let sig = Signature::new(Required, Rejected, Optional).with_active_fallback();
        let inv = run(sig, "bye", Some("#rust")).unwrap();
        assert_eq!(parts(&inv), (Some("#rust"), None, "bye"));
        assert!(run(sig, "bye", Some("alice")).is_none());
        assert!(run(sig, "bye", None).is_none());

        let no_fallback = Signature::new(Required, Rejected, Optional);
        assert!(run(no_fallback, "", Some("#rust")).is_none());
    }

    #[test]
    fn test_optional_channel_never_falls_back() {
        let sig = Signature::new(Optional, Rejected, Optional).with_active_fallback();
        let inv = run(sig, "-m", Some("#rust")).unwrap();
        assert_eq!(parts(&inv), (None, None, "-m"));
    }

    #[test]
    fn test_channel_types_respected() {
        let sig = Signature::new(Optional, Optional, Optional);
        let inv = resolve(sig, "t".into(), "&local hi", None, "#").unwrap();
        assert_eq!(parts(&inv), (None, Some("&local"), "hi"));
    }
}
