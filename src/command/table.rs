//! Built-in command processors and aliases.

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::debug;

use super::Param::{Optional, Rejected, Required};
use super::{CommandInvocation, Outbound, Signature};

type Process = fn(&CommandInvocation, Option<&str>) -> Vec<Outbound>;

pub(super) struct Processor {
    pub(super) name: &'static str,
    pub(super) signature: Signature,
    pub(super) process: Process,
}

const CTCP_PREFIX: &str = "ctcp-";

/// Short forms rewritten before lookup.
const ALIASES: &[(&str, &str)] = &[
    ("j", "join"),
    ("leave", "part"),
    ("m", "msg"),
    ("q", "query"),
    ("quote", "raw"),
    ("w", "whois"),
];

const CTCP_SIGNATURE: Signature = Signature::new(Rejected, Required, Optional);
const MODE_CHANGE: Signature = Signature::new(Required, Required, Optional).with_active_fallback();

static PROCESSORS: &[Processor] = &[
    Processor {
        name: "join",
        signature: Signature::new(Required, Rejected, Optional),
        process: join,
    },
    Processor {
        name: "part",
        signature: Signature::new(Required, Rejected, Optional).with_active_fallback(),
        process: part,
    },
    Processor {
        name: "msg",
        signature: Signature::new(Optional, Optional, Required),
        process: msg,
    },
    Processor {
        name: "query",
        signature: Signature::new(Rejected, Required, Optional),
        process: query,
    },
    Processor {
        name: "me",
        signature: Signature::new(Rejected, Rejected, Required),
        process: me,
    },
    Processor {
        name: "notice",
        signature: Signature::new(Optional, Optional, Required),
        process: notice,
    },
    Processor {
        name: "nick",
        signature: Signature::new(Rejected, Required, Rejected),
        process: nick,
    },
    Processor {
        name: "quit",
        signature: Signature::new(Rejected, Rejected, Optional),
        process: quit,
    },
    Processor {
        name: "topic",
        signature: Signature::new(Required, Rejected, Optional).with_active_fallback(),
        process: topic,
    },
    Processor {
        name: "kick",
        signature: Signature::new(Required, Required, Optional).with_active_fallback(),
        process: kick,
    },
    Processor {
        name: "invite",
        signature: Signature::new(Required, Required, Rejected).with_active_fallback(),
        process: invite,
    },
    Processor {
        name: "whois",
        signature: Signature::new(Rejected, Required, Rejected),
        process: whois,
    },
    Processor {
        name: "away",
        signature: Signature::new(Rejected, Rejected, Optional),
        process: away,
    },
    Processor {
        name: "mode",
        signature: Signature::new(Optional, Rejected, Optional),
        process: mode,
    },
    Processor {
        name: "op",
        signature: MODE_CHANGE,
        process: op,
    },
    Processor {
        name: "deop",
        signature: MODE_CHANGE,
        process: deop,
    },
    Processor {
        name: "voice",
        signature: MODE_CHANGE,
        process: voice,
    },
    Processor {
        name: "devoice",
        signature: MODE_CHANGE,
        process: devoice,
    },
    Processor {
        name: "raw",
        signature: Signature::new(Rejected, Rejected, Required),
        process: raw,
    },
    Processor {
        name: "ctcp-ping",
        signature: CTCP_SIGNATURE,
        process: ctcp_query,
    },
    Processor {
        name: "ctcp-version",
        signature: CTCP_SIGNATURE,
        process: ctcp_query,
    },
    Processor {
        name: "ctcp-time",
        signature: CTCP_SIGNATURE,
        process: ctcp_query,
    },
    Processor {
        name: "ctcp-finger",
        signature: CTCP_SIGNATURE,
        process: ctcp_query,
    },
    Processor {
        name: "ctcp-userinfo",
        signature: CTCP_SIGNATURE,
        process: ctcp_query,
    },
    Processor {
        name: "ctcp-clientinfo",
        signature: CTCP_SIGNATURE,
        process: ctcp_query,
    },
    Processor {
        name: "ctcp-source",
        signature: CTCP_SIGNATURE,
        process: ctcp_query,
    },
];

/// Fallback for `ctcp-<name>` commands without their own entry.
static GENERIC_CTCP: Processor = Processor {
    name: "ctcp-*",
    signature: CTCP_SIGNATURE,
    process: ctcp_query,
};

fn processor_map() -> &'static HashMap<&'static str, &'static Processor> {
    static MAP: OnceLock<HashMap<&'static str, &'static Processor>> = OnceLock::new();
    MAP.get_or_init(|| PROCESSORS.iter().map(|p| (p.name, p)).collect())
}

/// Find the processor for a canonical command name.
pub(super) fn lookup(command: &str) -> Option<&'static Processor> {
    if let Some(processor) = processor_map().get(command) {
        return Some(processor);
    }
    match command.strip_prefix(CTCP_PREFIX) {
        Some(name) if !name.is_empty() => Some(&GENERIC_CTCP),
        _ => None,
    }
}

/// Lower-case `name`, expand aliases and fold `ctcp <name> rest` into
/// `ctcp-<name>` with `rest` as the remaining arguments.
pub(super) fn canonical<'a>(name: &str, args: &'a str) -> (String, &'a str) {
    let lower = name.to_ascii_lowercase();

    if lower == "ctcp" {
        let args = args.trim_start();
        let (sub, rest) = args.split_once(' ').unwrap_or((args, ""));
        if !sub.is_empty() {
            return (format!("{}{}", CTCP_PREFIX, sub.to_ascii_lowercase()), rest);
        }
    }

    match ALIASES.iter().find(|(alias, _)| *alias == lower) {
        Some((_, target)) => ((*target).to_string(), args),
        None => (lower, args),
    }
}

fn with_trailing(line: String, text: &str) -> String {
    if text.is_empty() {
        line
    } else {
        format!("{} :{}", line, text)
    }
}

/// User if given, otherwise the channel.
fn target(inv: &CommandInvocation) -> Option<&str> {
    inv.user.as_deref().or(inv.channel.as_deref())
}

fn join(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    let Some(channel) = &inv.channel else {
        return Vec::new();
    };
    let line = match inv.text.split_whitespace().next() {
        Some(key) => format!("JOIN {} {}", channel, key),
        None => format!("JOIN {}", channel),
    };
    vec![Outbound::Raw(line)]
}

fn part(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    let Some(channel) = &inv.channel else {
        return Vec::new();
    };
    vec![Outbound::Raw(with_trailing(format!("PART {}", channel), &inv.text))]
}

fn msg(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    let Some(target) = target(inv) else {
        return Vec::new();
    };
    vec![Outbound::Message {
        target: target.to_owned(),
        text: inv.text.clone(),
        echo: false,
    }]
}

fn query(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    match (&inv.user, inv.text.is_empty()) {
        (Some(user), false) => vec![Outbound::Message {
            target: user.clone(),
            text: inv.text.clone(),
            echo: true,
        }],
        _ => Vec::new(),
    }
}

fn me(inv: &CommandInvocation, active: Option<&str>) -> Vec<Outbound> {
    let Some(target) = active else {
        debug!("no active conversation for /me");
        return Vec::new();
    };
    vec![Outbound::Action {
        target: target.to_owned(),
        text: inv.text.clone(),
    }]
}

fn notice(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    let Some(target) = target(inv) else {
        return Vec::new();
    };
    vec![Outbound::Notice {
        target: target.to_owned(),
        text: inv.text.clone(),
    }]
}

fn nick(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    inv.user
        .iter()
        .map(|nick| Outbound::Raw(format!("NICK {}", nick)))
        .collect()
}

fn quit(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    vec![Outbound::Raw(with_trailing("QUIT".to_string(), &inv.text))]
}

fn topic(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    let Some(channel) = &inv.channel else {
        return Vec::new();
    };
    vec![Outbound::Raw(with_trailing(format!("TOPIC {}", channel), &inv.text))]
}

fn kick(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    let (Some(channel), Some(user)) = (&inv.channel, &inv.user) else {
        return Vec::new();
    };
    vec![Outbound::Raw(with_trailing(
        format!("KICK {} {}", channel, user),
        &inv.text,
    ))]
}

fn invite(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    let (Some(channel), Some(user)) = (&inv.channel, &inv.user) else {
        return Vec::new();
    };
    vec![Outbound::Raw(format!("INVITE {} {}", user, channel))]
}

fn whois(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    inv.user
        .iter()
        .map(|user| Outbound::Raw(format!("WHOIS {}", user)))
        .collect()
}

fn away(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    vec![Outbound::Raw(with_trailing("AWAY".to_string(), &inv.text))]
}

fn mode(inv: &CommandInvocation, active: Option<&str>) -> Vec<Outbound> {
    let Some(target) = inv.channel.as_deref().or(active) else {
        return Vec::new();
    };
    let line = if inv.text.is_empty() {
        format!("MODE {}", target)
    } else {
        format!("MODE {} {}", target, inv.text)
    };
    vec![Outbound::Raw(line)]
}

/// `MODE #chan +ooo a b c` for the resolved user plus any nicks in the text.
fn member_mode(inv: &CommandInvocation, sign: char, letter: char) -> Vec<Outbound> {
    let (Some(channel), Some(user)) = (&inv.channel, &inv.user) else {
        return Vec::new();
    };
    let nicks: Vec<&str> = std::iter::once(user.as_str())
        .chain(inv.text.split_whitespace())
        .collect();
    let modes = format!("{}{}", sign, letter.to_string().repeat(nicks.len()));
    vec![Outbound::Raw(format!(
        "MODE {} {} {}",
        channel,
        modes,
        nicks.join(" ")
    ))]
}

fn op(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    member_mode(inv, '+', 'o')
}

fn deop(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    member_mode(inv, '-', 'o')
}

fn voice(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    member_mode(inv, '+', 'v')
}

fn devoice(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    member_mode(inv, '-', 'v')
}

fn raw(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    vec![Outbound::Raw(inv.text.clone())]
}

fn ctcp_query(inv: &CommandInvocation, _: Option<&str>) -> Vec<Outbound> {
    let (Some(target), Some(command)) = (&inv.user, inv.command.strip_prefix(CTCP_PREFIX)) else {
        return Vec::new();
    };
    vec![Outbound::CtcpQuery {
        target: target.clone(),
        command: command.to_ascii_uppercase(),
        content: inv.text.clone(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Dispatcher;

    fn dispatch(input: &str, active: Option<&str>) -> Vec<Outbound> {
        Dispatcher::default().dispatch(input, active)
    }

    fn raw_line(line: &str) -> Vec<Outbound> {
        vec![Outbound::Raw(line.to_string())]
    }

    #[test]
    fn test_canonical_aliases() {
        assert_eq!(canonical("J", "#a"), ("join".to_string(), "#a"));
        assert_eq!(canonical("leave", ""), ("part".to_string(), ""));
        assert_eq!(canonical("quote", "X"), ("raw".to_string(), "X"));
        assert_eq!(
            canonical("ctcp", "Version bob"),
            ("ctcp-version".to_string(), "bob")
        );
        assert_eq!(canonical("ctcp", ""), ("ctcp".to_string(), ""));
    }

    #[test]
    fn test_table_names_are_canonical() {
        for processor in PROCESSORS {
            assert_eq!(processor.name, processor.name.to_ascii_lowercase());
            assert!(lookup(processor.name).is_some());
        }
        for (alias, target) in ALIASES {
            assert!(lookup(alias).is_none());
            assert!(lookup(target).is_some());
        }
    }

    #[test]
    fn test_join_and_part() {
        assert_eq!(dispatch("/j #rust", None), raw_line("JOIN #rust"));
        assert_eq!(dispatch("/join #secret key", None), raw_line("JOIN #secret key"));
        assert_eq!(dispatch("/part", Some("#rust")), raw_line("PART #rust"));
        assert_eq!(
            dispatch("/leave gone fishing", Some("#rust")),
            raw_line("PART #rust :gone fishing")
        );
        assert!(dispatch("/part", Some("alice")).is_empty());
    }

    #[test]
    fn test_msg_and_query() {
        assert_eq!(
            dispatch("/m #rust hello all", None),
            vec![Outbound::Message {
                target: "#rust".into(),
                text: "hello all".into(),
                echo: false,
            }]
        );
        assert_eq!(
            dispatch("/q bob hey", None),
            vec![Outbound::Message {
                target: "bob".into(),
                text: "hey".into(),
                echo: true,
            }]
        );
    }

    #[test]
    fn test_me_targets_active() {
        assert_eq!(
            dispatch("/me #rust rocks", Some("#rust")),
            vec![Outbound::Action {
                target: "#rust".into(),
                text: "#rust rocks".into(),
            }]
        );
        assert!(dispatch("/me waves", None).is_empty());
    }

    #[test]
    fn test_channel_operations() {
        assert_eq!(
            dispatch("/kick bob flooding", Some("#rust")),
            raw_line("KICK #rust bob :flooding")
        );
        assert_eq!(
            dispatch("/kick #other bob", Some("#rust")),
            raw_line("KICK #other bob")
        );
        assert_eq!(
            dispatch("/invite bob #rust", None),
            raw_line("INVITE bob #rust")
        );
        assert_eq!(
            dispatch("/topic new topic here", Some("#rust")),
            raw_line("TOPIC #rust :new topic here")
        );
        assert_eq!(
            dispatch("/mode +m", Some("#rust")),
            raw_line("MODE #rust +m")
        );
    }

    #[test]
    fn test_member_modes() {
        assert_eq!(
            dispatch("/op alice", Some("#rust")),
            raw_line("MODE #rust +o alice")
        );
        assert_eq!(
            dispatch("/devoice #rust a b c", None),
            raw_line("MODE #rust -vvv a b c")
        );
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(dispatch("/nick newnick", None), raw_line("NICK newnick"));
        assert_eq!(dispatch("/quit", None), raw_line("QUIT"));
        assert_eq!(dispatch("/quit bye now", None), raw_line("QUIT :bye now"));
        assert_eq!(dispatch("/away", None), raw_line("AWAY"));
        assert_eq!(dispatch("/w bob", None), raw_line("WHOIS bob"));
        assert_eq!(
            dispatch("/quote PRIVMSG #a :raw text", None),
            raw_line("PRIVMSG #a :raw text")
        );
        assert_eq!(
            dispatch("/notice bob heads up", None),
            vec![Outbound::Notice {
                target: "bob".into(),
                text: "heads up".into(),
            }]
        );
    }

    #[test]
    fn test_ctcp_commands() {
        let query = |target: &str, command: &str, content: &str| {
            vec![Outbound::CtcpQuery {
                target: target.into(),
                command: command.into(),
                content: content.into(),
            }]
        };
        assert_eq!(dispatch("/ctcp version bob", None), query("bob", "VERSION", ""));
        assert_eq!(dispatch("/CTCP-PING bob", None), query("bob", "PING", ""));
        assert_eq!(
            dispatch("/ctcp dcc bob chat", None),
            query("bob", "DCC", "chat")
        );
        assert_eq!(dispatch("/ctcp", None), raw_line("ctcp"));
        assert!(dispatch("/ctcp version", None).is_empty());
    }
}
