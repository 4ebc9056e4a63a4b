//! End-to-end scenarios through the sans-IO session.

use std::time::Duration;

use slirc_engine::command::{CommandInvocation, Outbound};
use slirc_engine::ctcp::{ClientInfo, CtcpEngine, CtcpEvent, HookResult};
use slirc_engine::format::{self, IrcColor};
use slirc_engine::{Session, SessionConfig, SessionEvent};

fn session() -> Session {
    Session::new(SessionConfig {
        nickname: "leeroy".to_string(),
        ..SessionConfig::default()
    })
}

#[test]
fn test_action_on_channel() {
    let reaction = session()
        .receive(":bob!b@host PRIVMSG #chan :\x01ACTION hi\x01")
        .unwrap();
    assert!(reaction.lines.is_empty());
    assert_eq!(
        reaction.events,
        vec![SessionEvent::Ctcp(CtcpEvent::Action {
            channel: Some("#chan".into()),
            sender: "bob".into(),
            text: "hi".into(),
        })]
    );
}

#[test]
fn test_action_by_notice_is_not_answered() {
    let reaction = session()
        .receive(":bob!b@host NOTICE leeroy :\x01ACTION hi\x01")
        .unwrap();
    assert!(reaction.lines.is_empty());
    assert_eq!(
        reaction.events,
        vec![SessionEvent::Ctcp(CtcpEvent::Action {
            channel: None,
            sender: "bob".into(),
            text: "hi".into(),
        })]
    );
}

#[test]
fn test_ping_round_trip() {
    let s = session();
    let sent = s.input("/ctcp ping bob", None);
    assert_eq!(sent.lines.len(), 1);
    let token = sent.lines[0]
        .strip_prefix("PRIVMSG bob :\x01PING ")
        .and_then(|rest| rest.strip_suffix('\x01'))
        .unwrap()
        .to_string();
    assert_eq!(s.ctcp().pings().outstanding("bob"), 1);

    let reply = format!(":Bob!b@host NOTICE leeroy :\x01PING {}\x01", token);
    let reaction = s.receive(&reply).unwrap();
    assert!(reaction.lines.is_empty());
    match &reaction.events[..] {
        [SessionEvent::Ctcp(CtcpEvent::PingReply { sender, elapsed })] => {
            assert_eq!(sender, "Bob");
            assert!(*elapsed >= Duration::ZERO);
        }
        other => panic!("unexpected events: {:?}", other),
    }
    assert_eq!(s.ctcp().pings().outstanding("bob"), 0);

    // A second reply finds an empty queue and is dropped.
    let reaction = s.receive(&reply).unwrap();
    assert!(reaction.is_empty());
}

#[test]
fn test_ping_query_is_echoed() {
    let reaction = session()
        .receive(":bob!b@host PRIVMSG leeroy :\x01PING 12345 abc\x01")
        .unwrap();
    assert_eq!(reaction.lines, vec!["NOTICE bob :\x01PING 12345 abc\x01"]);
}

#[test]
fn test_unknown_query_gets_errmsg_but_reply_does_not() {
    let s = session();
    let reaction = s.receive(":bob!b@host PRIVMSG leeroy :\x01FOO bar\x01").unwrap();
    assert_eq!(
        reaction.lines,
        vec!["NOTICE bob :\x01ERRMSG FOO :Unknown CTCP command\x01"]
    );

    let reaction = s.receive(":bob!b@host NOTICE leeroy :\x01FOO bar\x01").unwrap();
    assert!(reaction.lines.is_empty());
}

#[test]
fn test_unknown_hook_suppresses_errmsg() {
    let engine = CtcpEngine::new(ClientInfo::default()).with_unknown_hook(|msg| {
        if msg.command().eq_ignore_ascii_case("foo") {
            HookResult::Handled
        } else {
            HookResult::Unhandled
        }
    });
    let s = Session::with_engine(SessionConfig::default(), engine);

    let reaction = s.receive(":bob!b@host PRIVMSG slirc :\x01FOO\x01").unwrap();
    assert!(reaction.lines.is_empty());
    let reaction = s.receive(":bob!b@host PRIVMSG slirc :\x01BAR\x01").unwrap();
    assert_eq!(reaction.lines.len(), 1);
}

#[test]
fn test_errmsg_query_is_never_answered() {
    let reaction = session()
        .receive(":bob!b@host PRIVMSG leeroy :\x01ERRMSG oops\x01")
        .unwrap();
    assert!(reaction.is_empty());
}

#[test]
fn test_clientinfo_lists_commands() {
    let reaction = session()
        .receive(":bob!b@host PRIVMSG leeroy :\x01CLIENTINFO\x01")
        .unwrap();
    assert_eq!(
        reaction.lines,
        vec![
            "NOTICE bob :\x01CLIENTINFO ACTION,CLIENTINFO,ERRMSG,FINGER,PING,SOURCE,TIME,USERINFO,VERSION\x01"
        ]
    );
}

#[test]
fn test_formatting_reset_before_space() {
    let runs: Vec<_> = format::parse("\x0304Hello\x0F World").collect();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].foreground, IrcColor::Red);
    assert_eq!(runs[0].text(), "Hello");
    assert_eq!(runs[1].foreground, IrcColor::Default);
    assert_eq!(runs[1].background, IrcColor::Default);
    assert_eq!(runs[1].text(), " World");
}

#[test]
fn test_msg_is_not_echoed() {
    let s = session();
    let invocation = s.dispatcher().resolve("/msg alice hi", Some("#rust")).unwrap();
    assert_eq!(
        invocation,
        CommandInvocation {
            command: "msg".into(),
            channel: None,
            user: Some("alice".into()),
            text: "hi".into(),
        }
    );
    assert_eq!(
        s.dispatcher().dispatch("/msg alice hi", Some("#rust")),
        vec![Outbound::Message {
            target: "alice".into(),
            text: "hi".into(),
            echo: false,
        }]
    );

    let reaction = s.input("/msg alice hi", Some("#rust"));
    assert_eq!(reaction.lines, vec!["PRIVMSG alice :hi"]);
    assert!(reaction.events.is_empty());
}

#[test]
fn test_send_action_line() {
    let s = session();
    assert_eq!(
        s.send_action("#channel", "leeroy").unwrap(),
        "PRIVMSG #channel :\x01ACTION leeroy\x01"
    );

    let reaction = s.input("/me leeroy", Some("#channel"));
    assert_eq!(reaction.lines, vec!["PRIVMSG #channel :\x01ACTION leeroy\x01"]);
    assert_eq!(
        reaction.events,
        vec![SessionEvent::SentAction {
            target: "#channel".into(),
            text: "leeroy".into(),
        }]
    );
}

#[test]
fn test_highlight_ignores_formatting_and_punctuation() {
    let reaction = session()
        .receive(":bob!b@host PRIVMSG #chan :\x02LEEROY\x02!!! get over here")
        .unwrap();
    assert!(matches!(
        &reaction.events[..],
        [SessionEvent::Message { highlight: true, .. }]
    ));

    let reaction = session()
        .receive(":bob!b@host PRIVMSG #chan :leeroyjenkins is not a mention")
        .unwrap();
    assert!(matches!(
        &reaction.events[..],
        [SessionEvent::Message { highlight: false, .. }]
    ));
}

#[test]
fn test_unknown_command_passes_through() {
    let reaction = session().input("/whowas bob 3", Some("#chan"));
    assert_eq!(reaction.lines, vec!["whowas bob 3"]);
}

#[test]
fn test_invalid_invocation_sends_nothing() {
    let s = session();
    assert!(s.input("/kick", Some("#chan")).is_empty());
    assert!(s.input("/join", None).is_empty());
    assert!(s.input("/me", Some("#chan")).is_empty());
}
