//! Property-based tests for the formatting parser.

use proptest::prelude::*;
use slirc_engine::format::{self, FormattedStringExt, IrcColor, PartKind};

/// Text mixing words, punctuation, spaces, digits and formatting codes.
fn formatted_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-z0-9 ,.#!\x02\x03\x04\x0F\x16\x1D\x1F]{0,80}").expect("valid regex")
}

proptest! {
    #[test]
    fn runs_cover_stripped_text(text in formatted_strategy()) {
        let joined: String = format::parse(&text).map(|run| run.text()).collect();
        prop_assert_eq!(joined, text.as_str().strip_formatting().into_owned());
    }

    #[test]
    fn runs_are_never_empty(text in formatted_strategy()) {
        for run in format::parse(&text) {
            prop_assert!(!run.parts.is_empty());
            for part in &run.parts {
                prop_assert!(!part.text.is_empty());
                if part.kind == PartKind::Space {
                    prop_assert!(part.text.chars().all(char::is_whitespace));
                }
            }
        }
    }

    #[test]
    fn plain_text_is_one_default_run(text in "[a-z][a-z .,]{0,60}") {
        let runs: Vec<_> = format::parse(&text).collect();
        prop_assert_eq!(runs.len(), 1);
        prop_assert!(!runs[0].bold && !runs[0].underline);
        prop_assert_eq!(runs[0].foreground, IrcColor::Default);
        prop_assert_eq!(runs[0].background, IrcColor::Default);
    }
}
