//! Turns a message and its arguments into one block of text.

use std::borrow::Cow;

use crate::{printf, value::Value};

/// Builds the text of a log call.
///
/// A trailing error argument is detached and its trace appended after a
/// newline. With `auto_format`, a textual message containing `%` is applied
/// as a printf template to the remaining arguments; if the template does not
/// fit the arguments the call falls back to tab-joining instead of failing.
/// Otherwise the message and every argument are joined with tabs, absent
/// values rendering as `null`.
pub fn format(auto_format: bool, message: &Value, args: &[Value]) -> String {
    let (args, trailing) = match args.split_last() {
        Some((Value::Error(err), rest)) => (rest, Some(err)),
        _ => (args, None),
    };

    let mut out = templated(auto_format, message, args).unwrap_or_else(|| joined(message, args));

    if let Some(err) = trailing {
        out.push('\n');
        out.push_str(&err.trace());
    }

    out
}

fn templated(auto_format: bool, message: &Value, args: &[Value]) -> Option<String> {
    let template = message.as_text().filter(|t| auto_format && t.contains('%'))?;
    match printf::sprintf(template, args) {
        Ok(text) => Some(text),
        Err(err) => {
            tracing::debug!(
                target: "taglog",
                %err,
                template,
                "template rejected, joining arguments instead"
            );
            None
        }
    }
}

fn joined(message: &Value, args: &[Value]) -> String {
    let mut out = message.to_string();
    for arg in args {
        out.push('\t');
        out.push_str(&arg.to_string());
    }
    out
}

/// Drops a leading message that merely repeats the resolved tag.
///
/// `d!(log, TAG, "x")` from a component whose tag already is `TAG` is the
/// same call as `d!(log, "x")`: the first argument becomes the message and
/// the rest stay arguments. With nothing left the message is empty.
pub fn collapse_tag<'a>(
    tag: &str,
    message: &'a Value,
    args: &'a [Value],
) -> (Cow<'a, Value>, &'a [Value]) {
    if message.as_text() != Some(tag) {
        return (Cow::Borrowed(message), args);
    }

    match args {
        [] => (Cow::Owned(Value::Str(String::new())), args),
        [first, rest @ ..] => (Cow::Borrowed(first), rest),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use std::fmt;

    use super::*;

    #[derive(Debug)]
    struct Exception(&'static str);

    impl fmt::Display for Exception {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for Exception {}

    fn plain(message: impl Into<Value>, args: Vec<Value>) -> String {
        format(false, &message.into(), &args)
    }

    fn auto(message: impl Into<Value>, args: Vec<Value>) -> String {
        format(true, &message.into(), &args)
    }

    #[test]
    fn arguments_are_tab_joined() {
        let args = vec!["b".into(), 1.into(), true.into(), Value::Null];
        assert_eq!(plain("a", args), "a\tb\t1\ttrue\tnull");
        assert_eq!(plain(1, vec![]), "1");
    }

    #[test]
    fn nulls_render_literally() {
        assert_eq!(plain(Value::Null, vec![]), "null");
        assert_eq!(plain(Value::Null, vec![Value::Null]), "null\tnull");
        assert_eq!(plain(Value::Null, vec![Value::Null, Value::Null]), "null\tnull\tnull");
    }

    #[test]
    fn templates_are_detected_when_enabled() {
        assert_eq!(auto("number %d", vec![42.into()]), "number 42");
        assert_eq!(auto("just %%", vec![]), "just %");
        assert_eq!(auto("a", vec!["b".into(), "c".into()]), "a\tb\tc");
    }

    #[test]
    fn templates_are_ignored_when_disabled() {
        assert_eq!(plain("number %d", vec![42.into()]), "number %d\t42");
    }

    #[test]
    fn only_textual_messages_are_templates() {
        let message = Value::display("100%");
        assert_eq!(format(true, &message, &[1.into()]), "100%\t1");
    }

    #[test]
    fn broken_templates_fall_back_to_joining() {
        assert_eq!(auto("number %d", vec!["forty-two".into()]), "number %d\tforty-two");
        assert_eq!(auto("%d and %d", vec![1.into()]), "%d and %d\t1");
        assert_eq!(auto("50%", vec![]), "50%");
    }

    #[test]
    fn trailing_error_is_appended_as_trace() {
        let text = plain(Value::error(&Exception("foo")), vec![]);
        assert!(text.starts_with("Exception: foo"));

        let args = vec!["b".into(), Value::error(&Exception("bar"))];
        let text = plain("a", args);
        assert!(text.starts_with("a\tb\nException: bar"), "{text}");
    }

    #[test]
    fn trailing_error_is_not_a_template_argument() {
        let args = vec![7.into(), Value::error(&Exception("boom"))];
        let text = auto("retry %d failed", args);
        assert!(text.starts_with("retry 7 failed\nException: boom"), "{text}");
    }

    #[test]
    fn only_the_last_error_is_detached() {
        let args = vec![Value::error(&Exception("first")), "x".into()];
        assert_eq!(plain("a", args), "a\tException: first\tx");
    }

    #[test]
    fn duplicate_tag_is_collapsed() {
        let message = Value::from("Net");
        let args = vec![Value::from("x"), Value::from(1)];

        let (msg, rest) = collapse_tag("Net", &message, &args);
        assert_eq!(msg.as_ref(), &Value::from("x"));
        assert_eq!(rest, &[Value::from(1)]);

        let (msg, rest) = collapse_tag("Net", &message, &args[..1]);
        assert_eq!(msg.as_ref(), &Value::from("x"));
        assert!(rest.is_empty());

        let (msg, rest) = collapse_tag("Net", &message, &[]);
        assert_eq!(msg.as_ref(), &Value::from(""));
        assert!(rest.is_empty());
    }

    #[test]
    fn other_messages_are_left_alone() {
        let message = Value::from("Disk");
        let args = vec![Value::from("x")];
        let (msg, rest) = collapse_tag("Net", &message, &args);
        assert_eq!(msg.as_ref(), &message);
        assert_eq!(rest.len(), 1);

        let message = Value::display("Net");
        let (msg, _) = collapse_tag("Net", &message, &args);
        assert_eq!(msg.as_ref(), &message);
    }
}
