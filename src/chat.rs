//! Minecraft chat components, as found in the `description` field of a Java
//! status document, and their decoding into plain legacy-formatted text.
//! [Text component format](https://wiki.vg/Text_formatting)

use serde::Deserialize;

/// Recursion guard for pathological component trees.
const MAX_DEPTH: usize = 100;

/// A Minecraft chat component: a bare string, a list joined in order, or a
/// structured component.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Chat {
    Text(String),
    List(Vec<Chat>),
    Component(Box<ChatComponent>),
}

/// A structured chat component. Unknown keys (hover/click events, fonts,
/// scores) are ignored; decoding only concerns itself with the text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatComponent {
    pub text: Option<String>,
    pub translate: Option<String>,
    /// Pre-translated replacement for `translate` when the client has no
    /// translation table, which a status decoder never does.
    pub fallback: Option<String>,
    #[serde(default)]
    pub with: Vec<Chat>,
    #[serde(default)]
    pub extra: Vec<Chat>,
    pub color: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underlined: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub obfuscated: bool,
}

impl Chat {
    /// Flatten the component tree into a `§`-formatted string, optionally
    /// stripping the legacy formatting codes afterwards.
    #[must_use]
    pub fn decode(&self, strip_codes: bool) -> String {
        let text = self.decode_at(0);
        if strip_codes {
            strip_color_codes(&text)
        } else {
            text
        }
    }

    fn decode_at(&self, depth: usize) -> String {
        if depth > MAX_DEPTH {
            return String::new();
        }
        match self {
            Self::Text(s) => s.clone(),
            Self::List(items) => items.iter().map(|item| item.decode_at(depth + 1)).collect(),
            Self::Component(component) => component.decode_at(depth + 1),
        }
    }
}

impl ChatComponent {
    fn decode_at(&self, depth: usize) -> String {
        if depth > MAX_DEPTH {
            return String::new();
        }

        let mut out = String::new();
        if let Some(color) = &self.color {
            out.push('§');
            out.push(color_code(color));
        }
        if self.bold {
            out.push_str("§l");
        }
        if self.italic {
            out.push_str("§o");
        }
        if self.underlined {
            out.push_str("§n");
        }
        if self.strikethrough {
            out.push_str("§m");
        }
        if self.obfuscated {
            out.push_str("§k");
        }

        if let Some(text) = &self.text {
            out.push_str(text);
        } else if let Some(template) = &self.translate {
            if let Some(fallback) = &self.fallback {
                out.push_str(fallback);
            } else {
                let args: Vec<String> = self
                    .with
                    .iter()
                    .map(|arg| arg.decode_at(depth + 1))
                    .collect();
                out.push_str(&apply_translate(template, &args));
            }
        }

        for extra in &self.extra {
            out.push_str(&extra.decode_at(depth + 1));
        }
        out
    }
}

/// Expand `%s` and single-digit `%n$s` placeholders in a translate template.
/// Placeholders without a matching argument stay verbatim.
fn apply_translate(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_arg = 0usize;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                if let Some(arg) = args.get(next_arg) {
                    out.push_str(arg);
                } else {
                    out.push_str("%s");
                }
                next_arg += 1;
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(&digit) if digit.is_ascii_digit() => {
                let mut ahead = chars.clone();
                ahead.next();
                if ahead.next() == Some('$') && ahead.next() == Some('s') {
                    chars = ahead;
                    let position = digit.to_digit(10).unwrap_or(0) as usize;
                    match position.checked_sub(1).and_then(|idx| args.get(idx)) {
                        Some(arg) => out.push_str(arg),
                        None => {
                            out.push('%');
                            out.push(digit);
                            out.push_str("$s");
                        }
                    }
                } else {
                    out.push('%');
                }
            }
            _ => out.push('%'),
        }
    }
    out
}

fn color_code(color: &str) -> char {
    match color {
        "black" => '0',
        "dark_blue" => '1',
        "dark_green" => '2',
        "dark_aqua" => '3',
        "dark_red" => '4',
        "dark_purple" => '5',
        "gold" => '6',
        "gray" => '7',
        "dark_gray" => '8',
        "blue" => '9',
        "green" => 'a',
        "aqua" => 'b',
        "red" => 'c',
        "light_purple" => 'd',
        "yellow" => 'e',
        "white" => 'f',
        // hex colors and anything newer reset to default
        _ => 'r',
    }
}

/// Remove legacy `§`-prefixed formatting codes from `text`.
#[must_use]
pub fn strip_color_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '§'
            && chars
                .peek()
                .is_some_and(|code| "0123456789abcdefklmnor".contains(code.to_ascii_lowercase()))
        {
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Chat {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn bare_strings_decode_verbatim() {
        let chat = parse(serde_json::json!("hello world"));
        assert_eq!(chat.decode(false), "hello world");
    }

    #[test]
    fn nested_extras_flatten_in_order() {
        let chat = parse(serde_json::json!({
            "text": "A ",
            "extra": [
                {"text": "B ", "extra": [{"text": "C"}]},
                " D",
            ],
        }));
        assert_eq!(chat.decode(false), "A B C D");
    }

    #[test]
    fn styles_render_as_legacy_codes_and_strip_cleanly() {
        let chat = parse(serde_json::json!({
            "text": "danger",
            "color": "red",
            "bold": true,
        }));
        assert_eq!(chat.decode(false), "§c§ldanger");
        assert_eq!(chat.decode(true), "danger");
    }

    #[test]
    fn translate_components_substitute_their_arguments() {
        let chat = parse(serde_json::json!({
            "translate": "%s joined %s",
            "with": ["alice", {"text": "the server"}],
        }));
        assert_eq!(chat.decode(false), "alice joined the server");
    }

    #[test]
    fn positional_placeholders_reorder_arguments() {
        let chat = parse(serde_json::json!({
            "translate": "%2$s then %1$s",
            "with": ["first", "second"],
        }));
        assert_eq!(chat.decode(false), "second then first");
    }

    #[test]
    fn unmatched_placeholders_stay_verbatim() {
        let chat = parse(serde_json::json!({"translate": "%s and %3$s"}));
        assert_eq!(chat.decode(false), "%s and %3$s");
    }

    #[test]
    fn fallback_wins_over_translation() {
        let chat = parse(serde_json::json!({
            "translate": "multiplayer.status.online",
            "fallback": "Online",
        }));
        assert_eq!(chat.decode(false), "Online");
    }

    #[test]
    fn arrays_join_their_members() {
        let chat = parse(serde_json::json!(["one", {"text": " two"}]));
        assert_eq!(chat.decode(false), "one two");
    }

    #[test]
    fn stripping_keeps_lone_section_signs() {
        assert_eq!(strip_color_codes("§ax§"), "x§");
        assert_eq!(strip_color_codes("§zkeep"), "§zkeep");
    }
}
