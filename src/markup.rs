//! Inline markup carried by narration and commentary text
//!
//! The bundled corpus marks emphasis with `<p0>`..`<p2>` (strongest first),
//! colour with `<red>`, `<darkred>`, `<blue>` and `<green>`, and paragraph
//! breaks with `\n`. Anything else is plain text.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const TAG_PATTERN: &str = r"</?(p0|p1|p2|red|darkred|blue|green)>|\n";

fn tag_regex() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(TAG_PATTERN).expect("tag pattern is a valid regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    #[default]
    Normal,
    Bold,
    SemiBold,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    DarkRed,
    Blue,
    Green,
}

impl Color {
    fn from_tag(name: &str) -> Option<Self> {
        match name {
            "red" => Some(Color::Red),
            "darkred" => Some(Color::DarkRed),
            "blue" => Some(Color::Blue),
            "green" => Some(Color::Green),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text {
        text: String,
        emphasis: Emphasis,
        color: Option<Color>,
    },
    LineBreak,
}

#[derive(Default)]
struct StyleState {
    open: [bool; 3],
    colors: Vec<Color>,
}

impl StyleState {
    fn emphasis(&self) -> Emphasis {
        match self.open {
            [true, _, _] => Emphasis::Bold,
            [false, true, _] => Emphasis::SemiBold,
            [false, false, true] => Emphasis::Medium,
            _ => Emphasis::Normal,
        }
    }

    fn apply(&mut self, name: &str, closing: bool) {
        let level = match name {
            "p0" => Some(0),
            "p1" => Some(1),
            "p2" => Some(2),
            _ => None,
        };
        if let Some(level) = level {
            self.open[level] = !closing;
            return;
        }
        let Some(color) = Color::from_tag(name) else {
            return;
        };
        if closing {
            // Stray closers are ignored
            if let Some(pos) = self.colors.iter().rposition(|c| *c == color) {
                self.colors.remove(pos);
            }
        } else {
            self.colors.push(color);
        }
    }
}

fn push_text(segments: &mut Vec<Segment>, state: &StyleState, chunk: &str) {
    if !chunk.is_empty() {
        segments.push(Segment::Text {
            text: chunk.to_string(),
            emphasis: state.emphasis(),
            color: state.colors.last().copied(),
        });
    }
}

/// Split marked-up text into styled segments.
pub fn parse(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut state = StyleState::default();
    let mut last = 0;

    for caps in tag_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        push_text(&mut segments, &state, &text[last..whole.start()]);
        last = whole.end();

        match caps.get(1) {
            Some(name) => state.apply(name.as_str(), whole.as_str().starts_with("</")),
            None => segments.push(Segment::LineBreak),
        }
    }
    push_text(&mut segments, &state, &text[last..]);

    segments
}

/// Text with all markup removed, line breaks preserved.
pub fn plain_text(text: &str) -> String {
    parse(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text { text, .. } => text,
            Segment::LineBreak => "\n".to_string(),
        })
        .collect()
}
