//! Per-line classification rules.
//!
//! Each rule looks at one line on its own; scene structure is handled by the
//! caller in `lib.rs`.

use std::sync::LazyLock;

use regex::Regex;

use crate::tags;

/// Line opening with `[` or `(`.
static STAGE_DIRECTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\[(]").expect("valid regex"));

/// Line opening with an optional run of capitals and a colon (`JERRY:`, `:`).
static DIALOGUE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]*:").expect("valid regex"));

/// Parenthesized aside inside a dialogue line; the group excludes the parentheses.
static INLINE_DIRECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*?)\)").expect("valid regex"));

/// Speaker name plus colon.
static SPEAKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]*:)").expect("valid regex"));

/// What a single transcript line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `(Jerry enters)` / `[Monk's Cafe]`
    StageDirection,
    /// `GEORGE: I'm out.`
    Dialogue,
    /// Anything else, left untouched.
    Plain,
}

/// Classify a raw line. Stage directions win over dialogue.
pub fn classify(line: &str) -> LineKind {
    if STAGE_DIRECTION_LINE.is_match(line) {
        LineKind::StageDirection
    } else if DIALOGUE_LINE.is_match(line) {
        LineKind::Dialogue
    } else {
        LineKind::Plain
    }
}

/// Rewrite one non-structural line according to its kind.
pub(crate) fn tag_line(line: &str) -> String {
    match classify(line) {
        LineKind::StageDirection => wrap(tags::STAGE_DIRECTION, line),
        LineKind::Dialogue => tag_dialogue(line),
        LineKind::Plain => line.to_string(),
    }
}

/// Rewrite the line that opens a scene. A line with a speaker is dialogue even
/// in the setting slot; anything else is the scene's setting.
pub(crate) fn tag_setting(line: &str) -> String {
    match classify(line) {
        LineKind::Dialogue => tag_dialogue(line),
        LineKind::StageDirection | LineKind::Plain => wrap(tags::SETTING, line),
    }
}

/// Wrap the whole line in dialogue tags, then mark the first aside and the speaker.
fn tag_dialogue(line: &str) -> String {
    let wrapped = wrap(tags::DIALOGUE, line);

    let direction = format!("{} ${{1}} {}", tags::DIRECTION.open, tags::DIRECTION.close);
    let wrapped = INLINE_DIRECTION.replacen(&wrapped, 1, direction.as_str());

    let speaker = format!("{} ${{1}} {}", tags::SPEAKER.open, tags::SPEAKER.close);
    SPEAKER.replacen(&wrapped, 1, speaker.as_str()).into_owned()
}

/// `<open> line </close>`, space separated so tags split out as their own tokens.
pub(crate) fn wrap(pair: tags::TagPair, line: &str) -> String {
    format!("{} {line} {}", pair.open, pair.close)
}
