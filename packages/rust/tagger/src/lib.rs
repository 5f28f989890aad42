//! Transcript tagger: raw dialogue scripts to structurally marked lines.
//!
//! The output keeps one entry per input line (plus the wrapper lines) and marks
//! scenes, settings, dialogue, speakers, and stage directions with literal tag
//! tokens. The tags are meant to be counted as ordinary tokens downstream.

mod rules;

use tracing::trace;

pub use rules::{LineKind, classify};

/// Literal tag tokens written by the tagger.
pub mod tags {
    /// An opening/closing tag pair.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TagPair {
        pub open: &'static str,
        pub close: &'static str,
    }

    pub const START: &str = "<start>";
    pub const END: &str = "<end>";
    pub const SCENE_OPEN: &str = "<scene>";
    pub const SCENE_CLOSE: &str = "</scene>";

    pub const SETTING: TagPair = TagPair {
        open: "<lsetting>",
        close: "</lsetting>",
    };
    pub const DIALOGUE: TagPair = TagPair {
        open: "<ldialogue>",
        close: "</ldialogue>",
    };
    pub const STAGE_DIRECTION: TagPair = TagPair {
        open: "<ldirection>",
        close: "</ldirection>",
    };
    pub const DIRECTION: TagPair = TagPair {
        open: "<direction>",
        close: "</direction>",
    };
    pub const SPEAKER: TagPair = TagPair {
        open: "<speaker>",
        close: "</speaker>",
    };
}

/// Index of the first scene's setting line once the wrapper lines are in place.
const FIRST_SETTING_LINE: usize = 2;

/// Blank lines in a row that end a scene.
const SCENE_BREAK_RUN: usize = 3;

/// Tag a raw transcript.
///
/// 1. Wrap in `<start>`/`<scene>` ... `</scene>`/`<end>` lines
/// 2. Mark the line after the opening `<scene>` as the setting
/// 3. Turn every run of 3+ blank lines into `</scene>` ... `<scene>` and mark
///    the following line as that scene's setting
/// 4. Tag stage-direction and dialogue lines
///
/// A dialogue line never becomes a setting; in the setting slot it is tagged
/// as dialogue like anywhere else.
///
/// Never indexes past the end: a scene break at the tail of the document
/// simply has no setting line to mark.
pub fn tag(raw: &str) -> Vec<String> {
    let wrapped = format!(
        "{}\n{}\n{raw}\n{}\n{}",
        tags::START,
        tags::SCENE_OPEN,
        tags::SCENE_CLOSE,
        tags::END
    );

    let mut lines: Vec<String> = wrapped
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect();

    if let Some(setting) = lines.get_mut(FIRST_SETTING_LINE) {
        *setting = rules::tag_setting(setting);
    }

    let mut scenes = 1usize;
    let mut i = FIRST_SETTING_LINE + 1;
    while i < lines.len() {
        if starts_scene_break(&lines, i) {
            lines[i] = tags::SCENE_CLOSE.to_string();

            // Last blank line of the run becomes the next scene's opener.
            let mut last = i;
            while lines.get(last + 1).is_some_and(|l| l.is_empty()) {
                last += 1;
            }
            lines[last] = tags::SCENE_OPEN.to_string();
            if let Some(setting) = lines.get_mut(last + 1) {
                *setting = rules::tag_setting(setting);
            }

            scenes += 1;
            i = last + 2;
            continue;
        }

        lines[i] = rules::tag_line(&lines[i]);
        i += 1;
    }

    trace!(lines = lines.len(), scenes, "tagged transcript");
    lines
}

fn starts_scene_break(lines: &[String], i: usize) -> bool {
    lines
        .get(i..i + SCENE_BREAK_RUN)
        .is_some_and(|run| run.iter().all(|l| l.is_empty()))
}
