//! Access verdicts and block reasons.
//!
//! Block reasons come from a closed set. Their string forms are part of the
//! API: the player maps them to one of a few child-facing "time's up" screens.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::story::StoryType;

/// Why a story may not be played right now.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockReason {
    /// Total play across all stories reached the global limit.
    GlobalTimeLimit,
    /// The story's content type is inside its restricted hours.
    ContentTypeRestrictedHours(StoryType),
    /// Play of the story's content type reached its limit.
    ContentTypeTimeLimit(StoryType),
    /// One of the story's tags is inside its restricted hours.
    TagRestrictedHours,
    /// Play across stories sharing a tag reached the tag's limit.
    TagTimeLimit {
        /// Name of the limiting tag.
        tag_name: String,
    },
    /// The story has no tags, so nothing unlocks it.
    NoTagsAssigned,
    /// The story has tags but none is enabled.
    Restricted,
}

impl BlockReason {
    /// The broad kind of block, used to pick a presentation.
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::ContentTypeRestrictedHours(_) | Self::TagRestrictedHours => {
                BlockKind::RestrictedHours
            }
            Self::GlobalTimeLimit | Self::ContentTypeTimeLimit(_) | Self::TagTimeLimit { .. } => {
                BlockKind::TimeLimit
            }
            Self::NoTagsAssigned | Self::Restricted => BlockKind::Locked,
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GlobalTimeLimit => f.write_str("Global Time Limit Reached"),
            Self::ContentTypeRestrictedHours(ty) => {
                write!(f, "{} Restricted Hours", ty.display_name())
            }
            Self::ContentTypeTimeLimit(ty) => write!(f, "{} Time Limit Reached", ty.display_name()),
            Self::TagRestrictedHours => f.write_str("Restricted Hours"),
            Self::TagTimeLimit { tag_name } => write!(f, "Time Limit ({tag_name})"),
            Self::NoTagsAssigned => f.write_str("No Tags Assigned"),
            Self::Restricted => f.write_str("Restricted"),
        }
    }
}

/// Presentation category of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Sleep time / quiet hours.
    RestrictedHours,
    /// Allowance used up.
    TimeLimit,
    /// A parent needs to unlock the content.
    Locked,
}

/// Outcome of evaluating the access rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Playback may continue.
    Pass,
    /// Playback must stop.
    Block(BlockReason),
}

impl Verdict {
    /// Whether this verdict blocks playback.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Block(_))
    }

    /// The block reason, if blocked.
    #[must_use]
    pub fn reason(&self) -> Option<&BlockReason> {
        match self {
            Self::Pass => None,
            Self::Block(reason) => Some(reason),
        }
    }
}

/// Message shown when a reason is not recognized.
pub const GENERIC_BLOCK_MESSAGE: &str = "That's all for now. Come back a little later!";

/// Map a reason string to the child-facing message for its screen.
///
/// Unrecognized reasons get [`GENERIC_BLOCK_MESSAGE`].
#[must_use]
pub fn message_for_reason(reason: &str) -> &'static str {
    if reason == "Global Time Limit Reached" || reason.ends_with("Time Limit Reached") {
        return "You've used up your listening time for now. Let's take a break!";
    }
    if reason.starts_with("Time Limit (") && reason.ends_with(')') {
        return "You've had lots of these stories today. Try something else!";
    }
    if reason.ends_with("Restricted Hours") {
        return "It's quiet time right now. Stories will be back soon. Sleep tight!";
    }
    match reason {
        "No Tags Assigned" | "Restricted" => {
            "This story is locked. Ask a grown-up to unlock it for you."
        }
        _ => GENERIC_BLOCK_MESSAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_strings_match_the_closed_set() {
        let cases = [
            (BlockReason::GlobalTimeLimit, "Global Time Limit Reached"),
            (
                BlockReason::ContentTypeRestrictedHours(StoryType::Audiobook),
                "Audiobook Restricted Hours",
            ),
            (
                BlockReason::ContentTypeTimeLimit(StoryType::Readaloud),
                "Readaloud Time Limit Reached",
            ),
            (BlockReason::TagRestrictedHours, "Restricted Hours"),
            (
                BlockReason::TagTimeLimit {
                    tag_name: "Dinosaurs".into(),
                },
                "Time Limit (Dinosaurs)",
            ),
            (BlockReason::NoTagsAssigned, "No Tags Assigned"),
            (BlockReason::Restricted, "Restricted"),
        ];
        for (reason, expected) in cases {
            assert_eq!(reason.to_string(), expected);
        }
    }

    #[test]
    fn every_reason_has_a_specific_message() {
        let reasons = [
            BlockReason::GlobalTimeLimit,
            BlockReason::ContentTypeRestrictedHours(StoryType::Audiobook),
            BlockReason::ContentTypeTimeLimit(StoryType::Audiobook),
            BlockReason::TagRestrictedHours,
            BlockReason::TagTimeLimit {
                tag_name: "Songs".into(),
            },
            BlockReason::NoTagsAssigned,
            BlockReason::Restricted,
        ];
        for reason in reasons {
            assert_ne!(message_for_reason(&reason.to_string()), GENERIC_BLOCK_MESSAGE);
        }
    }

    #[test]
    fn unknown_reason_gets_generic_message() {
        assert_eq!(message_for_reason("Cosmic Rays"), GENERIC_BLOCK_MESSAGE);
    }

    #[test]
    fn kinds_group_reasons_by_screen() {
        assert_eq!(BlockReason::TagRestrictedHours.kind(), BlockKind::RestrictedHours);
        assert_eq!(BlockReason::GlobalTimeLimit.kind(), BlockKind::TimeLimit);
        assert_eq!(BlockReason::Restricted.kind(), BlockKind::Locked);
    }
}
