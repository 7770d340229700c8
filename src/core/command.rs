#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::stats::StatsSnapshot;
use crate::view::ViewMode;

/// Operator commands understood by the daemon's command router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum Command {
    NextPage,
    PrevPage,
    ToggleMultiView,
    MultiNextPage,
    MultiPrevPage,
    ReturnToSingle,
    TogglePause,
    SaveAll,
    LoadAll,
    Status,
    Quit,
}

impl Command {
    /// Translate one line of keyboard input, given the current view mode.
    ///
    /// Single view: `n` `p` `m` space `s` `l` `q`. Multi view: `n` `p` page the
    /// grid and `q` returns to the single view. `quit` exits from anywhere.
    pub fn from_key(line: &str, mode: ViewMode) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line == " " {
            return Some(Command::TogglePause);
        }
        let key = line.trim().to_ascii_lowercase();
        let cmd = match (key.as_str(), mode) {
            ("pause" | "space", _) => Command::TogglePause,
            ("s" | "save", _) => Command::SaveAll,
            ("l" | "load", _) => Command::LoadAll,
            ("status", _) => Command::Status,
            ("quit" | "exit", _) => Command::Quit,
            ("n", ViewMode::SinglePage) => Command::NextPage,
            ("p", ViewMode::SinglePage) => Command::PrevPage,
            ("m", ViewMode::SinglePage) => Command::ToggleMultiView,
            ("q", ViewMode::SinglePage) => Command::Quit,
            ("n", ViewMode::MultiGrid) => Command::MultiNextPage,
            ("p", ViewMode::MultiGrid) => Command::MultiPrevPage,
            ("q" | "m", ViewMode::MultiGrid) => Command::ReturnToSingle,
            _ => return None,
        };
        Some(cmd)
    }

    /// Parse a command name as typed on a command line (`next-page`, `save`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let cmd = match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "next" | "next-page" => Command::NextPage,
            "prev" | "prev-page" => Command::PrevPage,
            "multi" | "toggle-multi-view" => Command::ToggleMultiView,
            "multi-next" | "multi-next-page" => Command::MultiNextPage,
            "multi-prev" | "multi-prev-page" => Command::MultiPrevPage,
            "single" | "return-to-single" => Command::ReturnToSingle,
            "pause" | "resume" | "toggle-pause" => Command::TogglePause,
            "save" | "save-all" => Command::SaveAll,
            "load" | "load-all" => Command::LoadAll,
            "status" => Command::Status,
            "quit" | "shutdown" => Command::Quit,
            _ => return None,
        };
        Some(cmd)
    }

    /// The view mode a command requires, if any.
    pub fn required_mode(self) -> Option<ViewMode> {
        match self {
            Command::NextPage | Command::PrevPage | Command::ToggleMultiView => {
                Some(ViewMode::SinglePage)
            }
            Command::MultiNextPage | Command::MultiPrevPage | Command::ReturnToSingle => {
                Some(ViewMode::MultiGrid)
            }
            _ => None,
        }
    }
}

/// Point-in-time summary returned for [`Command::Status`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusReport {
    pub paused: bool,
    pub mode: ViewMode,
    pub page: usize,
    pub page_count: usize,
    pub instances: usize,
    pub stats: StatsSnapshot,
}

/// Reply to one command on the control socket.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum Response {
    State(StatusReport),
    Success { message: String },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_depend_on_mode() {
        assert_eq!(Command::from_key("n", ViewMode::SinglePage), Some(Command::NextPage));
        assert_eq!(Command::from_key("n", ViewMode::MultiGrid), Some(Command::MultiNextPage));
        assert_eq!(Command::from_key("q\n", ViewMode::SinglePage), Some(Command::Quit));
        assert_eq!(Command::from_key("q", ViewMode::MultiGrid), Some(Command::ReturnToSingle));
        assert_eq!(Command::from_key("quit", ViewMode::MultiGrid), Some(Command::Quit));
    }

    #[test]
    fn space_toggles_pause() {
        assert_eq!(Command::from_key(" \n", ViewMode::SinglePage), Some(Command::TogglePause));
        assert_eq!(Command::from_key("pause", ViewMode::MultiGrid), Some(Command::TogglePause));
        assert_eq!(Command::from_key("", ViewMode::SinglePage), None);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_eq!(Command::from_key("x", ViewMode::SinglePage), None);
        assert_eq!(Command::from_key("m", ViewMode::MultiGrid), Some(Command::ReturnToSingle));
    }

    #[test]
    fn names_parse() {
        assert_eq!(Command::from_name("save_all"), Some(Command::SaveAll));
        assert_eq!(Command::from_name("Next-Page"), Some(Command::NextPage));
        assert_eq!(Command::from_name("bogus"), None);
    }

    #[test]
    fn preconditions() {
        assert_eq!(Command::NextPage.required_mode(), Some(ViewMode::SinglePage));
        assert_eq!(Command::MultiPrevPage.required_mode(), Some(ViewMode::MultiGrid));
        assert_eq!(Command::SaveAll.required_mode(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn wire_shape_is_tagged() {
        let json = serde_json::to_string(&Command::SaveAll).unwrap();
        assert_eq!(json, r#"{"type":"SaveAll"}"#);
        let back: Command = serde_json::from_str(r#"{"type":"MultiNextPage"}"#).unwrap();
        assert_eq!(back, Command::MultiNextPage);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn status_response_round_trips() {
        let resp = Response::State(StatusReport {
            paused: true,
            mode: ViewMode::MultiGrid,
            page: 2,
            page_count: 9,
            instances: 42,
            stats: StatsSnapshot {
                iterations: 7,
                total_living_cells: 300,
                active_count: 40,
            },
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.starts_with(r#"{"type":"State""#));
        let back: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
    }
}
