use serde::{Deserialize, Serialize};

use crate::models::RequestMode;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum UiState {
    Camera,
    Analyzing,
    Result,
    Settings,
    HdCamera,
    HdAnalyzing,
    HdResult,
}

impl Default for UiState {
    fn default() -> Self {
        UiState::Camera
    }
}

impl UiState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiState::Camera => "camera",
            UiState::Analyzing => "analyzing",
            UiState::Result => "result",
            UiState::Settings => "settings",
            UiState::HdCamera => "hd-camera",
            UiState::HdAnalyzing => "hd-analyzing",
            UiState::HdResult => "hd-result",
        }
    }

    pub fn camera_for(hotdog_unlocked: bool) -> Self {
        if hotdog_unlocked {
            UiState::HdCamera
        } else {
            UiState::Camera
        }
    }

    pub fn result_for(mode: RequestMode) -> Self {
        match mode {
            RequestMode::Standard => UiState::Result,
            RequestMode::HotDog => UiState::HdResult,
        }
    }

    pub fn is_camera(&self) -> bool {
        matches!(self, UiState::Camera | UiState::HdCamera)
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing_mode().is_some()
    }

    pub fn is_result(&self) -> bool {
        matches!(self, UiState::Result | UiState::HdResult)
    }

    /// The request mode an analyzing state is waiting on.
    pub fn analyzing_mode(&self) -> Option<RequestMode> {
        match self {
            UiState::Analyzing => Some(RequestMode::Standard),
            UiState::HdAnalyzing => Some(RequestMode::HotDog),
            _ => None,
        }
    }

    /// Screen surfaces visible in this state. Exactly one screen, except that
    /// hd-camera overlays its controls on the live camera feed.
    pub fn surfaces(&self) -> &'static [Surface] {
        match self {
            UiState::Camera => &[Surface::CameraFeed],
            UiState::HdCamera => &[Surface::CameraFeed, Surface::HotDogControls],
            UiState::Analyzing | UiState::HdAnalyzing => &[Surface::Analyzing],
            UiState::Result => &[Surface::ResultCard],
            UiState::HdResult => &[Surface::HotDogVerdict],
            UiState::Settings => &[Surface::SettingsPanel],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Surface {
    CameraFeed,
    HotDogControls,
    Analyzing,
    ResultCard,
    HotDogVerdict,
    SettingsPanel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Capture,
    ResultReady,
    CaptureFailed,
    /// Leave an analyzing screen after the watchdog fired. The request stays
    /// pending.
    Abandon,
    Dismiss,
    OpenSettings,
    CloseSettings,
}

/// The transition table. `None` means the trigger is not legal in `current`.
pub fn next_state(current: UiState, trigger: Trigger, hotdog_unlocked: bool) -> Option<UiState> {
    use Trigger::*;
    use UiState::*;

    match (current, trigger) {
        (Camera, Capture) => Some(Analyzing),
        (HdCamera, Capture) => Some(HdAnalyzing),
        (Analyzing, ResultReady) => Some(Result),
        (HdAnalyzing, ResultReady) => Some(HdResult),
        (Analyzing, CaptureFailed | Abandon) => Some(Camera),
        (HdAnalyzing, CaptureFailed | Abandon) => Some(HdCamera),
        (Result | HdResult, Dismiss) => Some(UiState::camera_for(hotdog_unlocked)),
        (Camera | HdCamera, OpenSettings) => Some(Settings),
        (Settings, CloseSettings) => Some(UiState::camera_for(hotdog_unlocked)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [UiState; 7] = [
        UiState::Camera,
        UiState::Analyzing,
        UiState::Result,
        UiState::Settings,
        UiState::HdCamera,
        UiState::HdAnalyzing,
        UiState::HdResult,
    ];

    #[test]
    fn capture_only_from_camera_states() {
        for state in ALL {
            let next = next_state(state, Trigger::Capture, false);
            assert_eq!(next.is_some(), state.is_camera(), "capture from {state:?}");
        }
    }

    #[test]
    fn no_capture_while_pending() {
        // A second request can only start from a camera state, which is
        // never the state while the first one is being analyzed.
        for state in [UiState::Analyzing, UiState::HdAnalyzing] {
            assert_eq!(next_state(state, Trigger::Capture, true), None);
            assert_eq!(next_state(state, Trigger::Capture, false), None);
        }
    }

    #[test]
    fn failure_bounces_to_matching_camera() {
        assert_eq!(
            next_state(UiState::Analyzing, Trigger::CaptureFailed, true),
            Some(UiState::Camera)
        );
        assert_eq!(
            next_state(UiState::HdAnalyzing, Trigger::CaptureFailed, false),
            Some(UiState::HdCamera)
        );
    }

    #[test]
    fn dismiss_follows_hotdog_flag() {
        assert_eq!(
            next_state(UiState::Result, Trigger::Dismiss, true),
            Some(UiState::HdCamera)
        );
        assert_eq!(
            next_state(UiState::HdResult, Trigger::Dismiss, false),
            Some(UiState::Camera)
        );
    }

    #[test]
    fn settings_round_trip_applies_mode_on_close() {
        let opened = next_state(UiState::Camera, Trigger::OpenSettings, false).unwrap();
        assert_eq!(opened, UiState::Settings);
        assert_eq!(
            next_state(opened, Trigger::CloseSettings, true),
            Some(UiState::HdCamera)
        );
        assert_eq!(next_state(UiState::Result, Trigger::OpenSettings, false), None);
    }

    #[test]
    fn each_state_shows_one_screen() {
        for state in ALL {
            let screens = state
                .surfaces()
                .iter()
                .filter(|surface| **surface != Surface::HotDogControls)
                .count();
            assert_eq!(screens, 1, "{state:?}");
        }
    }

    #[test]
    fn serializes_with_dashed_names() {
        assert_eq!(
            serde_json::to_string(&UiState::HdAnalyzing).unwrap(),
            "\"hd-analyzing\""
        );
        assert_eq!(UiState::HdAnalyzing.as_str(), "hd-analyzing");
    }
}
