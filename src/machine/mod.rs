pub mod controller;
pub mod result_view;
pub mod state;

pub use controller::{action_for, CaptureController, ControllerContext, ControllerDeps};
pub use result_view::ResultView;
pub use state::{next_state, Surface, Trigger, UiState};
