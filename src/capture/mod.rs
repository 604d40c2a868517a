pub mod constraints;
pub mod frame_capture;
pub mod source;

pub use constraints::{default_cascade, ConstraintSet, Facing};
pub use frame_capture::{CapturedFrame, Frame, FrameCapture, StreamStatus};
pub use source::{ImageFileSource, VideoSource, VideoStream};
