use serde::{Deserialize, Serialize};
use std::fmt;

pub const TARGET_WIDTH: u32 = 640;
pub const TARGET_HEIGHT: u32 = 480;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Facing {
    /// Rear camera.
    Environment,
    User,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSet {
    pub facing: Option<Facing>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ConstraintSet {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let facing = match self.facing {
            Some(Facing::Environment) => "rear",
            Some(Facing::User) => "front",
            None => "any",
        };
        match self.resolution() {
            Some((w, h)) => write!(f, "{facing} camera @ {w}x{h}"),
            None => write!(f, "{facing} camera"),
        }
    }
}

/// Most specific first; each entry relaxes the previous one.
pub fn default_cascade() -> Vec<ConstraintSet> {
    vec![
        ConstraintSet {
            facing: Some(Facing::Environment),
            width: Some(TARGET_WIDTH),
            height: Some(TARGET_HEIGHT),
        },
        ConstraintSet {
            facing: Some(Facing::Environment),
            width: None,
            height: None,
        },
        ConstraintSet {
            facing: None,
            width: Some(TARGET_WIDTH),
            height: Some(TARGET_HEIGHT),
        },
        ConstraintSet::any(),
    ]
}
