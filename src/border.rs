use serde::Serialize;

/// Device-level indicator colours.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BorderColor {
    Green,
    Red,
    Black,
}

impl BorderColor {
    pub fn hex(&self) -> &'static str {
        match self {
            BorderColor::Green => "#00FF00",
            BorderColor::Red => "#FF0000",
            BorderColor::Black => "#000000",
        }
    }

    pub fn for_verdict(is_hot_dog: bool) -> Self {
        if is_hot_dog {
            BorderColor::Green
        } else {
            BorderColor::Red
        }
    }
}

/// Optional host hook that tints the device border.
pub trait BorderIndicator: Send + Sync {
    fn set_color(&self, color: BorderColor);
}

/// For hosts without a border indicator.
pub struct NoopBorder;

impl BorderIndicator for NoopBorder {
    fn set_color(&self, _color: BorderColor) {}
}
