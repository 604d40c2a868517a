use serde::{Deserialize, Serialize};

pub const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StandardResult {
    pub name: String,
    pub category: String,
    pub description: String,
    pub fun_fact: String,
}

impl Default for StandardResult {
    fn default() -> Self {
        Self {
            name: UNKNOWN_NAME.into(),
            category: String::new(),
            description: String::new(),
            fun_fact: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HotDogResult {
    pub is_hot_dog: bool,
    pub reason: String,
}

impl HotDogResult {
    pub fn verdict_label(&self) -> &'static str {
        if self.is_hot_dog {
            "HOT DOG"
        } else {
            "NOT HOT DOG"
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResultPayload {
    Standard(StandardResult),
    HotDog(HotDogResult),
}

impl ResultPayload {
    /// Pages shown on the result screen. Standard results page through their
    /// fields; a verdict fits on one page.
    pub fn page_count(&self) -> usize {
        match self {
            ResultPayload::Standard(_) => 3,
            ResultPayload::HotDog(_) => 1,
        }
    }
}
