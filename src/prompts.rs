use crate::models::RequestMode;

pub const STANDARD_PROMPT: &str = "Identify the main object in this photo. Reply with JSON only, \
no markdown: {\"name\": \"short object name\", \"category\": \"general category\", \
\"description\": \"one or two sentences\", \"fun_fact\": \"one surprising fact\"}";

pub const HOTDOG_PROMPT: &str = "Is the main object in this photo a hot dog? Reply with JSON \
only, no markdown: {\"result\": \"HOT DOG\" or \"NOT HOT DOG\", \"reason\": \"one short \
sentence\"}";

pub fn prompt_for(mode: RequestMode) -> &'static str {
    match mode {
        RequestMode::Standard => STANDARD_PROMPT,
        RequestMode::HotDog => HOTDOG_PROMPT,
    }
}
