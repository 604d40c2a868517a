use serde::Serialize;

use crate::models::ResultPayload;

/// One labelled line on a result page.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResultLine {
    pub label: &'static str,
    pub text: String,
}

/// The result currently on screen and the page being shown (1-based).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub payload: ResultPayload,
    pub page: usize,
    pub page_count: usize,
}

impl ResultView {
    pub fn new(payload: ResultPayload) -> Self {
        let page_count = payload.page_count();
        Self {
            payload,
            page: 1,
            page_count,
        }
    }

    pub fn next_page(&mut self) -> bool {
        if self.page < self.page_count {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn lines(&self) -> Vec<ResultLine> {
        match (&self.payload, self.page) {
            (ResultPayload::Standard(result), 1) => vec![
                ResultLine {
                    label: "Name",
                    text: result.name.clone(),
                },
                ResultLine {
                    label: "Category",
                    text: result.category.clone(),
                },
            ],
            (ResultPayload::Standard(result), 2) => vec![ResultLine {
                label: "Description",
                text: result.description.clone(),
            }],
            (ResultPayload::Standard(result), _) => vec![ResultLine {
                label: "Fun fact",
                text: result.fun_fact.clone(),
            }],
            (ResultPayload::HotDog(result), _) => vec![
                ResultLine {
                    label: "Verdict",
                    text: result.verdict_label().to_string(),
                },
                ResultLine {
                    label: "Reason",
                    text: result.reason.clone(),
                },
            ],
        }
    }
}
