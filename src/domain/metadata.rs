use serde::{Deserialize, Serialize};

/// Page metadata produced by the extractor.
///
/// `keywords` is never null: a page without a keywords attribute yields an
/// empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.keywords.is_empty()
    }
}
