use crate::document::Document;
use crate::errors::DocBindResult;
use crate::query::parse_document;
use std::fmt::{Display, Formatter};

/// A bound query: the template it came from and the text with every
/// placeholder filled in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    template: String,
    bound: String,
}

impl Query {
    pub(crate) fn new(template: &str, bound: String) -> Self {
        Query {
            template: template.to_string(),
            bound,
        }
    }

    /// The bound query text, ready for the store.
    pub fn as_str(&self) -> &str {
        &self.bound
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parses the bound text into a [Document].
    ///
    /// # Errors
    ///
    /// `QuerySyntaxError` when the bound text is not a well formed object,
    /// for example when a raw string parameter was not quoted in the template.
    pub fn to_document(&self) -> DocBindResult<Document> {
        parse_document(&self.bound)
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.bound)
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.bound
    }
}
