use std::fmt;
use std::str::FromStr;

use crate::error::GraphError;

/// Object types accepted by the `search` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Post,
    User,
    Page,
    Event,
    Group,
    Place,
    Checkin,
}

impl SearchType {
    pub const ALL: [SearchType; 7] = [
        SearchType::Post,
        SearchType::User,
        SearchType::Page,
        SearchType::Event,
        SearchType::Group,
        SearchType::Place,
        SearchType::Checkin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Post => "post",
            SearchType::User => "user",
            SearchType::Page => "page",
            SearchType::Event => "event",
            SearchType::Group => "group",
            SearchType::Place => "place",
            SearchType::Checkin => "checkin",
        }
    }

    /// Comma-separated list of every supported type, for error messages.
    pub fn supported() -> String {
        Self::ALL.iter().map(SearchType::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = GraphError;

    /// Matching is exact; `"Post"` is rejected like any other unknown type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GraphError::UnsupportedSearchType {
                kind: s.to_string(),
                supported: Self::supported(),
            })
    }
}
