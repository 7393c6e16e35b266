//! `Link` header parsing.
//!
//! The API paginates with headers of the form
//!
//! ```text
//! <https://host/api/0/...?cursor=0:0:1>; rel="previous"; results="false"; cursor="0:0:1",
//! <https://host/api/0/...?cursor=0:50:0>; rel="next"; results="true"; cursor="0:50:0"
//! ```

use std::collections::HashMap;

use crate::error::FetchError;

/// One link of a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLink {
    pub href: String,
    /// `None` when the link carries no `results` attribute.
    pub results: Option<bool>,
    pub cursor: Option<String>,
}

impl ParsedLink {
    /// Whether following this link yields more results.
    pub fn has_results(&self) -> bool {
        self.results == Some(true)
    }
}

/// Links of a `Link` header, keyed by `rel`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkHeader {
    links: HashMap<String, ParsedLink>,
}

impl LinkHeader {
    pub fn get(&self, rel: &str) -> Option<&ParsedLink> {
        self.links.get(rel)
    }

    pub fn next(&self) -> Option<&ParsedLink> {
        self.get("next")
    }

    pub fn previous(&self) -> Option<&ParsedLink> {
        self.get("previous")
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Parse a `Link` header.
///
/// Every link needs an `<href>` and a `rel`; anything else is rejected with
/// [`FetchError::PaginationHeader`]. Unknown attributes are ignored.
pub fn parse_link_header(header: &str) -> Result<LinkHeader, FetchError> {
    let mut links = HashMap::new();

    for raw in header.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (rel, link) = parse_link(raw)?;
        links.insert(rel, link);
    }

    if links.is_empty() {
        return Err(FetchError::PaginationHeader("no links in header".to_string()));
    }

    Ok(LinkHeader { links })
}

fn parse_link(raw: &str) -> Result<(String, ParsedLink), FetchError> {
    let malformed = |why: &str| FetchError::PaginationHeader(format!("{}: {:?}", why, raw));

    let rest = raw.strip_prefix('<').ok_or_else(|| malformed("missing '<'"))?;
    let (href, params) = rest.split_once('>').ok_or_else(|| malformed("missing '>'"))?;

    let mut rel = None;
    let mut link = ParsedLink {
        href: href.to_string(),
        ..ParsedLink::default()
    };

    for param in params.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| malformed("attribute without value"))?;
        let value = value.trim().trim_matches('"');
        match key.trim() {
            "rel" => rel = Some(value.to_string()),
            "results" => {
                link.results = match value {
                    "true" => Some(true),
                    "false" => Some(false),
                    _ => None,
                }
            }
            "cursor" => link.cursor = Some(value.to_string()),
            _ => {}
        }
    }

    let rel = rel.ok_or_else(|| malformed("missing rel"))?;
    Ok((rel, link))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = concat!(
        "<https://sentry.io/api/0/organizations/acme/replays-events-meta/?cursor=0:0:1>; ",
        "rel=\"previous\"; results=\"false\"; cursor=\"0:0:1\", ",
        "<https://sentry.io/api/0/organizations/acme/replays-events-meta/?cursor=0:50:0>; ",
        "rel=\"next\"; results=\"true\"; cursor=\"0:50:0\"",
    );

    #[test]
    fn test_parses_previous_and_next() {
        let parsed = parse_link_header(HEADER).unwrap();
        assert_eq!(parsed.len(), 2);

        let next = parsed.next().unwrap();
        assert!(next.has_results());
        assert_eq!(next.cursor.as_deref(), Some("0:50:0"));
        assert!(next.href.ends_with("cursor=0:50:0"));

        let previous = parsed.previous().unwrap();
        assert_eq!(previous.results, Some(false));
    }

    #[test]
    fn test_results_without_known_value() {
        let parsed = parse_link_header("<u>; rel=\"next\"; results=\"maybe\"").unwrap();
        assert_eq!(parsed.next().unwrap().results, None);
        assert!(!parsed.next().unwrap().has_results());
    }

    #[test]
    fn test_rejects_malformed_links() {
        assert!(matches!(
            parse_link_header("rel=\"next\""),
            Err(FetchError::PaginationHeader(_))
        ));
        assert!(parse_link_header("<u>; results=\"true\"").is_err());
        assert!(parse_link_header("<u; rel=\"next\"").is_err());
        assert!(parse_link_header("  ").is_err());
    }
}
