//! `Link` response header parsing (RFC 8288), used for GitHub pagination.
//!
//! GitHub sends e.g.
//! `<https://api.github.com/user/1/gists?page=2>; rel="next", <...?page=5>; rel="last"`.

/// Find the target URL of the first link whose relation list contains `rel`.
pub fn find_rel(header: &str, rel: &str) -> Option<String> {
    split_links(header).find_map(|link| {
        let (target, params) = parse_link(link)?;
        params
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("rel"))
            .flat_map(|(_, value)| value.split_ascii_whitespace())
            .any(|r| r.eq_ignore_ascii_case(rel))
            .then(|| target.to_string())
    })
}

/// URL of the next page, if advertised.
pub fn next_url(header: &str) -> Option<String> {
    find_rel(header, "next")
}

pub fn has_next_page(header: &str) -> bool {
    next_url(header).is_some()
}

/// Split on commas that are outside `<...>` and quoted strings.
fn split_links(header: &str) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_angle = false;
    let mut in_quote = false;

    for (i, c) in header.char_indices() {
        match c {
            '<' if !in_quote => in_angle = true,
            '>' if !in_quote => in_angle = false,
            '"' if !in_angle => in_quote = !in_quote,
            ',' if !in_angle && !in_quote => {
                parts.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&header[start..]);

    parts.into_iter().map(str::trim).filter(|p| !p.is_empty())
}

/// Parse `<target>; name=value; name="value"` into the target and its params.
fn parse_link(link: &str) -> Option<(&str, Vec<(&str, String)>)> {
    let link = link.trim();
    let rest = link.strip_prefix('<')?;
    let end = rest.find('>')?;
    let target = rest[..end].trim();

    let params = rest[end + 1..]
        .split(';')
        .filter_map(|param| {
            let (name, value) = param.split_once('=')?;
            let value = value.trim().trim_matches('"').to_string();
            Some((name.trim(), value))
        })
        .collect();

    Some((target, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GITHUB_LINK: &str = "<https://api.github.com/user/583231/gists?page=2&per_page=10>; rel=\"next\", \
        <https://api.github.com/user/583231/gists?page=4&per_page=10>; rel=\"last\"";

    #[test]
    fn test_github_next_and_last() {
        assert_eq!(
            next_url(GITHUB_LINK).as_deref(),
            Some("https://api.github.com/user/583231/gists?page=2&per_page=10")
        );
        assert_eq!(
            find_rel(GITHUB_LINK, "last").as_deref(),
            Some("https://api.github.com/user/583231/gists?page=4&per_page=10")
        );
        assert!(has_next_page(GITHUB_LINK));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let header = "<https://api.github.com/user/1/gists?page=1>; rel=\"prev\", \
            <https://api.github.com/user/1/gists?page=1>; rel=\"first\"";
        assert!(!has_next_page(header));
        assert!(!has_next_page(""));
    }

    #[test]
    fn test_multiple_rels_and_case() {
        assert!(has_next_page("<https://example.com/?page=2>; rel=\"NEXT last\""));
        assert!(has_next_page("<https://example.com/?page=2>;rel=next"));
    }

    #[test]
    fn test_commas_inside_target() {
        let header = "<https://example.com/?ids=1,2,3>; rel=\"next\"";
        assert_eq!(
            next_url(header).as_deref(),
            Some("https://example.com/?ids=1,2,3")
        );
    }

    #[test]
    fn test_malformed_links_ignored() {
        assert!(!has_next_page("https://example.com/?page=2; rel=\"next\""));
        assert!(!has_next_page("<https://example.com/?page=2; rel=\"next\""));
    }
}
