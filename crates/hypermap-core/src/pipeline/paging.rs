//! `next` link derivation for collection pages.

use crate::config::{SAMPLE_PAGE_SIZE, SKIP_PARAM, TOP_PARAM};

use super::RequestContext;

/// The request URI advanced by one page, when the page is full.
///
/// The page size is the request's `$top`, else `default_page_size`. A page
/// holding fewer items than that is the last one.
pub fn next_page_uri(
    ctx: &RequestContext,
    item_count: usize,
    default_page_size: Option<usize>,
) -> Option<String> {
    let page_size = ctx
        .query_value(TOP_PARAM)
        .and_then(|top| top.parse::<usize>().ok())
        .or(default_page_size)
        .filter(|&n| n > 0)?;

    if item_count < page_size || ctx.uri.is_empty() {
        return None;
    }

    let skip = ctx
        .query_value(SKIP_PARAM)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(0);

    // an unreachable offset has no next page
    let next_skip = skip.checked_add(page_size)?;
    Some(with_skip(&ctx.uri, next_skip))
}

/// The fabricated next link of a documentation sample.
pub fn sample_next_uri(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{SKIP_PARAM}={SAMPLE_PAGE_SIZE}")
}

/// Replace (or add) the `$skip` parameter of `uri`, leaving the rest of the
/// query untouched.
fn with_skip(uri: &str, skip: usize) -> String {
    let (base, query) = match uri.split_once('?') {
        Some((base, query)) => (base, query),
        None => (uri, ""),
    };

    let mut pairs: Vec<&str> = query
        .split('&')
        .filter(|p| !p.is_empty() && !is_skip_pair(p))
        .collect();
    let skip_pair = format!("{SKIP_PARAM}={skip}");
    pairs.push(&skip_pair);

    format!("{base}?{}", pairs.join("&"))
}

fn is_skip_pair(pair: &str) -> bool {
    let name = pair.split('=').next().unwrap_or(pair);
    name == SKIP_PARAM || name.eq_ignore_ascii_case("%24skip")
}
