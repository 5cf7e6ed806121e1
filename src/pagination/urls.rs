//! Query-string rewriting for pagination links
//!
//! Both helpers keep every other parameter, collapse repeated keys for the
//! parameter they touch, and re-emit the query sorted by key.

use std::collections::BTreeMap;
use std::fmt::Display;

use url::Url;

fn query_map(url: &Url) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        params.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    params
}

fn with_query(url: &Url, params: BTreeMap<String, Vec<String>>) -> Url {
    let mut url = url.clone();
    if params.is_empty() {
        url.set_query(None);
        return url;
    }

    url.query_pairs_mut()
        .clear()
        .extend_pairs(params.iter().flat_map(|(key, values)| {
            values.iter().map(move |value| (key.as_str(), value.as_str()))
        }));
    url
}

/// `url` with `key` set to exactly `value`
pub fn replace_query_param(url: &Url, key: &str, value: impl Display) -> Url {
    let mut params = query_map(url);
    params.insert(key.to_string(), vec![value.to_string()]);
    with_query(url, params)
}

/// `url` without any `key` parameter
pub fn remove_query_param(url: &Url, key: &str) -> Url {
    let mut params = query_map(url);
    params.remove(key);
    with_query(url, params)
}
