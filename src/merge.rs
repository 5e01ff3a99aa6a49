use crate::models::{Category, Source};

/// Combines the remote list with the user's local categories.
///
/// Remote categories keep their order and their `remote` provenance. A local
/// category whose name matches a remote one contributes only the feed URLs
/// not already present there (exact string match, no normalization); a local
/// category with no remote counterpart is appended at the end with `local`
/// provenance. Inputs are consumed: every load cycle rebuilds the list.
pub fn merge(remote: Vec<Category>, local: Vec<Category>) -> Vec<Category> {
    let mut merged = remote;
    for category in &mut merged {
        category.source = Source::Remote;
    }
    for mut lc in local {
        match merged.iter().position(|c| c.name == lc.name) {
            Some(idx) => {
                let existing = &mut merged[idx];
                for station in lc.stations {
                    if !existing.stations.iter().any(|s| s.url == station.url) {
                        existing.stations.push(station);
                    }
                }
            }
            None => {
                lc.source = Source::Local;
                merged.push(lc);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Station;

    fn cat(name: &str, urls: &[&str], source: Source) -> Category {
        Category {
            name: name.to_string(),
            stations: urls
                .iter()
                .map(|u| Station {
                    name: u.to_string(),
                    url: u.to_string(),
                })
                .collect(),
            source,
        }
    }

    #[test]
    fn disjoint_names_concatenate_remote_first() {
        let remote = vec![
            cat("أخبار", &["http://a"], Source::Remote),
            cat("قرآن", &["http://b"], Source::Remote),
        ];
        let local = vec![cat("رياضة", &["http://c"], Source::Local)];
        let merged = merge(remote, local);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].name, "أخبار");
        assert_eq!(merged[1].name, "قرآن");
        assert_eq!(merged[2].name, "رياضة");
        assert_eq!(merged[2].source, Source::Local);
    }

    #[test]
    fn shared_name_unions_feeds_and_keeps_remote_provenance() {
        let remote = vec![cat("أخبار", &["http://a", "http://b"], Source::Remote)];
        let local = vec![cat("أخبار", &["http://b", "http://c"], Source::Local)];
        let merged = merge(remote, local);
        assert_eq!(merged.len(), 1);
        let urls: Vec<_> = merged[0].stations.iter().map(|s| s.url.clone()).collect();
        assert_eq!(urls, ["http://a", "http://b", "http://c"]);
        assert_eq!(merged[0].source, Source::Remote);
    }

    #[test]
    fn merge_is_idempotent_against_empty_local() {
        let remote = vec![cat("أخبار", &["http://a"], Source::Remote)];
        let local = vec![cat("أخبار", &["http://x"], Source::Local)];
        let once = merge(remote, local);
        let twice = merge(once.clone(), Vec::new());
        assert_eq!(once, twice);
    }

    #[test]
    fn url_matching_is_exact() {
        // Trailing slashes and case are significant.
        let remote = vec![cat("g", &["http://a/"], Source::Remote)];
        let local = vec![cat("g", &["http://a", "HTTP://a/"], Source::Local)];
        let merged = merge(remote, local);
        assert_eq!(merged[0].stations.len(), 3);
    }

    #[test]
    fn empty_remote_keeps_local_order() {
        let local = vec![
            cat("أ", &[], Source::Local),
            cat("ب", &[], Source::Local),
        ];
        let merged = merge(Vec::new(), local);
        assert_eq!(merged[0].name, "أ");
        assert_eq!(merged[1].name, "ب");
        assert!(merged.iter().all(|c| c.source == Source::Local));
    }
}
