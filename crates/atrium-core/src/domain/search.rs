//! Service grid search.
//!
//! The dashboard's search box narrows the grid to services whose name or
//! description contains the typed text, ignoring case and surrounding
//! whitespace.  Matches are returned with their index so a caller can go on to
//! edit the hit positionally.

use crate::domain::config::Service;

/// Returns the services matching `query`, paired with their index.
///
/// An empty (or all-whitespace) query matches every service.
pub fn filter_services<'a>(services: &'a [Service], query: &str) -> Vec<(usize, &'a Service)> {
    let needle = query.trim().to_lowercase();
    services
        .iter()
        .enumerate()
        .filter(|(_, svc)| {
            needle.is_empty()
                || svc.name.to_lowercase().contains(&needle)
                || svc.description.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Service> {
        let mut git = Service::new("Gitea", "http://git");
        git.description = "Source hosting".to_string();
        let mut media = Service::new("Jellyfin", "http://media");
        media.description = "Movies and music".to_string();
        vec![git, media, Service::new("Pi-hole", "http://dns")]
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let services = grid();
        assert_eq!(filter_services(&services, "   ").len(), 3);
    }

    #[test]
    fn test_matches_name_case_insensitively() {
        let services = grid();
        let hits = filter_services(&services, "GIT");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 0);
    }

    #[test]
    fn test_matches_description() {
        let services = grid();
        let hits = filter_services(&services, " music ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1.name, "Jellyfin");
    }

    #[test]
    fn test_no_match_returns_empty() {
        let services = grid();
        assert!(filter_services(&services, "nextcloud").is_empty());
    }
}
