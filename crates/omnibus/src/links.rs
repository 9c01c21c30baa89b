//! Link-builder collaborator contract.
//!
//! Routing and URL templating live outside the core; the assembler only
//! needs a [`LinkBuilder`] that yields absolute URLs for a resource, a
//! relationship, and a pager.

use url::Url;

use crate::access::RecordRef;
use crate::types::TypeName;

/// Offset/limit context for pager links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PagerContext {
    pub offset: u64,
    pub limit: u64,
    /// Whether the query found at least one record past this page.
    pub has_next: bool,
}

/// Builds the absolute URLs an assembled document links to.
pub trait LinkBuilder {
    /// The individual URL of a resource.
    fn resource(&self, reference: &RecordRef) -> Url;

    /// The `self` URL of a relationship.
    fn relationship(&self, reference: &RecordRef, field: &str) -> Url;

    /// The `related` URL of a relationship.
    fn related(&self, reference: &RecordRef, field: &str) -> Url;

    /// The collection URL for a resource type.
    fn collection(&self, type_name: &TypeName) -> Url;

    /// Pager links for a collection: `next` and `prev` as applicable.
    ///
    /// The default builds them from [`LinkBuilder::collection`] with
    /// `page[offset]`/`page[limit]` query parameters.
    fn pager(&self, type_name: &TypeName, pager: &PagerContext) -> Vec<(String, Url)> {
        let page_url = |offset: u64| {
            let mut url = self.collection(type_name);
            url.query_pairs_mut()
                .append_pair("page[offset]", &offset.to_string())
                .append_pair("page[limit]", &pager.limit.to_string());
            url
        };

        let mut links = Vec::new();
        if pager.has_next {
            links.push(("next".to_string(), page_url(pager.offset + pager.limit)));
        }
        if pager.offset > 0 {
            let prev = pager.offset.saturating_sub(pager.limit);
            links.push(("prev".to_string(), page_url(prev)));
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedBase;

    impl LinkBuilder for FixedBase {
        fn resource(&self, reference: &RecordRef) -> Url {
            Url::parse(&format!("http://localhost/jsonapi/{reference}")).unwrap()
        }

        fn relationship(&self, reference: &RecordRef, field: &str) -> Url {
            Url::parse(&format!(
                "http://localhost/jsonapi/{reference}/relationships/{field}"
            ))
            .unwrap()
        }

        fn related(&self, reference: &RecordRef, field: &str) -> Url {
            Url::parse(&format!("http://localhost/jsonapi/{reference}/{field}")).unwrap()
        }

        fn collection(&self, type_name: &TypeName) -> Url {
            Url::parse(&format!("http://localhost/jsonapi/{type_name}")).unwrap()
        }
    }

    fn type_name() -> TypeName {
        TypeName::new("node--article").unwrap()
    }

    #[test]
    fn first_page_with_more_has_only_next() {
        let links = FixedBase.pager(
            &type_name(),
            &PagerContext {
                offset: 0,
                limit: 10,
                has_next: true,
            },
        );

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].0, "next");
        assert!(links[0].1.as_str().contains("offset%5D=10"));
    }

    #[test]
    fn middle_page_has_next_and_prev() {
        let links = FixedBase.pager(
            &type_name(),
            &PagerContext {
                offset: 10,
                limit: 10,
                has_next: true,
            },
        );

        let rels: Vec<&str> = links.iter().map(|(rel, _)| rel.as_str()).collect();
        assert_eq!(rels, vec!["next", "prev"]);
    }

    #[test]
    fn last_page_has_only_prev() {
        let links = FixedBase.pager(
            &type_name(),
            &PagerContext {
                offset: 20,
                limit: 10,
                has_next: false,
            },
        );

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].0, "prev");
    }
}
