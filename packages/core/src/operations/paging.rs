//! Child listing projection
//!
//! Storage offers no pagination, so listings are projected in memory:
//! filter by name, stable sort by the requested field, then cut the window.

use crate::models::{ChildQuery, Node, OrderDirection, OrderField, PagedResult};
use std::cmp::Ordering;

pub struct PagingProjector;

impl PagingProjector {
    /// Filter, order and window `children`
    ///
    /// `total_count` of the result is the size of `children` before
    /// filtering; `matched_count` is the size after it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mediatree_core::models::{ChildQuery, Node, NodePath};
    /// use mediatree_core::operations::PagingProjector;
    ///
    /// let root = NodePath::root();
    /// let children = vec![
    ///     Node::new(1, "img_b.png".to_string(), 1032, &root),
    ///     Node::new(2, "notes.txt".to_string(), 1033, &root),
    ///     Node::new(3, "IMG_a.png".to_string(), 1032, &root),
    /// ];
    ///
    /// let page = PagingProjector::project(children, &ChildQuery::new().with_filter("img"));
    /// assert_eq!(page.items.len(), 2);
    /// assert_eq!(page.total_count, 3);
    /// ```
    pub fn project(children: Vec<Node>, query: &ChildQuery) -> PagedResult<Node> {
        if children.is_empty() {
            return PagedResult::empty();
        }

        let total_count = children.len();
        let needle = query.filter.to_lowercase();

        let mut matched: Vec<Node> = if needle.is_empty() {
            children
        } else {
            children
                .into_iter()
                .filter(|n| n.name.to_lowercase().contains(&needle))
                .collect()
        };
        let matched_count = matched.len();

        // slice::sort_by is stable, so ties keep their incoming order
        matched.sort_by(|a, b| {
            let ordering = compare_by(query.order_by, a, b);
            match query.direction {
                OrderDirection::Ascending => ordering,
                OrderDirection::Descending => ordering.reverse(),
            }
        });

        let items = if query.is_paged() {
            matched
                .into_iter()
                .skip(query.skip_size())
                .take(query.page_size)
                .collect()
        } else {
            matched
        };

        tracing::debug!(
            "Projected {} of {} children ({} matched filter '{}')",
            items.len(),
            total_count,
            matched_count,
            query.filter
        );

        PagedResult::new(items, total_count, matched_count, query)
    }
}

fn compare_by(field: OrderField, a: &Node, b: &Node) -> Ordering {
    match field {
        OrderField::Id => a.id.cmp(&b.id),
        OrderField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        OrderField::SortOrder => a.sort_order.cmp(&b.sort_order),
        OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
        OrderField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        OrderField::ContentTypeId => a.content_type_id.cmp(&b.content_type_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodePath;

    fn children(names: &[&str]) -> Vec<Node> {
        let parent: NodePath = "-1,10".parse().unwrap();
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut node = Node::new(100 + i as i64, name.to_string(), 1032, &parent);
                node.sort_order = i as i32;
                node
            })
            .collect()
    }

    fn names(page: &PagedResult<Node>) -> Vec<&str> {
        page.items.iter().map(|n| n.name.as_str()).collect()
    }

    fn seven() -> Vec<Node> {
        children(&[
            "zebra.png",
            "notes.txt",
            "IMG_2041.jpg",
            "budget.xlsx",
            "holiday_img.jpg",
            "readme.md",
            "cover.png",
        ])
    }

    #[test]
    fn test_filtered_first_page_reports_raw_total() {
        let query = ChildQuery::new()
            .with_filter("img")
            .with_order(OrderField::Name, OrderDirection::Ascending)
            .with_page(1, 1);

        let page = PagingProjector::project(seven(), &query);
        assert_eq!(names(&page), vec!["holiday_img.jpg"]);
        assert_eq!(page.total_count, 7);
        assert_eq!(page.matched_count, 2);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_second_page_and_past_the_end() {
        let query = ChildQuery::new()
            .with_filter("IMG")
            .with_order(OrderField::Name, OrderDirection::Ascending)
            .with_page(2, 1);
        assert_eq!(names(&PagingProjector::project(seven(), &query)), vec!["IMG_2041.jpg"]);

        let beyond = query.with_page(5, 1);
        assert!(PagingProjector::project(seven(), &beyond).items.is_empty());
    }

    #[test]
    fn test_unpaged_returns_everything_in_order() {
        let page = PagingProjector::project(seven(), &ChildQuery::new());
        assert_eq!(page.items.len(), 7);
        assert_eq!(page.items[0].name, "zebra.png");

        // Only one of the two page values set: no windowing
        let half = ChildQuery::new().with_page(2, 0);
        assert_eq!(PagingProjector::project(seven(), &half).items.len(), 7);
    }

    #[test]
    fn test_descending_sort_is_stable() {
        let mut nodes = children(&["b", "a", "c", "d"]);
        nodes[0].content_type_id = 1031;
        nodes[2].content_type_id = 1031;

        let query = ChildQuery::new().with_order(OrderField::ContentTypeId, OrderDirection::Descending);
        let page = PagingProjector::project(nodes, &query);
        assert_eq!(names(&page), vec!["a", "d", "b", "c"]);
    }

    #[test]
    fn test_whitespace_filter_is_a_real_filter() {
        let nodes = children(&["summer holiday.jpg", "beach.jpg", "old scan.tif"]);

        let page = PagingProjector::project(nodes, &ChildQuery::new().with_filter(" "));
        assert_eq!(names(&page), vec!["summer holiday.jpg", "old scan.tif"]);
        assert_eq!(page.total_count, 3);
        assert_eq!(page.matched_count, 2);
    }

    #[test]
    fn test_empty_listing() {
        let page = PagingProjector::project(Vec::new(), &ChildQuery::new().with_page(1, 10));
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 0);
        assert_eq!(page.total_pages, 0);
    }
}
