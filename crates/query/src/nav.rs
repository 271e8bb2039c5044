//! Traversals, document-order walks, sorting and slicing.

use crate::set::{QuerySet, dedup_in_order, element_value};
use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use xmlq_tree::{ElementRef, Error, Result};
use xmlq_xpath1::axes;

impl QuerySet {
    // --- Raw walks ---

    /// Ancestor chains of every element, nearest first, deduplicated. The
    /// optional predicate filters which nodes are included.
    pub fn walk_up(&self, predicate: Option<&dyn Fn(&ElementRef) -> bool>) -> Vec<ElementRef> {
        let mut out = Vec::new();
        for element in self.elements() {
            let mut current = element.parent();
            while let Some(ancestor) = current {
                current = ancestor.parent();
                if predicate.is_none_or(|p| p(&ancestor)) {
                    out.push(ancestor);
                }
            }
        }
        dedup_in_order(out)
    }

    /// Descendants of every element in document order, deduplicated. The
    /// optional predicate filters which nodes are included.
    pub fn walk_down(&self, predicate: Option<&dyn Fn(&ElementRef) -> bool>) -> Vec<ElementRef> {
        fn descend(
            element: &ElementRef,
            predicate: Option<&dyn Fn(&ElementRef) -> bool>,
            out: &mut Vec<ElementRef>,
        ) {
            for child in element.children() {
                if predicate.is_none_or(|p| p(&child)) {
                    out.push(child.clone());
                }
                descend(&child, predicate, out);
            }
        }
        let mut out = Vec::new();
        for element in self.elements() {
            descend(element, predicate, &mut out);
        }
        dedup_in_order(out)
    }

    /// Level-by-level traversal starting from (and including) the sequence.
    pub fn breadth_first(&self) -> QuerySet {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut queue: VecDeque<ElementRef> = self.elements().to_vec().into();
        while let Some(element) = queue.pop_front() {
            if !seen.insert(element.clone()) {
                continue;
            }
            queue.extend(element.children());
            out.push(element);
        }
        self.with_elements(out)
    }

    /// Pre-order traversal starting from (and including) the sequence.
    pub fn depth_first(&self) -> QuerySet {
        fn descend(element: &ElementRef, seen: &mut HashSet<ElementRef>, out: &mut Vec<ElementRef>) {
            if !seen.insert(element.clone()) {
                return;
            }
            out.push(element.clone());
            for child in element.children() {
                descend(&child, seen, out);
            }
        }
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for element in self.elements() {
            descend(element, &mut seen, &mut out);
        }
        self.with_elements(out)
    }

    /// Everything after each element in document order, excluding its
    /// descendants.
    pub fn following_nodes(&self) -> QuerySet {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for element in self.elements() {
            axes::collect_following_nodes(element, &mut seen, &mut out);
        }
        self.with_elements(out)
    }

    /// Everything before each element in document order, excluding its
    /// ancestors.
    pub fn preceding_nodes(&self) -> QuerySet {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for element in self.elements() {
            axes::collect_preceding_nodes(element, &mut seen, &mut out);
        }
        self.with_elements(out)
    }

    // --- Sorting (all stable) ---

    fn sorted_by_key<K: Ord>(&self, key: impl Fn(&ElementRef) -> K) -> QuerySet {
        let mut elements = self.elements().to_vec();
        elements.sort_by_key(|el| key(el));
        self.with_elements(elements)
    }

    pub fn sort_by_name(&self) -> QuerySet {
        self.sorted_by_key(|el| el.name())
    }

    /// Missing attributes sort as the empty string.
    pub fn sort_by_attribute(&self, name: &str) -> QuerySet {
        self.sorted_by_key(|el| el.attribute(name).unwrap_or_default())
    }

    pub fn sort_by_text(&self) -> QuerySet {
        self.sorted_by_key(|el| el.text().unwrap_or_default())
    }

    /// Natural numeric order; missing values sort as 0.
    pub fn sort_by_value(&self) -> QuerySet {
        let mut elements = self.elements().to_vec();
        elements.sort_by(|a, b| {
            let left = element_value(a).unwrap_or(0.0);
            let right = element_value(b).unwrap_or(0.0);
            left.partial_cmp(&right).unwrap_or(Ordering::Equal)
        });
        self.with_elements(elements)
    }

    pub fn sort_by_depth(&self) -> QuerySet {
        self.sorted_by_key(|el| el.depth())
    }

    /// Custom stable sort.
    pub fn sort_by(&self, compare: impl Fn(&ElementRef, &ElementRef) -> Ordering) -> QuerySet {
        let mut elements = self.elements().to_vec();
        elements.sort_by(|a, b| compare(a, b));
        self.with_elements(elements)
    }

    // --- Slicing ---

    pub fn take(&self, n: usize) -> QuerySet {
        self.with_elements(self.elements().iter().take(n).cloned().collect())
    }

    pub fn skip(&self, n: usize) -> QuerySet {
        self.with_elements(self.elements().iter().skip(n).cloned().collect())
    }

    /// JS-style slice: clamped, end-exclusive.
    pub fn slice(&self, start: usize, end: usize) -> QuerySet {
        let len = self.elements().len();
        let start = start.min(len);
        let end = end.clamp(start, len);
        self.with_elements(self.elements()[start..end].to_vec())
    }

    pub fn reverse(&self) -> QuerySet {
        let mut elements = self.elements().to_vec();
        elements.reverse();
        self.with_elements(elements)
    }

    /// Keeps the first element for each distinct key.
    pub fn distinct_by(&self, key: impl Fn(&ElementRef) -> String) -> QuerySet {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for element in self.elements() {
            if seen.insert(key(element)) {
                out.push(element.clone());
            }
        }
        self.with_elements(out)
    }

    /// Elements at even positions (0, 2, ...).
    pub fn even(&self) -> QuerySet {
        self.where_(|_, i| i % 2 == 0)
    }

    /// Elements at odd positions (1, 3, ...).
    pub fn odd(&self) -> QuerySet {
        self.where_(|_, i| i % 2 == 1)
    }

    /// Elements that are the n-th child of their parent (0-based).
    pub fn nth_child(&self, n: usize) -> QuerySet {
        self.filtered(|el| el.index_among_all_siblings() == n)
    }

    /// End-exclusive range of the sequence. Unlike `slice`, an inverted
    /// range is an error; the end is still clamped.
    pub fn range(&self, start: usize, end: usize) -> Result<QuerySet> {
        if start > end {
            return Err(Error::range(format!(
                "invalid range: start {start} is greater than end {end}"
            )));
        }
        Ok(self.slice(start, end))
    }
}
