//! Terminal operations: element access, counting, and numeric statistics
//! over auto-typed values.

use crate::set::{QuerySet, element_value};
use itertools::Itertools;
use xmlq_tree::{ElementRef, Error, Result};

impl QuerySet {
    pub fn first(&self) -> Option<ElementRef> {
        self.elements().first().cloned()
    }

    pub fn last(&self) -> Option<ElementRef> {
        self.elements().last().cloned()
    }

    /// Element at `index`; negative indexes from the end.
    pub fn at(&self, index: isize) -> Option<ElementRef> {
        let len = self.elements().len() as isize;
        let resolved = if index < 0 { len + index } else { index };
        if resolved < 0 {
            return None;
        }
        self.elements().get(resolved as usize).cloned()
    }

    pub fn to_vec(&self) -> Vec<ElementRef> {
        self.elements().to_vec()
    }

    pub fn count(&self) -> usize {
        self.elements().len()
    }

    pub fn exists(&self) -> bool {
        !self.elements().is_empty()
    }

    pub fn all(&self, predicate: impl Fn(&ElementRef) -> bool) -> bool {
        self.elements().iter().all(|el| predicate(el))
    }

    pub fn any(&self, predicate: impl Fn(&ElementRef) -> bool) -> bool {
        self.elements().iter().any(|el| predicate(el))
    }

    /// Non-empty text values, in sequence order.
    pub fn texts(&self) -> Vec<String> {
        self.elements()
            .iter()
            .filter_map(|el| el.text())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Auto-typed numeric values; unparseable text is excluded.
    pub fn values(&self) -> Vec<f64> {
        self.elements().iter().filter_map(element_value).collect()
    }

    /// Values of `name`, skipping elements without the attribute.
    pub fn attr_values(&self, name: &str) -> Vec<String> {
        self.elements()
            .iter()
            .filter_map(|el| el.attribute(name))
            .collect()
    }

    /// Distinct values of `name`, first occurrence order.
    pub fn distinct_attr_values(&self, name: &str) -> Vec<String> {
        self.attr_values(name).into_iter().unique().collect()
    }

    pub fn sum(&self) -> f64 {
        self.values().iter().sum()
    }

    /// 0 when the set has no values.
    pub fn average(&self) -> f64 {
        let values = self.values();
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    pub fn min_value(&self) -> Option<f64> {
        self.values()
            .into_iter()
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
            .map(|(min, _)| min)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.values()
            .into_iter()
            .minmax_by(|a, b| a.total_cmp(b))
            .into_option()
            .map(|(_, max)| max)
    }

    /// Average of the middle two on an even count.
    pub fn median(&self) -> Option<f64> {
        let mut values = self.values();
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.total_cmp(b));
        let mid = values.len() / 2;
        if values.len() % 2 == 1 {
            Some(values[mid])
        } else {
            Some((values[mid - 1] + values[mid]) / 2.0)
        }
    }

    /// The most frequent value; ties resolve to the first encountered.
    pub fn mode(&self) -> Option<f64> {
        let values = self.values();
        let mut counts: Vec<(f64, usize)> = Vec::new();
        for value in &values {
            match counts.iter_mut().find(|(v, _)| v == value) {
                Some((_, count)) => *count += 1,
                None => counts.push((*value, 1)),
            }
        }
        // Strictly-greater keeps the earliest entry on tied counts.
        let mut best: Option<(f64, usize)> = None;
        for (value, count) in counts {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((value, count));
            }
        }
        best.map(|(value, _)| value)
    }

    /// Population variance.
    pub fn variance(&self) -> Option<f64> {
        let values = self.values();
        if values.is_empty() {
            return None;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let sum_sq = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
        Some(sum_sq / values.len() as f64)
    }

    pub fn standard_deviation(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// The p-th percentile with linear interpolation between ranks.
    /// Fails when `p` is outside `[0, 100]`.
    pub fn percentile(&self, p: f64) -> Result<Option<f64>> {
        if !(0.0..=100.0).contains(&p) {
            return Err(Error::range(format!(
                "percentile {p} is outside the range [0, 100]"
            )));
        }
        let mut values = self.values();
        if values.is_empty() {
            return Ok(None);
        }
        values.sort_by(|a, b| a.total_cmp(b));
        let rank = p / 100.0 * (values.len() - 1) as f64;
        let lower = rank.floor() as usize;
        let fraction = rank - lower as f64;
        let result = if lower + 1 < values.len() {
            values[lower] + fraction * (values[lower + 1] - values[lower])
        } else {
            values[lower]
        };
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use crate::set::parse;

    fn numbers() -> crate::QuerySet {
        parse("<r><v>1</v><v>2</v><v>2</v><v>5</v><v>x</v></r>")
            .unwrap()
            .find("v")
    }

    #[test]
    fn test_access() {
        let vs = numbers();
        assert_eq!(vs.count(), 5);
        assert!(vs.exists());
        assert_eq!(vs.first().unwrap().text(), Some("1".to_string()));
        assert_eq!(vs.last().unwrap().text(), Some("x".to_string()));
        assert_eq!(vs.at(1).unwrap().text(), Some("2".to_string()));
        assert_eq!(vs.at(-2).unwrap().text(), Some("5".to_string()));
        assert_eq!(vs.at(-9), None);
        assert_eq!(vs.at(9), None);
        assert_eq!(vs.to_vec().len(), 5);
    }

    #[test]
    fn test_all_any() {
        let vs = numbers();
        assert!(vs.all(|el| el.name() == "v"));
        assert!(!vs.all(|el| el.numeric_value().is_some()));
        assert!(vs.any(|el| el.text() == Some("5".to_string())));
    }

    #[test]
    fn test_texts_and_values() {
        let vs = numbers();
        assert_eq!(vs.texts(), vec!["1", "2", "2", "5", "x"]);
        assert_eq!(vs.values(), vec![1.0, 2.0, 2.0, 5.0]);
    }

    #[test]
    fn test_attr_values() {
        let query = parse(r#"<r><i c="a"/><i c="b"/><i/><i c="a"/></r>"#).unwrap();
        let items = query.children();
        assert_eq!(items.attr_values("c"), vec!["a", "b", "a"]);
        assert_eq!(items.distinct_attr_values("c"), vec!["a", "b"]);
    }

    #[test]
    fn test_statistics() {
        let vs = numbers();
        assert_eq!(vs.sum(), 10.0);
        assert_eq!(vs.average(), 2.5);
        assert_eq!(vs.min_value(), Some(1.0));
        assert_eq!(vs.max_value(), Some(5.0));
        assert_eq!(vs.median(), Some(2.0));
        assert_eq!(vs.mode(), Some(2.0));
        assert_eq!(vs.variance(), Some(2.25));
        assert_eq!(vs.standard_deviation(), Some(1.5));
    }

    #[test]
    fn test_empty_set_statistics() {
        let empty = numbers().find("missing");
        assert_eq!(empty.sum(), 0.0);
        assert_eq!(empty.average(), 0.0);
        assert_eq!(empty.min_value(), None);
        assert_eq!(empty.max_value(), None);
        assert_eq!(empty.median(), None);
        assert_eq!(empty.mode(), None);
        assert_eq!(empty.variance(), None);
        assert_eq!(empty.percentile(50.0).unwrap(), None);
    }

    #[test]
    fn test_percentile() {
        let vs = numbers();
        assert_eq!(vs.percentile(0.0).unwrap(), vs.min_value());
        assert_eq!(vs.percentile(100.0).unwrap(), vs.max_value());
        assert_eq!(vs.percentile(50.0).unwrap(), Some(2.0));
        // Linear interpolation between ranks: values [1,2,2,5].
        assert_eq!(vs.percentile(75.0).unwrap(), Some(2.75));
        assert!(vs.percentile(-1.0).is_err());
        assert!(vs.percentile(100.5).is_err());
    }

    #[test]
    fn test_median_even_count() {
        let query = parse("<r><v>1</v><v>3</v><v>5</v><v>7</v></r>").unwrap();
        assert_eq!(query.find("v").median(), Some(4.0));
    }

    #[test]
    fn test_mode_tie_resolves_to_first_encountered() {
        let query = parse("<r><v>1</v><v>2</v><v>1</v><v>2</v></r>").unwrap();
        assert_eq!(query.find("v").mode(), Some(1.0));

        let query = parse("<r><v>9</v><v>3</v><v>3</v><v>9</v><v>5</v></r>").unwrap();
        assert_eq!(query.find("v").mode(), Some(9.0));
    }
}
