use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

use super::value::{FacetValue, RawValue};
use crate::config::{ValueOrder, ValueType};

/// Sorted distinct values of one field; position is the value index.
///
/// The element type is fixed when the dictionary is built.
#[derive(Clone, Debug)]
pub struct ValueDictionary<T: FacetValue> {
    values: Vec<T>,
    order: ValueOrder,
}

impl<T: FacetValue> ValueDictionary<T> {
    /// Sort and deduplicate `values` under `order`
    pub fn new(mut values: Vec<T>, order: ValueOrder) -> Self {
        values.sort_by(|a, b| compare(a, b, order));
        values.dedup();
        Self { values, order }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    /// Index of a value, by binary search
    pub fn index_of_value(&self, value: &T) -> Option<usize> {
        self.values
            .binary_search_by(|probe| compare(probe, value, self.order))
            .ok()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn order(&self) -> ValueOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn compare<T: Ord>(a: &T, b: &T, order: ValueOrder) -> Ordering {
    match order {
        ValueOrder::Natural => a.cmp(b),
        ValueOrder::Reverse => b.cmp(a),
    }
}

/// Type-erased view of a value dictionary, used at the query boundary
pub trait ValueList: Send + Sync + fmt::Debug {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value_type(&self) -> ValueType;

    /// Order the values are sorted in
    fn order(&self) -> ValueOrder;

    /// Canonical text of the value at `index`
    fn format(&self, index: usize) -> Option<String>;

    fn raw(&self, index: usize) -> Option<RawValue>;

    /// Parse `text` as the element type and look it up
    fn index_of(&self, text: &str) -> Option<usize>;

    fn as_any(&self) -> &dyn Any;
}

impl<T: FacetValue> ValueList for ValueDictionary<T> {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn value_type(&self) -> ValueType {
        T::VALUE_TYPE
    }

    fn order(&self) -> ValueOrder {
        self.order
    }

    fn format(&self, index: usize) -> Option<String> {
        self.values.get(index).map(FacetValue::format)
    }

    fn raw(&self, index: usize) -> Option<RawValue> {
        self.values.get(index).map(FacetValue::to_raw)
    }

    fn index_of(&self, text: &str) -> Option<usize> {
        T::parse(text).and_then(|value| self.index_of_value(&value))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_deduplicated() {
        let dict = ValueDictionary::new(
            vec!["red".to_string(), "blue".to_string(), "red".to_string()],
            ValueOrder::Natural,
        );
        assert_eq!(dict.values(), &["blue".to_string(), "red".to_string()]);
        assert_eq!(dict.index_of("red"), Some(1));
        assert_eq!(dict.index_of("green"), None);
    }

    #[test]
    fn test_reverse_order() {
        let dict = ValueDictionary::new(vec![3i64, 10, 7], ValueOrder::Reverse);
        assert_eq!(dict.values(), &[10, 7, 3]);
        assert_eq!(dict.index_of("3"), Some(2));
        assert_eq!(dict.index_of_value(&10), Some(0));
    }

    #[test]
    fn test_numeric_order_is_not_lexicographic() {
        let dict = ValueDictionary::new(vec![10i64, 9, 100], ValueOrder::Natural);
        assert_eq!(dict.format(0).as_deref(), Some("9"));
        assert_eq!(dict.format(2).as_deref(), Some("100"));
        // unparseable text never matches
        assert_eq!(dict.index_of("ten"), None);
    }

    #[test]
    fn test_type_erased_downcast() {
        let dict = ValueDictionary::new(vec![1i64, 2], ValueOrder::Natural);
        let erased: &dyn ValueList = &dict;

        assert_eq!(erased.value_type(), ValueType::Int);
        assert_eq!(erased.raw(1), Some(RawValue::Int(2)));
        assert!(erased
            .as_any()
            .downcast_ref::<ValueDictionary<i64>>()
            .is_some());
        assert!(erased
            .as_any()
            .downcast_ref::<ValueDictionary<String>>()
            .is_none());
    }
}
