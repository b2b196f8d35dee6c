//! Key-value records of scalar and text values.
use crate::error::CoreError;
use std::collections::HashMap;

/// Possible types of values stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, typically a loss or a reward.
    Scalar(f32),

    /// A text value.
    String(String),
}

/// A container of key-value pairs.
///
/// Trainers return one record per update step.
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Merges two records, consuming both.
    ///
    /// Values of `record` overwrite values of `self` with the same key.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets a scalar value from the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist or the value is not a scalar.
    pub fn get_scalar(&self, k: &str) -> Result<f32, CoreError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(CoreError::RecordValueTypeError("Scalar".to_string())),
            None => Err(CoreError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns `true` if the record contains no key-value pairs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of key-value pairs in the record.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_scalar_errors() {
        let record = Record::from_slice(&[
            ("loss", RecordValue::Scalar(1.5)),
            ("phase", RecordValue::String("train".into())),
        ]);

        assert_eq!(record.get_scalar("loss").unwrap(), 1.5);
        assert!(matches!(
            record.get_scalar("phase"),
            Err(CoreError::RecordValueTypeError(_))
        ));
        assert!(matches!(
            record.get_scalar("missing"),
            Err(CoreError::RecordKeyError(_))
        ));
    }

    #[test]
    fn test_merge_overwrites() {
        let r1 = Record::from_scalar("a", 1.0);
        let r2 = Record::from_slice(&[
            ("a", RecordValue::Scalar(2.0)),
            ("b", RecordValue::Scalar(3.0)),
        ]);
        let r = r1.merge(r2);

        assert!(!r.is_empty());
        assert_eq!(r.len(), 2);
        assert_eq!(r.get_scalar("a").unwrap(), 2.0);
    }
}
