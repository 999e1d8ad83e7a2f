//! data::joint — several datasets describing the same observations.
//!
//! The nested logit reads nest-level features from a `"category"` member
//! and item-level features from an `"item"` member. Both members index the
//! same observations, so they are subset together.
use crate::data::{
    dataset::ChoiceDataset,
    errors::{DataError, DataResult},
    traits::ChoiceData,
};
use std::fmt;

/// Named members of equal length, kept in insertion order.
#[derive(Debug, Clone)]
pub struct JointDataset {
    members: Vec<(String, ChoiceDataset)>,
}

impl JointDataset {
    /// Combine named datasets.
    ///
    /// # Errors
    /// - [`DataError::EmptyJoint`] with no members.
    /// - [`DataError::DuplicateDataset`] when a name repeats.
    /// - [`DataError::JointLengthMismatch`] when lengths differ from the first
    ///   member.
    pub fn new(members: Vec<(String, ChoiceDataset)>) -> DataResult<Self> {
        let expected = members.first().map(|(_, ds)| ds.len()).ok_or(DataError::EmptyJoint)?;
        for (i, (name, ds)) in members.iter().enumerate() {
            if members[..i].iter().any(|(other, _)| other == name) {
                return Err(DataError::DuplicateDataset { name: name.clone() });
            }
            if ds.len() != expected {
                return Err(DataError::JointLengthMismatch {
                    name: name.clone(),
                    expected,
                    found: ds.len(),
                });
            }
        }
        Ok(Self { members })
    }

    /// Member by name.
    pub fn get(&self, name: &str) -> DataResult<&ChoiceDataset> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ds)| ds)
            .ok_or_else(|| DataError::MissingDataset { name: name.to_string() })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(n, _)| n.as_str())
    }

    /// Number of observations shared by every member.
    pub fn len(&self) -> usize {
        self.members.first().map_or(0, |(_, ds)| ds.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subset every member with the same indices.
    pub fn subset(&self, indices: &[usize]) -> DataResult<Self> {
        let members = self
            .members
            .iter()
            .map(|(name, ds)| Ok((name.clone(), ds.subset(indices)?)))
            .collect::<DataResult<Vec<_>>>()?;
        Ok(Self { members })
    }
}

impl fmt::Display for JointDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "JointDataset with {} sub-datasets: (", self.members.len())?;
        for (name, ds) in &self.members {
            writeln!(f, "\t{name}: {ds}")?;
        }
        write!(f, ")")
    }
}

impl ChoiceData for ChoiceDataset {
    fn num_obs(&self) -> usize {
        self.len()
    }

    fn select(&self, indices: &[usize]) -> DataResult<Self> {
        self.subset(indices)
    }
}

impl ChoiceData for JointDataset {
    fn num_obs(&self) -> usize {
        self.len()
    }

    fn select(&self, indices: &[usize]) -> DataResult<Self> {
        self.subset(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction checks (empty, duplicate names, length mismatch).
    // - Member lookup and joint subsetting.
    //
    // They intentionally DO NOT cover:
    // - Validation of the members themselves (see `dataset`).
    // -------------------------------------------------------------------------

    fn member(labels: ndarray::Array1<usize>) -> ChoiceDataset {
        ChoiceDataset::builder(labels).build().expect("member should build")
    }

    #[test]
    // Purpose
    // -------
    // Check the construction failures.
    //
    // Given
    // -----
    // - No members, duplicate names, and members of different length.
    //
    // Expect
    // ------
    // - `EmptyJoint`, `DuplicateDataset`, `JointLengthMismatch`.
    fn new_rejects_invalid_member_sets() {
        // Act / Assert
        assert_eq!(JointDataset::new(vec![]).unwrap_err(), DataError::EmptyJoint);

        let dup = JointDataset::new(vec![
            ("item".to_string(), member(array![0, 1])),
            ("item".to_string(), member(array![1, 0])),
        ]);
        assert!(matches!(dup, Err(DataError::DuplicateDataset { .. })));

        let ragged = JointDataset::new(vec![
            ("category".to_string(), member(array![0, 1])),
            ("item".to_string(), member(array![1, 0, 1])),
        ]);
        assert!(matches!(
            ragged,
            Err(DataError::JointLengthMismatch { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify that subsetting applies the same indices to every member.
    //
    // Given
    // -----
    // - Two members with different labels over three observations.
    //
    // Expect
    // ------
    // - Both members keep observations 2 and 0, in that order.
    fn subset_applies_to_all_members() {
        // Arrange
        let joint = JointDataset::new(vec![
            ("category".to_string(), member(array![0, 1, 1])),
            ("item".to_string(), member(array![0, 2, 3])),
        ])
        .expect("joint should build");

        // Act
        let sub = joint.subset(&[2, 0]).expect("subset should succeed");

        // Assert
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.get("category").expect("category").labels(), &array![1, 0]);
        assert_eq!(sub.get("item").expect("item").labels(), &array![3, 0]);
        assert!(matches!(sub.get("user"), Err(DataError::MissingDataset { .. })));
        assert_eq!(sub.names().collect::<Vec<_>>(), vec!["category", "item"]);
    }
}
