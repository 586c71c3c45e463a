use std::collections::BTreeSet;

use crate::ModelError;

/// A device instance number. Always strictly positive inside an [`InstanceSet`].
pub type InstanceNum = u32;

/// Every device instance launched by one invocation.
///
/// Ascending, unique and never empty. Built once from flags and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSet(BTreeSet<InstanceNum>);

impl InstanceSet {
    /// Build a set from instance numbers, rejecting an empty input or a zero.
    pub fn new<I>(nums: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = InstanceNum>,
    {
        let mut set = BTreeSet::new();
        for num in nums {
            if num == 0 {
                return Err(ModelError::NonPositiveInstance(0));
            }
            set.insert(num);
        }
        if set.is_empty() {
            return Err(ModelError::EmptyInstanceSet);
        }
        Ok(Self(set))
    }

    /// Lowest instance number; the one the assembler runs as.
    pub fn first(&self) -> InstanceNum {
        // Non-empty by construction.
        self.0.first().copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ascending iteration.
    pub fn iter(&self) -> impl Iterator<Item = InstanceNum> + '_ {
        self.0.iter().copied()
    }
}
