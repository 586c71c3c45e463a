//! Derives the [`InstanceSet`] from either an explicit list or a base/count pair.

use std::collections::BTreeSet;

use thiserror::Error;
use vdl_model::{DEFAULT_BASE_INSTANCE, InstanceNum, InstanceSet, ModelError};

use crate::flags::LaunchFlags;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstanceNumsError {
    #[error("instance number {0:?} is not a number")]
    NotANumber(String),
    #[error("instance number must be positive, got {0}")]
    NonPositive(i64),
    #[error("instance number {0} is listed more than once")]
    Duplicate(InstanceNum),
    #[error("--num_instances must be positive, got {0}")]
    NonPositiveCount(i64),
    #[error("--base_instance_num must be positive, got {0}")]
    NonPositiveBase(i64),
    #[error("instance range starting at {base} with {count} instances overflows")]
    Overflow { base: i64, count: i64 },
    #[error(
        "--instance_nums={list} conflicts with --base_instance_num/--num_instances \
         (which select {range:?})"
    )]
    Conflict {
        list: String,
        range: Vec<InstanceNum>,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Builder over the two instance-number flag forms.
#[derive(Debug, Clone)]
pub struct InstanceNumsCalculator {
    base: Option<i64>,
    count: Option<i64>,
    list: Option<String>,
    default_base: InstanceNum,
}

impl Default for InstanceNumsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceNumsCalculator {
    pub fn new() -> Self {
        Self {
            base: None,
            count: None,
            list: None,
            default_base: DEFAULT_BASE_INSTANCE,
        }
    }

    pub fn from_flags(flags: &LaunchFlags) -> Self {
        let mut calc = Self::new();
        calc.base = flags.base_instance_num;
        calc.count = flags.num_instances;
        calc.list = flags.instance_nums.clone();
        calc
    }

    pub fn base_instance_num(mut self, base: i64) -> Self {
        self.base = Some(base);
        self
    }

    pub fn num_instances(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn instance_nums(mut self, list: impl Into<String>) -> Self {
        self.list = Some(list.into());
        self
    }

    /// Resolve the instance set.
    ///
    /// Without a list, `--base_instance_num` defaults to [`DEFAULT_BASE_INSTANCE`] and
    /// `--num_instances` to 1. With a list, any range flag that is also given must
    /// select exactly the listed instances: a missing base takes the same default as
    /// above, a missing count takes the list's length.
    pub fn calculate(&self) -> Result<InstanceSet, InstanceNumsError> {
        let list = self.list.as_deref().filter(|l| !l.trim().is_empty());

        let Some(list) = list else {
            let base = self.base.unwrap_or(i64::from(self.default_base));
            let count = self.count.unwrap_or(1);
            return to_set(range(base, count)?);
        };

        let explicit = parse_list(list)?;
        if self.base.is_some() || self.count.is_some() {
            let base = self.base.unwrap_or(i64::from(self.default_base));
            let count = self.count.unwrap_or(explicit.len() as i64);
            let implied = range(base, count)?;
            if implied != explicit {
                return Err(InstanceNumsError::Conflict {
                    list: list.to_string(),
                    range: implied.into_iter().collect(),
                });
            }
        }
        to_set(explicit)
    }
}

fn parse_list(list: &str) -> Result<BTreeSet<InstanceNum>, InstanceNumsError> {
    let mut out = BTreeSet::new();
    for token in list.split(',') {
        let token = token.trim();
        let num: i64 = token
            .parse()
            .map_err(|_| InstanceNumsError::NotANumber(token.to_string()))?;
        let num = positive(num).ok_or(InstanceNumsError::NonPositive(num))?;
        if !out.insert(num) {
            return Err(InstanceNumsError::Duplicate(num));
        }
    }
    Ok(out)
}

fn range(base: i64, count: i64) -> Result<BTreeSet<InstanceNum>, InstanceNumsError> {
    let first = positive(base).ok_or(InstanceNumsError::NonPositiveBase(base))?;
    if count <= 0 {
        return Err(InstanceNumsError::NonPositiveCount(count));
    }
    let last = base
        .checked_add(count - 1)
        .and_then(positive)
        .ok_or(InstanceNumsError::Overflow { base, count })?;
    Ok((first..=last).collect())
}

fn positive(num: i64) -> Option<InstanceNum> {
    InstanceNum::try_from(num).ok().filter(|n| *n > 0)
}

fn to_set(nums: BTreeSet<InstanceNum>) -> Result<InstanceSet, InstanceNumsError> {
    Ok(InstanceSet::new(nums)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(set: &InstanceSet) -> Vec<InstanceNum> {
        set.iter().collect()
    }

    #[test]
    fn defaults_to_a_single_instance() {
        let set = InstanceNumsCalculator::new().calculate().unwrap();
        assert_eq!(nums(&set), vec![DEFAULT_BASE_INSTANCE]);
    }

    #[test]
    fn base_and_count_select_a_contiguous_range() {
        for (base, count) in [(1, 1), (1, 4), (5, 2), (10, 3)] {
            let set = InstanceNumsCalculator::new()
                .base_instance_num(base)
                .num_instances(count)
                .calculate()
                .unwrap();
            let expected: Vec<InstanceNum> = (base..base + count).map(|n| n as u32).collect();
            assert_eq!(nums(&set), expected);
        }
    }

    #[test]
    fn count_alone_starts_at_default_base() {
        let set = InstanceNumsCalculator::new().num_instances(3).calculate().unwrap();
        assert_eq!(nums(&set), vec![1, 2, 3]);
    }

    #[test]
    fn explicit_list_is_sorted() {
        let set = InstanceNumsCalculator::new()
            .instance_nums("7, 3,5")
            .calculate()
            .unwrap();
        assert_eq!(nums(&set), vec![3, 5, 7]);
    }

    #[test]
    fn bad_lists_are_rejected() {
        let calc = |list: &str| InstanceNumsCalculator::new().instance_nums(list).calculate();

        assert_eq!(calc("1,2,1"), Err(InstanceNumsError::Duplicate(1)));
        assert_eq!(calc("0"), Err(InstanceNumsError::NonPositive(0)));
        assert_eq!(calc("3,-2"), Err(InstanceNumsError::NonPositive(-2)));
        assert_eq!(
            calc("1,x"),
            Err(InstanceNumsError::NotANumber("x".to_string()))
        );
        assert_eq!(
            calc("1,,2"),
            Err(InstanceNumsError::NotANumber(String::new()))
        );
    }

    #[test]
    fn empty_list_falls_back_to_range() {
        let set = InstanceNumsCalculator::new()
            .instance_nums("")
            .base_instance_num(4)
            .calculate()
            .unwrap();
        assert_eq!(nums(&set), vec![4]);
    }

    #[test]
    fn bad_ranges_are_rejected() {
        assert_eq!(
            InstanceNumsCalculator::new().num_instances(0).calculate(),
            Err(InstanceNumsError::NonPositiveCount(0))
        );
        assert_eq!(
            InstanceNumsCalculator::new().base_instance_num(-1).calculate(),
            Err(InstanceNumsError::NonPositiveBase(-1))
        );
        assert!(matches!(
            InstanceNumsCalculator::new()
                .base_instance_num(i64::from(u32::MAX))
                .num_instances(2)
                .calculate(),
            Err(InstanceNumsError::Overflow { .. })
        ));
    }

    #[test]
    fn equivalent_forms_are_accepted() {
        let set = InstanceNumsCalculator::new()
            .instance_nums("3,4,5")
            .base_instance_num(3)
            .num_instances(3)
            .calculate()
            .unwrap();
        assert_eq!(nums(&set), vec![3, 4, 5]);

        let set = InstanceNumsCalculator::new()
            .instance_nums("2,1")
            .num_instances(2)
            .calculate()
            .unwrap();
        assert_eq!(nums(&set), vec![1, 2]);

        let set = InstanceNumsCalculator::new()
            .instance_nums("4,5")
            .base_instance_num(4)
            .calculate()
            .unwrap();
        assert_eq!(nums(&set), vec![4, 5]);
    }

    #[test]
    fn count_with_a_list_keeps_the_default_base() {
        let err = InstanceNumsCalculator::new()
            .instance_nums("5,6")
            .num_instances(2)
            .calculate()
            .unwrap_err();
        assert_eq!(
            err,
            InstanceNumsError::Conflict {
                list: "5,6".into(),
                range: vec![1, 2]
            }
        );
    }

    #[test]
    fn conflicting_forms_are_rejected() {
        let err = InstanceNumsCalculator::new()
            .instance_nums("1,3")
            .num_instances(2)
            .calculate()
            .unwrap_err();
        assert_eq!(
            err,
            InstanceNumsError::Conflict {
                list: "1,3".into(),
                range: vec![1, 2]
            }
        );

        assert!(matches!(
            InstanceNumsCalculator::new()
                .instance_nums("1,2")
                .base_instance_num(2)
                .calculate(),
            Err(InstanceNumsError::Conflict { .. })
        ));
    }

    #[test]
    fn from_flags_reads_the_three_flags() {
        let flags = LaunchFlags {
            num_instances: Some(2),
            base_instance_num: Some(6),
            ..Default::default()
        };
        let set = InstanceNumsCalculator::from_flags(&flags).calculate().unwrap();
        assert_eq!(nums(&set), vec![6, 7]);
    }
}
