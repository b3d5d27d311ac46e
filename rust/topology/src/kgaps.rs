// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! K gaps: layers separated by an extra node interface.

use resqml_lite_core::{ArrayAccess, BooleanArray, ExternalStore};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Flags marking the layers followed by a gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KGaps {
    gap_after_layer: Vec<bool>,
}

impl KGaps {
    /// `gap_after_layer` has one flag per layer boundary, `nk - 1` in total.
    pub fn try_new(gap_after_layer: Vec<bool>, nk: usize) -> Result<Self> {
        if gap_after_layer.len() + 1 != nk.max(1) {
            return Err(Error::structural(
                "k gaps",
                format!(
                    "{} gap flags for {nk} layers",
                    gap_after_layer.len()
                ),
            ));
        }
        Ok(Self { gap_after_layer })
    }

    pub fn from_array(flags: &BooleanArray, nk: usize, store: &dyn ExternalStore) -> Result<Self> {
        Self::try_new(flags.materialize(store)?, nk)
    }

    pub fn gap_after_layer(&self) -> &[bool] {
        &self.gap_after_layer
    }

    pub fn gap_count(&self) -> usize {
        self.gap_after_layer.iter().filter(|&&g| g).count()
    }

    pub fn has_gap_after(&self, k: usize) -> bool {
        self.gap_after_layer.get(k).copied().unwrap_or(false)
    }
}

/// Top interface of each layer; layer `k` spans interfaces `top[k]` and
/// `top[k] + 1`. Also returns the interface count.
pub(crate) fn layer_interfaces(nk: usize, gaps: Option<&KGaps>) -> (Vec<usize>, usize) {
    let mut top = Vec::with_capacity(nk);
    let mut next = 0;
    for k in 0..nk {
        top.push(next);
        next += 1;
        if gaps.is_some_and(|g| g.has_gap_after(k)) {
            next += 1;
        }
    }
    (top, next + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interfaces_without_gaps() {
        let (top, count) = layer_interfaces(3, None);
        assert_eq!(top, vec![0, 1, 2]);
        assert_eq!(count, 4);
    }

    #[test]
    fn gap_adds_an_interface() {
        let gaps = KGaps::try_new(vec![false, true], 3).unwrap();
        assert_eq!(gaps.gap_count(), 1);
        let (top, count) = layer_interfaces(3, Some(&gaps));
        assert_eq!(top, vec![0, 1, 3]);
        assert_eq!(count, 5);
    }

    #[test]
    fn flag_count_must_match_layers() {
        assert!(KGaps::try_new(vec![true], 3).is_err());
        assert!(KGaps::try_new(Vec::new(), 1).is_ok());
    }
}
