//! Tree topologies and their canonical indexing.
//!
//! A [`Shape`] records only the arities of internal nodes, not which operators or terminals sit
//! on them. Its textual form writes a leaf as `..` and an internal node as its children joined by
//! `,` inside `[ ]`.
//!
//! Shapes are stored flat, as the arity of every node in pre-order. A vocabulary with only unary
//! operators turns index `i` into a chain of depth `i`, so every traversal here runs on an explicit
//! stack rather than on the call stack.
//!
//! ## Canonical order
//!
//! With admissible arities `a[0] < a[1] < ... < a[k-1]`, index `0` is the leaf. For `i >= 1`:
//!
//! ```text
//! e = (i - 1) / k,  j = (i - 1) % k,  m = a[j]
//! ```
//!
//! and the topology is a node of arity `m` whose children are the topologies obtained by writing
//! `e` in base `m` and dealing its digits out to `m` groups (see [`crate::codec::split_index`]).
//! Since every child index is at most `e < i`, the recursion terminates, and since digit
//! de-interleaving is a bijection between `N` and `N^m`, every finite ordered tree over the
//! arities appears exactly once.

use std::fmt;
use std::str::FromStr;

use log::debug;
use num_bigint::BigUint;

use crate::codec::{
    base_m_to_decimal, decimal_to_base_m, deinterleave, interleave, merge_index, split_index,
};
use crate::enumerator::{CountingMode, Enumerator};
use crate::error::{EnumerationError, Result};

/// A tree topology, stored as the arity of every node in pre-order (`0` for a leaf).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    preorder: Vec<usize>,
}

impl Shape {
    pub fn leaf() -> Self {
        Shape { preorder: vec![0] }
    }

    /// A node with the given children, in order. Without children this is a leaf.
    pub fn node(children: Vec<Shape>) -> Self {
        let mut preorder = vec![children.len()];
        for child in children {
            preorder.extend(child.preorder);
        }
        Shape { preorder }
    }

    /// Builds a shape from node arities in pre-order.
    ///
    /// Fails with [`EnumerationError::Parse`] unless the arities describe exactly one tree.
    pub fn from_preorder(preorder: Vec<usize>) -> Result<Self> {
        let error = |position: usize, reason: &str| EnumerationError::Parse {
            input: format!("{:?}", preorder),
            position,
            reason: reason.to_string(),
        };

        // Number of subtrees still expected.
        let mut open: usize = 1;
        for (position, &arity) in preorder.iter().enumerate() {
            if open == 0 {
                return Err(error(position, "trailing nodes"));
            }
            open = open - 1 + arity;
        }
        if open != 0 {
            return Err(error(preorder.len(), "missing children"));
        }
        Ok(Shape { preorder })
    }

    pub(crate) fn from_preorder_unchecked(preorder: Vec<usize>) -> Self {
        Shape { preorder }
    }

    /// Node arities in pre-order.
    pub fn preorder(&self) -> &[usize] {
        &self.preorder
    }

    /// Number of children of the root; `0` for a leaf.
    pub fn arity(&self) -> usize {
        self.preorder[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.preorder.iter().filter(|&&arity| arity == 0).count()
    }

    pub fn internal_count(&self) -> usize {
        self.preorder.iter().filter(|&&arity| arity > 0).count()
    }

    pub fn node_count(&self) -> usize {
        self.preorder.len()
    }

    /// Number of internal nodes with exactly `arity` children.
    pub fn count_of_arity(&self, arity: usize) -> usize {
        self.preorder.iter().filter(|&&a| a > 0 && a == arity).count()
    }

    pub fn depth(&self) -> usize {
        // Reverse pre-order sees every child before its parent.
        let mut depths: Vec<usize> = Vec::new();
        for &arity in self.preorder.iter().rev() {
            let split = depths.len() - arity;
            let deepest = depths.drain(split..).max();
            depths.push(deepest.map_or(0, |d| d + 1));
        }
        depths.pop().unwrap_or(0)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Children still to print for every open node.
        let mut open: Vec<usize> = Vec::new();
        for &arity in &self.preorder {
            if arity > 0 {
                write!(f, "[")?;
                open.push(arity);
                continue;
            }
            write!(f, "..")?;
            while let Some(remaining) = open.last_mut() {
                *remaining -= 1;
                if *remaining > 0 {
                    write!(f, ",")?;
                    break;
                }
                open.pop();
                write!(f, "]")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Shape {
    type Err = EnumerationError;

    fn from_str(input: &str) -> Result<Self> {
        let error = |position: usize, reason: &str| EnumerationError::Parse {
            input: input.to_string(),
            position,
            reason: reason.to_string(),
        };

        let mut preorder = Vec::new();
        // Positions in `preorder` of the nodes whose `]` is still ahead.
        let mut open: Vec<usize> = Vec::new();
        let mut position = 0;
        loop {
            let rest = &input[position..];
            if rest.starts_with("..") {
                position += 2;
                preorder.push(0);
            } else if rest.starts_with('[') {
                position += 1;
                open.push(preorder.len());
                preorder.push(0);
                continue;
            } else {
                return Err(error(position, "expected '..' or '['"));
            }

            // A subtree is complete: count it in its parent and close every finished parent.
            loop {
                let Some(&node) = open.last() else {
                    if position != input.len() {
                        return Err(error(position, "trailing input"));
                    }
                    return Ok(Shape { preorder });
                };
                preorder[node] += 1;
                let rest = &input[position..];
                if rest.starts_with(',') {
                    position += 1;
                    break;
                } else if rest.starts_with(']') {
                    position += 1;
                    open.pop();
                } else {
                    return Err(error(position, "expected ',' or ']'"));
                }
            }
        }
    }
}

/// Child indices of topology `i` and the bucket of its root, or `None` for the leaf.
///
/// `arities` must be non-empty when `i > 0`.
pub fn shape_children(i: u64, arities: &[usize]) -> Option<(usize, Vec<u64>)> {
    if i == 0 {
        return None;
    }
    let k = arities.len() as u64;
    let e = (i - 1) / k;
    let bucket = ((i - 1) % k) as usize;
    Some((bucket, split_index(e, arities[bucket] as u64)))
}

/// Same as [`shape_children`], but going through the literal codec: `e` is written out in base
/// `m` (in unary for `m == 1`), de-interleaved, and each group read back.
pub fn shape_children_reference(i: u64, arities: &[usize]) -> Result<Option<(usize, Vec<u64>)>> {
    if i == 0 {
        return Ok(None);
    }
    let k = arities.len() as u64;
    let e = (i - 1) / k;
    let bucket = ((i - 1) % k) as usize;
    let m = arities[bucket];
    let base = radix(m)?;

    let digits = decimal_to_base_m(&BigUint::from(e), base)?;
    let children = deinterleave(&digits, m)
        .iter()
        .map(|group| to_index(base_m_to_decimal(group, base)?))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some((bucket, children)))
}

/// Inverse of [`shape_children_reference`] for a node of arity `m`: every child index is written
/// out in base `m`, the digit groups are interleaved, and the result is read back.
pub fn merge_children_reference(children: &[u64], m: usize) -> Result<u64> {
    let base = radix(m)?;
    let groups = children
        .iter()
        .map(|&child| decimal_to_base_m(&BigUint::from(child), base))
        .collect::<Result<Vec<_>>>()?;
    to_index(base_m_to_decimal(&interleave(&groups), base)?)
}

fn radix(m: usize) -> Result<u32> {
    u32::try_from(m).map_err(|_| EnumerationError::Overflow { what: "arity" })
}

fn to_index(value: BigUint) -> Result<u64> {
    u64::try_from(value).map_err(|_| EnumerationError::Overflow { what: "topology index" })
}

impl Enumerator {
    pub(crate) fn check_operators(&self) -> Result<()> {
        if self.num_buckets() == 0 {
            return Err(EnumerationError::unsupported("no operators registered"));
        }
        Ok(())
    }

    /// Child indices of topology `i`, per the configured [`CountingMode`].
    pub(crate) fn children_of(&self, i: u64) -> Result<Option<(usize, Vec<u64>)>> {
        if i > 0 {
            self.check_operators()?;
        }
        match self.mode() {
            CountingMode::Memoized => Ok(shape_children(i, self.arities())),
            CountingMode::Reference => shape_children_reference(i, self.arities()),
        }
    }

    /// The topology with complexity index `i`.
    pub fn ith_shape(&self, i: u64) -> Result<Shape> {
        let mut preorder = Vec::new();
        let mut pending = vec![i];
        while let Some(index) = pending.pop() {
            match self.children_of(index)? {
                None => preorder.push(0),
                Some((bucket, children)) => {
                    preorder.push(self.arities()[bucket]);
                    pending.extend(children.into_iter().rev());
                }
            }
        }
        Ok(Shape { preorder })
    }

    /// Textual form of the topology with complexity index `i`.
    ///
    /// With arities `{1, 2, 3}`, indices `0..4` give `..`, `[..]`, `[..,..]` and `[..,..,..]`.
    pub fn ith_n_ary_tree(&self, i: u64) -> Result<String> {
        debug!("ith_n_ary_tree(i = {})", i);
        Ok(self.ith_shape(i)?.to_string())
    }

    /// Complexity index of a topology; the inverse of [`ith_shape`][Self::ith_shape].
    ///
    /// Fails with [`EnumerationError::Unsupported`] if the shape uses an arity no operator has,
    /// and with [`EnumerationError::Overflow`] if its index exceeds `u64`.
    pub fn shape_index(&self, shape: &Shape) -> Result<u64> {
        let overflow = || EnumerationError::Overflow { what: "topology index" };
        let k = self.num_buckets() as u64;

        // Reverse pre-order sees every child before its parent, last child first.
        let mut indices: Vec<u64> = Vec::new();
        for &arity in shape.preorder().iter().rev() {
            if arity == 0 {
                indices.push(0);
                continue;
            }
            let bucket = self.arities().binary_search(&arity).map_err(|_| {
                EnumerationError::unsupported(format!("no operator of arity {}", arity))
            })?;
            let split = indices.len() - arity;
            let children: Vec<u64> = indices.drain(split..).rev().collect();

            let e = match self.mode() {
                CountingMode::Memoized => merge_index(&children, arity as u64)?,
                CountingMode::Reference => merge_children_reference(&children, arity)?,
            };
            let index = e
                .checked_mul(k)
                .and_then(|x| x.checked_add(bucket as u64 + 1))
                .ok_or_else(overflow)?;
            indices.push(index);
        }
        Ok(indices.pop().unwrap_or(0))
    }
}
