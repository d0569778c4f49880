//! Decoding `(i, r, s)` into a concrete expression, and ranking an expression back.
//!
//! The operator rank `r` is read as a mixed-radix number over the arity buckets, with radices
//! `G(i, 0), ..., G(i, k-1)` and bucket `0` most significant. Each bucket's share is written in
//! base `f_b` with exactly `l(i, b)` digits; the most significant digit goes to the *last* node of
//! that bucket in pre-order and the least significant to the first. The terminal rank `s` is
//! written in base `N` with exactly `a(i)` digits and dealt to the leaves the same way.

use log::debug;
use num_bigint::BigUint;

use crate::codec::{base_m_to_decimal, to_fixed_width};
use crate::enumerator::{Configuration, Enumerator};
use crate::error::{EnumerationError, Result};
use crate::expr::{ExprNode, Expression};
use crate::shape::Shape;

fn radix(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| EnumerationError::Overflow { what: "radix" })
}

/// Digits in pre-order consumption order: least significant first.
fn slot_digits(rank: &BigUint, base: usize, width: usize) -> Result<std::vec::IntoIter<u32>> {
    let mut digits = to_fixed_width(rank, radix(base)?, width)?;
    digits.reverse();
    Ok(digits.into_iter())
}

/// Inverse of [`slot_digits`].
fn slot_rank(mut choices: Vec<u32>, base: usize) -> Result<BigUint> {
    if choices.is_empty() {
        return Ok(BigUint::ZERO);
    }
    choices.reverse();
    base_m_to_decimal(&choices, radix(base)?)
}

struct Assignment<'a> {
    enumerator: &'a Enumerator,
    operators: Vec<std::vec::IntoIter<u32>>,
    terminals: std::vec::IntoIter<u32>,
}

impl Assignment<'_> {
    fn exhausted() -> EnumerationError {
        EnumerationError::unsupported("topology and structure counts disagree")
    }

    fn build(&mut self, shape: &Shape) -> Result<Expression> {
        let pset = self.enumerator.primitive_set();
        let mut nodes = Vec::with_capacity(shape.node_count());
        for &arity in shape.preorder() {
            let name = if arity == 0 {
                let choice = self.terminals.next().ok_or_else(Self::exhausted)?;
                let terminal = pset.terminal(choice as usize).ok_or_else(Self::exhausted)?;
                terminal.name.clone()
            } else {
                let b = pset.bucket_of_arity(arity).ok_or_else(Self::exhausted)?;
                let choice = self.operators[b].next().ok_or_else(Self::exhausted)?;
                pset.buckets()[b].names[choice as usize].clone()
            };
            nodes.push(ExprNode { name, arity });
        }
        Ok(Expression::from_nodes(nodes))
    }
}

impl Enumerator {
    /// The expression selected by topology `i`, operator rank `r` and terminal rank `s`.
    pub fn generate_specified_expression(
        &self,
        i: u64,
        r: &BigUint,
        s: &BigUint,
    ) -> Result<Expression> {
        debug!("generate_specified_expression(i = {}, r = {}, s = {})", i, r, s);
        self.check_supported()?;

        let r_i = self.calculate_r_i(i)?;
        if *r >= r_i {
            return Err(EnumerationError::out_of_range("operator rank", r, r_i));
        }
        let s_i = self.calculate_s_i(i)?;
        if *s >= s_i {
            return Err(EnumerationError::out_of_range("terminal rank", s, s_i));
        }

        let structure = self.structure(i)?;
        let radices = self.calculate_all_g_i_b(i)?;

        // Bucket 0 is the most significant position of `r`.
        let mut shares = vec![BigUint::ZERO; radices.len()];
        let mut rest = r.clone();
        for (b, g) in radices.iter().enumerate().rev() {
            shares[b] = &rest % g;
            rest /= g;
        }

        let operators = shares
            .iter()
            .enumerate()
            .map(|(b, share)| {
                let width = usize::try_from(structure.internal_per_bucket[b])
                    .map_err(|_| EnumerationError::Overflow { what: "node count" })?;
                slot_digits(share, self.bucket_size(b), width)
            })
            .collect::<Result<Vec<_>>>()?;
        let leaves = usize::try_from(structure.leaves)
            .map_err(|_| EnumerationError::Overflow { what: "leaf count" })?;
        let terminals = slot_digits(s, self.num_terminals(), leaves)?;

        let shape = self.ith_shape(i)?;
        let mut assignment = Assignment {
            enumerator: self,
            operators,
            terminals,
        };
        assignment.build(&shape)
    }

    /// Printed form of [`generate_specified_expression`][Self::generate_specified_expression].
    ///
    /// `n` is the size of the terminal vocabulary, which is the radix of `s`; it must match the
    /// primitive set.
    pub fn generate_specified_solution(
        &self,
        i: u64,
        r: &BigUint,
        s: &BigUint,
        n: usize,
    ) -> Result<String> {
        if n != self.num_terminals() {
            return Err(EnumerationError::out_of_range(
                "terminal vocabulary size",
                n,
                self.num_terminals(),
            ));
        }
        Ok(self.generate_specified_expression(i, r, s)?.to_string())
    }

    /// Printed form of a configuration.
    pub fn generate_solution(&self, configuration: &Configuration) -> Result<String> {
        Ok(self
            .generate_specified_expression(configuration.i, &configuration.r, &configuration.s)?
            .to_string())
    }

    /// The configuration that decodes to `expression`.
    pub fn configuration_of_expression(&self, expression: &Expression) -> Result<Configuration> {
        self.check_supported()?;
        let pset = self.primitive_set();
        let i = self.shape_index(&expression.shape())?;

        let mut operator_choices = vec![Vec::new(); self.num_buckets()];
        for (name, arity) in expression.operators() {
            let unknown = || EnumerationError::UnknownPrimitive {
                name: name.to_string(),
                kind: format!("operator of arity {}", arity),
            };
            let b = pset.bucket_of_arity(arity).ok_or_else(unknown)?;
            let position = pset.buckets()[b]
                .names
                .iter()
                .position(|n| n == name)
                .ok_or_else(unknown)?;
            operator_choices[b].push(position as u32);
        }

        let terminal_choices = expression
            .terminals()
            .into_iter()
            .map(|name| {
                pset.terminal_position(name)
                    .map(|position| position as u32)
                    .ok_or_else(|| EnumerationError::UnknownPrimitive {
                        name: name.to_string(),
                        kind: "terminal".to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let radices = self.calculate_all_g_i_b(i)?;
        let mut r = BigUint::ZERO;
        for (b, choices) in operator_choices.into_iter().enumerate() {
            r = r * &radices[b] + slot_rank(choices, self.bucket_size(b))?;
        }
        let s = slot_rank(terminal_choices, self.num_terminals())?;

        Ok(Configuration { i, r, s })
    }

    /// Parses a printed solution and returns its configuration; the inverse of
    /// [`generate_specified_solution`][Self::generate_specified_solution].
    pub fn configuration_of(&self, solution: &str) -> Result<Configuration> {
        let expression = self.primitive_set().parse_expression(solution)?;
        self.configuration_of_expression(&expression)
    }
}
