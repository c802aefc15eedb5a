//! Positional argument bit.

use crate::bit::{KeyBit, KeyContext};
use crate::error::{KeyBitError, KeyBitResult};
use crate::fragment::Fragment;
use crate::params::Params;

/// Positional arguments of the invocation; all of them unless configured otherwise.
#[derive(Debug, Clone)]
pub struct ArgsKeyBit {
    params: Option<Params>,
}

impl Default for ArgsKeyBit {
    fn default() -> Self {
        Self {
            params: Some(Params::All),
        }
    }
}

impl ArgsKeyBit {
    /// Select every positional argument.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the arguments at these positions, in this order.
    pub fn at(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            params: Some(Params::indices(indices)),
        }
    }
}

impl KeyBit for ArgsKeyBit {
    fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    fn get_data(
        &self,
        params: Option<&Params>,
        ctx: &KeyContext<'_>,
    ) -> KeyBitResult<Option<Fragment>> {
        let args = match params {
            None => Vec::new(),
            Some(Params::All) => ctx.args.to_vec(),
            Some(Params::Indices(indices)) => indices
                .iter()
                .map(|&index| {
                    ctx.args
                        .get(index)
                        .cloned()
                        .ok_or(KeyBitError::IndexOutOfRange {
                            index,
                            len: ctx.args.len(),
                        })
                })
                .collect::<KeyBitResult<Vec<_>>>()?,
            Some(other) => {
                return Err(KeyBitError::UnsupportedParams {
                    bit: "ArgsKeyBit",
                    params: format!("{:?}", other),
                })
            }
        };
        Ok(Some(Fragment::List(args)))
    }
}
