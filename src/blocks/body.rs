// Copyright 2024. The Glimmer Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use serde::{Deserialize, Serialize};

use crate::{
    consensus::ConsensusRules,
    crypto::CryptoFactories,
    transactions::{AmountBig, HeightRange, TxBase, TxReader, TxVectors},
    validation::Context,
};

/// The part of a block body shared with merged (macro) bodies: the offset, the declared subsidy
/// and whether the emission has been closed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyBase {
    pub base: TxBase,
    pub subsidy: AmountBig,
    pub subsidy_closing: bool,
}

impl BodyBase {
    /// Accumulates `next` into this body: subsidies add, offsets add, and at most one of the two
    /// may close the emission. Merging two closing bodies is a caller bug.
    pub fn merge(&mut self, next: &BodyBase) {
        self.subsidy += &next.subsidy;

        if next.subsidy_closing {
            debug_assert!(!self.subsidy_closing);
            self.subsidy_closing = true;
        }

        self.base.offset = self.base.offset.clone() + next.base.offset.clone();
    }

    /// Validates a component stream against this base over the given height range.
    pub fn is_valid(
        &self,
        hr: &HeightRange,
        subsidy_open: bool,
        reader: &mut dyn TxReader,
        rules: &ConsensusRules,
        factories: &CryptoFactories,
    ) -> bool {
        debug_assert!(hr.min >= rules.height_genesis && !hr.is_empty());

        let mut ctx = Context::for_block(rules, factories, *hr);
        ctx.validate_and_summarize(&self.base, reader) && ctx.is_valid_block(self, subsidy_open)
    }
}

/// A complete block body: the base plus its component vectors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub base: BodyBase,
    pub vectors: TxVectors,
}

impl Body {
    pub fn is_valid(&self, hr: &HeightRange, subsidy_open: bool, rules: &ConsensusRules, factories: &CryptoFactories) -> bool {
        self.base
            .is_valid(hr, subsidy_open, &mut self.vectors.reader(), rules, factories)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transactions::MicroGlim;

    #[test]
    fn merge_accumulates_subsidies() {
        let mut a = BodyBase::default();
        a.subsidy += MicroGlim::from(100);
        let mut b = BodyBase::default();
        b.subsidy += MicroGlim::from(50);
        b.subsidy_closing = true;

        a.merge(&b);
        assert_eq!(a.subsidy, AmountBig { lo: 150, hi: 0 });
        assert!(a.subsidy_closing);
    }
}
