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

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use tari_utilities::hex::Hex;

use crate::{
    common::FixedHash,
    consensus::{DomainSeparatedConsensusHasher, TransactionHashDomain},
    crypto::{Commitment, PrivateKey, Signature},
    transactions::{
        transaction_components::{cmp_commitments, cmp_signatures},
        HeightRange,
        MicroGlim,
    },
};

/// A hash-locked kernel only enters a block alongside knowledge of this preimage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashLock {
    pub preimage: FixedHash,
}

impl HashLock {
    /// The image committed into the kernel hash.
    pub fn image(&self) -> FixedHash {
        lock_image(&self.preimage)
    }
}

/// Hashes a preimage into the lock image a kernel commits to.
pub fn lock_image(preimage: &FixedHash) -> FixedHash {
    DomainSeparatedConsensusHasher::<TransactionHashDomain>::new("lock_image")
        .chain(preimage)
        .finalize()
}

/// The transaction kernel is the signed assertion at the heart of a transaction: the excess
/// commitment is the residue of outputs minus inputs, and its signature over the kernel hash
/// proves the residue carries no hidden value.
///
/// The kernel also carries cleartext metadata bound into that hash: the fee, the height window
/// within which the kernel may be included, an optional hash lock and an ordered list of nested
/// kernels. The multiplier lets a later party re-sign with a scaled key while sharing the same
/// excess point; an input kernel consumes an output kernel with a strictly lower multiplier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxKernel {
    pub excess: Commitment,
    pub multiplier: u32,
    pub signature: Signature,
    pub fee: MicroGlim,
    pub height: HeightRange,
    pub hash_lock: Option<HashLock>,
    pub nested: Vec<TxKernel>,
}

impl TxKernel {
    /// Walks the kernel and its nested children depth-first, computing the kernel hash and, when
    /// accumulators are supplied, enforcing validity: nested multipliers equal the parent's, each
    /// child's height range contains the parent's, the nested list ascends strictly, and every
    /// signature verifies against `excess · (multiplier + 1)`. Verified excesses are added to
    /// `excess_acc` and fees to `fee_acc`.
    ///
    /// A stored hash-lock preimage is hashed on the fly; a verifier that only knows the image can
    /// supply it via `lock_image` instead. Returns the kernel hash, or `None` on any violation.
    pub fn traverse(
        &self,
        mut fee_acc: Option<&mut crate::transactions::AmountBig>,
        mut excess_acc: Option<&mut Commitment>,
        parent: Option<&TxKernel>,
        lock_image_override: Option<&FixedHash>,
    ) -> Option<FixedHash> {
        if let Some(parent) = parent {
            // nested kernel restrictions
            if self.multiplier != parent.multiplier {
                return None;
            }
            if !parent.height.is_contained_by(&self.height) {
                return None;
            }
        }

        let mut hp = DomainSeparatedConsensusHasher::<TransactionHashDomain>::new("kernel");
        hp.update(&self.fee.as_u64());
        hp.update(&self.height.min);
        hp.update(&self.height.max);
        hp.update(&self.hash_lock.is_some());

        if let Some(lock) = &self.hash_lock {
            match lock_image_override {
                Some(image) => hp.update(image),
                None => hp.update(&lock.image()),
            }
        }

        let mut prev: Option<&TxKernel> = None;
        for nested in &self.nested {
            hp.update(&false);

            if let Some(prev) = prev {
                if prev.cmp(nested) != Ordering::Less {
                    return None;
                }
            }
            prev = Some(nested);

            let child_hash = nested.traverse(fee_acc.as_deref_mut(), excess_acc.as_deref_mut(), Some(self), None)?;
            hp.update(&hash_to_id(child_hash, &nested.excess, nested.multiplier));
        }
        hp.update(&true);
        let hv = hp.finalize();

        if let Some(acc) = excess_acc {
            let pt = self.signing_point();
            if !self.signature.verify_challenge(pt.as_public_key(), hv.as_slice()) {
                return None;
            }
            *acc = &*acc + &pt;
        }

        if let Some(fee) = fee_acc {
            *fee += self.fee;
        }

        Some(hv)
    }

    /// The point the signature must verify under: `excess · (multiplier + 1)`.
    fn signing_point(&self) -> Commitment {
        if self.multiplier == 0 {
            return self.excess.clone();
        }
        let scaled = PrivateKey::from(u64::from(self.multiplier) + 1) * self.excess.as_public_key().clone();
        Commitment::from_public_key(&scaled)
    }

    /// The kernel hash the signature covers. `None` if the nested structure is malformed.
    pub fn hash(&self, lock_image_override: Option<&FixedHash>) -> Option<FixedHash> {
        self.traverse(None, None, None, lock_image_override)
    }

    /// Verifies the kernel tree, folding its total fee and excess into the accumulators.
    pub fn is_valid(&self, fee_acc: &mut crate::transactions::AmountBig, excess_acc: &mut Commitment) -> bool {
        self.traverse(Some(fee_acc), Some(excess_acc), None, None).is_some()
    }

    /// The kernel identity: the kernel hash extended with everything excluded from it (the excess
    /// and multiplier), but not the signature, so an unsigned kernel already has its final ID.
    /// The all-zero value is reserved for system use and never returned.
    pub fn id(&self, lock_image_override: Option<&FixedHash>) -> Option<FixedHash> {
        self.hash(lock_image_override)
            .map(|hv| hash_to_id(hv, &self.excess, self.multiplier))
    }
}

fn hash_to_id(kernel_hash: FixedHash, excess: &Commitment, multiplier: u32) -> FixedHash {
    let mut id = DomainSeparatedConsensusHasher::<TransactionHashDomain>::new("kernel_id")
        .chain(&kernel_hash)
        .chain(excess)
        .chain(&multiplier)
        .finalize();

    // Some kernel hash values are reserved for system usage
    if id.is_zero() {
        id.inc();
    }
    id
}

impl PartialOrd for TxKernel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TxKernel {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_commitments(&self.excess, &other.excess)
            .then(self.multiplier.cmp(&other.multiplier))
            .then_with(|| cmp_signatures(&self.signature, &other.signature))
            .then(self.fee.cmp(&other.fee))
            .then(self.height.min.cmp(&other.height.min))
            .then(self.height.max.cmp(&other.height.max))
            .then_with(|| {
                // element-wise; a strict prefix sorts first
                for (a, b) in self.nested.iter().zip(other.nested.iter()) {
                    let ord = a.cmp(b);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                self.nested.len().cmp(&other.nested.len())
            })
    }
}

impl Display for TxKernel {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            fmt,
            "Excess: {}, multiplier: {}, fee: {}, heights: [{}..{}], {} nested",
            self.excess.to_hex(),
            self.multiplier,
            self.fee,
            self.height.min,
            self.height.max,
            self.nested.len()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        crypto::zero_commitment,
        transactions::{
            test_helpers::{create_test_kernel, random_key, sign_kernel},
            AmountBig,
        },
    };

    fn simple_kernel(fee: u64) -> TxKernel {
        create_test_kernel(&random_key(), MicroGlim::from(fee), HeightRange::default(), 0, vec![])
    }

    fn nested_kernel() -> TxKernel {
        let key = random_key();
        let children = vec![
            create_test_kernel(&random_key(), MicroGlim::from(3), HeightRange::new(0, 100), 2, vec![]),
            create_test_kernel(&random_key(), MicroGlim::from(2), HeightRange::new(5, 90), 2, vec![]),
        ];
        create_test_kernel(&key, MicroGlim::from(5), HeightRange::new(10, 80), 2, children)
    }

    #[test]
    fn kernel_ids_are_never_zero() {
        for fee in 0..16u64 {
            let id = simple_kernel(fee).id(None).unwrap();
            assert!(!id.is_zero());
        }
    }

    #[test]
    fn valid_kernels_accumulate_fee_and_excess() {
        let kernel = simple_kernel(42);
        let mut fee = AmountBig::zero();
        let mut excess = zero_commitment();
        assert!(kernel.is_valid(&mut fee, &mut excess));
        assert_eq!(fee.lo, 42);
        assert_eq!(excess, kernel.excess);
    }

    #[test]
    fn tampering_with_the_fee_breaks_the_signature() {
        let mut kernel = simple_kernel(42);
        kernel.fee = MicroGlim::from(43);
        let mut fee = AmountBig::zero();
        let mut excess = zero_commitment();
        assert!(!kernel.is_valid(&mut fee, &mut excess));
    }

    #[test]
    fn scaled_multipliers_verify() {
        let kernel = create_test_kernel(&random_key(), MicroGlim::from(1), HeightRange::default(), 7, vec![]);
        let mut fee = AmountBig::zero();
        let mut excess = zero_commitment();
        assert!(kernel.is_valid(&mut fee, &mut excess));
        // The accumulated point is the scaled one, not the bare excess.
        assert_ne!(excess, kernel.excess);
    }

    #[test]
    fn nested_trees_fold_their_fees() {
        let kernel = nested_kernel();
        let mut fee = AmountBig::zero();
        let mut excess = zero_commitment();
        assert!(kernel.is_valid(&mut fee, &mut excess));
        assert_eq!(fee.lo, 10);
    }

    #[test]
    fn nested_multiplier_must_match_the_parent() {
        let mut kernel = nested_kernel();
        kernel.nested[0].multiplier = 3;
        let mut fee = AmountBig::zero();
        let mut excess = zero_commitment();
        assert!(!kernel.is_valid(&mut fee, &mut excess));
    }

    #[test]
    fn nested_height_ranges_must_contain_the_parent() {
        let mut kernel = nested_kernel();
        kernel.nested[0].height = HeightRange::new(20, 30);
        let mut fee = AmountBig::zero();
        let mut excess = zero_commitment();
        assert!(!kernel.is_valid(&mut fee, &mut excess));
    }

    #[test]
    fn nested_lists_must_ascend_strictly() {
        let mut kernel = nested_kernel();
        kernel.nested.reverse();
        let mut fee = AmountBig::zero();
        let mut excess = zero_commitment();
        assert!(!kernel.is_valid(&mut fee, &mut excess));

        let mut kernel = nested_kernel();
        let dup = kernel.nested[0].clone();
        kernel.nested[0] = dup.clone();
        kernel.nested[1] = dup;
        assert!(!kernel.is_valid(&mut fee, &mut excess));
    }

    #[test]
    fn lock_images_can_be_supplied_externally() {
        let preimage = FixedHash::from([5u8; 32]);
        let mut kernel = simple_kernel(1);
        kernel.hash_lock = Some(HashLock { preimage });
        sign_kernel(&mut kernel, &random_key());

        let image = lock_image(&preimage);
        assert_eq!(kernel.hash(None), kernel.hash(Some(&image)));
        assert_ne!(kernel.hash(None), kernel.hash(Some(&FixedHash::zero())));
    }

    #[test]
    fn ordering_prefers_shorter_nested_prefixes() {
        let parent = nested_kernel();
        let mut shorter = parent.clone();
        shorter.nested.pop();
        assert!(shorter < parent);
        assert_eq!(parent.cmp(&parent), Ordering::Equal);
    }
}

