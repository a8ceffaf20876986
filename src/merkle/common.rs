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

//! Position arithmetic for the Merkle mountain range.
//!
//! Nodes are stored in postorder: a parent immediately follows its right child. All tree shape
//! questions reduce to bit arithmetic on the node position, which is what lets a verifier derive
//! the structure of a hard proof from an index and a size alone.

const ALL_ONES: u64 = u64::MAX;

/// Returns the MMR node index derived from the leaf index.
pub fn node_index(leaf_index: u64) -> u64 {
    if leaf_index == 0 {
        return 0;
    }
    2 * leaf_index - u64::from(leaf_index.count_ones())
}

/// The number of nodes in an MMR holding `leaf_count` leaves.
pub fn node_count(leaf_count: u64) -> u64 {
    node_index(leaf_count)
}

/// return (peak_map, pos_height) of given 0-based node pos prior to its addition
/// Example: on input 4 returns (0b11, 0) as mmr state before adding 4 was
///    2
///   / \
///  0   1   3
/// with 0b11 indicating presence of peaks of height 0 and 1.
/// NOTE:
/// the peak map also encodes the path taken from the root to the added node since the path turns
/// left (resp. right) if-and-only-if a peak at that height is absent (resp. present)
pub fn peak_map_height(mut pos: u64) -> (u64, u64) {
    if pos == 0 {
        return (0, 0);
    }
    let mut peak_size = ALL_ONES >> pos.leading_zeros();
    let mut bitmap = 0;
    while peak_size != 0 {
        bitmap <<= 1;
        if pos >= peak_size {
            pos -= peak_size;
            bitmap |= 1;
        }
        peak_size >>= 1;
    }
    (bitmap, pos)
}

/// The height of the node at `pos` in its binary tree; leaves are at height 0.
pub fn bintree_height(pos: u64) -> u64 {
    if pos == 0 {
        return 0;
    }
    peak_map_height(pos).1
}

/// Is the node at this pos the "left" sibling of its parent?
pub fn is_left_sibling(pos: u64) -> bool {
    let (peak_map, height) = peak_map_height(pos);
    let peak = 1 << height;
    (peak_map & peak) == 0
}

/// Postorder positions of the peaks of an MMR with `size` nodes, highest peak first. Empty if
/// `size` does not describe a well-formed MMR.
pub fn find_peaks(size: u64) -> Vec<u64> {
    if size == 0 {
        return vec![];
    }
    let mut peak_size = ALL_ONES >> size.leading_zeros();
    let mut num_left = size;
    let mut sum_prev_peaks = 0;
    let mut peaks = vec![];
    while peak_size != 0 {
        if num_left >= peak_size {
            peaks.push(sum_prev_peaks + peak_size - 1);
            sum_prev_peaks += peak_size;
            num_left -= peak_size;
        }
        peak_size >>= 1;
    }
    if num_left > 0 {
        return vec![];
    }
    peaks
}

/// The (parent, sibling) pairs along the path from `pos` up to its local peak, for an MMR with
/// `size` nodes.
pub fn family_branch(pos: u64, size: u64) -> Vec<(u64, u64)> {
    let (peak_map, height) = peak_map_height(pos);
    let mut peak = 1 << height;
    let mut branch = vec![];
    let mut current = pos;
    let mut sibling;
    while current + 1 < size {
        if (peak_map & peak) != 0 {
            current += 1;
            sibling = current - 2 * peak;
        } else {
            current += 2 * peak;
            sibling = current - 1;
        }
        if current >= size {
            break;
        }
        branch.push((current, sibling));
        peak <<= 1;
    }
    branch
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn leaf_to_node_indices() {
        assert_eq!(node_index(0), 0);
        assert_eq!(node_index(1), 1);
        assert_eq!(node_index(2), 3);
        assert_eq!(node_index(3), 4);
        assert_eq!(node_index(5), 8);
        assert_eq!(node_index(6), 10);
        assert_eq!(node_index(7), 11);
        assert_eq!(node_index(8), 15);
    }

    #[test]
    fn peak_map_heights() {
        assert_eq!(peak_map_height(0), (0, 0));
        assert_eq!(peak_map_height(4), (0b11, 0));
        assert_eq!(peak_map_height(9), (0b101, 1));
        assert_eq!(peak_map_height(10), (0b110, 0));
        assert_eq!(peak_map_height(12), (0b111, 1));
        assert_eq!(peak_map_height(33), (0b10001, 1));
        assert_eq!(peak_map_height(34), (0b10010, 0));
    }

    #[test]
    fn peak_vectors() {
        assert_eq!(find_peaks(0), Vec::<u64>::new());
        assert_eq!(find_peaks(1), vec![0]);
        assert_eq!(find_peaks(3), vec![2]);
        assert_eq!(find_peaks(4), vec![2, 3]);
        assert_eq!(find_peaks(15), vec![14]);
        assert_eq!(find_peaks(23), vec![14, 21, 22]);
    }

    #[test]
    fn sibling_sides() {
        assert!(is_left_sibling(0));
        assert!(!is_left_sibling(1));
        assert!(is_left_sibling(2));
        assert!(is_left_sibling(3));
        assert!(!is_left_sibling(4));
        assert!(!is_left_sibling(5));
        assert!(is_left_sibling(6));
        assert!(is_left_sibling(7));
        assert!(!is_left_sibling(8));
    }

    #[test]
    fn family_branches() {
        // A 3 node tree (height 1)
        assert_eq!(family_branch(0, 3), [(2, 1)]);
        assert_eq!(family_branch(1, 3), [(2, 0)]);
        assert_eq!(family_branch(2, 3), []);

        // leaf node in a larger tree of 7 nodes (height 2)
        assert_eq!(family_branch(0, 7), [(2, 1), (6, 5)]);

        // these only go as far up as the local peak, not necessarily the single root
        assert_eq!(family_branch(0, 4), [(2, 1)]);
        // pos 3 in a tree of size 4 is a local peak
        assert_eq!(family_branch(3, 4), []);
        // pos 3 in a tree of size 5 is also still a local peak
        assert_eq!(family_branch(3, 5), []);
        // pos 3 in a tree of size 6 has a parent and a sibling
        assert_eq!(family_branch(3, 6), [(5, 4)]);
        // a tree of size 7 is all under a single root
        assert_eq!(family_branch(3, 7), [(5, 4), (6, 2)]);
    }
}
