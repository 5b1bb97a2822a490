//! Simulated heap: a fixed-size byte arena with a first-fit free-list.
//!
//! Blocks are tracked as metadata entries rather than literal in-band
//! headers spliced into a byte buffer — this is a simulator, and a process
//! never actually touches the bytes it "owns". Each [`Block`] accounts for
//! [`HEADER_SIZE`] bytes of overhead, so the arena's block list always sums
//! to exactly [`SimHeap::capacity`], matching the source's header-in-band
//! layout without the unsafe pointer arithmetic it required in C.

use crate::pcb::Pid;

/// Bytes of bookkeeping overhead charged against the arena for every block,
/// mirroring `sizeof(block_t)` in the source (`size_t size; bool free;
/// block_t *next;`, padded to 24 bytes on a 64-bit target).
pub const HEADER_SIZE: usize = 24;

/// Minimum payload a residual block must retain to be worth splitting off;
/// below this the whole block is handed to the caller instead.
const MIN_SPLIT_PAYLOAD: usize = 8;

fn align_up(size: usize) -> usize {
    (size + 7) & !7
}

#[derive(Debug, Clone, Copy)]
struct Block {
    offset: usize,
    size: usize,
    free: bool,
    owner: Option<Pid>,
}

/// Result of a successful allocation: the payload address and its actual
/// (post-split) size, which is what gets traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapAlloc {
    pub address: usize,
    pub size: usize,
}

/// One row of [`SimHeap::dump`]: a payload region and whether it is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub address: usize,
    pub size: usize,
    pub free: bool,
    pub owner: Option<Pid>,
}

pub struct SimHeap {
    capacity: usize,
    blocks: Vec<Block>,
}

impl SimHeap {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > HEADER_SIZE, "heap must hold at least one header");
        SimHeap { capacity, blocks: vec![Block { offset: HEADER_SIZE, size: capacity - HEADER_SIZE, free: true, owner: None }] }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// First-fit allocation. Returns `None` if no free block is large
    /// enough (out-of-memory).
    pub fn alloc(&mut self, size: usize, owner: Option<Pid>) -> Option<HeapAlloc> {
        let aligned = align_up(size.max(1));
        let index = self.blocks.iter().position(|b| b.free && b.size >= aligned)?;

        let block = self.blocks[index];
        let remainder = block.size - aligned;

        if remainder >= HEADER_SIZE + MIN_SPLIT_PAYLOAD {
            let new_free = Block {
                offset: block.offset + aligned + HEADER_SIZE,
                size: remainder - HEADER_SIZE,
                free: true,
                owner: None,
            };
            self.blocks[index] = Block { offset: block.offset, size: aligned, free: false, owner };
            self.blocks.insert(index + 1, new_free);
            Some(HeapAlloc { address: block.offset, size: aligned })
        } else {
            self.blocks[index] = Block { free: false, owner, ..block };
            Some(HeapAlloc { address: block.offset, size: block.size })
        }
    }

    /// Frees the block at `address`. Invalid input (address not the start
    /// of a known, currently-used block) is silently ignored and returns
    /// `None` — double frees and foreign pointers must never crash the
    /// simulator. On success returns the freed block's pre-coalesce size,
    /// which is what gets traced.
    pub fn free(&mut self, address: usize) -> Option<usize> {
        let index = self.blocks.iter().position(|b| b.offset == address && !b.free)?;
        let freed_size = self.blocks[index].size;
        self.blocks[index].free = true;
        self.blocks[index].owner = None;

        self.coalesce_with_next(index);
        if index > 0 {
            self.coalesce_with_next(index - 1);
        }

        Some(freed_size)
    }

    fn coalesce_with_next(&mut self, index: usize) {
        let Some(&next) = self.blocks.get(index + 1) else { return };
        let current = self.blocks[index];
        if current.free && next.free && current.offset + current.size + HEADER_SIZE == next.offset {
            self.blocks[index].size += HEADER_SIZE + next.size;
            self.blocks.remove(index + 1);
        }
    }

    /// Every block in address order.
    pub fn dump(&self) -> Vec<BlockInfo> {
        self.blocks
            .iter()
            .map(|b| BlockInfo { address: b.offset, size: b.size, free: b.free, owner: b.owner })
            .collect()
    }

    /// Same as [`SimHeap::dump`], annotated with a human-readable owner tag
    /// (`"system"` when no process owns the block) for the CLI's
    /// `memory` rendering.
    pub fn dump_annotated(&self) -> Vec<(BlockInfo, &'static str)> {
        self.dump()
            .into_iter()
            .map(|b| {
                let tag = if b.free { "free" } else if b.owner.is_some() { "process" } else { "system" };
                (b, tag)
            })
            .collect()
    }

    /// Sum of free-block payload sizes plus one header per free block —
    /// used by the free-list coverage invariant.
    pub fn free_list_coverage(&self) -> usize {
        self.blocks.iter().filter(|b| b.free).map(|b| b.size + HEADER_SIZE).sum()
    }

    /// Sum of every block's payload size plus its header; must always equal
    /// `capacity`.
    pub fn total_coverage(&self) -> usize {
        self.blocks.iter().map(|b| b.size + HEADER_SIZE).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_heap_is_one_free_block_covering_the_arena() {
        let heap = SimHeap::new(1024);
        let blocks = heap.dump();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].free);
        assert_eq!(blocks[0].size, 1024 - HEADER_SIZE);
        assert_eq!(heap.total_coverage(), 1024);
    }

    #[test]
    fn scenario_f_alloc_free_reuse_and_final_coalesce() {
        let mut heap = SimHeap::new(1024);
        let a = heap.alloc(100, None).unwrap();
        let b = heap.alloc(200, None).unwrap();
        heap.free(a.address);
        let c = heap.alloc(80, None).unwrap();
        assert_eq!(c.address, a.address, "C should reuse A's freed slot");

        heap.free(b.address);
        heap.free(c.address);

        let blocks = heap.dump();
        assert_eq!(blocks.len(), 1, "fully freed arena should coalesce to one block");
        assert!(blocks[0].free);
        assert_eq!(blocks[0].size, 1024 - HEADER_SIZE);
    }

    #[test]
    fn double_free_is_a_silent_no_op() {
        let mut heap = SimHeap::new(1024);
        let a = heap.alloc(64, None).unwrap();
        assert!(heap.free(a.address).is_some());
        assert!(heap.free(a.address).is_none());
        assert_eq!(heap.total_coverage(), 1024);
    }

    #[test]
    fn free_of_foreign_address_is_ignored() {
        let mut heap = SimHeap::new(1024);
        assert!(heap.free(999_999).is_none());
        assert_eq!(heap.total_coverage(), 1024);
    }

    #[test]
    fn out_of_memory_returns_none() {
        let mut heap = SimHeap::new(256);
        assert!(heap.alloc(1024, None).is_none());
    }

    #[test]
    fn alloc_then_free_never_shrinks_free_coverage() {
        let mut heap = SimHeap::new(4096);
        let before = heap.free_list_coverage();
        let a = heap.alloc(128, None).unwrap();
        heap.free(a.address);
        let after = heap.free_list_coverage();
        assert!(after >= before);
    }

    #[test]
    fn coverage_invariant_holds_through_fragmentation() {
        let mut heap = SimHeap::new(4096);
        let a = heap.alloc(64, None).unwrap();
        let _b = heap.alloc(64, None).unwrap();
        let c = heap.alloc(64, None).unwrap();
        heap.free(a.address);
        heap.free(c.address);
        assert_eq!(heap.total_coverage(), 4096);
    }
}
