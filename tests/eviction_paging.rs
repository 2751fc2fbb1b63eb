//! Eviction behavior under a compressed byte budget: LRU page-out, prefetch
//! bounds, and page-out accounting.

use std::collections::HashMap;
use std::sync::Arc;

use eyre::Result;
use parking_lot::Mutex;

use voxstore::{CompressedBlock, PagedVolume, Pager, Region, Voxel};

#[derive(Default)]
struct PagerState {
    stored: HashMap<(i32, i32, i32), Vec<u8>>,
    page_ins: usize,
    page_outs: usize,
    page_out_regions: Vec<Region>,
}

#[derive(Clone, Default)]
struct MemoryPager {
    state: Arc<Mutex<PagerState>>,
}

impl MemoryPager {
    fn state(&self) -> Arc<Mutex<PagerState>> {
        Arc::clone(&self.state)
    }
}

impl<V: Voxel> Pager<V> for MemoryPager {
    fn page_in(&mut self, region: Region, block: &mut CompressedBlock) -> Result<()> {
        let mut state = self.state.lock();
        state.page_ins += 1;
        let key = (region.lower_x(), region.lower_y(), region.lower_z());
        if let Some(payload) = state.stored.get(&key) {
            block.set_data(payload.clone());
        }
        Ok(())
    }

    fn page_out(&mut self, region: Region, block: &CompressedBlock) -> Result<()> {
        let mut state = self.state.lock();
        state.page_outs += 1;
        state.page_out_regions.push(region);
        let key = (region.lower_x(), region.lower_y(), region.lower_z());
        state.stored.insert(key, block.data().to_vec());
        Ok(())
    }
}

/// A 16-block volume under a budget too small for four compressed blocks,
/// so walking four blocks must page at least one out; the pager has to
/// bring the first value back afterwards.
#[test]
fn eviction_pages_out_and_pager_restores() {
    let pager = MemoryPager::default();
    let state = pager.state();

    let mut volume: PagedVolume<u8> = PagedVolume::builder(Region::cubic(0, 63))
        .block_side_length(16)
        .pager(pager)
        .build()
        .unwrap();

    // One uncompressed block (4096 bytes) plus a compressed budget smaller
    // than four empty blocks' bookkeeping alone.
    volume.set_target_memory_limit(4096 + 100).unwrap();
    assert_eq!(volume.compressed_budget(), 100);

    for (i, x) in [0, 16, 32, 48].into_iter().enumerate() {
        volume.set_voxel_at(x, 0, 0, 10 + i as u8 * 10).unwrap();
    }

    assert!(state.lock().page_outs >= 1, "budget must have forced a page-out");

    // The first block was evicted; the pager must hand back the write.
    assert_eq!(volume.get_voxel_at(0, 0, 0).unwrap(), 10);
    assert_eq!(volume.get_voxel_at(48, 0, 0).unwrap(), 40);
}

#[test]
fn resident_bytes_stay_within_budget_slack() {
    let pager = MemoryPager::default();

    let mut volume: PagedVolume<u8> = PagedVolume::builder(Region::cubic(0, 63))
        .block_side_length(16)
        .pager(pager)
        .build()
        .unwrap();

    // Measure one resident block, then budget for roughly three of them.
    volume.prefetch(Region::cubic(0, 15)).unwrap();
    let single = volume.compressed_bytes_in_use();
    assert!(single > 0);
    volume.set_target_memory_limit(4096 + 3 * single + single / 2).unwrap();

    for x in (0..64).step_by(16) {
        for y in (0..64).step_by(16) {
            volume.get_voxel_at(x, y, 0).unwrap();
        }
    }

    // Steady state: at most one block of overshoot past the budget.
    assert!(volume.compressed_bytes_in_use() <= volume.compressed_budget() + single);
}

/// Prefetch pages blocks in compressed-only form and its own page-ins are
/// the only thing the sweep ever has to undo.
#[test]
fn prefetch_stays_within_budget_and_skips_decompression() {
    let pager = MemoryPager::default();
    let state = pager.state();

    let mut volume: PagedVolume<u8> = PagedVolume::builder(Region::cubic(0, 255))
        .block_side_length(32)
        .pager(pager)
        .build()
        .unwrap();

    // Measure one resident block, then budget for roughly eight.
    volume.prefetch(Region::cubic(0, 31)).unwrap();
    let single = volume.compressed_bytes_in_use();
    volume
        .set_target_memory_limit(32 * 32 * 32 + 8 * single + single / 2)
        .unwrap();

    // 27 blocks, far more than the budget admits.
    volume.prefetch(Region::cubic(0, 95)).unwrap();

    assert!(volume.resident_block_count() <= 8);
    assert_eq!(volume.uncompressed_block_count(), 0);

    let state = state.lock();
    assert_eq!(
        state.page_ins - volume.resident_block_count(),
        state.page_outs,
        "every eviction must correspond to exactly one page-out"
    );
}

#[test]
fn flush_all_pages_out_every_resident_block_with_its_region() {
    let pager = MemoryPager::default();
    let state = pager.state();

    let mut volume: PagedVolume<u8> = PagedVolume::builder(Region::cubic(0, 63))
        .block_side_length(16)
        .pager(pager)
        .build()
        .unwrap();

    volume.set_voxel_at(0, 0, 0, 1).unwrap();
    volume.set_voxel_at(17, 0, 0, 2).unwrap();
    volume.set_voxel_at(0, 40, 0, 3).unwrap();
    let resident = volume.resident_block_count();

    volume.flush_all().unwrap();
    assert_eq!(volume.resident_block_count(), 0);

    let state = state.lock();
    assert_eq!(state.page_outs, resident);

    let mut regions = state.page_out_regions.clone();
    regions.sort_by_key(|r| (r.lower_x(), r.lower_y(), r.lower_z()));
    assert_eq!(
        regions,
        vec![
            Region::new(0, 0, 0, 15, 15, 15),
            Region::new(0, 32, 0, 15, 47, 15),
            Region::new(16, 0, 0, 31, 15, 15),
        ]
    );
}

/// Oldest-stamp victim selection: after touching block A last, a sweep that
/// evicts one block must take block B.
#[test]
fn eviction_victim_is_least_recently_used() {
    let pager = MemoryPager::default();
    let state = pager.state();

    let mut volume: PagedVolume<u8> = PagedVolume::builder(Region::cubic(0, 63))
        .block_side_length(16)
        .pager(pager)
        .build()
        .unwrap();

    volume.set_voxel_at(0, 0, 0, 1).unwrap(); // block (0,0,0)
    volume.set_voxel_at(16, 0, 0, 2).unwrap(); // block (1,0,0)
    volume.get_voxel_at(0, 0, 0).unwrap(); // (0,0,0) is now the newest

    // A budget nothing fits in: the next page-in evicts both older blocks.
    volume.set_target_memory_limit(4096).unwrap();
    assert_eq!(volume.compressed_budget(), 0);
    volume.set_voxel_at(32, 0, 0, 3).unwrap();

    let regions = state.lock().page_out_regions.clone();
    assert_eq!(
        regions.first(),
        Some(&Region::new(16, 0, 0, 31, 15, 15)),
        "block (1,0,0) carried the oldest stamp and must go first"
    );

    // Read-your-writes still holds for everything evicted.
    assert_eq!(volume.get_voxel_at(0, 0, 0).unwrap(), 1);
    assert_eq!(volume.get_voxel_at(16, 0, 0).unwrap(), 2);
}
