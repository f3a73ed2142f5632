use log::trace;

use crate::cache::{CacheLine, CacheStore};
use crate::geometry::Geometry;
use crate::simulation_result::CacheHit;

/// Looks up `address` in the store and applies LRU replacement on a miss.
///
/// Exactly one line is touched:
/// - hit: its recency becomes the set's newest stamp
/// - cold miss: the first empty line is filled
/// - eviction: the line with the oldest recency (lowest line index on ties) is overwritten
pub fn access(store: &mut CacheStore, geometry: &Geometry, address: u64) -> CacheHit {
    let fields = geometry.decompose(address);
    let set = store.set_mut(fields.set_index);

    let (lru_idx, mru_recency) = scan_recency(set);
    let stamp = mru_recency.map_or(1, |recency| recency + 1);

    if let Some(line) = set
        .iter_mut()
        .find(|line| line.valid && line.tag == fields.tag)
    {
        line.recency = stamp;
        trace!("{address:#x}: hit in set {}", fields.set_index);
        return CacheHit::Hit;
    }

    if let Some(line) = set.iter_mut().find(|line| !line.valid) {
        *line = CacheLine {
            valid: true,
            tag: fields.tag,
            recency: stamp,
        };
        trace!("{address:#x}: cold miss in set {}", fields.set_index);
        return CacheHit::Miss { evicted: None };
    }

    // a full set is never empty, so the scan always produced a victim
    let victim = &mut set[lru_idx.unwrap_or_default()];
    let evicted = victim.tag;
    victim.tag = fields.tag;
    victim.recency = stamp;

    trace!(
        "{address:#x}: miss in set {}, evicted tag {evicted:#x}",
        fields.set_index
    );
    CacheHit::Miss {
        evicted: Some(evicted),
    }
}

/// Index of the least recently used line and the newest recency in the set.
///
/// Both are `None` until a line has been scanned. The first line wins ties.
fn scan_recency(set: &[CacheLine]) -> (Option<usize>, Option<u64>) {
    let mut lru: Option<(usize, u64)> = None;
    let mut mru: Option<u64> = None;

    for (line_idx, line) in set.iter().enumerate() {
        if lru.is_none_or(|(_, oldest)| line.recency < oldest) {
            lru = Some((line_idx, line.recency));
        }
        if mru.is_none_or(|newest| line.recency > newest) {
            mru = Some(line.recency);
        }
    }

    (lru.map(|(line_idx, _)| line_idx), mru)
}
