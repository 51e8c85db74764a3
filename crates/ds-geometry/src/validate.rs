//! Network validation logic.

use std::collections::{HashMap, HashSet, VecDeque};

use ds_core::{GapId, PinId, SubchannelId};

use crate::error::{GeometryError, GeometryResult, invalid};
use crate::network::{FACES, Gap, GapKind, GapLink, PinShare, Subchannel, WallContact};

const SHARE_TOLERANCE: f64 = 1e-9;

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn unordered(a: SubchannelId, b: SubchannelId) -> (SubchannelId, SubchannelId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Subchannel and gap sanity: positive sizes, valid references, no
/// duplicate gaps, interior-edge-corner ordering.
pub(crate) fn validate_parts(
    subchannels: &[Subchannel],
    gaps: &[Gap],
    pin_count: usize,
) -> GeometryResult<()> {
    if subchannels.is_empty() {
        return Err(invalid("network has no subchannels"));
    }
    if pin_count == 0 {
        return Err(invalid("network has no pins"));
    }

    for sc in subchannels {
        if !positive(sc.area) {
            return Err(GeometryError::BadSubchannel {
                subchannel: sc.id,
                what: "area",
                value: sc.area,
            });
        }
        if !positive(sc.wetted_perimeter) {
            return Err(GeometryError::BadSubchannel {
                subchannel: sc.id,
                what: "wetted perimeter",
                value: sc.wetted_perimeter,
            });
        }
    }

    for pair in subchannels.windows(2) {
        if pair[1].kind < pair[0].kind {
            return Err(GeometryError::Ordering {
                subchannel: pair[1].id,
            });
        }
    }

    let mut seen = HashSet::new();
    for gap in gaps {
        for end in [gap.from, gap.to] {
            if end.idx() >= subchannels.len() {
                return Err(GeometryError::DanglingSubchannel {
                    what: "gap",
                    subchannel: end,
                });
            }
        }
        if gap.from == gap.to || !seen.insert(unordered(gap.from, gap.to)) {
            return Err(GeometryError::DuplicateGap {
                from: gap.from,
                to: gap.to,
            });
        }
        if !positive(gap.width) {
            return Err(GeometryError::BadGap {
                gap: gap.id,
                what: "width",
                value: gap.width,
            });
        }
        if !positive(gap.length) {
            return Err(GeometryError::BadGap {
                gap: gap.id,
                what: "length",
                value: gap.length,
            });
        }
    }
    Ok(())
}

/// Every pin's shares must reference real subchannels and sum to one.
pub(crate) fn validate_shares(
    shares: &[PinShare],
    pin_count: usize,
    subchannel_count: usize,
) -> GeometryResult<()> {
    let mut sums = vec![0.0; pin_count];
    for share in shares {
        if share.pin.idx() >= pin_count {
            return Err(GeometryError::DanglingPin { pin: share.pin });
        }
        if share.subchannel.idx() >= subchannel_count {
            return Err(GeometryError::DanglingSubchannel {
                what: "pin share",
                subchannel: share.subchannel,
            });
        }
        if !positive(share.fraction) || share.fraction > 1.0 + SHARE_TOLERANCE {
            return Err(GeometryError::PinShareSum {
                pin: share.pin,
                sum: share.fraction,
            });
        }
        sums[share.pin.idx()] += share.fraction;
    }

    for (i, sum) in sums.into_iter().enumerate() {
        if (sum - 1.0).abs() > SHARE_TOLERANCE {
            return Err(GeometryError::PinShareSum {
                pin: PinId::from_usize(i),
                sum,
            });
        }
    }
    Ok(())
}

pub(crate) fn validate_contacts(
    contacts: &[WallContact],
    subchannel_count: usize,
) -> GeometryResult<()> {
    for contact in contacts {
        if contact.subchannel.idx() >= subchannel_count {
            return Err(GeometryError::DanglingSubchannel {
                what: "wall contact",
                subchannel: contact.subchannel,
            });
        }
        if contact.face >= FACES {
            return Err(invalid(format!("duct face index {} >= {}", contact.face, FACES)));
        }
        if !positive(contact.length) {
            return Err(invalid(format!(
                "wall contact of subchannel {} has length {}",
                contact.subchannel, contact.length
            )));
        }
    }
    Ok(())
}

/// Resolve the perimeter gap between each pair of consecutive cycle entries.
pub(crate) fn perimeter_gaps(cycle: &[SubchannelId], gaps: &[Gap]) -> GeometryResult<Vec<GapId>> {
    if cycle.is_empty() {
        return Ok(Vec::new());
    }
    if cycle.len() < 3 {
        return Err(invalid("perimeter cycle needs at least three subchannels"));
    }

    let by_pair: HashMap<_, _> = gaps
        .iter()
        .filter(|g| g.kind == GapKind::Perimeter)
        .map(|g| (unordered(g.from, g.to), g.id))
        .collect();

    let mut unique = HashSet::new();
    let mut out = Vec::with_capacity(cycle.len());
    for (j, &from) in cycle.iter().enumerate() {
        if !unique.insert(from) {
            return Err(invalid(format!(
                "subchannel {} appears twice in the perimeter cycle",
                from
            )));
        }
        let to = cycle[(j + 1) % cycle.len()];
        match by_pair.get(&unordered(from, to)) {
            Some(&gap) => out.push(gap),
            None => return Err(GeometryError::BrokenPerimeter { from, to }),
        }
    }
    Ok(out)
}

/// Breadth-first search over gap adjacency from subchannel 0.
pub(crate) fn validate_connected(offsets: &[usize], links: &[GapLink]) -> GeometryResult<()> {
    let total = offsets.len().saturating_sub(1);
    if total == 0 {
        return Ok(());
    }

    let mut visited = vec![false; total];
    let mut queue = VecDeque::from([0usize]);
    visited[0] = true;
    let mut reachable = 1;
    while let Some(i) = queue.pop_front() {
        for link in &links[offsets[i]..offsets[i + 1]] {
            let j = link.neighbor.idx();
            if !visited[j] {
                visited[j] = true;
                reachable += 1;
                queue.push_back(j);
            }
        }
    }

    if reachable == total {
        Ok(())
    } else {
        Err(GeometryError::Disconnected { reachable, total })
    }
}
