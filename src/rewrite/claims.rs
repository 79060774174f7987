//! Claimed-region bookkeeping
//!
//! One run may never put two link annotations on the same rectangle of the
//! same page. Matcher strategies share a single `ClaimedRegions` value,
//! passed by mutable reference, and the first strategy to claim a region
//! wins.

use std::collections::HashSet;

use crate::document::Rect;

/// Rect key quantized to 0.1pt so float noise from quad unions cannot
/// defeat de-duplication
type RegionKey = (usize, i32, i32, i32, i32);

fn key(page: usize, rect: &Rect) -> RegionKey {
    let q = |v: f32| (v * 10.0).round() as i32;
    (page, q(rect.x0), q(rect.y0), q(rect.x1), q(rect.y1))
}

/// Set of (page, rect) regions already linked in the current run
#[derive(Debug, Default)]
pub struct ClaimedRegions {
    claimed: HashSet<RegionKey>,
}

impl ClaimedRegions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a region. Returns `true` when the region was free, `false`
    /// when an earlier match already owns it.
    pub fn claim(&mut self, page: usize, rect: &Rect) -> bool {
        self.claimed.insert(key(page, rect))
    }

    pub fn is_claimed(&self, page: usize, rect: &Rect) -> bool {
        self.claimed.contains(&key(page, rect))
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_claim_wins() {
        let mut claims = ClaimedRegions::new();
        let rect = Rect::new(10.0, 20.0, 80.0, 32.0);

        assert!(claims.claim(0, &rect));
        assert!(!claims.claim(0, &rect));
        assert!(claims.is_claimed(0, &rect));
        assert_eq!(claims.len(), 1);
    }

    #[test]
    fn pages_are_independent() {
        let mut claims = ClaimedRegions::new();
        let rect = Rect::new(10.0, 20.0, 80.0, 32.0);

        assert!(claims.claim(0, &rect));
        assert!(claims.claim(1, &rect));
        assert_eq!(claims.len(), 2);
    }

    #[test]
    fn quantization_absorbs_float_noise() {
        let mut claims = ClaimedRegions::new();
        assert!(claims.claim(0, &Rect::new(10.0, 20.0, 80.0, 32.0)));
        // same region up to 0.1pt
        assert!(!claims.claim(0, &Rect::new(10.004, 19.996, 80.002, 32.001)));
        // a visibly different region is a different key
        assert!(claims.claim(0, &Rect::new(10.0, 40.0, 80.0, 52.0)));
    }
}
