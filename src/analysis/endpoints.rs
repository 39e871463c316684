// ---------------------------------------------------------------------------
// Continuum anchors and endpoint pairs
// ---------------------------------------------------------------------------

/// One clicked shoulder point on the raw-data plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuumAnchor {
    pub x: f64,
    pub y: f64,
}

impl ContinuumAnchor {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Two shoulder anchors marking one straight-line continuum.
///
/// No ordering is assumed at construction: [`EndpointPair::ordered`] puts the
/// low-x anchor first, moving each y together with its x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointPair {
    pub start: ContinuumAnchor,
    pub end: ContinuumAnchor,
}

impl EndpointPair {
    pub fn new(start: ContinuumAnchor, end: ContinuumAnchor) -> Self {
        Self { start, end }
    }

    /// Normalize anchor order so `start.x <= end.x`.
    pub fn ordered(self) -> Self {
        if self.start.x > self.end.x {
            Self {
                start: self.end,
                end: self.start,
            }
        } else {
            self
        }
    }

    /// Group a click sequence into pairs: clicks 1+2 form pair 1, clicks 3+4
    /// form pair 2, and so on. A trailing unpaired click is ignored.
    pub fn pair_up(anchors: &[ContinuumAnchor]) -> Vec<EndpointPair> {
        anchors
            .chunks_exact(2)
            .map(|pair| EndpointPair::new(pair[0], pair[1]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_swaps_y_together_with_x() {
        let pair = EndpointPair::new(
            ContinuumAnchor::new(4.0, 0.9),
            ContinuumAnchor::new(1.0, 0.7),
        );
        let ordered = pair.ordered();
        assert_eq!(ordered.start, ContinuumAnchor::new(1.0, 0.7));
        assert_eq!(ordered.end, ContinuumAnchor::new(4.0, 0.9));
    }

    #[test]
    fn ordered_keeps_already_sorted_pair() {
        let pair = EndpointPair::new(
            ContinuumAnchor::new(1.0, 0.7),
            ContinuumAnchor::new(4.0, 0.9),
        );
        assert_eq!(pair.ordered(), pair);
    }

    #[test]
    fn pair_up_groups_consecutive_clicks() {
        let anchors = [
            ContinuumAnchor::new(0.0, 1.0),
            ContinuumAnchor::new(2.0, 0.9),
            ContinuumAnchor::new(3.0, 0.8),
            ContinuumAnchor::new(5.0, 1.0),
        ];
        let pairs = EndpointPair::pair_up(&anchors);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].start, anchors[0]);
        assert_eq!(pairs[0].end, anchors[1]);
        assert_eq!(pairs[1].start, anchors[2]);
        assert_eq!(pairs[1].end, anchors[3]);
    }

    #[test]
    fn pair_up_drops_trailing_unpaired_click() {
        let anchors = [
            ContinuumAnchor::new(0.0, 1.0),
            ContinuumAnchor::new(2.0, 0.9),
            ContinuumAnchor::new(3.0, 0.8),
        ];
        let pairs = EndpointPair::pair_up(&anchors);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn pair_up_empty_input() {
        assert!(EndpointPair::pair_up(&[]).is_empty());
    }
}
