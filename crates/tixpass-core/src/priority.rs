//! Symbology group precedence and per-image candidate selection.
//!
//! For each image the detector is asked for one [`FormatGroup`] at a time in
//! [`FormatGroup::PRECEDENCE`] order. The first group that produces anything
//! ends the search for that image, and [`select_best`] reduces that group's
//! hits to a single winner.

use std::cmp::Ordering;

use crate::candidate::BarcodeCandidate;
use crate::symbology::Symbology;

/// An ordered set of symbologies decoded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatGroup {
    /// Aztec: used by rail and air operators for high-value tickets.
    Aztec,
    /// PDF417: the densest stacked symbology, common on boarding passes.
    Pdf417,
    /// General-purpose matrix codes.
    Matrix,
    /// Every linear symbology.
    Linear,
}

impl FormatGroup {
    pub const PRECEDENCE: [FormatGroup; 4] = [
        FormatGroup::Aztec,
        FormatGroup::Pdf417,
        FormatGroup::Matrix,
        FormatGroup::Linear,
    ];

    pub fn symbologies(&self) -> &'static [Symbology] {
        match self {
            FormatGroup::Aztec => &[Symbology::Aztec],
            FormatGroup::Pdf417 => &[Symbology::Pdf417],
            FormatGroup::Matrix => &[Symbology::QrCode, Symbology::DataMatrix],
            FormatGroup::Linear => &Symbology::LINEAR,
        }
    }

    pub fn contains(&self, symbology: Symbology) -> bool {
        self.symbologies().contains(&symbology)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatGroup::Aztec => "aztec",
            FormatGroup::Pdf417 => "pdf417",
            FormatGroup::Matrix => "matrix",
            FormatGroup::Linear => "linear",
        }
    }

    /// The group a symbology is searched in.
    pub fn of(symbology: Symbology) -> FormatGroup {
        Self::PRECEDENCE
            .into_iter()
            .find(|g| g.contains(symbology))
            .unwrap_or(FormatGroup::Linear)
    }
}

/// Run `detect` once per group in precedence order, stopping at the first
/// group with any hit, and return that group's single best candidate.
///
/// `detect` receives the group's symbologies; anything it returns outside
/// them is discarded. `center` is the image center used for tie-breaking.
pub fn detect_by_precedence<F>(center: (f64, f64), mut detect: F) -> Option<BarcodeCandidate>
where
    F: FnMut(FormatGroup) -> Vec<BarcodeCandidate>,
{
    for group in FormatGroup::PRECEDENCE {
        let hits: Vec<BarcodeCandidate> = detect(group)
            .into_iter()
            .filter(|c| group.contains(c.symbology))
            .collect();
        if !hits.is_empty() {
            return select_best(hits, center);
        }
    }
    None
}

/// Pick the winner among candidates from one image.
///
/// Ordering is strictly lexicographic: highest confidence, then largest
/// bounding-box area, then smallest distance from `center`. Exact ties fall
/// back to symbology and payload so the result never depends on input order.
pub fn select_best(
    candidates: Vec<BarcodeCandidate>,
    center: (f64, f64),
) -> Option<BarcodeCandidate> {
    candidates
        .into_iter()
        .min_by(|a, b| compare_candidates(a, b, center))
}

/// `Ordering::Less` means `a` ranks ahead of `b`.
pub fn compare_candidates(
    a: &BarcodeCandidate,
    b: &BarcodeCandidate,
    center: (f64, f64),
) -> Ordering {
    b.confidence
        .cmp(&a.confidence)
        .then_with(|| b.area().total_cmp(&a.area()))
        .then_with(|| {
            a.bbox
                .center_distance(center)
                .total_cmp(&b.bbox.center_distance(center))
        })
        .then_with(|| a.symbology.cmp(&b.symbology))
        .then_with(|| a.payload.cmp(&b.payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::DetectionMethod;
    use crate::geometry::BBox;

    fn make(symbology: Symbology, payload: &str, confidence: u8, bbox: BBox) -> BarcodeCandidate {
        BarcodeCandidate::new(
            symbology,
            payload.as_bytes().to_vec(),
            bbox,
            confidence,
            DetectionMethod::Raster { dpi: 300 },
            1,
            300,
        )
    }

    #[test]
    fn precedence_order() {
        assert_eq!(
            FormatGroup::PRECEDENCE,
            [
                FormatGroup::Aztec,
                FormatGroup::Pdf417,
                FormatGroup::Matrix,
                FormatGroup::Linear
            ]
        );
        assert!(FormatGroup::Matrix.contains(Symbology::QrCode));
        assert!(FormatGroup::Matrix.contains(Symbology::DataMatrix));
        assert!(FormatGroup::Linear.contains(Symbology::Ean13));
        assert!(!FormatGroup::Linear.contains(Symbology::Pdf417));
    }

    #[test]
    fn every_symbology_has_exactly_one_group() {
        for s in Symbology::ALL {
            let groups = FormatGroup::PRECEDENCE
                .iter()
                .filter(|g| g.contains(s))
                .count();
            assert_eq!(groups, 1, "{s}");
            assert!(FormatGroup::of(s).contains(s));
        }
    }

    #[test]
    fn highest_confidence_wins() {
        let a = make(Symbology::QrCode, "a", 80, BBox::from_xywh(0.0, 0.0, 100.0, 100.0));
        let b = make(Symbology::QrCode, "b", 95, BBox::from_xywh(0.0, 0.0, 10.0, 10.0));
        let best = select_best(vec![a, b], (50.0, 50.0)).unwrap();
        assert_eq!(best.text, "b");
    }

    #[test]
    fn area_breaks_confidence_tie() {
        let a = make(Symbology::QrCode, "small", 90, BBox::from_xywh(0.0, 0.0, 10.0, 10.0));
        let b = make(Symbology::QrCode, "large", 90, BBox::from_xywh(0.0, 0.0, 50.0, 50.0));
        let best = select_best(vec![a, b], (500.0, 500.0)).unwrap();
        assert_eq!(best.text, "large");
    }

    #[test]
    fn centrality_breaks_area_tie() {
        let off = make(Symbology::QrCode, "off", 90, BBox::from_xywh(0.0, 0.0, 20.0, 20.0));
        let centered =
            make(Symbology::QrCode, "centered", 90, BBox::from_xywh(40.0, 40.0, 20.0, 20.0));
        let best = select_best(vec![off.clone(), centered.clone()], (50.0, 50.0)).unwrap();
        assert_eq!(best.text, "centered");
        let best = select_best(vec![centered, off], (50.0, 50.0)).unwrap();
        assert_eq!(best.text, "centered");
    }

    #[test]
    fn exact_tie_is_order_independent() {
        let a = make(Symbology::QrCode, "aaa", 90, BBox::from_xywh(0.0, 0.0, 20.0, 20.0));
        let b = make(Symbology::QrCode, "bbb", 90, BBox::from_xywh(0.0, 0.0, 20.0, 20.0));
        let first = select_best(vec![a.clone(), b.clone()], (10.0, 10.0)).unwrap();
        let second = select_best(vec![b, a], (10.0, 10.0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_selection_is_none() {
        assert!(select_best(Vec::new(), (0.0, 0.0)).is_none());
    }

    #[test]
    fn precedence_stops_at_first_hit() {
        let mut asked = Vec::new();
        let best = detect_by_precedence((50.0, 50.0), |group| {
            asked.push(group);
            match group {
                FormatGroup::Pdf417 => vec![make(
                    Symbology::Pdf417,
                    "boarding",
                    90,
                    BBox::from_xywh(0.0, 0.0, 30.0, 10.0),
                )],
                FormatGroup::Matrix => vec![make(
                    Symbology::QrCode,
                    "never",
                    100,
                    BBox::from_xywh(0.0, 0.0, 90.0, 90.0),
                )],
                _ => Vec::new(),
            }
        })
        .unwrap();
        assert_eq!(best.text, "boarding");
        assert_eq!(asked, vec![FormatGroup::Aztec, FormatGroup::Pdf417]);
    }

    #[test]
    fn precedence_ignores_out_of_group_hits() {
        let best = detect_by_precedence((0.0, 0.0), |group| match group {
            FormatGroup::Aztec => vec![make(
                Symbology::QrCode,
                "stray",
                90,
                BBox::from_xywh(0.0, 0.0, 10.0, 10.0),
            )],
            FormatGroup::Linear => vec![make(
                Symbology::Code128,
                "linear",
                90,
                BBox::from_xywh(0.0, 0.0, 10.0, 10.0),
            )],
            _ => Vec::new(),
        })
        .unwrap();
        assert_eq!(best.text, "linear");
    }

    #[test]
    fn precedence_with_no_hits() {
        assert!(detect_by_precedence((0.0, 0.0), |_| Vec::new()).is_none());
    }
}
