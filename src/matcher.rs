//! Nearest-color search over the catalog or a restricted subset.

use crate::catalog::{ColorId, ThreadCatalog};
use crate::color::{delta_e, rgb_to_lab};

/// Policy applied when two candidates are equidistant from the query.
///
/// Thread charts historically resolve ties toward the catalog's canonical
/// white so that near-blank fabric areas collapse onto a single blank-ish
/// thread instead of scattering across several off-whites. That rule is
/// domain-intentional, so it is a policy here rather than a hardcoded check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TieBreak {
    /// Prefer the catalog's canonical white entry on an exact distance tie.
    CanonicalWhite,
    /// Keep whichever candidate was scanned first.
    FirstFound,
}

/// Linear-scan nearest matcher. The query is converted to Lab once; every
/// candidate compares against its precomputed Lab coordinates.
pub struct PaletteMatcher<'a> {
    catalog: &'a ThreadCatalog,
    candidates: Option<Vec<ColorId>>,
    tie_break: TieBreak,
}

impl<'a> PaletteMatcher<'a> {
    pub fn new(catalog: &'a ThreadCatalog) -> Self {
        Self {
            catalog,
            candidates: None,
            tie_break: TieBreak::CanonicalWhite,
        }
    }

    /// Restrict the search to a subset of catalog ids. Unknown ids are
    /// dropped silently.
    pub fn restrict_to(mut self, ids: &[ColorId]) -> Self {
        let known: Vec<ColorId> = ids
            .iter()
            .copied()
            .filter(|id| self.catalog.entry(*id).is_some())
            .collect();
        self.candidates = Some(known);
        self
    }

    pub fn tie_break(mut self, policy: TieBreak) -> Self {
        self.tie_break = policy;
        self
    }

    /// Nearest candidate to an sRGB query. `None` only when the candidate
    /// set is empty.
    pub fn nearest(&self, rgb: [u8; 3]) -> Option<ColorId> {
        self.nearest_lab(rgb_to_lab(rgb))
    }

    /// Nearest candidate to a Lab query.
    pub fn nearest_lab(&self, lab: [f32; 3]) -> Option<ColorId> {
        let white = self.catalog.canonical_white();
        let mut best: Option<(ColorId, f32)> = None;

        let mut consider = |id: ColorId| {
            let Some(entry) = self.catalog.entry(id) else {
                return;
            };
            let d = delta_e(lab, entry.lab);
            match best {
                None => best = Some((id, d)),
                Some((held, held_d)) => {
                    if d < held_d {
                        best = Some((id, d));
                    } else if d == held_d
                        && self.tie_break == TieBreak::CanonicalWhite
                        && Some(id) == white
                        && Some(held) != white
                    {
                        best = Some((id, d));
                    }
                }
            }
        };

        match &self.candidates {
            Some(ids) => ids.iter().copied().for_each(&mut consider),
            None => (0..self.catalog.len()).for_each(|i| consider(ColorId(i as u16))),
        }

        best.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_wins() {
        let catalog = ThreadCatalog::dmc();
        let matcher = PaletteMatcher::new(catalog);
        let black = matcher.nearest([0, 0, 0]).unwrap();
        assert_eq!(catalog.entry(black).unwrap().code, "310");
    }

    #[test]
    fn test_restricted_subset() {
        let catalog = ThreadCatalog::dmc();
        let red = catalog.by_code("321").unwrap().id;
        let blue = catalog.by_code("797").unwrap().id;
        let matcher = PaletteMatcher::new(catalog).restrict_to(&[red, blue]);

        // Pure green is far from both, but must land on one of them.
        let hit = matcher.nearest([0, 255, 0]).unwrap();
        assert!(hit == red || hit == blue);

        let near_red = matcher.nearest([210, 30, 55]).unwrap();
        assert_eq!(near_red, red);
    }

    #[test]
    fn test_tie_prefers_canonical_white() {
        // Two entries with identical color; white is listed second so a plain
        // first-found scan would keep the other one.
        let catalog = ThreadCatalog::new(vec![
            ("900", "Twin", 0xFFFFFFu32),
            ("WH", "White", 0xFFFFFF),
            ("310", "Black", 0x000000),
        ])
        .with_canonical_white(ColorId(1));

        let matcher = PaletteMatcher::new(&catalog);
        assert_eq!(matcher.nearest([255, 255, 255]), Some(ColorId(1)));

        let first_found = PaletteMatcher::new(&catalog).tie_break(TieBreak::FirstFound);
        assert_eq!(first_found.nearest([255, 255, 255]), Some(ColorId(0)));
    }

    #[test]
    fn test_empty_candidate_set() {
        let catalog = ThreadCatalog::dmc();
        let matcher = PaletteMatcher::new(catalog).restrict_to(&[]);
        assert_eq!(matcher.nearest([10, 10, 10]), None);
    }
}
