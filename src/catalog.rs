//! The thread color catalog.
//!
//! A catalog is an injected, read-only, ordered list of named thread colors
//! with precomputed Lab coordinates. Cells reference catalog entries through
//! [`ColorId`], a dense interned index that is cheap to copy, compare, and
//! store in an `Option` per grid cell. The crate ships the official DMC table as the
//! default catalog; hosts with other thread brands construct their own via
//! [`ThreadCatalog::new`].

use crate::color::rgb_to_lab;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Interned index of a catalog entry. Stable for the lifetime of the catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorId(pub u16);

impl ColorId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One named thread color with precomputed Lab coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteEntry {
    pub id: ColorId,
    pub code: String,
    pub name: String,
    pub rgb: [u8; 3],
    pub lab: [f32; 3],
}

impl PaletteEntry {
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

/// Ordered, immutable list of thread colors.
#[derive(Debug, Clone)]
pub struct ThreadCatalog {
    entries: Vec<PaletteEntry>,
    canonical_white: Option<ColorId>,
}

static DMC_CATALOG: OnceLock<ThreadCatalog> = OnceLock::new();

impl ThreadCatalog {
    /// Build a catalog from `(code, name, packed 0xRRGGBB)` rows, computing
    /// Lab coordinates for each entry. Ids are assigned in row order.
    pub fn new<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, S, u32)>,
        S: Into<String>,
    {
        let entries: Vec<PaletteEntry> = rows
            .into_iter()
            .enumerate()
            .map(|(i, (code, name, packed))| {
                let rgb = [
                    ((packed >> 16) & 0xFF) as u8,
                    ((packed >> 8) & 0xFF) as u8,
                    (packed & 0xFF) as u8,
                ];
                PaletteEntry {
                    id: ColorId(i as u16),
                    code: code.into(),
                    name: name.into(),
                    rgb,
                    lab: rgb_to_lab(rgb),
                }
            })
            .collect();
        Self {
            entries,
            canonical_white: None,
        }
    }

    /// Designate the entry preferred when two candidates are equidistant from
    /// a query. See [`crate::matcher::TieBreak`].
    pub fn with_canonical_white(mut self, id: ColorId) -> Self {
        if id.index() < self.entries.len() {
            self.canonical_white = Some(id);
        }
        self
    }

    /// The built-in DMC thread catalog, built once and cached.
    pub fn dmc() -> &'static Self {
        DMC_CATALOG.get_or_init(|| {
            let catalog = Self::new(DMC_TABLE.iter().map(|&(c, n, p)| (c, n, p)));
            // B5200 "Snow White" is row 0 of the DMC table.
            catalog.with_canonical_white(ColorId(0))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn entry(&self, id: ColorId) -> Option<&PaletteEntry> {
        self.entries.get(id.index())
    }

    pub fn by_code(&self, code: &str) -> Option<&PaletteEntry> {
        self.entries.iter().find(|e| e.code.eq_ignore_ascii_case(code))
    }

    pub fn canonical_white(&self) -> Option<ColorId> {
        self.canonical_white
    }
}

/// Official DMC thread colors: `(code, name, packed sRGB)`.
const DMC_TABLE: &[(&str, &str, u32)] = &[
    ("B5200", "Snow White", 0xFFFFFF),
    ("White", "White", 0xFEFEFE),
    ("Ecru", "Ecru", 0xF0EBD5),
    ("822", "Light Beige Gray", 0xE7DECC),
    ("644", "Medium Beige Gray", 0xD9D3C3),
    ("642", "Dark Beige Gray", 0xC2B9A6),
    ("640", "Very Dark Beige Gray", 0x9B8F7E),
    ("3072", "Very Light Beaver Gray", 0xE1E5DE),
    ("648", "Light Beaver Gray", 0xBCC3BB),
    ("647", "Medium Beaver Gray", 0xA9B0A8),
    ("646", "Dark Beaver Gray", 0x8D9691),
    ("645", "Very Dark Beaver Gray", 0x6C7670),
    ("310", "Black", 0x000000),
    ("3799", "Very Dark Pewter Gray", 0x5B5F5F),
    ("413", "Dark Pewter Gray", 0x656666),
    ("3787", "Dark Brown Gray", 0x6B675E),
    ("762", "Very Light Pearl Gray", 0xE6E6E6),
    ("415", "Pearl Gray", 0xD3D3D3),
    ("318", "Light Steel Gray", 0xADB0AE),
    ("414", "Dark Steel Gray", 0x8A8A8A),
    ("317", "Pewter Gray", 0x6B6D6D),
    ("535", "Very Light Ash Gray", 0x696959),
    ("3024", "Very Light Brown Gray", 0xD0CCBE),
    ("3023", "Light Brown Gray", 0xB5A588),
    ("666", "Bright Red", 0xEC2130),
    ("321", "Red", 0xCE1938),
    ("304", "Medium Red", 0xB11731),
    ("498", "Dark Red", 0xA81428),
    ("816", "Garnet", 0x91182E),
    ("815", "Medium Garnet", 0x7C1D2B),
    ("814", "Dark Garnet", 0x6D1329),
    ("760", "Salmon", 0xF5BEC2),
    ("3712", "Medium Salmon", 0xEA9CA3),
    ("3328", "Dark Salmon", 0xE07681),
    ("347", "Very Dark Salmon", 0xBF1733),
    ("353", "Peach", 0xFECDCD),
    ("352", "Light Coral", 0xFBB9AA),
    ("351", "Coral", 0xEA8579),
    ("350", "Medium Coral", 0xE34948),
    ("349", "Dark Coral", 0xC81732),
    ("817", "Very Dark Coral Red", 0xBA1730),
    ("818", "Baby Pink", 0xFFD9DB),
    ("963", "Ultra Very Light Dusty Rose", 0xFFCCD1),
    ("3716", "Very Light Dusty Rose", 0xFFBAC7),
    ("962", "Medium Dusty Rose", 0xE97D8B),
    ("961", "Dark Dusty Rose", 0xCE486E),
    ("3833", "Light Raspberry", 0xE95077),
    ("3832", "Medium Raspberry", 0xD13D6F),
    ("3831", "Dark Raspberry", 0xB0194B),
    ("3350", "Ultra Dark Dusty Rose", 0xB52D5C),
    ("150", "Ultra Very Light Dusty Rose", 0xF8D5D8),
    ("151", "Very Light Dusty Rose", 0xEFB1BA),
    ("152", "Medium Light Shell Pink", 0xDD88A0),
    ("3354", "Light Dusty Rose", 0xD887A6),
    ("3733", "Dusty Rose", 0xCD5E8D),
    ("3731", "Very Dark Dusty Rose", 0xC0476C),
    ("3824", "Light Apricot", 0xFECABE),
    ("3341", "Apricot", 0xFFAB8A),
    ("3340", "Medium Apricot", 0xFF8262),
    ("608", "Bright Orange", 0xFF6F30),
    ("606", "Bright Orange-Red", 0xFA3F1B),
    ("970", "Light Pumpkin", 0xFF901F),
    ("971", "Pumpkin", 0xFF8600),
    ("972", "Deep Canary", 0xFFB900),
    ("3853", "Dark Autumn Gold", 0xF59B5A),
    ("3854", "Medium Autumn Gold", 0xF68A5C),
    ("3855", "Light Autumn Gold", 0xFBBF99),
    ("722", "Light Orange Spice", 0xF6A667),
    ("720", "Dark Orange Spice", 0xE94A07),
    ("721", "Medium Orange Spice", 0xF25D3D),
    ("947", "Burnt Orange", 0xFF5F01),
    ("445", "Light Lemon", 0xFFFDDB),
    ("307", "Lemon", 0xFFE600),
    ("973", "Bright Canary", 0xFFE529),
    ("444", "Dark Lemon", 0xFFE00B),
    ("3078", "Very Light Golden Yellow", 0xFFF8DC),
    ("727", "Very Light Topaz", 0xFFF785),
    ("726", "Light Topaz", 0xFFD747),
    ("725", "Topaz", 0xFFC723),
    ("3820", "Dark Straw", 0xDDB900),
    ("783", "Medium Topaz", 0xD68700),
    ("782", "Dark Topaz", 0xCB7800),
    ("781", "Very Dark Topaz", 0x985F00),
    ("780", "Ultra Very Dark Topaz", 0x8C5400),
    ("676", "Light Old Gold", 0xECBB5C),
    ("729", "Medium Old Gold", 0xD1A140),
    ("680", "Dark Old Gold", 0xB98C27),
    ("3829", "Very Dark Old Gold", 0x9F6F00),
    ("3822", "Light Straw", 0xF0DE9C),
    ("3821", "Straw", 0xE0C47A),
    ("704", "Bright Chartreuse", 0xCCF500),
    ("703", "Chartreuse", 0xA6D700),
    ("702", "Kelly Green", 0x86B500),
    ("701", "Light Green", 0x5D9F00),
    ("700", "Bright Green", 0x2E7D09),
    ("699", "Green", 0x136C00),
    ("907", "Light Parrot Green", 0xD0F200),
    ("906", "Medium Parrot Green", 0x9DB700),
    ("905", "Dark Parrot Green", 0x6F9800),
    ("904", "Very Dark Parrot Green", 0x4B7800),
    ("164", "Light Forest Green", 0xC7D9AD),
    ("989", "Forest Green", 0x88A84C),
    ("988", "Medium Forest Green", 0x77923C),
    ("987", "Dark Forest Green", 0x5F7D2D),
    ("986", "Very Dark Forest Green", 0x466B28),
    ("3348", "Light Yellow Green", 0xD8E79E),
    ("3347", "Medium Yellow Green", 0xA3C85E),
    ("3346", "Hunter Green", 0x77A058),
    ("3345", "Dark Hunter Green", 0x66834A),
    ("772", "Very Light Yellow Green", 0xE4F3CC),
    ("3364", "Pine Green", 0x546E4D),
    ("320", "Medium Pistachio Green", 0x8D9E57),
    ("367", "Dark Pistachio Green", 0x6B7B3C),
    ("319", "Very Dark Pistachio Green", 0x40502C),
    ("964", "Light Seagreen", 0xC1E2DC),
    ("959", "Medium Seagreen", 0x89C9BC),
    ("958", "Dark Seagreen", 0x52B5A3),
    ("3812", "Very Dark Seagreen", 0x2E917F),
    ("3811", "Very Light Turquoise", 0xC2E3DF),
    ("598", "Light Turquoise", 0x9FCECE),
    ("597", "Turquoise", 0x6CB5BD),
    ("3810", "Dark Turquoise", 0x4D999A),
    ("3809", "Very Dark Turquoise", 0x328082),
    ("928", "Very Light Gray Green", 0xE7EDE7),
    ("927", "Light Gray Green", 0xBFCEC4),
    ("926", "Medium Gray Green", 0x98B3A6),
    ("3768", "Dark Gray Green", 0x5B7B6B),
    ("3841", "Pale Baby Blue", 0xCEDEED),
    ("3840", "Light Baby Blue", 0xA8C9E8),
    ("3839", "Medium Baby Blue", 0x6495C8),
    ("3838", "Dark Baby Blue", 0x3A75AE),
    ("800", "Pale Delft Blue", 0xC9E4F2),
    ("809", "Delft Blue", 0x94B7D5),
    ("799", "Medium Delft Blue", 0x7393B7),
    ("798", "Dark Delft Blue", 0x5174A0),
    ("797", "Royal Blue", 0x13438D),
    ("796", "Dark Royal Blue", 0x123071),
    ("3325", "Light Baby Blue", 0xBFD8EB),
    ("3755", "Baby Blue", 0x8DADD3),
    ("334", "Medium Baby Blue", 0x5D8AB8),
    ("322", "Dark Baby Blue", 0x2F5580),
    ("312", "Very Dark Baby Blue", 0x13416D),
    ("311", "Medium Navy Blue", 0x1C3A5C),
    ("336", "Navy Blue", 0x13294B),
    ("823", "Dark Navy Blue", 0x13294B),
    ("939", "Very Dark Navy Blue", 0x13213C),
    ("3747", "Very Light Blue Violet", 0xE3E5EC),
    ("341", "Light Blue Violet", 0xB5CAE6),
    ("3746", "Dark Blue Violet", 0x948FCC),
    ("333", "Very Dark Blue Violet", 0x6E5B9B),
    ("3837", "Ultra Dark Lavender", 0x6D417E),
    ("211", "Light Lavender", 0xE8D8EA),
    ("210", "Medium Lavender", 0xC68FB9),
    ("209", "Dark Lavender", 0x9C4E97),
    ("208", "Very Dark Lavender", 0x7F2A7B),
    ("3836", "Light Grape", 0xB78BC0),
    ("3835", "Medium Grape", 0x924C8F),
    ("3834", "Dark Grape", 0x742A6E),
    ("154", "Very Dark Grape", 0x551839),
    ("153", "Very Light Violet", 0xE8CCDF),
    ("3743", "Very Light Antique Violet", 0xE3D7E2),
    ("3042", "Light Antique Violet", 0xD7BFD4),
    ("3041", "Medium Antique Violet", 0xC6A9C1),
    ("3740", "Dark Antique Violet", 0xA17896),
    ("3865", "Winter White", 0xFAF9F4),
    ("739", "Ultra Very Light Tan", 0xF5EDD3),
    ("738", "Very Light Tan", 0xEBCBA1),
    ("437", "Light Tan", 0xD9A964),
    ("436", "Tan", 0xC68638),
    ("435", "Very Light Brown", 0x945B25),
    ("434", "Light Brown", 0x944B14),
    ("433", "Medium Brown", 0x85511F),
    ("801", "Dark Coffee Brown", 0x693F17),
    ("898", "Very Dark Coffee Brown", 0x5C3A1F),
    ("938", "Ultra Dark Coffee Brown", 0x4A2812),
    ("3371", "Black Brown", 0x301904),
    ("543", "Ultra Very Light Beige Brown", 0xF0DBC8),
    ("3864", "Light Mocha Beige", 0xC9A992),
    ("3863", "Medium Mocha Beige", 0xA4826A),
    ("3862", "Dark Mocha Beige", 0x856551),
    ("3861", "Light Cocoa", 0xA07959),
    ("3860", "Cocoa", 0x78503B),
    ("3031", "Very Dark Mocha Brown", 0x54372A),
    ("3021", "Very Dark Brown Gray", 0x5B4733),
    ("948", "Very Light Peach", 0xFED9C7),
    ("754", "Light Peach", 0xF9CEB9),
    ("945", "Tawny", 0xF6C199),
    ("3778", "Light Terra Cotta", 0xDD967F),
    ("356", "Medium Terra Cotta", 0xC66F5C),
    ("3830", "Terra Cotta", 0xB85A41),
    ("355", "Dark Terra Cotta", 0xA44037),
    ("3777", "Very Dark Terra Cotta", 0x8E3031),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dmc_catalog_is_dense_and_ordered() {
        let catalog = ThreadCatalog::dmc();
        assert!(catalog.len() > 150);
        for (i, entry) in catalog.entries().iter().enumerate() {
            assert_eq!(entry.id.index(), i);
        }
    }

    #[test]
    fn test_lookup_by_code() {
        let catalog = ThreadCatalog::dmc();
        let black = catalog.by_code("310").expect("310 present");
        assert_eq!(black.name, "Black");
        assert_eq!(black.rgb, [0, 0, 0]);

        let snow = catalog.by_code("b5200").expect("case-insensitive lookup");
        assert_eq!(snow.rgb, [255, 255, 255]);
    }

    #[test]
    fn test_canonical_white_designated() {
        let catalog = ThreadCatalog::dmc();
        let white = catalog.canonical_white().expect("white set");
        assert_eq!(catalog.entry(white).unwrap().code, "B5200");
    }

    #[test]
    fn test_entry_lab_precomputed() {
        let catalog = ThreadCatalog::dmc();
        let snow = catalog.by_code("B5200").unwrap();
        assert!((snow.lab[0] - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_custom_catalog_white_guard() {
        let catalog = ThreadCatalog::new(vec![("1", "One", 0xFF0000u32)])
            .with_canonical_white(ColorId(9));
        assert_eq!(catalog.canonical_white(), None);
    }
}
