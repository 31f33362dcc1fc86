//! Localized page-number digits.

use serde::{Deserialize, Serialize};

/// Digit set used when printing page numbers in the table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumeralSystem {
    Latin,
    #[default]
    Bengali,
    Devanagari,
    ArabicIndic,
}

impl NumeralSystem {
    fn digits(self) -> [char; 10] {
        match self {
            NumeralSystem::Latin => ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'],
            NumeralSystem::Bengali => ['০', '১', '২', '৩', '৪', '৫', '৬', '৭', '৮', '৯'],
            NumeralSystem::Devanagari => ['०', '१', '२', '३', '४', '५', '६', '७', '८', '९'],
            NumeralSystem::ArabicIndic => ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'],
        }
    }

    /// Format `n` with this system's digits, most significant first.
    pub fn format(self, n: u64) -> String {
        let digits = self.digits();
        n.to_string()
            .bytes()
            .map(|b| digits[(b - b'0') as usize])
            .collect()
    }
}
