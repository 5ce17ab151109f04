use serde::{Deserialize, Serialize};

/// Separator between bracket labels in the rendered availability string.
pub const LABEL_SEPARATOR: &str = "|~|";

/// Which age brackets a provider serves. One instance per provider record;
/// unknown brackets stay false and the infant minimum stays absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRanges {
    #[serde(rename = "AGE_INFANT_MINIMUM")]
    pub infant_minimum: Option<String>,
    #[serde(rename = "AGE_RANGE_1_YEAR")]
    pub one_year: bool,
    #[serde(rename = "AGE_RANGE_2_YEARS")]
    pub two_years: bool,
    #[serde(rename = "AGE_RANGE_3_YEARS")]
    pub three_years: bool,
    #[serde(rename = "AGE_RANGE_4_YEARS")]
    pub four_years: bool,
    #[serde(rename = "AGE_RANGE_5_YEARS")]
    pub five_years: bool,
    #[serde(rename = "AGE_RANGE_INFANTS")]
    pub infants: bool,
    #[serde(rename = "AGE_RANGE_SCHOOL")]
    pub school_age: bool,
}

impl AgeRanges {
    /// Decode a free-form capacity/description string (OCFS profile pages).
    ///
    /// Rules are additive: each may only set flags true, so applying them
    /// twice yields the same vector as applying them once.
    pub fn from_capacity_text(text: &str) -> AgeRanges {
        let mut v = AgeRanges::default();

        // Infant age span: the site phrases full-range capacity as
        // "ages 6 weeks to 12 years"; the bare "6 weeks" shows up in
        // abbreviated listings.
        if text.contains("ages 6 weeks to 12 years") || text.contains("6 weeks") {
            v.infants = true;
            v.one_year = true;
            v.two_years = true;
            v.three_years = true;
            v.four_years = true;
            v.five_years = true;
            v.school_age = true;
            v.infant_minimum = Some("6 weeks".to_string());
        }

        if text.contains("School-Aged Children") {
            v.school_age = true;
        }

        if text.contains("Preschoolers") {
            v.three_years = true;
            v.four_years = true;
            v.five_years = true;
        }

        if text.contains("additional school-aged children") {
            v.school_age = true;
        }

        v
    }

    /// Render the bracket labels of every set flag, in fixed bracket order,
    /// joined with `|~|`. The infant minimum is never rendered.
    pub fn availability_string(&self) -> String {
        let brackets = [
            (self.infants, "0-12 Months (Infant)"),
            (self.one_year, "1 year"),
            (self.two_years, "2 years"),
            (self.three_years, "3 years"),
            (self.four_years, "4 years"),
            (self.five_years, "5 years"),
            (self.school_age, "School-age"),
        ];

        brackets
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, label)| *label)
            .collect::<Vec<_>>()
            .join(LABEL_SEPARATOR)
    }
}

/// The three fixed search-filter categories the NYC Health search accepts.
/// Each category determines its age brackets outright; no text parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCategory {
    InfantsToddlers,
    PreSchool,
    SchoolBased,
}

impl SearchCategory {
    pub const ALL: [SearchCategory; 3] = [
        SearchCategory::InfantsToddlers,
        SearchCategory::PreSchool,
        SearchCategory::SchoolBased,
    ];

    /// The literal filter value the search form expects.
    pub fn query_value(self) -> &'static str {
        match self {
            SearchCategory::InfantsToddlers => "Child Care - Infants/Toddlers",
            SearchCategory::PreSchool => "Child Care - Pre School",
            SearchCategory::SchoolBased => "School Based Child Care",
        }
    }

    pub fn age_ranges(self) -> AgeRanges {
        match self {
            SearchCategory::InfantsToddlers => AgeRanges {
                infants: true,
                one_year: true,
                ..AgeRanges::default()
            },
            SearchCategory::PreSchool => AgeRanges {
                two_years: true,
                three_years: true,
                four_years: true,
                five_years: true,
                ..AgeRanges::default()
            },
            SearchCategory::SchoolBased => AgeRanges {
                school_age: true,
                ..AgeRanges::default()
            },
        }
    }
}

// ── Tests ──
