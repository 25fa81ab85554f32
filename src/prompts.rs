//! Call prompt catalog.
//!
//! Static conversation openers offered before an assisted call, chosen by
//! keywords in the contact's occupation.

/// Openers appended to every list.
pub const GENERAL_PROMPTS: &[&str] = &[
    "Hello, how are you today?",
    "I hope you're having a great day",
    "I wanted to check in with you",
    "Do you have a moment to talk?",
];

/// Used when no occupation is known or none of the categories match.
pub const DEFAULT_PROMPTS: &[&str] = &[
    "I'd like to discuss business matters",
    "I have a question for you",
    "I wanted to follow up on our last conversation",
    "I need your expertise on something",
    "I'd like to schedule a meeting",
];

/// A group of occupations sharing the same prompts.
#[derive(Debug, Clone, Copy)]
pub struct PromptCategory {
    pub name: &'static str,
    /// Lowercase substrings matched against the occupation
    pub keywords: &'static [&'static str],
    pub prompts: &'static [&'static str],
}

/// Categories in match priority order.
pub static CATEGORIES: &[PromptCategory] = &[
    PromptCategory {
        name: "medical",
        keywords: &["dentist", "doctor", "physician"],
        prompts: &[
            "I'd like to schedule an appointment",
            "I need to reschedule my appointment",
            "I have a question about my treatment plan",
            "I need to update my insurance information",
            "I'd like to discuss my recent visit",
        ],
    },
    PromptCategory {
        name: "legal",
        keywords: &["lawyer", "attorney"],
        prompts: &[
            "I need legal advice about a matter",
            "I'd like to schedule a consultation",
            "I have questions about my case",
            "I need to discuss contract terms",
            "I'd like to update you on recent developments",
        ],
    },
    PromptCategory {
        name: "accounting",
        keywords: &["accountant", "cpa"],
        prompts: &[
            "I need help with my tax preparation",
            "I have questions about my financial statements",
            "I'd like to discuss business planning",
            "I need help with bookkeeping",
            "I'd like to schedule a financial review",
        ],
    },
    PromptCategory {
        name: "real_estate",
        keywords: &["real estate", "realtor"],
        prompts: &[
            "I'm interested in buying a property",
            "I'd like to list my property for sale",
            "I have questions about the market",
            "I need help with property management",
            "I'd like to schedule a property viewing",
        ],
    },
    PromptCategory {
        name: "education",
        keywords: &["teacher", "professor"],
        prompts: &[
            "I have questions about the course material",
            "I'd like to discuss my progress",
            "I need help with an assignment",
            "I'd like to schedule office hours",
            "I have feedback about the class",
        ],
    },
    PromptCategory {
        name: "consulting",
        keywords: &["consultant", "advisor"],
        prompts: &[
            "I need advice on a business decision",
            "I'd like to discuss strategy options",
            "I need help with project planning",
            "I'd like to schedule a consultation",
            "I have questions about implementation",
        ],
    },
];

/// Lookup of call prompts by occupation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptCatalog;

impl PromptCatalog {
    pub fn new() -> Self {
        Self
    }

    /// First category whose keywords occur in `occupation` (case-insensitive).
    pub fn category_for(&self, occupation: &str) -> Option<&'static PromptCategory> {
        let lowered = occupation.to_lowercase();
        CATEGORIES
            .iter()
            .find(|category| category.keywords.iter().any(|kw| lowered.contains(kw)))
    }

    /// Prompts for a contact: category prompts (or the defaults) followed by
    /// the general openers.
    pub fn prompts_for(&self, occupation: Option<&str>) -> Vec<&'static str> {
        let specific = occupation
            .filter(|o| !o.trim().is_empty())
            .and_then(|o| self.category_for(o))
            .map(|category| category.prompts)
            .unwrap_or(DEFAULT_PROMPTS);

        specific.iter().chain(GENERAL_PROMPTS).copied().collect()
    }

    /// True when `prompt` is one this catalog can offer.
    pub fn contains(&self, prompt: &str) -> bool {
        GENERAL_PROMPTS
            .iter()
            .chain(DEFAULT_PROMPTS)
            .chain(CATEGORIES.iter().flat_map(|c| c.prompts))
            .any(|p| *p == prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medical_prompts() {
        let prompts = PromptCatalog::new().prompts_for(Some("Family Dentist"));
        assert_eq!(prompts.len(), 9);
        assert_eq!(prompts[0], "I'd like to schedule an appointment");
        assert_eq!(prompts[5], "Hello, how are you today?");
    }

    #[test]
    fn test_case_insensitive_keywords() {
        let catalog = PromptCatalog::new();
        assert_eq!(catalog.category_for("Senior ATTORNEY").unwrap().name, "legal");
        assert_eq!(catalog.category_for("Licensed Realtor").unwrap().name, "real_estate");
        assert_eq!(catalog.category_for("real estate agent").unwrap().name, "real_estate");
        assert_eq!(catalog.category_for("CPA").unwrap().name, "accounting");
    }

    #[test]
    fn test_first_category_wins() {
        // "doctor" (medical) is listed before "professor" (education)
        let catalog = PromptCatalog::new();
        assert_eq!(catalog.category_for("doctor and professor").unwrap().name, "medical");
    }

    #[test]
    fn test_unknown_or_missing_occupation_uses_defaults() {
        let catalog = PromptCatalog::new();
        for occupation in [None, Some(""), Some("Plumber")] {
            let prompts = catalog.prompts_for(occupation);
            assert_eq!(prompts.len(), DEFAULT_PROMPTS.len() + GENERAL_PROMPTS.len());
            assert_eq!(prompts[0], "I'd like to discuss business matters");
        }
    }

    #[test]
    fn test_contains() {
        let catalog = PromptCatalog::new();
        assert!(catalog.contains("I need help with bookkeeping"));
        assert!(catalog.contains("Do you have a moment to talk?"));
        assert!(!catalog.contains("Transfer all my money"));
    }
}
