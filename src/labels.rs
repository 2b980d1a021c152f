//! Detection label taxonomy.
//!
//! The two closed label sets emitted by the field device's model live here and
//! nowhere else. Classification, chart colouring, activity badges and the
//! advice lookup all read from these tables.

pub const HEALTHY: &str = "Healthy";
pub const INSECT_BITE: &str = "Insect bite";
pub const SPOTTING: &str = "Spotting";
pub const WILTING: &str = "Wilting";
pub const YELLOWING: &str = "Yellowing";

pub const BENEFICIAL_BEE: &str = "Beneficial Bee";
pub const BENEFICIAL_LACEWING_LARVAE: &str = "Beneficial Lacewing Larvae";
pub const BENEFICIAL_LADYBUG: &str = "Beneficial Ladybug";
pub const BENEFICIAL_LARVAE: &str = "Beneficial Larvae";
pub const INFECTED_APHID: &str = "Infected Aphid";
pub const INFECTED_FLEA_BEETLE: &str = "Infected Flea Beetle";
pub const INFECTED_PUMPKIN_BEETLE: &str = "Infected Pumpkin Beetle";

/// Crop-condition labels. `Healthy` is the only non-affected member.
pub const CROP_LABELS: [&str; 5] = [HEALTHY, INSECT_BITE, SPOTTING, WILTING, YELLOWING];

pub const INSECT_LABELS: [&str; 7] = [
    BENEFICIAL_BEE,
    BENEFICIAL_LACEWING_LARVAE,
    BENEFICIAL_LADYBUG,
    BENEFICIAL_LARVAE,
    INFECTED_APHID,
    INFECTED_FLEA_BEETLE,
    INFECTED_PUMPKIN_BEETLE,
];

const BENEFICIAL_PREFIX: &str = "Beneficial ";
const INFECTED_PREFIX: &str = "Infected ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bucket {
    CropHealthy,
    CropUnhealthy,
    InsectSpecies(&'static str),
    Unclassified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    Crop,
    Insect,
}

pub fn classify(label: &str) -> Bucket {
    if label == HEALTHY {
        return Bucket::CropHealthy;
    }
    if CROP_LABELS.contains(&label) {
        return Bucket::CropUnhealthy;
    }
    match INSECT_LABELS.iter().find(|known| **known == label) {
        Some(known) => Bucket::InsectSpecies(known),
        None => Bucket::Unclassified,
    }
}

pub fn kind_of(label: &str) -> Option<LabelKind> {
    if CROP_LABELS.contains(&label) {
        Some(LabelKind::Crop)
    } else if INSECT_LABELS.contains(&label) {
        Some(LabelKind::Insect)
    } else {
        None
    }
}

pub fn is_beneficial(label: &str) -> bool {
    INSECT_LABELS.contains(&label) && label.starts_with(BENEFICIAL_PREFIX)
}

pub fn is_pest(label: &str) -> bool {
    INSECT_LABELS.contains(&label) && label.starts_with(INFECTED_PREFIX)
}

/// Care or treatment guidance shown next to a single detection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LabelAdvice {
    pub title: &'static str,
    pub description: &'static str,
    pub source: &'static str,
    pub video_id: Option<&'static str>,
}

const NO_ADVICE: LabelAdvice = LabelAdvice {
    title: "No Insight Available",
    description: "No specific insight is available for this detection.",
    source: "",
    video_id: None,
};

pub fn advice_for(label: &str) -> LabelAdvice {
    match label {
        HEALTHY => LabelAdvice {
            title: "Excellent Condition",
            description: "Your Pechay shows healthy growth. To maintain this, ensure it receives consistent water (about 1 inch per week) and is in well-drained soil. Pechay has shallow roots, so it can dry out quickly.",
            source: "Source: The Old Farmer's Almanac",
            video_id: Some("K_VAEy0og7E"),
        },
        INSECT_BITE => LabelAdvice {
            title: "Pest Damage Detected",
            description: "Small \"shot-holes\" are likely from Flea Beetles. Larger holes suggest Cabbage Loopers or Slugs. Apply an organic insecticide like Neem Oil or insecticidal soap, focusing on the undersides of leaves. Using floating row covers can prevent pests from reaching the plants.",
            source: "Source: University of Minnesota Extension",
            video_id: Some("CuAaExSOIh8"),
        },
        WILTING => LabelAdvice {
            title: "Wilting Detected",
            description: "Pechay wilts from water stress. Check the soil 2 inches deep. If dry, water deeply at the plant's base. If the soil is soggy, this indicates root rot from over-watering or poor drainage. Let the soil dry out and ensure good drainage.",
            source: "Source: UC Davis Vegetable Research Center",
            video_id: Some("On7_JGLnScs"),
        },
        SPOTTING => LabelAdvice {
            title: "Leaf Spot Detected",
            description: "This is likely a fungal or bacterial spot (like Alternaria or Cercospora). Remove and destroy affected leaves immediately (do not compost them). To prevent spread, avoid overhead watering and water the soil, not the leaves. Ensure good air circulation between plants.",
            source: "Source: Penn State Extension",
            video_id: Some("yOqCikg6-3k"),
        },
        YELLOWING => LabelAdvice {
            title: "Yellowing (Chlorosis)",
            description: "Yellowing of older, lower leaves often signals a Nitrogen deficiency. Yellowing on new leaves can indicate an Iron or Magnesium deficiency. This can also be caused by over-watering. Apply a balanced organic fertilizer and ensure the soil is not waterlogged.",
            source: "Source: Utah State University Extension",
            video_id: Some("PbvvHvWKht0"),
        },
        BENEFICIAL_BEE => LabelAdvice {
            title: "Beneficial: Bee",
            description: "This is a honey bee, a crucial pollinator for your crops. Bees are beneficial and should be protected. Avoid spraying pesticides when they are active (during the day). Planting flowers nearby can attract more.",
            source: "Source: The Xerces Society",
            video_id: Some("L2wh6s-P-2M"),
        },
        BENEFICIAL_LACEWING_LARVAE | BENEFICIAL_LARVAE => LabelAdvice {
            title: "Beneficial: Lacewing Larvae",
            description: "This is a lacewing larva, often called an \"Aphid Lion.\" It's a voracious predator of soft-bodied pests like aphids, thrips, and spider mites. This is a very good insect to have in your garden!",
            source: "Source: University of California Agriculture",
            video_id: Some("U54tBFqxufA"),
        },
        BENEFICIAL_LADYBUG => LabelAdvice {
            title: "Beneficial: Ladybug",
            description: "A welcome visitor! Ladybugs (or Lady Beetles) are famous for eating large quantities of aphids, protecting your plants from damage. Do not remove or spray this insect.",
            source: "Source: Cornell University",
            video_id: Some("0n_2_y-818I"),
        },
        INFECTED_APHID => LabelAdvice {
            title: "Pest: Aphids",
            description: "Aphids are small, sap-sucking insects that stunt plant growth and spread disease. A strong jet of water can knock them off. For heavy infestations, use insecticidal soap or Neem Oil. Encourage beneficial insects like ladybugs to control them naturally.",
            source: "Source: The Royal Horticultural Society",
            video_id: Some("G-b0g40-2vU"),
        },
        INFECTED_FLEA_BEETLE => LabelAdvice {
            title: "Pest: Flea Beetle",
            description: "Flea Beetles chew small, round \"shot-holes\" in leaves, which is especially damaging to young seedlings. Use floating row covers to protect plants. Dusting with Diatomaceous Earth (DE) or applying Neem Oil can help control them.",
            source: "Source: University of Minnesota Extension",
            video_id: Some("CuAaExSOIh8"),
        },
        INFECTED_PUMPKIN_BEETLE => LabelAdvice {
            title: "Pest: Pumpkin Beetle",
            description: "Also known as the Cucumber Beetle, this pest feeds on leaves, flowers, and fruit, and can transmit bacterial wilt. Remove them by hand (dropping into soapy water) in the morning. Use yellow sticky traps and apply organic pesticides like pyrethrin if necessary.",
            source: "Source: Australian Museum",
            video_id: Some("c1QYg5dYnF8"),
        },
        _ => NO_ADVICE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_label_lands_in_exactly_one_bucket() {
        for label in CROP_LABELS {
            assert!(!INSECT_LABELS.contains(&label), "{label} is in both sets");
            assert_ne!(classify(label), Bucket::Unclassified);
            assert!(!matches!(classify(label), Bucket::InsectSpecies(_)));
        }
        for label in INSECT_LABELS {
            assert_eq!(classify(label), Bucket::InsectSpecies(label));
        }
    }

    #[test]
    fn only_healthy_is_crop_healthy() {
        assert_eq!(classify("Healthy"), Bucket::CropHealthy);
        for label in [INSECT_BITE, SPOTTING, WILTING, YELLOWING] {
            assert_eq!(classify(label), Bucket::CropUnhealthy);
        }
    }

    #[test]
    fn unknown_labels_are_unclassified() {
        for label in ["Unknown", "", "healthy", "Infected Aphid ", "Aphid"] {
            assert_eq!(classify(label), Bucket::Unclassified, "label {label:?}");
            assert_eq!(kind_of(label), None);
        }
    }

    #[test]
    fn beneficial_and_pest_split_insects() {
        assert!(is_beneficial(BENEFICIAL_LADYBUG));
        assert!(!is_pest(BENEFICIAL_LADYBUG));
        assert!(is_pest(INFECTED_FLEA_BEETLE));
        assert!(!is_beneficial("Beneficial Wasp"));
        assert_eq!(
            INSECT_LABELS
                .iter()
                .filter(|l| is_beneficial(l) || is_pest(l))
                .count(),
            INSECT_LABELS.len()
        );
    }

    #[test]
    fn lacewing_labels_share_advice() {
        assert_eq!(
            advice_for(BENEFICIAL_LARVAE),
            advice_for(BENEFICIAL_LACEWING_LARVAE)
        );
    }

    #[test]
    fn unknown_label_gets_generic_advice() {
        let advice = advice_for("Grasshopper");
        assert_eq!(advice.title, "No Insight Available");
        assert_eq!(advice.video_id, None);
    }

    #[test]
    fn every_known_label_has_specific_advice() {
        for label in CROP_LABELS.iter().chain(INSECT_LABELS.iter()) {
            assert_ne!(advice_for(label), NO_ADVICE, "missing advice for {label}");
        }
    }
}
