//! Director profiles: the five competing design personas.
//!
//! The source system dispatches these by a dynamic profile lookup; here
//! they are a closed enum with an associated static table, per the
//! "tagged variants" design note — no virtual dispatch is needed because
//! the set of directors never grows at runtime.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DirectorType {
    Corporate,
    Freelancer,
    Veteran,
    AwardWinner,
    Newcomer,
}

impl DirectorType {
    pub const ALL: [DirectorType; 5] = [
        DirectorType::Corporate,
        DirectorType::Freelancer,
        DirectorType::Veteran,
        DirectorType::AwardWinner,
        DirectorType::Newcomer,
    ];

    /// The string tag used on the wire (prompt filenames, `director_type`
    /// field, evaluator winner matching).
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectorType::Corporate => "corporate",
            DirectorType::Freelancer => "freelancer",
            DirectorType::Veteran => "veteran",
            DirectorType::AwardWinner => "award_winner",
            DirectorType::Newcomer => "newcomer",
        }
    }

    pub fn profile(&self) -> &'static DirectorProfile {
        match self {
            DirectorType::Corporate => &CORPORATE,
            DirectorType::Freelancer => &FREELANCER,
            DirectorType::Veteran => &VETERAN,
            DirectorType::AwardWinner => &AWARD_WINNER,
            DirectorType::Newcomer => &NEWCOMER,
        }
    }
}

/// Descriptive and numeric tendencies for one director persona.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DirectorProfile {
    pub director_type: DirectorType,
    pub display_name: &'static str,
    pub description: &'static str,
    pub risk_tolerance: f64,
    pub commercial_focus: f64,
    pub artistic_focus: f64,
    pub innovation_focus: f64,
    pub weight: f64,
}

static CORPORATE: DirectorProfile = DirectorProfile {
    director_type: DirectorType::Corporate,
    display_name: "Corporate Director",
    description: "Favors safe, broadly commercial choices; optimizes for \
        brand-friendly pacing and clear messaging over artistic risk.",
    risk_tolerance: 0.2,
    commercial_focus: 0.9,
    artistic_focus: 0.3,
    innovation_focus: 0.2,
    weight: 1.0,
};

static FREELANCER: DirectorProfile = DirectorProfile {
    director_type: DirectorType::Freelancer,
    display_name: "Freelancer Director",
    description: "Pragmatic generalist; balances budget-conscious execution \
        with a modest amount of stylistic flair.",
    risk_tolerance: 0.5,
    commercial_focus: 0.5,
    artistic_focus: 0.5,
    innovation_focus: 0.4,
    weight: 1.0,
};

static VETERAN: DirectorProfile = DirectorProfile {
    director_type: DirectorType::Veteran,
    display_name: "Veteran Director",
    description: "Decades of craft; leans on proven structure and reliable \
        technique over experimentation.",
    risk_tolerance: 0.3,
    commercial_focus: 0.6,
    artistic_focus: 0.7,
    innovation_focus: 0.3,
    weight: 1.1,
};

static AWARD_WINNER: DirectorProfile = DirectorProfile {
    director_type: DirectorType::AwardWinner,
    display_name: "Award-Winning Director",
    description: "Prioritizes artistic merit and innovation; willing to \
        trade commercial safety for a distinctive result.",
    risk_tolerance: 0.7,
    commercial_focus: 0.3,
    artistic_focus: 0.95,
    innovation_focus: 0.8,
    weight: 1.2,
};

static NEWCOMER: DirectorProfile = DirectorProfile {
    director_type: DirectorType::Newcomer,
    display_name: "Newcomer Director",
    description: "Unproven but hungry; highest risk tolerance and \
        innovation focus, least predictable output quality.",
    risk_tolerance: 0.9,
    commercial_focus: 0.4,
    artistic_focus: 0.6,
    innovation_focus: 0.9,
    weight: 0.8,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_director_has_a_profile() {
        for d in DirectorType::ALL {
            let p = d.profile();
            assert_eq!(p.director_type, d);
            assert!(p.weight > 0.0);
        }
    }

    #[test]
    fn as_str_is_stable_for_wire_matching() {
        assert_eq!(DirectorType::AwardWinner.as_str(), "award_winner");
    }
}
