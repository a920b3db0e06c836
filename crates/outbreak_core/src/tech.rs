//! Tech tree: a static prerequisite graph unlocked with tech points.
//!
//! Tech effects are not applied here. Unit, city and game-state formulas
//! query [`TechProgress::has`] and add their bonus when the tech is known.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ActionError, ActionResult};

/// Research discount from Research Documentation, as a percentage of the base cost.
const DOCUMENTED_COST_PERCENT: u32 = 70;

/// Branch of the tech tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechCategory {
    /// Unit upgrades.
    Units,
    /// City upgrades.
    City,
}

/// Identifier of a technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum TechId {
    ScavengingEfficiency,
    ScoutTraining,
    CombatTraining,
    TacticalMedicine,
    ArmorPlating,
    RapidResponse,
    AdvancedWeaponry,
    SuperSoldierProgram,
    Fortification,
    AdvancedFarming,
    IndustrialWorkshops,
    BasicMedicine,
    ResearchDocumentation,
    QuickStart,
    Watchtower,
    CureResearch,
    AutomatedDefenses,
    HelicopterTransport,
}

/// Static description of a technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechInfo {
    /// Stable snake_case key used in saves.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Base cost in tech points.
    pub cost: u32,
    /// One-line effect summary.
    pub description: &'static str,
    /// Techs that must be researched first.
    pub prerequisites: &'static [TechId],
    /// Tree branch.
    pub category: TechCategory,
}

impl TechId {
    /// Every tech, units branch first.
    pub const ALL: [Self; 18] = [
        Self::ScavengingEfficiency,
        Self::ScoutTraining,
        Self::CombatTraining,
        Self::TacticalMedicine,
        Self::ArmorPlating,
        Self::RapidResponse,
        Self::AdvancedWeaponry,
        Self::SuperSoldierProgram,
        Self::Fortification,
        Self::AdvancedFarming,
        Self::IndustrialWorkshops,
        Self::BasicMedicine,
        Self::ResearchDocumentation,
        Self::QuickStart,
        Self::Watchtower,
        Self::CureResearch,
        Self::AutomatedDefenses,
        Self::HelicopterTransport,
    ];

    /// Static data for this tech.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub const fn info(self) -> TechInfo {
        use TechCategory::{City, Units};
        let (key, name, cost, description, prerequisites, category): (
            _,
            _,
            _,
            _,
            &'static [TechId],
            _,
        ) = match self {
            Self::ScavengingEfficiency => (
                "scavenging_efficiency",
                "Scavenging Efficiency",
                10,
                "+25% resources from scavenging",
                &[],
                Units,
            ),
            Self::ScoutTraining => (
                "scout_training",
                "Scout Training",
                20,
                "Scouts gain +1 vision range",
                &[],
                Units,
            ),
            Self::CombatTraining => (
                "combat_training",
                "Combat Training",
                20,
                "Recruits start at level 2",
                &[],
                Units,
            ),
            Self::TacticalMedicine => (
                "tactical_medicine",
                "Tactical Medicine",
                20,
                "Medics heal +20 HP per action",
                &[Self::BasicMedicine],
                Units,
            ),
            Self::ArmorPlating => (
                "armor_plating",
                "Armor Plating",
                40,
                "Recruits gain +40 max HP",
                &[Self::CombatTraining],
                Units,
            ),
            Self::RapidResponse => (
                "rapid_response",
                "Rapid Response",
                40,
                "Recruits gain +1 movement point",
                &[Self::ScoutTraining],
                Units,
            ),
            Self::AdvancedWeaponry => (
                "advanced_weaponry",
                "Advanced Weaponry",
                30,
                "Soldiers gain +10 attack",
                &[Self::CombatTraining],
                Units,
            ),
            Self::SuperSoldierProgram => (
                "super_soldier_program",
                "Super Soldier Program",
                40,
                "Recruit elite super soldiers",
                &[Self::AdvancedWeaponry],
                Units,
            ),
            Self::Fortification => (
                "fortification",
                "Fortification",
                10,
                "Units on walls take 50% less damage",
                &[],
                City,
            ),
            Self::AdvancedFarming => (
                "advanced_farming",
                "Advanced Farming",
                10,
                "Farms produce +2 food per turn",
                &[],
                City,
            ),
            Self::IndustrialWorkshops => (
                "industrial_workshops",
                "Industrial Workshops",
                10,
                "Workshops produce +3 materials per turn",
                &[],
                City,
            ),
            Self::BasicMedicine => (
                "basic_medicine",
                "Basic Medicine",
                10,
                "Hospitals produce +2 medicine per turn",
                &[],
                City,
            ),
            Self::ResearchDocumentation => (
                "research_documentation",
                "Research Documentation",
                20,
                "Research costs reduced by 30%",
                &[],
                City,
            ),
            Self::QuickStart => (
                "quick_start",
                "Quick Start",
                20,
                "New cities start with +30 food and +30 materials",
                &[Self::Fortification],
                City,
            ),
            Self::Watchtower => (
                "watchtower",
                "Watchtower",
                20,
                "Cities gain +2 vision range",
                &[Self::ScoutTraining],
                City,
            ),
            Self::CureResearch => (
                "cure_research",
                "Cure Research",
                20,
                "Cure manufacturing costs 30% less",
                &[Self::TacticalMedicine],
                City,
            ),
            Self::AutomatedDefenses => (
                "automated_defenses",
                "Automated Defenses",
                30,
                "Cities and buildings damage adjacent zombies",
                &[Self::Fortification],
                City,
            ),
            Self::HelicopterTransport => (
                "helicopter_transport",
                "Helicopter Transport",
                50,
                "Units can fly between cities",
                &[Self::AutomatedDefenses],
                City,
            ),
        };
        TechInfo {
            key,
            name,
            cost,
            description,
            prerequisites,
            category,
        }
    }

    /// Stable snake_case key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        self.info().key
    }
}

impl fmt::Display for TechId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

impl FromStr for TechId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.key() == s)
            .ok_or_else(|| format!("unknown tech '{s}'"))
    }
}

/// Researched techs and the tech-point balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TechProgress {
    /// Unspent tech points.
    pub tech_points: u32,
    /// Researched techs.
    pub researched: BTreeSet<TechId>,
}

impl TechProgress {
    /// Whether a tech has been researched.
    #[must_use]
    pub fn has(&self, tech: TechId) -> bool {
        self.researched.contains(&tech)
    }

    /// Add tech points.
    pub fn earn(&mut self, points: u32) {
        self.tech_points = self.tech_points.saturating_add(points);
    }

    /// Cost of a tech after discounts.
    #[must_use]
    pub fn cost_of(&self, tech: TechId) -> u32 {
        let base = tech.info().cost;
        if self.has(TechId::ResearchDocumentation) {
            base * DOCUMENTED_COST_PERCENT / 100
        } else {
            base
        }
    }

    /// First prerequisite of `tech` that is still missing.
    #[must_use]
    pub fn missing_prerequisite(&self, tech: TechId) -> Option<TechId> {
        tech.info()
            .prerequisites
            .iter()
            .copied()
            .find(|&p| !self.has(p))
    }

    /// Whether `tech` could be researched right now.
    #[must_use]
    pub fn can_research(&self, tech: TechId) -> bool {
        self.check(tech).is_ok()
    }

    fn check(&self, tech: TechId) -> ActionResult<u32> {
        if self.has(tech) {
            return Err(ActionError::AlreadyResearched(tech));
        }
        if let Some(missing) = self.missing_prerequisite(tech) {
            return Err(ActionError::MissingPrerequisite { tech, missing });
        }
        let cost = self.cost_of(tech);
        if self.tech_points < cost {
            return Err(ActionError::InsufficientTechPoints {
                required: cost,
                available: self.tech_points,
            });
        }
        Ok(cost)
    }

    /// Research a tech, spending its cost. Returns the points spent.
    pub fn research(&mut self, tech: TechId) -> ActionResult<u32> {
        let cost = self.check(tech)?;
        self.tech_points -= cost;
        self.researched.insert(tech);
        Ok(cost)
    }

    /// Techs whose prerequisites are met and that are not yet researched.
    #[must_use]
    pub fn available(&self) -> Vec<TechId> {
        TechId::ALL
            .into_iter()
            .filter(|&t| !self.has(t) && self.missing_prerequisite(t).is_none())
            .collect()
    }
}
