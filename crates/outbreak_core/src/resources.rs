//! Resource kinds and fixed-size resource bundles.
//!
//! Units carry a bundle as inventory, cities hold one as stock, and the map
//! stores bundles as scavenge piles. All arithmetic is unsigned and
//! saturating; spending checks affordability first.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A kind of resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Feeds survivors and pays for recruits.
    Food,
    /// Pays for structures and upgrades.
    Materials,
    /// Produced by hospitals, needed for medics and the cure.
    Medicine,
    /// The unique cure sample from the research lab.
    Cure,
}

impl Resource {
    /// Every resource, in bundle order.
    pub const ALL: [Self; 4] = [Self::Food, Self::Materials, Self::Medicine, Self::Cure];

    /// Index into a [`ResourceBundle`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name used in save files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Materials => "materials",
            Self::Medicine => "medicine",
            Self::Cure => "cure",
        }
    }

    /// Parse a save-file name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Amount of each resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceBundle {
    amounts: [u32; 4],
}

impl ResourceBundle {
    /// Empty bundle.
    pub const EMPTY: Self = Self { amounts: [0; 4] };

    /// The lone cure sample planted at the research lab.
    pub const CURE_SAMPLE: Self = Self {
        amounts: [0, 0, 0, 1],
    };

    /// Create a bundle from explicit amounts.
    #[must_use]
    pub const fn new(food: u32, materials: u32, medicine: u32, cure: u32) -> Self {
        Self {
            amounts: [food, materials, medicine, cure],
        }
    }

    /// Food and materials only.
    #[must_use]
    pub const fn supplies(food: u32, materials: u32) -> Self {
        Self::new(food, materials, 0, 0)
    }

    /// Materials only.
    #[must_use]
    pub const fn materials(materials: u32) -> Self {
        Self::new(0, materials, 0, 0)
    }

    /// Amount of one resource.
    #[must_use]
    pub const fn get(&self, resource: Resource) -> u32 {
        self.amounts[resource.index()]
    }

    /// Set the amount of one resource.
    pub fn set(&mut self, resource: Resource, amount: u32) {
        self.amounts[resource.index()] = amount;
    }

    /// Add to one resource.
    pub fn add(&mut self, resource: Resource, amount: u32) {
        let slot = &mut self.amounts[resource.index()];
        *slot = slot.saturating_add(amount);
    }

    /// Add every resource of `other`.
    pub fn merge(&mut self, other: &Self) {
        for r in Resource::ALL {
            self.add(r, other.get(r));
        }
    }

    /// Whether every amount is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amounts.iter().all(|&a| a == 0)
    }

    /// Sum over all resources.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.amounts.iter().map(|&a| u64::from(a)).sum()
    }

    /// Whether this bundle covers `cost` in every resource.
    #[must_use]
    pub fn can_afford(&self, cost: &Self) -> bool {
        Resource::ALL.iter().all(|&r| self.get(r) >= cost.get(r))
    }

    /// Deduct `cost` if affordable. Returns `false` and leaves the bundle
    /// untouched otherwise.
    pub fn spend(&mut self, cost: &Self) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for r in Resource::ALL {
            self.amounts[r.index()] -= cost.get(r);
        }
        true
    }

    /// Move everything out, leaving this bundle empty.
    pub fn take_all(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Scale every amount by `percent / 100`, truncating.
    #[must_use]
    pub fn scaled_percent(&self, percent: u32) -> Self {
        let mut out = *self;
        for slot in &mut out.amounts {
            *slot = u32::try_from(u64::from(*slot) * u64::from(percent) / 100).unwrap_or(u32::MAX);
        }
        out
    }

    /// Non-zero entries in bundle order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|&(_, a)| a > 0)
    }
}

impl fmt::Display for ResourceBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("nothing");
        }
        let mut first = true;
        for (r, amount) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{amount} {r}")?;
            first = false;
        }
        Ok(())
    }
}
