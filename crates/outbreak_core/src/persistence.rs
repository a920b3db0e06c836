//! Save files.
//!
//! A save is a JSON document decoupled from the runtime types: coordinates
//! become `"x,y"` keys, terrain becomes integers and movement points become
//! decimals. The visible layer of the fog is not stored; it is recomputed
//! on load. Difficulty-derived constants are never stored either.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

use crate::city::{Building, City, StructureKind};
use crate::config::Difficulty;
use crate::error::{GameError, Result};
use crate::game_state::GameState;
use crate::map_generation::GeneratedMap;
use crate::math::{fixed_decimal_serde, Coord, Fixed};
use crate::resources::{Resource, ResourceBundle};
use crate::tech::{TechId, TechProgress};
use crate::terrain::{TileGrid, TileType};
use crate::unit::{Team, Unit, UnitId, UnitType};
use crate::visibility::FogOfWar;

/// Newest save format this build writes and reads.
pub const SAVE_VERSION: u32 = 1;

/// File name used by [`SaveStore::autosave`].
pub const AUTOSAVE_NAME: &str = "autosave.json";

/// Resource amounts keyed by resource name, zero entries omitted.
pub type ResourceMap = BTreeMap<Resource, u32>;

fn bundle_to_map(bundle: &ResourceBundle) -> ResourceMap {
    bundle.iter().collect()
}

fn map_to_bundle(map: &ResourceMap) -> ResourceBundle {
    let mut bundle = ResourceBundle::EMPTY;
    for (&resource, &amount) in map {
        bundle.add(resource, amount);
    }
    bundle
}

fn parse_key(key: &str) -> Result<Coord> {
    key.parse()
        .map_err(|e| GameError::InvalidSave(format!("bad coordinate key: {e}")))
}

const fn default_version() -> u32 {
    SAVE_VERSION
}

const fn default_size() -> i32 {
    1
}

const fn default_level() -> u32 {
    1
}

const fn default_xp_threshold() -> u32 {
    crate::unit::BASE_XP_TO_LEVEL
}

const fn default_building_health() -> i32 {
    20
}

const fn default_city_health() -> i32 {
    crate::city::CITY_BASE_HEALTH
}

/// On-disk form of a whole game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Turn counter.
    pub turn: u32,
    /// Side whose phase it is.
    pub current_team: Team,
    /// Whether the cure was made.
    #[serde(default)]
    pub game_won: bool,
    /// Difficulty name.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Research lab as `[x, y]`.
    pub research_lab_pos: Option<[i32; 2]>,
    /// Terrain codes, row by row.
    pub map_grid: Vec<Vec<u8>>,
    /// Scavenge piles keyed by `"x,y"`.
    pub resources: BTreeMap<String, ResourceMap>,
    /// Explored flags, row by row.
    pub explored: Vec<Vec<bool>>,
    /// Every unit.
    pub units: Vec<UnitData>,
    /// Every city.
    pub cities: Vec<CityData>,
    /// Unspent tech points.
    #[serde(default)]
    pub tech_points: u32,
    /// Researched techs.
    #[serde(default)]
    pub researched: Vec<TechId>,
    /// Id counter for new units.
    #[serde(default)]
    pub next_unit_id: Option<u32>,
}

/// On-disk form of a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitData {
    /// Unit id; assigned in list order when absent.
    #[serde(default)]
    pub id: Option<u32>,
    /// Anchor column.
    pub x: i32,
    /// Anchor row.
    pub y: i32,
    /// Kind of unit.
    pub unit_type: UnitType,
    /// Owning side.
    pub team: Team,
    /// Current health.
    pub health: i32,
    /// Health cap.
    pub max_health: i32,
    /// Attack power.
    pub attack_power: i32,
    /// Movement points left.
    #[serde(with = "fixed_decimal_serde")]
    pub moves_remaining: Fixed,
    /// Movement points per turn; the stat table value when absent.
    #[serde(default)]
    pub max_moves: Option<i32>,
    /// Carried resources.
    #[serde(default)]
    pub inventory: ResourceMap,
    /// Experience.
    #[serde(default)]
    pub xp: u32,
    /// Level.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Experience threshold for the next level.
    #[serde(default = "default_xp_threshold")]
    pub xp_to_next_level: u32,
    /// Footprint side.
    #[serde(default = "default_size")]
    pub size: i32,
    /// Scout-visited tiles as `[x, y]`.
    #[serde(default)]
    pub tiles_explored: Vec<[i32; 2]>,
    /// Zombie age.
    #[serde(default)]
    pub age_in_turns: u32,
}

/// On-disk form of a structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Structure kind.
    #[serde(rename = "type")]
    pub kind: StructureKind,
    /// Terrain code under the structure.
    pub terrain: u8,
    /// Level.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Current health.
    #[serde(default = "default_building_health")]
    pub health: i32,
    /// Health cap.
    #[serde(default = "default_building_health")]
    pub max_health: i32,
}

/// On-disk form of a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityData {
    /// City column.
    pub x: i32,
    /// City row.
    pub y: i32,
    /// Name.
    pub name: String,
    /// Population.
    pub population: u32,
    /// Structure ledger.
    pub buildings: Vec<String>,
    /// Placed structures keyed by `"x,y"`.
    #[serde(default)]
    pub building_locations: BTreeMap<String, BuildingData>,
    /// Stockpile.
    #[serde(default)]
    pub resources: ResourceMap,
    /// City level.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Current health.
    #[serde(default = "default_city_health")]
    pub health: i32,
    /// Health cap.
    #[serde(default = "default_city_health")]
    pub max_health: i32,
}

impl UnitData {
    fn from_unit(unit: &Unit) -> Self {
        Self {
            id: Some(unit.id.0),
            x: unit.position.x,
            y: unit.position.y,
            unit_type: unit.unit_type,
            team: unit.team,
            health: unit.health,
            max_health: unit.max_health,
            attack_power: unit.attack_power,
            moves_remaining: unit.moves_remaining,
            max_moves: Some(unit.max_moves),
            inventory: bundle_to_map(&unit.inventory),
            xp: unit.xp,
            level: unit.level,
            xp_to_next_level: unit.xp_to_next_level,
            size: unit.size,
            tiles_explored: unit.tiles_explored.iter().map(|c| [c.x, c.y]).collect(),
            age_in_turns: unit.age_in_turns,
        }
    }

    fn into_unit(self, id: UnitId, difficulty: Difficulty) -> Unit {
        let mut unit = Unit::new(
            id,
            self.unit_type,
            self.team,
            Coord::new(self.x, self.y),
            difficulty,
        );
        unit.health = self.health;
        unit.max_health = self.max_health;
        unit.attack_power = self.attack_power;
        if let Some(max_moves) = self.max_moves {
            unit.max_moves = max_moves;
        }
        unit.moves_remaining = self.moves_remaining.max(Fixed::ZERO);
        unit.inventory = map_to_bundle(&self.inventory);
        unit.xp = self.xp;
        unit.level = self.level;
        unit.xp_to_next_level = self.xp_to_next_level;
        unit.size = self.size;
        unit.tiles_explored = self
            .tiles_explored
            .iter()
            .map(|&[x, y]| Coord::new(x, y))
            .collect::<BTreeSet<_>>();
        unit.age_in_turns = self.age_in_turns;
        unit
    }
}

impl CityData {
    fn from_city(city: &City) -> Self {
        Self {
            x: city.position.x,
            y: city.position.y,
            name: city.name.clone(),
            population: city.population,
            buildings: city.buildings.clone(),
            building_locations: city
                .building_locations
                .iter()
                .map(|(tile, b)| {
                    (
                        tile.to_string(),
                        BuildingData {
                            kind: b.kind,
                            terrain: b.terrain.code(),
                            level: b.level,
                            health: b.health,
                            max_health: b.max_health,
                        },
                    )
                })
                .collect(),
            resources: bundle_to_map(&city.resources),
            level: city.level,
            health: city.health,
            max_health: city.max_health,
        }
    }

    fn into_city(self) -> Result<City> {
        let mut city = City::new(self.name, Coord::new(self.x, self.y));
        city.population = self.population;
        city.buildings = self.buildings;
        for (key, data) in self.building_locations {
            let tile = parse_key(&key)?;
            let terrain = TileType::from_code(data.terrain).ok_or_else(|| {
                GameError::InvalidSave(format!("unknown terrain code {} at {tile}", data.terrain))
            })?;
            let mut building = Building::new(data.kind, terrain);
            building.level = data.level;
            building.health = data.health;
            building.max_health = data.max_health;
            city.building_locations.insert(tile, building);
        }
        city.resources = map_to_bundle(&self.resources);
        city.level = self.level;
        city.health = self.health;
        city.max_health = self.max_health;
        Ok(city)
    }
}

impl SaveData {
    /// Capture a game state.
    #[must_use]
    pub fn from_state(state: &GameState) -> Self {
        Self {
            version: SAVE_VERSION,
            turn: state.turn,
            current_team: state.current_team,
            game_won: state.game_won,
            difficulty: state.difficulty,
            research_lab_pos: state.research_lab.map(|c| [c.x, c.y]),
            map_grid: state
                .grid
                .rows()
                .map(|row| row.iter().map(|t| t.code()).collect())
                .collect(),
            resources: state
                .resources
                .iter()
                .map(|(tile, bundle)| (tile.to_string(), bundle_to_map(bundle)))
                .collect(),
            explored: state.fog.explored_rows(),
            units: state.units.iter().map(UnitData::from_unit).collect(),
            cities: state.cities.iter().map(CityData::from_city).collect(),
            tech_points: state.techs.tech_points,
            researched: state.techs.researched.iter().copied().collect(),
            next_unit_id: Some(state.next_unit_id()),
        }
    }

    /// Validate and rebuild the game state, recomputing visibility.
    pub fn into_state(self) -> Result<GameState> {
        if self.version > SAVE_VERSION {
            return Err(GameError::UnsupportedSaveVersion {
                found: self.version,
                supported: SAVE_VERSION,
            });
        }

        let rows = self
            .map_grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&code| {
                        TileType::from_code(code).ok_or_else(|| {
                            GameError::InvalidSave(format!("unknown terrain code {code}"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        let grid = TileGrid::from_rows(rows)
            .ok_or_else(|| GameError::InvalidSave("map grid is empty or ragged".to_string()))?;
        let (width, height) = (grid.width(), grid.height());
        let fog = FogOfWar::from_explored_rows(width, height, &self.explored).ok_or_else(|| {
            GameError::InvalidSave(format!("explored grid does not match the {width}x{height} map"))
        })?;

        let mut resources = BTreeMap::new();
        for (key, map) in &self.resources {
            let tile = parse_key(key)?;
            let bundle = map_to_bundle(map);
            if !bundle.is_empty() {
                resources.insert(tile, bundle);
            }
        }

        let mut state = GameState::from_map(
            GeneratedMap {
                grid,
                resources,
                research_lab: Coord::default(),
            },
            self.difficulty,
        );
        state.research_lab = self.research_lab_pos.map(|[x, y]| Coord::new(x, y));
        state.turn = self.turn;
        state.current_team = self.current_team;
        state.game_won = self.game_won;
        state.fog = fog;
        state.techs = TechProgress {
            tech_points: self.tech_points,
            researched: self.researched.into_iter().collect(),
        };

        let mut seen = HashSet::new();
        let mut next_id = 0;
        for (idx, data) in self.units.into_iter().enumerate() {
            let id = data
                .id
                .unwrap_or_else(|| u32::try_from(idx).unwrap_or(u32::MAX));
            if !seen.insert(id) {
                return Err(GameError::InvalidSave(format!("duplicate unit id {id}")));
            }
            let unit = data.into_unit(UnitId(id), self.difficulty);
            if !state.grid.footprint_in_bounds(unit.position, unit.size) {
                return Err(GameError::InvalidSave(format!(
                    "unit {} at {} is off the map",
                    unit.id, unit.position
                )));
            }
            next_id = next_id.max(id.saturating_add(1));
            state.units.push(unit);
        }
        state.set_next_unit_id(self.next_unit_id.unwrap_or(0).max(next_id));

        for data in self.cities {
            state.cities.push(data.into_city()?);
        }

        state.update_visibility();
        Ok(state)
    }
}

impl GameState {
    /// Serialize to pretty-printed save JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&SaveData::from_state(self))?)
    }

    /// Parse and validate save JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: SaveData = serde_json::from_str(json)?;
        data.into_state()
    }
}

/// Write JSON to a temporary sibling file, then rename it over `path`.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read JSON from `path`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// A save file found by [`SaveStore::list_saves`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEntry {
    /// File name, including the extension.
    pub name: String,
    /// Last modification time.
    pub modified: SystemTime,
}

/// Save files in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    /// Store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path for a save name; `.json` is appended when missing.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        let path = self.dir.join(name);
        if path.extension().is_some_and(|ext| ext == "json") {
            path
        } else {
            self.dir.join(format!("{name}.json"))
        }
    }

    /// Write a save. Returns the file path.
    pub fn save(&self, state: &GameState, name: &str) -> Result<PathBuf> {
        let path = self.path_for(name);
        write_json_atomic(&path, &SaveData::from_state(state))?;
        info!(path = %path.display(), turn = state.turn, "game saved");
        Ok(path)
    }

    /// Overwrite the autosave.
    pub fn autosave(&self, state: &GameState) -> Result<PathBuf> {
        let path = self.path_for(AUTOSAVE_NAME);
        write_json_atomic(&path, &SaveData::from_state(state))?;
        debug!(path = %path.display(), turn = state.turn, "autosaved");
        Ok(path)
    }

    /// Load and validate a save.
    ///
    /// The loaded game autosaves back into this store.
    pub fn load(&self, name: &str) -> Result<GameState> {
        let path = self.path_for(name);
        let data: SaveData = read_json(&path)?;
        let mut state = data.into_state()?;
        state.set_autosave_dir(Some(self.dir.clone()));
        info!(path = %path.display(), turn = state.turn, "game loaded");
        Ok(state)
    }

    /// Save files in the directory, newest first.
    ///
    /// Leaderboard files and temporary files are skipped. A missing
    /// directory yields an empty list.
    pub fn list_saves(&self) -> Result<Vec<SaveEntry>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut saves = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".json") || is_leaderboard_file(&name) {
                continue;
            }
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            saves.push(SaveEntry {
                name,
                modified: meta.modified()?,
            });
        }
        saves.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(saves)
    }
}

fn is_leaderboard_file(name: &str) -> bool {
    name == crate::leaderboard::HIGH_SCORES_FILE || name.starts_with(crate::leaderboard::CURE_FILE_PREFIX)
}
