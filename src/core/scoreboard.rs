//! Scoreboard business logic - the six weekly games, their points, and the rating.
//!
//! A [`Scoreboard`] always holds exactly one [`ScoreboardGame`] per [`Game`]. Values are
//! addressed through the fixed [`Game::ALL`] enumeration rather than by field name.

use crate::core::scoreboard_lock::WeekLock;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json, json};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata key recording where merged values came from.
pub const META_MERGED_FROM: &str = "mergedFrom";

/// Metadata key set when a draft tried to change promises of a promise-locked week.
pub const META_PROMISE_CHANGE_IGNORED: &str = "promiseChangeIgnored";

/// One of the six tracked metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    /// Course participants
    Cap,
    /// Community programs
    Cpc,
    /// Team 1 expansion
    T1x,
    /// Team 2 expansion
    T2x,
    /// Game in the world
    Gitw,
    /// Landmark forum
    Lf,
}

impl Game {
    /// All games in display order.
    pub const ALL: [Self; 6] = [
        Self::Cap,
        Self::Cpc,
        Self::T1x,
        Self::T2x,
        Self::Gitw,
        Self::Lf,
    ];

    /// Key used in payloads and column names.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Cap => "cap",
            Self::Cpc => "cpc",
            Self::T1x => "t1x",
            Self::T2x => "t2x",
            Self::Gitw => "gitw",
            Self::Lf => "lf",
        }
    }

    /// Parses a payload key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|game| game.key() == key)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which value of a game is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Promised value
    Promise,
    /// Achieved value
    Actual,
    /// Promise as first made, before any later revision
    Original,
}

impl ValueKind {
    /// All value kinds in serialization order.
    pub const ALL: [Self; 3] = [Self::Promise, Self::Actual, Self::Original];

    /// Key of the payload block holding this kind.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Promise => "promise",
            Self::Actual => "actual",
            Self::Original => "original",
        }
    }
}

/// One metric for one week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardGame {
    game: Game,
    /// Promised value
    pub promise: Option<i64>,
    /// Achieved value
    pub actual: Option<i64>,
    /// Promise as first made
    pub original_promise: Option<i64>,
}

impl ScoreboardGame {
    /// Creates a game with no values.
    #[must_use]
    pub const fn new(game: Game) -> Self {
        Self {
            game,
            promise: None,
            actual: None,
            original_promise: None,
        }
    }

    /// Which metric this is.
    #[must_use]
    pub const fn game(&self) -> Game {
        self.game
    }

    /// Reads one value.
    #[must_use]
    pub const fn value(&self, kind: ValueKind) -> Option<i64> {
        match kind {
            ValueKind::Promise => self.promise,
            ValueKind::Actual => self.actual,
            ValueKind::Original => self.original_promise,
        }
    }

    /// Writes one value.
    pub const fn set(&mut self, kind: ValueKind, value: Option<i64>) {
        match kind {
            ValueKind::Promise => self.promise = value,
            ValueKind::Actual => self.actual = value,
            ValueKind::Original => self.original_promise = value,
        }
    }

    /// Percent of the promise achieved, clamped to `0..=100`.
    ///
    /// A missing or non-positive promise yields `0` whatever the actual.
    #[must_use]
    pub fn percent(&self) -> i64 {
        match self.promise {
            Some(promise) if promise > 0 => {
                let actual = self.actual.unwrap_or(0) as f64;
                let ratio = (actual / promise as f64 * 100.0).round();
                (ratio as i64).clamp(0, 100)
            }
            _ => 0,
        }
    }

    /// Points earned; course participants count double.
    #[must_use]
    pub fn points(&self) -> u32 {
        let base = points_for_percent(self.percent());
        if self.game == Game::Cap { base * 2 } else { base }
    }
}

/// Stepped points for a percentage.
#[must_use]
pub const fn points_for_percent(percent: i64) -> u32 {
    match percent {
        100.. => 4,
        90..=99 => 3,
        80..=89 => 2,
        75..=79 => 1,
        _ => 0,
    }
}

/// Ordinal label summarizing a scoreboard's points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rating {
    /// Fewer than 9 points
    Ineffective,
    /// 9 to 15 points
    MarginallyEffective,
    /// 16 to 21 points
    Effective,
    /// 22 to 27 points
    HighPerforming,
    /// All 28 points
    Powerful,
}

impl Rating {
    /// Maps a point total to its rating.
    #[must_use]
    pub const fn from_points(points: u32) -> Self {
        match points {
            28.. => Self::Powerful,
            22..=27 => Self::HighPerforming,
            16..=21 => Self::Effective,
            9..=15 => Self::MarginallyEffective,
            _ => Self::Ineffective,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Powerful => "Powerful",
            Self::HighPerforming => "High Performing",
            Self::Effective => "Effective",
            Self::MarginallyEffective => "Marginally Effective",
            Self::Ineffective => "Ineffective",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The six games of one center-week plus free-form annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoreboard {
    games: [ScoreboardGame; 6],
    meta: BTreeMap<String, Json>,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::blank()
    }
}

impl Scoreboard {
    /// A scoreboard with no values.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            games: Game::ALL.map(ScoreboardGame::new),
            meta: BTreeMap::new(),
        }
    }

    /// Reads the nested `promise`, `actual` and `original` blocks plus `meta`.
    ///
    /// Missing blocks or keys leave the corresponding values empty; keys that are not a
    /// game are ignored.
    pub fn from_json(data: &Json) -> Result<Self> {
        let object = data
            .as_object()
            .ok_or_else(|| Error::invalid_field("scoreboard", "must be a JSON object"))?;

        let mut scoreboard = Self::blank();
        for kind in ValueKind::ALL {
            let Some(block) = object.get(kind.key()) else {
                continue;
            };
            if block.is_null() {
                continue;
            }
            let block = block.as_object().ok_or_else(|| {
                Error::invalid_field(kind.key(), "must be an object keyed by game")
            })?;
            for (key, raw) in block {
                let Some(game) = Game::from_key(key) else {
                    continue;
                };
                let value = read_game_value(raw)
                    .ok_or_else(|| Error::invalid_field(format!("{}.{key}", kind.key()), raw.to_string()))?;
                scoreboard.set_value(game, kind, value);
            }
        }
        if let Some(Json::Object(meta)) = object.get("meta") {
            scoreboard
                .meta
                .extend(meta.iter().map(|(key, value)| (key.clone(), value.clone())));
        }
        Ok(scoreboard)
    }

    /// Sets one value of one game.
    pub const fn set_value(&mut self, game: Game, kind: ValueKind, value: Option<i64>) {
        self.games[game.index()].set(kind, value);
    }

    /// Reads one value of one game.
    #[must_use]
    pub const fn value(&self, game: Game, kind: ValueKind) -> Option<i64> {
        self.games[game.index()].value(kind)
    }

    /// The game entry for `game`.
    #[must_use]
    pub const fn game(&self, game: Game) -> &ScoreboardGame {
        &self.games[game.index()]
    }

    /// Calls `f` for every game in display order.
    pub fn each_game<F>(&self, f: F)
    where
        F: FnMut(&ScoreboardGame),
    {
        self.games.iter().for_each(f);
    }

    /// Total points, `0..=28`.
    #[must_use]
    pub fn points(&self) -> u32 {
        self.games.iter().map(ScoreboardGame::points).sum()
    }

    /// Percent achieved for one game.
    #[must_use]
    pub fn percent(&self, game: Game) -> i64 {
        self.game(game).percent()
    }

    /// Rating for the current point total.
    #[must_use]
    pub fn rating(&self) -> Rating {
        Rating::from_points(self.points())
    }

    /// Whether every game has a value of `kind`.
    #[must_use]
    pub fn is_complete(&self, kind: ValueKind) -> bool {
        self.games.iter().all(|game| game.value(kind).is_some())
    }

    /// Whether any game has a value of `kind`.
    #[must_use]
    pub fn has_any(&self, kind: ValueKind) -> bool {
        self.games.iter().any(|game| game.value(kind).is_some())
    }

    /// Compares the game values of two scoreboards, ignoring metadata.
    #[must_use]
    pub fn same_values(&self, other: &Self) -> bool {
        self.games == other.games
    }

    /// Reads a metadata annotation.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&Json> {
        self.meta.get(key)
    }

    /// Writes a metadata annotation.
    pub fn set_meta(&mut self, key: impl Into<String>, value: Json) {
        self.meta.insert(key.into(), value);
    }

    /// Merges a draft into this scoreboard according to the week's lock.
    ///
    /// When promises are locked only the actuals are taken from the draft; otherwise
    /// the draft replaces every value.
    pub fn merge_from(&mut self, draft: &Self, lock: WeekLock) {
        if lock.edit_promise {
            self.games = draft.games.clone();
            self.meta
                .extend(draft.meta.iter().map(|(key, value)| (key.clone(), value.clone())));
        } else {
            let mut ignored = false;
            for (mine, theirs) in self.games.iter_mut().zip(&draft.games) {
                ignored |= theirs.promise.is_some() && theirs.promise != mine.promise;
                mine.actual = theirs.actual;
            }
            if ignored {
                self.meta
                    .insert(META_PROMISE_CHANGE_IGNORED.to_string(), Json::Bool(true));
            }
        }
        self.meta
            .insert(META_MERGED_FROM.to_string(), Json::from("stash"));
    }

    /// Serializes to both consumer shapes.
    ///
    /// The flat `promise`/`actual` blocks are keyed by game; the `games` block nests
    /// every value under its game together with percent and points. The `original`
    /// block is omitted when no game has an original promise.
    #[must_use]
    pub fn to_json(&self) -> Json {
        let mut out = Map::new();
        for kind in ValueKind::ALL {
            if kind == ValueKind::Original && !self.has_any(ValueKind::Original) {
                continue;
            }
            let block: Map<String, Json> = self
                .games
                .iter()
                .map(|game| (game.game().key().to_string(), Json::from(game.value(kind))))
                .collect();
            out.insert(kind.key().to_string(), Json::Object(block));
        }

        let games: Map<String, Json> = self
            .games
            .iter()
            .map(|game| {
                (
                    game.game().key().to_string(),
                    json!({
                        "promise": game.promise,
                        "actual": game.actual,
                        "original": game.original_promise,
                        "percent": game.percent(),
                        "points": game.points(),
                    }),
                )
            })
            .collect();
        out.insert("games".to_string(), Json::Object(games));
        out.insert("points".to_string(), Json::from(self.points()));
        out.insert("rating".to_string(), Json::from(self.rating().label()));
        out.insert(
            "meta".to_string(),
            Json::Object(self.meta.clone().into_iter().collect()),
        );
        Json::Object(out)
    }
}

fn read_game_value(raw: &Json) -> Option<Option<i64>> {
    match raw {
        Json::Null => Some(None),
        Json::Number(number) => number.as_i64().map(Some),
        Json::String(text) if text.trim().is_empty() => Some(None),
        Json::String(text) => text.trim().parse().ok().map(Some),
        _ => None,
    }
}
