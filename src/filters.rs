//! Query-string parameters of the list endpoints and the filters they
//! translate into.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::models::{Performance, Play};

// ?title=ham&genres=1,2&actors=3
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayQuery {
    pub title: Option<String>,
    pub genres: Option<String>,
    pub actors: Option<String>,
}

// ?date=2024-05-01&play=4
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformanceQuery {
    pub date: Option<String>,
    pub play: Option<String>,
}

/// OR within a dimension, AND across dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayFilter {
    pub title: Option<String>,
    pub genres: Option<BTreeSet<i64>>,
    pub actors: Option<BTreeSet<i64>>,
}

impl PlayFilter {
    pub fn matches(&self, play: &Play) -> bool {
        if let Some(title) = &self.title {
            if !play.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        if let Some(genres) = &self.genres {
            if !play.genres.iter().any(|g| genres.contains(g)) {
                return false;
            }
        }
        if let Some(actors) = &self.actors {
            if !play.actors.iter().any(|a| actors.contains(a)) {
                return false;
            }
        }
        true
    }
}

impl TryFrom<PlayQuery> for PlayFilter {
    type Error = Error;

    fn try_from(query: PlayQuery) -> Result<Self> {
        Ok(Self {
            title: non_empty(query.title),
            genres: non_empty(query.genres).map(|s| parse_ids("genres", &s)).transpose()?,
            actors: non_empty(query.actors).map(|s| parse_ids("actors", &s)).transpose()?,
        })
    }
}

/// Calendar day is taken in UTC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformanceFilter {
    pub date: Option<NaiveDate>,
    pub play_id: Option<i64>,
}

impl PerformanceFilter {
    pub fn matches(&self, performance: &Performance) -> bool {
        self.date.map_or(true, |d| performance.show_time.date_naive() == d)
            && self.play_id.map_or(true, |id| performance.play_id == id)
    }
}

impl TryFrom<PerformanceQuery> for PerformanceFilter {
    type Error = Error;

    fn try_from(query: PerformanceQuery) -> Result<Self> {
        let date = non_empty(query.date)
            .map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|_| Error::validation(format!("date must be YYYY-MM-DD, got {:?}", s)))
            })
            .transpose()?;
        let play_id = non_empty(query.play).map(|s| parse_id("play", &s)).transpose()?;

        Ok(Self { date, play_id })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_id(param: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::validation(format!("{} must be a list of integer ids, got {:?}", param, raw)))
}

fn parse_ids(param: &str, raw: &str) -> Result<BTreeSet<i64>> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_id(param, part))
        .collect()
}
