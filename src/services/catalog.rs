//! Halls, actors, genres, plays and performances.
//!
//! Reads are public. Every write checks the catalog policy first.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::filters::{PerformanceFilter, PlayFilter};
use crate::models::{
    Actor, ActorInput, Genre, GenreInput, Hall, HallInput, Performance, PerformanceDetail,
    PerformanceInput, PerformanceSummary, Play, PlayDetail, PlayInput, PlayListItem,
};
use crate::policy::{self, Resource};
use crate::store::Store;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

fn viewable(viewer: Option<&RequestContext>) -> Result<()> {
    if policy::can_view(viewer, Resource::Catalog) {
        Ok(())
    } else {
        Err(Error::forbidden())
    }
}

fn staff_only(ctx: &RequestContext) -> Result<()> {
    policy::ensure_can_modify(Some(ctx), Resource::Catalog)
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // --- Halls ---

    pub async fn list_halls(&self, viewer: Option<&RequestContext>) -> Result<Vec<Hall>> {
        viewable(viewer)?;
        self.store.list_halls().await
    }

    pub async fn get_hall(&self, viewer: Option<&RequestContext>, id: i64) -> Result<Hall> {
        viewable(viewer)?;
        self.store.get_hall(id).await?.ok_or_else(|| Error::not_found("hall", id))
    }

    pub async fn create_hall(&self, ctx: &RequestContext, input: &HallInput) -> Result<Hall> {
        staff_only(ctx)?;
        input.validate()?;
        let hall = self.store.create_hall(input).await?;
        info!("Hall {} created ({} x {})", hall.id, hall.rows, hall.seats_in_row);
        Ok(hall)
    }

    pub async fn update_hall(&self, ctx: &RequestContext, id: i64, input: &HallInput) -> Result<Hall> {
        staff_only(ctx)?;
        input.validate()?;
        self.store.update_hall(id, input).await
    }

    pub async fn delete_hall(&self, ctx: &RequestContext, id: i64) -> Result<()> {
        staff_only(ctx)?;
        self.store.delete_hall(id).await
    }

    // --- Actors ---

    pub async fn list_actors(&self, viewer: Option<&RequestContext>) -> Result<Vec<Actor>> {
        viewable(viewer)?;
        self.store.list_actors().await
    }

    pub async fn get_actor(&self, viewer: Option<&RequestContext>, id: i64) -> Result<Actor> {
        viewable(viewer)?;
        self.store.get_actor(id).await?.ok_or_else(|| Error::not_found("actor", id))
    }

    pub async fn create_actor(&self, ctx: &RequestContext, input: &ActorInput) -> Result<Actor> {
        staff_only(ctx)?;
        input.validate()?;
        self.store.create_actor(input).await
    }

    pub async fn update_actor(&self, ctx: &RequestContext, id: i64, input: &ActorInput) -> Result<Actor> {
        staff_only(ctx)?;
        input.validate()?;
        self.store.update_actor(id, input).await
    }

    pub async fn delete_actor(&self, ctx: &RequestContext, id: i64) -> Result<()> {
        staff_only(ctx)?;
        self.store.delete_actor(id).await
    }

    // --- Genres ---

    pub async fn list_genres(&self, viewer: Option<&RequestContext>) -> Result<Vec<Genre>> {
        viewable(viewer)?;
        self.store.list_genres().await
    }

    pub async fn get_genre(&self, viewer: Option<&RequestContext>, id: i64) -> Result<Genre> {
        viewable(viewer)?;
        self.store.get_genre(id).await?.ok_or_else(|| Error::not_found("genre", id))
    }

    pub async fn create_genre(&self, ctx: &RequestContext, input: &GenreInput) -> Result<Genre> {
        staff_only(ctx)?;
        input.validate()?;
        self.store.create_genre(input).await
    }

    pub async fn update_genre(&self, ctx: &RequestContext, id: i64, input: &GenreInput) -> Result<Genre> {
        staff_only(ctx)?;
        input.validate()?;
        self.store.update_genre(id, input).await
    }

    pub async fn delete_genre(&self, ctx: &RequestContext, id: i64) -> Result<()> {
        staff_only(ctx)?;
        self.store.delete_genre(id).await
    }

    // --- Plays ---

    /// Title is a case-insensitive substring; genres and actors match when
    /// the play has at least one of the requested ids.
    pub async fn list_plays(&self, viewer: Option<&RequestContext>, filter: &PlayFilter) -> Result<Vec<PlayListItem>> {
        viewable(viewer)?;
        let plays = self.store.list_plays(filter).await?;

        let actor_ids: Vec<i64> = plays.iter().flat_map(|p| p.actors.iter().copied()).collect();
        let genre_ids: Vec<i64> = plays.iter().flat_map(|p| p.genres.iter().copied()).collect();
        let actors: HashMap<i64, Actor> =
            self.store.actors_by_ids(&actor_ids).await?.into_iter().map(|a| (a.id, a)).collect();
        let genres: HashMap<i64, Genre> =
            self.store.genres_by_ids(&genre_ids).await?.into_iter().map(|g| (g.id, g)).collect();

        Ok(plays.into_iter().map(|play| list_item(play, &actors, &genres)).collect())
    }

    pub async fn get_play(&self, viewer: Option<&RequestContext>, id: i64) -> Result<PlayDetail> {
        viewable(viewer)?;
        let play = self.store.get_play(id).await?.ok_or_else(|| Error::not_found("play", id))?;
        let actors = self.store.actors_by_ids(&play.actors).await?;
        let genres = self.store.genres_by_ids(&play.genres).await?;

        Ok(PlayDetail { id: play.id, title: play.title, description: play.description, actors, genres })
    }

    pub async fn create_play(&self, ctx: &RequestContext, input: &PlayInput) -> Result<Play> {
        staff_only(ctx)?;
        input.validate()?;
        let play = self.store.create_play(input).await?;
        info!("Play {} created: {}", play.id, play.title);
        Ok(play)
    }

    pub async fn update_play(&self, ctx: &RequestContext, id: i64, input: &PlayInput) -> Result<Play> {
        staff_only(ctx)?;
        input.validate()?;
        self.store.update_play(id, input).await
    }

    pub async fn delete_play(&self, ctx: &RequestContext, id: i64) -> Result<()> {
        staff_only(ctx)?;
        self.store.delete_play(id).await
    }

    // --- Performances ---

    pub async fn list_performances(&self, viewer: Option<&RequestContext>, filter: &PerformanceFilter) -> Result<Vec<PerformanceSummary>> {
        viewable(viewer)?;
        self.store.list_performances(filter).await
    }

    pub async fn get_performance(&self, viewer: Option<&RequestContext>, id: i64) -> Result<PerformanceDetail> {
        viewable(viewer)?;
        let performance = self
            .store
            .get_performance(id)
            .await?
            .ok_or_else(|| Error::not_found("performance", id))?;
        let hall = self.get_hall(viewer, performance.hall_id).await?;
        let play = self.store.get_play(performance.play_id).await?.ok_or_else(|| Error::not_found("play", performance.play_id))?;
        let actors: HashMap<i64, Actor> =
            self.store.actors_by_ids(&play.actors).await?.into_iter().map(|a| (a.id, a)).collect();
        let genres: HashMap<i64, Genre> =
            self.store.genres_by_ids(&play.genres).await?.into_iter().map(|g| (g.id, g)).collect();
        let taken_places = self.store.taken_places(id).await?;

        Ok(PerformanceDetail {
            id: performance.id,
            play: list_item(play, &actors, &genres),
            hall,
            show_time: performance.show_time,
            taken_places,
        })
    }

    pub async fn create_performance(&self, ctx: &RequestContext, input: &PerformanceInput) -> Result<Performance> {
        staff_only(ctx)?;
        input.validate()?;
        let performance = self.store.create_performance(input).await?;
        info!("Performance {} scheduled in hall {} at {}", performance.id, performance.hall_id, performance.show_time);
        Ok(performance)
    }

    pub async fn update_performance(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: &PerformanceInput,
    ) -> Result<Performance> {
        staff_only(ctx)?;
        input.validate()?;
        self.store.update_performance(id, input).await
    }

    pub async fn delete_performance(&self, ctx: &RequestContext, id: i64) -> Result<()> {
        staff_only(ctx)?;
        self.store.delete_performance(id).await
    }
}

fn list_item(play: Play, actors: &HashMap<i64, Actor>, genres: &HashMap<i64, Genre>) -> PlayListItem {
    PlayListItem {
        id: play.id,
        title: play.title,
        description: play.description,
        actors: play.actors.iter().filter_map(|id| actors.get(id)).map(Actor::full_name).collect(),
        genres: play.genres.iter().filter_map(|id| genres.get(id)).map(|g| g.name.clone()).collect(),
    }
}
