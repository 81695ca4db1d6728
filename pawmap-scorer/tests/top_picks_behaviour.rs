//! Behavioural coverage for ranking places into a top-picks list.

use std::cell::RefCell;

use chrono::{DateTime, TimeZone, Utc};
use pawmap_core::{
    Author, Place, PlaceCategory, PlaceId, Rating, Review, ReviewId, TopPicksList, UserId,
};
use pawmap_scorer::{build_top_picks, group_reviews_by_place};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

/// Places, reviews, and the list built from them.
#[derive(Default)]
struct TopPicksWorld {
    places: RefCell<Vec<Place>>,
    reviews: RefCell<Vec<Review>>,
    list: RefCell<Option<TopPicksList>>,
}

impl TopPicksWorld {
    fn add_place(&self, id: &str, verified: bool, review_count: usize, rating: u8) {
        let place_id = PlaceId::new(id).unwrap_or_else(|err| panic!("place id {id}: {err}"));
        let place = Place::new(place_id.clone(), id, PlaceCategory::Park, author())
            .unwrap_or_else(|err| panic!("place {id}: {err}"));
        self.places
            .borrow_mut()
            .push(if verified { place.verified() } else { place });

        let stars = Rating::new(rating).unwrap_or_else(|err| panic!("rating: {err}"));
        self.reviews
            .borrow_mut()
            .extend((0..review_count).map(|index| {
                Review::new(
                    ReviewId::new(format!("{id}-{index}"))
                        .unwrap_or_else(|err| panic!("review id: {err}")),
                    place_id.clone(),
                    stars,
                    now(),
                    author(),
                )
            }));
    }

    fn ranked_ids(&self) -> Vec<String> {
        self.list
            .borrow()
            .as_ref()
            .unwrap_or_else(|| panic!("top picks must be built"))
            .places
            .iter()
            .map(|entry| entry.place.id.to_string())
            .collect()
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0)
        .single()
        .unwrap_or_else(|| panic!("valid timestamp"))
}

fn author() -> Author {
    Author::new(
        UserId::new("walker").unwrap_or_else(|err| panic!("user id: {err}")),
        "Walker",
    )
}

#[fixture]
fn world() -> TopPicksWorld {
    TopPicksWorld::default()
}

#[given("a verified place {id} with {count} reviews rated {rating} today")]
fn verified_place(world: &TopPicksWorld, id: String, count: usize, rating: u8) {
    world.add_place(&id, true, count, rating);
}

#[given("an unverified place {id} with {count} reviews rated {rating} today")]
fn unverified_place(world: &TopPicksWorld, id: String, count: usize, rating: u8) {
    world.add_place(&id, false, count, rating);
}

#[given("an unreviewed place {id}")]
fn unreviewed_place(world: &TopPicksWorld, id: String) {
    world.add_place(&id, false, 0, Rating::MIN);
}

#[given("{count} unreviewed places")]
fn many_unreviewed_places(world: &TopPicksWorld, count: usize) {
    for index in 0..count {
        world.add_place(&format!("place-{index}"), false, 0, Rating::MIN);
    }
}

#[given("place {id} has {reports} reports")]
fn place_has_reports(world: &TopPicksWorld, id: String, reports: u32) {
    let mut places = world.places.borrow_mut();
    let stored = places
        .iter_mut()
        .find(|place| place.id.as_str() == id)
        .unwrap_or_else(|| panic!("place {id} must exist"));
    stored.report_count = reports;
}

#[when("top picks are built")]
fn build(world: &TopPicksWorld) {
    let grouped = group_reviews_by_place(world.reviews.borrow().iter().cloned());
    let list = build_top_picks(&world.places.borrow(), &grouped, now());
    world.list.replace(Some(list));
}

#[then("the ranking is {order}")]
fn ranking_is(world: &TopPicksWorld, order: String) {
    let expected: Vec<&str> = order.split(", ").collect();
    assert_eq!(world.ranked_ids(), expected);
}

#[then("place {id} carries a review count of {count}")]
fn carries_review_count(world: &TopPicksWorld, id: String, count: u32) {
    let binding = world.list.borrow();
    let list = binding
        .as_ref()
        .unwrap_or_else(|| panic!("top picks must be built"));
    let entry = list
        .places
        .iter()
        .find(|entry| entry.place.id.as_str() == id)
        .unwrap_or_else(|| panic!("place {id} must be ranked"));
    assert_eq!(entry.review_count(), count);
}

#[then("the list holds {count} places")]
fn list_holds(world: &TopPicksWorld, count: usize) {
    assert_eq!(world.ranked_ids().len(), count);
}

#[then("the list is tagged {tag}")]
fn list_is_tagged(world: &TopPicksWorld, tag: String) {
    let binding = world.list.borrow();
    let list = binding
        .as_ref()
        .unwrap_or_else(|| panic!("top picks must be built"));
    assert_eq!(list.algorithm_version, tag);
}

#[scenario(path = "tests/features/top_picks.feature", index = 0)]
fn verified_places_lead(world: TopPicksWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/top_picks.feature", index = 1)]
fn reports_push_places_down(world: TopPicksWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/top_picks.feature", index = 2)]
fn list_is_capped(world: TopPicksWorld) {
    let _ = world;
}
