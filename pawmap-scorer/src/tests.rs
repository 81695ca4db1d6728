//! Unit coverage for top-picks scoring and ranking.
#![forbid(unsafe_code)]

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use pawmap_core::{
    Author, Place, PlaceCategory, PlaceId, PlaceScorer, Rating, Review, ReviewId, UserId,
};
use rstest::{fixture, rstest};

use crate::{
    ALGORITHM_VERSION, RECENCY_WINDOW_SECS, ScoreWeights, ScoreWeightsError, TopPicksScorer,
    build_top_picks, build_top_picks_with, compute_score, group_reviews_by_place,
};

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("valid timestamp"))
}

fn author() -> Author {
    Author::new(
        UserId::new("author-1").unwrap_or_else(|err| panic!("user id: {err}")),
        "Robin",
    )
}

fn place(id: &str) -> Place {
    let place_id = PlaceId::new(id).unwrap_or_else(|err| panic!("place id: {err}"));
    Place::new(place_id, format!("Place {id}"), PlaceCategory::Park, author())
        .unwrap_or_else(|err| panic!("place {id}: {err}"))
}

fn review(id: &str, place_id: &str, rating: u8, created_at: DateTime<Utc>) -> Review {
    Review::new(
        ReviewId::new(id).unwrap_or_else(|err| panic!("review id: {err}")),
        PlaceId::new(place_id).unwrap_or_else(|err| panic!("place id: {err}")),
        Rating::new(rating).unwrap_or_else(|err| panic!("rating: {err}")),
        created_at,
        author(),
    )
}

fn reviews_for(place_id: &str, ratings: &[u8], created_at: DateTime<Utc>) -> Vec<Review> {
    ratings
        .iter()
        .enumerate()
        .map(|(index, rating)| review(&format!("{place_id}-r{index}"), place_id, *rating, created_at))
        .collect()
}

#[expect(
    clippy::float_arithmetic,
    reason = "tolerance comparison of floating-point scores"
)]
fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.000_1_f64,
        "expected approximately {expected}, got {actual}"
    );
}

#[rstest]
fn zero_reviews_score_exactly_zero(now: DateTime<Utc>) {
    let verified = place("p1").verified().with_report_count(3);
    assert_eq!(compute_score(&verified, &[], now).to_bits(), 0.0_f64.to_bits());
}

#[rstest]
fn verified_place_with_fresh_reviews(now: DateTime<Utc>) {
    let verified = place("p1").verified();
    let reviews = reviews_for("p1", &[5, 5, 4], now);

    // 14/3 + ln(4)/2 + 0.3 + 0.2
    assert_close(compute_score(&verified, &reviews, now), 5.859_814_f64);
}

#[rstest]
#[case::just_inside(RECENCY_WINDOW_SECS - 1, 4.646_574_f64)]
#[case::exactly_thirty_days(RECENCY_WINDOW_SECS, 4.346_574_f64)]
#[case::future_dated(-3_600, 4.646_574_f64)]
fn recency_window_is_half_open(
    now: DateTime<Utc>,
    #[case] age_secs: i64,
    #[case] expected: f64,
) {
    let reviews = vec![review("r1", "p1", 4, now - TimeDelta::seconds(age_secs))];
    assert_close(compute_score(&place("p1"), &reviews, now), expected);
}

#[rstest]
fn recency_bonus_is_proportional(now: DateTime<Utc>) {
    let old = now - TimeDelta::days(90);
    let reviews = vec![
        review("r1", "p1", 3, now),
        review("r2", "p1", 3, old),
        review("r3", "p1", 3, old),
        review("r4", "p1", 3, old),
    ];
    // 3 + ln(5)/2 + 0.3/4
    assert_close(compute_score(&place("p1"), &reviews, now), 3.879_719_f64);
}

#[rstest]
#[case(0, 1)]
#[case(1, 2)]
#[case(4, 40)]
fn more_reports_always_lower_the_score(
    now: DateTime<Utc>,
    #[case] fewer: u32,
    #[case] more: u32,
) {
    let reviews = reviews_for("p1", &[4, 5], now);
    let low = compute_score(&place("p1").with_report_count(more), &reviews, now);
    let high = compute_score(&place("p1").with_report_count(fewer), &reviews, now);
    assert!(low < high, "{more} reports scored {low}, {fewer} scored {high}");
}

#[rstest]
fn report_penalty_is_unbounded(now: DateTime<Utc>) {
    let reviews = reviews_for("p1", &[1], now);
    let score = compute_score(&place("p1").with_report_count(30), &reviews, now);
    assert!(score < 0.0_f64, "expected a negative score, got {score}");
}

#[rstest]
fn ranks_best_first_and_counts_supplied_reviews(now: DateTime<Utc>) {
    let mut stored = place("busy");
    stored.review_count = 99;
    let places = vec![place("quiet"), stored, place("empty")];
    let reviews = group_reviews_by_place(
        reviews_for("quiet", &[3], now)
            .into_iter()
            .chain(reviews_for("busy", &[5, 5, 4, 5], now)),
    );

    let list = build_top_picks(&places, &reviews, now);

    let order: Vec<&str> = list.places.iter().map(|entry| entry.place.id.as_str()).collect();
    assert_eq!(order, ["busy", "quiet", "empty"]);
    let counts: Vec<u32> = list.places.iter().map(|entry| entry.review_count()).collect();
    assert_eq!(counts, [4, 1, 0]);
    assert_eq!(list.algorithm_version, ALGORITHM_VERSION);
    assert_eq!(list.last_updated, now);
}

#[rstest]
fn ties_keep_input_order(now: DateTime<Utc>) {
    let places: Vec<Place> = ["c", "a", "b"].into_iter().map(place).collect();

    let list = build_top_picks(&places, &HashMap::new(), now);

    let order: Vec<&str> = list.places.iter().map(|entry| entry.place.id.as_str()).collect();
    assert_eq!(order, ["c", "a", "b"]);
}

#[rstest]
fn negative_scores_rank_below_unreviewed_places(now: DateTime<Utc>) {
    let places = vec![place("reported").with_report_count(30), place("new")];
    let reviews = group_reviews_by_place(reviews_for("reported", &[2], now));

    let list = build_top_picks(&places, &reviews, now);

    let order: Vec<&str> = list.places.iter().map(|entry| entry.place.id.as_str()).collect();
    assert_eq!(order, ["new", "reported"]);
}

#[rstest]
#[case(0, 0)]
#[case(12, 12)]
#[case(50, 50)]
#[case(75, 50)]
fn output_is_capped_at_fifty(now: DateTime<Utc>, #[case] total: usize, #[case] kept: usize) {
    let places: Vec<Place> = (0..total).map(|index| place(&format!("p{index}"))).collect();

    let list = build_top_picks(&places, &HashMap::new(), now);

    assert_eq!(list.len(), kept);
}

#[rstest]
fn ranking_is_idempotent(now: DateTime<Utc>) {
    let places = vec![place("a").verified(), place("b"), place("c").with_report_count(2)];
    let reviews = group_reviews_by_place(
        reviews_for("a", &[4, 4], now)
            .into_iter()
            .chain(reviews_for("b", &[5], now - TimeDelta::days(45)))
            .chain(reviews_for("c", &[5, 5, 5], now)),
    );
    let snapshot = places.clone();

    let first = build_top_picks(&places, &reviews, now);
    let second = build_top_picks(&places, &reviews, now);

    assert_eq!(first, second);
    assert_eq!(places, snapshot);
}

#[rstest]
fn custom_scorer_and_limit_are_honoured(now: DateTime<Utc>) {
    let weights = ScoreWeights {
        report_penalty: 1.0_f64,
        ..ScoreWeights::default()
    };
    let scorer = TopPicksScorer::new(weights, "strict_reports")
        .unwrap_or_else(|err| panic!("scorer: {err}"));
    let places = vec![place("a"), place("b").with_report_count(3), place("c")];
    let reviews = group_reviews_by_place(
        reviews_for("a", &[3], now)
            .into_iter()
            .chain(reviews_for("b", &[5], now))
            .chain(reviews_for("c", &[1], now)),
    );

    let list = build_top_picks_with(&scorer, &places, &reviews, now, 2);

    let order: Vec<&str> = list.places.iter().map(|entry| entry.place.id.as_str()).collect();
    assert_eq!(order, ["a", "b"]);
    assert_eq!(list.algorithm_version, "strict_reports");
}

#[rstest]
fn scorer_trait_matches_free_function(now: DateTime<Utc>) {
    let reviews = reviews_for("p1", &[2, 5], now - TimeDelta::days(3));
    let subject = place("p1").verified();
    let scorer = TopPicksScorer::default();
    assert_eq!(
        scorer.score(&subject, &reviews, now).to_bits(),
        compute_score(&subject, &reviews, now).to_bits()
    );
}

#[rstest]
fn grouping_preserves_order_within_a_place(now: DateTime<Utc>) {
    let grouped = group_reviews_by_place(vec![
        review("r1", "a", 5, now),
        review("r2", "b", 4, now),
        review("r3", "a", 3, now),
    ]);

    let ids: Vec<&str> = grouped
        .get(&PlaceId::new("a").unwrap_or_else(|err| panic!("place id: {err}")))
        .map(|reviews| reviews.iter().map(|entry| entry.id.as_str()).collect())
        .unwrap_or_default();
    assert_eq!(ids, ["r1", "r3"]);
    assert_eq!(grouped.len(), 2);
}

#[rstest]
#[case::negative(ScoreWeights { volume_weight: -0.5_f64, ..ScoreWeights::default() })]
#[case::not_finite(ScoreWeights { recency_weight: f64::NAN, ..ScoreWeights::default() })]
fn invalid_weights_are_rejected(#[case] weights: ScoreWeights) {
    assert!(matches!(
        TopPicksScorer::new(weights, ALGORITHM_VERSION),
        Err(ScoreWeightsError::InvalidWeight { .. })
    ));
}

#[rstest]
fn empty_recency_window_is_rejected() {
    let weights = ScoreWeights {
        recency_window: TimeDelta::zero(),
        ..ScoreWeights::default()
    };
    assert_eq!(
        weights.validate(),
        Err(ScoreWeightsError::EmptyRecencyWindow)
    );
}

#[rstest]
fn blank_algorithm_tag_is_rejected() {
    assert_eq!(
        TopPicksScorer::new(ScoreWeights::default(), "  "),
        Err(ScoreWeightsError::BlankAlgorithmVersion)
    );
}

#[rstest]
fn published_list_uses_document_field_names(now: DateTime<Utc>) {
    let reviews = group_reviews_by_place(reviews_for("p1", &[4], now));
    let list = build_top_picks(&[place("p1")], &reviews, now);

    let json = serde_json::to_value(&list).unwrap_or_else(|err| panic!("encode: {err}"));

    assert_eq!(json["algorithmVersion"], ALGORITHM_VERSION);
    assert!(json["lastUpdated"].is_string());
    let entry = &json["places"][0];
    assert_eq!(entry["id"], "p1");
    assert_eq!(entry["reviewCount"], 1);
    assert!(entry["topPicksScore"].is_f64());
}
