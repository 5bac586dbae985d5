use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use super::*;

fn riyadh() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).unwrap()
}

fn mecca() -> Coordinates {
    Coordinates::new(21.4225, 39.8262).unwrap()
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn assert_near(actual: DateTime<Utc>, expected: DateTime<Utc>, tolerance_minutes: i64) {
    let diff = (actual - expected).num_minutes().abs();
    assert!(
        diff <= tolerance_minutes,
        "expected {expected} ± {tolerance_minutes}m, got {actual}"
    );
}

/// Solver that returns canned days.
#[derive(Default)]
struct ScriptedSolver {
    days: HashMap<NaiveDate, SolvedDay>,
}

impl ScriptedSolver {
    fn day(mut self, date: NaiveDate, events: &[(EventKind, DateTime<Utc>)]) -> Self {
        let solved = events
            .iter()
            .fold(SolvedDay::new(), |day, (kind, time)| day.with(*kind, Some(*time)));
        self.days.insert(date, solved);
        self
    }
}

impl AstronomicalSolver for ScriptedSolver {
    fn solve(&self, _: Coordinates, date: NaiveDate, _: &CalculationParams) -> SolvedDay {
        self.days.get(&date).copied().unwrap_or_default()
    }
}

/// Scripted solver that counts `solve` calls.
struct CountingSolver {
    inner: ScriptedSolver,
    calls: AtomicUsize,
}

impl AstronomicalSolver for CountingSolver {
    fn solve(&self, coordinates: Coordinates, date: NaiveDate, params: &CalculationParams) -> SolvedDay {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.solve(coordinates, date, params)
    }
}

fn scripted(solver: ScriptedSolver) -> PrayerTimeEngine {
    PrayerTimeEngine::new(Arc::new(solver))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn mecca_umm_al_qura_times() {
    let solved = SolarSolver.solve(mecca(), date(2026, 2, 18), &CalculationParams::default());

    assert_near(solved.get(EventKind::Fajr).unwrap(), utc(2026, 2, 18, 2, 33), 2);
    assert_near(solved.get(EventKind::Sunrise).unwrap(), utc(2026, 2, 18, 3, 50), 2);
    assert_near(solved.get(EventKind::Dhuhr).unwrap(), utc(2026, 2, 18, 9, 35), 2);
    assert_near(solved.get(EventKind::Asr).unwrap(), utc(2026, 2, 18, 12, 53), 2);
    assert_near(solved.get(EventKind::Maghrib).unwrap(), utc(2026, 2, 18, 15, 20), 2);

    // Umm al-Qura places Isha a fixed 90 minutes after Maghrib.
    let maghrib = solved.get(EventKind::Maghrib).unwrap();
    assert_eq!(solved.get(EventKind::Isha), Some(maghrib + Duration::minutes(90)));
}

#[test]
fn hanafi_asr_is_later() {
    let day = date(2026, 2, 18);
    let shafi = SolarSolver.solve(mecca(), day, &CalculationParams::default());
    let hanafi = SolarSolver.solve(
        mecca(),
        day,
        &CalculationParams::new(CalculationMethod::UmmAlQura, Madhab::Hanafi),
    );

    let shafi_asr = shafi.get(EventKind::Asr).unwrap();
    let hanafi_asr = hanafi.get(EventKind::Asr).unwrap();
    assert!(hanafi_asr > shafi_asr + Duration::minutes(30));
    assert_eq!(shafi.get(EventKind::Dhuhr), hanafi.get(EventKind::Dhuhr));
}

#[test]
fn method_adjustments_shift_solved_times() {
    // Sunrise, Dhuhr, Asr and Maghrib do not depend on twilight angles, so any
    // difference from Umm al-Qura (no adjustments) is the method's offset.
    let expected = [
        (CalculationMethod::MuslimWorldLeague, [0, 1, 0, 0]),
        (CalculationMethod::Egyptian, [0, 1, 0, 0]),
        (CalculationMethod::Karachi, [0, 1, 0, 0]),
        (CalculationMethod::UmmAlQura, [0, 0, 0, 0]),
        (CalculationMethod::Dubai, [-3, 3, 3, 3]),
        (CalculationMethod::NorthAmerica, [0, 1, 0, 0]),
        (CalculationMethod::Kuwait, [0, 0, 0, 0]),
        (CalculationMethod::Qatar, [0, 0, 0, 0]),
        (CalculationMethod::Singapore, [0, 1, 0, 0]),
        (CalculationMethod::MoonSighting, [0, 5, 0, 3]),
    ];
    let kinds = [EventKind::Sunrise, EventKind::Dhuhr, EventKind::Asr, EventKind::Maghrib];
    let day = date(2026, 2, 18);
    let unadjusted = SolarSolver.solve(mecca(), day, &CalculationParams::default());

    for (method, offsets) in expected {
        let solved = SolarSolver.solve(mecca(), day, &CalculationParams::new(method, Madhab::Shafi));
        for (kind, minutes) in kinds.into_iter().zip(offsets) {
            assert_eq!(
                solved.get(kind).unwrap() - unadjusted.get(kind).unwrap(),
                Duration::minutes(minutes),
                "{method:?} {kind:?}"
            );
        }
    }
}

#[test]
fn qatar_isha_is_ninety_minutes_after_maghrib() {
    let day = date(2026, 2, 18);
    let qatar = SolarSolver.solve(
        mecca(),
        day,
        &CalculationParams::new(CalculationMethod::Qatar, Madhab::Shafi),
    );
    let maghrib = qatar.get(EventKind::Maghrib).unwrap();
    assert_eq!(qatar.get(EventKind::Isha), Some(maghrib + Duration::minutes(90)));
}

#[test]
fn moon_sighting_keeps_angle_times_at_low_latitude() {
    let day = date(2026, 2, 18);
    let kuwait = SolarSolver.solve(
        mecca(),
        day,
        &CalculationParams::new(CalculationMethod::Kuwait, Madhab::Shafi),
    );
    let moon = SolarSolver.solve(
        mecca(),
        day,
        &CalculationParams::new(CalculationMethod::MoonSighting, Madhab::Shafi),
    );
    // Both use an 18° Fajr, and the seasonal limit lies earlier still.
    assert_eq!(moon.get(EventKind::Fajr), kuwait.get(EventKind::Fajr));
}

#[test]
fn moon_sighting_uses_seasonal_twilight_when_angles_fail() {
    // Midsummer in London: the sun never gets 18° below the horizon.
    let london = Coordinates::new(51.5074, -0.1278).unwrap();
    let day = date(2026, 6, 21);

    let mwl = SolarSolver.solve(
        london,
        day,
        &CalculationParams::new(CalculationMethod::MuslimWorldLeague, Madhab::Shafi)
            .with_high_latitude_rule(HighLatitudeRule::None),
    );
    assert_eq!(mwl.get(EventKind::Fajr), None);
    assert_eq!(mwl.get(EventKind::Isha), None);

    let moon = SolarSolver.solve(
        london,
        day,
        &CalculationParams::new(CalculationMethod::MoonSighting, Madhab::Shafi)
            .with_high_latitude_rule(HighLatitudeRule::None),
    );
    let before_sunrise = moon.get(EventKind::Sunrise).unwrap() - moon.get(EventKind::Fajr).unwrap();
    assert!(
        (118..=122).contains(&before_sunrise.num_minutes()),
        "{before_sunrise}"
    );

    // Maghrib carries the method's +3; the seasonal Isha is measured from sunset.
    let after_maghrib = moon.get(EventKind::Isha).unwrap() - moon.get(EventKind::Maghrib).unwrap();
    assert!(
        (75..=80).contains(&after_maghrib.num_minutes()),
        "{after_maghrib}"
    );
}

#[test]
fn sunrise_and_sunset_agree_with_independent_solar_model() {
    use sunrise::{Coordinates as SunCoordinates, SolarDay, SolarEvent};

    let places = [(21.4225, 39.8262), (40.7128, -74.0060), (51.5074, -0.1278), (-33.8688, 151.2093)];
    let dates = [date(2026, 3, 20), date(2026, 6, 21), date(2026, 12, 21)];
    let params = CalculationParams::new(CalculationMethod::MuslimWorldLeague, Madhab::Shafi);

    for (lat, lon) in places {
        for day in dates {
            let ours = SolarSolver.solve(Coordinates::new(lat, lon).unwrap(), day, &params);
            let reference = SolarDay::new(SunCoordinates::new(lat, lon).unwrap(), day);

            assert_near(
                ours.get(EventKind::Sunrise).unwrap(),
                reference.event_time(SolarEvent::Sunrise),
                4,
            );
            assert_near(
                ours.get(EventKind::Maghrib).unwrap(),
                reference.event_time(SolarEvent::Sunset),
                4,
            );
        }
    }
}

#[test]
fn polar_day_drops_undefined_events() {
    let svalbard = Coordinates::new(78.2232, 15.6267).unwrap();
    let params = CalculationParams::new(CalculationMethod::MuslimWorldLeague, Madhab::Shafi);
    let reference = utc(2026, 6, 21, 12, 0);

    let set = PrayerTimeEngine::default().daily_events(Some(svalbard), &reference, &params);
    let kinds: Vec<_> = set.ordered_events.iter().map(|e| e.kind).collect();

    assert!(!kinds.contains(&EventKind::Sunrise));
    assert!(!kinds.contains(&EventKind::Maghrib));
    assert!(kinds.contains(&EventKind::Dhuhr));
}

#[test]
fn polar_night_has_no_sunrise_or_sunset() {
    let svalbard = Coordinates::new(78.2232, 15.6267).unwrap();
    let params = CalculationParams::new(CalculationMethod::MuslimWorldLeague, Madhab::Shafi);
    let solved = SolarSolver.solve(svalbard, date(2026, 12, 21), &params);

    assert_eq!(solved.get(EventKind::Sunrise), None);
    assert_eq!(solved.get(EventKind::Maghrib), None);
    assert!(solved.get(EventKind::Dhuhr).is_some());
}

#[test]
fn high_latitude_rule_bounds_fajr() {
    // Mid-June in Oslo: 18° twilight never ends.
    let oslo = Coordinates::new(59.9139, 10.7522).unwrap();
    let day = date(2026, 6, 21);
    let base = CalculationParams::new(CalculationMethod::MuslimWorldLeague, Madhab::Shafi);

    let unbounded = SolarSolver.solve(
        oslo,
        day,
        &base.with_high_latitude_rule(HighLatitudeRule::None),
    );
    assert_eq!(unbounded.get(EventKind::Fajr), None);

    let bounded = SolarSolver.solve(
        oslo,
        day,
        &base.with_high_latitude_rule(HighLatitudeRule::SeventhOfTheNight),
    );
    let fajr = bounded.get(EventKind::Fajr).unwrap();
    let sunrise = bounded.get(EventKind::Sunrise).unwrap();
    assert!(fajr < sunrise);
    assert!(sunrise - fajr < Duration::hours(1));
}

#[test]
fn after_isha_next_event_is_tomorrows_fajr() {
    let reference = riyadh().with_ymd_and_hms(2026, 2, 18, 23, 0, 0).unwrap();
    let set = PrayerTimeEngine::default().daily_events(
        Some(mecca()),
        &reference,
        &CalculationParams::default(),
    );

    assert_eq!(set.ordered_events.len(), 6);
    assert_eq!(set.current_event, Some(EventKind::Isha));

    let next = set.next_event.expect("tomorrow's fajr");
    assert_eq!(next.kind, EventKind::Fajr);
    assert!(next.is_tomorrow);
    assert_eq!(next.instant.with_timezone(&riyadh()).date_naive(), date(2026, 2, 19));
    assert_eq!(next.window_total_minutes, next.countdown_minutes);
    assert_eq!(next.window_elapsed_minutes, 0);
}

#[test]
fn window_spans_from_current_event() {
    let reference = riyadh().with_ymd_and_hms(2026, 2, 18, 14, 0, 0).unwrap();
    let set = PrayerTimeEngine::default().daily_events(
        Some(mecca()),
        &reference,
        &CalculationParams::default(),
    );

    assert_eq!(set.current_event, Some(EventKind::Dhuhr));
    let next = set.next_event.clone().unwrap();
    assert_eq!(next.kind, EventKind::Asr);
    assert!(!next.is_tomorrow);

    let dhuhr = set.event(EventKind::Dhuhr).unwrap().instant;
    let asr = set.event(EventKind::Asr).unwrap().instant;
    assert_eq!(next.window_total_minutes, (asr - dhuhr).num_minutes());
    assert_eq!(
        next.window_elapsed_minutes + next.countdown_minutes,
        next.window_total_minutes
    );
    assert!(next.progress() > 0.0 && next.progress() < 1.0);
}

#[test]
fn before_fajr_has_no_current_event() {
    let reference = riyadh().with_ymd_and_hms(2026, 2, 18, 3, 0, 0).unwrap();
    let set = PrayerTimeEngine::default().daily_events(
        Some(mecca()),
        &reference,
        &CalculationParams::default(),
    );

    assert_eq!(set.current_event, None);
    let next = set.next_event.unwrap();
    assert_eq!(next.kind, EventKind::Fajr);
    assert_eq!(next.window_elapsed_minutes, 0);
}

#[test]
fn solves_today_once_and_tomorrow_only_when_needed() {
    let today = date(2026, 2, 18);
    let solver = Arc::new(CountingSolver {
        inner: ScriptedSolver::default()
            .day(
                today,
                &[
                    (EventKind::Fajr, utc(2026, 2, 18, 2, 33)),
                    (EventKind::Dhuhr, utc(2026, 2, 18, 9, 35)),
                    (EventKind::Isha, utc(2026, 2, 18, 16, 50)),
                ],
            )
            .day(date(2026, 2, 19), &[(EventKind::Fajr, utc(2026, 2, 19, 2, 32))]),
        calls: AtomicUsize::new(0),
    });
    let engine = PrayerTimeEngine::new(solver.clone());
    let params = CalculationParams::default();

    let midday = engine.daily_events(Some(mecca()), &utc(2026, 2, 18, 10, 0), &params);
    assert_eq!(midday.current_event, Some(EventKind::Dhuhr));
    assert_eq!(midday.next_event.map(|n| n.kind), Some(EventKind::Isha));
    assert_eq!(solver.calls.load(Ordering::SeqCst), 1);

    let late = engine.daily_events(Some(mecca()), &utc(2026, 2, 18, 20, 0), &params);
    assert!(late.next_event.is_some_and(|n| n.is_tomorrow));
    assert_eq!(solver.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn missing_coordinates_use_fallback() {
    let reference = utc(2026, 2, 18, 9, 0);
    let set = PrayerTimeEngine::default().daily_events(None, &reference, &CalculationParams::default());
    assert_eq!(set.coordinates, Coordinates::fallback());
    assert_eq!(set.reference_date, date(2026, 2, 18));
}

#[test]
fn obligatory_view_skips_sunrise() {
    let reference = utc(2026, 2, 18, 9, 0);
    let set = PrayerTimeEngine::default().daily_events(
        Some(mecca()),
        &reference,
        &CalculationParams::default(),
    );
    let kinds: Vec<_> = set.obligatory_events().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Fajr,
            EventKind::Dhuhr,
            EventKind::Asr,
            EventKind::Maghrib,
            EventKind::Isha
        ]
    );
}

#[test]
fn formats_in_reference_zone() {
    let today = date(2026, 2, 18);
    let engine = scripted(ScriptedSolver::default().day(
        today,
        &[
            (EventKind::Fajr, utc(2026, 2, 18, 2, 33)),
            (EventKind::Maghrib, utc(2026, 2, 18, 15, 20)),
        ],
    ));
    let reference = riyadh().with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap();
    let set = engine.daily_events(Some(mecca()), &reference, &CalculationParams::default());

    let fajr = set.event(EventKind::Fajr).unwrap();
    assert_eq!(fajr.formatted_12h, "5:33 AM");
    assert_eq!(fajr.formatted_24h, "05:33");

    let next = set.next_event.unwrap();
    assert_eq!(next.kind, EventKind::Maghrib);
    assert_eq!(next.formatted_12h, "6:20 PM");
    assert_eq!(next.formatted_24h, "18:20");
    assert_eq!(next.countdown_minutes, 6 * 60 + 20);
    assert_eq!(next.window_total_minutes, 12 * 60 + 47);
}

#[test]
fn empty_day_is_not_an_error() {
    let engine = scripted(ScriptedSolver::default());
    let set = engine.daily_events(Some(mecca()), &utc(2026, 2, 18, 12, 0), &CalculationParams::default());

    assert!(set.is_empty());
    assert_eq!(set.current_event, None);
    assert_eq!(set.next_event, None);
}

#[test]
fn tomorrow_fallback_stops_after_one_day() {
    let engine = scripted(
        ScriptedSolver::default()
            .day(date(2026, 2, 18), &[(EventKind::Dhuhr, utc(2026, 2, 18, 9, 35))])
            .day(date(2026, 2, 20), &[(EventKind::Fajr, utc(2026, 2, 20, 2, 33))]),
    );
    let set = engine.daily_events(Some(mecca()), &utc(2026, 2, 18, 20, 0), &CalculationParams::default());

    assert_eq!(set.current_event, Some(EventKind::Dhuhr));
    assert_eq!(set.next_event, None);
}

#[test]
fn countdown_truncates_partial_minutes() {
    let engine = scripted(
        ScriptedSolver::default().day(date(2026, 2, 18), &[(EventKind::Asr, utc(2026, 2, 18, 12, 53))]),
    );
    let reference = utc(2026, 2, 18, 12, 50) + Duration::seconds(30);
    let next = engine
        .daily_events(Some(mecca()), &reference, &CalculationParams::default())
        .next_event
        .unwrap();

    assert_eq!(next.countdown_minutes, 2);
    assert_eq!(next.window_total_minutes, 2);
    assert_eq!(next.window_elapsed_minutes, 0);
}

#[test]
fn coordinates_reject_out_of_range() {
    assert!(Coordinates::new(91.0, 0.0).is_none());
    assert!(Coordinates::new(0.0, -180.5).is_none());
    assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    assert!(Coordinates::new(-90.0, 180.0).is_some());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn window_invariant_holds(
        secs in 946_684_800i64..2_524_608_000i64,
        latitude in -65.0f64..65.0,
        longitude in -180.0f64..180.0,
        method in 0usize..10,
    ) {
        let reference = Utc.timestamp_opt(secs, 0).unwrap();
        let coordinates = Coordinates::new(latitude, longitude).unwrap();
        let params = CalculationParams::new(CalculationMethod::ALL[method], Madhab::Shafi);
        let set = PrayerTimeEngine::default().daily_events(Some(coordinates), &reference, &params);

        let kinds: Vec<_> = set.ordered_events.iter().map(|e| e.kind).collect();
        prop_assert!(kinds.windows(2).all(|pair| pair[0] < pair[1]));

        if let Some(next) = set.next_event {
            prop_assert!(next.countdown_minutes >= 0);
            prop_assert!(next.window_total_minutes >= 1);
            prop_assert!(next.window_elapsed_minutes >= 0);
            prop_assert_eq!(
                next.window_elapsed_minutes + next.countdown_minutes,
                next.window_total_minutes
            );
        }
    }
}
