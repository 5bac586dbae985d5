//! Prayer-time engine through the public API: config-driven parameters,
//! named time zones and the JSON document the `times --json` command prints.

use chrono::{Duration, TimeZone};
use chrono_tz::{America::New_York, Asia::Riyadh, Europe::London};
use noor::config::loading::parse_config;
use noor::prayer::{
    CalculationMethod, CalculationParams, Coordinates, EventKind, HighLatitudeRule, Madhab,
    PrayerTimeEngine,
};

fn mecca() -> Coordinates {
    Coordinates::new(21.4225, 39.8262).unwrap()
}

#[test]
fn every_method_yields_six_ordered_events_in_mecca() {
    let engine = PrayerTimeEngine::default();
    let reference = Riyadh.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap();

    for method in CalculationMethod::ALL {
        let params = CalculationParams::new(method, Madhab::Shafi);
        let set = engine.daily_events(Some(mecca()), &reference, &params);

        let kinds: Vec<EventKind> = set.ordered_events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, EventKind::ALL.to_vec(), "{method:?}");
        assert!(
            set.ordered_events
                .windows(2)
                .all(|pair| pair[0].instant < pair[1].instant),
            "{method:?} out of order"
        );
    }
}

#[test]
fn shallower_fajr_angle_means_later_fajr() {
    let engine = PrayerTimeEngine::default();
    let reference = Riyadh.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap();

    let fajr = |method| {
        engine
            .daily_events(
                Some(mecca()),
                &reference,
                &CalculationParams::new(method, Madhab::Shafi),
            )
            .event(EventKind::Fajr)
            .map(|event| event.instant)
            .unwrap()
    };

    // 18 degrees against 15 degrees below the horizon.
    let mwl = fajr(CalculationMethod::MuslimWorldLeague);
    let isna = fajr(CalculationMethod::NorthAmerica);
    assert!(isna > mwl + Duration::minutes(10));
}

#[test]
fn london_midsummer_needs_a_high_latitude_rule() {
    let engine = PrayerTimeEngine::default();
    let london = Coordinates::new(51.5074, -0.1278).unwrap();
    let reference = London.with_ymd_and_hms(2026, 6, 21, 12, 0, 0).unwrap();
    let base = CalculationParams::new(CalculationMethod::MuslimWorldLeague, Madhab::Shafi);

    let unbounded = engine.daily_events(
        Some(london),
        &reference,
        &base.with_high_latitude_rule(HighLatitudeRule::None),
    );
    assert!(unbounded.event(EventKind::Fajr).is_none());
    assert!(unbounded.event(EventKind::Isha).is_none());
    assert!(unbounded.event(EventKind::Sunrise).is_some());

    for rule in [
        HighLatitudeRule::MiddleOfTheNight,
        HighLatitudeRule::SeventhOfTheNight,
        HighLatitudeRule::TwilightAngle,
    ] {
        let bounded = engine.daily_events(
            Some(london),
            &reference,
            &base.with_high_latitude_rule(rule),
        );
        assert_eq!(bounded.ordered_events.len(), 6, "{rule:?}");
    }
}

#[test]
fn times_are_formatted_in_the_reference_zone() {
    let engine = PrayerTimeEngine::default();
    let new_york = Coordinates::new(40.7128, -74.0060).unwrap();
    let reference = New_York.with_ymd_and_hms(2026, 6, 21, 10, 0, 0).unwrap();
    let params = CalculationParams::new(CalculationMethod::NorthAmerica, Madhab::Shafi);

    let set = engine.daily_events(Some(new_york), &reference, &params);
    assert_eq!(set.reference_date, reference.date_naive());

    for event in &set.ordered_events {
        let local = event.instant.with_timezone(&New_York);
        assert_eq!(event.formatted_24h, local.format("%H:%M").to_string());
        assert_eq!(event.formatted_12h, local.format("%-I:%M %p").to_string());
    }

    let sunrise = set.event(EventKind::Sunrise).unwrap();
    assert!(sunrise.formatted_12h.starts_with("5:2"), "{}", sunrise.formatted_12h);
    assert!(sunrise.formatted_12h.ends_with("AM"));
}

#[test]
fn config_drives_the_calculation() {
    let config = parse_config(
        r#"
latitude = 21.4225
longitude = 39.8262
method = "umm_al_qura"
madhab = "hanafi"
"#,
    )
    .unwrap();

    let engine = PrayerTimeEngine::default();
    let reference = Riyadh.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap();
    let hanafi = engine.daily_events(config.coordinates(), &reference, &config.calculation_params());
    let shafi = engine.daily_events(config.coordinates(), &reference, &CalculationParams::default());

    let asr = |set: &noor::prayer::DailyEventSet| set.event(EventKind::Asr).unwrap().instant;
    assert!(asr(&hanafi) > asr(&shafi));
    assert_eq!(hanafi.coordinates, mecca());
}

#[test]
fn json_document_shape() {
    let engine = PrayerTimeEngine::default();
    let reference = Riyadh.with_ymd_and_hms(2026, 2, 18, 14, 0, 0).unwrap();
    let set = engine.daily_events(Some(mecca()), &reference, &CalculationParams::default());

    let json = serde_json::to_value(&set).unwrap();
    assert_eq!(json["ordered_events"].as_array().unwrap().len(), 6);
    assert_eq!(json["ordered_events"][0]["kind"], "fajr");
    assert_eq!(json["current_event"], "dhuhr");
    assert_eq!(json["next_event"]["kind"], "asr");
    assert_eq!(json["next_event"]["is_tomorrow"], false);
    assert_eq!(json["reference_date"], "2026-02-18");

    let next = &json["next_event"];
    let total = next["window_total_minutes"].as_i64().unwrap();
    let elapsed = next["window_elapsed_minutes"].as_i64().unwrap();
    let countdown = next["countdown_minutes"].as_i64().unwrap();
    assert_eq!(elapsed + countdown, total);
}
