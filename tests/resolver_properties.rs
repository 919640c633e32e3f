//! Resolver Property Tests
//!
//! Exercises the heritage-level resolver end to end over an in-memory
//! register: the closed label set, the strategy priority order, and the
//! worked matching examples.

use suzhou_garden_prep::heritage::{
    self, resolve, MatchMethod, DEFAULT_THRESHOLD_KM, LEVEL_NATIONAL,
    LEVEL_NATIONAL_BY_LOCATION,
};
use suzhou_garden_prep::{haversine_km, GardenRecord, HeritageSite};

const ALL_LEVELS: &[&str] = &[
    "全国",
    "全国（地点推测）",
    "省级",
    "市级",
    "县级",
    "区级",
    "文物保护单位",
];

fn site(name: &str, lon: f64, lat: f64) -> HeritageSite {
    HeritageSite {
        name: name.to_string(),
        longitude: Some(lon),
        latitude: Some(lat),
    }
}

fn record(name: &str, lon: Option<f64>, lat: Option<f64>, desc: Option<&str>) -> GardenRecord {
    GardenRecord {
        name: name.to_string(),
        longitude: lon,
        latitude: lat,
        description: desc.map(str::to_string),
    }
}

fn register() -> Vec<HeritageSite> {
    vec![
        site("拙政园", 120.629, 31.325),
        site("留园", 120.598, 31.322),
        site("苏州文庙及石刻", 120.618, 31.295),
    ]
}

#[test]
fn assigned_levels_stay_in_the_closed_set() {
    let sites = register();
    let records = vec![
        record("拙政园", Some(120.629), Some(31.325), None),
        record("小筑堂", Some(120.6), Some(31.3221), None),
        record("另一处小筑堂", None, None, Some("县级文物保护单位")),
        record("无名氏小筑堂", None, None, Some("毫无线索")),
        record("留园", None, None, None),
    ];

    for rec in &records {
        if let Some(resolution) = resolve(rec, &sites) {
            assert!(
                ALL_LEVELS.contains(&resolution.level),
                "unexpected level: {}",
                resolution.level
            );
        }
    }
}

#[test]
fn name_match_takes_priority_over_location() {
    let sites = register();
    // Sits directly on top of 留园 but is named 拙政园: name strategy wins
    let rec = record("拙政园", Some(120.598), Some(31.322), None);

    let resolution = resolve(&rec, &sites).unwrap();
    assert_eq!(resolution.method, MatchMethod::Name);
    assert_eq!(resolution.level, LEVEL_NATIONAL);
}

#[test]
fn location_match_takes_priority_over_description() {
    let sites = register();
    // ~0.48 km from 留园, description claims a lower tier
    let rec = record(
        "无名小筑堂",
        Some(120.603),
        Some(31.322),
        Some("市级文物保护单位"),
    );

    let resolution = resolve(&rec, &sites).unwrap();
    assert_eq!(resolution.method, MatchMethod::Location);
    assert_eq!(resolution.level, LEVEL_NATIONAL_BY_LOCATION);
}

#[test]
fn exact_name_example() {
    let resolution = resolve(&record("拙政园", None, None, None), &register()).unwrap();
    assert_eq!(resolution.level, "全国");
}

#[test]
fn location_example_within_half_kilometre() {
    let sites = vec![site("某文保单位", 120.005, 31.000)];
    let rec = record("独立小筑堂", Some(120.000), Some(31.000), None);

    // The sanity check from the worked example: ~0.48 km, under 1 km
    let d = haversine_km(120.000, 31.000, 120.005, 31.000);
    assert!(d < DEFAULT_THRESHOLD_KM);

    let resolution = resolve(&rec, &sites).unwrap();
    assert_eq!(resolution.level, "全国（地点推测）");
}

#[test]
fn description_keyword_priority_is_independent_of_position() {
    let sites: Vec<HeritageSite> = Vec::new();

    let municipal = resolve(
        &record("甲小筑堂", None, None, Some("市级文物保护单位")),
        &sites,
    )
    .unwrap();
    assert_eq!(municipal.level, "市级");

    // National phrase later in the string still wins over the municipal one
    let national = resolve(
        &record(
            "乙小筑堂",
            None,
            None,
            Some("1957年定为市级文物保护单位，1997年升格为全国重点文物保护单位"),
        ),
        &sites,
    )
    .unwrap();
    assert_eq!(national.level, "全国");
}

#[test]
fn hopeless_record_stays_unset() {
    let rec = record("毫无线索小筑堂", None, None, Some("就是一段无关文字"));
    assert!(resolve(&rec, &register()).is_none());
}

#[test]
fn strategies_match_their_matchresult_contract() {
    let sites = register();

    let hit = heritage::match_by_name("拙政园", &sites);
    assert!(hit.matched && hit.level.is_some());

    let miss = heritage::match_by_name("找不到的小筑堂", &sites);
    assert!(!miss.matched && miss.level.is_none());
}
