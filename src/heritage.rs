//! Heritage-Level Resolver
//!
//! Assigns a protection-level label to each garden record by trying three
//! fallback strategies in fixed priority order:
//!
//! 1. Name match against the national heritage-site register (exact first,
//!    then substring match after stripping a common domain suffix)
//! 2. Geographic proximity match (haversine, 1 km threshold by default)
//! 3. Keyword search over the free-text description
//!
//! The first strategy that succeeds wins; a record that matches none keeps
//! its level unset. Resolution is a pure function of one record plus the
//! read-only register, so the caller owns all persistence.

use crate::dataset::{GardenRecord, HeritageSite};
use crate::geo::haversine_km;

/// National-register level assigned on a name match.
pub const LEVEL_NATIONAL: &str = "全国";
/// National-register level assigned on a proximity-only match.
pub const LEVEL_NATIONAL_BY_LOCATION: &str = "全国（地点推测）";

/// Default proximity threshold in kilometres.
pub const DEFAULT_THRESHOLD_KM: f64 = 1.0;

/// Common suffix words stripped before fuzzy name matching.
///
/// Kept as-is from the scraping-era heuristic, duplicates included. Matching
/// strips the suffix whose match starts leftmost; among suffixes starting at
/// the same position, earlier entries in this list win.
const NAME_SUFFIXES: &[&str] = &[
    "园", "庄", "亭", "堂", "寺", "塔", "楼", "阁", "轩", "斋", "居", "室", "舫", "榭", "廊",
    "桥", "池", "湖", "山", "石", "峰", "洞", "泉", "井", "台", "坛", "祠", "庙", "观", "院",
    "馆", "所", "厅", "房", "屋", "宅", "府", "第", "里", "巷", "街", "路", "道", "桥", "门",
    "城", "墙", "关", "口", "渡", "码头", "市场", "广场", "公园", "花园", "别墅", "山庄",
    "度假村", "酒店", "宾馆", "饭店", "餐厅", "茶楼", "会所", "俱乐部", "中心", "基地",
    "园区", "景区", "风景区", "旅游区", "保护区", "遗址", "故居", "纪念馆", "博物馆",
    "展览馆", "文化馆", "图书馆", "档案馆", "研究所", "学校", "大学", "学院", "医院",
    "诊所", "银行", "商店", "超市", "市场", "工厂", "公司", "企业", "机关", "政府",
    "委员会", "办公室", "部门", "局", "处", "科", "股", "组", "队", "站", "所", "中心",
    "基地", "园区", "景区", "风景区", "旅游区", "保护区",
];

/// Literal phrases denoting protection tiers, tested in priority order.
/// The first phrase found as a substring wins regardless of its position
/// in the description, so the bare "文物保护单位" catch-all comes last.
const DESCRIPTION_PATTERNS: &[(&str, &str)] = &[
    ("全国重点文物保护单位", "全国"),
    ("国家重点文物保护单位", "全国"),
    ("省级文物保护单位", "省级"),
    ("市级文物保护单位", "市级"),
    ("县级文物保护单位", "县级"),
    ("区级文物保护单位", "区级"),
    ("文物保护单位", "文物保护单位"),
];

/// Outcome of a single matching strategy. Transient, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: bool,
    pub level: Option<&'static str>,
}

impl MatchResult {
    fn hit(level: &'static str) -> Self {
        MatchResult {
            matched: true,
            level: Some(level),
        }
    }

    fn miss() -> Self {
        MatchResult {
            matched: false,
            level: None,
        }
    }
}

/// Which strategy produced a resolution. Drivers use this for tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    Name,
    Location,
    Description,
}

/// A resolved protection level together with the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub level: &'static str,
    pub method: MatchMethod,
}

/// Strip the first known suffix, scanning match positions left to right and
/// the suffix list in order within each position. Returns the name unchanged
/// when no suffix matches at the end.
pub fn strip_known_suffix(name: &str) -> &str {
    for (pos, _) in name.char_indices() {
        for suffix in NAME_SUFFIXES {
            if &name[pos..] == *suffix {
                return &name[..pos];
            }
        }
    }
    name
}

/// Match a garden by name against the register.
///
/// Exact equality first; failing that, any site name containing the
/// suffix-stripped garden name as a substring counts. Multiple candidates are
/// not disambiguated: any hit yields the national level. Note that a garden
/// name consisting entirely of a suffix strips to the empty string, which
/// every site name contains (known heuristic gap, kept deliberately).
pub fn match_by_name(garden_name: &str, sites: &[HeritageSite]) -> MatchResult {
    if sites.iter().any(|site| site.name == garden_name) {
        return MatchResult::hit(LEVEL_NATIONAL);
    }

    let stripped = strip_known_suffix(garden_name);
    if sites.iter().any(|site| site.name.contains(stripped)) {
        return MatchResult::hit(LEVEL_NATIONAL);
    }

    MatchResult::miss()
}

/// Match a garden by proximity to the nearest register site.
///
/// Skips records with a missing coordinate; sites with missing coordinates
/// are infinitely far. The threshold is inclusive: a garden exactly
/// `threshold_km` away counts as matched.
pub fn match_by_location(
    longitude: Option<f64>,
    latitude: Option<f64>,
    sites: &[HeritageSite],
    threshold_km: f64,
) -> MatchResult {
    let (Some(lon), Some(lat)) = (longitude, latitude) else {
        return MatchResult::miss();
    };

    let min_distance = sites
        .iter()
        .map(|site| match (site.longitude, site.latitude) {
            (Some(site_lon), Some(site_lat)) => haversine_km(lon, lat, site_lon, site_lat),
            _ => f64::INFINITY,
        })
        .fold(f64::INFINITY, f64::min);

    if min_distance <= threshold_km {
        MatchResult::hit(LEVEL_NATIONAL_BY_LOCATION)
    } else {
        MatchResult::miss()
    }
}

/// Scan a description for protection-tier phrases, first pattern wins.
pub fn search_description(description: Option<&str>) -> Option<&'static str> {
    let text = description?;
    DESCRIPTION_PATTERNS
        .iter()
        .find(|(pattern, _)| text.contains(pattern))
        .map(|&(_, level)| level)
}

/// Resolve one record: name match, then location, then description.
///
/// Pure: the caller writes the level back into its output table.
pub fn resolve(record: &GardenRecord, sites: &[HeritageSite]) -> Option<Resolution> {
    if let Some(level) = match_by_name(&record.name, sites).level {
        return Some(Resolution {
            level,
            method: MatchMethod::Name,
        });
    }

    let by_location = match_by_location(
        record.longitude,
        record.latitude,
        sites,
        DEFAULT_THRESHOLD_KM,
    );
    if let Some(level) = by_location.level {
        return Some(Resolution {
            level,
            method: MatchMethod::Location,
        });
    }

    search_description(record.description.as_deref()).map(|level| Resolution {
        level,
        method: MatchMethod::Description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, lon: f64, lat: f64) -> HeritageSite {
        HeritageSite {
            name: name.to_string(),
            longitude: Some(lon),
            latitude: Some(lat),
        }
    }

    fn record(
        name: &str,
        lon: Option<f64>,
        lat: Option<f64>,
        desc: Option<&str>,
    ) -> GardenRecord {
        GardenRecord {
            name: name.to_string(),
            longitude: lon,
            latitude: lat,
            description: desc.map(str::to_string),
        }
    }

    #[test]
    fn test_exact_name_match() {
        let sites = vec![site("拙政园", 120.629, 31.325)];
        let result = match_by_name("拙政园", &sites);
        assert!(result.matched);
        assert_eq!(result.level, Some(LEVEL_NATIONAL));
    }

    #[test]
    fn test_fuzzy_name_match_after_suffix_strip() {
        // "耦园" strips to "耦", which "耦园（含宅园）" contains
        let sites = vec![site("耦园（含宅园）", 120.64, 31.31)];
        assert!(match_by_name("耦园", &sites).matched);
    }

    #[test]
    fn test_name_miss() {
        let sites = vec![site("虎丘云岩寺塔", 120.57, 31.35)];
        assert!(!match_by_name("沧浪亭东斋小筑堂", &sites).matched);
    }

    #[test]
    fn test_suffix_strip_leftmost_wins() {
        // "山庄" as a whole strips before the lone "庄" gets a chance
        assert_eq!(strip_known_suffix("东山山庄"), "东山");
        assert_eq!(strip_known_suffix("狮子林"), "狮子林");
        assert_eq!(strip_known_suffix("某某纪念馆"), "某某");
    }

    #[test]
    fn test_suffix_only_name_strips_to_empty() {
        assert_eq!(strip_known_suffix("公园"), "");
        // The empty string is a substring of everything: any register hit
        let sites = vec![site("随便什么名字", 0.0, 0.0)];
        assert!(match_by_name("公园", &sites).matched);
    }

    #[test]
    fn test_location_match_within_threshold() {
        // ~0.48 km east of the garden point
        let sites = vec![site("某文保单位", 120.005, 31.000)];
        let result = match_by_location(Some(120.000), Some(31.000), &sites, 1.0);
        assert!(result.matched);
        assert_eq!(result.level, Some(LEVEL_NATIONAL_BY_LOCATION));
    }

    #[test]
    fn test_location_threshold_is_inclusive() {
        let sites = vec![site("s", 120.005, 31.000)];
        let d = haversine_km(120.000, 31.000, 120.005, 31.000);

        // Exactly at the threshold: matched
        assert!(match_by_location(Some(120.000), Some(31.000), &sites, d).matched);
        // Just inside the distance: not matched
        assert!(!match_by_location(Some(120.000), Some(31.000), &sites, d * 0.999).matched);
    }

    #[test]
    fn test_location_skips_missing_coordinates() {
        let sites = vec![site("s", 120.0, 31.0)];
        assert!(!match_by_location(None, Some(31.0), &sites, 1.0).matched);
        assert!(!match_by_location(Some(120.0), None, &sites, 1.0).matched);
    }

    #[test]
    fn test_location_ignores_sites_without_coordinates() {
        let sites = vec![HeritageSite {
            name: "无坐标".to_string(),
            longitude: None,
            latitude: None,
        }];
        assert!(!match_by_location(Some(120.0), Some(31.0), &sites, 1.0).matched);
    }

    #[test]
    fn test_description_priority_order() {
        assert_eq!(
            search_description(Some("市级文物保护单位")),
            Some("市级")
        );
        // Both phrases present: the national pattern wins regardless of
        // where it sits in the string
        assert_eq!(
            search_description(Some("市级文物保护单位，后升为全国重点文物保护单位")),
            Some("全国")
        );
        assert_eq!(
            search_description(Some("普通的文物保护单位")),
            Some("文物保护单位")
        );
        assert_eq!(search_description(Some("与文保无关的描述")), None);
        assert_eq!(search_description(None), None);
    }

    #[test]
    fn test_resolve_name_beats_location() {
        // Record matches both by name and by distance: name label wins
        let sites = vec![site("拙政园", 120.629, 31.325)];
        let rec = record("拙政园", Some(120.629), Some(31.325), None);
        let res = resolve(&rec, &sites).unwrap();
        assert_eq!(res.level, LEVEL_NATIONAL);
        assert_eq!(res.method, MatchMethod::Name);
    }

    #[test]
    fn test_resolve_falls_through_to_description() {
        let sites = vec![site("远处的文保单位", 121.5, 32.5)];
        let rec = record(
            "独立小筑堂",
            Some(120.0),
            Some(31.0),
            Some("市级文物保护单位"),
        );
        let res = resolve(&rec, &sites).unwrap();
        assert_eq!(res.level, "市级");
        assert_eq!(res.method, MatchMethod::Description);
    }

    #[test]
    fn test_resolve_unmatched_stays_unset() {
        let sites = vec![site("远处的文保单位", 121.5, 32.5)];
        let rec = record("独立小筑堂", None, None, Some("无关描述"));
        assert!(resolve(&rec, &sites).is_none());
    }
}
