// 💎 Resource Planner - how many pulls will be saved up by each banner
//
// Jewels accrue daily until a banner's predicted local start. Tickets are
// category-specific: character tickets roll character banners, single
// tickets roll item banners.

use crate::model::{Banner, BannerCategory};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const JEWELS_PER_PULL: i64 = 150;
pub const DEFAULT_SPARK_COST: i64 = 30_000;
pub const DEFAULT_DAILY_JEWEL_INCOME: i64 = 600;

// ============================================================================
// USER RESOURCES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResources {
    pub jewels: i64,
    pub character_tickets: i64,
    pub single_tickets: i64,
    pub daily_jewel_income: i64,
}

impl Default for UserResources {
    fn default() -> Self {
        UserResources {
            jewels: 0,
            character_tickets: 0,
            single_tickets: 0,
            daily_jewel_income: DEFAULT_DAILY_JEWEL_INCOME,
        }
    }
}

// ============================================================================
// CALCULATOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResourceCalculator {
    pub spark_cost: i64,
}

impl ResourceCalculator {
    pub fn new() -> Self {
        Self::with_spark_cost(DEFAULT_SPARK_COST)
    }

    pub fn with_spark_cost(spark_cost: i64) -> Self {
        ResourceCalculator { spark_cost }
    }

    /// Resources on `target_date` if income keeps flowing from `today`
    ///
    /// A target in the past leaves the resources unchanged.
    pub fn projected_resources(
        &self,
        current: &UserResources,
        target_date: NaiveDate,
        today: NaiveDate,
    ) -> UserResources {
        if target_date < today {
            return *current;
        }

        let days = (target_date - today).num_days();
        UserResources {
            jewels: current.jewels.saturating_add(days.saturating_mul(current.daily_jewel_income)),
            ..*current
        }
    }

    /// Pulls available on a banner of `category`; `None` counts every ticket
    pub fn total_pulls(&self, resources: &UserResources, category: Option<BannerCategory>) -> i64 {
        let jewel_pulls = resources.jewels / JEWELS_PER_PULL;
        let ticket_pulls = match category {
            Some(BannerCategory::Character) => resources.character_tickets,
            Some(BannerCategory::Item) => resources.single_tickets,
            None => resources.character_tickets + resources.single_tickets,
        };
        jewel_pulls + ticket_pulls
    }

    /// Whether the pulls add up to a guaranteed pick
    pub fn can_spark(&self, resources: &UserResources, category: Option<BannerCategory>) -> bool {
        self.total_pulls(resources, category) * JEWELS_PER_PULL >= self.spark_cost
    }
}

impl Default for ResourceCalculator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PLAN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerProjection {
    pub banner: Banner,
    pub predicted_start: NaiveDate,
    pub predicted_end: NaiveDate,
    pub projected_resources: UserResources,
    pub projected_pulls: i64,
    pub can_spark: bool,
}

/// Project resources onto each tracked banner, earliest predicted start first
///
/// Every projection is independent: savings are not spent between banners.
pub fn plan(
    tracked: &[Banner],
    resources: &UserResources,
    today: NaiveDate,
    offset_days: i64,
    calculator: &ResourceCalculator,
) -> Vec<BannerProjection> {
    let mut projections: Vec<BannerProjection> = tracked
        .iter()
        .map(|banner| {
            let predicted_start = banner.predicted_local_start(offset_days);
            let projected = calculator.projected_resources(resources, predicted_start, today);

            BannerProjection {
                banner: banner.clone(),
                predicted_start,
                predicted_end: banner.predicted_local_end(offset_days),
                projected_resources: projected,
                projected_pulls: calculator.total_pulls(&projected, Some(banner.category)),
                can_spark: calculator.can_spark(&projected, Some(banner.category)),
            }
        })
        .collect();

    // Stable: banners starting the same day keep feed order
    projections.sort_by_key(|p| p.predicted_start);
    projections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BannerCardInfo, CardSubtype, DEFAULT_OFFSET_DAYS};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn banner(id: &str, category: BannerCategory, start: NaiveDate) -> Banner {
        Banner {
            id: id.to_string(),
            name: id.to_string(),
            category,
            source_start_date: start,
            source_end_date: start + chrono::Duration::days(9),
            image_reference: None,
            external_link_url: None,
            is_tracked: true,
            featured_entities: vec![BannerCardInfo {
                name: id.to_string(),
                subtype: CardSubtype::Unknown,
                image_reference: None,
            }],
        }
    }

    fn resources(jewels: i64, character_tickets: i64, single_tickets: i64) -> UserResources {
        UserResources {
            jewels,
            character_tickets,
            single_tickets,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_income() {
        assert_eq!(UserResources::default().daily_jewel_income, 600);
    }

    #[test]
    fn test_projected_resources_accrue_daily() {
        let calc = ResourceCalculator::new();
        let projected = calc.projected_resources(
            &resources(1_000, 2, 3),
            date(2025, 1, 11),
            date(2025, 1, 1),
        );

        assert_eq!(projected.jewels, 7_000);
        assert_eq!(projected.character_tickets, 2);
        assert_eq!(projected.single_tickets, 3);
    }

    #[test]
    fn test_projected_resources_past_target_unchanged() {
        let calc = ResourceCalculator::new();
        let current = resources(1_000, 0, 0);

        assert_eq!(
            calc.projected_resources(&current, date(2024, 12, 1), date(2025, 1, 1)),
            current
        );
        assert_eq!(
            calc.projected_resources(&current, date(2025, 1, 1), date(2025, 1, 1)),
            current
        );
    }

    #[test]
    fn test_projected_resources_saturate_on_huge_income() {
        let calc = ResourceCalculator::new();
        let current = UserResources {
            daily_jewel_income: i64::MAX,
            ..resources(1_000, 0, 0)
        };

        let projected = calc.projected_resources(&current, date(2025, 1, 11), date(2025, 1, 1));
        assert_eq!(projected.jewels, i64::MAX);

        let drained = UserResources {
            daily_jewel_income: i64::MIN,
            ..resources(-1_000, 0, 0)
        };
        let projected = calc.projected_resources(&drained, date(2025, 1, 11), date(2025, 1, 1));
        assert_eq!(projected.jewels, i64::MIN);
    }

    #[test]
    fn test_total_pulls_by_category() {
        let calc = ResourceCalculator::new();
        let res = resources(1_540, 4, 7);

        assert_eq!(calc.total_pulls(&res, Some(BannerCategory::Character)), 14);
        assert_eq!(calc.total_pulls(&res, Some(BannerCategory::Item)), 17);
        assert_eq!(calc.total_pulls(&res, None), 21);
    }

    #[test]
    fn test_can_spark_threshold() {
        let calc = ResourceCalculator::new();

        assert!(calc.can_spark(&resources(30_000, 0, 0), Some(BannerCategory::Character)));
        assert!(!calc.can_spark(&resources(29_999, 0, 0), Some(BannerCategory::Character)));
        assert!(calc.can_spark(&resources(29_850, 1, 0), Some(BannerCategory::Character)));
        assert!(!calc.can_spark(&resources(29_850, 1, 0), Some(BannerCategory::Item)));
        assert!(ResourceCalculator::with_spark_cost(150).can_spark(&resources(150, 0, 0), None));
    }

    #[test]
    fn test_plan_sorted_by_predicted_start() {
        let tracked = vec![
            banner("later", BannerCategory::Item, date(2024, 3, 1)),
            banner("sooner", BannerCategory::Character, date(2024, 1, 1)),
        ];
        let today = date(2025, 5, 1);

        let projections = plan(
            &tracked,
            &resources(0, 0, 0),
            today,
            DEFAULT_OFFSET_DAYS,
            &ResourceCalculator::new(),
        );

        assert_eq!(projections.len(), 2);
        assert_eq!(projections[0].banner.id, "sooner");
        assert_eq!(projections[0].predicted_start, date(2025, 5, 5));
        assert_eq!(projections[0].projected_resources.jewels, 4 * 600);
        assert_eq!(projections[0].projected_pulls, 16);
        assert!(!projections[0].can_spark);
        assert_eq!(projections[1].banner.id, "later");
        assert!(projections[1].predicted_start > projections[0].predicted_start);
    }

    #[test]
    fn test_plan_empty() {
        let projections = plan(
            &[],
            &UserResources::default(),
            date(2025, 1, 1),
            DEFAULT_OFFSET_DAYS,
            &ResourceCalculator::new(),
        );
        assert!(projections.is_empty());
    }
}
