use crate::assessment::{Category, CategoryLevel};
use crate::config::TaskDistribution;

/// Minutes of one week's budget given to a category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryAllocation {
    pub category: Category,
    pub level: CategoryLevel,
    pub minutes: f64,
}

/// Weakness wins if a category appears in both lists; anything unlisted is moderate.
pub fn classify(category: Category, weaknesses: &[Category], strengths: &[Category]) -> CategoryLevel {
    if weaknesses.contains(&category) {
        CategoryLevel::Weak
    } else if strengths.contains(&category) {
        CategoryLevel::Strong
    } else {
        CategoryLevel::Moderate
    }
}

/// Allocate a week's minutes to each category by its diagnosed level.
///
/// Each category gets `minutes_budget * weight` on its own. The allocations are
/// not renormalized, so their sum depends on how many categories sit at each level.
pub fn resolve_priorities(
    categories: &[Category],
    weaknesses: &[Category],
    strengths: &[Category],
    minutes_budget: f64,
    distribution: &TaskDistribution,
) -> Vec<CategoryAllocation> {
    categories
        .iter()
        .map(|&category| {
            let level = classify(category, weaknesses, strengths);
            CategoryAllocation {
                category,
                level,
                minutes: minutes_budget * distribution.weight_for(level),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weak_listening_gets_sixty_percent() {
        let allocations = resolve_priorities(
            &[Category::Reading, Category::Listening, Category::Speaking],
            &[Category::Listening],
            &[Category::Speaking],
            600.0,
            &TaskDistribution::default(),
        );
        assert_eq!(allocations.len(), 3);
        assert_eq!(allocations[0].level, CategoryLevel::Moderate);
        assert!((allocations[0].minutes - 180.0).abs() < 1e-9);
        assert!((allocations[1].minutes - 360.0).abs() < 1e-9);
        assert!((allocations[2].minutes - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_renormalization() {
        let categories = Category::ALL;
        let allocations = resolve_priorities(&categories, &[], &[], 100.0, &TaskDistribution::default());
        let total: f64 = allocations.iter().map(|a| a.minutes).sum();
        assert!((total - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_weakness_wins_over_strength() {
        assert_eq!(
            classify(Category::Grammar, &[Category::Grammar], &[Category::Grammar]),
            CategoryLevel::Weak
        );
    }
}
