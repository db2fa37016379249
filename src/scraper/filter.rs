use log::debug;

use crate::models::job::JobRecord;
use crate::scraper::salary::{Currency, has_amount, parse_salary};
use crate::scraper::skills::SkillPolicy;
use crate::utils::config::{ConfigInner, SalaryThreshold};

/// Skill and salary acceptance rules applied to every scraped listing.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    skills: SkillPolicy,
    salary: SalaryThreshold,
}

impl JobFilter {
    pub fn new(skills: SkillPolicy, salary: SalaryThreshold) -> Self {
        Self { skills, salary }
    }

    pub fn from_config(config: &ConfigInner) -> Self {
        Self::new(SkillPolicy::new(&config.skills), config.salary.clone())
    }

    pub fn accepts(&self, job: &JobRecord) -> bool {
        self.skills.matches(&job.haystack()) && self.salary_ok(job)
    }

    /// Rejects only a salary with a number below the minimum for its own currency.
    fn salary_ok(&self, job: &JobRecord) -> bool {
        let text = job.get("salary").unwrap_or_default();
        let (currency, amount) = parse_salary(text);
        match self.minimum(currency) {
            Some(minimum) if has_amount(text) && amount < minimum => {
                debug!("salary {} {} is below the minimum of {}", amount, currency, minimum);
                false
            }
            _ => true,
        }
    }

    fn minimum(&self, currency: Currency) -> Option<f64> {
        let minimum = match currency {
            Currency::Usd => self.salary.usd,
            Currency::Brl => self.salary.brl,
            Currency::Unknown => None,
        };
        minimum.filter(|m| *m > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::SkillRequirement;

    fn job(salary: Option<&str>, title: &str) -> JobRecord {
        [
            ("salary", salary.map(str::to_string)),
            ("title", Some(title.to_string())),
        ]
        .into_iter()
        .collect()
    }

    fn thresholds(usd: Option<f64>, brl: Option<f64>) -> JobFilter {
        JobFilter::new(SkillPolicy::default(), SalaryThreshold { usd, brl })
    }

    #[test]
    fn below_minimum_is_rejected() {
        let filter = thresholds(Some(3000.0), Some(8000.0));
        assert!(!filter.accepts(&job(Some("$2500"), "dev")));
        assert!(!filter.accepts(&job(Some("R$ 7.999,99"), "dev")));
    }

    #[test]
    fn at_or_above_minimum_is_accepted() {
        let filter = thresholds(Some(3000.0), Some(8000.0));
        assert!(filter.accepts(&job(Some("USD 3000"), "dev")));
        assert!(filter.accepts(&job(Some("R$ 10.000"), "dev")));
    }

    #[test]
    fn threshold_only_applies_to_its_currency() {
        let filter = thresholds(None, Some(8000.0));
        assert!(filter.accepts(&job(Some("$10"), "dev")));
    }

    #[test]
    fn missing_or_unparseable_salary_is_accepted() {
        let filter = thresholds(Some(3000.0), Some(8000.0));
        assert!(filter.accepts(&job(None, "dev")));
        assert!(filter.accepts(&job(Some("a combinar"), "dev")));
        assert!(filter.accepts(&job(Some("USD, negotiable"), "dev")));
    }

    #[test]
    fn explicit_zero_salary_is_below_a_positive_minimum() {
        let filter = thresholds(Some(3000.0), Some(8000.0));
        assert!(!filter.accepts(&job(Some("$0"), "dev")));
        assert!(!filter.accepts(&job(Some("R$ 0,00"), "dev")));
    }

    #[test]
    fn zero_minimum_means_no_threshold() {
        let filter = thresholds(Some(0.0), None);
        assert!(filter.accepts(&job(Some("$0"), "dev")));
    }

    #[test]
    fn skill_policy_applies_first() {
        let filter = JobFilter::new(
            SkillPolicy::new(&[SkillRequirement::Keyword("rust".to_string())]),
            SalaryThreshold::default(),
        );
        assert!(!filter.accepts(&job(None, "Java Developer")));
        assert!(filter.accepts(&job(None, "Rust Developer")));
    }
}
