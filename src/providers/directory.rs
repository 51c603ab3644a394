use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Result, YardworkError};
use crate::providers::profile::ProviderProfile;

/// Store of provider profiles.
///
/// Provider records belong to the user-account system. The job core only
/// reads them and bumps their statistics on completion and feedback, so it
/// talks to them through this trait.
pub trait ProviderDirectory: Send + Sync {
    /// Create a profile. Registering a known id again only refreshes its
    /// name and service area; ratings, completions and reviews are kept.
    fn register(&self, profile: ProviderProfile) -> Result<()>;

    fn profile(&self, provider_id: &str) -> Result<ProviderProfile>;

    /// Add one rating and its formatted review.
    fn record_rating(&self, provider_id: &str, rating: u8, review: String) -> Result<ProviderProfile>;

    /// Count one more finished job.
    fn record_completion(&self, provider_id: &str) -> Result<ProviderProfile>;
}

/// Process-local directory used by the server and in tests
#[derive(Debug, Default)]
pub struct InMemoryProviderDirectory {
    profiles: RwLock<HashMap<String, ProviderProfile>>,
}

impl InMemoryProviderDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, ProviderProfile>>> {
        self.profiles
            .read()
            .map_err(|_| YardworkError::Internal("provider directory lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, ProviderProfile>>> {
        self.profiles
            .write()
            .map_err(|_| YardworkError::Internal("provider directory lock poisoned".to_string()))
    }

    fn update<F>(&self, provider_id: &str, apply: F) -> Result<ProviderProfile>
    where
        F: FnOnce(&mut ProviderProfile),
    {
        let mut profiles = self.write()?;
        let profile = profiles
            .get_mut(provider_id)
            .ok_or_else(|| YardworkError::ProviderNotFound(provider_id.to_string()))?;
        apply(profile);
        Ok(profile.clone())
    }
}

impl ProviderDirectory for InMemoryProviderDirectory {
    fn register(&self, profile: ProviderProfile) -> Result<()> {
        if profile.provider_id.trim().is_empty() {
            return Err(YardworkError::invalid("Missing provider ID."));
        }
        let mut profiles = self.write()?;
        match profiles.get_mut(&profile.provider_id) {
            Some(existing) => {
                existing.name = profile.name;
                existing.coords = profile.coords;
                existing.service_range_miles = profile.service_range_miles;
                tracing::info!(provider_id = %existing.provider_id, "Provider details updated");
            }
            None => {
                tracing::info!(provider_id = %profile.provider_id, "Provider registered");
                profiles.insert(profile.provider_id.clone(), profile);
            }
        }
        Ok(())
    }

    fn profile(&self, provider_id: &str) -> Result<ProviderProfile> {
        self.read()?
            .get(provider_id)
            .cloned()
            .ok_or_else(|| YardworkError::ProviderNotFound(provider_id.to_string()))
    }

    fn record_rating(&self, provider_id: &str, rating: u8, review: String) -> Result<ProviderProfile> {
        self.update(provider_id, |profile| {
            profile.total_rating += u32::from(rating);
            profile.rating_count += 1;
            profile.feedback.push(review);
        })
    }

    fn record_completion(&self, provider_id: &str) -> Result<ProviderProfile> {
        self.update(provider_id, |profile| profile.services_completed += 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_updates_sum_count_and_reviews() {
        let directory = InMemoryProviderDirectory::new();
        directory.register(ProviderProfile::new("p1", "Pat")).unwrap();

        let updated = directory
            .record_rating("p1", 4, "4|Front Only Lawn Trimming|1/5".to_string())
            .unwrap();
        assert_eq!(updated.total_rating, 9);
        assert_eq!(updated.rating_count, 2);
        assert_eq!(updated.feedback, vec!["4|Front Only Lawn Trimming|1/5"]);
    }

    #[test]
    fn completion_counts_up() {
        let directory = InMemoryProviderDirectory::new();
        directory.register(ProviderProfile::new("p1", "Pat")).unwrap();
        directory.record_completion("p1").unwrap();
        let profile = directory.record_completion("p1").unwrap();
        assert_eq!(profile.services_completed, 2);
    }

    #[test]
    fn re_register_keeps_statistics() {
        let directory = InMemoryProviderDirectory::new();
        directory.register(ProviderProfile::new("p1", "Pat")).unwrap();
        directory.record_completion("p1").unwrap();
        directory
            .record_rating("p1", 1, "1|late|Front Only Lawn Trimming|1/5".to_string())
            .unwrap();

        let moved = ProviderProfile::new("p1", "Pat Jones")
            .with_service_area(crate::jobs::Coords::new(42.36, -71.06), 10.0);
        directory.register(moved).unwrap();

        let profile = directory.profile("p1").unwrap();
        assert_eq!(profile.name, "Pat Jones");
        assert_eq!(profile.service_range_miles, Some(10.0));
        assert_eq!(profile.total_rating, 6);
        assert_eq!(profile.rating_count, 2);
        assert_eq!(profile.services_completed, 1);
        assert_eq!(profile.feedback.len(), 1);
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let directory = InMemoryProviderDirectory::new();
        assert!(matches!(
            directory.record_completion("ghost"),
            Err(YardworkError::ProviderNotFound(_))
        ));
        assert!(directory.profile("ghost").is_err());
    }
}
