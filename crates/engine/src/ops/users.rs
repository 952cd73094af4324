//! User profile operations.

use crate::store::{DocumentStore, Query};
use crate::util::{from_doc, map_insert_err, normalize_optional_text, require_text, to_doc};
use crate::{
    EngineError, OnboardingCmd, RegisterProfileCmd, ResultEngine, UserProfile, UserRole,
    UserUpdateCmd, users,
};

use super::Engine;

impl Engine {
    /// Create the profile document for a freshly registered account.
    pub async fn register_profile(&self, cmd: RegisterProfileCmd) -> ResultEngine<()> {
        let name = require_text(&cmd.name, "name")?;
        let email = require_text(&cmd.email, "email")?;
        let profile = UserProfile::new(cmd.uid, name, email, cmd.role);
        self.store
            .insert(users::COLLECTION, &profile.id, to_doc(&profile)?)
            .await
            .map_err(|err| map_insert_err(err, "user"))?;
        Ok(())
    }

    /// Fetch a profile, creating a donor profile on first federated sign-in.
    pub async fn ensure_profile(
        &self,
        uid: &str,
        name: &str,
        email: &str,
    ) -> ResultEngine<UserProfile> {
        if let Some(doc) = self.store.get(users::COLLECTION, uid).await? {
            return from_doc(doc, "user");
        }
        let profile = UserProfile::new(
            uid.to_string(),
            name.to_string(),
            email.to_string(),
            UserRole::Donor,
        );
        self.store
            .insert(users::COLLECTION, uid, to_doc(&profile)?)
            .await
            .map_err(|err| map_insert_err(err, "user"))?;
        Ok(profile)
    }

    pub async fn profile(&self, uid: &str) -> ResultEngine<UserProfile> {
        let doc = self
            .store
            .get(users::COLLECTION, uid)
            .await?
            .ok_or_else(|| EngineError::NotFound("user".to_string()))?;
        from_doc(doc, "user")
    }

    pub async fn update_profile(&self, uid: &str, cmd: UserUpdateCmd) -> ResultEngine<()> {
        let mut profile = self.profile(uid).await?;
        if let Some(name) = cmd.name {
            profile.name = require_text(&name, "name")?;
        }
        if let Some(avatar) = cmd.avatar {
            profile.avatar = normalize_optional_text(Some(&avatar));
        }
        self.store
            .put(users::COLLECTION, uid, to_doc(&profile)?)
            .await?;
        Ok(())
    }

    /// Store the onboarding survey answers and mark onboarding done.
    pub async fn complete_onboarding(&self, uid: &str, cmd: OnboardingCmd) -> ResultEngine<()> {
        let mut profile = self.profile(uid).await?;
        profile.interests = cmd.interests;
        profile.preferred_contact = normalize_optional_text(Some(&cmd.preferred_contact));
        profile.how_heard = normalize_optional_text(Some(&cmd.how_heard));
        profile.donation_frequency = normalize_optional_text(Some(&cmd.donation_frequency));
        profile.onboarding_completed = true;
        self.store
            .put(users::COLLECTION, uid, to_doc(&profile)?)
            .await?;
        Ok(())
    }

    pub async fn list_users(&self) -> ResultEngine<Vec<UserProfile>> {
        let docs = self.store.find(users::COLLECTION, Query::new()).await?;
        docs.into_iter().map(|doc| from_doc(doc, "user")).collect()
    }
}
