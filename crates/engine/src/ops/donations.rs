//! Donation operations and the raised-total reconciliation.
//!
//! Every mutation pairs the donation write with the program's
//! `raised_minor` adjustment inside one store transaction, so a crash or
//! concurrent writer cannot leave the total half-applied. The adjustment is
//! still incremental: it applies to every donation regardless of status,
//! while the recompute path sums completed donations only, so the two can
//! disagree for pending/failed donations until a recompute runs.

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::store::{DocumentStore, Query, SortOrder, StoreTransaction};
use crate::util::{from_doc, normalize_optional_text, to_doc};
use crate::{
    Donation, DonationListFilter, DonationNewCmd, DonationUpdateCmd, EngineError, Program,
    ResultEngine, UserProfile, donations, programs, users,
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a donation and add its amount to the program's raised total.
    ///
    /// With an `idempotency_key`, retrying the same request returns the
    /// existing donation id instead of writing a second document. Without
    /// one, a duplicate submit double-counts.
    pub async fn create_donation(&self, cmd: DonationNewCmd) -> ResultEngine<Uuid> {
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        // Best-effort avatar denormalization; a failed profile fetch must
        // not block the donation.
        let donor_avatar = if cmd.is_anonymous {
            None
        } else {
            match self.store.get(users::COLLECTION, &cmd.donor_id).await {
                Ok(Some(doc)) => from_doc::<UserProfile>(doc, "user")
                    .ok()
                    .and_then(|profile| profile.avatar),
                Ok(None) => None,
                Err(err) => {
                    tracing::warn!(donor_id = %cmd.donor_id, "donor profile fetch failed: {err}");
                    None
                }
            }
        };

        with_tx!(self, |tx| {
            self.create_donation_in_tx(tx.as_mut(), cmd, donor_avatar)
                .await
        })
    }

    async fn create_donation_in_tx(
        &self,
        tx: &mut dyn StoreTransaction,
        cmd: DonationNewCmd,
        donor_avatar: Option<String>,
    ) -> ResultEngine<Uuid> {
        let program_key = cmd.program_id.to_string();
        let program_doc = tx
            .get(programs::COLLECTION, &program_key)
            .await?
            .ok_or_else(|| EngineError::NotFound("program".to_string()))?;
        let mut program: Program = from_doc(program_doc, "program")?;

        if let Some(key) = cmd.idempotency_key.as_deref() {
            let existing = tx
                .find(
                    donations::COLLECTION,
                    Query::new()
                        .filter("donorId", cmd.donor_id.as_str())
                        .filter("idempotencyKey", key),
                )
                .await?;
            if let Some(doc) = existing.into_iter().next() {
                let donation: Donation = from_doc(doc, "donation")?;
                return Ok(donation.id);
            }
        }

        let mut donation = Donation::new(
            cmd.program_id,
            cmd.donor_id,
            cmd.donor_name,
            cmd.amount_minor,
            cmd.date,
            cmd.status,
            cmd.payment_method,
        )?;
        donation.donor_avatar = donor_avatar;
        donation.is_anonymous = cmd.is_anonymous;
        donation.note = normalize_optional_text(cmd.note.as_deref());
        donation.idempotency_key = cmd.idempotency_key;

        tx.insert(
            donations::COLLECTION,
            &donation.id.to_string(),
            to_doc(&donation)?,
        )?;

        program.raised_minor += donation.amount_minor;
        program.updated_at = Utc::now();
        tx.put(programs::COLLECTION, &program_key, to_doc(&program)?);

        Ok(donation.id)
    }

    /// Update a donation; an amount change adjusts the program's raised
    /// total by exactly `new - old`.
    pub async fn update_donation(&self, id: Uuid, cmd: DonationUpdateCmd) -> ResultEngine<()> {
        if let Some(amount) = cmd.amount_minor
            && amount <= 0
        {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        with_tx!(self, |tx| {
            self.update_donation_in_tx(tx.as_mut(), id, cmd).await
        })
    }

    async fn update_donation_in_tx(
        &self,
        tx: &mut dyn StoreTransaction,
        id: Uuid,
        cmd: DonationUpdateCmd,
    ) -> ResultEngine<()> {
        let key = id.to_string();
        let doc = tx
            .get(donations::COLLECTION, &key)
            .await?
            .ok_or_else(|| EngineError::NotFound("donation".to_string()))?;
        let mut donation: Donation = from_doc(doc, "donation")?;
        let old_amount = donation.amount_minor;

        if let Some(amount) = cmd.amount_minor {
            donation.amount_minor = amount;
        }
        if let Some(date) = cmd.date {
            donation.date = date;
        }
        if let Some(status) = cmd.status {
            donation.status = status;
        }
        if let Some(method) = cmd.payment_method {
            donation.payment_method = method;
        }
        if let Some(note) = cmd.note {
            donation.note = normalize_optional_text(Some(&note));
        }

        if donation.amount_minor != old_amount {
            let program_key = donation.program_id.to_string();
            match tx.get(programs::COLLECTION, &program_key).await? {
                Some(program_doc) => {
                    let mut program: Program = from_doc(program_doc, "program")?;
                    program.raised_minor += donation.amount_minor - old_amount;
                    program.updated_at = Utc::now();
                    tx.put(programs::COLLECTION, &program_key, to_doc(&program)?);
                }
                None => {
                    tracing::warn!(
                        program_id = %donation.program_id,
                        "donation updated for a missing program; raised total not adjusted"
                    );
                }
            }
        }

        tx.put(donations::COLLECTION, &key, to_doc(&donation)?);
        Ok(())
    }

    /// Delete a donation, subtracting its amount from the program's raised
    /// total (floored at zero).
    pub async fn delete_donation(&self, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |tx| { self.delete_donation_in_tx(tx.as_mut(), id).await })
    }

    async fn delete_donation_in_tx(
        &self,
        tx: &mut dyn StoreTransaction,
        id: Uuid,
    ) -> ResultEngine<()> {
        let key = id.to_string();
        let doc = tx
            .get(donations::COLLECTION, &key)
            .await?
            .ok_or_else(|| EngineError::NotFound("donation".to_string()))?;
        let donation: Donation = from_doc(doc, "donation")?;

        let program_key = donation.program_id.to_string();
        match tx.get(programs::COLLECTION, &program_key).await? {
            Some(program_doc) => {
                let mut program: Program = from_doc(program_doc, "program")?;
                program.raised_minor = (program.raised_minor - donation.amount_minor).max(0);
                program.updated_at = Utc::now();
                tx.put(programs::COLLECTION, &program_key, to_doc(&program)?);
            }
            None => {
                tracing::warn!(
                    program_id = %donation.program_id,
                    "donation deleted for a missing program; raised total not adjusted"
                );
            }
        }

        tx.delete(donations::COLLECTION, &key);
        Ok(())
    }

    pub async fn donation(&self, id: Uuid) -> ResultEngine<Donation> {
        let doc = self
            .store
            .get(donations::COLLECTION, &id.to_string())
            .await?
            .ok_or_else(|| EngineError::NotFound("donation".to_string()))?;
        from_doc(doc, "donation")
    }

    /// List donations, newest donation date first.
    pub async fn list_donations(&self, filter: DonationListFilter) -> ResultEngine<Vec<Donation>> {
        let mut query = Query::new().order_by("date", SortOrder::Desc);
        if let Some(program_id) = filter.program_id {
            query = query.filter("programId", program_id.to_string());
        }
        if let Some(donor_id) = &filter.donor_id {
            query = query.filter("donorId", donor_id.as_str());
        }
        if let Some(status) = filter.status {
            query = query.filter("status", status.as_str());
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        let docs = self.store.find(donations::COLLECTION, query).await?;
        docs.into_iter()
            .map(|doc| from_doc(doc, "donation"))
            .collect()
    }

    /// Most recently created donations.
    pub async fn recent_donations(&self, limit: usize) -> ResultEngine<Vec<Donation>> {
        fetch_recent(self.store.as_ref(), limit).await
    }

    /// Push-based recent-donations feed.
    ///
    /// The callback receives the refreshed list immediately and again after
    /// every change to the donations collection. Dropping the returned
    /// handle unsubscribes.
    pub fn subscribe_recent_donations<F>(&self, limit: usize, on_change: F) -> DonationFeed
    where
        F: Fn(Vec<Donation>) + Send + 'static,
    {
        let store = self.store();
        let mut events = store.watch(donations::COLLECTION);
        let handle = tokio::spawn(async move {
            loop {
                match fetch_recent(store.as_ref(), limit).await {
                    Ok(recent) => on_change(recent),
                    Err(err) => tracing::warn!("recent donations refresh failed: {err}"),
                }
                loop {
                    match events.recv().await {
                        Ok(_) => break,
                        Err(broadcast::error::RecvError::Lagged(_)) => break,
                        Err(broadcast::error::RecvError::Closed) => return,
                    }
                }
            }
        });
        DonationFeed { handle }
    }
}

async fn fetch_recent(store: &dyn DocumentStore, limit: usize) -> ResultEngine<Vec<Donation>> {
    let docs = store
        .find(
            donations::COLLECTION,
            Query::new()
                .order_by("createdAt", SortOrder::Desc)
                .limit(limit),
        )
        .await?;
    docs.into_iter()
        .map(|doc| from_doc(doc, "donation"))
        .collect()
}

/// Live subscription to the recent-donations list; unsubscribes on drop.
pub struct DonationFeed {
    handle: tokio::task::JoinHandle<()>,
}

impl DonationFeed {
    /// Explicit teardown; equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for DonationFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
