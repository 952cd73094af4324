//! Program operations: CRUD plus the recompute-from-source paths.

use chrono::Utc;
use uuid::Uuid;

use crate::store::{DocumentStore, Query, SortOrder, StoreTransaction};
use crate::util::{from_doc, map_insert_err, normalize_optional_text, require_text, to_doc};
use crate::{
    Donation, DonationStatus, EngineError, Program, ProgramListFilter, ProgramNewCmd,
    ProgramUpdateCmd, ResultEngine, donations, programs,
};

use super::volunteers::recount_volunteers_in_tx;
use super::{Engine, with_tx};

impl Engine {
    pub async fn create_program(&self, cmd: ProgramNewCmd) -> ResultEngine<Uuid> {
        let title = require_text(&cmd.title, "title")?;
        let category = require_text(&cmd.category, "category")?;
        let mut program = Program::new(
            title,
            cmd.description,
            category,
            cmd.location,
            cmd.manager,
            cmd.start_date,
            cmd.end_date,
            cmd.target_minor,
            cmd.status,
        )?;
        program.is_featured = cmd.is_featured;
        program.image_url = normalize_optional_text(cmd.image_url.as_deref());
        program.tags = cmd.tags;

        self.store
            .insert(
                programs::COLLECTION,
                &program.id.to_string(),
                to_doc(&program)?,
            )
            .await
            .map_err(|err| map_insert_err(err, "program"))?;
        Ok(program.id)
    }

    pub async fn program(&self, id: Uuid) -> ResultEngine<Program> {
        let doc = self
            .store
            .get(programs::COLLECTION, &id.to_string())
            .await?
            .ok_or_else(|| EngineError::NotFound("program".to_string()))?;
        from_doc(doc, "program")
    }

    /// List programs, newest first.
    pub async fn list_programs(&self, filter: ProgramListFilter) -> ResultEngine<Vec<Program>> {
        let mut query = Query::new().order_by("createdAt", SortOrder::Desc);
        if let Some(status) = filter.status {
            query = query.filter("status", status.as_str());
        }
        if let Some(category) = &filter.category {
            query = query.filter("category", category.as_str());
        }
        if filter.featured_only {
            query = query.filter("isFeatured", true);
        }
        let docs = self.store.find(programs::COLLECTION, query).await?;
        docs.into_iter()
            .map(|doc| from_doc(doc, "program"))
            .collect()
    }

    /// Partial update. The derived fields (`raised_minor`, `volunteers`)
    /// are never written through this path.
    pub async fn update_program(&self, id: Uuid, cmd: ProgramUpdateCmd) -> ResultEngine<()> {
        with_tx!(self, |tx| { update_program_in_tx(tx.as_mut(), id, cmd).await })
    }

    /// Delete the program document. Donations and volunteers referencing it
    /// are left in place; the recompute tooling skips orphans.
    pub async fn delete_program(&self, id: Uuid) -> ResultEngine<()> {
        self.program(id).await?;
        self.store
            .delete(programs::COLLECTION, &id.to_string())
            .await?;
        Ok(())
    }

    /// Overwrite `raised_minor` with the sum of the program's completed
    /// donations. The only self-correcting path for drift.
    pub async fn recompute_raised(&self, program_id: Uuid) -> ResultEngine<i64> {
        with_tx!(self, |tx| {
            recompute_raised_in_tx(tx.as_mut(), program_id).await
        })
    }

    /// Recompute raised totals and volunteer counts for every program.
    pub async fn recompute_all(&self) -> ResultEngine<usize> {
        let all = self.list_programs(ProgramListFilter::default()).await?;
        let count = all.len();
        for program in all {
            let repaired: ResultEngine<()> = with_tx!(self, |tx| {
                recompute_raised_in_tx(tx.as_mut(), program.id).await?;
                recount_volunteers_in_tx(tx.as_mut(), program.id).await?;
                Ok(())
            });
            repaired?;
        }
        Ok(count)
    }
}

async fn update_program_in_tx(
    tx: &mut dyn StoreTransaction,
    id: Uuid,
    cmd: ProgramUpdateCmd,
) -> ResultEngine<()> {
    let key = id.to_string();
    let doc = tx
        .get(programs::COLLECTION, &key)
        .await?
        .ok_or_else(|| EngineError::NotFound("program".to_string()))?;
    let mut program: Program = from_doc(doc, "program")?;

    if let Some(title) = cmd.title {
        program.title = require_text(&title, "title")?;
    }
    if let Some(description) = cmd.description {
        program.description = description;
    }
    if let Some(category) = cmd.category {
        program.category = require_text(&category, "category")?;
    }
    if let Some(location) = cmd.location {
        program.location = location;
    }
    if let Some(manager) = cmd.manager {
        program.manager = manager;
    }
    if let Some(start_date) = cmd.start_date {
        program.start_date = start_date;
    }
    if let Some(end_date) = cmd.end_date {
        program.end_date = end_date;
    }
    if let Some(target_minor) = cmd.target_minor {
        if target_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "target_minor must be > 0".to_string(),
            ));
        }
        program.target_minor = target_minor;
    }
    if let Some(status) = cmd.status {
        program.status = status;
    }
    if let Some(is_featured) = cmd.is_featured {
        program.is_featured = is_featured;
    }
    if let Some(image_url) = cmd.image_url {
        program.image_url = normalize_optional_text(Some(&image_url));
    }
    if let Some(tags) = cmd.tags {
        program.tags = tags;
    }

    if program.start_date > program.end_date {
        return Err(EngineError::InvalidField(
            "start_date must not be after end_date".to_string(),
        ));
    }

    program.updated_at = Utc::now();
    tx.put(programs::COLLECTION, &key, to_doc(&program)?);
    Ok(())
}

pub(super) async fn recompute_raised_in_tx(
    tx: &mut dyn StoreTransaction,
    program_id: Uuid,
) -> ResultEngine<i64> {
    let key = program_id.to_string();
    let doc = tx
        .get(programs::COLLECTION, &key)
        .await?
        .ok_or_else(|| EngineError::NotFound("program".to_string()))?;
    let mut program: Program = from_doc(doc, "program")?;

    let completed = tx
        .find(
            donations::COLLECTION,
            Query::new()
                .filter("programId", key.as_str())
                .filter("status", DonationStatus::Completed.as_str()),
        )
        .await?;
    let mut total = 0i64;
    for doc in completed {
        let donation: Donation = from_doc(doc, "donation")?;
        total += donation.amount_minor;
    }

    program.raised_minor = total;
    program.updated_at = Utc::now();
    tx.put(programs::COLLECTION, &key, to_doc(&program)?);
    Ok(total)
}
