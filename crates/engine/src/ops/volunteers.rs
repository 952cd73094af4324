//! Volunteer operations.
//!
//! Unlike the donation total, the per-program volunteer count is never
//! incremented: after every mutation the affected program's active
//! volunteers are re-queried and the count overwritten, all inside the same
//! transaction. Moving a volunteer between programs recounts both sides.

use chrono::Utc;
use uuid::Uuid;

use crate::store::{DocumentStore, Query, SortOrder, StoreTransaction};
use crate::util::{from_doc, normalize_optional_text, require_text, to_doc};
use crate::{
    EngineError, Program, ResultEngine, Volunteer, VolunteerListFilter, VolunteerNewCmd,
    VolunteerStatus, VolunteerUpdateCmd, programs, volunteers,
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn create_volunteer(&self, cmd: VolunteerNewCmd) -> ResultEngine<Uuid> {
        let name = require_text(&cmd.name, "name")?;
        let email = require_text(&cmd.email, "email")?;

        with_tx!(self, |tx| {
            let tx = tx.as_mut();
            tx.get(programs::COLLECTION, &cmd.program_id.to_string())
                .await?
                .ok_or_else(|| EngineError::NotFound("program".to_string()))?;

            let volunteer = Volunteer {
                id: Uuid::new_v4(),
                program_id: cmd.program_id,
                name,
                email,
                phone: normalize_optional_text(cmd.phone.as_deref()),
                role: cmd.role,
                joined_date: cmd.joined_date,
                status: cmd.status,
            };
            tx.insert(
                volunteers::COLLECTION,
                &volunteer.id.to_string(),
                to_doc(&volunteer)?,
            )?;

            recount_volunteers_in_tx(tx, cmd.program_id).await?;
            Ok(volunteer.id)
        })
    }

    pub async fn update_volunteer(&self, id: Uuid, cmd: VolunteerUpdateCmd) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            update_volunteer_in_tx(tx.as_mut(), id, cmd).await
        })
    }

    pub async fn delete_volunteer(&self, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            let tx = tx.as_mut();
            let key = id.to_string();
            let doc = tx
                .get(volunteers::COLLECTION, &key)
                .await?
                .ok_or_else(|| EngineError::NotFound("volunteer".to_string()))?;
            let volunteer: Volunteer = from_doc(doc, "volunteer")?;

            tx.delete(volunteers::COLLECTION, &key);
            recount_volunteers_in_tx(tx, volunteer.program_id).await?;
            Ok(())
        })
    }

    pub async fn volunteer(&self, id: Uuid) -> ResultEngine<Volunteer> {
        let doc = self
            .store
            .get(volunteers::COLLECTION, &id.to_string())
            .await?
            .ok_or_else(|| EngineError::NotFound("volunteer".to_string()))?;
        from_doc(doc, "volunteer")
    }

    /// List volunteers, most recent joiners first.
    pub async fn list_volunteers(
        &self,
        filter: VolunteerListFilter,
    ) -> ResultEngine<Vec<Volunteer>> {
        let mut query = Query::new().order_by("joinedDate", SortOrder::Desc);
        if let Some(program_id) = filter.program_id {
            query = query.filter("programId", program_id.to_string());
        }
        if let Some(status) = filter.status {
            query = query.filter("status", status.as_str());
        }
        let docs = self.store.find(volunteers::COLLECTION, query).await?;
        docs.into_iter()
            .map(|doc| from_doc(doc, "volunteer"))
            .collect()
    }
}

async fn update_volunteer_in_tx(
    tx: &mut dyn StoreTransaction,
    id: Uuid,
    cmd: VolunteerUpdateCmd,
) -> ResultEngine<()> {
    let key = id.to_string();
    let doc = tx
        .get(volunteers::COLLECTION, &key)
        .await?
        .ok_or_else(|| EngineError::NotFound("volunteer".to_string()))?;
    let mut volunteer: Volunteer = from_doc(doc, "volunteer")?;
    let old_program_id = volunteer.program_id;

    if let Some(program_id) = cmd.program_id {
        tx.get(programs::COLLECTION, &program_id.to_string())
            .await?
            .ok_or_else(|| EngineError::NotFound("program".to_string()))?;
        volunteer.program_id = program_id;
    }
    if let Some(name) = cmd.name {
        volunteer.name = require_text(&name, "name")?;
    }
    if let Some(email) = cmd.email {
        volunteer.email = require_text(&email, "email")?;
    }
    if let Some(phone) = cmd.phone {
        volunteer.phone = normalize_optional_text(Some(&phone));
    }
    if let Some(role) = cmd.role {
        volunteer.role = role;
    }
    if let Some(joined_date) = cmd.joined_date {
        volunteer.joined_date = joined_date;
    }
    if let Some(status) = cmd.status {
        volunteer.status = status;
    }

    tx.put(volunteers::COLLECTION, &key, to_doc(&volunteer)?);

    recount_volunteers_in_tx(tx, volunteer.program_id).await?;
    if volunteer.program_id != old_program_id {
        recount_volunteers_in_tx(tx, old_program_id).await?;
    }
    Ok(())
}

/// Overwrite `Program.volunteers` with the fresh active count. A missing
/// program (orphaned volunteers) is skipped.
pub(super) async fn recount_volunteers_in_tx(
    tx: &mut dyn StoreTransaction,
    program_id: Uuid,
) -> ResultEngine<()> {
    let key = program_id.to_string();
    let actives = tx
        .find(
            volunteers::COLLECTION,
            Query::new()
                .filter("programId", key.as_str())
                .filter("status", VolunteerStatus::Active.as_str()),
        )
        .await?;

    let Some(doc) = tx.get(programs::COLLECTION, &key).await? else {
        return Ok(());
    };
    let mut program: Program = from_doc(doc, "program")?;
    program.volunteers = actives.len() as u64;
    program.updated_at = Utc::now();
    tx.put(programs::COLLECTION, &key, to_doc(&program)?);
    Ok(())
}
