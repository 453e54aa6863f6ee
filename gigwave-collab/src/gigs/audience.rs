use gigwave_core::PrimaryKey;
use log::info;

use crate::{
    Caller, CollabEvent, DatabaseError, GigData, GigError, GigResult, InterestData,
    InterestStatus, NewInterest, NewReaction, ReactionData,
};

use super::GigManager;

/// How many reactions the feed of a gig shows
pub const REACTION_FEED_LENGTH: usize = 20;

const MAX_EMOJI_CHARS: usize = 8;

/// How many audience members follow a gig
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterestSummary {
    pub interested: usize,
    pub joined: usize,
}

impl GigManager {
    /// Marks the caller as interested in a gig that hasn't finished.
    /// Marking twice changes nothing.
    pub async fn mark_interested(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
    ) -> GigResult<InterestData> {
        let user_id = caller.user_id()?;
        let gig = self.context.database.gig_by_id(gig_id).await?;

        if gig.status.is_terminal() {
            return Err(GigError::precondition(format!(
                "Gig is already {}",
                gig.status
            )));
        }

        self.upsert_interest(user_id, gig_id, InterestStatus::Interested)
            .await
    }

    /// Joins a live gig, which requires being at the venue
    pub async fn join_gig(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
        can_join: bool,
    ) -> GigResult<InterestData> {
        let user_id = caller.user_id()?;
        let gig = self.context.database.gig_by_id(gig_id).await?;

        if !gig.status.is_live() {
            return Err(GigError::precondition(format!(
                "Gig is {}, it can only be joined while it's live",
                gig.status
            )));
        }

        if !can_join {
            return Err(GigError::precondition(
                "You need to be at the venue to join this gig",
            ));
        }

        let interest = self
            .upsert_interest(user_id, gig_id, InterestStatus::Joined)
            .await?;

        info!("{} joined gig {}", user_id, gig.title);

        Ok(interest)
    }

    /// Withdraws the caller's interest in a gig, leaving it if they joined
    pub async fn leave_gig(&self, caller: &Caller, gig_id: PrimaryKey) -> GigResult<()> {
        let user_id = caller.user_id()?;

        // Ensure gig exists
        let _ = self.context.database.gig_by_id(gig_id).await?;

        Ok(self
            .context
            .database
            .delete_interest(gig_id, user_id)
            .await?)
    }

    pub async fn interest_summary(&self, gig_id: PrimaryKey) -> GigResult<InterestSummary> {
        // Ensure gig exists
        let _ = self.context.database.gig_by_id(gig_id).await?;

        let interests = self.context.database.list_interests(gig_id).await?;

        Ok(interests
            .iter()
            .fold(InterestSummary::default(), |mut summary, interest| {
                match interest.status {
                    InterestStatus::Interested => summary.interested += 1,
                    InterestStatus::Joined => summary.joined += 1,
                }

                summary
            }))
    }

    /// Returns the gigs the caller is interested in or joined, by id
    pub async fn interested_gigs(&self, caller: &Caller) -> GigResult<Vec<GigData>> {
        let user_id = caller.user_id()?;
        let interests = self.context.database.interests_for_user(user_id).await?;

        let mut gigs = Vec::with_capacity(interests.len());

        for interest in interests {
            match self.context.database.gig_by_id(interest.gig_id).await {
                Ok(gig) => gigs.push(gig),
                Err(DatabaseError::NotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        gigs.sort_by_key(|g| g.id);

        Ok(gigs)
    }

    /// Sends an emoji to a live gig, signed in or not
    pub async fn send_reaction(
        &self,
        caller: &Caller,
        gig_id: PrimaryKey,
        emoji: &str,
    ) -> GigResult<ReactionData> {
        let gig = self.context.database.gig_by_id(gig_id).await?;

        if !gig.status.is_live() {
            return Err(GigError::precondition(format!(
                "Gig is {}, reactions are only open while it's live",
                gig.status
            )));
        }

        let emoji = emoji.trim();
        if emoji.is_empty() || emoji.chars().count() > MAX_EMOJI_CHARS {
            return Err(GigError::invalid(format!(
                "Reaction must be between 1 and {} characters",
                MAX_EMOJI_CHARS
            )));
        }

        let reaction = self
            .context
            .database
            .create_reaction(NewReaction {
                gig_id,
                user_id: caller.user_id().ok().map(str::to_string),
                emoji: emoji.to_string(),
            })
            .await?;

        self.context.emit(CollabEvent::Reaction {
            gig_id,
            reaction: reaction.clone(),
        });

        Ok(reaction)
    }

    /// Returns the latest reactions of a gig, oldest first
    pub async fn recent_reactions(&self, gig_id: PrimaryKey) -> GigResult<Vec<ReactionData>> {
        // Ensure gig exists
        let _ = self.context.database.gig_by_id(gig_id).await?;

        Ok(self
            .context
            .database
            .recent_reactions(gig_id, REACTION_FEED_LENGTH)
            .await?)
    }

    async fn upsert_interest(
        &self,
        user_id: &str,
        gig_id: PrimaryKey,
        status: InterestStatus,
    ) -> GigResult<InterestData> {
        Ok(self
            .context
            .database
            .upsert_interest(NewInterest {
                gig_id,
                user_id: user_id.to_string(),
                status,
            })
            .await?)
    }
}
