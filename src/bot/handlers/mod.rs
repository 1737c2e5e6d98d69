//! Discord interaction handlers
//!
//! This module provides the Discord side of setup wizards and the handlers for
//! buttons on published panels, plus the gateway event entry point.

/// Buttons on published ticket and reaction-role panels
pub mod panels;
/// Wizard platform backed by Discord components and modals
pub mod wizard;

use crate::{
    bot::BotData,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{error, info};

/// Gateway events not handled by poise commands.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("{} is connected", data_about_bot.user.name);
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => {
            if let Err(e) = panels::handle_interaction(ctx, component, data).await {
                error!(custom_id = %component.data.custom_id, "Panel interaction failed: {e}");
            }
        }
        _ => {}
    }
    Ok(())
}
