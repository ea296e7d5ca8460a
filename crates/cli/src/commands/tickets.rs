//! Listing, review and upload.

use std::fmt::Write as _;
use std::path::PathBuf;

use extickets_client::{Attachment, ClientError, Marketplace, Tab, UploadRequest, render_ticket};
use extickets_core::{EventDateTime, Price, TicketId};

use super::CommandError;

/// Upload form as collected from the command line.
pub struct UploadArgs {
    pub event_name: String,
    pub date: EventDateTime,
    pub venue: String,
    pub price: Price,
    pub image: PathBuf,
    pub file: PathBuf,
}

pub async fn list(
    market: &Marketplace,
    tab: Option<Tab>,
    out: &mut String,
) -> Result<(), CommandError> {
    let profile = market.profile().await;
    let tab = tab
        .or_else(|| profile.default_tab())
        .ok_or(ClientError::NotAuthenticated)?;

    let _ = writeln!(out, "{}", tab.heading());
    let Some(tickets) = market.refresh(tab).await? else {
        let _ = writeln!(out, "The listing changed while loading; run the command again");
        return Ok(());
    };

    if tickets.is_empty() {
        let _ = writeln!(out, "No tickets found");
    }
    for ticket in &tickets {
        let _ = writeln!(out);
        let _ = write!(out, "{}", render_ticket(ticket, &profile));
    }
    Ok(())
}

pub async fn approve(
    market: &Marketplace,
    id: &str,
    comment: Option<&str>,
    out: &mut String,
) -> Result<(), CommandError> {
    market.approve(&TicketId::new(id), comment).await?;
    let _ = writeln!(out, "Ticket {id} approved");
    remaining(market, out).await;
    Ok(())
}

pub async fn reject(
    market: &Marketplace,
    id: &str,
    comment: &str,
    out: &mut String,
) -> Result<(), CommandError> {
    market.reject(&TicketId::new(id), comment).await?;
    let _ = writeln!(out, "Ticket {id} rejected");
    remaining(market, out).await;
    Ok(())
}

async fn remaining(market: &Marketplace, out: &mut String) {
    let board = market.board().await;
    if board.tab() == Some(Tab::InReview) {
        let _ = writeln!(out, "{} ticket(s) still in review", board.tickets().len());
    }
}

pub async fn upload(
    market: &Marketplace,
    args: UploadArgs,
    out: &mut String,
) -> Result<(), CommandError> {
    let event_image = read_attachment(args.image).await?;
    let file = read_attachment(args.file).await?;

    let request = UploadRequest {
        event_name: args.event_name,
        event_date_time: args.date,
        venue: args.venue,
        price: args.price,
        event_image,
        file,
    };

    let ticket = market.upload(request).await?;
    let _ = writeln!(out, "Ticket uploaded for review");
    let _ = write!(out, "{}", render_ticket(&ticket, &market.profile().await));
    Ok(())
}

async fn read_attachment(path: PathBuf) -> Result<Attachment, CommandError> {
    Attachment::from_path(&path)
        .await
        .map_err(|source| CommandError::Attachment { path, source })
}
