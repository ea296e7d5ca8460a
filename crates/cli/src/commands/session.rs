//! Login, logout and whoami.

use std::fmt::Write as _;

use extickets_client::{Marketplace, ViewProfile};
use secrecy::SecretString;

use super::CommandError;

pub async fn login_google(
    market: &Marketplace,
    id_token: String,
    out: &mut String,
) -> Result<(), CommandError> {
    let identity = market
        .login_with_google(&SecretString::from(id_token))
        .await?;
    let _ = writeln!(out, "Logged in as {} <{}>", identity.name, identity.email);
    Ok(())
}

pub async fn login_admin(
    market: &Marketplace,
    username: &str,
    password: String,
    out: &mut String,
) -> Result<(), CommandError> {
    let identity = market
        .login_admin(username, &SecretString::from(password))
        .await?;
    let _ = writeln!(out, "Logged in as {} (admin)", identity.name);
    Ok(())
}

pub async fn logout(market: &Marketplace, out: &mut String) -> Result<(), CommandError> {
    market.logout().await?;
    let _ = writeln!(out, "Logged out");
    Ok(())
}

/// Greeting, role and available tabs.
pub async fn whoami(market: &Marketplace, out: &mut String) {
    let session = market.session().await;
    let profile = market.profile().await;

    let _ = writeln!(out, "{}", ViewProfile::greeting(session.identity.as_ref()));
    let Some(identity) = session.identity else {
        let _ = writeln!(out, "Not logged in");
        return;
    };

    let _ = writeln!(out, "Email: {}", identity.email);
    let _ = writeln!(out, "Role: {}", identity.role);
    let tabs: Vec<String> = profile.tabs.iter().map(ToString::to_string).collect();
    let _ = writeln!(out, "Tabs: {}", tabs.join(", "));
    if profile.can_upload {
        let _ = writeln!(out, "You can upload tickets for review");
    }
    if profile.can_review {
        let _ = writeln!(out, "You can approve or reject tickets in review");
    }
}
