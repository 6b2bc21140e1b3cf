//! Walks one tabletop session through its lifecycle in-process.
//!
//! Needs `STEAM_WEB_API_KEY` in the environment (any value works; no
//! Steam call is made unless `STEAM_DEMO_ASSERTION` holds a relay
//! callback query string to verify).

use std::collections::HashMap;

use tableforge::prelude::*;

const CLIENT_VERSION: &str = "0.9.2";

fn metadata(version: &str) -> JoinMetadata {
    [("version".to_string(), version.to_string())].into()
}

/// Decodes a callback query string (`a=1&b=%2F`) into a var bag.
fn vars_from_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tableforge::init_tracing();

    let store = MemoryAccountStore::new();
    let forge = TableforgeBuilder::new().build(store)?;

    if let Ok(query) = std::env::var("STEAM_DEMO_ASSERTION") {
        let request = AuthenticateRequest::from_vars(vars_from_query(&query));
        match forge.authenticate(request).await {
            Ok(request) => tracing::info!(
                account_id = request.account_id.as_deref().unwrap_or_default(),
                username = request.username.as_deref().unwrap_or_default(),
                "steam sign-in verified"
            ),
            Err(e) => tracing::warn!(error = %e, "steam sign-in failed"),
        }
    }

    let dm = UserId::new("dm-0001");
    let payload = serde_json::to_vec(&StartSessionRequest {
        version: Some(CLIENT_VERSION.to_string()),
    })?;
    let reply: StartSessionResponse =
        serde_json::from_slice(&forge.start_session(&dm, &payload).await?)?;
    let match_id = reply.match_id;
    eprintln!("session {match_id} created by {dm}");

    let dm_presence = Presence::new(dm.clone(), "conn-dm", "The DM");
    forge
        .join_session(&match_id, dm_presence.clone(), metadata(CLIENT_VERSION))
        .await?;
    forge
        .join_session(&match_id, Presence::new("player-1", "conn-1", "Aria"), metadata(CLIENT_VERSION))
        .await?;

    if let Err(e) = forge
        .join_session(&match_id, Presence::new("player-2", "conn-2", "Bram"), metadata("0.8.0"))
        .await
    {
        eprintln!("player-2 turned away: {e}");
    }

    let info = forge.session_info(&match_id).await?;
    eprintln!(
        "{} [{}] at {} Hz with {} connected",
        info.match_id,
        info.label,
        info.tick_rate,
        info.presence_count()
    );

    forge.leave_session(&match_id, dm_presence).await?;
    match forge.session_info(&match_id).await {
        Err(e) => eprintln!("after the dm left: {e}"),
        Ok(info) => eprintln!("unexpectedly still running: {info:?}"),
    }

    tokio::task::yield_now().await;
    let reaped = forge.reap_finished().await;
    eprintln!("reaped {reaped:?}");
    Ok(())
}
