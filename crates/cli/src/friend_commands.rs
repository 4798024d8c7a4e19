use std::path::PathBuf;

use {
    anyhow::{Context, Result},
    tracing::warn,
};

use {
    crate::app::App,
    ztool_common::text::{parse_phone_list, remove_vietnamese_tones},
};

/// Send friend requests to every phone number in the list file.
///
/// Each number is processed independently; lookup or request failures are
/// reported and counted but never abort the batch. The invite message is
/// sent tone-stripped, which is what the Zalo service expects.
pub async fn add_friends(app: &App, message: &str, phones_file: PathBuf) -> Result<()> {
    let account = app.selected_account()?;
    let raw = std::fs::read_to_string(&phones_file)
        .with_context(|| format!("reading {}", phones_file.display()))?;
    let phones = parse_phone_list(&raw)?;
    let message = remove_vietnamese_tones(message);

    println!(
        "Sending friend requests from {} to {} number(s)...",
        account.profile.display_name,
        phones.len()
    );

    let mut sent = 0usize;
    let mut failed = 0usize;
    for phone in &phones {
        match add_one(app, &account, phone, &message).await {
            Ok(user_id) => {
                sent += 1;
                println!("  {phone}: request sent ({user_id})");
            },
            Err(e) => {
                failed += 1;
                warn!(phone = %phone, error = %e, "friend request failed");
                println!("  {phone}: {e}");
            },
        }
    }

    println!("Done: {sent} sent, {failed} failed.");
    Ok(())
}

async fn add_one(
    app: &App,
    account: &ztool_accounts::LinkedAccount,
    phone: &str,
    message: &str,
) -> Result<String> {
    let found = app.zalo.find_user(&account.session, phone).await?;
    let user_id = match (found.success, found.user_id) {
        (true, Some(id)) => id,
        _ => anyhow::bail!(
            "{}",
            found.message.unwrap_or_else(|| "no Zalo user for this number".into())
        ),
    };

    let resp = app.zalo.add_friend(&account.session, &user_id, message).await?;
    if !resp.success {
        anyhow::bail!(
            "{}",
            resp.message.unwrap_or_else(|| "friend request rejected".into())
        );
    }
    Ok(user_id)
}
