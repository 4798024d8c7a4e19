use anyhow::Result;

use {
    crate::app::App,
    ztool_zalo::{login_operator, logout_operator},
};

/// Log in to the ZTOOL backend and import the stored Zalo accounts.
pub async fn login(app: &App, phone: &str, pass: &str) -> Result<()> {
    let info = login_operator(
        app.store.as_ref(),
        &app.registry,
        &app.member,
        &app.zalo,
        phone,
        pass,
    )
    .await?;

    println!("Logged in as {} <{}>", info.full_name, info.email);
    println!("Points: {}", info.point);
    let accounts = app.registry.list();
    match accounts.len() {
        0 => println!("No linked Zalo accounts. Run `ztool link` to add one."),
        n => {
            println!("{n} linked Zalo account(s):");
            for account in &accounts {
                println!("  {} — {}", account.id(), account.profile.display_name);
            }
        },
    }
    Ok(())
}

/// Clear local credentials and linked accounts.
pub fn logout(app: &App) -> Result<()> {
    logout_operator(app.store.as_ref(), &app.registry)?;
    println!("Logged out. Local credentials and linked accounts removed.");
    Ok(())
}

/// Show the operator's profile and point balance.
pub async fn info(app: &App) -> Result<()> {
    let token = app.auth_token()?;
    let info = app.member.member_info(&token).await?;
    println!("Name:   {}", info.full_name);
    println!("Email:  {}", info.email);
    println!("Phone:  {}", info.phone);
    println!("Points: {}", info.point);
    match info.proxy_config() {
        Some(proxy) => println!("Proxy:  {}", proxy.url()),
        None => println!("Proxy:  none"),
    }
    Ok(())
}

/// Show the per-action point price list.
pub async fn points(app: &App) -> Result<()> {
    let prices = app.member.action_points().await?;
    if prices.is_empty() {
        println!("No action prices published.");
        return Ok(());
    }
    let mut entries: Vec<_> = prices.into_iter().collect();
    entries.sort();
    for (action, cost) in entries {
        println!("  {action}: {cost}");
    }
    Ok(())
}
