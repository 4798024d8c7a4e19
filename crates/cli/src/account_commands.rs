use std::path::PathBuf;

use {
    anyhow::{Context, Result},
    base64::Engine as _,
    clap::Subcommand,
    tracing::debug,
};

use {
    crate::app::App,
    ztool_store::RecordStore,
    ztool_zalo::{LoginFlow, LoginFlowConfig, LoginState, NoticeFn, guard::check_account},
};

#[derive(Subcommand)]
pub enum AccountAction {
    /// List linked Zalo accounts.
    List,
    /// Make an account the active one.
    Select {
        /// Zalo user id (see `ztool accounts list`).
        id: String,
    },
    /// Unlink an account locally.
    Remove {
        /// Zalo user id.
        id: String,
    },
}

pub async fn handle_accounts(app: &App, action: AccountAction) -> Result<()> {
    match action {
        AccountAction::List => list(app),
        AccountAction::Select { id } => {
            app.registry.select(&id)?;
            // Selecting an account revalidates it, the same check the
            // background guard runs when the selection changes.
            if let Some(account) = app.registry.selected() {
                let notice: NoticeFn = std::sync::Arc::new(|msg| println!("{msg}"));
                check_account(
                    &app.zalo,
                    &app.member,
                    &app.registry,
                    app.store.as_ref(),
                    &account,
                    &notice,
                )
                .await;
            }
            list(app)
        },
        AccountAction::Remove { id } => {
            app.registry.remove(&id)?;
            println!("Removed {id}.");
            list(app)
        },
    }
}

fn list(app: &App) -> Result<()> {
    let accounts = app.registry.list();
    if accounts.is_empty() {
        println!("No linked Zalo accounts. Run `ztool link` to add one.");
        return Ok(());
    }
    let selected = app.registry.selected();
    for account in &accounts {
        let marker = if selected.as_ref().is_some_and(|s| s.id() == account.id()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {} — {}",
            account.id(),
            account.profile.display_name
        );
    }
    Ok(())
}

/// Link a new Zalo account by scanning a QR code.
///
/// Drives the login handshake and prints state transitions as they happen.
/// The QR image is written next to the records file so the operator can open
/// it with any viewer; a fresh code replaces the file in place.
pub async fn link(app: &App, qr_path: Option<PathBuf>) -> Result<()> {
    app.auth_token()?;

    let qr_path = qr_path.unwrap_or_else(|| app.config.resolve_data_dir().join("qr.png"));
    let flow = LoginFlow::spawn(
        app.zalo.clone(),
        app.member.clone(),
        app.registry.clone(),
        app.store.clone() as std::sync::Arc<dyn RecordStore>,
        LoginFlowConfig::default(),
    );
    let mut rx = flow.subscribe();

    println!("Starting Zalo login...");
    loop {
        if rx.changed().await.is_err() {
            break;
        }
        let state = rx.borrow_and_update().clone();
        match state {
            LoginState::Initializing => debug!("login initializing"),
            LoginState::QrRequired { qr_data } => match qr_data {
                Some(data) => {
                    write_qr_image(&qr_path, &data)?;
                    println!(
                        "Scan the QR code with the Zalo app: {}",
                        qr_path.display()
                    );
                },
                None => println!("Waiting for QR code..."),
            },
            LoginState::QrExpired => {
                println!("QR code expired, requesting a fresh one...");
            },
            LoginState::LoggedIn { account } => {
                println!(
                    "Linked {} ({}).",
                    account.profile.display_name,
                    account.id()
                );
                break;
            },
            LoginState::Failed { message } => {
                flow.stop();
                anyhow::bail!("login failed: {message}");
            },
        }
    }

    let _ = std::fs::remove_file(&qr_path);
    flow.join().await;
    Ok(())
}

/// Decode the handshake's QR payload and write it as a PNG. The payload is
/// either raw base64 or a `data:image/png;base64,` URL.
fn write_qr_image(path: &std::path::Path, data: &str) -> Result<()> {
    let encoded = data.rsplit_once("base64,").map_or(data, |(_, b)| b);
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .context("QR payload is not valid base64")?;
    std::fs::write(path, bytes)
        .with_context(|| format!("writing QR image to {}", path.display()))?;
    Ok(())
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_payload_accepts_data_url_and_raw_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr.png");

        write_qr_image(&path, "data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG\r\n\x1a\n");

        write_qr_image(&path, "aGVsbG8=").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn qr_payload_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_qr_image(&dir.path().join("qr.png"), "not base64 !!!").is_err());
    }
}
