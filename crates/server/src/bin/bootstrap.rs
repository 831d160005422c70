//! Creates an organisation with its first admin and prints a session token for them.
//!
//! Usage: `bootstrap <name> <slug> <admin-email> <admin-name>`

use std::env;

use anyhow::{Context, bail};
use chrono::Duration;
use db::DBService;
use server::config::Config;
use services::services::{
    auth::SessionClaims,
    organisation::{BootstrapOrganisation, OrganisationService},
};
use utils::session::SessionCodec;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::logging::init("info");

    let args: Vec<String> = env::args().skip(1).collect();
    let [name, slug, admin_email, admin_name] = args.as_slice() else {
        bail!("usage: bootstrap <name> <slug> <admin-email> <admin-name>");
    };

    let config = Config::from_env().context("Invalid configuration")?;
    let db = DBService::new(&config.database_url).await?;
    let (organisation, admin) = OrganisationService::new(db.pool.clone())
        .bootstrap(&BootstrapOrganisation {
            name: name.clone(),
            slug: slug.clone(),
            admin_email: admin_email.clone(),
            admin_name: admin_name.clone(),
        })
        .await?;

    let codec = SessionCodec::new(&config.session_secret, Duration::hours(config.session_ttl_hours))?;
    let claims = SessionClaims::new(&codec, admin.id, organisation.id, admin.role);
    let token = codec.sign(&claims)?;

    println!("organisation: {} ({})", organisation.name, organisation.slug);
    println!("admin:        {}", admin.email);
    println!("session:      {token}");
    Ok(())
}
