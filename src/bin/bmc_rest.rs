// CLASSIFICATION: COMMUNITY
// Filename: bmc_rest.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-02-27

//! REST API daemon entry point.

use anyhow::Result;
use clap::Parser;
use log::info;

use bmcutil::auth::ShadowAuth;
use bmcutil::plat::init_plat_tree;
use bmcutil::server::RestServer;

#[derive(Parser)]
#[command(about = "BMC REST API over the platform resource tree")]
struct Cli {
    /// Bind an explicit address (e.g. 127.0.0.1:8080) instead of the
    /// default certificate-probing startup.
    #[arg(long)]
    listen: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let tree = init_plat_tree();
    let auth = Box::new(ShadowAuth::new());

    let server = match cli.listen {
        Some(addr) => RestServer::bind(&addr, tree, auth)?,
        None => RestServer::start(tree, auth)?,
    };
    info!("resource tree ready, serving requests");
    server.run();
    Ok(())
}
