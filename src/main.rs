// Copyright (c) 2025 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

use actix::Actor;
use actix_web::{App, HttpServer, middleware, web};
use anyhow::{Context, bail};
use clap::{Command, arg};
use log::info;
use std::net::TcpListener;
use std::path::Path;
use uc_intg_dirigera::configuration::{DEF_CONFIG_FILE, get_configuration, get_driver_metadata};
use uc_intg_dirigera::server::{json_error_handler, ws_index};
use uc_intg_dirigera::util::create_single_cert_server_config;
use uc_intg_dirigera::{APP_VERSION, Controller, built_info};

#[cfg(feature = "mdns-sd")]
use log::error;
#[cfg(feature = "mdns-sd")]
use uc_intg_dirigera::api::intg::IntegrationDriverUpdate;
#[cfg(feature = "mdns-sd")]
use uc_intg_dirigera::api::text_from_language_map;
#[cfg(feature = "mdns-sd")]
use uc_intg_dirigera::configuration::ENV_DISABLE_MDNS_PUBLISH;
#[cfg(feature = "mdns-sd")]
use uc_intg_dirigera::server::publish_service;
#[cfg(feature = "mdns-sd")]
use uc_intg_dirigera::util::bool_from_env;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Command::new(built_info::PKG_NAME)
        .author("Unfolded Circle ApS")
        .version(APP_VERSION)
        .about("IKEA DIRIGERA integration for Remote Two/3")
        .arg(arg!(-c --config <FILE> "Configuration file").required(false))
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg_file = match args.get_one::<String>("config").map(|s| s.as_str()) {
        None => {
            if Path::new(DEF_CONFIG_FILE).exists() {
                info!("Loading default configuration file: {DEF_CONFIG_FILE}");
                Some(DEF_CONFIG_FILE)
            } else {
                None
            }
        }
        Some(c) => Some(c),
    };
    let cfg = get_configuration(cfg_file).context("Failed to read configuration")?;

    let driver_metadata = get_driver_metadata()?;

    let listener = if cfg.integration.http.enabled {
        let address = format!(
            "{}:{}",
            cfg.integration.interface, cfg.integration.http.port
        );
        println!("{} listening on: {address}", built_info::PKG_NAME);
        Some(TcpListener::bind(address)?)
    } else {
        None
    };
    let listener_tls = if cfg.integration.https.enabled {
        let address = format!(
            "{}:{}",
            cfg.integration.interface, cfg.integration.https.port
        );
        println!("{} listening on: {address}", built_info::PKG_NAME);
        Some(TcpListener::bind(address)?)
    } else {
        None
    };

    if listener.is_none() && listener_tls.is_none() {
        bail!("At least one http or https listener must be specified");
    }

    #[cfg(feature = "mdns-sd")]
    let api_port = cfg.integration.http.port;
    let certs = cfg.integration.certs.clone();
    let websocket_settings = web::Data::new(cfg.integration.websocket.clone().unwrap_or_default());
    let controller = web::Data::new(Controller::new(cfg, driver_metadata.clone()).start());

    let mut http_server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(
                web::JsonConfig::default()
                    .limit(16 * 1024) // limit size of the payload (global configuration)
                    .error_handler(json_error_handler),
            )
            .app_data(websocket_settings.clone())
            .app_data(controller.clone())
            // Websockets
            .service(ws_index)
    })
    .workers(1);

    if let Some(listener_tls) = listener_tls {
        let certs = certs.context("Certificate settings are required for the https listener")?;
        let server_cfg = create_single_cert_server_config(&certs.public, &certs.private)?;
        http_server = http_server.listen_rustls_0_23(listener_tls, server_cfg)?;
    }

    if let Some(listener) = listener {
        http_server = http_server.listen(listener)?;
    }

    #[cfg(feature = "mdns-sd")]
    publish_mdns(api_port, driver_metadata);

    http_server.run().await?;

    Ok(())
}

#[cfg(feature = "mdns-sd")]
fn publish_mdns(api_port: u16, drv_metadata: IntegrationDriverUpdate) {
    if bool_from_env(ENV_DISABLE_MDNS_PUBLISH) {
        info!("mDNS service publishing is disabled");
        return;
    }

    if let Err(e) = publish_service(
        drv_metadata
            .driver_id
            .expect("driver_id must be set in driver metadata"),
        "_uc-integration._tcp",
        api_port,
        vec![
            format!(
                "name={}",
                text_from_language_map(drv_metadata.name.as_ref(), "en").unwrap_or("IKEA DIRIGERA")
            ),
            format!(
                "developer={}",
                drv_metadata
                    .developer
                    .and_then(|d| d.name)
                    .unwrap_or("Unfolded Circle ApS".into())
            ),
            "ws_path=/ws".into(), // otherwise `/` is used and the remote can't connect
            format!("pwd={}", drv_metadata.pwd_protected.unwrap_or_default()),
            format!("ver={APP_VERSION}"),
        ],
    ) {
        error!("Error publishing mDNS service: {e}");
    }
}
