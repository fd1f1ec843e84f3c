// CLASSIFICATION: COMMUNITY
// Filename: server.rs v0.4
// Author: Lukas Bower
// Date Modified: 2026-02-21

//! Generic HTTP router over the resource tree.
//!
//! One accept loop, one request at a time: the tree walk, handler call and
//! the handler's subprocess all block inside the request. The tree is
//! read-only after startup so there is nothing to coordinate between
//! requests.
//!
//! `GET /api/<path>` returns `{Information, Actions, Resources}` for the
//! resolved entry; `POST /api/<path>` feeds the JSON body to the entry's
//! `do_action`. Unresolvable paths are 404 and never fabricate a node.

use std::fs;
use std::io::Read;

use log::{info, warn};
use serde_json::{json, Value};
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server, SslConfig};

use crate::auth::{parse_basic_auth, Authenticator};
use crate::tree::Tree;

/// Server certificate probed at startup.
pub const CERT_PATH: &str = "/usr/lib/ssl/certs/rest_server.pem";
/// Port served when the certificate is present.
pub const TLS_PORT: u16 = 8443;
/// Plaintext fallback port.
pub const HTTP_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

enum Reply {
    Json(u16, Value),
    Empty(u16),
    Unauthorized,
}

/// REST daemon: resource tree + authenticator + listening socket.
pub struct RestServer {
    tree: Tree,
    auth: Box<dyn Authenticator>,
    server: Server,
}

impl RestServer {
    /// Bind a plaintext listener on `addr`.
    pub fn bind(
        addr: &str,
        tree: Tree,
        auth: Box<dyn Authenticator>,
    ) -> Result<Self, ServerError> {
        let server = Server::http(addr).map_err(|e| ServerError::Bind {
            addr: addr.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self { tree, auth, server })
    }

    /// Bind a TLS listener on `addr` using a PEM bundle holding both the
    /// certificate and its private key.
    pub fn bind_with_cert(
        addr: &str,
        pem: Vec<u8>,
        tree: Tree,
        auth: Box<dyn Authenticator>,
    ) -> Result<Self, ServerError> {
        let server = Server::https(
            addr,
            SslConfig {
                certificate: pem.clone(),
                private_key: pem,
            },
        )
        .map_err(|e| ServerError::Bind {
            addr: addr.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self { tree, auth, server })
    }

    /// Production startup: HTTPS on 8443 when the server certificate is
    /// readable, otherwise plaintext HTTP on 8080. The downgrade is logged
    /// loudly but preserved; shelves in the field ship without certs.
    pub fn start(tree: Tree, auth: Box<dyn Authenticator>) -> Result<Self, ServerError> {
        match fs::read(CERT_PATH) {
            Ok(pem) => {
                info!("serving HTTPS on port {TLS_PORT}");
                Self::bind_with_cert(&format!("[::]:{TLS_PORT}"), pem, tree, auth)
            }
            Err(_) => {
                warn!("certificate {CERT_PATH} not readable, serving plaintext HTTP on port {HTTP_PORT}");
                Self::bind(&format!("[::]:{HTTP_PORT}"), tree, auth)
            }
        }
    }

    /// Port actually bound, for ephemeral-port test setups.
    pub fn local_port(&self) -> Option<u16> {
        self.server.server_addr().to_ip().map(|a| a.port())
    }

    /// Serve requests until the process exits.
    pub fn run(&self) {
        for request in self.server.incoming_requests() {
            self.handle(request);
        }
    }

    fn handle(&self, mut request: Request) {
        let mut body = String::new();
        if request.as_reader().read_to_string(&mut body).is_err() {
            respond(request, Reply::Empty(400));
            return;
        }

        let authorized = request
            .headers()
            .iter()
            .find(|h| h.field.equiv("Authorization"))
            .and_then(|h| parse_basic_auth(h.value.as_str()))
            .map(|(user, password)| self.auth.check(&user, &password))
            .unwrap_or(false);
        if !authorized {
            respond(request, Reply::Unauthorized);
            return;
        }

        let path = request.url().split('?').next().unwrap_or("").to_owned();
        let method = request.method().clone();
        let reply = self.route(&method, &path, &body);
        respond(request, reply);
    }

    fn route(&self, method: &Method, path: &str, body: &str) -> Reply {
        let Some(entry) = self.tree.resolve(path) else {
            return Reply::Empty(404);
        };
        let handler = entry.data();

        match method {
            Method::Get => {
                let information = handler.information().unwrap_or_else(|e| {
                    warn!("{path}: information failed: {e}");
                    json!({})
                });
                let resources: Vec<&str> =
                    entry.children().iter().map(|c| c.name()).collect();
                Reply::Json(
                    200,
                    json!({
                        "Information": information,
                        "Actions": handler.actions(),
                        "Resources": resources,
                    }),
                )
            }
            Method::Post => {
                let parsed: Value = match serde_json::from_str(body) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!("{path}: bad request body: {e}");
                        return Reply::Empty(400);
                    }
                };
                let result = handler.do_action(&parsed).unwrap_or_else(|e| {
                    warn!("{path}: action failed: {e}");
                    json!({ "result": "failed" })
                });
                Reply::Json(200, result)
            }
            _ => Reply::Empty(405),
        }
    }
}

fn respond(request: Request, reply: Reply) {
    let result = match reply {
        Reply::Json(status, value) => {
            let response = Response::from_string(value.to_string())
                .with_status_code(status)
                .with_header(
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .unwrap(),
                );
            request.respond(response)
        }
        Reply::Empty(status) => request.respond(Response::empty(status)),
        Reply::Unauthorized => {
            let response = Response::empty(401).with_header(
                Header::from_bytes(&b"WWW-Authenticate"[..], &b"Basic realm=\"bmc\""[..])
                    .unwrap(),
            );
            request.respond(response)
        }
    };
    if let Err(e) = result {
        warn!("failed to send response: {e}");
    }
}
