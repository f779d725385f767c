//! Offload protocol for planet builds
//!
//! Mesh synthesis is heavy enough to stall an interactive loop, so it can be
//! dispatched to a dedicated worker thread through a one-shot, stateless
//! request/response pair. No session state, no streaming, no cancellation:
//! exactly one response is emitted per request, matched by id. Both the
//! worker path and the direct [`crate::mesh::build_planet`] call share one
//! noise and mesh implementation, selected by [`BuildMode`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use crate::error::PlanetError;
use crate::mesh::{self, PlanetMesh};
use crate::options::PlanetOptions;

// =============================================================================
// MESSAGES
// =============================================================================

/// Request sent to the worker. Serializes with a `kind` tag
/// (`"createGeometry"`), carrying only plain data across the boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GeometryRequest {
    CreateGeometry { id: u64, options: PlanetOptions },
}

/// Response from the worker: either the finished buffers
/// (`"geometryCreated"`) or a failure for the whole build by id
/// (`"buildFailed"`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GeometryResponse {
    GeometryCreated { id: u64, data: PlanetMesh },
    BuildFailed { id: u64, message: String },
}

/// Where a build runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// Synchronously on the calling thread
    Local,
    /// On a dedicated worker thread via the message protocol
    Worker,
}

/// Build a planet in the requested mode. Both modes produce identical
/// output for identical options.
pub fn build_with_mode(
    mode: BuildMode,
    options: &PlanetOptions,
) -> Result<PlanetMesh, PlanetError> {
    match mode {
        BuildMode::Local => mesh::build_planet(options),
        BuildMode::Worker => {
            let mut worker = MeshWorker::spawn();
            worker.build(options)
        }
    }
}

// =============================================================================
// WORKER
// =============================================================================

/// Handle to a worker thread that owns planet builds. Dropping the handle
/// closes the request channel and joins the thread.
pub struct MeshWorker {
    requests: Option<Sender<GeometryRequest>>,
    responses: Receiver<GeometryResponse>,
    handle: Option<JoinHandle<()>>,
    next_id: u64,
}

impl MeshWorker {
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();
        let handle = thread::spawn(move || worker_loop(request_rx, response_tx));
        Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
            next_id: 0,
        }
    }

    /// Send one build request and block until its response arrives.
    ///
    /// Invalid configuration is rejected here, before anything crosses the
    /// channel. The caller owns any timeout policy; this call waits as long
    /// as the worker computes.
    pub fn build(&mut self, options: &PlanetOptions) -> Result<PlanetMesh, PlanetError> {
        options.validate()?;

        let id = self.next_id;
        self.next_id += 1;

        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| PlanetError::ProtocolFault("worker already shut down".into()))?;
        requests
            .send(GeometryRequest::CreateGeometry {
                id,
                options: options.clone(),
            })
            .map_err(|_| PlanetError::ProtocolFault("worker channel closed".into()))?;

        match self.responses.recv() {
            Ok(GeometryResponse::GeometryCreated { id: got, data }) if got == id => Ok(data),
            Ok(GeometryResponse::BuildFailed { id: got, message }) if got == id => {
                Err(PlanetError::ComputationFault(message))
            }
            Ok(_) => Err(PlanetError::ProtocolFault(
                "response id does not match request".into(),
            )),
            Err(_) => Err(PlanetError::ProtocolFault(
                "worker hung up before responding".into(),
            )),
        }
    }
}

impl Drop for MeshWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// The worker side: one response per request, until the requester goes away.
/// A panic inside a build must not kill the protocol, so it is caught at
/// this boundary and reported as a failed build.
fn worker_loop(requests: Receiver<GeometryRequest>, responses: Sender<GeometryResponse>) {
    while let Ok(GeometryRequest::CreateGeometry { id, options }) = requests.recv() {
        log::debug!("worker: building geometry {id}");
        let response = match std::panic::catch_unwind(|| mesh::build_planet(&options)) {
            Ok(Ok(data)) => GeometryResponse::GeometryCreated { id, data },
            Ok(Err(err)) => GeometryResponse::BuildFailed {
                id,
                message: err.to_string(),
            },
            Err(_) => GeometryResponse::BuildFailed {
                id,
                message: "panic during mesh synthesis".into(),
            },
        };
        if responses.send(response).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_options() -> PlanetOptions {
        PlanetOptions {
            seed: 42,
            resolution: 8,
            ..PlanetOptions::default()
        }
    }

    #[test]
    fn test_worker_matches_local_build() {
        let options = small_options();
        let local = mesh::build_planet(&options).unwrap();
        let offloaded = build_with_mode(BuildMode::Worker, &options).unwrap();
        assert_eq!(local, offloaded, "both paths share one implementation");
    }

    #[test]
    fn test_invalid_options_rejected_before_dispatch() {
        let mut worker = MeshWorker::spawn();
        let options = PlanetOptions {
            resolution: 1,
            ..PlanetOptions::default()
        };
        match worker.build(&options) {
            Err(PlanetError::InvalidConfiguration(_)) => {}
            other => panic!("expected synchronous rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_sequential_requests_each_get_a_response() {
        let mut worker = MeshWorker::spawn();
        let a = worker.build(&small_options()).unwrap();
        let b = worker
            .build(&PlanetOptions {
                seed: 7,
                ..small_options()
            })
            .unwrap();
        assert_eq!(a.terrain.vertex_count(), b.terrain.vertex_count());
        assert_ne!(a.terrain.positions, b.terrain.positions);
    }

    #[test]
    fn test_request_serializes_with_kind_tag() {
        let request = GeometryRequest::CreateGeometry {
            id: 3,
            options: small_options(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"kind\":\"createGeometry\""));

        let back: GeometryRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, back);
    }

    #[test]
    fn test_failure_response_round_trips() {
        let response = GeometryResponse::BuildFailed {
            id: 9,
            message: "non-finite value in terrain buffers".into(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"kind\":\"buildFailed\""));
        let back: GeometryResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response, back);
    }

    #[test]
    fn test_created_response_round_trips() {
        let data = mesh::build_planet(&small_options()).unwrap();
        let response = GeometryResponse::GeometryCreated { id: 1, data };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"kind\":\"geometryCreated\""));
        let back: GeometryResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response, back);
    }
}
