/*!
Topology module

This module talks to the controller and feeds snapshots to the GUI.

Structure:
- `snapshot`: the payload of the handover manager component (graph, parameters, credentials).
- `source`: a small async trait (`SnapshotSource`) returning the latest snapshot,
            plus the error type used by the GUI layer.
- `http`: the REST client (`GET` snapshots, `PUT` parameter updates).
- `poller`: the serialized poll loop running on the tokio runtime.
*/

pub mod http;
pub mod poller;
pub mod snapshot;
pub mod source;

pub use http::HandoverApiClient;
pub use source::SnapshotSource;
