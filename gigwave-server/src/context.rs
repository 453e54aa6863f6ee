use std::sync::Arc;

use gigwave_collab::Collab;

use crate::sse::ServerSentEvents;

#[derive(Clone)]
pub struct ServerContext {
    pub collab: Arc<Collab>,
    pub sse: Arc<ServerSentEvents>,
}
