use std::sync::Arc;

use axum::extract::FromRef;
use codedeck_collab::Collab;

use crate::{execution::ExecutionClient, gateway::Gateway};

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub collab: Arc<Collab>,
    pub gateway: Arc<Gateway>,
    pub executor: Arc<ExecutionClient>,
}
