pub mod declared;

use std::sync::Arc;

use adk_rust::prelude::*;

use crate::connectors::{Connector, declarations};
use declared::DeclaredTool;

/// Declared-tool adapters for every function the connector advertises.
pub fn build_declared_tools(connector: Connector) -> Vec<Arc<dyn Tool>> {
    declarations(connector)
        .into_iter()
        .map(|declaration| Arc::new(DeclaredTool::new(declaration)) as Arc<dyn Tool>)
        .collect()
}
