use std::path::{Component, Path};

use crate::constants::{
    CIM_DIR, CIM_IGNORE, DATA_DICTIONARIES_DIR, DATA_DICTIONARIES_IGNORE, DDM_IGNORE,
    DETECTION_DATA_MODEL_DIR, MARKDOWN_EXTENSION,
};
use crate::pipeline::processing::parser::ParseContext;

/// The canonical collection a corpus document normalizes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    CimEntities,
    DataDictionaries,
    DetectionDataModel,
}

impl Collection {
    pub fn context(&self) -> ParseContext {
        match self {
            Collection::CimEntities => ParseContext::Cim,
            Collection::DataDictionaries => ParseContext::Dd,
            Collection::DetectionDataModel => ParseContext::Ddm,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::CimEntities => "cim",
            Collection::DataDictionaries => "data_dictionaries",
            Collection::DetectionDataModel => "ddm",
        }
    }
}

/// One row of the routing table: a directory marker and the collection it feeds
#[derive(Debug, Clone)]
pub struct Route {
    pub marker: &'static str,
    pub collection: Collection,
    pub ignore: &'static [&'static str],
}

/// Outcome of routing one file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Document belongs to a collection; `trailing` holds the directory segments after the marker
    Routed {
        collection: Collection,
        trailing: Vec<String>,
    },
    /// Markdown file under a marker but on that collection's ignore list
    Ignored { collection: Collection },
    /// Not a markdown record (README, index, other extension) or under no marker
    Unrouted,
}

/// Ordered routing table; the first route whose marker is a parent segment wins
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::ossem()
    }
}

impl RouteTable {
    /// The OSSEM repository layout
    pub fn ossem() -> Self {
        Self {
            routes: vec![
                Route {
                    marker: CIM_DIR,
                    collection: Collection::CimEntities,
                    ignore: CIM_IGNORE,
                },
                Route {
                    marker: DATA_DICTIONARIES_DIR,
                    collection: Collection::DataDictionaries,
                    ignore: DATA_DICTIONARIES_IGNORE,
                },
                Route {
                    marker: DETECTION_DATA_MODEL_DIR,
                    collection: Collection::DetectionDataModel,
                    ignore: DDM_IGNORE,
                },
            ],
        }
    }

    pub fn with_routes(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, path: &Path) -> RouteDecision {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return RouteDecision::Unrouted;
        };
        if !is_markdown_record(path, file_name) {
            return RouteDecision::Unrouted;
        }

        let segments = parent_segments(path);
        for route in &self.routes {
            let Some(position) = segments.iter().position(|s| s == route.marker) else {
                continue;
            };
            if route.ignore.contains(&file_name) {
                return RouteDecision::Ignored {
                    collection: route.collection,
                };
            }
            return RouteDecision::Routed {
                collection: route.collection,
                trailing: segments[position + 1..].to_vec(),
            };
        }

        RouteDecision::Unrouted
    }
}

fn is_markdown_record(path: &Path, file_name: &str) -> bool {
    let is_markdown = path.extension().and_then(|e| e.to_str()) == Some(MARKDOWN_EXTENSION);
    let stem = file_name.split('.').next().unwrap_or("").to_lowercase();
    is_markdown && !file_name.contains("README") && stem != "readme" && stem != "index"
}

fn parent_segments(path: &Path) -> Vec<String> {
    path.parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|component| match component {
                    Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
