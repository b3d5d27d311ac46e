// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collaborators needed to turn stored geometry into evaluable geometry.

use std::sync::Arc;

use resqml_lite_core::{
    ContentType, Error, ExternalStore, NoExternalStore, ObjectCatalog, Result, Uuid,
};

use crate::config::EvaluationConfig;
use crate::line_array::SupportingRepresentation;

/// Longest chain of representations one resolution may follow.
pub const MAX_REFERENCE_DEPTH: usize = 16;

/// Catalog of representations that can supply parametric lines.
pub type RepresentationCatalog = dyn ObjectCatalog<dyn SupportingRepresentation>;

/// Catalog that holds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCatalog;

impl ObjectCatalog<dyn SupportingRepresentation> for EmptyCatalog {
    fn resolve_reference(
        &self,
        uuid: &Uuid,
        _content_type_hint: Option<&ContentType>,
    ) -> Result<Arc<dyn SupportingRepresentation>> {
        Err(Error::unresolved(uuid.to_string(), "no object catalog available"))
    }
}

/// External store, representation catalog and settings for one resolution.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub store: &'a dyn ExternalStore,
    pub catalog: &'a RepresentationCatalog,
    pub config: &'a EvaluationConfig,
    depth: usize,
}

static DEFAULT_CONFIG: std::sync::OnceLock<EvaluationConfig> = std::sync::OnceLock::new();

impl<'a> ResolveContext<'a> {
    /// Context with default settings and no catalog.
    pub fn new(store: &'a dyn ExternalStore) -> Self {
        Self {
            store,
            catalog: &EmptyCatalog,
            config: DEFAULT_CONFIG.get_or_init(EvaluationConfig::default),
            depth: 0,
        }
    }

    /// Context for geometry that is fully inline.
    pub fn detached() -> ResolveContext<'static> {
        ResolveContext::new(&NoExternalStore)
    }

    pub fn with_catalog(mut self, catalog: &'a RepresentationCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_config(mut self, config: &'a EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    /// Context for resolving a referenced representation.
    pub fn nested(&self) -> Result<Self> {
        if self.depth >= MAX_REFERENCE_DEPTH {
            return Err(Error::structural(
                "representation reference",
                format!("reference chain deeper than {MAX_REFERENCE_DEPTH}"),
            ));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..*self
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl std::fmt::Debug for ResolveContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveContext")
            .field("config", self.config)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
